//! Storage layer: TOML config file and SQLite database.

pub mod config;
pub mod database;
pub mod migrations;

pub use config::Config;
pub use database::Database;

use std::path::PathBuf;

/// Returns the data directory, respecting BRAVELY_ENV for dev/prod
/// separation.
pub fn data_dir() -> PathBuf {
    let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let dir_name = match std::env::var("BRAVELY_ENV").as_deref() {
        Ok("dev") => ".config/bravely-dev",
        _ => ".config/bravely",
    };
    base.join(dir_name)
}
