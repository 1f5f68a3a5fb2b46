//! Subcommand implementations.
//!
//! Each module owns one top-level subcommand: an `Action` enum deriving
//! `clap::Subcommand` plus a `run` function that executes it.

pub mod config;
pub mod content;
pub mod goals;
pub mod session;
pub mod stats;
pub mod streak;
pub mod user;

use bravely_core::{Config, Database, ExposureEngine};

/// Opens the shared database and wires it to an engine configured from
/// the on-disk goal policy.
fn open_engine() -> Result<ExposureEngine<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let policy = config.goals.policy()?;
    Ok(ExposureEngine::with_policy(Database::open()?, policy))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
