//! Unified error handling for bravely-core.
//!
//! Every fallible operation in this crate returns [`Result`], an alias
//! for `std::result::Result<T, CoreError>`. Domain-specific failures are
//! grouped into sub-enums so callers can match on the broad category
//! without caring about the exact variant.

use thiserror::Error;

/// Top-level error type for all bravely-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    #[error("user not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the SQLite persistence layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to open database at {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("migration failed: {0}")]
    MigrationFailed(String),

    #[error("database is locked by another process")]
    Locked,
}

/// Errors raised while loading, saving, or mutating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {message}")]
    LoadFailed { path: String, message: String },

    #[error("failed to save config to {path}: {message}")]
    SaveFailed { path: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to parse config: {0}")]
    ParseFailed(String),
}

/// Errors raised when session input fails validation before a write.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("end time {end} is before start time {start}")]
    InvalidTimeRange { start: String, end: String },

    #[error("{field} must be between 1 and 10, got {value}")]
    RatingOutOfRange { field: &'static str, value: i64 },

    #[error("{field} must be a non-negative finite number, got {value}")]
    InvalidMetric { field: &'static str, value: f64 },

    #[error("{field} must not be empty or whitespace")]
    EmptyAnnotation { field: &'static str },

    #[error("invalid {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
