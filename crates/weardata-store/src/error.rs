//! Error types for the store module.

use thiserror::Error;
use weardata_core::CoreError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Payload or uri could not be converted.
    #[error("data error: {0}")]
    Data(#[from] CoreError),

    /// Invalid data in storage or in a request.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking task failed to run to completion.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
