//! Error types for inspect-core

use thiserror::Error;

/// Result type alias using inspect-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in inspect-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid required input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Inspection record not found
    #[error("Inspection record not found: {0}")]
    NotFound(String),

    /// A record with the same id already exists
    #[error("Inspection record already exists: {0}")]
    Conflict(String),

    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
