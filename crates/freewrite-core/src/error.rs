//! Error types for freewrite-core

use thiserror::Error;

use crate::remote::ApiError;

/// Result type alias using freewrite-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in freewrite-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry not found
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Journal service request failed
    #[error(transparent)]
    Remote(#[from] ApiError),
}
