//! Error types for fieldsync-core

use thiserror::Error;

/// Result type alias using fieldsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fieldsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error, surfaced unchanged from `SQLite`. Nothing inside the
    /// failing write group was committed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Mutation targets a task that does not exist
    #[error("Task not found: {0}")]
    NotFound(String),

    /// A stored snapshot could not be decoded into a task
    #[error("Malformed payload for {item}: {reason}")]
    MalformedPayload {
        /// Queue item or conflict id carrying the payload
        item: String,
        /// Decoder message
        reason: String,
    },

    /// Remote endpoint unreachable or disabled
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `MalformedPayload` error from a decoder failure.
    pub fn malformed(item: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}
