use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fieldsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Task ID cannot be empty")]
    EmptyTaskId,
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Nothing to update: pass --status, --notes, --image or --clear-image")]
    NoChanges,
    #[error("Interval must be at least one second")]
    InvalidInterval,
    #[error("{0}")]
    Board(String),
}
