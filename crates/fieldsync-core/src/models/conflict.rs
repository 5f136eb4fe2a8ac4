//! Sync conflict model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{RecordId, Task, TaskId};

/// How a human settled a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    Pending,
    AcceptServer,
    RetryLocal,
}

impl ConflictResolution {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AcceptServer => "accept_server",
            Self::RetryLocal => "retry_local",
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accept_server" => Ok(Self::AcceptServer),
            "retry_local" => Ok(Self::RetryLocal),
            other => Err(Error::InvalidInput(format!(
                "unknown conflict resolution: {other}"
            ))),
        }
    }
}

/// Recorded divergence between the local and remote views of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: RecordId,
    pub task_id: TaskId,
    /// Snapshot of the remote task when the conflict was detected
    pub server_payload: String,
    /// Snapshot of the local task that was rejected
    pub local_payload: String,
    pub resolution: ConflictResolution,
    pub created_at: i64,
    /// Set once, when resolution leaves `Pending`
    pub resolved_at: Option<i64>,
}

impl Conflict {
    pub const fn is_open(&self) -> bool {
        matches!(self.resolution, ConflictResolution::Pending)
    }

    pub fn server_task(&self) -> Result<Task> {
        Task::from_payload(self.id.as_str(), &self.server_payload)
    }

    pub fn local_task(&self) -> Result<Task> {
        Task::from_payload(self.id.as_str(), &self.local_payload)
    }
}
