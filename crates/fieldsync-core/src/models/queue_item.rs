//! Sync queue item model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Task, TaskId};

/// Unique identifier for queue items and conflicts, using UUID v7 (time-sortable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new unique id
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What a queue item asks the remote authority to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueAction {
    #[serde(rename = "UPSERT_TASK")]
    UpsertTask,
}

impl QueueAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpsertTask => "UPSERT_TASK",
        }
    }
}

impl FromStr for QueueAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UPSERT_TASK" => Ok(Self::UpsertTask),
            other => Err(Error::InvalidInput(format!("unknown queue action: {other}"))),
        }
    }
}

/// Queue item state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Queued,
    Processing,
    Failed,
}

impl QueueState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Failed => "failed",
        }
    }

    /// Whether an item in this state may be picked up by a sync cycle
    pub const fn is_ready_state(self) -> bool {
        matches!(self, Self::Queued | Self::Failed)
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!("unknown queue state: {other}"))),
        }
    }
}

/// A pending or failed attempt to push one task mutation to the remote authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: RecordId,
    pub task_id: TaskId,
    pub action: QueueAction,
    /// Serialized task snapshot taken at enqueue time; never rewritten
    pub payload: String,
    pub state: QueueState,
    pub attempt_count: i64,
    /// Eligibility gate (Unix ms)
    pub next_retry_at: i64,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl QueueItem {
    /// Build a fresh, immediately eligible upsert for `task`.
    pub fn upsert_for(task: &Task, now: i64) -> Result<Self> {
        Ok(Self {
            id: RecordId::new(),
            task_id: task.id.clone(),
            action: QueueAction::UpsertTask,
            payload: task.to_payload()?,
            state: QueueState::Queued,
            attempt_count: 0,
            next_retry_at: now,
            last_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decode the task snapshot carried by this item.
    pub fn task_snapshot(&self) -> Result<Task> {
        Task::from_payload(self.id.as_str(), &self.payload)
    }
}
