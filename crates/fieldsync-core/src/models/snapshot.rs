//! Consistent read of the whole local store

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;
use crate::models::{Conflict, QueueItem, SyncStatus, Task};

/// Tasks newest-first, queue FIFO, open conflicts newest-first, all read
/// inside one transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    pub tasks: Vec<Task>,
    pub queue_items: Vec<QueueItem>,
    pub open_conflicts: Vec<Conflict>,
}

impl LocalSnapshot {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queue_items.len()
    }

    pub fn conflict_count(&self) -> usize {
        self.open_conflicts.len()
    }

    /// Number of tasks currently in `status`
    pub fn count_with_status(&self, status: SyncStatus) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.sync_status == status)
            .count()
    }

    /// Tasks matching a list filter, keeping snapshot order
    pub fn filtered_tasks(&self, filter: TaskFilter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .collect()
    }

    pub fn has_open_conflict(&self, task_id: &crate::models::TaskId) -> bool {
        self.open_conflicts
            .iter()
            .any(|conflict| conflict.is_open() && &conflict.task_id == task_id)
    }
}

/// Task list filter: everything, or one sync status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Status(SyncStatus),
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => task.sync_status == status,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Status)
        }
    }
}
