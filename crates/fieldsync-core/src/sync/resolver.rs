//! Human-driven conflict resolution

use crate::models::{QueueItem, TaskId};
use crate::services::LocalStore;
use crate::Result;

/// Applies a field worker's decision on an open conflict
#[derive(Clone)]
pub struct ConflictResolver {
    store: LocalStore,
}

impl ConflictResolver {
    pub const fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Keep the server's copy. Returns `false` when the task has no pending
    /// conflict, in which case nothing changes.
    pub async fn accept_server(&self, task_id: &TaskId) -> Result<bool> {
        let resolved = self.store.resolve_accept_server(task_id).await?;
        if resolved {
            tracing::info!("Conflict on task {task_id} resolved: accept server");
        } else {
            tracing::debug!("No pending conflict for task {task_id}");
        }
        Ok(resolved)
    }

    /// Put the rejected local copy back in the queue. The caller is expected
    /// to run a sync cycle afterwards.
    pub async fn retry_local(&self, task_id: &TaskId) -> Result<Option<QueueItem>> {
        let item = self.store.resolve_retry_local(task_id).await?;
        match &item {
            Some(item) => {
                tracing::info!(
                    "Conflict on task {task_id} resolved: retry local as {}",
                    item.id
                );
            }
            None => tracing::debug!("No pending conflict for task {task_id}"),
        }
        Ok(item)
    }
}
