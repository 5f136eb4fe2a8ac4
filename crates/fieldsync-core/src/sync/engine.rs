//! Single-flight sync cycle over the local queue

use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::QueueItem;
use crate::services::LocalStore;
use crate::sync::endpoint::{RemoteEndpoint, UpsertOutcome};
use crate::sync::report::{SyncCycleReport, SyncRequest};
use crate::util::{compact_text, now_millis};
use crate::{Error, Result};

/// Marks a cycle as running for as long as it is alive.
struct CycleGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// How a single queue item ended within a cycle
enum ItemOutcome {
    Synced,
    Conflict,
    Failed,
    ChannelDown,
}

/// Drains ready queue items against a remote endpoint, one cycle at a time.
///
/// Items are processed strictly in FIFO order. A malformed payload fails only
/// its own item; a network error fails the item and ends the cycle.
pub struct SyncEngine<E> {
    store: LocalStore,
    endpoint: E,
    running: AtomicBool,
}

impl<E: RemoteEndpoint> SyncEngine<E> {
    pub const fn new(store: LocalStore, endpoint: E) -> Self {
        Self {
            store,
            endpoint,
            running: AtomicBool::new(false),
        }
    }

    pub const fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one cycle.
    ///
    /// Returns immediately with a skipped report when another cycle holds the
    /// engine or the caller is offline. Storage errors abort the cycle and are
    /// returned as-is after the item being processed is put back in the
    /// ready set.
    pub async fn run_cycle(&self, request: &SyncRequest) -> Result<SyncCycleReport> {
        let mut report = SyncCycleReport::new(&request.reason);

        let Some(_guard) = CycleGuard::acquire(&self.running) else {
            tracing::debug!("Sync cycle '{}' skipped: already running", request.reason);
            report.skipped_already_running = true;
            return Ok(report);
        };

        if !request.online {
            tracing::debug!("Sync cycle '{}' skipped: offline", request.reason);
            report.skipped_offline = true;
            return Ok(report);
        }

        let items = self
            .store
            .read_ready_queue_items(now_millis(), request.ignore_retry_window)
            .await?;
        report.items_checked = items.len();
        tracing::info!(
            "Sync cycle '{}' started with {} ready items",
            request.reason,
            items.len()
        );

        for item in &items {
            let outcome = match self.process_item(item, request.online).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    self.release_item(item).await;
                    return Err(error);
                }
            };
            match outcome {
                ItemOutcome::Synced => report.synced += 1,
                ItemOutcome::Conflict => report.conflicts += 1,
                ItemOutcome::Failed => report.failed += 1,
                ItemOutcome::ChannelDown => {
                    report.failed += 1;
                    break;
                }
            }
        }

        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Return an item abandoned by a storage error to the ready set so the
    /// next cycle picks it up again.
    async fn release_item(&self, item: &QueueItem) {
        if let Err(error) = self
            .store
            .release_processing(&item.id, &item.task_id, item.state)
            .await
        {
            tracing::error!("Failed to release queue item {}: {}", item.id, error);
        }
    }

    async fn process_item(&self, item: &QueueItem, online: bool) -> Result<ItemOutcome> {
        self.store.mark_processing(&item.id).await?;
        self.store.mark_task_syncing(&item.task_id).await?;
        let attempt = item.attempt_count + 1;

        let local = match item.task_snapshot() {
            Ok(task) => task,
            Err(error) => {
                tracing::warn!("Skipping poison queue item {}: {}", item.id, error);
                self.store
                    .mark_retry(&item.id, attempt, &compact_text(&error.to_string()))
                    .await?;
                self.store.mark_task_sync_error(&item.task_id).await?;
                return Ok(ItemOutcome::Failed);
            }
        };

        match self.endpoint.upsert(&local, online).await {
            UpsertOutcome::Success { server_task } => {
                let synced_at = server_task.last_synced_at.unwrap_or_else(now_millis);
                self.store
                    .mark_task_synced(&item.task_id, server_task.server_version, synced_at)
                    .await?;
                self.store.remove(&item.id).await?;
                tracing::debug!(
                    "Task {} synced at version {}",
                    item.task_id,
                    server_task.server_version
                );
                Ok(ItemOutcome::Synced)
            }
            UpsertOutcome::Conflict {
                server_task,
                reason,
            } => {
                self.store
                    .record_conflict(&item.task_id, &server_task, &item.payload)
                    .await?;
                self.store.remove(&item.id).await?;
                tracing::info!("Conflict recorded for task {}: {}", item.task_id, reason);
                Ok(ItemOutcome::Conflict)
            }
            UpsertOutcome::NetworkError { reason } => {
                let error = Error::Network(reason);
                self.store
                    .mark_retry(&item.id, attempt, &compact_text(&error.to_string()))
                    .await?;
                self.store.mark_task_sync_error(&item.task_id).await?;
                tracing::warn!(
                    "{} on task {} (attempt {}); stopping cycle",
                    error,
                    item.task_id,
                    attempt
                );
                Ok(ItemOutcome::ChannelDown)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive_and_released_on_drop() {
        let running = AtomicBool::new(false);

        let guard = CycleGuard::acquire(&running).unwrap();
        assert!(CycleGuard::acquire(&running).is_none());
        drop(guard);

        assert!(!running.load(Ordering::Acquire));
        assert!(CycleGuard::acquire(&running).is_some());
    }
}
