//! In-memory remote authority used by the CLI and tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::models::{BusinessStatus, SyncStatus, Task, TaskId};
use crate::sync::endpoint::{RemoteEndpoint, UpsertOutcome};
use crate::util::now_millis;

/// Remote authority backed by a map, with switches to simulate an outage and
/// a concurrent server-side cancellation.
#[derive(Debug)]
pub struct FakeEndpoint {
    tasks: Mutex<HashMap<TaskId, Task>>,
    available: AtomicBool,
    force_next_conflict: AtomicBool,
}

impl Default for FakeEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEndpoint {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            force_next_conflict: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Make the next accepted request come back as a cancellation conflict
    pub fn set_force_next_conflict(&self, force: bool) {
        self.force_next_conflict.store(force, Ordering::SeqCst);
    }

    pub fn force_next_conflict_pending(&self) -> bool {
        self.force_next_conflict.load(Ordering::SeqCst)
    }

    /// Current server-side copy of a task
    pub fn server_task(&self, id: &TaskId) -> Option<Task> {
        self.lock_tasks().get(id).cloned()
    }

    /// Place a task on the server as if another client had written it
    pub fn put_server_task(&self, task: Task) {
        self.lock_tasks().insert(task.id.clone(), task);
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteEndpoint for FakeEndpoint {
    async fn upsert(&self, local: &Task, online: bool) -> UpsertOutcome {
        if !online {
            return UpsertOutcome::NetworkError {
                reason: "Device is offline".to_string(),
            };
        }
        if !self.is_available() {
            return UpsertOutcome::NetworkError {
                reason: "Server is unavailable".to_string(),
            };
        }

        let now = now_millis();
        let mut tasks = self.lock_tasks();
        let existing = tasks.get(&local.id).cloned();
        let base_version = existing
            .as_ref()
            .map_or(local.server_version, |task| task.server_version);

        if self.force_next_conflict.swap(false, Ordering::SeqCst) {
            let mut server_task = existing.unwrap_or_else(|| local.clone());
            server_task.business_status = BusinessStatus::Cancelled;
            server_task.sync_status = SyncStatus::Synced;
            server_task.server_version = base_version + 1;
            server_task.updated_at = now;
            server_task.last_synced_at = Some(now);
            tasks.insert(local.id.clone(), server_task.clone());

            return UpsertOutcome::Conflict {
                server_task,
                reason: "Forced conflict requested".to_string(),
            };
        }

        if let Some(server_task) = existing {
            if server_task.business_status == BusinessStatus::Cancelled
                && local.business_status == BusinessStatus::Done
            {
                return UpsertOutcome::Conflict {
                    server_task,
                    reason: "Server task is already cancelled while local task is marked done"
                        .to_string(),
                };
            }
        }

        let mut accepted = local.clone();
        accepted.sync_status = SyncStatus::Synced;
        accepted.server_version = base_version + 1;
        accepted.updated_at = now;
        accepted.last_synced_at = Some(now);
        tasks.insert(local.id.clone(), accepted.clone());

        UpsertOutcome::Success {
            server_task: accepted,
        }
    }
}
