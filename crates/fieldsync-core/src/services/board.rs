//! Task board: the orchestration surface the presentation layer talks to.
//!
//! Every entry point reports failure as an optional message and keeps the
//! last one in [`TaskBoard::error_message`] until the next entry point runs.

use std::fmt::Display;

use crate::db::seed::demo_tasks;
use crate::models::{LocalSnapshot, TaskId, TaskPatch};
use crate::services::LocalStore;
use crate::sync::{
    ConflictResolver, ConnectivityMonitor, FakeEndpoint, SyncCycleReport, SyncEngine,
    SyncRequest, Transition, WakeScheduler,
};
use crate::util::now_millis;

pub const REASON_STARTUP: &str = "application-startup";
pub const REASON_LOCAL_UPDATE: &str = "local-task-update";
pub const REASON_RETRY_LOCAL: &str = "retry-local-conflict";
pub const REASON_RECONNECTED: &str = "network-reconnected";
pub const REASON_SERVER_RESTORED: &str = "server-restored";
pub const REASON_BACKGROUND: &str = "background-fetch";

const NO_SYNC_YET: &str = "No sync has run yet.";

/// Owns the store, engine, and resolver, plus the state shown to the user.
pub struct TaskBoard {
    store: LocalStore,
    engine: SyncEngine<FakeEndpoint>,
    resolver: ConflictResolver,
    connectivity: ConnectivityMonitor,
    snapshot: LocalSnapshot,
    last_sync_summary: String,
    last_report: Option<SyncCycleReport>,
    error_message: Option<String>,
    seed_demo_tasks: bool,
    initialized: bool,
}

impl TaskBoard {
    pub fn new(store: LocalStore, endpoint: FakeEndpoint) -> Self {
        let connectivity = ConnectivityMonitor::new(true, endpoint.is_available());
        Self {
            engine: SyncEngine::new(store.clone(), endpoint),
            resolver: ConflictResolver::new(store.clone()),
            store,
            connectivity,
            snapshot: LocalSnapshot::default(),
            last_sync_summary: NO_SYNC_YET.to_string(),
            last_report: None,
            error_message: None,
            seed_demo_tasks: true,
            initialized: false,
        }
    }

    #[must_use]
    pub fn with_seed_demo_tasks(mut self, seed: bool) -> Self {
        self.seed_demo_tasks = seed;
        self
    }

    pub const fn snapshot(&self) -> &LocalSnapshot {
        &self.snapshot
    }

    pub fn last_sync_summary(&self) -> &str {
        &self.last_sync_summary
    }

    pub const fn last_report(&self) -> Option<&SyncCycleReport> {
        self.last_report.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub const fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub const fn is_server_available(&self) -> bool {
        self.connectivity.is_server_available()
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub const fn endpoint(&self) -> &FakeEndpoint {
        self.engine.endpoint()
    }

    /// Recover from an interrupted run, seed demo data once, and load the
    /// first snapshot.
    pub async fn initialize(&mut self) -> Option<String> {
        self.error_message = None;
        if let Err(error) = self.prepare_store().await {
            return self.fail(error);
        }
        if let Some(message) = self.refresh().await {
            return Some(message);
        }
        self.initialized = true;
        None
    }

    async fn prepare_store(&self) -> crate::Result<()> {
        self.store.requeue_interrupted().await?;
        if self.seed_demo_tasks {
            self.store.seed_if_needed(&demo_tasks(now_millis())).await?;
        }
        Ok(())
    }

    /// Reload the snapshot from the store.
    pub async fn refresh(&mut self) -> Option<String> {
        match self.store.read_snapshot().await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                None
            }
            Err(error) => self.fail(error),
        }
    }

    /// Save a field worker's edit, then try to push it right away.
    pub async fn save_task_changes(&mut self, task_id: &TaskId, patch: &TaskPatch) -> Option<String> {
        self.error_message = None;
        if let Err(error) = self.store.save_mutation_and_enqueue(task_id, patch).await {
            return self.fail(error);
        }
        if let Some(message) = self.refresh().await {
            return Some(message);
        }
        self.run_sync_now(REASON_LOCAL_UPDATE, false).await
    }

    /// Run one cycle with the current connectivity, then refresh.
    ///
    /// A pending forced conflict applies to this request only.
    pub async fn run_sync_now(&mut self, reason: &str, ignore_retry_window: bool) -> Option<String> {
        self.error_message = None;
        let request = SyncRequest::new(reason)
            .online(self.connectivity.is_online())
            .ignore_retry_window(ignore_retry_window);

        let result = self.engine.run_cycle(&request).await;
        self.engine.endpoint().set_force_next_conflict(false);

        match result {
            Ok(report) => {
                self.last_sync_summary = report.summary();
                self.last_report = Some(report);
            }
            Err(error) => return self.fail(error),
        }
        self.refresh().await
    }

    /// Keep the server's copy of a conflicted task.
    pub async fn accept_server(&mut self, task_id: &TaskId) -> Option<String> {
        self.error_message = None;
        if let Err(error) = self.resolver.accept_server(task_id).await {
            return self.fail(error);
        }
        self.refresh().await
    }

    /// Re-enqueue the local copy of a conflicted task and sync it.
    pub async fn retry_local(&mut self, task_id: &TaskId) -> Option<String> {
        self.error_message = None;
        let requeued = match self.resolver.retry_local(task_id).await {
            Ok(item) => item.is_some(),
            Err(error) => return self.fail(error),
        };
        if let Some(message) = self.refresh().await {
            return Some(message);
        }
        if requeued {
            return self.run_sync_now(REASON_RETRY_LOCAL, false).await;
        }
        None
    }

    /// Feed a connectivity sample. Coming back online forces a cycle that
    /// ignores retry windows.
    pub async fn set_network_connected(&mut self, connected: bool) -> Option<String> {
        match self.connectivity.observe_network(connected) {
            Transition::CameUp => {
                tracing::info!("Network reconnected");
                self.run_sync_now(REASON_RECONNECTED, true).await
            }
            Transition::WentDown => {
                tracing::info!("Network disconnected");
                None
            }
            Transition::Unchanged => None,
        }
    }

    /// Toggle the remote endpoint. Restoring it with work queued forces a
    /// cycle that ignores retry windows.
    pub async fn set_server_available(&mut self, available: bool) -> Option<String> {
        self.engine.endpoint().set_available(available);
        if self.connectivity.observe_server(available) != Transition::CameUp {
            return None;
        }
        if let Some(message) = self.refresh().await {
            return Some(message);
        }
        if self.snapshot.queue_count() == 0 {
            return None;
        }
        self.run_sync_now(REASON_SERVER_RESTORED, true).await
    }

    /// Make the next sync request come back as a conflict.
    pub fn force_conflict_on_next_sync(&self) {
        self.engine.endpoint().set_force_next_conflict(true);
    }

    /// Scheduler callback: run a cycle, then report completion even on failure.
    pub async fn handle_background_wake(
        &mut self,
        scheduler: &impl WakeScheduler,
        wake_id: &str,
    ) -> Option<String> {
        let outcome = self.run_sync_now(REASON_BACKGROUND, false).await;
        scheduler.finish(wake_id);
        outcome
    }

    fn fail(&mut self, error: impl Display) -> Option<String> {
        let message = error.to_string();
        tracing::error!("{message}");
        self.error_message = Some(message.clone());
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::SEED_TASK_COUNT;
    use crate::models::{BusinessStatus, SyncStatus};
    use crate::Result;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    async fn board() -> TaskBoard {
        let store = LocalStore::open_in_memory().unwrap();
        let mut board = TaskBoard::new(store, FakeEndpoint::new());
        assert_eq!(board.initialize().await, None);
        board
    }

    fn first_task(board: &TaskBoard) -> TaskId {
        let id = TaskId::new("seed_task_001");
        assert!(board.snapshot().tasks.iter().any(|task| task.id == id));
        id
    }

    #[tokio::test]
    async fn initialize_seeds_once() {
        let store = LocalStore::open_in_memory().unwrap();
        let mut board = TaskBoard::new(store.clone(), FakeEndpoint::new());
        assert_eq!(board.initialize().await, None);
        assert!(board.is_initialized());
        assert_eq!(board.snapshot().task_count(), SEED_TASK_COUNT);
        assert_eq!(board.last_sync_summary(), NO_SYNC_YET);

        let mut again = TaskBoard::new(store, FakeEndpoint::new());
        assert_eq!(again.initialize().await, None);
        assert_eq!(again.snapshot().task_count(), SEED_TASK_COUNT);
    }

    #[tokio::test]
    async fn initialize_without_seed_is_empty() {
        let store = LocalStore::open_in_memory().unwrap();
        let mut board = TaskBoard::new(store, FakeEndpoint::new()).with_seed_demo_tasks(false);
        assert_eq!(board.initialize().await, None);
        assert_eq!(board.snapshot().task_count(), 0);
    }

    #[tokio::test]
    async fn save_syncs_immediately_when_online() {
        let mut board = board().await;
        let id = first_task(&board);

        let outcome = board
            .save_task_changes(&id, &TaskPatch::new().with_status(BusinessStatus::InProgress))
            .await;
        assert_eq!(outcome, None);

        let task = board.snapshot().tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(task.sync_status, SyncStatus::Synced);
        assert_eq!(task.business_status, BusinessStatus::InProgress);
        assert_eq!(task.server_version, 2);
        assert_eq!(
            board.last_sync_summary(),
            "Sync local-task-update: checked 1, synced 1, conflicts 0, failed 0."
        );
    }

    #[tokio::test]
    async fn save_unknown_task_reports_error() {
        let mut board = board().await;
        let outcome = board
            .save_task_changes(&TaskId::new("ghost"), &TaskPatch::new())
            .await;
        assert_eq!(outcome.as_deref(), Some("Task not found: ghost"));
        assert_eq!(board.error_message(), Some("Task not found: ghost"));

        board.refresh().await;
        assert_eq!(board.run_sync_now("manual", false).await, None);
        assert_eq!(board.error_message(), None);
    }

    #[tokio::test]
    async fn offline_edits_wait_for_reconnect() {
        let mut board = board().await;
        let id = first_task(&board);

        assert_eq!(board.set_network_connected(false).await, None);
        board
            .save_task_changes(&id, &TaskPatch::new().with_notes("no signal"))
            .await;
        assert_eq!(board.snapshot().queue_count(), 1);
        assert!(board.last_report().unwrap().skipped_offline);

        assert_eq!(board.set_network_connected(true).await, None);
        let report = board.last_report().unwrap();
        assert_eq!(report.reason, REASON_RECONNECTED);
        assert_eq!(report.synced, 1);
        assert_eq!(board.snapshot().queue_count(), 0);
    }

    #[tokio::test]
    async fn server_restore_flushes_backed_off_items() {
        let mut board = board().await;
        let id = first_task(&board);

        board.set_server_available(false).await;
        board
            .save_task_changes(&id, &TaskPatch::new().with_notes("queued"))
            .await;
        assert_eq!(board.snapshot().queue_count(), 1);
        assert_eq!(board.snapshot().count_with_status(SyncStatus::Error), 1);

        // Retry window has not elapsed, but restoring the server ignores it
        assert_eq!(board.set_server_available(true).await, None);
        assert_eq!(board.last_report().unwrap().reason, REASON_SERVER_RESTORED);
        assert_eq!(board.snapshot().queue_count(), 0);
    }

    #[tokio::test]
    async fn server_restore_without_work_does_not_sync() {
        let mut board = board().await;
        board.set_server_available(false).await;
        board.set_server_available(true).await;
        assert!(board.last_report().is_none());
    }

    #[tokio::test]
    async fn forced_conflict_then_accept_server() {
        let mut board = board().await;
        let id = first_task(&board);

        board.force_conflict_on_next_sync();
        board
            .save_task_changes(&id, &TaskPatch::new().with_status(BusinessStatus::Done))
            .await;
        assert_eq!(board.snapshot().conflict_count(), 1);
        assert!(board.snapshot().has_open_conflict(&id));
        assert!(!board.endpoint().force_next_conflict_pending());

        assert_eq!(board.accept_server(&id).await, None);
        assert_eq!(board.snapshot().conflict_count(), 0);
        let task = board.snapshot().tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(task.business_status, BusinessStatus::Cancelled);
        assert_eq!(task.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn retry_local_without_conflict_is_no_op() {
        let mut board = board().await;
        let id = first_task(&board);
        assert_eq!(board.retry_local(&id).await, None);
        assert!(board.last_report().is_none());
    }

    #[derive(Default)]
    struct RecordingScheduler {
        finished: Mutex<Vec<String>>,
    }

    impl WakeScheduler for RecordingScheduler {
        fn register(&self, _interval: Duration) -> Result<()> {
            Ok(())
        }

        fn unregister(&self) -> Result<()> {
            Ok(())
        }

        fn finish(&self, wake_id: &str) {
            self.finished.lock().unwrap().push(wake_id.to_string());
        }
    }

    #[tokio::test]
    async fn background_wake_reports_completion() {
        let mut board = board().await;
        let scheduler = RecordingScheduler::default();

        assert_eq!(board.handle_background_wake(&scheduler, "wake-1").await, None);
        assert_eq!(board.last_report().unwrap().reason, REASON_BACKGROUND);
        assert_eq!(*scheduler.finished.lock().unwrap(), vec!["wake-1".to_string()]);
    }
}
