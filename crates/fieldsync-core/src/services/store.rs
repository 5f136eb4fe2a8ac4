//! Shared handle to the local store used by the engine, resolver, and board.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, SqliteTaskStore, TaskStore};
use crate::models::{
    Conflict, LocalSnapshot, QueueItem, QueueState, RecordId, Task, TaskId, TaskPatch,
};
use crate::Result;

/// Thread-safe service over the single `SQLite` connection.
///
/// Every call takes the connection lock for the duration of one repository
/// operation, so transactional groups never interleave.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl LocalStore {
    /// Open the store at the given filesystem path.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let db = Database::open(&db_path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// On-disk location, if any
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    async fn with_store<T>(&self, op: impl FnOnce(&SqliteTaskStore<'_>) -> Result<T>) -> Result<T> {
        let db = self.db.lock().await;
        let repo = SqliteTaskStore::new(db.connection());
        op(&repo)
    }

    /// Run raw SQL against the connection, bypassing the repository
    #[cfg(test)]
    pub(crate) async fn with_raw_connection<T>(
        &self,
        op: impl FnOnce(&rusqlite::Connection) -> Result<T>,
    ) -> Result<T> {
        let db = self.db.lock().await;
        op(db.connection())
    }

    pub async fn read_snapshot(&self) -> Result<LocalSnapshot> {
        self.with_store(|repo| repo.read_snapshot()).await
    }

    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        self.with_store(|repo| repo.get_task(id)).await
    }

    pub async fn get_queue_item(&self, id: &RecordId) -> Result<Option<QueueItem>> {
        self.with_store(|repo| repo.get_queue_item(id)).await
    }

    pub async fn conflict_for_task(&self, task_id: &TaskId) -> Result<Option<Conflict>> {
        self.with_store(|repo| repo.conflict_for_task(task_id)).await
    }

    pub async fn insert_task(&self, task: &Task) -> Result<()> {
        self.with_store(|repo| repo.insert_task(task)).await
    }

    pub async fn seed_if_needed(&self, tasks: &[Task]) -> Result<bool> {
        self.with_store(|repo| repo.seed_if_needed(tasks)).await
    }

    /// Save a local edit and queue it for upload.
    pub async fn save_mutation_and_enqueue(
        &self,
        task_id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<QueueItem> {
        self.with_store(|repo| repo.save_mutation_and_enqueue(task_id, patch))
            .await
    }

    pub async fn read_ready_queue_items(
        &self,
        now: i64,
        ignore_retry_window: bool,
    ) -> Result<Vec<QueueItem>> {
        self.with_store(|repo| repo.read_ready_queue_items(now, ignore_retry_window))
            .await
    }

    pub async fn mark_processing(&self, id: &RecordId) -> Result<()> {
        self.with_store(|repo| repo.mark_processing(id)).await
    }

    pub async fn mark_retry(&self, id: &RecordId, attempt_count: i64, error: &str) -> Result<()> {
        self.with_store(|repo| repo.mark_retry(id, attempt_count, error))
            .await
    }

    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        self.with_store(|repo| repo.remove(id)).await
    }

    pub async fn mark_task_syncing(&self, task_id: &TaskId) -> Result<()> {
        self.with_store(|repo| repo.mark_task_syncing(task_id)).await
    }

    pub async fn mark_task_synced(
        &self,
        task_id: &TaskId,
        server_version: i64,
        synced_at: i64,
    ) -> Result<()> {
        self.with_store(|repo| repo.mark_task_synced(task_id, server_version, synced_at))
            .await
    }

    pub async fn mark_task_sync_error(&self, task_id: &TaskId) -> Result<()> {
        self.with_store(|repo| repo.mark_task_sync_error(task_id))
            .await
    }

    pub async fn record_conflict(
        &self,
        task_id: &TaskId,
        server_task: &Task,
        local_payload: &str,
    ) -> Result<Conflict> {
        self.with_store(|repo| repo.record_conflict(task_id, server_task, local_payload))
            .await
    }

    pub async fn resolve_accept_server(&self, task_id: &TaskId) -> Result<bool> {
        self.with_store(|repo| repo.resolve_accept_server(task_id))
            .await
    }

    pub async fn resolve_retry_local(&self, task_id: &TaskId) -> Result<Option<QueueItem>> {
        self.with_store(|repo| repo.resolve_retry_local(task_id))
            .await
    }

    pub async fn requeue_interrupted(&self) -> Result<usize> {
        self.with_store(|repo| repo.requeue_interrupted()).await
    }

    pub async fn release_processing(
        &self,
        item_id: &RecordId,
        task_id: &TaskId,
        state: QueueState,
    ) -> Result<()> {
        self.with_store(|repo| repo.release_processing(item_id, task_id, state))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::sample_task;
    use tempfile::tempdir;

    #[tokio::test]
    async fn in_memory_insert_and_snapshot() {
        let store = LocalStore::open_in_memory().unwrap();
        store.insert_task(&sample_task("t1")).await.unwrap();

        let snapshot = store.read_snapshot().await.unwrap();
        assert_eq!(snapshot.task_count(), 1);
        assert!(store.db_path().is_none());
    }

    #[tokio::test]
    async fn on_disk_store_survives_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("fieldsync.db");

        let store = LocalStore::open_path(&path).unwrap();
        store.insert_task(&sample_task("t1")).await.unwrap();
        store
            .save_mutation_and_enqueue(&TaskId::new("t1"), &TaskPatch::new().with_notes("x"))
            .await
            .unwrap();
        drop(store);

        let reopened = LocalStore::open_path(&path).unwrap();
        let snapshot = reopened.read_snapshot().await.unwrap();
        assert_eq!(snapshot.queue_count(), 1);
        assert_eq!(reopened.db_path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn clones_share_one_connection() {
        let store = LocalStore::open_in_memory().unwrap();
        let clone = store.clone();
        clone.insert_task(&sample_task("shared")).await.unwrap();

        assert!(store
            .get_task(&TaskId::new("shared"))
            .await
            .unwrap()
            .is_some());
    }
}
