//! Task, queue, and conflict repository
//!
//! Every operation that touches more than one row runs inside a single
//! transaction. Dropping an uncommitted `rusqlite::Transaction` rolls it
//! back, so an early `?` return leaves the store exactly as it was.

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::{
    Conflict, ConflictResolution, LocalSnapshot, QueueItem, QueueState, RecordId, SyncStatus,
    Task, TaskId, TaskLocation, TaskPatch,
};
use crate::sync::backoff::retry_delay_millis;
use crate::util::now_millis;
use rusqlite::{params, Connection, OptionalExtension};

/// Upper bound on queue items handed to one sync cycle
pub const READY_BATCH_LIMIT: usize = 50;

const SEED_KEY: &str = "initial_seed_completed";

const TASK_COLUMNS: &str = "id, title, price, business_status, sync_status, location_lat, \
     location_lng, location_address, image_ref, expires_at, notes, server_version, updated_at, \
     last_synced_at";

const QUEUE_COLUMNS: &str = "id, task_id, action_type, payload_json, state, attempt_count, \
     next_retry_at, last_error, created_at, updated_at";

const CONFLICT_COLUMNS: &str = "id, task_id, server_payload_json, local_payload_json, \
     resolution, created_at, resolved_at";

/// Storage operations for the local task store
pub trait TaskStore {
    /// Read tasks, queue, and open conflicts at one transaction boundary
    fn read_snapshot(&self) -> Result<LocalSnapshot>;

    /// Get a task by ID
    fn get_task(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Get a queue item by ID
    fn get_queue_item(&self, id: &RecordId) -> Result<Option<QueueItem>>;

    /// Latest conflict recorded for a task, open or resolved
    fn conflict_for_task(&self, task_id: &TaskId) -> Result<Option<Conflict>>;

    /// Insert or replace a task as-is (seeding and imports)
    fn insert_task(&self, task: &Task) -> Result<()>;

    /// Insert the demo tasks once; returns whether anything was written
    fn seed_if_needed(&self, tasks: &[Task]) -> Result<bool>;

    /// Apply a local edit and enqueue its snapshot for upload
    fn save_mutation_and_enqueue(&self, task_id: &TaskId, patch: &TaskPatch)
        -> Result<QueueItem>;

    /// Queue items eligible for a cycle, FIFO, capped at [`READY_BATCH_LIMIT`]
    fn read_ready_queue_items(&self, now: i64, ignore_retry_window: bool)
        -> Result<Vec<QueueItem>>;

    fn mark_processing(&self, id: &RecordId) -> Result<()>;

    /// Mark an item failed with its new attempt count and schedule the retry
    fn mark_retry(&self, id: &RecordId, attempt_count: i64, error: &str) -> Result<()>;

    fn remove(&self, id: &RecordId) -> Result<()>;

    fn mark_task_syncing(&self, task_id: &TaskId) -> Result<()>;

    fn mark_task_synced(&self, task_id: &TaskId, server_version: i64, synced_at: i64)
        -> Result<()>;

    fn mark_task_sync_error(&self, task_id: &TaskId) -> Result<()>;

    /// Replace the task with the server's copy in `conflict` state and open a
    /// pending conflict holding both views
    fn record_conflict(
        &self,
        task_id: &TaskId,
        server_task: &Task,
        local_payload: &str,
    ) -> Result<Conflict>;

    /// Keep the server's copy. Returns `false` when no conflict is pending.
    fn resolve_accept_server(&self, task_id: &TaskId) -> Result<bool>;

    /// Re-enqueue the rejected local copy. Returns `None` when no conflict is
    /// pending.
    fn resolve_retry_local(&self, task_id: &TaskId) -> Result<Option<QueueItem>>;

    /// Undo `processing`/`syncing` markers left behind by an interrupted cycle
    fn requeue_interrupted(&self) -> Result<usize>;

    /// Put one item abandoned mid-cycle back into `state` and its task back
    /// to `pending_sync` if it was left `syncing`
    fn release_processing(&self, item_id: &RecordId, task_id: &TaskId, state: QueueState)
        -> Result<()>;
}

/// `SQLite` implementation of `TaskStore`
pub struct SqliteTaskStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteTaskStore<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        Ok(Task {
            id: row.get(0)?,
            title: row.get(1)?,
            price: row.get(2)?,
            business_status: row.get(3)?,
            sync_status: row.get(4)?,
            location: TaskLocation {
                latitude: row.get(5)?,
                longitude: row.get(6)?,
                address: row.get(7)?,
            },
            image_ref: row.get(8)?,
            expires_at: row.get(9)?,
            notes: row.get(10)?,
            server_version: row.get(11)?,
            updated_at: row.get(12)?,
            last_synced_at: row.get(13)?,
        })
    }

    fn parse_queue_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueItem> {
        Ok(QueueItem {
            id: row.get(0)?,
            task_id: row.get(1)?,
            action: row.get(2)?,
            payload: row.get(3)?,
            state: row.get(4)?,
            attempt_count: row.get(5)?,
            next_retry_at: row.get(6)?,
            last_error: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn parse_conflict(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conflict> {
        Ok(Conflict {
            id: row.get(0)?,
            task_id: row.get(1)?,
            server_payload: row.get(2)?,
            local_payload: row.get(3)?,
            resolution: row.get(4)?,
            created_at: row.get(5)?,
            resolved_at: row.get(6)?,
        })
    }

    fn fetch_task(conn: &Connection, id: &TaskId) -> Result<Option<Task>> {
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
                [id],
                Self::parse_task,
            )
            .optional()?;
        Ok(task)
    }

    fn fetch_pending_conflict(conn: &Connection, task_id: &TaskId) -> Result<Option<Conflict>> {
        let conflict = conn
            .query_row(
                &format!(
                    "SELECT {CONFLICT_COLUMNS} FROM conflicts WHERE task_id = ? AND resolution = ?"
                ),
                params![task_id, ConflictResolution::Pending],
                Self::parse_conflict,
            )
            .optional()?;
        Ok(conflict)
    }

    fn write_task(conn: &Connection, task: &Task) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO tasks ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                task.id,
                task.title,
                task.price,
                task.business_status,
                task.sync_status,
                task.location.latitude,
                task.location.longitude,
                task.location.address,
                task.image_ref,
                task.expires_at,
                task.notes,
                task.server_version,
                task.updated_at,
                task.last_synced_at,
            ],
        )?;
        Ok(())
    }

    /// Drop whatever is queued for the task and queue `item` in its place
    fn replace_queue_item(conn: &Connection, item: &QueueItem) -> Result<()> {
        conn.execute("DELETE FROM sync_queue WHERE task_id = ?", [&item.task_id])?;
        conn.execute(
            &format!(
                "INSERT INTO sync_queue ({QUEUE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                item.id,
                item.task_id,
                item.action,
                item.payload,
                item.state,
                item.attempt_count,
                item.next_retry_at,
                item.last_error,
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    fn write_conflict(conn: &Connection, conflict: &Conflict) -> Result<()> {
        conn.execute(
            "DELETE FROM conflicts WHERE task_id = ?",
            [&conflict.task_id],
        )?;
        conn.execute(
            &format!("INSERT INTO conflicts ({CONFLICT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                conflict.id,
                conflict.task_id,
                conflict.server_payload,
                conflict.local_payload,
                conflict.resolution,
                conflict.created_at,
                conflict.resolved_at,
            ],
        )?;
        Ok(())
    }

    fn close_conflict(
        conn: &Connection,
        task_id: &TaskId,
        resolution: ConflictResolution,
        now: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE conflicts SET resolution = ?, resolved_at = ? WHERE task_id = ? AND resolution = ?",
            params![resolution, now, task_id, ConflictResolution::Pending],
        )?;
        Ok(())
    }

    fn set_task_status(&self, task_id: &TaskId, status: SyncStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET sync_status = ?, updated_at = ? WHERE id = ?",
            params![status, now_millis(), task_id],
        )?;
        Ok(())
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn read_snapshot(&self) -> Result<LocalSnapshot> {
        let tx = self.conn.unchecked_transaction()?;

        let tasks = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks ORDER BY updated_at DESC, id ASC"
            ))?;
            let tasks = stmt
                .query_map([], Self::parse_task)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            tasks
        };

        let queue_items = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM sync_queue ORDER BY created_at ASC, rowid ASC"
            ))?;
            let items = stmt
                .query_map([], Self::parse_queue_item)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            items
        };

        let open_conflicts = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {CONFLICT_COLUMNS} FROM conflicts
                 WHERE resolution = ?
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let conflicts = stmt
                .query_map([ConflictResolution::Pending], Self::parse_conflict)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            conflicts
        };

        tx.commit()?;

        Ok(LocalSnapshot {
            tasks,
            queue_items,
            open_conflicts,
        })
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        Self::fetch_task(self.conn, id)
    }

    fn get_queue_item(&self, id: &RecordId) -> Result<Option<QueueItem>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {QUEUE_COLUMNS} FROM sync_queue WHERE id = ?"),
                [id],
                Self::parse_queue_item,
            )
            .optional()?;
        Ok(item)
    }

    fn conflict_for_task(&self, task_id: &TaskId) -> Result<Option<Conflict>> {
        let conflict = self
            .conn
            .query_row(
                &format!("SELECT {CONFLICT_COLUMNS} FROM conflicts WHERE task_id = ?"),
                [task_id],
                Self::parse_conflict,
            )
            .optional()?;
        Ok(conflict)
    }

    fn insert_task(&self, task: &Task) -> Result<()> {
        Self::write_task(self.conn, task)
    }

    fn seed_if_needed(&self, tasks: &[Task]) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;

        let seeded: Option<String> = tx
            .query_row(
                "SELECT value FROM app_metadata WHERE key = ?",
                [SEED_KEY],
                |row| row.get(0),
            )
            .optional()?;
        if seeded.as_deref() == Some("true") {
            return Ok(false);
        }

        for task in tasks {
            Self::write_task(&tx, task)?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO app_metadata (key, value) VALUES (?, 'true')",
            [SEED_KEY],
        )?;
        tx.commit()?;

        tracing::info!("Seeded {} demo tasks", tasks.len());
        Ok(true)
    }

    fn save_mutation_and_enqueue(
        &self,
        task_id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<QueueItem> {
        let tx = self.conn.unchecked_transaction()?;

        let mut task =
            Self::fetch_task(&tx, task_id)?.ok_or_else(|| Error::NotFound(task_id.to_string()))?;

        let now = now_millis();
        task.apply_patch(patch);
        task.sync_status = SyncStatus::PendingSync;
        task.updated_at = now;
        let item = QueueItem::upsert_for(&task, now)?;

        Self::write_task(&tx, &task)?;
        Self::replace_queue_item(&tx, &item)?;
        tx.execute("DELETE FROM conflicts WHERE task_id = ?", [task_id])?;
        tx.commit()?;

        tracing::debug!("Queued upsert {} for task {}", item.id, task_id);
        Ok(item)
    }

    fn read_ready_queue_items(
        &self,
        now: i64,
        ignore_retry_window: bool,
    ) -> Result<Vec<QueueItem>> {
        let limit = READY_BATCH_LIMIT as i64;
        let items = if ignore_retry_window {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM sync_queue
                 WHERE state IN (?1, ?2)
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT ?3"
            ))?;
            let items = stmt
                .query_map(
                    params![QueueState::Queued, QueueState::Failed, limit],
                    Self::parse_queue_item,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            items
        } else {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {QUEUE_COLUMNS} FROM sync_queue
                 WHERE state IN (?1, ?2) AND next_retry_at <= ?3
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT ?4"
            ))?;
            let items = stmt
                .query_map(
                    params![QueueState::Queued, QueueState::Failed, now, limit],
                    Self::parse_queue_item,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            items
        };

        Ok(items)
    }

    fn mark_processing(&self, id: &RecordId) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_queue SET state = ?, updated_at = ? WHERE id = ?",
            params![QueueState::Processing, now_millis(), id],
        )?;
        Ok(())
    }

    fn mark_retry(&self, id: &RecordId, attempt_count: i64, error: &str) -> Result<()> {
        let now = now_millis();
        // The n-th failure waits delay(n - 1): 3s after the first, then 6s, 12s, ...
        let next_retry_at = now.saturating_add(retry_delay_millis(attempt_count - 1));

        self.conn.execute(
            "UPDATE sync_queue
             SET state = ?, attempt_count = ?, next_retry_at = ?, last_error = ?, updated_at = ?
             WHERE id = ?",
            params![QueueState::Failed, attempt_count, next_retry_at, error, now, id],
        )?;
        Ok(())
    }

    fn remove(&self, id: &RecordId) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_queue WHERE id = ?", [id])?;
        Ok(())
    }

    fn mark_task_syncing(&self, task_id: &TaskId) -> Result<()> {
        self.set_task_status(task_id, SyncStatus::Syncing)
    }

    fn mark_task_synced(
        &self,
        task_id: &TaskId,
        server_version: i64,
        synced_at: i64,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks
             SET sync_status = ?, server_version = ?, last_synced_at = ?, updated_at = ?
             WHERE id = ?",
            params![SyncStatus::Synced, server_version, synced_at, synced_at, task_id],
        )?;
        Ok(())
    }

    fn mark_task_sync_error(&self, task_id: &TaskId) -> Result<()> {
        self.set_task_status(task_id, SyncStatus::Error)
    }

    fn record_conflict(
        &self,
        task_id: &TaskId,
        server_task: &Task,
        local_payload: &str,
    ) -> Result<Conflict> {
        let now = now_millis();

        let mut task = server_task.clone();
        task.id = task_id.clone();
        task.sync_status = SyncStatus::Conflict;
        task.updated_at = now;

        let conflict = Conflict {
            id: RecordId::new(),
            task_id: task_id.clone(),
            server_payload: server_task.to_payload()?,
            local_payload: local_payload.to_string(),
            resolution: ConflictResolution::Pending,
            created_at: now,
            resolved_at: None,
        };

        let tx = self.conn.unchecked_transaction()?;
        Self::write_task(&tx, &task)?;
        Self::write_conflict(&tx, &conflict)?;
        tx.commit()?;

        Ok(conflict)
    }

    fn resolve_accept_server(&self, task_id: &TaskId) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        if Self::fetch_pending_conflict(&tx, task_id)?.is_none() {
            return Ok(false);
        }

        let now = now_millis();
        tx.execute(
            "UPDATE tasks SET sync_status = ?, last_synced_at = ?, updated_at = ? WHERE id = ?",
            params![SyncStatus::Synced, now, now, task_id],
        )?;
        Self::close_conflict(&tx, task_id, ConflictResolution::AcceptServer, now)?;
        tx.commit()?;

        Ok(true)
    }

    fn resolve_retry_local(&self, task_id: &TaskId) -> Result<Option<QueueItem>> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(conflict) = Self::fetch_pending_conflict(&tx, task_id)? else {
            return Ok(None);
        };

        let now = now_millis();
        let mut task = conflict.local_task()?;
        task.sync_status = SyncStatus::PendingSync;
        task.updated_at = now;
        let item = QueueItem::upsert_for(&task, now)?;

        Self::write_task(&tx, &task)?;
        Self::replace_queue_item(&tx, &item)?;
        Self::close_conflict(&tx, task_id, ConflictResolution::RetryLocal, now)?;
        tx.commit()?;

        Ok(Some(item))
    }

    fn requeue_interrupted(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let now = now_millis();

        let items = tx.execute(
            "UPDATE sync_queue SET state = ?, updated_at = ? WHERE state = ?",
            params![QueueState::Queued, now, QueueState::Processing],
        )?;
        tx.execute(
            "UPDATE tasks SET sync_status = ?, updated_at = ? WHERE sync_status = ?",
            params![SyncStatus::PendingSync, now, SyncStatus::Syncing],
        )?;
        tx.commit()?;

        if items > 0 {
            tracing::warn!("Requeued {items} queue items left processing by an interrupted cycle");
        }
        Ok(items)
    }

    fn release_processing(
        &self,
        item_id: &RecordId,
        task_id: &TaskId,
        state: QueueState,
    ) -> Result<()> {
        let state = if state.is_ready_state() {
            state
        } else {
            QueueState::Queued
        };
        let tx = self.conn.unchecked_transaction()?;
        let now = now_millis();

        tx.execute(
            "UPDATE sync_queue SET state = ?, updated_at = ? WHERE id = ? AND state = ?",
            params![state, now, item_id, QueueState::Processing],
        )?;
        tx.execute(
            "UPDATE tasks SET sync_status = ?, updated_at = ? WHERE id = ? AND sync_status = ?",
            params![SyncStatus::PendingSync, now, task_id, SyncStatus::Syncing],
        )?;
        tx.commit()?;
        Ok(())
    }
}
