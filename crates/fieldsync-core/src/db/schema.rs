//! Database schema

use crate::error::Result;
use rusqlite::Connection;

const STATEMENTS: [&str; 10] = [
    "CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        price REAL NOT NULL,
        business_status TEXT NOT NULL,
        sync_status TEXT NOT NULL,
        location_lat REAL NOT NULL,
        location_lng REAL NOT NULL,
        location_address TEXT NOT NULL,
        image_ref TEXT,
        expires_at INTEGER NOT NULL,
        notes TEXT NOT NULL DEFAULT '',
        server_version INTEGER NOT NULL DEFAULT 0,
        updated_at INTEGER NOT NULL,
        last_synced_at INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_updated ON tasks(updated_at DESC)",
    "CREATE TABLE IF NOT EXISTS sync_queue (
        id TEXT PRIMARY KEY NOT NULL,
        task_id TEXT NOT NULL,
        action_type TEXT NOT NULL,
        payload_json TEXT NOT NULL,
        state TEXT NOT NULL,
        attempt_count INTEGER NOT NULL DEFAULT 0,
        next_retry_at INTEGER NOT NULL,
        last_error TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sync_queue_task ON sync_queue(task_id)",
    "CREATE INDEX IF NOT EXISTS idx_sync_queue_ready ON sync_queue(state, next_retry_at)",
    "CREATE INDEX IF NOT EXISTS idx_sync_queue_created ON sync_queue(created_at)",
    "CREATE TABLE IF NOT EXISTS conflicts (
        id TEXT PRIMARY KEY NOT NULL,
        task_id TEXT NOT NULL UNIQUE,
        server_payload_json TEXT NOT NULL,
        local_payload_json TEXT NOT NULL,
        resolution TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        resolved_at INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_conflicts_resolution ON conflicts(resolution, created_at DESC)",
    "CREATE TABLE IF NOT EXISTS app_metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_sync_status ON tasks(sync_status)",
];

/// Create every table and index that does not exist yet, in one transaction
pub fn initialize(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for stmt in STATEMENTS {
        tx.execute(stmt, [])?;
    }
    tx.commit()?;

    tracing::debug!("Local store schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            != 0
    }

    #[test]
    fn test_initialize_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for table in ["tasks", "sync_queue", "conflicts", "app_metadata"] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_initialize_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap(); // Should not fail
        assert!(table_exists(&conn, "conflicts"));
    }
}
