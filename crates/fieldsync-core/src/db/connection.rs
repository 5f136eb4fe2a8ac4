//! Database connection management

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

use super::schema;

/// Owner of the `SQLite` connection backing the local store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Creates the schema automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened local store at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let database = Self { conn };
        database.configure()?;
        schema::initialize(&database.conn)?;
        Ok(database)
    }

    /// Configure `SQLite` for a single-writer local store
    fn configure(&self) -> Result<()> {
        // WAL is unavailable for in-memory databases; the pragma reports the
        // mode actually in effect instead of failing.
        self.conn
            .query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))
            .ok();
        self.conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
