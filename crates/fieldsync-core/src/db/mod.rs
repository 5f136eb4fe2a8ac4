//! Local persistent store for tasks, the sync queue, and conflicts

mod connection;
mod repository;
mod schema;
pub mod seed;
mod sql_types;

pub use connection::Database;
pub use repository::{SqliteTaskStore, TaskStore, READY_BATCH_LIMIT};
