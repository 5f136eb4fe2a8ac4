//! Data models for Fieldsync

mod conflict;
mod patch;
mod queue_item;
mod snapshot;
pub(crate) mod task;

pub use conflict::{Conflict, ConflictResolution};
pub use patch::{FieldUpdate, NullableUpdate, TaskPatch};
pub use queue_item::{QueueAction, QueueItem, QueueState, RecordId};
pub use snapshot::{LocalSnapshot, TaskFilter};
pub use task::{BusinessStatus, SyncStatus, Task, TaskId, TaskLocation};
