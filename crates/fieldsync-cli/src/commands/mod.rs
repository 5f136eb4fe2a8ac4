pub mod common;
pub mod completions;
pub mod conflicts;
pub mod list;
pub mod queue;
pub mod resolve;
pub mod show;
pub mod sync;
pub mod update;
pub mod watch;
