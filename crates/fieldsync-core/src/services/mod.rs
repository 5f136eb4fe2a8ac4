//! Async services shared by every client surface.

mod board;
mod store;

pub use board::{
    TaskBoard, REASON_BACKGROUND, REASON_LOCAL_UPDATE, REASON_RECONNECTED, REASON_RETRY_LOCAL,
    REASON_SERVER_RESTORED, REASON_STARTUP,
};
pub use store::LocalStore;
