//! Offline queue synchronization: the cycle runner, its remote endpoint
//! contract, conflict resolution, and the triggers that start cycles.

pub mod background;
pub mod backoff;
mod connectivity;
mod endpoint;
mod engine;
mod fake_endpoint;
mod report;
mod resolver;


pub use background::{WakeScheduler, DEFAULT_WAKE_INTERVAL};
pub use backoff::retry_delay_secs;
pub use connectivity::{ConnectivityMonitor, Transition};
pub use endpoint::{RemoteEndpoint, UpsertOutcome};
pub use engine::SyncEngine;
pub use fake_endpoint::FakeEndpoint;
pub use report::{SyncCycleReport, SyncRequest};
pub use resolver::ConflictResolver;
