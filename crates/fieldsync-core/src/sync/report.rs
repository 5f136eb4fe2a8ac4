//! Cycle request and report types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for one sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Free-form trigger label (`local-task-update`, `network-reconnected`, ...)
    pub reason: String,
    /// Connectivity as sampled by the caller
    pub online: bool,
    /// Process failed items even if their retry time has not come yet
    pub ignore_retry_window: bool,
}

impl SyncRequest {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            online: true,
            ignore_retry_window: false,
        }
    }

    #[must_use]
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    #[must_use]
    pub fn ignore_retry_window(mut self, ignore: bool) -> Self {
        self.ignore_retry_window = ignore;
        self
    }
}

/// What a cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCycleReport {
    pub reason: String,
    pub items_checked: usize,
    pub synced: usize,
    pub conflicts: usize,
    pub failed: usize,
    pub skipped_offline: bool,
    pub skipped_already_running: bool,
}

impl SyncCycleReport {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::default()
        }
    }

    pub const fn was_skipped(&self) -> bool {
        self.skipped_offline || self.skipped_already_running
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SyncCycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped_already_running {
            return write!(
                f,
                "Sync skipped: another cycle is already running ({}).",
                self.reason
            );
        }
        if self.skipped_offline {
            return write!(f, "Sync skipped: device is offline ({}).", self.reason);
        }
        write!(
            f,
            "Sync {}: checked {}, synced {}, conflicts {}, failed {}.",
            self.reason, self.items_checked, self.synced, self.conflicts, self.failed
        )
    }
}
