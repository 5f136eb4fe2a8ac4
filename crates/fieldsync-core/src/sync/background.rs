//! Periodic background wake registration

use std::time::Duration;

use crate::Result;

/// Default wake interval (15 minutes)
pub const DEFAULT_WAKE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Platform scheduler that periodically wakes the process to sync.
pub trait WakeScheduler {
    /// Register the periodic wake.
    fn register(&self, interval: Duration) -> Result<()>;

    /// Stop waking the process.
    fn unregister(&self) -> Result<()>;

    /// Tell the scheduler the work for `wake_id` is done.
    fn finish(&self, wake_id: &str);
}

/// Register with the scheduler, logging instead of failing.
pub fn register_best_effort(scheduler: &impl WakeScheduler, interval: Duration) -> bool {
    match scheduler.register(interval) {
        Ok(()) => {
            tracing::info!("Background sync registered every {}s", interval.as_secs());
            true
        }
        Err(error) => {
            tracing::warn!("Background sync registration failed: {error}");
            false
        }
    }
}

/// Unregister from the scheduler, logging instead of failing.
pub fn unregister_best_effort(scheduler: &impl WakeScheduler) -> bool {
    match scheduler.unregister() {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!("Background sync unregistration failed: {error}");
            false
        }
    }
}
