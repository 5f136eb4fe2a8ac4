use std::time::Duration;

use fieldsync_core::services::REASON_STARTUP;
use fieldsync_core::sync::background::{register_best_effort, unregister_best_effort};
use fieldsync_core::sync::WakeScheduler;

use crate::commands::common::{open_board, AppContext};
use crate::error::CliError;

/// Wake scheduler for a foreground process: the interval loop in
/// [`run_watch`] does the waking, this only records the bookkeeping.
#[derive(Debug, Default)]
pub struct TerminalScheduler;

impl WakeScheduler for TerminalScheduler {
    fn register(&self, interval: Duration) -> fieldsync_core::Result<()> {
        tracing::debug!("Foreground wake every {}s", interval.as_secs());
        Ok(())
    }

    fn unregister(&self) -> fieldsync_core::Result<()> {
        Ok(())
    }

    fn finish(&self, wake_id: &str) {
        tracing::debug!("Wake {wake_id} finished");
    }
}

pub fn resolve_interval(
    interval_secs: Option<u64>,
    context: &AppContext,
) -> Result<Duration, CliError> {
    let interval = interval_secs.map_or_else(
        || context.config.background_interval(),
        Duration::from_secs,
    );
    if interval.is_zero() {
        return Err(CliError::InvalidInterval);
    }
    Ok(interval)
}

pub async fn run_watch(
    interval_secs: Option<u64>,
    cycles: Option<u32>,
    context: &AppContext,
) -> Result<(), CliError> {
    let interval = resolve_interval(interval_secs, context)?;
    let mut board = open_board(context).await?;
    let scheduler = TerminalScheduler;
    register_best_effort(&scheduler, interval);

    if let Some(message) = board.run_sync_now(REASON_STARTUP, false).await {
        eprintln!("Error: {message}");
    }
    println!("{}", board.last_sync_summary());

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately; the startup cycle already covered it
    ticker.tick().await;

    let mut wakes = 0u32;
    while cycles.is_none_or(|limit| wakes < limit) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
        }

        wakes += 1;
        let wake_id = format!("wake-{wakes}");
        if let Some(message) = board.handle_background_wake(&scheduler, &wake_id).await {
            eprintln!("Error: {message}");
        }
        println!("{}", board.last_sync_summary());
    }

    unregister_best_effort(&scheduler);
    Ok(())
}
