use crate::commands::common::{board_result, open_board, AppContext};
use crate::error::CliError;

const REASON_MANUAL: &str = "manual";

/// Simulated conditions for a one-off cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub ignore_retry_window: bool,
    pub offline: bool,
    pub server_unavailable: bool,
    pub force_conflict: bool,
}

pub async fn run_sync(
    options: SyncOptions,
    as_json: bool,
    context: &AppContext,
) -> Result<(), CliError> {
    let mut board = open_board(context).await?;

    if options.offline {
        board.set_network_connected(false).await;
    }
    if options.server_unavailable {
        board.set_server_available(false).await;
    }
    if options.force_conflict {
        board.force_conflict_on_next_sync();
    }

    let outcome = board
        .run_sync_now(REASON_MANUAL, options.ignore_retry_window)
        .await;

    if as_json {
        if let Some(report) = board.last_report() {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    } else {
        println!("{}", board.last_sync_summary());
    }
    board_result(outcome)
}
