use crate::commands::common::{board_result, normalize_task_identifier, open_board, AppContext};
use crate::error::CliError;

pub async fn run_accept(id: &str, context: &AppContext) -> Result<(), CliError> {
    let task_id = normalize_task_identifier(id)?;
    let mut board = open_board(context).await?;

    if !board.snapshot().has_open_conflict(&task_id) {
        println!("No open conflict for {task_id}.");
        return Ok(());
    }

    board_result(board.accept_server(&task_id).await)?;
    println!("Kept server copy of {task_id}.");
    Ok(())
}

pub async fn run_retry(id: &str, context: &AppContext) -> Result<(), CliError> {
    let task_id = normalize_task_identifier(id)?;
    let mut board = open_board(context).await?;

    if !board.snapshot().has_open_conflict(&task_id) {
        println!("No open conflict for {task_id}.");
        return Ok(());
    }

    board_result(board.retry_local(&task_id).await)?;
    println!("Re-queued local copy of {task_id}.");
    println!("{}", board.last_sync_summary());
    Ok(())
}
