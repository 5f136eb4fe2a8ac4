use fieldsync_core::models::{BusinessStatus, TaskPatch};
use fieldsync_core::util::normalize_text_option;

use crate::commands::common::{
    board_result, find_task, format_task_details, normalize_task_identifier, open_board,
    AppContext,
};
use crate::error::CliError;

/// Build a patch from the update flags. Blank `--image` is treated as absent.
pub fn build_patch(
    status: Option<BusinessStatus>,
    notes: Option<String>,
    image: Option<String>,
    clear_image: bool,
) -> Result<TaskPatch, CliError> {
    let mut patch = TaskPatch::new();
    if let Some(status) = status {
        patch = patch.with_status(status);
    }
    if let Some(notes) = notes {
        patch = patch.with_notes(notes.trim());
    }
    if clear_image {
        patch = patch.clear_image();
    } else if let Some(image) = normalize_text_option(image) {
        patch = patch.with_image(image);
    }

    if patch.is_empty() {
        return Err(CliError::NoChanges);
    }
    Ok(patch)
}

pub async fn run_update(
    id: &str,
    patch: &TaskPatch,
    context: &AppContext,
) -> Result<(), CliError> {
    let task_id = normalize_task_identifier(id)?;
    let mut board = open_board(context).await?;

    board_result(board.save_task_changes(&task_id, patch).await)?;

    for line in format_task_details(find_task(&board, &task_id)?) {
        println!("{line}");
    }
    println!("{}", board.last_sync_summary());
    Ok(())
}
