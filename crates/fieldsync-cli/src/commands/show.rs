use serde::Serialize;

use crate::commands::common::{
    conflict_to_list_item, find_task, format_conflict_lines, format_queue_lines,
    format_task_details, normalize_task_identifier, open_board, queue_item_to_list_item,
    task_to_list_item, AppContext, ConflictListItem, QueueListItem, TaskListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct TaskDetails {
    task: TaskListItem,
    queue_item: Option<QueueListItem>,
    conflict: Option<ConflictListItem>,
}

pub async fn run_show(id: &str, as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let task_id = normalize_task_identifier(id)?;
    let board = open_board(context).await?;
    let task = find_task(&board, &task_id)?;

    let queue_item = board
        .snapshot()
        .queue_items
        .iter()
        .find(|item| item.task_id == task_id)
        .cloned();
    let conflict = board.store().conflict_for_task(&task_id).await?;

    if as_json {
        let details = TaskDetails {
            task: task_to_list_item(task),
            queue_item: queue_item.as_ref().map(queue_item_to_list_item),
            conflict: conflict.as_ref().map(conflict_to_list_item),
        };
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    for line in format_task_details(task) {
        println!("{line}");
    }
    if let Some(item) = queue_item {
        println!("queued:");
        for line in format_queue_lines(&[item]) {
            println!("  {line}");
        }
    }
    if let Some(conflict) = conflict {
        println!("conflict:");
        for line in format_conflict_lines(&[conflict]) {
            println!("  {line}");
        }
    }
    Ok(())
}
