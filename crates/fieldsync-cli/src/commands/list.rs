use fieldsync_core::models::TaskFilter;

use crate::commands::common::{
    format_task_lines, open_board, task_to_list_item, AppContext, TaskListItem,
};
use crate::error::CliError;

pub async fn run_list(filter: TaskFilter, as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let board = open_board(context).await?;
    let tasks = board.snapshot().filtered_tasks(filter);

    if as_json {
        let json_items = tasks
            .iter()
            .map(|task| task_to_list_item(task))
            .collect::<Vec<TaskListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    for line in format_task_lines(&tasks) {
        println!("{line}");
    }
    Ok(())
}
