use crate::commands::common::{
    format_queue_lines, open_board, queue_item_to_list_item, AppContext, QueueListItem,
};
use crate::error::CliError;

pub async fn run_queue(as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let board = open_board(context).await?;
    let items = &board.snapshot().queue_items;

    if as_json {
        let json_items = items
            .iter()
            .map(queue_item_to_list_item)
            .collect::<Vec<QueueListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Sync queue is empty.");
        return Ok(());
    }

    for line in format_queue_lines(items) {
        println!("{line}");
    }
    Ok(())
}
