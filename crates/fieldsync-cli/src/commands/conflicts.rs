use crate::commands::common::{
    conflict_to_list_item, format_conflict_lines, open_board, AppContext, ConflictListItem,
};
use crate::error::CliError;

pub async fn run_conflicts(as_json: bool, context: &AppContext) -> Result<(), CliError> {
    let board = open_board(context).await?;
    let conflicts = &board.snapshot().open_conflicts;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(conflict_to_list_item)
            .collect::<Vec<ConflictListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No open conflicts.");
        return Ok(());
    }

    for line in format_conflict_lines(conflicts) {
        println!("{line}");
    }
    Ok(())
}
