use std::path::{Path, PathBuf};

use chrono::Utc;
use fieldsync_core::config::{default_config_path, AppConfig};
use fieldsync_core::models::{Conflict, QueueItem, Task, TaskId};
use fieldsync_core::services::{LocalStore, TaskBoard};
use fieldsync_core::sync::FakeEndpoint;
use serde::Serialize;

use crate::error::CliError;

/// Resolved configuration for one CLI invocation
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub db_path: PathBuf,
}

impl AppContext {
    pub fn load(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Self, CliError> {
        let config_path = config_path.map_or_else(default_config_path, Path::to_path_buf);
        let config = AppConfig::load_from_path(&config_path)?;
        let db_path = config.resolve_db_path(db_path);
        tracing::debug!("Using database at {}", db_path.display());
        Ok(Self { config, db_path })
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub business_status: String,
    pub sync_status: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_ref: Option<String>,
    pub notes: String,
    pub server_version: i64,
    pub expires_at: i64,
    pub updated_at: i64,
    pub last_synced_at: Option<i64>,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct QueueListItem {
    pub id: String,
    pub task_id: String,
    pub action: String,
    pub state: String,
    pub attempt_count: i64,
    pub next_retry_at: i64,
    pub next_retry_at_iso: String,
    pub last_error: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct ConflictListItem {
    pub id: String,
    pub task_id: String,
    pub resolution: String,
    pub created_at: i64,
    pub created_at_iso: String,
    pub resolved_at: Option<i64>,
    pub local: Option<serde_json::Value>,
    pub server: Option<serde_json::Value>,
}

/// Open the store and bring the board up, seeding and recovering as needed.
pub async fn open_board(context: &AppContext) -> Result<TaskBoard, CliError> {
    let store = LocalStore::open_path(&context.db_path)?;
    let mut board = TaskBoard::new(store, FakeEndpoint::new())
        .with_seed_demo_tasks(context.config.seed_demo_tasks);
    if let Some(message) = board.initialize().await {
        return Err(CliError::Board(message));
    }
    Ok(board)
}

pub fn normalize_task_identifier(id: &str) -> Result<TaskId, CliError> {
    id.parse::<TaskId>().map_err(|_| CliError::EmptyTaskId)
}

/// Turn a board entry point's optional message into a CLI result
pub fn board_result(outcome: Option<String>) -> Result<(), CliError> {
    outcome.map_or(Ok(()), |message| Err(CliError::Board(message)))
}

pub fn find_task<'a>(board: &'a TaskBoard, id: &TaskId) -> Result<&'a Task, CliError> {
    board
        .snapshot()
        .tasks
        .iter()
        .find(|task| &task.id == id)
        .ok_or_else(|| CliError::TaskNotFound(id.to_string()))
}

pub fn format_task_lines(tasks: &[&Task]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    tasks
        .iter()
        .map(|task| format_task_line(task, now_ms))
        .collect()
}

pub fn format_task_line(task: &Task, now_ms: i64) -> String {
    let title = truncate(&task.title, 36);
    let relative_time = format_relative_time(task.updated_at, now_ms);
    format!(
        "{:<14}  {title:<36}  {:<11}  {:<12}  ${:>6.2}  {relative_time}",
        task.id.as_str(),
        task.business_status.as_str(),
        task.sync_status.as_str(),
        task.price,
    )
}

pub fn task_to_list_item(task: &Task) -> TaskListItem {
    let now_ms = Utc::now().timestamp_millis();
    TaskListItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        price: task.price,
        business_status: task.business_status.to_string(),
        sync_status: task.sync_status.to_string(),
        address: task.location.address.clone(),
        latitude: task.location.latitude,
        longitude: task.location.longitude,
        image_ref: task.image_ref.clone(),
        notes: task.notes.clone(),
        server_version: task.server_version,
        expires_at: task.expires_at,
        updated_at: task.updated_at,
        last_synced_at: task.last_synced_at,
        relative_time: format_relative_time(task.updated_at, now_ms),
    }
}

pub fn format_task_details(task: &Task) -> Vec<String> {
    let mut lines = vec![
        format!("{}  {}", task.id, task.title),
        format!("  status:     {}", task.business_status),
        format!("  sync:       {}", task.sync_status),
        format!("  price:      ${:.2}", task.price),
        format!(
            "  location:   {} ({:.4}, {:.4})",
            task.location.address, task.location.latitude, task.location.longitude
        ),
        format!("  expires:    {}", format_sync_timestamp(task.expires_at)),
        format!("  version:    {}", task.server_version),
        format!("  updated:    {}", format_sync_timestamp(task.updated_at)),
    ];
    if let Some(synced_at) = task.last_synced_at {
        lines.push(format!("  synced:     {}", format_sync_timestamp(synced_at)));
    }
    if let Some(image_ref) = &task.image_ref {
        lines.push(format!("  image:      {image_ref}"));
    }
    if !task.notes.is_empty() {
        lines.push(format!("  notes:      {}", task.notes));
    }
    lines
}

pub fn format_queue_lines(items: &[QueueItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let error = item
                .last_error
                .as_deref()
                .map(|error| format!("  {}", truncate(error, 60)))
                .unwrap_or_default();
            format!(
                "{:<14}  {:<10}  attempts {:<2}  next {}{error}",
                item.task_id.as_str(),
                item.state.as_str(),
                item.attempt_count,
                format_sync_timestamp(item.next_retry_at),
            )
        })
        .collect()
}

pub fn queue_item_to_list_item(item: &QueueItem) -> QueueListItem {
    QueueListItem {
        id: item.id.to_string(),
        task_id: item.task_id.to_string(),
        action: item.action.as_str().to_string(),
        state: item.state.to_string(),
        attempt_count: item.attempt_count,
        next_retry_at: item.next_retry_at,
        next_retry_at_iso: fieldsync_core::util::format_millis(item.next_retry_at),
        last_error: item.last_error.clone(),
        created_at: item.created_at,
    }
}

pub fn format_conflict_lines(conflicts: &[Conflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let local = conflict
                .local_task()
                .map_or_else(|_| "?".to_string(), |task| task.business_status.to_string());
            let server = conflict.server_task().map_or_else(
                |_| "?".to_string(),
                |task| format!("{} v{}", task.business_status, task.server_version),
            );
            format!(
                "{:<14}  local {local:<11}  server {server:<16}  {}  {}",
                conflict.task_id.as_str(),
                conflict.resolution,
                format_sync_timestamp(conflict.created_at),
            )
        })
        .collect()
}

pub fn conflict_to_list_item(conflict: &Conflict) -> ConflictListItem {
    ConflictListItem {
        id: conflict.id.to_string(),
        task_id: conflict.task_id.to_string(),
        resolution: conflict.resolution.to_string(),
        created_at: conflict.created_at,
        created_at_iso: fieldsync_core::util::format_millis(conflict.created_at),
        resolved_at: conflict.resolved_at,
        local: serde_json::from_str(&conflict.local_payload).ok(),
        server: serde_json::from_str(&conflict.server_payload).ok(),
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
