use std::path::Path;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use fieldsync_core::config::AppConfig;
use fieldsync_core::models::{BusinessStatus, NullableUpdate, SyncStatus, TaskFilter, TaskId};
use fieldsync_core::services::LocalStore;
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

use crate::cli::{parse_business_status, parse_task_filter, Cli, Commands, CompletionShell};
use crate::commands::common::{
    format_relative_time, format_task_line, normalize_task_identifier, truncate, AppContext,
};
use crate::commands::completions::render_completions;
use crate::commands::resolve::{run_accept, run_retry};
use crate::commands::show::run_show;
use crate::commands::sync::{run_sync, SyncOptions};
use crate::commands::update::{build_patch, run_update};
use crate::commands::watch::{resolve_interval, run_watch};
use crate::error::CliError;

fn temp_context() -> (TempDir, AppContext) {
    let tmp = tempdir().unwrap();
    let context = AppContext::load(
        Some(&tmp.path().join("config.json")),
        Some(&tmp.path().join("fieldsync.db")),
    )
    .unwrap();
    (tmp, context)
}

async fn stored_task_status(db_path: &Path, id: &str) -> (BusinessStatus, SyncStatus) {
    let store = LocalStore::open_path(db_path).unwrap();
    let task = store.get_task(&TaskId::new(id)).await.unwrap().unwrap();
    (task.business_status, task.sync_status)
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parse_filter_accepts_sync_statuses() {
    assert_eq!(parse_task_filter("all").unwrap(), TaskFilter::All);
    assert_eq!(
        parse_task_filter(" conflict ").unwrap(),
        TaskFilter::Status(SyncStatus::Conflict)
    );
    assert!(parse_task_filter("pending").unwrap_err().contains("pending_sync"));
}

#[test]
fn parse_status_accepts_business_statuses() {
    assert_eq!(
        parse_business_status("in_progress").unwrap(),
        BusinessStatus::InProgress
    );
    assert!(parse_business_status("finished").is_err());
}

#[test]
fn update_rejects_image_with_clear_image() {
    let result = Cli::try_parse_from([
        "fieldsync",
        "update",
        "seed_task_001",
        "--image",
        "file:///a.jpg",
        "--clear-image",
    ]);
    assert!(result.is_err());
}

#[test]
fn update_parses_status_and_global_db_path() {
    let cli = Cli::try_parse_from([
        "fieldsync",
        "update",
        "seed_task_001",
        "--status",
        "done",
        "--db-path",
        "/tmp/fs.db",
    ])
    .unwrap();
    assert_eq!(cli.db_path.as_deref(), Some(Path::new("/tmp/fs.db")));
    let Commands::Update { id, status, .. } = cli.command else {
        panic!("expected update command");
    };
    assert_eq!(id, "seed_task_001");
    assert_eq!(status, Some(BusinessStatus::Done));
}

#[test]
fn build_patch_requires_a_change() {
    assert!(matches!(
        build_patch(None, None, None, false),
        Err(CliError::NoChanges)
    ));
    assert!(matches!(
        build_patch(None, None, Some("   ".to_string()), false),
        Err(CliError::NoChanges)
    ));
}

#[test]
fn build_patch_maps_flags() {
    let patch = build_patch(
        Some(BusinessStatus::Done),
        Some("  shelf fixed ".to_string()),
        None,
        true,
    )
    .unwrap();
    assert_eq!(patch.image_ref, NullableUpdate::Clear);
    assert!(!patch.is_empty());

    let patch = build_patch(None, None, Some("file:///photo.jpg".to_string()), false).unwrap();
    assert_eq!(
        patch.image_ref,
        NullableUpdate::Set("file:///photo.jpg".to_string())
    );
}

#[test]
fn normalize_task_identifier_rejects_blank() {
    assert!(matches!(
        normalize_task_identifier("  "),
        Err(CliError::EmptyTaskId)
    ));
    assert_eq!(
        normalize_task_identifier(" seed_task_002 ").unwrap().as_str(),
        "seed_task_002"
    );
}

#[test]
fn relative_time_buckets() {
    let now = 10 * 24 * 60 * 60 * 1000;
    assert_eq!(format_relative_time(now - 5_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 60 * 60_000, now), "3h ago");
    assert_eq!(format_relative_time(0, now), "1w ago");
}

#[test]
fn truncate_marks_cut_text() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("Verify Cleaning Products Placement", 12), "Verify Cl...");
}

#[test]
fn task_line_shows_statuses() {
    let task = fieldsync_core::db::seed::demo_tasks(0).remove(0);
    let line = format_task_line(&task, 0);
    assert!(line.starts_with("seed_task_001"));
    assert!(line.contains("available"));
    assert!(line.contains("synced"));
    assert!(line.contains("$ 40.00"));
}

#[test]
fn completions_use_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("fieldsync"));
}

#[test]
fn context_reads_config_file() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    let db_path = tmp.path().join("from-config.db");
    AppConfig {
        db_path: Some(db_path.clone()),
        background_interval_secs: 30,
        seed_demo_tasks: false,
    }
    .save_to_path(&config_path)
    .unwrap();

    let explicit = tmp.path().join("explicit.db");
    let context = AppContext::load(Some(&config_path), Some(&explicit)).unwrap();
    assert_eq!(context.db_path, explicit);
    assert!(!context.config.seed_demo_tasks);
    assert_eq!(
        resolve_interval(None, &context).unwrap(),
        Duration::from_secs(30)
    );
    assert!(matches!(
        resolve_interval(Some(0), &context),
        Err(CliError::InvalidInterval)
    ));
}

#[test]
fn context_rejects_malformed_config() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    std::fs::write(&config_path, "{ nope").unwrap();

    let error = AppContext::load(Some(&config_path), None).unwrap_err();
    assert!(error.to_string().contains("config.json"));
}

#[tokio::test]
async fn update_syncs_to_endpoint() {
    let (_tmp, context) = temp_context();
    let patch = build_patch(Some(BusinessStatus::InProgress), None, None, false).unwrap();

    run_update("seed_task_003", &patch, &context).await.unwrap();

    assert_eq!(
        stored_task_status(&context.db_path, "seed_task_003").await,
        (BusinessStatus::InProgress, SyncStatus::Synced)
    );
}

#[tokio::test]
async fn update_unknown_task_fails() {
    let (_tmp, context) = temp_context();
    let patch = build_patch(None, Some("x".to_string()), None, false).unwrap();

    let error = run_update("seed_task_999", &patch, &context)
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Task not found: seed_task_999");
}

#[tokio::test]
async fn show_unknown_task_fails() {
    let (_tmp, context) = temp_context();
    let error = run_show("nope", false, &context).await.unwrap_err();
    assert!(matches!(error, CliError::TaskNotFound(ref id) if id == "nope"));
}

#[tokio::test]
async fn unavailable_server_leaves_item_queued() {
    let (_tmp, context) = temp_context();

    // Seed, then queue an edit while the server is down
    run_sync(SyncOptions::default(), false, &context).await.unwrap();
    {
        let store = LocalStore::open_path(&context.db_path).unwrap();
        store
            .save_mutation_and_enqueue(
                &TaskId::new("seed_task_004"),
                &build_patch(None, Some("pending".to_string()), None, false).unwrap(),
            )
            .await
            .unwrap();
    }

    let options = SyncOptions {
        server_unavailable: true,
        ..SyncOptions::default()
    };
    run_sync(options, true, &context).await.unwrap();

    let store = LocalStore::open_path(&context.db_path).unwrap();
    let snapshot = store.read_snapshot().await.unwrap();
    assert_eq!(snapshot.queue_count(), 1);
    assert_eq!(snapshot.queue_items[0].attempt_count, 1);
    assert_eq!(
        stored_task_status(&context.db_path, "seed_task_004").await.1,
        SyncStatus::Error
    );

    let options = SyncOptions {
        ignore_retry_window: true,
        ..SyncOptions::default()
    };
    run_sync(options, false, &context).await.unwrap();
    assert_eq!(
        stored_task_status(&context.db_path, "seed_task_004").await.1,
        SyncStatus::Synced
    );
}

#[tokio::test]
async fn forced_conflict_then_resolve() {
    let (_tmp, context) = temp_context();
    run_sync(SyncOptions::default(), false, &context).await.unwrap();
    {
        let store = LocalStore::open_path(&context.db_path).unwrap();
        for id in ["seed_task_005", "seed_task_006"] {
            store
                .save_mutation_and_enqueue(
                    &TaskId::new(id),
                    &build_patch(Some(BusinessStatus::Done), None, None, false).unwrap(),
                )
                .await
                .unwrap();
        }
    }

    let options = SyncOptions {
        force_conflict: true,
        ..SyncOptions::default()
    };
    run_sync(options, false, &context).await.unwrap();
    assert_eq!(
        stored_task_status(&context.db_path, "seed_task_005").await,
        (BusinessStatus::Cancelled, SyncStatus::Conflict)
    );
    // Only the first request of the cycle is forced
    assert_eq!(
        stored_task_status(&context.db_path, "seed_task_006").await.1,
        SyncStatus::Synced
    );

    // Each run starts a fresh in-memory server, so retrying local is accepted
    run_retry("seed_task_005", &context).await.unwrap();
    assert_eq!(
        stored_task_status(&context.db_path, "seed_task_005").await,
        (BusinessStatus::Done, SyncStatus::Synced)
    );

    // Nothing left to accept
    run_accept("seed_task_005", &context).await.unwrap();
    let store = LocalStore::open_path(&context.db_path).unwrap();
    assert_eq!(store.read_snapshot().await.unwrap().conflict_count(), 0);
}

#[tokio::test]
async fn watch_runs_bounded_cycles() {
    let (_tmp, context) = temp_context();
    run_watch(Some(1), Some(1), &context).await.unwrap();

    let store = LocalStore::open_path(&context.db_path).unwrap();
    assert_eq!(store.read_snapshot().await.unwrap().queue_count(), 0);
}
