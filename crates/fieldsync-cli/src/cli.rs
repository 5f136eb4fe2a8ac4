use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fieldsync_core::models::{BusinessStatus, TaskFilter};

#[derive(Parser)]
#[command(name = "fieldsync")]
#[command(about = "Edit field tasks offline and sync them when the network allows")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks, most recently changed first
    List {
        /// `all` or a sync status (pending_sync, syncing, synced, error, conflict)
        #[arg(long, default_value = "all", value_parser = parse_task_filter)]
        filter: TaskFilter,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task with its queue entry and conflict
    Show {
        /// Task ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a task locally and queue it for sync
    Update {
        /// Task ID
        id: String,
        /// New business status (available, in_progress, done, cancelled)
        #[arg(long, value_parser = parse_business_status)]
        status: Option<BusinessStatus>,
        /// Replace the notes
        #[arg(long)]
        notes: Option<String>,
        /// Attach a photo reference
        #[arg(long, value_name = "REF", conflicts_with = "clear_image")]
        image: Option<String>,
        /// Remove the photo reference
        #[arg(long)]
        clear_image: bool,
    },
    /// Show the sync queue in processing order
    Queue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List open conflicts
    Conflicts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one sync cycle now
    Sync {
        /// Retry failed items even if their backoff has not elapsed
        #[arg(long)]
        ignore_retry_window: bool,
        /// Simulate having no network
        #[arg(long)]
        offline: bool,
        /// Simulate the server being down
        #[arg(long)]
        server_unavailable: bool,
        /// Make the first request of this cycle come back as a conflict
        #[arg(long)]
        force_conflict: bool,
        /// Output the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve an open conflict
    Resolve {
        #[command(subcommand)]
        command: ResolveCommands,
    },
    /// Keep syncing on a fixed interval, like a background wake
    Watch {
        /// Seconds between wakes (defaults to the configured interval)
        #[arg(long, value_name = "SECS")]
        interval_secs: Option<u64>,
        /// Stop after this many wakes
        #[arg(long, value_name = "N")]
        cycles: Option<u32>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ResolveCommands {
    /// Keep the server's copy
    Accept {
        /// Task ID
        id: String,
    },
    /// Send the local copy again
    Retry {
        /// Task ID
        id: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

pub fn parse_task_filter(value: &str) -> Result<TaskFilter, String> {
    value.trim().parse().map_err(|_| {
        format!("unknown filter '{value}' (expected all, pending_sync, syncing, synced, error, conflict)")
    })
}

pub fn parse_business_status(value: &str) -> Result<BusinessStatus, String> {
    value.trim().parse().map_err(|_| {
        format!("unknown status '{value}' (expected available, in_progress, done, cancelled)")
    })
}
