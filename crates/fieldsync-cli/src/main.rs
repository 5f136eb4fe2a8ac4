//! Fieldsync CLI - offline-first field task editing from the terminal
//!
//! Edits land in the local store immediately and are pushed by the sync
//! engine whenever a cycle runs.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands, ResolveCommands};
use crate::commands::common::AppContext;
use crate::commands::completions::run_completions;
use crate::commands::conflicts::run_conflicts;
use crate::commands::list::run_list;
use crate::commands::queue::run_queue;
use crate::commands::resolve::{run_accept, run_retry};
use crate::commands::show::run_show;
use crate::commands::sync::{run_sync, SyncOptions};
use crate::commands::update::{build_patch, run_update};
use crate::commands::watch::run_watch;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "fieldsync=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Completions need neither config nor a database
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let context = AppContext::load(cli.config.as_deref(), cli.db_path.as_deref())?;

    match cli.command {
        Commands::List { filter, json } => run_list(filter, json, &context).await?,
        Commands::Show { id, json } => run_show(&id, json, &context).await?,
        Commands::Update {
            id,
            status,
            notes,
            image,
            clear_image,
        } => {
            let patch = build_patch(status, notes, image, clear_image)?;
            run_update(&id, &patch, &context).await?;
        }
        Commands::Queue { json } => run_queue(json, &context).await?,
        Commands::Conflicts { json } => run_conflicts(json, &context).await?,
        Commands::Sync {
            ignore_retry_window,
            offline,
            server_unavailable,
            force_conflict,
            json,
        } => {
            let options = SyncOptions {
                ignore_retry_window,
                offline,
                server_unavailable,
                force_conflict,
            };
            run_sync(options, json, &context).await?;
        }
        Commands::Resolve { command } => match command {
            ResolveCommands::Accept { id } => run_accept(&id, &context).await?,
            ResolveCommands::Retry { id } => run_retry(&id, &context).await?,
        },
        Commands::Watch {
            interval_secs,
            cycles,
        } => run_watch(interval_secs, cycles, &context).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
