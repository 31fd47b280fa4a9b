//! Freewrite CLI - offline-first journaling from the terminal
//!
//! Entries are written locally first and synced with the journal service
//! whenever it is reachable.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::analyze::run_analyze;
use crate::commands::common::{resolve_client_config, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::new::run_new;
use crate::commands::prompt::run_prompt;
use crate::commands::show::run_show;
use crate::commands::sync::{run_pull, run_push, run_status, run_sync};
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("freewrite=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let config = resolve_client_config(cli.api_url)?;

    match cli.command {
        Some(Commands::New { content }) => run_new(&content, &db_path, &config).await?,
        Some(Commands::List { limit, json }) => run_list(limit, json, &db_path).await?,
        Some(Commands::Show { id }) => run_show(&id, &db_path).await?,
        Some(Commands::Edit { id }) => run_edit(&id, &db_path, &config).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &db_path, &config).await?,
        Some(Commands::Sync) => run_sync(&db_path, &config).await?,
        Some(Commands::Push { id }) => run_push(&id, &db_path, &config).await?,
        Some(Commands::Pull) => run_pull(&db_path, &config).await?,
        Some(Commands::Status) => run_status(&db_path, &config).await?,
        Some(Commands::Watch) => run_watch(&db_path, &config).await?,
        Some(Commands::Prompt) => run_prompt(&config).await?,
        Some(Commands::Analyze { id, analysis_type }) => {
            run_analyze(&id, &analysis_type, &db_path, &config).await?;
        }
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            // Quick capture mode: freewrite "my thought"
            if cli.entry.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_new(&cli.entry, &db_path, &config).await?;
            }
        }
    }

    Ok(())
}
