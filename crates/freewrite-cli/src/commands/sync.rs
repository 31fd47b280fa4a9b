use std::path::Path;

use freewrite_core::config::ClientConfig;
use freewrite_core::remote::JournalApi;
use freewrite_core::sync::{SyncOutcome, SyncReport};

use crate::commands::common::{open_store, resolve_entry, sync_engine};
use crate::error::CliError;

pub async fn run_sync(db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let engine = sync_engine(open_store(db_path)?, config).await?;
    let report = expect_completed(engine.perform_full_sync().await, config)?;

    for line in format_report_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_push(id: &str, db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let entry = resolve_entry(&store, id).await?;
    let engine = sync_engine(store.clone(), config).await?;
    if !engine.api().is_connected() {
        return Err(CliError::Offline(config.api_base_url.clone()));
    }

    engine.force_push_entry(&entry.id).await;

    match store.get_entry(&entry.id).await? {
        Some(pushed) if pushed.needs_sync => Err(CliError::Sync(format!(
            "Entry {} is still queued, see log for details",
            entry.id
        ))),
        _ => {
            println!("{}", entry.id);
            Ok(())
        }
    }
}

pub async fn run_pull(db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let engine = sync_engine(open_store(db_path)?, config).await?;
    let report = expect_completed(engine.refresh_from_server().await, config)?;

    println!(
        "Pulled: {} updated, {} created, {} unchanged",
        report.updated, report.created, report.unchanged
    );
    Ok(())
}

pub async fn run_status(db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let engine = sync_engine(store.clone(), config).await?;
    let client = engine.api();

    let connectivity = if client.is_connected() {
        "online"
    } else {
        "offline"
    };
    println!("Service: {} ({connectivity})", client.base_url());
    if let Some(reason) = client.last_error().await {
        println!("Last error: {reason}");
    }
    println!("Entries: {}", store.entry_count().await?);
    println!("Pending: {}", store.pending_count().await?);
    Ok(())
}

/// Turn a non-completed outcome into a failing exit.
pub fn expect_completed(outcome: SyncOutcome, config: &ClientConfig) -> Result<SyncReport, CliError> {
    match outcome {
        SyncOutcome::Completed(report) => Ok(report),
        SyncOutcome::AlreadySyncing => Err(CliError::Sync("Sync already in progress".to_string())),
        SyncOutcome::Offline => Err(CliError::Offline(config.api_base_url.clone())),
        SyncOutcome::Failed(message) => Err(CliError::Sync(message)),
    }
}

pub fn format_report_lines(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![
        format!("Pushed: {} ({} deleted)", report.pushed, report.deleted),
        format!(
            "Pulled: {} updated, {} created, {} unchanged",
            report.updated, report.created, report.unchanged
        ),
    ];
    if report.push_failures > 0 {
        lines.push(format!(
            "{} entries could not be pushed and stay queued",
            report.push_failures
        ));
    }
    if report.skipped > 0 {
        lines.push(format!("{} remote entries skipped", report.skipped));
    }
    lines
}
