use std::path::Path;
use std::sync::Arc;

use freewrite_core::config::ClientConfig;
use freewrite_core::remote::{HttpJournalClient, JournalApi};
use freewrite_core::sync::{SyncEngine, SyncOutcome};

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_watch(db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let client = Arc::new(HttpJournalClient::new(config)?);
    client.check_connectivity().await;

    let engine = SyncEngine::start(store, client, config.clone());
    match engine.perform_full_sync().await {
        SyncOutcome::Completed(report) => tracing::info!(
            "Initial sync: {} pushed, {} pulled",
            report.pushed,
            report.updated + report.created
        ),
        outcome => tracing::warn!("Initial sync did not complete: {outcome:?}"),
    }

    println!(
        "Syncing with {} every {}s, press Ctrl-C to stop",
        config.api_base_url,
        config.sync_interval.as_secs()
    );
    tokio::signal::ctrl_c().await?;

    engine.stop_auto_sync();
    let status = engine.status().await;
    if let Some(error) = status.sync_error {
        println!("Last sync error: {error}");
    }
    Ok(())
}
