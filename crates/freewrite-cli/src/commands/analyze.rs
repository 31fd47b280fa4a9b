use std::path::Path;

use freewrite_core::config::ClientConfig;
use freewrite_core::remote::HttpJournalClient;

use crate::commands::common::{open_store, resolve_entry};
use crate::error::CliError;

pub async fn run_analyze(
    id: &str,
    analysis_type: &str,
    db_path: &Path,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let entry = resolve_entry(&store, id).await?;
    if entry.needs_sync {
        tracing::warn!("Entry {} has unsynced changes; the service analyzes its own copy", entry.id);
    }

    let client = HttpJournalClient::new(config)?;
    let response = client.analyze(&entry.sync_key(), analysis_type).await?;
    println!("{}", response.analysis);
    Ok(())
}
