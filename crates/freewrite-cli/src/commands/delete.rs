use std::path::Path;

use freewrite_core::config::ClientConfig;

use crate::commands::common::{open_store, resolve_entry, sync_after_write};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let entry = resolve_entry(&store, id).await?;

    store.delete_entry(&entry.id).await?;
    sync_after_write(&store, &entry.id, config).await;
    println!("{}", entry.id);
    Ok(())
}
