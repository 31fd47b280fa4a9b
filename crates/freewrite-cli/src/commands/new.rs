use std::path::Path;

use freewrite_core::config::ClientConfig;

use crate::commands::common::{open_store, resolve_entry_content, sync_after_write};
use crate::error::CliError;

pub async fn run_new(
    content_parts: &[String],
    db_path: &Path,
    config: &ClientConfig,
) -> Result<(), CliError> {
    let content = resolve_entry_content(content_parts)?;

    let store = open_store(db_path)?;
    let entry = store.create_entry(&content).await?;
    sync_after_write(&store, &entry.id, config).await;

    println!("{}", entry.id);
    Ok(())
}
