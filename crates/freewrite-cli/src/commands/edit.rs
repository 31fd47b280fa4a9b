use std::path::Path;

use freewrite_core::config::ClientConfig;

use crate::commands::common::{
    capture_editor_input_with_initial, open_store, resolve_entry, sync_after_write,
};
use crate::error::CliError;

pub async fn run_edit(id: &str, db_path: &Path, config: &ClientConfig) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let entry = resolve_entry(&store, id).await?;

    let Some(edited_content) = capture_editor_input_with_initial(&entry.content)? else {
        return Err(CliError::EmptyEditedContent);
    };

    if edited_content == entry.content {
        println!("{}", entry.id);
        return Ok(());
    }

    let updated = store.save_content(&entry.id, &edited_content).await?;
    sync_after_write(&store, &updated.id, config).await;
    println!("{}", updated.id);
    Ok(())
}
