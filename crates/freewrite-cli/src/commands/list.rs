use std::path::Path;

use freewrite_core::models::now_timestamp;

use crate::commands::common::{entry_to_list_item, format_entry_lines, open_store, EntryListItem};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    store.ensure_welcome_entry().await?;
    let entries = store.list_entries(limit, 0).await?;
    let now = now_timestamp();

    if as_json {
        let json_items = entries
            .iter()
            .map(|entry| entry_to_list_item(entry, now))
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_entry_lines(&entries, now) {
            println!("{line}");
        }
    }

    Ok(())
}
