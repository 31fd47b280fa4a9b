use std::path::Path;

use crate::commands::common::{open_store, resolve_entry};
use crate::error::CliError;

pub async fn run_show(id: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let entry = resolve_entry(&store, id).await?;

    let state = if entry.needs_sync { "unsynced" } else { "synced" };
    println!("{}  {}  ({state})", entry.id, entry.date);
    println!();
    println!("{}", entry.content);
    Ok(())
}
