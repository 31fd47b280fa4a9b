use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDateTime;
use freewrite_core::config::ClientConfig;
use freewrite_core::models::format_timestamp;
use freewrite_core::remote::{HttpJournalClient, JournalApi};
use freewrite_core::services::EntryStore;
use freewrite_core::sync::SyncEngine;
use freewrite_core::{EntryId, JournalEntry};
use serde::Serialize;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub date: String,
    pub preview: String,
    pub content: String,
    pub timestamp: String,
    pub relative_time: String,
    pub synced: bool,
}

pub fn entry_to_list_item(entry: &JournalEntry, now: NaiveDateTime) -> EntryListItem {
    EntryListItem {
        id: entry.id.to_string(),
        date: entry.date.clone(),
        preview: entry.preview_text.clone(),
        content: entry.content.clone(),
        timestamp: format_timestamp(&entry.timestamp),
        relative_time: format_relative_time(entry.timestamp, now),
        synced: !entry.needs_sync,
    }
}

/// One line per entry; `*` marks changes not yet on the journal service.
pub fn format_entry_lines(entries: &[JournalEntry], now: NaiveDateTime) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let marker = if entry.needs_sync { '*' } else { ' ' };
            format!(
                "{}  {:<6}  {:>8} {marker} {}",
                short_id(&entry.id),
                entry.date,
                format_relative_time(entry.timestamp, now),
                entry.preview_text
            )
        })
        .collect()
}

pub fn short_id(id: &EntryId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_relative_time(timestamp: NaiveDateTime, now: NaiveDateTime) -> String {
    let diff = now.signed_duration_since(timestamp).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_entry_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEntryId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_entry_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let entry_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&entry_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        // EDITOR may carry arguments, e.g. "code --wait"
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_entry_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("freewrite-entry-{}-{now}.md", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("FREEWRITE_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("freewrite")
        .join("freewrite.db")
}

/// Environment configuration with the `--api-url` override applied.
pub fn resolve_client_config(api_url: Option<String>) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::from_env()?;
    match api_url {
        Some(url) => Ok(config.with_api_base_url(url)?),
        None => Ok(config),
    }
}

pub fn open_store(path: &Path) -> Result<EntryStore, CliError> {
    Ok(EntryStore::open_path(path)?)
}

/// Load a live entry by full ID or unique prefix.
pub async fn resolve_entry(store: &EntryStore, raw_id: &str) -> Result<JournalEntry, CliError> {
    let raw_id = normalize_entry_identifier(raw_id)?;
    let id = match store.resolve_id_prefix(&raw_id).await {
        Ok(id) => id,
        Err(freewrite_core::Error::NotFound(_)) => return Err(CliError::EntryNotFound(raw_id)),
        Err(freewrite_core::Error::InvalidInput(message)) => {
            return Err(CliError::AmbiguousEntryId(message))
        }
        Err(error) => return Err(error.into()),
    };

    store
        .get_entry(&id)
        .await?
        .ok_or(CliError::EntryNotFound(raw_id))
}

/// Build a client and check the service once.
pub async fn connect(config: &ClientConfig) -> Result<Arc<HttpJournalClient>, CliError> {
    let client = Arc::new(HttpJournalClient::new(config)?);
    if !client.check_connectivity().await {
        let reason = client.last_error().await.unwrap_or_default();
        tracing::debug!("Journal service at {} unreachable: {reason}", client.base_url());
    }
    Ok(client)
}

pub async fn sync_engine(
    store: EntryStore,
    config: &ClientConfig,
) -> Result<SyncEngine<HttpJournalClient>, CliError> {
    let client = connect(config).await?;
    Ok(SyncEngine::new(store, client, config.clone()))
}

/// Push one entry if the service is reachable; otherwise it stays queued.
pub async fn sync_after_write(store: &EntryStore, id: &EntryId, config: &ClientConfig) {
    let engine = match sync_engine(store.clone(), config).await {
        Ok(engine) => engine,
        Err(error) => {
            tracing::warn!("Could not reach journal service: {error}");
            return;
        }
    };
    if engine.api().is_connected() {
        engine.sync_single_entry(id).await;
    } else {
        tracing::info!("Journal service unreachable, change queued for next sync");
    }
}
