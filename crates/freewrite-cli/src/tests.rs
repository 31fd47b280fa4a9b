use std::path::PathBuf;

use chrono::Duration;
use freewrite_core::config::ClientConfig;
use freewrite_core::models::{parse_timestamp, WELCOME_MESSAGE};
use freewrite_core::services::EntryStore;
use freewrite_core::sync::{SyncOutcome, SyncReport};
use freewrite_core::JournalEntry;
use pretty_assertions::assert_eq;

use crate::cli::CompletionShell;
use crate::commands::common::{
    default_editor, entry_to_list_item, format_entry_lines, format_relative_time,
    normalize_content, normalize_entry_identifier, resolve_db_path, resolve_entry, short_id,
};
use crate::commands::completions::render_completions;
use crate::commands::list::run_list;
use crate::commands::sync::{expect_completed, format_report_lines};
use crate::error::CliError;

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn normalize_entry_identifier_rejects_empty() {
    assert!(matches!(
        normalize_entry_identifier(" \n "),
        Err(CliError::EmptyEntryId)
    ));
    assert_eq!(normalize_entry_identifier("  abc123  ").unwrap(), "abc123");
}

#[test]
fn resolve_db_path_prefers_explicit_flag() {
    let explicit = PathBuf::from("/tmp/freewrite-test.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
}

#[test]
fn format_relative_time_units() {
    let now = parse_timestamp("2025-06-01T12:00:00").unwrap();
    assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(2), now), "2m ago");
    assert_eq!(format_relative_time(now - Duration::hours(2), now), "2h ago");
    assert_eq!(format_relative_time(now - Duration::days(3), now), "3d ago");
    assert_eq!(format_relative_time(now + Duration::minutes(5), now), "just now");
}

#[test]
fn entry_lines_mark_unsynced_entries() {
    let now = parse_timestamp("2025-06-01T12:00:00").unwrap();
    let mut dirty = JournalEntry::new("Needs pushing");
    dirty.timestamp = now;
    let mut clean = JournalEntry::welcome();
    clean.timestamp = now - Duration::hours(1);

    let lines = format_entry_lines(&[dirty.clone(), clean.clone()], now);

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&short_id(&dirty.id)));
    assert!(lines[0].contains(" * Needs pushing"));
    assert!(lines[1].contains("1h ago"));
    assert!(!lines[1].contains(" * "));
}

#[test]
fn list_item_reports_sync_state() {
    let now = parse_timestamp("2025-06-01T12:00:00").unwrap();
    let mut entry = JournalEntry::new("hello\nworld");
    entry.timestamp = now;

    let item = entry_to_list_item(&entry, now);

    assert_eq!(item.id, entry.id.to_string());
    assert_eq!(item.preview, "hello world");
    assert_eq!(item.timestamp, "2025-06-01T12:00:00.000000");
    assert!(!item.synced);
}

#[test]
fn sync_report_lines_mention_failures_only_when_present() {
    let quiet = format_report_lines(&SyncReport {
        pushed: 2,
        created: 1,
        ..SyncReport::default()
    });
    assert_eq!(
        quiet,
        vec![
            "Pushed: 2 (0 deleted)".to_string(),
            "Pulled: 0 updated, 1 created, 0 unchanged".to_string(),
        ]
    );

    let noisy = format_report_lines(&SyncReport {
        push_failures: 1,
        ..SyncReport::default()
    });
    assert_eq!(noisy.len(), 3);
    assert!(noisy[2].contains("stay queued"));
}

#[test]
fn incomplete_sync_outcomes_fail_the_command() {
    let config = ClientConfig::default();
    assert!(expect_completed(SyncOutcome::Completed(SyncReport::default()), &config).is_ok());
    assert!(matches!(
        expect_completed(SyncOutcome::Offline, &config),
        Err(CliError::Offline(url)) if url == config.api_base_url
    ));
    assert!(matches!(
        expect_completed(SyncOutcome::Failed("Sync failed: boom".to_string()), &config),
        Err(CliError::Sync(message)) if message == "Sync failed: boom"
    ));
    assert!(expect_completed(SyncOutcome::AlreadySyncing, &config).is_err());
}

#[test]
fn completions_use_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("freewrite"));
}

#[tokio::test(flavor = "current_thread")]
async fn resolve_entry_supports_exact_and_prefix_id() {
    let store = EntryStore::open_in_memory().unwrap();
    let entry = store.create_entry("Find me").await.unwrap();
    let full = entry.id.to_string();

    assert_eq!(resolve_entry(&store, &full).await.unwrap().id, entry.id);
    assert_eq!(resolve_entry(&store, &full[..12]).await.unwrap().id, entry.id);
    assert!(matches!(
        resolve_entry(&store, "ffffffff").await,
        Err(CliError::EntryNotFound(_))
    ));
    assert!(matches!(
        resolve_entry(&store, "  ").await,
        Err(CliError::EmptyEntryId)
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn resolve_entry_skips_deleted_entries() {
    let store = EntryStore::open_in_memory().unwrap();
    let entry = store.create_entry("Gone soon").await.unwrap();
    store.delete_entry(&entry.id).await.unwrap();

    assert!(matches!(
        resolve_entry(&store, &entry.id.to_string()).await,
        Err(CliError::EntryNotFound(_))
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn list_seeds_welcome_entry_in_new_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("freewrite.db");

    run_list(10, true, &db_path).await.unwrap();

    let store = EntryStore::open_path(&db_path).unwrap();
    let entries = store.list_entries(10, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, WELCOME_MESSAGE);
    assert_eq!(store.pending_count().await.unwrap(), 0);
}
