//! Shared entry store used by the sync engine and clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::TransactionBehavior;
use tokio::sync::Mutex;

use crate::db::{Database, EntryRepository, SqliteEntryRepository};
use crate::models::{EntryId, JournalEntry};
use crate::remote::RemoteEntry;
use crate::sync::{plan_pull, PullReport};
use crate::{Error, Result};

/// Thread-safe handle to the local entry store.
///
/// Clones share the same connection; every operation takes the lock for the
/// duration of one repository call (or one transaction for [`Self::apply_pull`]).
#[derive(Clone)]
pub struct EntryStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl EntryStore {
    /// Open a store at the given filesystem path, creating parent directories.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open(&db_path)?;
        tracing::debug!("Opened entry store at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem path of the database, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Create and persist a new entry. Blank entries are not queued for sync.
    pub async fn create_entry(&self, content: &str) -> Result<JournalEntry> {
        let entry = JournalEntry::new(content);
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.insert(&entry)?;
        Ok(entry)
    }

    /// Seed the welcome entry when the store has no live entries.
    pub async fn ensure_welcome_entry(&self) -> Result<Option<JournalEntry>> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        if repo.count()? > 0 {
            return Ok(None);
        }

        let entry = JournalEntry::welcome();
        repo.insert(&entry)?;
        tracing::info!("Created welcome entry {}", entry.id);
        Ok(Some(entry))
    }

    /// Get a live entry by ID.
    pub async fn get_entry(&self, id: &EntryId) -> Result<Option<JournalEntry>> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.get(id)
    }

    /// Get an entry by ID, including ones waiting to be deleted remotely.
    pub async fn find_entry(&self, id: &EntryId) -> Result<Option<JournalEntry>> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.find(id)
    }

    /// List live entries, newest first.
    pub async fn list_entries(&self, limit: usize, offset: usize) -> Result<Vec<JournalEntry>> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.list(limit, offset)
    }

    /// Save new content for an entry, bumping its timestamp and queueing it for sync.
    pub async fn save_content(&self, id: &EntryId, content: &str) -> Result<JournalEntry> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.update_content(id, content)
    }

    /// Delete an entry locally and queue the deletion for the journal service.
    pub async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.mark_deleted(id)
    }

    /// Entries (including pending deletions) waiting to be pushed, oldest first.
    pub async fn dirty_entries(&self) -> Result<Vec<JournalEntry>> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.list_needs_sync()
    }

    pub async fn mark_needs_sync(&self, id: &EntryId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.mark_needs_sync(id)
    }

    /// Record the service id and clear the dirty flag unless the entry changed
    /// after `pushed_timestamp`.
    ///
    /// A row pulled under the same service id before this call (by another
    /// process sharing the database) is merged into `id`. Returns `false` when
    /// the flag was left alone.
    pub async fn mark_synced(
        &self,
        id: &EntryId,
        pushed_timestamp: &NaiveDateTime,
        remote_id: Option<&str>,
    ) -> Result<bool> {
        let mut db = self.db.lock().await;
        let tx = db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cleared = {
            let repo = SqliteEntryRepository::new(&tx);
            if let Some(remote_id) = remote_id {
                repo.release_remote_id(id, remote_id)?;
            }
            repo.mark_synced(id, pushed_timestamp, remote_id)?
        };

        tx.commit()?;
        Ok(cleared)
    }

    /// Physically remove a row.
    pub async fn purge_entry(&self, id: &EntryId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.purge(id)
    }

    /// Number of entries waiting to be pushed.
    pub async fn pending_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.count_needs_sync()
    }

    /// Number of live entries.
    pub async fn entry_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        repo.count()
    }

    /// Resolve a full ID or unique prefix to an entry ID.
    pub async fn resolve_id_prefix(&self, raw: &str) -> Result<EntryId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidInput("Entry ID must not be empty".to_string()));
        }
        if let Ok(id) = raw.parse::<EntryId>() {
            return Ok(id);
        }

        let db = self.db.lock().await;
        let repo = SqliteEntryRepository::new(db.connection());
        let matches = repo.ids_by_prefix(raw, 3)?;
        match matches.as_slice() {
            [] => Err(Error::NotFound(raw.to_string())),
            [single] => single
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Stored entry ID '{single}' is invalid"))),
            _ => Err(Error::InvalidInput(format!(
                "Entry ID prefix '{raw}' is ambiguous"
            ))),
        }
    }

    /// Merge a page of remote records into the store in one transaction.
    pub async fn apply_pull(&self, remote: Vec<RemoteEntry>) -> Result<PullReport> {
        let mut db = self.db.lock().await;
        let tx = db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let plan = {
            let repo = SqliteEntryRepository::new(&tx);
            let local = repo.list_all()?;
            let plan = plan_pull(&local, remote);
            for entry in &plan.updates {
                tracing::info!("Updated local entry {} from journal service", entry.filename);
                repo.overwrite(entry)?;
            }
            for entry in &plan.inserts {
                tracing::info!("Created local entry {} from journal service", entry.filename);
                repo.insert(entry)?;
            }
            plan
        };

        tx.commit()?;
        Ok(plan.report())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{parse_timestamp, WELCOME_MESSAGE};

    fn remote(id: &str, content: &str, timestamp: &str) -> RemoteEntry {
        RemoteEntry {
            id: id.to_string(),
            date: "Mar 3".to_string(),
            filename: "[2025-03-03].md".to_string(),
            content: content.to_string(),
            preview_text: None,
            timestamp: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn open_path_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.db");

        let store = EntryStore::open_path(&path).unwrap();
        store.create_entry("hello").await.unwrap();

        assert!(path.exists());
        assert_eq!(store.db_path(), Some(path.as_path()));
        let reopened = EntryStore::open_path(&path).unwrap();
        assert_eq!(reopened.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_entries_are_not_queued() {
        let store = EntryStore::open_in_memory().unwrap();
        let blank = store.create_entry("  \n").await.unwrap();
        let written = store.create_entry("words").await.unwrap();

        assert!(!blank.needs_sync);
        assert!(written.needs_sync);
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn welcome_entry_is_seeded_once_and_clean() {
        let store = EntryStore::open_in_memory().unwrap();

        let welcome = store.ensure_welcome_entry().await.unwrap().unwrap();
        assert_eq!(welcome.content, WELCOME_MESSAGE);
        assert!(!welcome.needs_sync);
        assert!(store.ensure_welcome_entry().await.unwrap().is_none());
        assert_eq!(store.entry_count().await.unwrap(), 1);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_content_requeues_entry() {
        let store = EntryStore::open_in_memory().unwrap();
        let entry = store.create_entry("first").await.unwrap();
        assert!(store
            .mark_synced(&entry.id, &entry.timestamp, Some("server-1"))
            .await
            .unwrap());
        assert_eq!(store.pending_count().await.unwrap(), 0);

        let saved = store.save_content(&entry.id, "second").await.unwrap();
        assert!(saved.needs_sync);
        assert!(saved.timestamp >= entry.timestamp);
        assert_eq!(saved.remote_id.as_deref(), Some("server-1"));
        assert_eq!(store.dirty_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_leaves_a_dirty_tombstone() {
        let store = EntryStore::open_in_memory().unwrap();
        let entry = store.create_entry("bye").await.unwrap();

        store.delete_entry(&entry.id).await.unwrap();

        assert!(store.get_entry(&entry.id).await.unwrap().is_none());
        let tombstone = store.find_entry(&entry.id).await.unwrap().unwrap();
        assert!(tombstone.is_deleted);
        assert!(tombstone.needs_sync);
        assert!(store.purge_entry(&entry.id).await.unwrap());
        assert!(store.find_entry(&entry.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_id_prefix_handles_unique_missing_and_invalid() {
        let store = EntryStore::open_in_memory().unwrap();
        let entry = store.create_entry("find me").await.unwrap();
        let full = entry.id.as_str();

        assert_eq!(store.resolve_id_prefix(&full).await.unwrap(), entry.id);
        assert_eq!(store.resolve_id_prefix(&full[..13]).await.unwrap(), entry.id);
        assert!(matches!(
            store.resolve_id_prefix("ffffffff-ffff").await,
            Err(Error::NotFound(_))
        ));
        assert!(store.resolve_id_prefix("   ").await.is_err());
    }

    #[tokio::test]
    async fn apply_pull_updates_creates_and_keeps_local_only_entries() {
        let store = EntryStore::open_in_memory().unwrap();
        let local_only = store.create_entry("only here").await.unwrap();
        let mut stale = JournalEntry::new("old");
        stale.timestamp = parse_timestamp("2025-01-01T00:00:00").unwrap();
        {
            let db = store.db.lock().await;
            SqliteEntryRepository::new(db.connection())
                .insert(&stale)
                .unwrap();
        }

        let report = store
            .apply_pull(vec![
                remote(&stale.id.as_str(), "new", "2025-01-02T00:00:00"),
                remote("server-9", "brand new", "2025-01-03T08:30:00.250000"),
            ])
            .await
            .unwrap();

        assert_eq!(
            report,
            PullReport {
                updated: 1,
                created: 1,
                unchanged: 0,
                skipped: 0
            }
        );
        let refreshed = store.get_entry(&stale.id).await.unwrap().unwrap();
        assert_eq!(refreshed.content, "new");
        assert!(!refreshed.needs_sync);

        let untouched = store.get_entry(&local_only.id).await.unwrap().unwrap();
        assert_eq!(untouched, local_only);

        let entries = store.list_entries(10, 0).await.unwrap();
        assert_eq!(entries.len(), 3);
        let created = entries
            .iter()
            .find(|entry| entry.remote_id.as_deref() == Some("server-9"))
            .unwrap();
        assert!(!created.needs_sync);
        assert_eq!(created.content, "brand new");
    }

    #[tokio::test]
    async fn mark_synced_merges_copy_pulled_by_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let writer = EntryStore::open_path(&path).unwrap();
        let puller = EntryStore::open_path(&path).unwrap();
        let local = writer.create_entry("pushed").await.unwrap();

        // The record landed remotely and was pulled before the push finished
        let report = puller
            .apply_pull(vec![remote("server-1", "pushed", "2099-01-01T00:00:00")])
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(writer.entry_count().await.unwrap(), 2);

        writer
            .mark_synced(&local.id, &local.timestamp, Some("server-1"))
            .await
            .unwrap();

        assert_eq!(writer.entry_count().await.unwrap(), 1);
        let merged = writer.get_entry(&local.id).await.unwrap().unwrap();
        assert_eq!(merged.remote_id.as_deref(), Some("server-1"));
        assert_eq!(merged.content, "pushed");
        assert!(!merged.needs_sync);
        assert_eq!(writer.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn repeated_pull_is_idempotent() {
        let store = EntryStore::open_in_memory().unwrap();
        let page = vec![remote("server-1", "same", "2025-01-02T00:00:00")];

        let first = store.apply_pull(page.clone()).await.unwrap();
        let second = store.apply_pull(page).await.unwrap();

        assert_eq!(first.created, 1);
        assert_eq!(second.created, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(store.entry_count().await.unwrap(), 1);
    }
}
