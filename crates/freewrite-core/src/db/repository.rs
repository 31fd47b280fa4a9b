//! Journal entry repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::{format_timestamp, EntryId, JournalEntry};

const ENTRY_COLUMNS: &str =
    "id, remote_id, date, filename, content, preview_text, timestamp, needs_sync, is_deleted";

/// Trait for journal entry storage operations
pub trait EntryRepository {
    /// Insert a fully-formed entry
    fn insert(&self, entry: &JournalEntry) -> Result<()>;

    /// Get a live (not deleted) entry by ID
    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>>;

    /// Get an entry by ID, including tombstones
    fn find(&self, id: &EntryId) -> Result<Option<JournalEntry>>;

    /// List live entries, newest first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<JournalEntry>>;

    /// Get the row carrying a service identifier, including tombstones
    fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<JournalEntry>>;

    /// Fold any other row holding `remote_id` into `owner` and remove it.
    ///
    /// Such a row is a copy pulled before `owner` recorded its service id. Its
    /// content wins only when it is newer than `owner`.
    fn release_remote_id(&self, owner: &EntryId, remote_id: &str) -> Result<()>;

    /// List every row, including tombstones
    fn list_all(&self) -> Result<Vec<JournalEntry>>;

    /// List entries (including tombstones) whose local state is not yet on the service
    fn list_needs_sync(&self) -> Result<Vec<JournalEntry>>;

    /// Replace an entry's content, bumping its timestamp and marking it dirty
    fn update_content(&self, id: &EntryId, content: &str) -> Result<JournalEntry>;

    /// Overwrite every mutable column of an existing row
    fn overwrite(&self, entry: &JournalEntry) -> Result<()>;

    /// Turn a live entry into a dirty tombstone
    fn mark_deleted(&self, id: &EntryId) -> Result<()>;

    /// Physically remove a row
    fn purge(&self, id: &EntryId) -> Result<bool>;

    /// Set the dirty flag
    fn mark_needs_sync(&self, id: &EntryId) -> Result<()>;

    /// Clear the dirty flag if the row still carries `pushed_timestamp`,
    /// recording the service identifier when one is given
    fn mark_synced(
        &self,
        id: &EntryId,
        pushed_timestamp: &NaiveDateTime,
        remote_id: Option<&str>,
    ) -> Result<bool>;

    /// Count live entries
    fn count(&self) -> Result<usize>;

    /// Count entries waiting to be pushed (including tombstones)
    fn count_needs_sync(&self) -> Result<usize>;

    /// List live entry IDs starting with `prefix`
    fn ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

/// `SQLite` implementation of `EntryRepository`
pub struct SqliteEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteEntryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse an entry from a database row
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEntry> {
        let id: String = row.get(0)?;
        let timestamp: String = row.get(6)?;

        Ok(JournalEntry {
            id: id
                .parse()
                .map_err(|error| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error)))?,
            remote_id: row.get(1)?,
            date: row.get(2)?,
            filename: row.get(3)?,
            content: row.get(4)?,
            preview_text: row.get(5)?,
            timestamp: NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error)))?,
            needs_sync: row.get::<_, i32>(7)? != 0,
            is_deleted: row.get::<_, i32>(8)? != 0,
        })
    }

    fn query_entries(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, Self::parse_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert(&self, entry: &JournalEntry) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO entries ({ENTRY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                entry.id.as_str(),
                entry.remote_id,
                entry.date,
                entry.filename,
                entry.content,
                entry.preview_text,
                format_timestamp(&entry.timestamp),
                i32::from(entry.needs_sync),
                i32::from(entry.is_deleted)
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &EntryId) -> Result<Option<JournalEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ? AND is_deleted = 0"),
                params![id.as_str()],
                Self::parse_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn find(&self, id: &EntryId) -> Result<Option<JournalEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?"),
                params![id.as_str()],
                Self::parse_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<JournalEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE remote_id = ?"),
                params![remote_id],
                Self::parse_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn release_remote_id(&self, owner: &EntryId, remote_id: &str) -> Result<()> {
        let Some(duplicate) = self.find_by_remote_id(remote_id)? else {
            return Ok(());
        };
        if duplicate.id == *owner {
            return Ok(());
        }

        tracing::warn!(
            "Merging entry {} into {} which owns service id {remote_id}",
            duplicate.id,
            owner
        );
        self.purge(&duplicate.id)?;

        if let Some(mut entry) = self.find(owner)? {
            if duplicate.timestamp > entry.timestamp {
                entry.content = duplicate.content;
                entry.preview_text = duplicate.preview_text;
                entry.timestamp = duplicate.timestamp;
                entry.needs_sync = duplicate.needs_sync;
                entry.is_deleted = duplicate.is_deleted;
                self.overwrite(&entry)?;
            }
        }
        Ok(())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<JournalEntry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS}
                 FROM entries
                 WHERE is_deleted = 0
                 ORDER BY timestamp DESC
                 LIMIT ? OFFSET ?"
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn list_all(&self) -> Result<Vec<JournalEntry>> {
        self.query_entries(&format!("SELECT {ENTRY_COLUMNS} FROM entries"), [])
    }

    fn list_needs_sync(&self) -> Result<Vec<JournalEntry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries WHERE needs_sync = 1 ORDER BY timestamp ASC"
            ),
            [],
        )
    }

    fn update_content(&self, id: &EntryId, content: &str) -> Result<JournalEntry> {
        let mut entry = self
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        entry.set_content(content);

        self.conn.execute(
            "UPDATE entries SET content = ?, preview_text = ?, timestamp = ?, needs_sync = 1
             WHERE id = ? AND is_deleted = 0",
            params![
                entry.content,
                entry.preview_text,
                format_timestamp(&entry.timestamp),
                id.as_str()
            ],
        )?;

        Ok(entry)
    }

    fn overwrite(&self, entry: &JournalEntry) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE entries
             SET remote_id = ?, date = ?, filename = ?, content = ?, preview_text = ?,
                 timestamp = ?, needs_sync = ?, is_deleted = ?
             WHERE id = ?",
            params![
                entry.remote_id,
                entry.date,
                entry.filename,
                entry.content,
                entry.preview_text,
                format_timestamp(&entry.timestamp),
                i32::from(entry.needs_sync),
                i32::from(entry.is_deleted),
                entry.id.as_str()
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(entry.id.to_string()));
        }
        Ok(())
    }

    fn mark_deleted(&self, id: &EntryId) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE entries SET is_deleted = 1, needs_sync = 1 WHERE id = ? AND is_deleted = 0",
            params![id.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn purge(&self, id: &EntryId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?", params![id.as_str()])?;
        Ok(rows > 0)
    }

    fn mark_needs_sync(&self, id: &EntryId) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE entries SET needs_sync = 1 WHERE id = ?",
            params![id.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn mark_synced(
        &self,
        id: &EntryId,
        pushed_timestamp: &NaiveDateTime,
        remote_id: Option<&str>,
    ) -> Result<bool> {
        // The service id is kept even when the entry changed, so the next push updates it
        if let Some(remote_id) = remote_id {
            self.conn.execute(
                "UPDATE entries SET remote_id = ? WHERE id = ?",
                params![remote_id, id.as_str()],
            )?;
        }
        let rows = self.conn.execute(
            "UPDATE entries SET needs_sync = 0 WHERE id = ? AND timestamp = ?",
            params![id.as_str(), format_timestamp(pushed_timestamp)],
        )?;
        Ok(rows > 0)
    }

    fn count(&self) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE is_deleted = 0",
            [],
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    fn count_needs_sync(&self) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE needs_sync = 1",
            [],
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    fn ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM entries
             WHERE is_deleted = 0 AND substr(id, 1, length(?1)) = ?1
             ORDER BY timestamp DESC
             LIMIT ?2",
        )?;

        let ids = stmt
            .query_map(params![prefix, limit as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::now_timestamp;
    use chrono::Duration;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = JournalEntry::new("Morning pages");
        repo.insert(&entry).unwrap();

        let fetched = repo.get(&entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn test_list_newest_first() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let mut older = JournalEntry::new("older");
        older.timestamp -= Duration::hours(1);
        let newer = JournalEntry::new("newer");
        repo.insert(&older).unwrap();
        repo.insert(&newer).unwrap();

        let entries = repo.list(10, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "newer");
        assert_eq!(entries[1].content, "older");
    }

    #[test]
    fn test_update_content_marks_dirty() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let mut entry = JournalEntry::welcome();
        entry.timestamp -= Duration::minutes(5);
        repo.insert(&entry).unwrap();

        let updated = repo.update_content(&entry.id, "rewritten\ntoday").unwrap();
        assert!(updated.needs_sync);
        assert_eq!(updated.preview_text, "rewritten today");
        assert!(updated.timestamp > entry.timestamp);

        let fetched = repo.get(&entry.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn test_update_missing_entry_is_not_found() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let error = repo.update_content(&EntryId::new(), "x").unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[test]
    fn test_mark_deleted_hides_entry_but_keeps_tombstone() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = JournalEntry::welcome();
        repo.insert(&entry).unwrap();
        repo.mark_deleted(&entry.id).unwrap();

        assert!(repo.get(&entry.id).unwrap().is_none());
        assert!(repo.list(10, 0).unwrap().is_empty());

        let tombstone = repo.find(&entry.id).unwrap().unwrap();
        assert!(tombstone.is_deleted);
        assert!(tombstone.needs_sync);
        assert_eq!(repo.list_needs_sync().unwrap().len(), 1);

        assert!(repo.purge(&entry.id).unwrap());
        assert!(repo.find(&entry.id).unwrap().is_none());
    }

    #[test]
    fn test_mark_synced_requires_matching_timestamp() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let entry = JournalEntry::new("draft");
        repo.insert(&entry).unwrap();

        let stale = entry.timestamp - Duration::seconds(1);
        assert!(!repo.mark_synced(&entry.id, &stale, Some("remote-1")).unwrap());
        let pending = repo.get(&entry.id).unwrap().unwrap();
        assert!(pending.needs_sync);
        assert_eq!(pending.remote_id.as_deref(), Some("remote-1"));

        assert!(repo
            .mark_synced(&entry.id, &entry.timestamp, Some("remote-1"))
            .unwrap());
        let synced = repo.get(&entry.id).unwrap().unwrap();
        assert!(!synced.needs_sync);
        assert_eq!(synced.remote_id.as_deref(), Some("remote-1"));

        // A later clear without an id keeps the recorded remote id
        repo.mark_needs_sync(&entry.id).unwrap();
        assert!(repo.mark_synced(&entry.id, &entry.timestamp, None).unwrap());
        let synced = repo.get(&entry.id).unwrap().unwrap();
        assert_eq!(synced.remote_id.as_deref(), Some("remote-1"));
    }

    #[test]
    fn test_release_remote_id_adopts_newer_pulled_copy() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let local = JournalEntry::new("pushed text");
        repo.insert(&local).unwrap();
        let mut pulled = JournalEntry::new("pushed text");
        pulled.remote_id = Some("remote-1".to_string());
        pulled.timestamp = local.timestamp + Duration::seconds(5);
        pulled.needs_sync = false;
        repo.insert(&pulled).unwrap();

        repo.release_remote_id(&local.id, "remote-1").unwrap();

        assert!(repo.find(&pulled.id).unwrap().is_none());
        let merged = repo.get(&local.id).unwrap().unwrap();
        assert_eq!(merged.timestamp, pulled.timestamp);
        assert!(!merged.needs_sync);
        assert!(repo.find_by_remote_id("remote-1").unwrap().is_none());
    }

    #[test]
    fn test_release_remote_id_keeps_newer_local_edit() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let local = JournalEntry::new("edited after push");
        repo.insert(&local).unwrap();
        let mut pulled = JournalEntry::new("as pushed");
        pulled.remote_id = Some("remote-1".to_string());
        pulled.timestamp = local.timestamp - Duration::seconds(5);
        repo.insert(&pulled).unwrap();

        repo.release_remote_id(&local.id, "remote-1").unwrap();

        let kept = repo.get(&local.id).unwrap().unwrap();
        assert_eq!(kept.content, "edited after push");
        assert!(kept.needs_sync);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_overwrite_replaces_row() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let mut entry = JournalEntry::new("local");
        repo.insert(&entry).unwrap();

        entry.content = "remote".to_string();
        entry.preview_text = "remote".to_string();
        entry.timestamp = now_timestamp() + Duration::days(1);
        entry.needs_sync = false;
        repo.overwrite(&entry).unwrap();

        assert_eq!(repo.get(&entry.id).unwrap().unwrap(), entry);
    }

    #[test]
    fn test_counts_and_prefix_lookup() {
        let db = setup();
        let repo = SqliteEntryRepository::new(db.connection());

        let dirty = JournalEntry::new("dirty");
        let clean = JournalEntry::welcome();
        repo.insert(&dirty).unwrap();
        repo.insert(&clean).unwrap();

        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.count_needs_sync().unwrap(), 1);

        let prefix = dirty.id.as_str().chars().take(30).collect::<String>();
        let ids = repo.ids_by_prefix(&prefix, 3).unwrap();
        assert_eq!(ids, vec![dirty.id.as_str()]);
    }
}
