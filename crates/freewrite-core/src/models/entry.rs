//! Journal entry model

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wire and storage format for entry timestamps (UTC, no offset).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Preview shown for entries whose content is blank.
pub const EMPTY_PREVIEW: &str = "Empty entry";

/// Maximum number of characters kept in a preview before the ellipsis.
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Content of the entry seeded into an empty journal.
pub const WELCOME_MESSAGE: &str = "Welcome to Freewrite!\n\nThis is your space for stream-of-consciousness writing. Set a timer, start typing, and let your thoughts flow freely.";

const DISPLAY_DATE_FORMAT: &str = "%b %-d";
const FILENAME_DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// A unique identifier for a journal entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A journal entry in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Local identifier, immutable
    pub id: EntryId,
    /// Identifier assigned by the journal service, once known
    pub remote_id: Option<String>,
    /// Display date derived at creation
    pub date: String,
    /// Sortable file name combining id and creation time
    pub filename: String,
    /// Free-text body
    pub content: String,
    /// Derived from `content`, see [`preview_text`]
    pub preview_text: String,
    /// Last-modified time, the version marker for conflict resolution
    pub timestamp: NaiveDateTime,
    /// Local state not yet confirmed on the journal service
    pub needs_sync: bool,
    /// Tombstone awaiting remote deletion
    pub is_deleted: bool,
}

impl JournalEntry {
    /// Create a new entry with the given content.
    ///
    /// The entry is dirty unless its content is blank.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        let id = EntryId::new();
        let now = now_timestamp();
        let content = content.into();
        let needs_sync = !content.trim().is_empty();

        Self {
            id,
            remote_id: None,
            date: now.format(DISPLAY_DATE_FORMAT).to_string(),
            filename: format!("[{id}]-[{}].md", now.format(FILENAME_DATE_FORMAT)),
            preview_text: preview_text(&content),
            content,
            timestamp: now,
            needs_sync,
            is_deleted: false,
        }
    }

    /// Create the entry seeded into an empty journal. It is not queued for sync.
    #[must_use]
    pub fn welcome() -> Self {
        let mut entry = Self::new(WELCOME_MESSAGE);
        entry.needs_sync = false;
        entry
    }

    /// Replace the content, recompute the preview, and mark the entry dirty.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.preview_text = preview_text(&self.content);
        self.timestamp = now_timestamp();
        self.needs_sync = true;
    }

    /// Identifier the journal service knows this entry by.
    #[must_use]
    pub fn sync_key(&self) -> String {
        self.remote_id.clone().unwrap_or_else(|| self.id.as_str())
    }

    /// Check if entry content is empty (whitespace-only counts as empty)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Compute the list preview for `content`.
///
/// Newlines collapse to spaces and the result is trimmed. Blank content
/// yields [`EMPTY_PREVIEW`]; anything longer than [`PREVIEW_MAX_CHARS`]
/// characters is cut and suffixed with `...`.
#[must_use]
pub fn preview_text(content: &str) -> String {
    let collapsed = content.replace('\n', " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        EMPTY_PREVIEW.to_string()
    } else if trimmed.chars().count() > PREVIEW_MAX_CHARS {
        let mut preview = trimmed.chars().take(PREVIEW_MAX_CHARS).collect::<String>();
        preview.push_str("...");
        preview
    } else {
        trimmed.to_string()
    }
}

/// Current UTC time at the microsecond precision the wire format carries.
#[must_use]
pub fn now_timestamp() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a service timestamp.
///
/// Accepts `YYYY-MM-DDTHH:mm:ss` with or without a fractional part, and
/// falls back to RFC 3339 (converted to UTC) for offset-carrying values.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|date_time| date_time.naive_utc())
        })
}
