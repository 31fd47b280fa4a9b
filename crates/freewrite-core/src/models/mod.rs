//! Data models for Freewrite

mod entry;

pub use entry::{
    format_timestamp, now_timestamp, parse_timestamp, preview_text, EntryId, JournalEntry,
    EMPTY_PREVIEW, PREVIEW_MAX_CHARS, TIMESTAMP_FORMAT, WELCOME_MESSAGE,
};
