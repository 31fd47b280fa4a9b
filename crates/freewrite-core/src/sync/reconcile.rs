//! Pull-side reconciliation of remote records into the local entry set.

use std::collections::{HashMap, HashSet};

use crate::models::{now_timestamp, preview_text, EntryId, JournalEntry};
use crate::remote::RemoteEntry;

/// Counts produced by applying one pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Local entries overwritten by a newer remote version
    pub updated: usize,
    /// Remote-only records materialized locally
    pub created: usize,
    /// Records whose local copy is as new or newer
    pub unchanged: usize,
    /// Records ignored: duplicates, pending local deletions, unreadable timestamps
    pub skipped: usize,
}

/// Local mutations decided by [`plan_pull`], applied together by the store.
#[derive(Debug, Default)]
pub struct PullPlan {
    pub updates: Vec<JournalEntry>,
    pub inserts: Vec<JournalEntry>,
    pub unchanged: usize,
    pub skipped: usize,
}

impl PullPlan {
    pub fn report(&self) -> PullReport {
        PullReport {
            updated: self.updates.len(),
            created: self.inserts.len(),
            unchanged: self.unchanged,
            skipped: self.skipped,
        }
    }
}

/// Decide how `remote` records merge into `local` (every row, tombstones included).
///
/// Records are matched by [`JournalEntry::sync_key`]. A matched local entry
/// is overwritten only when the remote timestamp is strictly newer; unmatched
/// records become new clean entries. Local-only entries are never touched and
/// tombstones are never resurrected.
pub fn plan_pull(local: &[JournalEntry], remote: Vec<RemoteEntry>) -> PullPlan {
    let by_key = local
        .iter()
        .map(|entry| (entry.sync_key(), entry))
        .collect::<HashMap<_, _>>();
    let mut taken_ids = local
        .iter()
        .map(|entry| entry.id)
        .collect::<HashSet<EntryId>>();
    let mut seen = HashSet::new();
    let mut plan = PullPlan::default();

    for record in remote {
        if !seen.insert(record.id.clone()) {
            plan.skipped += 1;
            continue;
        }

        match by_key.get(&record.id) {
            Some(entry) if entry.is_deleted => {
                plan.skipped += 1;
            }
            Some(entry) => match record.parsed_timestamp() {
                Some(remote_timestamp) if remote_timestamp > entry.timestamp => {
                    let mut updated = (*entry).clone();
                    updated.remote_id = Some(record.id);
                    updated.date = record.date;
                    updated.filename = record.filename;
                    updated.preview_text = preview_text(&record.content);
                    updated.content = record.content;
                    updated.timestamp = remote_timestamp;
                    updated.needs_sync = false;
                    plan.updates.push(updated);
                }
                Some(_) => plan.unchanged += 1,
                None => {
                    tracing::warn!(
                        "Ignoring remote entry {} with unreadable timestamp '{}'",
                        record.id,
                        record.timestamp
                    );
                    plan.skipped += 1;
                }
            },
            None => {
                let entry = materialize(record, &taken_ids);
                taken_ids.insert(entry.id);
                plan.inserts.push(entry);
            }
        }
    }

    plan
}

/// Build a clean local entry from a remote-only record.
fn materialize(record: RemoteEntry, taken_ids: &HashSet<EntryId>) -> JournalEntry {
    let id = record
        .id
        .parse::<EntryId>()
        .ok()
        .filter(|id| !taken_ids.contains(id))
        .unwrap_or_default();
    let timestamp = record.parsed_timestamp().unwrap_or_else(now_timestamp);

    JournalEntry {
        id,
        preview_text: preview_text(&record.content),
        remote_id: Some(record.id),
        date: record.date,
        filename: record.filename,
        content: record.content,
        timestamp,
        needs_sync: false,
        is_deleted: false,
    }
}
