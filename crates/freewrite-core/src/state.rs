//! Shared sync state types.

/// Sync engine state. A sync may only start from `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

impl SyncState {
    pub const fn is_syncing(self) -> bool {
        matches!(self, Self::Syncing)
    }
}
