//! Offline-first synchronization between the entry store and the journal service.
//!
//! Local edits are pushed first (upsert keyed by the service identifier), then
//! the service's entries are pulled and merged with a last-writer-wins rule on
//! the entry timestamp.

mod engine;
mod reconcile;
mod scheduler;


pub use engine::{SyncEngine, SyncOutcome, SyncReport, SyncStatus, OFFLINE_MESSAGE};
pub use reconcile::{plan_pull, PullPlan, PullReport};
pub use scheduler::SyncScheduler;
