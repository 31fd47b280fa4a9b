use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::reconcile::PullReport;
use super::scheduler::SyncScheduler;
use crate::config::ClientConfig;
use crate::models::EntryId;
use crate::remote::JournalApi;
use crate::services::EntryStore;
use crate::state::SyncState;
use crate::Result;

/// Error recorded when a sync is requested without connectivity.
pub const OFFLINE_MESSAGE: &str = "No internet connection";

/// Counts for one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub deleted: usize,
    pub push_failures: usize,
    pub updated: usize,
    pub created: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl SyncReport {
    fn with_pull(mut self, pull: PullReport) -> Self {
        self.updated = pull.updated;
        self.created = pull.created;
        self.unchanged = pull.unchanged;
        self.skipped = pull.skipped;
        self
    }
}

/// Result of asking the engine to sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync was in flight; nothing was done
    AlreadySyncing,
    /// No connectivity; the error was recorded and nothing was sent
    Offline,
    /// The pass aborted; the message was recorded as the sync error
    Failed(String),
}

/// Observable engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub sync_error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StatusFields {
    sync_error: Option<String>,
    last_sync_at: Option<DateTime<Utc>>,
}

enum PushOutcome {
    Pushed,
    Deleted,
    Skipped,
}

/// Holds the syncing flag for the lifetime of one pass.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct EngineInner<A> {
    store: EntryStore,
    api: Arc<A>,
    config: ClientConfig,
    syncing: AtomicBool,
    // Held by every single-entry push and by the whole pull phase, so a pull
    // never sees a record whose local entry has not recorded its service id yet.
    push_lock: Mutex<()>,
    status: Mutex<StatusFields>,
    scheduler: Option<SyncScheduler>,
}

/// Coordinates pushes, pulls and the periodic schedule.
///
/// Cloning is cheap; clones share state. At most one full sync or refresh is
/// in flight at any time.
pub struct SyncEngine<A> {
    inner: Arc<EngineInner<A>>,
}

impl<A> Clone for SyncEngine<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: JournalApi + 'static> SyncEngine<A> {
    /// Create an engine that only syncs on demand.
    pub fn new(store: EntryStore, api: Arc<A>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner::new(store, api, config, None)),
        }
    }

    /// Create an engine with automatic sync every `config.sync_interval`.
    ///
    /// Must be called from within a Tokio runtime. The schedule ends when the
    /// last engine handle is dropped or [`Self::stop_auto_sync`] is called.
    pub fn start(store: EntryStore, api: Arc<A>, config: ClientConfig) -> Self {
        let interval = config.sync_interval;
        let inner = Arc::new_cyclic(|weak: &Weak<EngineInner<A>>| {
            let scheduler = SyncScheduler::spawn(weak.clone(), interval);
            EngineInner::new(store, api, config, Some(scheduler))
        });
        info!("Automatic sync every {}s", interval.as_secs());
        Self { inner }
    }

    pub(crate) const fn from_inner(inner: Arc<EngineInner<A>>) -> Self {
        Self { inner }
    }

    pub fn store(&self) -> &EntryStore {
        &self.inner.store
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> SyncStatus {
        let status = self.inner.status.lock().await;
        SyncStatus {
            state: if self.is_syncing() {
                SyncState::Syncing
            } else {
                SyncState::Idle
            },
            sync_error: status.sync_error.clone(),
            last_sync_at: status.last_sync_at,
        }
    }

    pub fn auto_sync_running(&self) -> bool {
        self.inner
            .scheduler
            .as_ref()
            .is_some_and(SyncScheduler::is_running)
    }

    /// Stop the periodic schedule, if one is running.
    pub fn stop_auto_sync(&self) {
        if let Some(scheduler) = &self.inner.scheduler {
            scheduler.stop();
        }
    }

    /// Push every dirty entry, then pull and merge the service's entries.
    ///
    /// Individual push failures are logged and leave the entry queued; a
    /// failure to list or merge remote entries fails the whole pass.
    pub async fn perform_full_sync(&self) -> SyncOutcome {
        if self.is_syncing() {
            debug!("Sync already in progress");
            return SyncOutcome::AlreadySyncing;
        }
        if !self.inner.api.is_connected() {
            self.set_error(Some(OFFLINE_MESSAGE.to_string())).await;
            return SyncOutcome::Offline;
        }
        let Some(_guard) = SyncGuard::acquire(&self.inner.syncing) else {
            return SyncOutcome::AlreadySyncing;
        };
        self.set_error(None).await;

        info!("Starting full sync");
        match self.run_full_sync().await {
            Ok(report) => {
                let mut status = self.inner.status.lock().await;
                status.last_sync_at = Some(Utc::now());
                status.sync_error = None;
                info!(
                    "Sync completed: {} pushed, {} deleted, {} updated, {} created",
                    report.pushed, report.deleted, report.updated, report.created
                );
                SyncOutcome::Completed(report)
            }
            Err(err) => self.fail(&err).await,
        }
    }

    /// Pull and merge the service's entries without pushing.
    ///
    /// Shares the in-flight guard with [`Self::perform_full_sync`] and does not
    /// move `last_sync_at`.
    pub async fn refresh_from_server(&self) -> SyncOutcome {
        if self.is_syncing() {
            return SyncOutcome::AlreadySyncing;
        }
        if !self.inner.api.is_connected() {
            self.set_error(Some(OFFLINE_MESSAGE.to_string())).await;
            return SyncOutcome::Offline;
        }
        let Some(_guard) = SyncGuard::acquire(&self.inner.syncing) else {
            return SyncOutcome::AlreadySyncing;
        };

        match self.pull_server_changes().await {
            Ok(pull) => {
                self.set_error(None).await;
                SyncOutcome::Completed(SyncReport::default().with_pull(pull))
            }
            Err(err) => self.fail(&err).await,
        }
    }

    /// Push one entry if it is dirty. Failures are logged, never returned.
    pub async fn sync_single_entry(&self, id: &EntryId) {
        if !self.inner.api.is_connected() {
            debug!("Offline, entry {id} stays queued");
            return;
        }

        match self.push_entry(id).await {
            Ok(PushOutcome::Pushed) => info!("Synced entry {id}"),
            Ok(PushOutcome::Deleted) => info!("Deleted entry {id} from journal service"),
            Ok(PushOutcome::Skipped) => {}
            Err(err) => warn!("Failed to sync entry {id}: {err}"),
        }
    }

    /// Queue an entry regardless of its state and push it now.
    pub async fn force_push_entry(&self, id: &EntryId) {
        if let Err(err) = self.inner.store.mark_needs_sync(id).await {
            warn!("Failed to queue entry {id}: {err}");
            return;
        }
        self.sync_single_entry(id).await;
    }

    async fn run_full_sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        let dirty = self.inner.store.dirty_entries().await?;
        debug!("{} entries waiting to be pushed", dirty.len());
        for entry in dirty {
            match self.push_entry(&entry.id).await {
                Ok(PushOutcome::Pushed) => report.pushed += 1,
                Ok(PushOutcome::Deleted) => report.deleted += 1,
                Ok(PushOutcome::Skipped) => {}
                Err(err) => {
                    warn!("Failed to sync entry {}: {err}", entry.filename);
                    report.push_failures += 1;
                }
            }
        }

        let pull = self.pull_server_changes().await?;
        Ok(report.with_pull(pull))
    }

    async fn pull_server_changes(&self) -> Result<PullReport> {
        let _push = self.inner.push_lock.lock().await;
        let remote = self
            .inner
            .api
            .list_entries(self.inner.config.pull_limit, 0)
            .await?;
        debug!("Fetched {} entries from journal service", remote.len());
        self.inner.store.apply_pull(remote).await
    }

    /// Upsert (or delete) one entry on the service and clear its dirty flag.
    async fn push_entry(&self, id: &EntryId) -> Result<PushOutcome> {
        let _push = self.inner.push_lock.lock().await;
        let Some(entry) = self.inner.store.find_entry(id).await? else {
            return Ok(PushOutcome::Skipped);
        };
        if !entry.needs_sync {
            return Ok(PushOutcome::Skipped);
        }

        let api = &self.inner.api;
        let key = entry.sync_key();

        if entry.is_deleted {
            match api.delete_entry(&key).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => debug!("Entry {key} already absent remotely"),
                Err(err) => return Err(err.into()),
            }
            self.inner.store.purge_entry(&entry.id).await?;
            return Ok(PushOutcome::Deleted);
        }

        let remote = match api.get_entry(&key).await {
            Ok(_) => api.update_entry(&key, &entry.content).await?,
            Err(err) if err.is_not_found() => api.create_entry(&entry.content).await?,
            Err(err) => return Err(err.into()),
        };

        let cleared = self
            .inner
            .store
            .mark_synced(&entry.id, &entry.timestamp, Some(&remote.id))
            .await?;
        if !cleared {
            debug!("Entry {} changed during push, keeping it queued", entry.id);
        }
        Ok(PushOutcome::Pushed)
    }

    async fn set_error(&self, message: Option<String>) {
        self.inner.status.lock().await.sync_error = message;
    }

    async fn fail(&self, err: &crate::Error) -> SyncOutcome {
        let message = format!("Sync failed: {err}");
        error!("{message}");
        self.set_error(Some(message.clone())).await;
        SyncOutcome::Failed(message)
    }
}

impl<A> EngineInner<A> {
    fn new(
        store: EntryStore,
        api: Arc<A>,
        config: ClientConfig,
        scheduler: Option<SyncScheduler>,
    ) -> Self {
        Self {
            store,
            api,
            config,
            syncing: AtomicBool::new(false),
            push_lock: Mutex::new(()),
            status: Mutex::new(StatusFields::default()),
            scheduler,
        }
    }
}
