//! Periodic full sync.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::{EngineInner, SyncEngine};
use crate::remote::JournalApi;

/// Background task that runs a full sync every interval.
///
/// The first sync happens one interval after spawning. The task holds only a
/// weak reference to the engine and exits once the engine is gone.
pub struct SyncScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub(crate) fn spawn<A>(engine: Weak<EngineInner<A>>, period: Duration) -> Self
    where
        A: JournalApi + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let Some(inner) = engine.upgrade() else {
                    break;
                };
                let active = SyncEngine::from_inner(inner);
                if !active.api().check_connectivity().await {
                    tracing::debug!("Journal service unreachable at scheduled sync");
                }
                let outcome = active.perform_full_sync().await;
                tracing::debug!("Scheduled sync finished: {outcome:?}");
            }

            tracing::debug!("Sync scheduler stopped");
        });

        Self { shutdown, handle }
    }

    /// Ask the task to exit after any sync in progress.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
