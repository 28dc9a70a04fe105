use crate::error::VaultError;
use crate::indexer::{BatchReport, Indexer};
use crate::watcher::PendingSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

/// Periodically drains the pending set into the indexer, coalescing all
/// changes seen within one interval into a single batch.
pub struct DebounceProcessor {
    pending: PendingSet,
    indexer: Arc<Indexer>,
    period: Duration,
}

impl DebounceProcessor {
    pub fn new(pending: PendingSet, indexer: Arc<Indexer>, period: Duration) -> Self {
        Self {
            pending,
            indexer,
            period,
        }
    }

    /// Spawns the loop on the current runtime. It exits when `stop`
    /// changes or its sender is dropped.
    pub fn spawn(self, stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    /// Runs one drain-and-index cycle. Returns `None` if nothing was
    /// pending.
    pub async fn tick(&self) -> Option<Result<BatchReport, VaultError>> {
        let batch = self.pending.drain();
        if batch.is_empty() {
            return None;
        }

        info!(pending = batch.len(), "processing pending changes");
        Some(self.indexer.apply_upserts(batch).await)
    }

    async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;

        debug!(period = ?self.period, "debounce loop started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }

            match self.tick().await {
                Some(Ok(report)) => debug!(
                    indexed = report.indexed.len(),
                    failed = report.failed.len(),
                    "debounce batch done"
                ),
                Some(Err(e)) => error!(error = %e, "debounce batch failed"),
                None => {}
            }
        }
        debug!("debounce loop stopped");
    }
}
