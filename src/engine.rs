//! The engine handle that ties the index, the indexer, the watcher and the
//! query side together.
//!
//! An [`Engine`] is created once at startup and passed to whoever needs to
//! search or trigger a reindex. [`Engine::start`] opens the index, starts
//! watching the vault, and runs an initial reconciliation;
//! [`Engine::shutdown`] stops the debounce loop (bounded wait) and then the
//! watcher.

use crate::config::EngineConfig;
use crate::error::{VaultError, VaultResult};
use crate::fingerprint::FingerprintStore;
use crate::indexer::{Indexer, ReconcilePlan, ReconcileReport};
use crate::search::index::SqliteIndex;
use crate::search::query::{QueryEngine, SearchResult};
use crate::search::{Document, TextIndex};
use crate::vault::Vault;
use crate::watcher::{ChangeSource, ChangeWatcher, DebounceProcessor, NotifySource, PendingSet};
use std::fs;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct Background {
    source: Box<dyn ChangeSource>,
    stop_tx: watch::Sender<bool>,
    debounce: JoinHandle<()>,
}

pub struct Engine {
    config: EngineConfig,
    index: Arc<dyn TextIndex>,
    indexer: Arc<Indexer>,
    query: QueryEngine,
    pending: PendingSet,
    background: Option<Background>,
}

impl Engine {
    /// Opens the engine over the SQLite index in `config.index_path`,
    /// without reconciling or watching. Fails if the index cannot be
    /// opened.
    pub async fn open(config: EngineConfig) -> VaultResult<Self> {
        let index = SqliteIndex::open(&config.index_db_file()).await?;
        Self::with_index(config, Arc::new(index))
    }

    /// Like [`Engine::open`] with a caller-supplied index.
    pub fn with_index(mut config: EngineConfig, index: Arc<dyn TextIndex>) -> VaultResult<Self> {
        config.validate()?;

        fs::create_dir_all(&config.vault_path)?;
        config.vault_path = fs::canonicalize(&config.vault_path)?;

        let vault = Vault::new(&config.vault_path, &config.extensions);
        let store = FingerprintStore::new(config.fingerprint_file());
        let indexer = Arc::new(Indexer::new(vault, index.clone(), store));
        let query = QueryEngine::new(index.clone(), config.default_limit, config.max_limit);

        info!(vault = %config.vault_path.display(), "search engine ready");
        Ok(Self {
            config,
            index,
            indexer,
            query,
            pending: PendingSet::new(),
            background: None,
        })
    }

    /// Opens the engine, starts watching the vault with the platform
    /// watcher, and reconciles the index with the vault.
    pub async fn start(config: EngineConfig) -> VaultResult<Self> {
        Self::start_with(config, Box::new(NotifySource::new())).await
    }

    /// Like [`Engine::start`] with a caller-supplied change source.
    ///
    /// The subscription is in place before the initial reconciliation
    /// scans the vault, so a file added while it runs is still queued.
    pub async fn start_with(config: EngineConfig, source: Box<dyn ChangeSource>) -> VaultResult<Self> {
        let mut engine = Self::open(config).await?;
        engine.watch(source)?;

        let report = engine.reconcile().await?;
        info!(
            upserted = report.upserted,
            deleted = report.deleted,
            failed = report.failed,
            "initial reconciliation finished"
        );
        Ok(engine)
    }

    /// Subscribes `source` to the vault and spawns the debounce loop.
    /// Must be called from within a Tokio runtime.
    pub fn watch(&mut self, mut source: Box<dyn ChangeSource>) -> VaultResult<()> {
        if self.background.is_some() {
            return Err(VaultError::Other("engine is already watching".into()));
        }

        let sink = ChangeWatcher::new(self.indexer.vault().clone(), self.pending.clone());
        source.subscribe(&self.config.vault_path, sink)?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let debounce = DebounceProcessor::new(
            self.pending.clone(),
            self.indexer.clone(),
            self.config.debounce,
        )
        .spawn(stop_rx);

        self.background = Some(Background {
            source,
            stop_tx,
            debounce,
        });
        Ok(())
    }

    pub async fn search(&self, query: &str, limit: Option<usize>) -> VaultResult<Vec<SearchResult>> {
        self.query.search(query, limit).await
    }

    /// Full reconciliation; used at startup and for manual reindex.
    pub async fn reconcile(&self) -> VaultResult<ReconcileReport> {
        self.indexer.reconcile().await
    }

    /// Reports what [`Engine::reconcile`] would change, without applying it.
    pub async fn plan(&self) -> VaultResult<ReconcilePlan> {
        self.indexer.plan().await
    }

    pub async fn document(&self, key: &str) -> VaultResult<Option<Document>> {
        Ok(self.index.get(key).await?)
    }

    pub async fn document_count(&self) -> VaultResult<u64> {
        Ok(self.index.count().await?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn is_watching(&self) -> bool {
        self.background.is_some()
    }

    /// Stops the debounce loop, waiting at most `shutdown_timeout`, then
    /// stops the watcher. Calling it again is a no-op.
    pub async fn shutdown(&mut self) {
        let Some(mut background) = self.background.take() else {
            return;
        };

        let _ = background.stop_tx.send(true);
        match tokio::time::timeout(self.config.shutdown_timeout, &mut background.debounce).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "debounce loop ended abnormally"),
            Err(_) => {
                warn!(timeout = ?self.config.shutdown_timeout, "debounce loop did not stop in time");
                background.debounce.abort();
            }
        }

        background.source.unsubscribe();
        info!("search engine shut down");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(mut background) = self.background.take() {
            let _ = background.stop_tx.send(true);
            background.source.unsubscribe();
        }
    }
}
