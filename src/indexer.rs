//! The write side of the engine: applying upserts and deletes to the text
//! index and the fingerprint store, and reconciling both against the vault.
//!
//! Every mutation path goes through [`Indexer`], which serializes batches
//! behind a single writer gate and keeps the index and the fingerprint
//! store in lockstep: a key has a fingerprint if and only if it has a
//! document.

use crate::error::{ExtractError, VaultError};
use crate::extract::extract;
use crate::fingerprint::{Fingerprint, FingerprintStore, Fingerprints};
use crate::search::{Document, IndexOp, TextIndex};
use crate::vault::Vault;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Outcome of one upsert batch. Per-file failures are collected here
/// rather than failing the batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub indexed: Vec<String>,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

/// What a reconciliation would change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Absolute paths of new or changed eligible files.
    pub to_upsert: BTreeSet<PathBuf>,
    /// Keys present in the fingerprint store or the index whose file is
    /// gone.
    pub to_delete: BTreeSet<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_upsert.is_empty() && self.to_delete.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub upserted: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub struct Indexer {
    vault: Vault,
    index: Arc<dyn TextIndex>,
    store: FingerprintStore,
    gate: Mutex<()>,
}

impl Indexer {
    pub fn new(vault: Vault, index: Arc<dyn TextIndex>, store: FingerprintStore) -> Self {
        Self {
            vault,
            index,
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    /// Extracts and indexes each path, best effort. Missing files and
    /// ineligible paths are skipped; extraction failures are logged and
    /// reported. The fingerprint store is saved once, after the index
    /// commit.
    ///
    /// Only a failed index commit fails the call; in that case neither the
    /// index nor the store changed.
    pub async fn apply_upserts<I>(&self, paths: I) -> Result<BatchReport, VaultError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let _writer = self.gate.lock().await;
        self.upsert_locked(paths).await
    }

    /// Removes the given keys from the index and the fingerprint store.
    /// Returns how many keys were processed.
    pub async fn apply_deletes<I>(&self, keys: I) -> Result<usize, VaultError>
    where
        I: IntoIterator<Item = String>,
    {
        let _writer = self.gate.lock().await;
        self.delete_locked(keys).await
    }

    /// Diffs the vault against the fingerprint store without changing
    /// anything.
    pub async fn plan(&self) -> Result<ReconcilePlan, VaultError> {
        let indexed: BTreeSet<String> = self.index.keys().await?.into_iter().collect();
        let vault = self.vault.clone();
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || compute_plan(&vault, &store.load(), &indexed))
            .await
            .map_err(|e| VaultError::Other(format!("vault scan task failed: {e}")))
    }

    /// Brings the index in line with the vault: deletes vanished
    /// documents, then upserts new and changed ones. A second call with no
    /// filesystem change in between writes nothing.
    pub async fn reconcile(&self) -> Result<ReconcileReport, VaultError> {
        let _writer = self.gate.lock().await;
        let plan = self.plan().await?;

        if plan.is_empty() {
            debug!("index is consistent with the vault");
            return Ok(ReconcileReport::default());
        }

        info!(
            upserts = plan.to_upsert.len(),
            deletes = plan.to_delete.len(),
            "reconciling index"
        );

        let deleted = self.delete_locked(plan.to_delete).await?;
        let batch = self.upsert_locked(plan.to_upsert).await?;

        Ok(ReconcileReport {
            upserted: batch.indexed.len(),
            deleted,
            failed: batch.failed.len(),
        })
    }

    async fn upsert_locked<I>(&self, paths: I) -> Result<BatchReport, VaultError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut fingerprints = self.store.load();
        let mut report = BatchReport::default();
        let mut ops = Vec::new();

        for path in paths {
            match self.prepare(&path).await {
                Ok(Some((doc, fingerprint))) => {
                    debug!(key = %doc.path, chars = doc.content.len(), "prepared document");
                    fingerprints.insert(doc.path.clone(), fingerprint);
                    report.indexed.push(doc.path.clone());
                    ops.push(IndexOp::Upsert(doc));
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to index file");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        if ops.is_empty() {
            return Ok(report);
        }

        self.index.commit(ops).await?;
        self.persist(&fingerprints);

        info!(
            indexed = report.indexed.len(),
            skipped = report.skipped,
            failed = report.failed.len(),
            "indexed batch"
        );
        Ok(report)
    }

    async fn delete_locked<I>(&self, keys: I) -> Result<usize, VaultError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut fingerprints = self.store.load();
        let mut ops = Vec::new();

        for key in keys {
            debug!(key = %key, "removing document");
            fingerprints.remove(&key);
            ops.push(IndexOp::Delete(key));
        }

        if ops.is_empty() {
            return Ok(0);
        }

        let removed = ops.len();
        self.index.commit(ops).await?;
        self.persist(&fingerprints);

        info!(removed, "removed deleted files from index");
        Ok(removed)
    }

    /// Reads one file into a document. `Ok(None)` means the path should be
    /// skipped: it vanished, is not a regular file, or is not eligible.
    async fn prepare(&self, path: &Path) -> Result<Option<(Document, Fingerprint)>, ExtractError> {
        if !self.vault.is_eligible(path) {
            debug!(path = %path.display(), "skipping ineligible path");
            return Ok(None);
        }

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "file no longer exists");
                return Ok(None);
            }
            Err(source) => {
                return Err(ExtractError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if !metadata.is_file() {
            return Ok(None);
        }

        // Fingerprint before reading: if the file changes mid-read, the
        // stored fingerprint is stale and the next pass re-indexes it.
        let fingerprint = Fingerprint::from_metadata(&metadata);
        let key = match self.vault.key_for(path) {
            Ok(key) => key,
            Err(e @ ExtractError::NonUtf8Path { .. }) => {
                warn!(error = %e, "skipping file");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let content = extract(path).await?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Some((
            Document {
                path: key,
                content,
                modified,
            },
            fingerprint,
        )))
    }

    fn persist(&self, fingerprints: &Fingerprints) {
        if let Err(e) = self.store.save(fingerprints) {
            error!(
                path = %self.store.path().display(),
                error = %e,
                "failed to save fingerprint store; next reconcile will repair it"
            );
        }
    }
}

/// Pure diff of the vault's current state against stored fingerprints and
/// the keys present in the index. A key known to either side whose file is
/// gone is deleted, so a lost store cannot strand documents.
pub fn compute_plan(
    vault: &Vault,
    fingerprints: &Fingerprints,
    indexed: &BTreeSet<String>,
) -> ReconcilePlan {
    let files = vault.scan();
    let mut plan = ReconcilePlan::default();

    for file in files.values().filter(|f| f.eligible) {
        let current = match Fingerprint::of(&file.path) {
            Ok(fp) => fp,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "cannot fingerprint file");
                continue;
            }
        };

        if fingerprints.get(&file.key) != Some(&current) {
            plan.to_upsert.insert(file.path.clone());
        }
    }

    plan.to_delete = fingerprints
        .keys()
        .chain(indexed)
        .filter(|key| !files.contains_key(*key))
        .cloned()
        .collect();

    plan
}
