//! Filesystem change tracking.
//!
//! A [`ChangeSource`] delivers OS notifications for the vault to a
//! [`ChangeWatcher`], which keeps the eligible created/modified files in a
//! deduplicated [`PendingSet`]. The [`DebounceProcessor`] is the only
//! consumer: once per interval it drains the set and hands the batch to the
//! indexer.
//!
//! Deletions are never acted on here. The reconciler's existence diff is
//! the single place documents get removed, so a fast delete-then-recreate
//! cannot race an in-flight event. A renamed file's new path is indexed on
//! the next tick; its old path lingers until the next reconciliation.

pub mod debounce;
pub mod pending;
pub mod source;

pub use debounce::DebounceProcessor;
pub use pending::PendingSet;
pub use source::{ChangeSource, NotifySource};

use crate::vault::Vault;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Other,
}

/// A filesystem notification in source-independent form.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub paths: Vec<PathBuf>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, paths: Vec<PathBuf>) -> Self {
        Self { kind, paths }
    }
}

/// Event sink shared with the notification thread.
#[derive(Clone)]
pub struct ChangeWatcher {
    vault: Vault,
    pending: PendingSet,
}

impl ChangeWatcher {
    pub fn new(vault: Vault, pending: PendingSet) -> Self {
        Self { vault, pending }
    }

    /// Queues every eligible regular file named by a create or modify
    /// event. Returns how many paths were newly queued.
    pub fn handle(&self, event: &ChangeEvent) -> usize {
        if !matches!(event.kind, ChangeKind::Created | ChangeKind::Modified) {
            return 0;
        }

        let mut queued = 0;
        for path in &event.paths {
            if path.is_dir() {
                continue;
            }

            let path = match std::path::absolute(path) {
                Ok(path) => path,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot normalize event path");
                    continue;
                }
            };

            if !self.vault.is_eligible(&path) {
                continue;
            }

            debug!(path = %path.display(), kind = ?event.kind, "queueing change");
            if self.pending.insert(path) {
                queued += 1;
            }
        }
        queued
    }
}
