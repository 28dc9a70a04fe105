use crate::error::WatchError;
use crate::watcher::{ChangeEvent, ChangeKind, ChangeWatcher};
use notify::event::CreateKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A provider of filesystem notifications for a directory tree.
///
/// Implementations call [`ChangeWatcher::handle`] from whatever thread
/// they deliver events on, possibly concurrently.
pub trait ChangeSource: Send {
    fn subscribe(&mut self, root: &Path, sink: ChangeWatcher) -> Result<(), WatchError>;

    /// Stops delivery. Safe to call more than once.
    fn unsubscribe(&mut self);
}

/// [`ChangeSource`] backed by the platform's native watcher.
#[derive(Default)]
pub struct NotifySource {
    active: Option<(RecommendedWatcher, PathBuf)>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeSource for NotifySource {
    fn subscribe(&mut self, root: &Path, sink: ChangeWatcher) -> Result<(), WatchError> {
        if self.active.is_some() {
            return Err(WatchError::AlreadySubscribed);
        }

        let subscribe_err = |source| WatchError::Subscribe {
            path: root.to_path_buf(),
            source,
        };

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Some(change) = convert_event(event) {
                    sink.handle(&change);
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        };

        let mut watcher =
            RecommendedWatcher::new(handler, Config::default()).map_err(subscribe_err)?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(subscribe_err)?;

        info!(path = %root.display(), "file watcher started");
        self.active = Some((watcher, root.to_path_buf()));
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some((mut watcher, root)) = self.active.take() {
            if let Err(e) = watcher.unwatch(&root) {
                debug!(error = %e, "unwatch failed");
            }
            drop(watcher);
            info!(path = %root.display(), "file watcher stopped");
        }
    }
}

impl Drop for NotifySource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn convert_event(event: Event) -> Option<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(CreateKind::Folder) => return None,
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        _ => return None,
    };
    Some(ChangeEvent::new(kind, event.paths))
}
