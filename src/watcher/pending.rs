use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Deduplicated set of absolute paths awaiting (re)indexing.
///
/// Insertions and the drain share one lock, so a drain observes either
/// all or none of a concurrent insertion.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    inner: Arc<Mutex<HashSet<PathBuf>>>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the path was already pending.
    pub fn insert(&self, path: PathBuf) -> bool {
        self.lock().insert(path)
    }

    /// Takes the current contents, leaving the set empty.
    pub fn drain(&self) -> HashSet<PathBuf> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // Insert and take are single calls, so a poisoned set is still whole.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn drain_empties_the_set() {
        let pending = PendingSet::new();
        assert!(pending.insert(PathBuf::from("/v/a.md")));
        assert!(!pending.insert(PathBuf::from("/v/a.md")));
        assert!(pending.insert(PathBuf::from("/v/b.md")));

        let batch = pending.drain();
        assert_eq!(batch.len(), 2);
        assert!(pending.is_empty());
        assert!(pending.drain().is_empty());
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let pending = PendingSet::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let pending = pending.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        pending.insert(PathBuf::from(format!("/v/{t}/{i}.md")));
                    }
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            handle.join().unwrap();
            seen.extend(pending.drain());
        }
        seen.extend(pending.drain());

        assert_eq!(seen.len(), 200);
    }
}
