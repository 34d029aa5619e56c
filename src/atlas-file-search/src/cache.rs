//! Shared crawl-result cache with TTL eviction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Cache key for one crawl invocation.
///
/// Two crawls are cache-equivalent iff the absolute root, the ignore
/// fingerprint and the depth bound all match exactly; an unset depth is a
/// distinct bucket from any explicit depth value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlKey {
    /// Absolute path of the crawled directory.
    pub root: PathBuf,

    /// Fingerprint of the ignore rules active during the crawl.
    pub fingerprint: String,

    /// Depth bound of the crawl, if any.
    pub max_depth: Option<usize>,
}

#[derive(Debug)]
struct CacheEntry {
    paths: Arc<Vec<String>>,
    deadline: Instant,
    timer: JoinHandle<()>,
}

type EntryMap = HashMap<CrawlKey, CacheEntry>;

/// TTL-evicting store of crawl results, shared between engine instances.
///
/// The cache is an explicitly constructed object: the host application
/// creates one and hands clones to every engine that should share crawl
/// results. Writes are last-writer-wins per key; a re-write cancels the
/// previous eviction timer before scheduling its own, so a stale earlier
/// expiry can never fire after a refresh.
///
/// Eviction timers are spawned onto the ambient Tokio runtime, so `write`
/// must be called from within one.
#[derive(Debug, Clone, Default)]
pub struct CrawlCache {
    entries: Arc<Mutex<EntryMap>>,
}

impl CrawlCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached paths for `key`, or `None` if the key was never
    /// written or has expired.
    ///
    /// An entry is readable at any time strictly before its deadline and
    /// absent at or after it, independent of timer scheduling.
    pub fn read(&self, key: &CrawlKey) -> Option<Arc<Vec<String>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.deadline => Some(entry.paths.clone()),
            Some(_) => {
                if let Some(expired) = entries.remove(key) {
                    expired.timer.abort();
                }
                None
            }
            None => None,
        }
    }

    /// Stores `paths` under `key` and schedules its eviction `ttl` from now.
    pub fn write(&self, key: CrawlKey, paths: Vec<String>, ttl: Duration) {
        let deadline = Instant::now() + ttl;
        let timer = self.spawn_eviction(key.clone(), deadline);
        let entry = CacheEntry {
            paths: Arc::new(paths),
            deadline,
            timer,
        };
        if let Some(previous) = self.entries.lock().insert(key, entry) {
            previous.timer.abort();
        }
    }

    fn spawn_eviction(&self, key: CrawlKey, deadline: Instant) -> JoinHandle<()> {
        let entries: Weak<Mutex<EntryMap>> = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(entries) = entries.upgrade() {
                let mut entries = entries.lock();
                // Only evict the write this timer belongs to.
                if entries.get(&key).is_some_and(|entry| entry.deadline == deadline) {
                    entries.remove(&key);
                }
            }
        })
    }

    /// Cancels every pending eviction timer and empties the store.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        for (_, entry) in entries.drain() {
            entry.timer.abort();
        }
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
