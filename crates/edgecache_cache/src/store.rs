use dashmap::DashMap;
use tracing::debug;

use crate::entry::CacheEntry;
use crate::key::CacheKey;

/// Concurrent in-memory entry store shared by all connection tasks.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    inner: DashMap<CacheKey, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Fetch an entry, evicting it first if it has expired.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let expired = match self.inner.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return Some(entry.value().clone()),
            None => return None,
        };

        if expired {
            debug!(target: "edgecache::cache", cache_key = %key, "Evicting expired entry");
            self.inner.remove(key);
        }
        None
    }

    pub fn insert(&self, key: CacheKey, entry: CacheEntry) {
        self.inner.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
