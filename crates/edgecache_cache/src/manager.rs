use std::time::Duration;

use edgecache_http::HttpResponse;
use tracing::debug;

use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::policy::CachePolicy;
use crate::store::MemoryCacheStore;

/// The shared cache as the handler sees it: `lookup` and `store` over the
/// concurrent entry store, with the storage policy applied on the way in.
#[derive(Debug)]
pub struct CacheManager {
    store: MemoryCacheStore,
    default_ttl: Duration,
    max_object_bytes: u64,
}

impl CacheManager {
    pub fn new(default_ttl: Duration, max_object_bytes: u64) -> Self {
        Self {
            store: MemoryCacheStore::new(),
            default_ttl,
            max_object_bytes,
        }
    }

    /// Fetch the stored response for a key, honoring expiration.
    pub fn lookup(&self, key: &CacheKey) -> Option<HttpResponse> {
        self.store.get(key).map(|entry| entry.response().clone())
    }

    /// Store a response under a key if the policy allows it. Returns whether
    /// the response was stored.
    pub fn store(&self, key: CacheKey, response: &HttpResponse) -> bool {
        if !CachePolicy::should_store(response, self.max_object_bytes, self.default_ttl) {
            return false;
        }

        debug!(
            target: "edgecache::cache",
            cache_key = %key,
            body_len = response.body.len(),
            ttl_secs = self.default_ttl.as_secs(),
            "Storing response"
        );
        self.store
            .insert(key, CacheEntry::new(response.clone(), self.default_ttl));
        true
    }
}
