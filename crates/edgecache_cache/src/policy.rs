use std::time::Duration;

use edgecache_http::HttpResponse;
use tracing::debug;

/// Rules deciding whether a response may enter the cache.
pub struct CachePolicy;

impl CachePolicy {
    /// A response is storable when it is a success, fits the configured
    /// object size cap and a positive TTL is in effect. Failure responses
    /// must never be replayed from cache.
    pub fn should_store(response: &HttpResponse, max_object_bytes: u64, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }

        if !response.status.is_success() {
            debug!(
                target: "edgecache::cache",
                status = %response.status,
                "Not caching non-success response"
            );
            return false;
        }

        if max_object_bytes > 0 && response.body.len() as u64 > max_object_bytes {
            debug!(
                target: "edgecache::cache",
                body_len = response.body.len(),
                max_object_bytes,
                "Not caching oversized response"
            );
            return false;
        }

        true
    }
}
