use std::time::{Duration, Instant};

use edgecache_http::HttpResponse;

/// A cached response plus its expiration bookkeeping.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    response: HttpResponse,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    pub fn new(response: HttpResponse, ttl: Duration) -> Self {
        Self {
            response,
            created_at: Instant::now(),
            ttl,
        }
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}
