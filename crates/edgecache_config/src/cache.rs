use std::time::Duration;

use serde::Deserialize;

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL in seconds for cached responses. 0 disables storing.
    pub default_ttl_secs: u64,
    /// Maximum body size in bytes for a cached response. Larger responses
    /// are served but not stored.
    pub max_object_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            max_object_bytes: 1_048_576,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn max_object_bytes(&self) -> u64 {
        self.max_object_bytes
    }
}
