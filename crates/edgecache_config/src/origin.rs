use std::time::Duration;

use serde::Deserialize;

// =======================================================
// ORIGIN CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin, e.g. "http://127.0.0.1:9000/pages".
    /// Cache keys and origin request paths are derived from it, so it is
    /// required; an empty value fails validation.
    pub base_url: String,

    // Timeouts (seconds)
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,

    // Limits (bytes)
    pub max_response_bytes: u64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

impl OriginConfig {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn max_response_bytes(&self) -> u64 {
        self.max_response_bytes
    }
}
