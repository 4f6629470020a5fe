use std::time::Duration;

use serde::Deserialize;

// =======================================================
// HTTP CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    // Timeouts (seconds)
    pub keepalive_timeout_secs: u64,
    pub client_read_timeout_secs: u64,

    // Limits (bytes)
    pub max_request_headers_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            keepalive_timeout_secs: 65,
            client_read_timeout_secs: 15,
            max_request_headers_bytes: 64 * 1024,
        }
    }
}

impl HttpConfig {
    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_secs)
    }

    pub fn client_read_timeout(&self) -> Duration {
        Duration::from_secs(self.client_read_timeout_secs)
    }

    pub fn max_request_headers_bytes(&self) -> u64 {
        self.max_request_headers_bytes
    }
}
