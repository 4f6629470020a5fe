use serde::Deserialize;

use crate::validation::{ConfigReport, validate};
use crate::{CacheConfig, HttpConfig, OriginConfig, ServerConfig};

// =======================================================
// EDGE CONFIG - main config
// =======================================================
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub origin: OriginConfig,
    pub cache: CacheConfig,
}

impl EdgeConfig {
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    pub fn origin(&self) -> &OriginConfig {
        &self.origin
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Load the configuration from an INI file, then apply environment
    /// overrides with the `EDGECACHE` prefix (`EDGECACHE_ORIGIN__BASE_URL`
    /// overrides `origin.base_url`). A missing file is not an error; defaults
    /// apply.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .add_source(config::Environment::with_prefix("EDGECACHE").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::EdgeConfig;

    fn from_ini(contents: &str) -> EdgeConfig {
        let built = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Ini))
            .build()
            .expect("expected ini to load");
        built.try_deserialize().expect("expected ini to deserialize")
    }

    #[test]
    fn defaults_are_complete() {
        let cfg = EdgeConfig::default();
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
        assert_eq!(cfg.server.max_connections, 1024);
        assert_eq!(cfg.http.keepalive_timeout_secs, 65);
        assert_eq!(cfg.http.max_request_headers_bytes, 64 * 1024);
        assert_eq!(cfg.origin.base_url, "");
        assert_eq!(cfg.origin.connect_timeout_secs, 5);
        assert_eq!(cfg.cache.default_ttl_secs, 300);
        assert_eq!(cfg.cache.max_object_bytes, 1_048_576);
    }

    #[test]
    fn ini_sections_override_defaults() {
        let cfg = from_ini(
            "[server]\n\
             listen = 127.0.0.1:9999\n\
             max_connections = 16\n\
             \n\
             [origin]\n\
             base_url = http://origin.test/pages\n\
             read_timeout_secs = 3\n\
             \n\
             [cache]\n\
             default_ttl_secs = 60\n",
        );

        assert_eq!(cfg.server.listen, "127.0.0.1:9999");
        assert_eq!(cfg.server.max_connections, 16);
        assert_eq!(cfg.origin.base_url, "http://origin.test/pages");
        assert_eq!(cfg.origin.read_timeout_secs, 3);
        assert_eq!(cfg.cache.default_ttl_secs, 60);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.http.client_read_timeout_secs, 15);
        assert_eq!(cfg.cache.max_object_bytes, 1_048_576);
    }
}
