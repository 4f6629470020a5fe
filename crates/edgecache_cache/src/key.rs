use std::fmt;

/// Canonical origin URL of a resource; the cache's lookup and storage key.
///
/// Construction is a pure function of the configured base URL and the
/// resource identifier, so population and lookup always agree:
/// `{base_url}/data/{resource}`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_resource(base_url: &str, resource: &str) -> Self {
        Self(format!("{base_url}/data/{resource}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
