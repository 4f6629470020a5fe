//! Origin base-URL parsing.
//!
//! The base URL is the root every cache key and origin request path hangs
//! off. It is parsed once at startup so request handling never works with an
//! unvalidated string.

/// Parsed form of `origin.base_url`.
///
/// Trailing slashes are stripped so `http://host/pages/` and
/// `http://host/pages` derive identical cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginBaseUrl {
    raw: String,
    host: String,
    port: u16,
    path: String,
}

impl OriginBaseUrl {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim().trim_end_matches('/');

        if trimmed.is_empty() {
            return Err("origin base URL is empty".into());
        }

        let Some(rest) = trimmed.strip_prefix("http://") else {
            if trimmed.starts_with("https://") {
                return Err(format!(
                    "origin base URL '{trimmed}' uses https; TLS to the origin is not supported, use an http:// URL"
                ));
            }
            return Err(format!(
                "origin base URL '{trimmed}' must start with http://"
            ));
        };

        let (host_port, path) = match rest.split_once('/') {
            Some((host_port, tail)) => (host_port, format!("/{tail}")),
            None => (rest, String::new()),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("origin base URL has an invalid port '{port_str}'"))?;
                (host, port)
            }
            None => (host_port, 80),
        };

        if host.is_empty() {
            return Err(format!("origin base URL '{trimmed}' has an empty host"));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Normalized base URL string; the prefix of every cache key.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// "host:port" form used to open the TCP connection.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the Host request header; the port is omitted when default.
    pub fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Absolute request path for a resource: `{base_path}/data/{resource}`.
    pub fn resource_path(&self, resource: &str) -> String {
        format!("{}/data/{resource}", self.path)
    }
}
