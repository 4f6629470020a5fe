use std::net::SocketAddr;

use crate::{EdgeConfig, OriginBaseUrl};

/// Validation output for a loaded edgecache configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when at least one error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the collected warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the collected error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate an edgecache configuration and return a report of issues.
pub fn validate(cfg: &EdgeConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_server(cfg, &mut report);
    validate_origin(cfg, &mut report);
    validate_cache(cfg, &mut report);

    report
}

fn validate_server(cfg: &EdgeConfig, report: &mut ConfigReport) {
    if cfg.server.listen.parse::<SocketAddr>().is_err() {
        report.error(format!(
            "server.listen '{}' is not a valid socket address",
            cfg.server.listen
        ));
    }

    if cfg.server.max_connections == 0 {
        report.error("server.max_connections is 0; no connection could ever be accepted");
    }
}

fn validate_origin(cfg: &EdgeConfig, report: &mut ConfigReport) {
    // An empty or malformed base URL would poison every cache key, so it is
    // rejected outright instead of producing degraded keys at request time.
    if let Err(reason) = OriginBaseUrl::parse(&cfg.origin.base_url) {
        report.error(format!("origin.base_url: {reason}"));
    }

    if cfg.origin.connect_timeout_secs == 0 {
        report.warn("origin.connect_timeout_secs is 0; origin connects will time out immediately");
    }

    if cfg.origin.read_timeout_secs == 0 {
        report.warn("origin.read_timeout_secs is 0; origin reads will time out immediately");
    }

    if cfg.origin.max_response_bytes == 0 {
        report.warn("origin.max_response_bytes is 0; every origin fetch will be rejected as too large");
    }
}

fn validate_cache(cfg: &EdgeConfig, report: &mut ConfigReport) {
    if cfg.cache.default_ttl_secs == 0 {
        report.warn("cache.default_ttl_secs is 0; cache entries will not be stored");
    }

    if cfg.cache.max_object_bytes == 0 {
        report.warn("cache.max_object_bytes is 0; cache is effectively disabled");
    }
}
