//! Configuration model for the edgecache daemon.
//!
//! Sections mirror edgecache.conf: `[server]`, `[http]`, `[origin]` and
//! `[cache]`. Every field has a default so a missing file still yields a
//! loadable configuration; validation decides whether that configuration is
//! actually runnable.

mod base_url;
mod cache;
mod edge;
mod http;
mod origin;
mod server;
pub mod validation;

pub use base_url::OriginBaseUrl;
pub use cache::CacheConfig;
pub use edge::EdgeConfig;
pub use http::HttpConfig;
pub use origin::OriginConfig;
pub use server::ServerConfig;
pub use validation::ConfigReport;
