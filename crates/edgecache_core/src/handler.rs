//! The edge cache request handler.
//!
//! One stateless invocation per request: derive the canonical origin URL,
//! consult the shared cache, and on a miss fetch from the origin and store
//! the result (write-through) before answering. Concurrent misses for the
//! same key may each fetch independently; the last store wins.

use std::sync::Arc;

use edgecache_cache::{CacheKey, CacheManager};
use edgecache_config::OriginBaseUrl;
use edgecache_http::HttpResponse;
use edgecache_origin::OriginFetch;
use tracing::{debug, error, warn};

use crate::resource::resource_identifier;

pub struct EdgeHandler<O> {
    base: OriginBaseUrl,
    cache: Arc<CacheManager>,
    origin: O,
}

impl<O: OriginFetch> EdgeHandler<O> {
    /// The base URL and collaborators are injected once at construction;
    /// nothing is read from the environment per request.
    pub fn new(base: OriginBaseUrl, cache: Arc<CacheManager>, origin: O) -> Self {
        Self {
            base,
            cache,
            origin,
        }
    }

    pub async fn handle(&self, method: &str, target: &str) -> HttpResponse {
        if method != "GET" {
            warn!(
                target: "edgecache::handler",
                %method,
                "Unsupported method; returning 405"
            );
            return HttpResponse::method_not_allowed("GET");
        }

        let Some(resource) = resource_identifier(target) else {
            debug!(
                target: "edgecache::handler",
                %target,
                "No resource identifier in request; returning 404"
            );
            return HttpResponse::not_found();
        };

        let key = CacheKey::for_resource(self.base.as_str(), resource);

        if let Some(response) = self.cache.lookup(&key) {
            debug!(target: "edgecache::handler", cache_key = %key, "Cache hit");
            return response;
        }

        debug!(target: "edgecache::handler", cache_key = %key, "Cache miss");

        let path = self.base.resource_path(resource);
        match self.origin.fetch(&path).await {
            Ok(response) => {
                self.cache.store(key, &response);
                response
            }
            Err(e) => {
                error!(
                    target: "edgecache::handler",
                    cache_key = %key,
                    error = ?e,
                    "Origin fetch failed; returning 502"
                );
                HttpResponse::bad_gateway()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use edgecache_cache::{CacheKey, CacheManager};
    use edgecache_config::OriginBaseUrl;
    use edgecache_http::HttpResponse;
    use edgecache_origin::OriginFetch;
    use http::{StatusCode, header};

    use super::EdgeHandler;

    struct FakeOrigin {
        responses: HashMap<String, HttpResponse>,
        calls: AtomicUsize,
    }

    impl FakeOrigin {
        fn new(responses: HashMap<String, HttpResponse>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self::new(HashMap::new())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OriginFetch for &FakeOrigin {
        async fn fetch(&self, path: &str) -> anyhow::Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(path) {
                Some(response) => Ok(response.clone()),
                None => Err(anyhow::anyhow!("connection refused")),
            }
        }
    }

    fn base() -> OriginBaseUrl {
        OriginBaseUrl::parse("http://origin.test/pages").expect("expected base url")
    }

    fn cache() -> Arc<CacheManager> {
        Arc::new(CacheManager::new(Duration::from_secs(60), 1_048_576))
    }

    fn csv_response() -> HttpResponse {
        HttpResponse::text(StatusCode::OK, "a,b\n1,2")
    }

    fn handler<'a>(
        cache: Arc<CacheManager>,
        origin: &'a FakeOrigin,
    ) -> EdgeHandler<&'a FakeOrigin> {
        EdgeHandler::new(base(), cache, origin)
    }

    #[tokio::test]
    async fn prepopulated_key_is_served_from_cache() {
        let cache = cache();
        cache.store(
            CacheKey::for_resource("http://origin.test/pages", "report.csv"),
            &csv_response(),
        );
        let origin = FakeOrigin::empty();
        let handler = handler(cache, &origin);

        let response = handler.handle("GET", "/data/report.csv").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, b"a,b\n1,2");
        assert_eq!(origin.calls(), 0);
    }

    #[tokio::test]
    async fn file_parameter_reaches_the_same_key_as_the_path() {
        let cache = cache();
        cache.store(
            CacheKey::for_resource("http://origin.test/pages", "report.csv"),
            &csv_response(),
        );
        let origin = FakeOrigin::empty();
        let handler = handler(cache, &origin);

        let response = handler.handle("GET", "/anything?file=report.csv").await;

        assert_eq!(response.body, b"a,b\n1,2");
        assert_eq!(origin.calls(), 0);
    }

    #[tokio::test]
    async fn miss_fetches_stores_and_returns() {
        let cache = cache();
        let origin = FakeOrigin::new(HashMap::from([(
            "/pages/data/report.csv".to_string(),
            csv_response(),
        )]));
        let handler = handler(cache, &origin);

        let first = handler.handle("GET", "/data/report.csv").await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body, b"a,b\n1,2");
        assert_eq!(origin.calls(), 1);

        // The write-through population makes the second request a hit.
        let second = handler.handle("GET", "/data/report.csv").await;
        assert_eq!(origin.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn origin_error_statuses_propagate_and_are_not_cached() {
        let cache = cache();
        let origin = FakeOrigin::new(HashMap::from([(
            "/pages/data/missing.csv".to_string(),
            HttpResponse::text(StatusCode::NOT_FOUND, "no such file\n"),
        )]));
        let handler = handler(cache, &origin);

        let first = handler.handle("GET", "/data/missing.csv").await;
        assert_eq!(first.status, StatusCode::NOT_FOUND);

        let second = handler.handle("GET", "/data/missing.csv").await;
        assert_eq!(second.status, StatusCode::NOT_FOUND);
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn origin_transport_failure_is_a_502() {
        let origin = FakeOrigin::empty();
        let handler = handler(cache(), &origin);

        let response = handler.handle("GET", "/data/report.csv").await;

        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test]
    async fn non_get_methods_are_rejected() {
        let origin = FakeOrigin::empty();
        let handler = handler(cache(), &origin);

        let response = handler.handle("POST", "/data/report.csv").await;

        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers.get(header::ALLOW),
            Some(&http::HeaderValue::from_static("GET"))
        );
        assert_eq!(origin.calls(), 0);
    }

    #[tokio::test]
    async fn paths_outside_data_are_not_served() {
        let origin = FakeOrigin::empty();
        let handler = handler(cache(), &origin);

        let response = handler.handle("GET", "/anything").await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(origin.calls(), 0);
    }
}
