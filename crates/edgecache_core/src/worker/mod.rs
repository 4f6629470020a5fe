//! Per-connection HTTP/1 worker.
//!
//! Reads client requests in a keep-alive loop, hands each one to the edge
//! handler and writes the encoded response back.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use edgecache_config::EdgeConfig;
use edgecache_http::responses::send_response;
use edgecache_origin::OriginFetch;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, instrument};

use crate::handler::EdgeHandler;

mod request;
mod timeouts;

use request::read_http_request;

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Entry point for a "logical worker" that handles a single connection.
#[instrument(
    skip(stream, handler, cfg),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection<O: OriginFetch>(
    mut stream: Box<dyn ClientStream>,
    client_addr: SocketAddr,
    handler: Arc<EdgeHandler<O>>,
    cfg: Arc<EdgeConfig>,
) -> anyhow::Result<()> {
    info!(target: "edgecache::worker", "Handling new client connection");

    let mut buf = BytesMut::new();
    let mut first_request = true;

    loop {
        let idle_timeout = if first_request {
            cfg.http.client_read_timeout()
        } else {
            cfg.http.keepalive_timeout()
        };

        // 1) Read one HTTP request head
        let req = match read_http_request(&mut stream, &mut buf, &cfg.http, idle_timeout).await? {
            Some(req) => req,
            None => break,
        };

        debug!(
            target: "edgecache::worker",
            method = %req.method,
            target_uri = %req.target,
            "Parsed HTTP request line"
        );

        // Requests carrying a body are answered but not resynced; closing is
        // simpler than draining for a GET-only service.
        let close_after = req.close_after || req.content_length > 0 || req.is_chunked;

        // Drop the header block; leftovers are the next pipelined request.
        if req.body_start > 0 {
            buf.advance(req.body_start.min(buf.len()));
        }

        // 2) Handle and respond
        let response = handler.handle(&req.method, &req.target).await;
        let keep_alive = !close_after;
        send_response(&mut stream, &response, keep_alive).await?;

        info!(
            target: "edgecache::worker",
            client = %client_addr,
            method = %req.method,
            target_uri = %req.target,
            status = %response.status,
            "Request served"
        );

        if close_after {
            break;
        }

        first_request = false;
    }

    info!(
        target: "edgecache::worker",
        client = %client_addr,
        "Finished handling connection"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use edgecache_cache::{CacheKey, CacheManager};
    use edgecache_config::{EdgeConfig, OriginBaseUrl};
    use edgecache_http::HttpResponse;
    use edgecache_origin::OriginFetch;
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::handle_connection;
    use crate::handler::EdgeHandler;

    struct FakeOrigin {
        responses: HashMap<String, HttpResponse>,
    }

    impl OriginFetch for FakeOrigin {
        async fn fetch(&self, path: &str) -> anyhow::Result<HttpResponse> {
            match self.responses.get(path) {
                Some(response) => Ok(response.clone()),
                None => Err(anyhow::anyhow!("connection refused")),
            }
        }
    }

    fn client_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().expect("expected addr")
    }

    fn handler_with_cached_report() -> Arc<EdgeHandler<FakeOrigin>> {
        let base = OriginBaseUrl::parse("http://origin.test/pages").expect("expected base url");
        let cache = Arc::new(CacheManager::new(Duration::from_secs(60), 1_048_576));
        cache.store(
            CacheKey::for_resource("http://origin.test/pages", "report.csv"),
            &HttpResponse::text(StatusCode::OK, "a,b\n1,2"),
        );
        Arc::new(EdgeHandler::new(
            base,
            cache,
            FakeOrigin {
                responses: HashMap::new(),
            },
        ))
    }

    #[tokio::test]
    async fn serves_one_request_and_closes() {
        let (mut client, server) = tokio::io::duplex(16 * 1024);
        let handler = handler_with_cached_report();
        let cfg = Arc::new(EdgeConfig::default());

        let worker = tokio::spawn(async move {
            handle_connection(Box::new(server), client_addr(), handler, cfg).await
        });

        client
            .write_all(b"GET /data/report.csv HTTP/1.1\r\nHost: edge\r\nConnection: close\r\n\r\n")
            .await
            .expect("write request");

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.expect("read response");
        let response = String::from_utf8_lossy(&response);

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Connection: close"));
        assert!(response.ends_with("a,b\n1,2"));

        worker
            .await
            .expect("worker task")
            .expect("expected clean shutdown");
    }

    #[tokio::test]
    async fn keep_alive_serves_sequential_requests() {
        let (mut client, server) = tokio::io::duplex(16 * 1024);
        let handler = handler_with_cached_report();
        let cfg = Arc::new(EdgeConfig::default());

        let worker = tokio::spawn(async move {
            handle_connection(Box::new(server), client_addr(), handler, cfg).await
        });

        client
            .write_all(b"GET /data/report.csv HTTP/1.1\r\nHost: edge\r\n\r\n")
            .await
            .expect("write first request");

        let mut chunk = vec![0u8; 4096];
        let n = client.read(&mut chunk).await.expect("read first response");
        let first = String::from_utf8_lossy(&chunk[..n]).to_string();
        assert!(first.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(first.contains("Connection: keep-alive"));

        client
            .write_all(b"GET /data/report.csv HTTP/1.1\r\nHost: edge\r\nConnection: close\r\n\r\n")
            .await
            .expect("write second request");

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.expect("read second response");
        let second = String::from_utf8_lossy(&rest);
        assert!(second.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(second.contains("Connection: close"));

        worker
            .await
            .expect("worker task")
            .expect("expected clean shutdown");
    }
}
