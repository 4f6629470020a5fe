//! Origin HTTP client.
//!
//! Fetches resources the cache does not hold. Every fetch opens a fresh
//! connection with `Connection: close`, writes one GET and reads the
//! response to EOF under a size cap, so no connection state survives
//! between misses.

use std::future::Future;
use std::time::Duration;

use edgecache_config::{OriginBaseUrl, OriginConfig};
use edgecache_http::HttpResponse;
use http::{HeaderValue, header};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

mod request;
mod response;

use request::build_request;
use response::{parse_origin_response, read_origin_response};

/// Seam between the handler and the network: production code uses
/// [`HttpOrigin`], tests substitute a fake.
pub trait OriginFetch: Send + Sync {
    /// Fetch an absolute request path (e.g. `/pages/data/report.csv`) from
    /// the origin.
    fn fetch(&self, path: &str) -> impl Future<Output = anyhow::Result<HttpResponse>> + Send;
}

/// HTTP/1.1 client bound to the configured origin base URL.
pub struct HttpOrigin {
    base: OriginBaseUrl,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_response_bytes: usize,
}

impl HttpOrigin {
    pub fn new(base: OriginBaseUrl, cfg: &OriginConfig) -> Self {
        Self {
            base,
            connect_timeout: cfg.connect_timeout(),
            read_timeout: cfg.read_timeout(),
            max_response_bytes: cfg.max_response_bytes() as usize,
        }
    }
}

impl OriginFetch for HttpOrigin {
    async fn fetch(&self, path: &str) -> anyhow::Result<HttpResponse> {
        let authority = self.base.authority();
        debug!(
            target: "edgecache::origin",
            origin = %authority,
            %path,
            "Fetching resource from origin"
        );

        let mut stream = connect_with_timeout(&authority, self.connect_timeout).await?;

        let request = build_request(path, &self.base.host_header());
        match timeout(self.read_timeout, stream.write_all(&request)).await {
            Ok(res) => res?,
            Err(_) => anyhow::bail!("Origin write timeout to {}", authority),
        }

        let bytes =
            read_origin_response(&mut stream, self.read_timeout, self.max_response_bytes).await?;
        let mut response = parse_origin_response(&bytes)?;
        ensure_content_type(&mut response, path);

        debug!(
            target: "edgecache::origin",
            origin = %authority,
            %path,
            status = %response.status,
            body_len = response.body.len(),
            "Origin response parsed"
        );

        Ok(response)
    }
}

async fn connect_with_timeout(addr: &str, timeout_dur: Duration) -> anyhow::Result<TcpStream> {
    match timeout(timeout_dur, TcpStream::connect(addr)).await {
        Ok(res) => Ok(res?),
        Err(_) => anyhow::bail!("Origin connect timeout to {}", addr),
    }
}

/// Origins serving bare data files sometimes omit Content-Type; fall back to
/// a guess from the resource extension.
fn ensure_content_type(response: &mut HttpResponse, path: &str) {
    if response.headers.contains_key(header::CONTENT_TYPE) {
        return;
    }

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers.insert(header::CONTENT_TYPE, value);
    }
}

#[cfg(test)]
mod tests {
    use edgecache_config::{OriginBaseUrl, OriginConfig};
    use http::{StatusCode, header};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::{HttpOrigin, OriginFetch};

    async fn origin_for(listener: &TcpListener) -> HttpOrigin {
        let addr = listener.local_addr().expect("expected local addr");
        let base =
            OriginBaseUrl::parse(&format!("http://{addr}/pages")).expect("expected base url");
        HttpOrigin::new(base, &OriginConfig::default())
    }

    #[tokio::test]
    async fn fetch_roundtrip_against_local_origin() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let origin = origin_for(&listener).await;

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            let mut tmp = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut tmp).await.expect("read request");
                assert!(n > 0, "client closed before finishing the request");
                buf.extend_from_slice(&tmp[..n]);
            }
            let request = String::from_utf8_lossy(&buf).to_string();

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: 7\r\n\r\na,b\n1,2",
                )
                .await
                .expect("write response");
            drop(socket);
            request
        });

        let response = origin
            .fetch("/pages/data/report.csv")
            .await
            .expect("expected fetch to succeed");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, b"a,b\n1,2");
        assert_eq!(
            response.headers.get(header::CONTENT_TYPE),
            Some(&http::HeaderValue::from_static("text/csv"))
        );

        let request = server.await.expect("server task");
        assert!(request.starts_with("GET /pages/data/report.csv HTTP/1.1\r\n"));
        assert!(request.contains("Connection: close\r\n"));
    }

    #[tokio::test]
    async fn fetch_maps_refused_connection_to_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let origin = origin_for(&listener).await;
        drop(listener);

        let result = origin.fetch("/pages/data/report.csv").await;
        assert!(result.is_err());
    }
}
