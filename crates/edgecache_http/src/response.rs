use std::time::SystemTime;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use httpdate::fmt_http_date;

/// Server header value attached to every encoded response.
pub const SERVER_NAME: &str = "edgecache/0.1.0";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// An owned HTTP response: status, end-to-end headers and body.
///
/// Framing and hop-by-hop headers never live in `headers`; they are computed
/// when the response is encoded for the wire. This is what the cache stores
/// and what the origin client returns, so hits replay the stored response
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain-text response helper for canned status answers.
    pub fn text(status: StatusCode, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(TEXT_PLAIN_UTF8),
        );
        Self::new(status, headers, body.as_bytes().to_vec())
    }

    pub fn bad_request() -> Self {
        Self::text(StatusCode::BAD_REQUEST, "400 Bad Request\n")
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "404 Not Found\n")
    }

    pub fn method_not_allowed(allow: &'static str) -> Self {
        let mut response =
            Self::text(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed\n");
        response
            .headers
            .insert(header::ALLOW, HeaderValue::from_static(allow));
        response
    }

    pub fn request_timeout() -> Self {
        Self::text(StatusCode::REQUEST_TIMEOUT, "408 Request Timeout\n")
    }

    pub fn headers_too_large() -> Self {
        Self::text(
            StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            "431 Request Header Fields Too Large\n",
        )
    }

    pub fn internal_error() -> Self {
        Self::text(
            StatusCode::INTERNAL_SERVER_ERROR,
            "500 Internal Server Error\n",
        )
    }

    pub fn bad_gateway() -> Self {
        Self::text(StatusCode::BAD_GATEWAY, "502 Bad Gateway\n")
    }

    /// Render the response into HTTP/1.1 wire bytes.
    ///
    /// Content-Length is always derived from the actual body and Connection
    /// from the caller's keep-alive decision; matching headers carried in
    /// `headers` are ignored rather than emitted twice.
    pub fn encode(&self, keep_alive: bool) -> Vec<u8> {
        let reason = self.status.canonical_reason().unwrap_or("");
        let mut out = Vec::with_capacity(self.body.len() + 256);

        out.extend_from_slice(
            format!("HTTP/1.1 {} {reason}\r\n", self.status.as_str()).as_bytes(),
        );
        out.extend_from_slice(format!("Server: {SERVER_NAME}\r\n").as_bytes());
        out.extend_from_slice(
            format!("Date: {}\r\n", fmt_http_date(SystemTime::now())).as_bytes(),
        );

        for (name, value) in &self.headers {
            if is_reserved_header(name) {
                continue;
            }
            out.extend_from_slice(name.as_str().as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        let connection = if keep_alive { "keep-alive" } else { "close" };
        out.extend_from_slice(format!("Connection: {connection}\r\n\r\n").as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Headers the encoder owns; stored copies are never emitted.
fn is_reserved_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "content-length"
            | "connection"
            | "keep-alive"
            | "proxy-connection"
            | "transfer-encoding"
            | "upgrade"
            | "date"
            | "server"
    )
}
