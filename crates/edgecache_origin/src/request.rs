use edgecache_http::SERVER_NAME;

/// Serialize the GET request sent to the origin.
pub(crate) fn build_request(path: &str, host: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    out.extend_from_slice(format!("GET {path} HTTP/1.1\r\n").as_bytes());
    out.extend_from_slice(format!("Host: {host}\r\n").as_bytes());
    out.extend_from_slice(format!("User-Agent: {SERVER_NAME}\r\n").as_bytes());
    out.extend_from_slice(b"Accept: */*\r\n");
    out.extend_from_slice(b"Connection: close\r\n");
    out.extend_from_slice(b"\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::build_request;

    #[test]
    fn build_request_writes_a_complete_get() {
        let bytes = build_request("/pages/data/report.csv", "origin.test:9000");
        let request = String::from_utf8(bytes).expect("expected utf-8");

        assert!(request.starts_with("GET /pages/data/report.csv HTTP/1.1\r\n"));
        assert!(request.contains("Host: origin.test:9000\r\n"));
        assert!(request.contains("User-Agent: edgecache/0.1.0\r\n"));
        assert!(request.contains("Connection: close\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }
}
