use std::time::Duration;

use anyhow::Context;
use edgecache_http::HttpResponse;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Read the origin's whole response (it closes the connection after one
/// exchange) under a total size cap.
pub(crate) async fn read_origin_response<S>(
    stream: &mut S,
    read_timeout: Duration,
    max_bytes: usize,
) -> anyhow::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];

    loop {
        let n = match timeout(read_timeout, stream.read(&mut tmp)).await {
            Ok(res) => res?,
            Err(_) => anyhow::bail!("Origin read timeout"),
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);

        if max_bytes > 0 && buf.len() > max_bytes {
            anyhow::bail!("Origin response too large ({} byte cap)", max_bytes);
        }
    }

    if buf.is_empty() {
        anyhow::bail!("Origin closed connection without sending a response");
    }

    Ok(buf)
}

/// Parse a complete HTTP/1.x response into status, end-to-end headers and a
/// decoded body. Hop-by-hop and framing headers are dropped; the body is
/// truncated to Content-Length or de-chunked as announced.
pub(crate) fn parse_origin_response(bytes: &[u8]) -> anyhow::Result<HttpResponse> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut resp = httparse::Response::new(&mut headers);
    let parsed = resp.parse(bytes).context("parse origin response")?;
    let header_len = match parsed {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => anyhow::bail!("incomplete origin response"),
    };

    let status = resp.code.unwrap_or(500);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut header_map = HeaderMap::new();
    let mut is_chunked = false;
    let mut content_length: Option<usize> = None;

    for header in resp.headers.iter() {
        let name = header.name;
        let value = header.value;
        let name_lower = name.to_ascii_lowercase();
        match name_lower.as_str() {
            "connection" | "proxy-connection" | "keep-alive" | "upgrade" => continue,
            "transfer-encoding" => {
                let val = String::from_utf8_lossy(value).to_ascii_lowercase();
                if val.split(',').any(|v| v.trim().trim_matches('"') == "chunked") {
                    is_chunked = true;
                }
                continue;
            }
            "content-length" => {
                if let Ok(s) = std::str::from_utf8(value) {
                    if let Ok(len) = s.trim().parse::<usize>() {
                        content_length = Some(len);
                    }
                }
                continue;
            }
            _ => {}
        }

        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_bytes(value),
        ) {
            header_map.append(name, value);
        }
    }

    let mut body = bytes[header_len..].to_vec();
    if is_chunked {
        body = decode_chunked(&body)?;
    } else if let Some(len) = content_length {
        if body.len() > len {
            body.truncate(len);
        }
    }

    Ok(HttpResponse::new(status, header_map, body))
}

fn decode_chunked(body: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut input = body;

    loop {
        let Some(line_end) = find_crlf(input) else {
            anyhow::bail!("invalid chunked encoding: missing size line");
        };
        let line = &input[..line_end];
        input = &input[line_end + 2..];

        let line_str = std::str::from_utf8(line)?;
        let size_str = line_str.split(';').next().unwrap_or("").trim();
        let size =
            usize::from_str_radix(size_str, 16).context("invalid chunk size in chunked body")?;

        if size == 0 {
            // Optional trailers follow; nothing in them matters here.
            break;
        }

        if input.len() < size + 2 {
            anyhow::bail!("invalid chunked encoding: chunk too short");
        }

        out.extend_from_slice(&input[..size]);
        input = &input[size + 2..];
    }

    Ok(out)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
