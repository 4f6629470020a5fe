//! Async helpers for writing responses to a client stream.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::HttpResponse;

/// Encode and write a full response.
pub async fn send_response<S>(
    stream: &mut S,
    response: &HttpResponse,
    keep_alive: bool,
) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    let bytes = response.encode(keep_alive);
    stream.write_all(&bytes).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn send_400<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_response(stream, &HttpResponse::bad_request(), false).await
}

pub async fn send_408<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_response(stream, &HttpResponse::request_timeout(), false).await
}

pub async fn send_431<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_response(stream, &HttpResponse::headers_too_large(), false).await
}

pub async fn send_500<S>(stream: &mut S) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin + ?Sized,
{
    send_response(stream, &HttpResponse::internal_error(), false).await
}
