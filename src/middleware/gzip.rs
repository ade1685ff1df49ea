//! Transparent gzip negotiation on both axes of an exchange.
//!
//! # Responsibilities
//! - Decode gzip request bodies before the inner chain runs
//! - Encode response bodies as a gzip stream when the client accepts it
//! - Reject malformed compressed bodies with 500 before any handler runs
//!
//! # Design Decisions
//! - Response encoding is streaming: body frames pass through the encoder as
//!   they are produced, the trailer is flushed at end-of-stream
//! - Request decoding is bounded by the configured body limit; the logging
//!   middleware reads the full body eagerly anyway
//! - A request that arrived gzip-compressed has the encoding mirrored back on
//!   the response headers

use std::io::{Read, Write};
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{
    HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
};
use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use http_body::{Body as HttpBody, Frame};
use tower::service_fn;
use tower::util::BoxCloneSyncService;

use super::{call, Handler, Middleware};

/// Middleware negotiating gzip compression from the request headers.
pub struct GzipMiddleware {
    /// Upper bound on a buffered compressed request body.
    body_limit: usize,
}

impl GzipMiddleware {
    pub fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }
}

impl Middleware for GzipMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let body_limit = self.body_limit;

        BoxCloneSyncService::new(service_fn(move |req: Request| {
            let next = next.clone();
            async move { Ok(handle(next, req, body_limit).await) }
        }))
    }
}

async fn handle(next: Handler, req: Request, body_limit: usize) -> Response {
    let accept_gzip = header_contains(req.headers(), &ACCEPT_ENCODING, "gzip");
    let content_gzip = header_contains(req.headers(), &CONTENT_ENCODING, "gzip");
    let request_content_type = req.headers().get(CONTENT_TYPE).cloned();

    let req = if content_gzip {
        match decode_request(req, body_limit).await {
            Ok(req) => req,
            Err(err) => {
                tracing::debug!(error = %err, "rejecting request with malformed gzip body");
                return malformed_body_response();
            }
        }
    } else {
        req
    };

    let mut response = call(next, req).await;

    if content_gzip {
        // Mirror the request encoding back to the client.
        let headers = response.headers_mut();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(""));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    }

    if accept_gzip {
        let (mut parts, body) = response.into_parts();

        parts.headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        parts.headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(""));
        parts.headers.remove(CONTENT_LENGTH);

        // Handlers that declared a content type keep it; otherwise the
        // request's declared type is forwarded unchanged.
        if !parts.headers.contains_key(CONTENT_TYPE) {
            if let Some(content_type) = request_content_type {
                parts.headers.insert(CONTENT_TYPE, content_type);
            }
        }

        response = Response::from_parts(parts, Body::new(GzipBody::new(body)));
    }

    response
}

fn header_contains(headers: &HeaderMap, name: &axum::http::HeaderName, token: &str) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains(token))
        .unwrap_or(false)
}

/// Replace the request body with its decompressed form. Fails on anything the
/// gzip decoder rejects, including a missing header.
async fn decode_request(req: Request, body_limit: usize) -> Result<Request, std::io::Error> {
    let (parts, body) = req.into_parts();

    let compressed = axum::body::to_bytes(body, body_limit)
        .await
        .map_err(std::io::Error::other)?;

    let mut decoder = GzDecoder::new(compressed.as_ref());
    let mut plain = Vec::new();
    decoder.read_to_end(&mut plain)?;

    Ok(Request::from_parts(parts, Body::from(plain)))
}

fn malformed_body_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CONTENT_ENCODING, HeaderValue::from_static(""));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    response
}

/// Streaming gzip encoder over a response body.
///
/// Data frames are fed through the encoder as the connection polls them;
/// whatever compressed output the encoder has buffered is emitted as the next
/// frame. The gzip trailer is written exactly once, when the inner body ends.
pub struct GzipBody {
    inner: Body,
    encoder: Option<GzEncoder<Vec<u8>>>,
    done: bool,
}

impl GzipBody {
    pub fn new(inner: Body) -> Self {
        Self {
            inner,
            encoder: Some(GzEncoder::new(Vec::new(), Compression::default())),
            done: false,
        }
    }
}

impl HttpBody for GzipBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        loop {
            match Pin::new(&mut this.inner).poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => match frame.into_data() {
                    Ok(chunk) => {
                        let Some(encoder) = this.encoder.as_mut() else {
                            this.done = true;
                            return Poll::Ready(None);
                        };

                        if let Err(err) = encoder.write_all(&chunk) {
                            this.done = true;
                            return Poll::Ready(Some(Err(axum::Error::new(err))));
                        }

                        let buffered = encoder.get_mut();
                        if !buffered.is_empty() {
                            let out = Bytes::from(mem::take(buffered));
                            return Poll::Ready(Some(Ok(Frame::data(out))));
                        }
                        // Everything stayed inside the encoder; keep pulling.
                    }
                    // Trailers pass through untouched.
                    Err(frame) => return Poll::Ready(Some(Ok(frame))),
                },
                Poll::Ready(Some(Err(err))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.done = true;

                    let Some(encoder) = this.encoder.take() else {
                        return Poll::Ready(None);
                    };

                    return match encoder.finish() {
                        Ok(buffered) if buffered.is_empty() => Poll::Ready(None),
                        Ok(buffered) => Poll::Ready(Some(Ok(Frame::data(Bytes::from(buffered))))),
                        Err(err) => {
                            tracing::error!(error = %err, "failed to finish gzip stream");
                            Poll::Ready(Some(Err(axum::Error::new(err))))
                        }
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
    }
}
