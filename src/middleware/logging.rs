//! Request logging and response metadata capture.
//!
//! The log record is only emitted for responses that ended in a server
//! error; everything else passes through silently.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{
    HeaderMap, HeaderName, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST,
    USER_AGENT,
};
use axum::http::{request::Parts, HeaderValue, Method, StatusCode, Uri, Version};
use axum::response::Response;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tower::service_fn;
use tower::util::BoxCloneSyncService;

use crate::error::ServerError;

use super::writer::ResponseMetadata;
use super::{call, Handler, Middleware};

/// Innermost middleware: wraps the business handler directly, so the captured
/// byte counts are what the handler wrote, before compression.
pub struct LoggingMiddleware {
    /// Upper bound for the eager request body read.
    body_limit: usize,
}

impl LoggingMiddleware {
    pub fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }
}

impl Middleware for LoggingMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let body_limit = self.body_limit;

        BoxCloneSyncService::new(service_fn(move |req: Request| {
            let next = next.clone();
            async move { Ok(handle(next, req, body_limit).await) }
        }))
    }
}

async fn handle(next: Handler, req: Request, body_limit: usize) -> Response {
    let (parts, body) = req.into_parts();

    // The original body is fully consumed here; the inner chain gets a fresh
    // readable copy below.
    let body_bytes = match axum::body::to_bytes(body, body_limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, "failed to read request body");
            return read_failure_response(&err);
        }
    };

    let dump = RequestDump::capture(&parts);
    let mut meta = ResponseMetadata::new(parts.uri.to_string(), body_bytes.clone());

    let start = Instant::now();

    let req = Request::from_parts(parts, Body::from(body_bytes));
    let response = call(next, req).await;

    meta.record_status(response.status());

    let (parts, body) = response.into_parts();
    let body = Body::new(CapturedBody {
        inner: body,
        meta,
        dump,
        start,
        emitted: false,
    });

    Response::from_parts(parts, body)
}

fn read_failure_response(err: &axum::Error) -> Response {
    let mut response = Response::new(Body::from(err.to_string()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Forwarding body that counts handler output as it streams past.
///
/// Frames and errors pass through untouched; only the data frame sizes are
/// recorded. The diagnostic record is emitted exactly once, at end of stream
/// or, if the client goes away first, on drop.
struct CapturedBody {
    inner: Body,
    meta: ResponseMetadata,
    dump: RequestDump,
    start: Instant,
    emitted: bool,
}

impl CapturedBody {
    fn emit_record(&mut self) {
        if self.emitted {
            return;
        }
        self.emitted = true;

        if let Err(err) = self.dump.emit(&self.meta, self.start) {
            tracing::error!(error = %err, "failed to dump request");
        }
    }
}

impl HttpBody for CapturedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.meta.record_write(data.len());
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.emit_record();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.emit_record();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CapturedBody {
    fn drop(&mut self) {
        // A dropped connection still ends the request.
        self.emit_record();
    }
}

/// Raw request context captured before the inner chain runs, kept around for
/// the diagnostic record.
struct RequestDump {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
}

impl RequestDump {
    fn capture(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }

    /// Emit one structured record for a request that ended in a server error.
    /// Failure here is diagnostic only and never reaches the client.
    fn emit(&self, meta: &ResponseMetadata, start: Instant) -> Result<(), ServerError> {
        if meta.status != StatusCode::INTERNAL_SERVER_ERROR.as_u16() {
            return Ok(());
        }

        let request_line = format!("{} {} {:?}", self.method, self.uri, self.version);

        let host = self.header_str(&HOST)?;
        let content_type = self.header_str(&CONTENT_TYPE)?;
        let accept_encoding = self.header_str(&ACCEPT_ENCODING)?;
        let content_encoding = self.header_str(&CONTENT_ENCODING)?;
        let content_length = self.header_str(&CONTENT_LENGTH)?;
        let user_agent = self.header_str(&USER_AGENT)?;

        tracing::info!(
            url = %meta.request_uri,
            host = %host,
            content_type = %content_type,
            accept_encoding = %accept_encoding,
            content_encoding = %content_encoding,
            content_length = %content_length,
            user_agent = %user_agent,
            duration = ?start.elapsed(),
            status = meta.status,
            size = meta.size,
            body = %String::from_utf8_lossy(&meta.body),
            "{}",
            request_line,
        );

        Ok(())
    }

    fn header_str(&self, name: &HeaderName) -> Result<&str, ServerError> {
        match self.headers.get(name) {
            Some(value) => value
                .to_str()
                .map_err(|_| ServerError::HeaderEncoding(name.to_string())),
            None => Ok(""),
        }
    }
}
