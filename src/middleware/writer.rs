//! Response metadata capture.

use axum::http::StatusCode;
use bytes::Bytes;

/// Per-request record of what the handler wrote.
///
/// Owned by the logging middleware for exactly one request; the size is
/// accumulated as body frames are forwarded, so it reflects handler output
/// before any compression applied further out in the chain.
#[derive(Debug, Default, Clone)]
pub struct ResponseMetadata {
    /// Request URI as received.
    pub request_uri: String,

    /// Request body, captured before the handler consumed it.
    pub body: Bytes,

    /// Response status code; 0 until the first status is recorded.
    pub status: u16,

    /// Cumulative bytes written by the handler.
    pub size: usize,
}

impl ResponseMetadata {
    pub fn new(request_uri: String, body: Bytes) -> Self {
        Self {
            request_uri,
            body,
            status: 0,
            size: 0,
        }
    }

    /// Record the response status. Forwarding is the caller's concern; this
    /// only observes.
    pub fn record_status(&mut self, status: StatusCode) {
        self.status = status.as_u16();
    }

    /// Record one forwarded write of `n` bytes.
    pub fn record_write(&mut self, n: usize) {
        self.size += n;
    }
}
