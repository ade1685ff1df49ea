//! Request-processing pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request-id / real-ip / recovery (infra.rs)
//!     → body integrity placeholders (integrity.rs)
//!     → gzip request decode (gzip.rs)
//!     → request logging + response metadata capture (logging.rs, writer.rs)
//!     → business handler
//! outbound response
//!     ← gzip response encode (gzip.rs)
//!     ← captured status / size (writer.rs)
//! ```
//!
//! # Design Decisions
//! - Handlers and middleware share one interface: a middleware turns a
//!   `Handler` into another `Handler`
//! - The chain is built once at startup by [`conveyor`]; nothing is mutated
//!   per request
//! - Later entries in the conveyor list wrap earlier ones, so they see the
//!   request first and the response last

pub mod gzip;
pub mod infra;
pub mod integrity;
pub mod logging;
pub mod writer;

use std::convert::Infallible;

use axum::{body::Body, extract::Request, response::Response};
use tower::util::BoxCloneSyncService;
use tower::ServiceExt;

pub use gzip::GzipMiddleware;
pub use infra::{RealIpMiddleware, RecoverMiddleware, RequestIdMiddleware};
pub use integrity::{DecryptMiddleware, HashMiddleware};
pub use logging::LoggingMiddleware;
pub use writer::ResponseMetadata;

/// A request handler. Business routers and wrapped chains are the same type,
/// so middleware compose with anything that can serve a request.
pub type Handler = BoxCloneSyncService<Request<Body>, Response, Infallible>;

/// A cross-cutting behavior injected around a [`Handler`].
pub trait Middleware: Send + Sync {
    /// Wrap `next`, returning a handler that runs this middleware around it.
    fn wrap(&self, next: Handler) -> Handler;
}

/// Fold `handler` through `middlewares`, left to right.
///
/// Each middleware wraps the result of the previous fold step, so the last
/// entry in the list becomes the outermost wrapper. A missing handler yields
/// a missing handler, not an error; callers must check.
pub fn conveyor(handler: Option<Handler>, middlewares: &[Box<dyn Middleware>]) -> Option<Handler> {
    let mut handler = handler?;

    for middleware in middlewares {
        handler = middleware.wrap(handler);
    }

    Some(handler)
}

/// Dispatch `req` to `next`. The error type is uninhabited, so this cannot
/// fail; the match convinces the compiler of that.
pub(crate) async fn call(next: Handler, req: Request<Body>) -> Response {
    match next.oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
