//! Body integrity placeholders.
//!
//! Both middlewares currently pass the request through unchanged; they exist
//! so the chain has a stable slot for body verification and decryption once
//! clients start sending signed or encrypted payloads.

use axum::extract::Request;
use axum::http::header::HeaderName;
use axum::http::Method;
use tower::service_fn;
use tower::util::BoxCloneSyncService;

use super::{call, Handler, Middleware};

pub static HASH_SHA256: HeaderName = HeaderName::from_static("hashsha256");

/// Checks for the `HashSHA256` header on mutating requests.
pub struct HashMiddleware {
    secret: String,
}

impl HashMiddleware {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl Middleware for HashMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let secret = self.secret.clone();

        BoxCloneSyncService::new(service_fn(move |req: Request| {
            let next = next.clone();
            let secret = secret.clone();
            async move {
                if req.method() != Method::GET && req.headers().contains_key(&HASH_SHA256) {
                    // TODO: verify the body against HashSHA256 using the
                    // configured secret before forwarding.
                    let _ = &secret;
                    tracing::debug!("body hash header present, verification not implemented");
                }

                Ok(call(next, req).await)
            }
        }))
    }
}

/// Placeholder for asymmetric body decryption on mutating requests.
pub struct DecryptMiddleware;

impl Middleware for DecryptMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        BoxCloneSyncService::new(service_fn(move |req: Request| {
            let next = next.clone();
            async move { Ok(call(next, req).await) }
        }))
    }
}
