//! Base infrastructure middleware: request identity, client address, panic
//! recovery. These sit outermost in the chain.

use std::panic::AssertUnwindSafe;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;
use futures_util::FutureExt;
use tower::service_fn;
use tower::util::BoxCloneSyncService;
use uuid::Uuid;

use super::{call, Handler, Middleware};

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Ensures every request carries an `x-request-id`, echoed on the response.
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        BoxCloneSyncService::new(service_fn(move |mut req: Request| {
            let next = next.clone();
            async move {
                let id = match req.headers().get(&X_REQUEST_ID) {
                    Some(id) => id.clone(),
                    None => {
                        let generated = Uuid::new_v4().to_string();
                        let value = HeaderValue::from_str(&generated)
                            .unwrap_or_else(|_| HeaderValue::from_static(""));
                        req.headers_mut().insert(&X_REQUEST_ID, value.clone());
                        value
                    }
                };

                let mut response = call(next, req).await;
                response.headers_mut().insert(&X_REQUEST_ID, id);
                Ok(response)
            }
        }))
    }
}

/// Client address taken from proxy headers, available to handlers as a
/// request extension.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/// Records the originating client address from `X-Forwarded-For` or
/// `X-Real-IP` when an upstream proxy supplied one.
pub struct RealIpMiddleware;

impl Middleware for RealIpMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        BoxCloneSyncService::new(service_fn(move |mut req: Request| {
            let next = next.clone();
            async move {
                let forwarded = req
                    .headers()
                    .get(&X_FORWARDED_FOR)
                    .or_else(|| req.headers().get(&X_REAL_IP))
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.split(',').next())
                    .map(|value| value.trim().to_string());

                if let Some(ip) = forwarded {
                    req.extensions_mut().insert(ClientIp(ip));
                }

                Ok(call(next, req).await)
            }
        }))
    }
}

/// Converts handler panics into a 500 response instead of tearing down the
/// connection task.
pub struct RecoverMiddleware;

impl Middleware for RecoverMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        BoxCloneSyncService::new(service_fn(move |req: Request| {
            let next = next.clone();
            async move {
                match AssertUnwindSafe(call(next, req)).catch_unwind().await {
                    Ok(response) => Ok(response),
                    Err(panic) => {
                        let message = panic
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                            .unwrap_or("unknown panic");

                        tracing::error!(panic = %message, "handler panicked");

                        let mut response =
                            Response::new(Body::from("500 internal server error"));
                        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                        response.headers_mut().insert(
                            CONTENT_TYPE,
                            HeaderValue::from_static("text/plain; charset=utf-8"),
                        );
                        Ok(response)
                    }
                }
            }
        }))
    }
}
