//! Shared utilities for integration testing.

use std::io::{Read, Write};

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tower::util::BoxCloneSyncService;

use green_proxy::middleware::Handler;

#[allow(dead_code)]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[allow(dead_code)]
pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Routes resembling the real front end, plus an echo endpoint and a failing
/// endpoint for exercising the pipeline.
#[allow(dead_code)]
pub fn demo_router() -> Router {
    Router::new()
        .route(
            "/status",
            get(|| async { axum::Json(serde_json::json!({"status": "ok"})) }),
        )
        .route("/echo", post(|body: Bytes| async move { body }))
        .route(
            "/fail",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
}

#[allow(dead_code)]
pub fn handler(router: Router) -> Handler {
    BoxCloneSyncService::new(router)
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap()
}
