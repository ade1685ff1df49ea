//! Business handlers for the front end.

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;

/// Payload for `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Liveness check; always `{"status":"ok"}`.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

/// Demo page for driving the messaging API from a browser.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        "404 page not found",
    )
}
