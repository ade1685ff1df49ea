//! HTTPS front end for the Green messaging API.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 GREEN PROXY                   │
//!                      │                                               │
//!   Client Request     │  ┌──────────┐   ┌─────────────────────────┐  │
//!   ───────────────────┼─▶│   http   │──▶│   middleware conveyor    │  │
//!                      │  │ listener │   │ id → ip → recover →      │  │
//!                      │  └──────────┘   │ decrypt → hash → gzip →  │  │
//!                      │                 │ logging → handler        │  │
//!   Client Response    │                 └─────────────────────────┘  │
//!   ◀──────────────────┼── gzip stream ◀── metadata capture ◀─────────┤
//!                      │                                               │
//!                      │  ┌────────────────────────────────────────┐  │
//!                      │  │          Cross-Cutting Concerns         │  │
//!                      │  │  config   lifecycle   tracing   errors  │  │
//!                      │  └────────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod middleware;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;

pub use config::ServerConfig;
pub use error::ServerError;
pub use http::HttpServer;
pub use lifecycle::{Server, Shutdown};
