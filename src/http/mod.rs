//! HTTP front end subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (router setup, listener, graceful drain)
//!     → middleware chain (see crate::middleware)
//!     → handlers.rs (status, demo page)
//!     → response back through the chain
//! ```

pub mod handlers;
pub mod server;
pub mod tls;

pub use server::HttpServer;
