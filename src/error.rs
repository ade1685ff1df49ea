//! Server error types.

use thiserror::Error;

/// Errors surfaced by server setup and the request pipeline's diagnostics.
///
/// Per-request failures never appear here; they are answered at the HTTP
/// boundary with a status code and never propagate as structured errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address {0:?}, expected host:port")]
    InvalidAddress(String),

    #[error("bind port is missing")]
    MissingPort,

    #[error("request handler is missing")]
    MissingHandler,

    #[error("header {0} is not valid text")]
    HeaderEncoding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
