//! Server configuration.
//!
//! # Data Flow
//! ```text
//! CLI flags / environment
//!     → clap (parse, defaults)
//!     → ServerConfig::validate (semantic checks)
//!     → threaded by reference into every subsystem constructor
//! ```
//!
//! # Design Decisions
//! - One configuration value constructed in `main`, no global state
//! - Flags win over environment variables, environment over defaults
//! - Validation is separate from parsing so tests can build configs directly

use std::path::PathBuf;

use clap::Parser;

use crate::error::ServerError;

/// Runtime configuration for the front end.
#[derive(Parser, Debug, Clone)]
#[command(name = "green-proxy", about = "HTTPS front end for the Green messaging API")]
pub struct ServerConfig {
    /// Bind address in host:port form.
    #[arg(short = 'a', long = "address", env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// Secret reserved for body hash verification.
    #[arg(short = 's', long = "secret", env = "SECRET", default_value = "supersecret")]
    pub secret: String,

    /// PEM certificate path; TLS is enabled when both --cert and --key are set.
    #[arg(long = "cert", env = "SERVER_CRT")]
    pub cert_path: Option<PathBuf>,

    /// PEM private key path.
    #[arg(long = "key", env = "SERVER_KEY")]
    pub key_path: Option<PathBuf>,

    /// Largest request body the pipeline will buffer, in bytes.
    #[arg(long = "body-limit", env = "BODY_LIMIT", default_value_t = 2 * 1024 * 1024)]
    pub body_limit: usize,

    /// Per-request timeout in seconds.
    #[arg(long = "request-timeout", env = "REQUEST_TIMEOUT", default_value_t = 60)]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8080".to_string(),
            secret: "supersecret".to_string(),
            cert_path: None,
            key_path: None,
            body_limit: 2 * 1024 * 1024,
            request_timeout_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Semantic checks beyond what clap enforces syntactically.
    pub fn validate(&self) -> Result<(), ServerError> {
        let (host, port) = self
            .address
            .rsplit_once(':')
            .ok_or_else(|| ServerError::InvalidAddress(self.address.clone()))?;

        if host.is_empty() {
            return Err(ServerError::InvalidAddress(self.address.clone()));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.address.clone()))?;

        if port == 0 {
            return Err(ServerError::MissingPort);
        }

        Ok(())
    }

    pub fn host(&self) -> &str {
        self.address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.address)
    }

    pub fn port(&self) -> u16 {
        self.address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
            .unwrap_or(0)
    }

    pub fn tls_enabled(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }
}
