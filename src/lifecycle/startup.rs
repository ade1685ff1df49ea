//! Startup orchestration and the run loop.
//!
//! # Responsibilities
//! - Validate configuration and build subsystems in dependency order
//! - Start the signal listener and the HTTP listener as background tasks
//! - Wait for either shutdown trigger and return

use std::future::Future;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::{tls, HttpServer};
use crate::lifecycle::{signals, Shutdown};

/// The server instance: configuration, HTTP listener, and the shared
/// done-channel tying signal handling to graceful shutdown.
pub struct Server {
    http: HttpServer,
    settings: ServerConfig,
    shutdown: Shutdown,
}

impl Server {
    /// Validate `settings` and assemble the server. Fails fast on a bad bind
    /// address, a missing handler, or unreadable TLS material.
    pub async fn setup(settings: ServerConfig) -> Result<Self, ServerError> {
        settings.validate()?;

        let mut http = HttpServer::new(&settings)?;

        if let (Some(cert), Some(key)) = (&settings.cert_path, &settings.key_path) {
            let tls = tls::load_tls_config(cert, key).await?;
            http = http.with_tls(tls);
        }

        Ok(Self {
            http,
            settings,
            shutdown: Shutdown::new(),
        })
    }

    /// Handle for triggering shutdown from outside the signal path.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run until a termination signal arrives or `cancel` resolves,
    /// whichever happens first.
    ///
    /// The listener runs on its own task and drains via the done-channel; a
    /// listener error (port in use, for instance) is logged but does not by
    /// itself stop the run loop.
    pub async fn run(self, cancel: impl Future<Output = ()> + Send) {
        let Server {
            http,
            settings,
            shutdown,
        } = self;

        let signal_shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            if signal_shutdown.trigger() {
                tracing::info!("...graceful server shutdown");
            }
        });

        tracing::info!(
            host = %settings.host(),
            port = settings.port(),
            "...starting server"
        );

        let drain = shutdown.wait();
        tokio::spawn(async move {
            if let Err(err) = http.run(drain).await {
                tracing::error!(error = %err, "http server terminated");
            }
        });

        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("...stop server");
            }
            _ = cancel => {
                tracing::info!("stop server by ctx");
            }
        }
    }
}
