//! HTTP server setup and listener management.
//!
//! # Responsibilities
//! - Build the business router (status, demo page, 404 fallback)
//! - Compose the middleware chain around it
//! - Serve plain HTTP or TLS depending on configuration
//! - Drain gracefully when the shutdown future resolves

use std::future::Future;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower::util::BoxCloneSyncService;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::handlers;
use crate::middleware::{
    conveyor, DecryptMiddleware, GzipMiddleware, Handler, HashMiddleware, LoggingMiddleware,
    Middleware, RealIpMiddleware, RecoverMiddleware, RequestIdMiddleware,
};

/// HTTP server for the front end.
pub struct HttpServer {
    app: Router,
    bind_address: String,
    tls: Option<RustlsConfig>,
}

impl HttpServer {
    /// Build the server: business routes wrapped by the composed chain, plus
    /// the ambient timeout and trace layers.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let routes = Router::new()
            .route("/", get(handlers::index))
            .route("/status", get(handlers::status))
            .fallback(handlers::not_found);

        let base: Handler = BoxCloneSyncService::new(routes);
        let composed =
            conveyor(Some(base), &middleware_chain(config)).ok_or(ServerError::MissingHandler)?;

        let app = Router::new()
            .fallback_service(composed)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.request_timeout_secs),
            ))
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            app,
            bind_address: config.address.clone(),
            tls: None,
        })
    }

    pub fn with_tls(mut self, tls: RustlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Bind and serve until `shutdown` resolves, then drain in-flight
    /// requests before returning.
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        match self.tls {
            Some(tls) => {
                let listener = std::net::TcpListener::bind(&self.bind_address)?;
                listener.set_nonblocking(true)?;
                tracing::info!(
                    address = %self.bind_address,
                    "listening for TLS connections"
                );

                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    drain.graceful_shutdown(None);
                });

                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle)
                    .serve(self.app.into_make_service())
                    .await?;
            }
            None => {
                let listener = TcpListener::bind(&self.bind_address).await?;
                tracing::info!(
                    address = %listener.local_addr()?,
                    "listening for connections"
                );

                axum::serve(listener, self.app)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The chain, innermost first: logging wraps the handler directly so captured
/// sizes are pre-compression; compression sits outside it; the integrity
/// placeholders and base infrastructure wrap everything else.
fn middleware_chain(config: &ServerConfig) -> Vec<Box<dyn Middleware>> {
    vec![
        Box::new(LoggingMiddleware::new(config.body_limit)),
        Box::new(GzipMiddleware::new(config.body_limit)),
        Box::new(HashMiddleware::new(config.secret.clone())),
        Box::new(DecryptMiddleware),
        Box::new(RecoverMiddleware),
        Box::new(RealIpMiddleware),
        Box::new(RequestIdMiddleware),
    ]
}
