use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use green_proxy::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "green_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("green-proxy v0.1.0 starting");

    let settings = ServerConfig::parse();

    tracing::info!(
        address = %settings.address,
        tls = settings.tls_enabled(),
        body_limit = settings.body_limit,
        request_timeout_secs = settings.request_timeout_secs,
        "configuration loaded"
    );

    let server = Server::setup(settings).await?;

    // Shutdown is signal-driven in production; the cancel future never fires.
    server.run(std::future::pending::<()>()).await;

    tracing::info!("shutdown complete");
    Ok(())
}
