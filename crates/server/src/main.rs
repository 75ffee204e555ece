mod api;
mod bootstrap;
mod health;

use anyhow::Result;
use eshop_core::config::{AppConfig, LoadOptions};

use crate::bootstrap::BootstrapError;

fn init_logging(config: &AppConfig) {
    use eshop_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default()).map_err(BootstrapError::from)?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        database = app.store.database_name(),
        "eshop-server listening"
    );

    axum::serve(listener, api::router(app.store.clone()))
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!(
        event_name = "server.stopping",
        correlation_id = "shutdown",
        "eshop-server stopping"
    );
    app.store.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    shutdown_on(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires. A listener that fails to install never
/// resolves, so the server keeps running instead of stopping at once.
async fn shutdown_on<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(error) = signal.await {
        tracing::error!(
            event_name = "server.signal.error",
            error = %error,
            "failed to listen for shutdown signal; stop the process externally"
        );
        std::future::pending::<()>().await;
    }
}
