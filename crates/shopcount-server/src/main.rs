//! Main entry point for the shopcount server.

use anyhow::{anyhow, Context, Result};
use shopcount_common::logging::init_logging;
use shopcount_config::{ConfigCache, ConfigLoader};
use shopcount_reports::ReportSettings;
use shopcount_server::{create_router, AppState, SqliteCountStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging.to_logging_config())
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting shopcount server");

    let settings =
        ReportSettings::from_config(&config.reports).context("Invalid report settings")?;
    info!(timezone = %settings.timezone, max_range_days = settings.max_range_days, "Report settings loaded");

    let store = SqliteCountStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open count database")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let config = Arc::new(ConfigCache::new(config));
    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(Arc::clone(&config)));

    let app = create_router(AppState::new(store, config));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Listening for requests");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated with an error")?;

    info!("Server stopped");
    Ok(())
}

/// Reloads configuration on SIGHUP. Only report settings take effect; server
/// and database sections are read once at startup.
#[cfg(unix)]
async fn reload_on_hangup(config: Arc<ConfigCache>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!(error = %e, "Failed to listen for SIGHUP, configuration reload disabled");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        let reloaded = config
            .reload()
            .map_err(shopcount_common::ShopCountError::from)
            .and_then(|config| ReportSettings::from_config(&config.reports));
        match reloaded {
            Ok(settings) => info!(timezone = %settings.timezone, max_range_days = settings.max_range_days, "Report settings reloaded"),
            Err(e) => warn!(error = %e, "Configuration reload failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
