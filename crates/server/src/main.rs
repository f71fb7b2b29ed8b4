//! Scatter frontend binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use scatter_core::config::FrontConfig;
use scatter_node::HttpNodeClientFactory;
use scatter_server::{AppState, create_router, spawn_stat_updater};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scatter frontend - splits uploads into chunks scattered across storage
/// nodes and reassembles them on download.
#[derive(Parser, Debug)]
#[command(name = "scatterd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SCATTER_CONFIG",
        default_value = "config/front.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Scatter frontend v{}", env!("CARGO_PKG_VERSION"));

    let mut figment = Figment::new();
    if std::path::Path::new(&args.config).exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    }
    let config: FrontConfig = figment
        .merge(Env::prefixed("SCATTER_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    scatter_server::metrics::register_metrics();

    // Initialize metadata store
    let metadata = scatter_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;
    tracing::info!("Metadata store initialized");

    let factory = Arc::new(HttpNodeClientFactory::new(reqwest::Client::new()));
    let stats_refresh = config.stats_refresh_interval();
    let bind = config.bind.clone();

    let state = AppState::new(config, metadata, factory);

    // Pick up nodes persisted before a restart; they will also re-register.
    if let Err(err) = state.registry.fetch_nodes(state.metadata.as_ref()).await {
        tracing::warn!(error = %err, "Failed to prefetch nodes");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let updater = spawn_stat_updater(state.clone(), stats_refresh, shutdown_rx);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind to {bind}"))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the stat updater after the last request has drained.
    let _ = shutdown_tx.send(true);
    let _ = updater.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
