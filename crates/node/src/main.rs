//! Scatter storage node binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use scatter_core::config::NodeConfig;
use scatter_node::register::{default_advertise_url, register};
use scatter_node::store::ChunkStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scatter storage node - holds opaque chunk blobs addressed by identifier.
#[derive(Parser, Debug)]
#[command(name = "scatter-node")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SCATTER_NODE_CONFIG",
        default_value = "config/node.toml"
    )]
    config: String,

    /// Root directory for chunk storage (overrides config)
    #[arg(long, env = "CHUNKS_DIR")]
    chunks_dir: Option<PathBuf>,
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

    tracing::info!("Scatter node v{}", env!("CARGO_PKG_VERSION"));

    let mut figment = Figment::new();
    if std::path::Path::new(&args.config).exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    }
    let mut config: NodeConfig = figment
        .merge(Env::prefixed("SCATTER_NODE_"))
        .extract()
        .context("failed to load configuration")?;
    if let Some(chunks_dir) = args.chunks_dir {
        config.chunks_dir = chunks_dir;
    }

    scatter_node::metrics::register_metrics();

    let store = Arc::new(
        ChunkStore::new(&config.chunks_dir)
            .await
            .context("init chunk store")?,
    );
    tracing::info!(chunks_dir = %config.chunks_dir.display(), "Chunk store initialized");

    let app = scatter_node::create_router(store);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Listening on {}", local_addr);

    // Register with the frontend concurrently with serving so the request
    // can be answered as soon as the listener is accepting.
    let advertise_url = config
        .advertise_url
        .clone()
        .unwrap_or_else(|| default_advertise_url(local_addr.port()));
    let front_url = config.front_url.clone();
    tokio::spawn(async move {
        let http = reqwest::Client::new();
        if let Err(err) = register(&http, &front_url, &advertise_url).await {
            tracing::error!(error = %err, "Node registration failed");
            std::process::exit(1);
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

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
