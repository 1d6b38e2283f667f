//! pairrank-server - Main entry point
//!
//! Serves collection CRUD and the pairwise ranking flow over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pairrank_common::config::{self, ConfigLayer, ServiceConfig};
use pairrank_common::db::init_database;
use pairrank_common::ranking::{PairOrder, RankingContext};
use pairrank_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for pairrank-server
#[derive(Parser, Debug)]
#[command(name = "pairrank-server")]
#[command(about = "Pairwise ranking service for item collections")]
#[command(version)]
struct Args {
    /// Folder holding the database
    #[arg(short, long, env = "PAIRRANK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PAIRRANK_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "PAIRRANK_BIND")]
    bind: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "PAIRRANK_CONFIG")]
    config: Option<PathBuf>,

    /// Present pairs in a fixed order instead of shuffling them
    #[arg(long)]
    no_shuffle: bool,
}

impl Args {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            root_folder: self.root_folder.clone(),
            port: self.port,
            bind: self.bind.clone(),
            shuffle_pairs: self.no_shuffle.then_some(false),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pairrank_server=info,pairrank_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting pairrank-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_layer = match &args.config {
        Some(path) => config::read_config_layer(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?,
        None => config::load_file_layer().context("Failed to load config file")?,
    };
    let config = ServiceConfig::from_layers(args.layer(), file_layer);

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let pair_order = PairOrder::from_shuffle_flag(config.shuffle_pairs);
    info!("Pair order: {:?}", pair_order);

    let ranking = Arc::new(RankingContext::new(pool.clone(), pair_order));
    let app = build_router(AppState::new(pool, ranking));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("pairrank-server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
