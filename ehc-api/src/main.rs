//! ehc-api - Even House Club data service
//!
//! Serves bookings, events, gallery and training routes over the shared
//! club database.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ehc_api::api::training::seed_training_sections;
use ehc_api::{build_router, AppState};
use ehc_common::config::{resolve_database_path, TomlConfig};
use ehc_common::db::init_database;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const DEFAULT_PORT: u16 = 5800;

/// Command-line arguments for ehc-api
#[derive(Parser, Debug)]
#[command(name = "ehc-api")]
#[command(about = "Even House Club data service")]
#[command(version)]
struct Args {
    /// Port to listen on (falls back to the config file, then 5800)
    #[arg(short, long, env = "EHC_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Database file (falls back to EHC_DATABASE, then the root folder)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Root folder holding ehc.db (falls back to EHC_ROOT_FOLDER)
    #[arg(long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},tower_http=info", toml_config.logging.level).into()
            }),
        )
        .init();

    info!("Starting ehc-api v{}", env!("CARGO_PKG_VERSION"));

    let db_path = resolve_database_path(
        args.database.as_deref(),
        args.root_folder.as_deref(),
        &toml_config,
    );
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("✓ Database ready");

    if let Err(e) = seed_training_sections(&pool).await {
        warn!("Training seed failed: {}", e);
    }

    let app = build_router(AppState::new(pool.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::new(args.bind, port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("ehc-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
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
                error!("Failed to install signal handler: {}", e);
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
