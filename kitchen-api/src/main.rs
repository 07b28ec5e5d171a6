//! kitchen-api - Kitchen inventory and recipe service
//!
//! Composition root: loads configuration, opens the store, serves the
//! router and closes the store on shutdown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kitchen_api::{build_router, AppState};
use kitchen_common::config::{load_toml_config, resolve_data_dir, DataPaths};
use kitchen_common::Store;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kitchen-api
#[derive(Parser, Debug)]
#[command(name = "kitchen-api")]
#[command(about = "Kitchen inventory and recipe service")]
#[command(version)]
struct Args {
    /// TOML bootstrap config file
    #[arg(short, long, env = "KITCHEN_CONFIG")]
    config: Option<PathBuf>,

    /// Data folder holding the database and images
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Address to bind, overriding the config file
    #[arg(short, long, env = "KITCHEN_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting kitchen-api v{}", env!("CARGO_PKG_VERSION"));

    let paths = DataPaths::new(resolve_data_dir(args.data_dir.as_deref(), &config));
    paths
        .ensure_exists()
        .with_context(|| format!("Failed to create data folder {}", paths.root.display()))?;
    info!("Data folder: {}", paths.root.display());

    let store = Store::open(&paths.database_path())
        .await
        .context("Failed to open database")?;

    if config.auth.is_enabled() {
        info!("Basic authentication enabled for user '{}'", config.auth.username);
    } else {
        info!("Authentication disabled (empty [auth] password)");
    }
    if config.listing.constrained {
        info!(
            "Constrained listings: {} inventory rows, {} recipes",
            config.listing.inventory_row_cap, config.listing.recipe_row_cap
        );
    }

    if let Some(static_dir) = &config.static_dir {
        info!("Serving web front end from {}", static_dir.display());
    }

    let state = AppState::new(store.clone(), &config, paths.images_dir());
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("kitchen-api listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
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
                error!("Failed to install SIGTERM handler: {}", e);
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
