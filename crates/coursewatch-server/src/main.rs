//! Catalog server binary for Coursewatch.
//!
//! Wires the course store, the enrollment simulation, and the HTTP API
//! together and runs them until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Parse command-line arguments
//! 3. Load configuration from `coursewatch-config.yaml` (or `--config`)
//! 4. Seed the course store and start the simulation driver
//! 5. Serve the API until `Ctrl-C`
//! 6. Stop the driver and clear the store

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use coursewatch_api::{AppState, ServerConfig};
use coursewatch_core::{CatalogConfig, CatalogService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerBinError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "coursewatch-config.yaml";

/// Run the Coursewatch catalog server.
#[derive(Debug, Parser)]
#[command(name = "coursewatch-server", version, about)]
struct Args {
    /// Target semester (e.g. 1142). Overrides the config file.
    #[arg(short = 'S', long)]
    semester: Option<String>,

    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// TCP port to listen on. Overrides the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

/// Application entry point for the catalog server.
///
/// # Errors
///
/// Returns an error if configuration, seeding, or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("coursewatch-server starting");

    // 2-3. Arguments and configuration.
    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        host = config.server.host,
        port = config.server.port,
        semester = config.seed.semester,
        source = ?config.seed.source,
        tick_interval_ms = config.simulation.tick_interval_ms,
        "Configuration loaded"
    );

    // 4. Seed the store and start the simulation.
    let catalog = CatalogService::start(&config)
        .await
        .map_err(ServerBinError::from)?;

    // 5. Serve until Ctrl-C.
    let state = Arc::new(AppState::new(catalog.query().clone(), catalog.driver_stats()));
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let served = coursewatch_api::start_server(&server_config, state, shutdown_signal()).await;

    // 6. Tear down regardless of how serving ended.
    catalog.shutdown().await;
    served.map_err(ServerBinError::from)?;

    info!("coursewatch-server shutdown complete");
    Ok(())
}

/// Load configuration and apply command-line overrides.
fn load_config(args: &Args) -> Result<CatalogConfig, ServerBinError> {
    let mut config = if args.config.exists() {
        CatalogConfig::from_file(&args.config)?
    } else {
        if args.config != Path::new(DEFAULT_CONFIG_PATH) {
            warn!(path = %args.config.display(), "Config file not found, using defaults");
        } else {
            info!("Config file not found, using defaults");
        }
        CatalogConfig::parse("")?
    };

    if let Some(semester) = &args.semester {
        config.seed.semester.clone_from(semester);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;
    Ok(config)
}

/// Resolve when the process receives `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        return;
    }
    info!("Shutdown signal received");
}
