//! Tenant Router
//!
//! Classifies every request by hostname and path, then redirects, rejects,
//! or forwards it (possibly under a rewritten path) to the rendering upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                TENANT ROUTER                 │
//!                         │                                              │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│ request  │───▶│ routing │  │
//!                         │  │ server  │    │ context  │    │  rules  │  │
//!                         │  └─────────┘    └──────────┘    └────┬────┘  │
//!                         │                                      │       │
//!                         │              ┌───────────────────────┤       │
//!                         │              ▼                       ▼       │
//!     Client Response     │  ┌──────────────────┐    ┌──────────────────┐│
//!     ◀───────────────────┼──│ reject/redirect  │    │ rewrite/forward  │┼──▶ Renderer
//!                         │  └──────────────────┘    └──────────────────┘│
//!                         │                                              │
//!                         │  config (watch + swap) · observability ·     │
//!                         │  lifecycle (signals, graceful shutdown)      │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use tenant_router::config::watcher::ConfigWatcher;
use tenant_router::config::{load_config, load_default};
use tenant_router::lifecycle::{signals, Shutdown};
use tenant_router::observability::{logging, metrics};
use tenant_router::HttpServer;

#[derive(Parser)]
#[command(name = "tenant-router", version, about = "Hostname-based multi-tenant request router")]
struct Args {
    /// Path to the TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };

    logging::init_logging(&config.observability);

    tracing::info!("tenant-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        root_domain = %config.routing.root_domain,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher handle alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
