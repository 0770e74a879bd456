//! API Gateway
//!
//! Serves typed API handlers over HTTP: every request is matched to a
//! registered route, its arguments are bound into a typed object, an
//! authorization token is derived, and the handler's result is encoded as
//! hardened JSON.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                   API GATEWAY                    │
//!                     │                                                  │
//!   Client Request    │  ┌─────────┐   ┌──────────┐   ┌─────────────┐    │
//!   ──────────────────┼─▶│  http   │──▶│ routing  │──▶│   binding   │    │
//!                     │  │ server  │   │ registry │   │  ArgsObject │    │
//!                     │  └─────────┘   └──────────┘   └──────┬──────┘    │
//!                     │                                      │           │
//!                     │                                      ▼           │
//!                     │  ┌─────────┐   ┌──────────┐   ┌─────────────┐    │
//!   Client Response   │  │response │◀──│ dispatch │◀──│  security   │    │
//!   ◀─────────────────┼──│ encoder │   │ handler  │   │    token    │    │
//!                     │  └─────────┘   └──────────┘   └─────────────┘    │
//!                     │                                                  │
//!                     │  Cross-cutting: config, observability, lifecycle │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::{load_config, GatewayConfig};
use api_gateway::lifecycle::{wait_for_signal, Shutdown};
use api_gateway::observability::{logging, metrics};
use api_gateway::{handlers, HttpServer};

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Typed HTTP-to-RPC API gateway", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        body_read_timeout_secs = config.timeouts.body_read_secs,
        max_body_size = config.listener.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = handlers::bootstrap(&config)?;
    tracing::info!(routes = registry.len(), "Route registry built");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            shutdown.trigger();
        }
    });

    HttpServer::new(config, registry).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
