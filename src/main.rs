//! rpc-router
//!
//! Command line front end for the JSON-RPC router.
//!
//! ```text
//!  caller ──▶ RpcManager ──▶ RequestQueue ──▶ EndpointSelector ──▶ HttpTransport ──▶ endpoint
//!                 ▲                                                     │
//!                 └──────────── HealthTracker ◀──────── outcome ◀───────┘
//!                                    ▲
//!                             HealthMonitor (periodic probe)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::net::TcpListener;

use rpc_router::config::{load_config, RouterConfig};
use rpc_router::lifecycle::{signals, Shutdown};
use rpc_router::observability::{logging, metrics};
use rpc_router::{admin, CallOptions, HttpTransport, RpcManager};

#[derive(Parser)]
#[command(name = "rpc-router")]
#[command(about = "JSON-RPC router with endpoint health tracking and failover", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint URL, highest priority first (repeatable; replaces the configured list)
    #[arg(short, long = "endpoint")]
    endpoints: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one JSON-RPC call and print the result
    Call {
        method: String,
        /// JSON params
        #[arg(default_value = "[]")]
        params: String,
        /// Overall deadline in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
    /// Probe every endpoint once and print endpoint stats
    Stats,
    /// Run the probe loop and status server until interrupted
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if !cli.endpoints.is_empty() {
        config.endpoints = cli.endpoints.clone();
    }

    logging::init_logging(&config.observability);

    let transport = Arc::new(HttpTransport::new(config.timeouts.attempt())?);
    let manager = Arc::new(RpcManager::new(config.clone(), transport)?);

    match cli.command {
        Commands::Call {
            method,
            params,
            deadline_ms,
        } => {
            let params: Value = serde_json::from_str(&params)?;
            let mut options = CallOptions::default();
            if let Some(ms) = deadline_ms {
                options = options.with_deadline(Duration::from_millis(ms));
            }
            let result = manager.call_with(&method, params, options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Stats => {
            let round = manager.probe_now().await;
            tracing::info!(probed = round.probed, healthy = round.healthy, "Probe round complete");
            println!("{}", serde_json::to_string_pretty(&manager.status())?);
        }
        Commands::Serve => serve(config, manager).await?,
    }

    Ok(())
}

async fn serve(config: RouterConfig, manager: Arc<RpcManager>) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        endpoints = config.endpoints.len(),
        probe_interval_secs = config.health.probe_interval_secs,
        "rpc-router v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    manager.start_health_monitor();

    let shutdown = Shutdown::new();
    let status_server = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        Some(tokio::spawn(admin::serve(listener, manager.clone(), shutdown.subscribe())))
    } else {
        None
    };

    signals::shutdown_on_signal(&shutdown).await;
    manager.shutdown().await;

    if let Some(task) = status_server {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Status server failed"),
            Err(e) => tracing::error!(error = %e, "Status server task panicked"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
