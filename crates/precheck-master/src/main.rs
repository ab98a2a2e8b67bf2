//! Task Precheck Master Server

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use precheck_master::{http, AppState, Config, EngineConfig};

/// Task precheck master.
#[derive(Parser, Debug)]
#[command(name = "precheck-master", about = "Runs task prechecks on behalf of clients")]
struct Args {
    /// HTTP server address
    #[arg(long, default_value = "127.0.0.1:8261")]
    http_addr: String,

    /// Default overall precheck deadline in milliseconds
    #[arg(long, default_value = "30000")]
    deadline_ms: u64,

    /// Grace period after cancellation in milliseconds
    #[arg(long, default_value = "2000")]
    grace_ms: u64,

    /// Maximum checks running at once
    #[arg(long, default_value = "8")]
    max_parallel: usize,

    /// Maximum concurrent probes against source/target systems
    #[arg(long, default_value = "4")]
    max_probes: usize,

    /// Timeout for a single network probe in milliseconds
    #[arg(long, default_value = "5000")]
    probe_timeout_ms: u64,

    /// Number of recent reports to keep
    #[arg(long, default_value = "64")]
    history_size: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            http_bind_addr: args.http_addr,
            history_size: args.history_size,
            engine: EngineConfig {
                default_deadline: Duration::from_millis(args.deadline_ms),
                grace_period: Duration::from_millis(args.grace_ms),
                max_parallel: args.max_parallel,
                max_probes: args.max_probes,
                probe_timeout: Duration::from_millis(args.probe_timeout_ms),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::from(Args::parse());
    let http_addr: SocketAddr = config.http_bind_addr.parse()?;

    let state = AppState::new(&config);
    let shutdown = state.shutdown.clone();
    let router = http::create_router(state);

    info!(
        http_addr = %http_addr,
        deadline_ms = config.engine.default_deadline.as_millis() as u64,
        max_parallel = config.engine.max_parallel,
        max_probes = config.engine.max_probes,
        "Starting precheck master"
    );

    let listener = TcpListener::bind(http_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested, cancelling in-flight prechecks");
            shutdown.cancel();
        })
        .await?;

    info!("Precheck master stopped");
    Ok(())
}
