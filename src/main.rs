//! Account service (v1)
//!
//! Persists user and driver accounts in MySQL and supervises the database
//! connection for the lifetime of the process.
//!
//! # Architecture Overview
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │                       ACCOUNT SERVICE                         │
//!  │                                                                │
//!  │  ┌──────────┐   ticks   ┌───────────────┐   probe   ┌───────┐ │
//!  │  │  timer   │──────────▶│ HealthMonitor │──────────▶│ Probe │ │
//!  │  └──────────┘           └───────┬───────┘           │Runner │ │
//!  │                                 │ escalate          └───┬───┘ │
//!  │                                 ▼                       │     │
//!  │                      ┌─────────────────────┐            ▼     │
//!  │                      │ ShutdownCoordinator │     ┌───────────┐│
//!  │                      └──────────┬──────────┘     │ PoolCache ││──── MySQL
//!  │                                 │ close          └───────────┘│
//!  │                                 ▼                       ▲     │
//!  │  Client ───────────▶ ┌─────────────────────┐            │     │
//!  │                      │  HttpServer (axum)  │   queries ─┘     │
//!  │                      └─────────────────────┘                  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;

use account_service::config::loader::load_config;
use account_service::config::ServiceConfig;
use account_service::database::{MySqlPoolFactory, PoolCache, ProbeRunner};
use account_service::health::{HealthMonitor, HealthReport};
use account_service::http::HttpServer;
use account_service::lifecycle::{signals, Shutdown, ShutdownCoordinator, SystemExit};
use account_service::observability::logging::{init_logging, TracingSink};
use account_service::observability::metrics;

#[derive(Parser)]
#[command(name = "account-service")]
#[command(about = "User and driver account service with MySQL health supervision", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability.log_level);

    tracing::info!("account-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mysql_host = %config.mysql.host,
        mysql_database = %config.mysql.database,
        health_check_enabled = config.health_check.enabled,
        "Configuration loaded"
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

    let pools = Arc::new(PoolCache::new(MySqlPoolFactory));
    let shutdown = Shutdown::new();
    let report = HealthReport::new();
    let sink = Arc::new(TracingSink);

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let (closed_tx, closed_rx) = watch::channel(false);
    let coordinator = Arc::new(ShutdownCoordinator::new(
        shutdown.clone(),
        closed_rx,
        pools.clone(),
        sink.clone(),
        Arc::new(SystemExit),
        config.shutdown.drain_timeout(),
    ));

    let monitor = HealthMonitor::new(
        ProbeRunner::new(pools.clone(), config.health_check.probe_timeout()),
        config.mysql.clone(),
        config.health_check.clone(),
        sink,
        coordinator,
        report.clone(),
    );
    let monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));

    tokio::spawn(signals::forward_signals(shutdown.clone()));

    let server = HttpServer::new(&config, report);
    server.run(listener, shutdown.subscribe(), closed_tx).await?;

    if let Err(e) = monitor_task.await {
        tracing::error!(error = %e, "Health monitor task failed");
    }
    pools.close_all().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
