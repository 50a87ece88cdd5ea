//! pmon-ir - Input relay
//!
//! **Module Identity:**
//! - Name: pmon-ir (Input Relay)
//! - Port: 3000 (default)

use anyhow::{Context, Result};
use clap::Parser;
use pmon_common::config::ConfigResolver;
use pmon_common::logging::init_tracing;
use pmon_common::{work_queue, HttpOutbound};
use pmon_ir::config::RelayConfig;
use pmon_ir::timestamps::{run_writer, TimestampStore};
use pmon_ir::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pmon-ir", version, about = "Telemetry input relay")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Ingestion record endpoint (overrides the config file)
    #[arg(long)]
    ingestion_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("relay", "PMON_IR_CONFIG");
    let (mut config, source): (RelayConfig, _) = resolver
        .load(args.config.as_deref())
        .context("Error during the input relay initialization phase")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.ingestion_url {
        config.ingestion_url = url;
    }

    init_tracing(&config.logging);

    info!("Starting PMON Input Relay (pmon-ir) v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration source: {:?}", source);

    config.validate().context("Invalid relay configuration")?;

    let pool = pmon_common::db::open_store(config.database_path.as_deref())
        .await
        .context("Timestamp store unreachable")?;
    let store = TimestampStore::new(pool).await?;

    let (queue_tx, queue_rx) = work_queue();
    tokio::spawn(run_writer(store, queue_rx));

    let outbound = Arc::new(HttpOutbound::new(&config.outbound)?);
    let app = build_router(AppState::new(outbound, &config.ingestion_url, queue_tx));

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Forwarding records to {}", config.ingestion_url);

    axum::serve(listener, app).await?;

    Ok(())
}
