//! pmon-ig - Ingestion stage
//!
//! **Module Identity:**
//! - Name: pmon-ig (Ingestion)
//! - Port: 4000 (default)
//!
//! Accepts telemetry records on `POST /record`, reassembles them into raw
//! sessions on a single consumer task and forwards accepted sessions
//! downstream.

use anyhow::{Context, Result};
use clap::Parser;
use pmon_common::config::ConfigResolver;
use pmon_common::logging::init_tracing;
use pmon_common::{work_queue, HttpOutbound};
use pmon_ig::config::{IngestConfig, OperativeMode};
use pmon_ig::integrity::IntegrityChecker;
use pmon_ig::store::SessionStore;
use pmon_ig::window::{EvaluationWindow, Mode};
use pmon_ig::{build_router, AppState, IngestRoutes, SessionAssembler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pmon-ig", version, about = "Session ingestion stage")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Start in evaluation mode (accepts 1/0, true/false)
    #[arg(long, env = "PMON_EVALUATION", value_parser = clap::builder::BoolishValueParser::new())]
    evaluation: Option<bool>,

    /// Session store database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("ingestion", "PMON_IG_CONFIG");
    let (mut config, source): (IngestConfig, _) = resolver
        .load(args.config.as_deref())
        .context("Error during the ingestion stage initialization phase")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(evaluation) = args.evaluation {
        config.initial_mode = if evaluation { Mode::Evaluation } else { Mode::Production };
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }

    init_tracing(&config.logging);

    info!(
        "Starting PMON Ingestion (pmon-ig) v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration source: {:?}", source);

    config.validate().context("Invalid ingestion configuration")?;
    info!(
        "The configuration is valid, {:?} operative mode, starting in {} mode",
        config.operative_mode, config.initial_mode
    );

    let pool = pmon_common::db::open_store(config.database_path.as_deref())
        .await
        .context("Session store unreachable")?;
    let store = SessionStore::new(pool, config.session.clone()).await?;
    let integrity = IntegrityChecker::new(config.session.clone());

    let window = match config.operative_mode {
        OperativeMode::Production => EvaluationWindow::new(
            config.initial_mode,
            config.windows.evaluation_window,
            config.windows.production_window,
        ),
        OperativeMode::Development => EvaluationWindow::development(
            config.initial_mode,
            config.windows.evaluation_window,
        ),
    };

    let outbound = Arc::new(HttpOutbound::new(&config.outbound)?);
    let routes = IngestRoutes {
        preparation_url: config.endpoints.preparation_url.clone(),
        evaluation_url: config.endpoints.evaluation_url.clone(),
    };

    let assembler = SessionAssembler::new(
        store,
        integrity,
        outbound,
        routes,
        window,
        config.operative_mode,
    );

    let (queue_tx, queue_rx) = work_queue();
    tokio::spawn(assembler.run(queue_rx));

    let app = build_router(AppState::new(queue_tx));

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
