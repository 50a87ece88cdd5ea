//! pmon-ev - Evaluation stage
//!
//! **Module Identity:**
//! - Name: pmon-ev (Evaluation)
//! - Port: 5000 (default)
//!
//! Receives classifier labels and expert labels, and produces an evaluation
//! report each time a window of paired labels is complete.

use anyhow::{Context, Result};
use clap::Parser;
use pmon_common::config::ConfigResolver;
use pmon_common::logging::init_tracing;
use pmon_common::{work_queue, HttpOutbound};
use pmon_ev::archive::ReportArchive;
use pmon_ev::config::{DecisionMode, EvaluationConfig};
use pmon_ev::label_store::LabelStore;
use pmon_ev::{build_router, decision, AppState, QualityGate};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pmon-ev", version, about = "Classifier evaluation stage")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Decide on reports automatically instead of prompting (accepts 1/0, true/false)
    #[arg(long, env = "PMON_NO_STOP", value_parser = clap::builder::BoolishValueParser::new())]
    no_stop: Option<bool>,

    /// Label store database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory for archived reports (overrides the config file)
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("evaluation", "PMON_EV_CONFIG");
    let (mut config, source): (EvaluationConfig, _) = resolver
        .load(args.config.as_deref())
        .context("Error during the evaluation stage initialization phase")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if args.no_stop == Some(true) {
        config.decision.mode = DecisionMode::Random;
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    if let Some(report_dir) = args.report_dir {
        config.report_dir = Some(report_dir);
    }

    init_tracing(&config.logging);

    info!(
        "Starting PMON Evaluation (pmon-ev) v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration source: {:?}", source);

    config.validate().context("Invalid evaluation configuration")?;
    info!(
        report_size = config.gate.report_size,
        max_errors = config.gate.max_errors,
        max_consecutive_errors = config.gate.max_consecutive_errors,
        "Configuration done, {:?} report decisions",
        config.decision.mode
    );

    let pool = pmon_common::db::open_store(config.database_path.as_deref())
        .await
        .context("Label store unreachable")?;
    let store = LabelStore::new(pool).await?;

    let outbound = Arc::new(HttpOutbound::new(&config.outbound)?);
    let decider = decision::from_config(&config.decision);

    let mut gate = QualityGate::new(
        store,
        config.gate,
        decider,
        outbound,
        config.orchestrator_url.clone(),
    );
    if let Some(dir) = &config.report_dir {
        info!("Archiving reports under {}", dir.display());
        gate = gate.with_archive(ReportArchive::new(dir));
    }

    let (queue_tx, queue_rx) = work_queue();
    tokio::spawn(gate.run(queue_rx));

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
