//! # scrip-runner
//!
//! Entry point for the scrip master synchronizer.
//!
//! Loads a JSON configuration file, logs in upstream, pulls every configured
//! segment, reloads the sink, and runs the enrichment jobs. Exits `0` when
//! login succeeded and at least one segment was loaded.
//!
//! # Usage
//!
//! ```bash
//! scrip-sync config.json --log-level info
//! scrip-sync config.json --dry-run
//! ```

mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};

use scrip_feed::api::UpstreamClient;
use scrip_feed::api::config::UpstreamConfig;
use scrip_store::PgConnector;

use crate::pipeline::{Pipeline, SegmentOutcome};

/// Time granted after the deadline trips shutdown before the run is dropped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Scrip master synchronizer.
#[derive(Parser)]
#[command(name = "scrip-sync", about = "Scrip master synchronizer")]
struct Cli {
    /// Configuration file path (JSON).
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log directory for file output (overrides `app.log_dir`).
    #[arg(long)]
    log_dir: Option<String>,

    /// Fetch and transform only; no sink writes, no enrichment.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = scrip_core::config::load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let log_dir = cli.log_dir.as_deref().or(config.app.log_dir.as_deref());
    let _log_guard = scrip_core::logging::init_logging(&cli.log_level, log_dir, "scrip-sync");

    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("run", %run_id);
    run(cli, config).instrument(span).await
}

async fn run(cli: Cli, config: scrip_core::config::AppConfig) -> Result<ExitCode> {
    info!(
        config = %cli.config.display(),
        env = %config.app.env,
        segments = config.app.segments_allowed.len(),
        dry_run = cli.dry_run,
        "scrip-sync starting"
    );

    let endpoints = config.endpoints()?;
    let upstream = UpstreamClient::new(UpstreamConfig::from_endpoints(
        endpoints,
        config.app.http_timeout_secs,
    ))?;
    let connector = PgConnector::new(&config.database);
    let deadline = Duration::from_secs(config.app.run_timeout_secs);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    spawn_shutdown_triggers(shutdown_tx.clone(), deadline);

    let pipeline = Pipeline::new(Arc::new(config), Arc::new(upstream), Arc::new(connector))
        .dry_run(cli.dry_run);

    let summary = match pipeline.run_within(shutdown_rx, deadline + SHUTDOWN_GRACE).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("run aborted: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    for s in &summary.segments {
        match &s.outcome {
            SegmentOutcome::Loaded { transform, load } => info!(
                segment = %s.segment,
                processed = transform.processed,
                skipped = transform.skipped,
                inserted = load.inserted,
                failed = load.failed,
                "segment loaded"
            ),
            SegmentOutcome::Transformed { transform } => info!(
                segment = %s.segment,
                processed = transform.processed,
                skipped = transform.skipped,
                rows = transform.admitted(),
                "segment transformed (dry run)"
            ),
            SegmentOutcome::FetchFailed(e)
            | SegmentOutcome::LoadFailed(e)
            | SegmentOutcome::TaskFailed(e) => {
                error!(segment = %s.segment, "segment failed: {e}")
            }
            SegmentOutcome::Cancelled => warn!(segment = %s.segment, "segment cancelled"),
        }
    }

    if let Some(report) = &summary.enrichment {
        info!(
            market_cap_ok = report.market_cap.is_ok(),
            stock_id_ok = report.stock_id.is_ok(),
            "enrichment done"
        );
    }

    if summary.is_success() {
        info!(succeeded = summary.succeeded_segments(), "scrip-sync finished");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("no segment was loaded");
        Ok(ExitCode::FAILURE)
    }
}

/// Trip the shutdown signal on Ctrl+C or when the run deadline passes.
fn spawn_shutdown_triggers(tx: Arc<watch::Sender<bool>>, deadline: Duration) {
    let on_signal = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown signal received, stopping between pages/rows");
            let _ = on_signal.send(true);
        }
    });
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        warn!(timeout_secs = deadline.as_secs(), "run deadline reached, cancelling");
        let _ = tx.send(true);
    });
}
