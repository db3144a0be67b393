#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod shutdown;
mod telemetry;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use pdl_advance::AdvClient;
use pdl_core::{OcrService, SpreadsheetSource};
use pdl_opendal::{BatchFetcher, StorageBackend};
use pdl_postgres::run_pending_migrations;
use pdl_webhook::reqwest::ReqwestClient;
use pdl_worker::{PgResultStore, Pipeline, RunReport, WorkerState};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

/// Tracing target for startup events.
pub const TRACING_TARGET_STARTUP: &str = "pdl_cli::startup";

/// Tracing target for configuration events.
pub const TRACING_TARGET_CONFIG: &str = "pdl_cli::config";

/// Tracing target for shutdown events.
pub const TRACING_TARGET_SHUTDOWN: &str = "pdl_cli::shutdown";

/// Exit status for a run that completed with failures or cancellations.
const EXIT_DEGRADED: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(report) if report.is_clean() => {}
        Ok(report) => {
            tracing::warn!(
                target: TRACING_TARGET_STARTUP,
                failed = report.tally.failed,
                cancelled = report.tally.cancelled,
                persist_failures = report.tally.persist_failures,
                audit_failures = report.audit.failed,
                "Run completed degraded"
            );
            process::exit(EXIT_DEGRADED);
        }
        Err(error) => {
            if tracing::dispatcher::has_been_set() {
                tracing::error!(target: TRACING_TARGET_STARTUP, error = ?error, "Run failed");
            } else {
                eprintln!("Error: {error:?}");
            }
            process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<RunReport> {
    let cli = Cli::init();
    telemetry::init_tracing()?;

    cli.validate()?;
    cli.log();

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        stage = %cli.input.stage,
        "Starting pdl"
    );

    let items = SpreadsheetSource::new(cli.input.data.clone())
        .with_url_prefix(cli.input.storage_url_prefix.clone())
        .load()
        .await
        .with_context(|| format!("failed to load {}", cli.input.data.display()))?;

    let state = create_state(&cli).await?;
    let cancel = CancellationToken::new();
    shutdown::cancel_on_signal(cancel.clone());

    let pipeline = Pipeline::new(state, cli.worker.clone(), cancel.clone());
    let report = pipeline.run(cli.input.stage, items).await;

    // Stop the signal listener.
    cancel.cancel();
    Ok(report?)
}

/// Connects every external service the pipeline needs.
async fn create_state(cli: &Cli) -> anyhow::Result<WorkerState> {
    let pg = cli
        .postgres
        .clone()
        .build()
        .context("failed to create database client")?;
    pg.ping().await.context("database is unreachable")?;

    let applied = run_pending_migrations(&pg)
        .await
        .context("failed to apply database migrations")?;
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        applied = applied.len(),
        "Database migrations complete"
    );

    let backend =
        StorageBackend::new(cli.storage.clone()).context("failed to create storage backend")?;
    let fetcher = BatchFetcher::new(backend);

    let ocr = AdvClient::new(cli.ocr.clone()).context("failed to create OCR client")?;
    let ocr = OcrService::new(ocr).with_timeout(cli.ocr.call_budget());

    let audit = ReqwestClient::new(cli.audit.clone())
        .context("failed to create audit client")?
        .into_service();

    Ok(WorkerState::new(
        ocr,
        audit,
        Arc::new(fetcher),
        Arc::new(PgResultStore::new(pg)),
    ))
}
