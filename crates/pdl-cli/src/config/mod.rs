//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── input: InputConfig       # stage, spreadsheet, storage URL prefix
//! ├── worker: WorkerConfig     # base dir, batch sizes, pacing, deadline
//! ├── ocr: AdvConfig           # OCR provider endpoint, key and retry
//! ├── audit: ReqwestConfig     # audit endpoint
//! ├── postgres: PgConfig       # result store
//! └── storage: StorageConfig   # S3 bucket and transfer settings
//! ```

mod input;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use input::InputConfig;
use pdl_advance::AdvConfig;
use pdl_opendal::StorageConfig;
use pdl_postgres::PgConfig;
use pdl_webhook::reqwest::ReqwestConfig;
use pdl_worker::WorkerConfig;
use serde::{Deserialize, Serialize};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "pdl")]
#[command(about = "PAN card OCR batch pipeline")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub input: InputConfig,

    #[clap(flatten)]
    pub worker: WorkerConfig,

    #[clap(flatten)]
    pub ocr: AdvConfig,

    #[clap(flatten)]
    pub audit: ReqwestConfig,

    #[clap(flatten)]
    pub postgres: PgConfig,

    #[clap(flatten)]
    pub storage: StorageConfig,
}

impl Cli {
    /// Loads `.env` (if enabled) and parses arguments.
    ///
    /// The `.env` file is read first so clap's `env` fallbacks see its values.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates every configuration group.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.worker
            .validate()
            .context("invalid worker configuration")?;
        self.ocr.validate().context("invalid OCR configuration")?;
        self.audit
            .validate()
            .context("invalid audit endpoint configuration")?;
        self.postgres
            .validate()
            .context("invalid database configuration")?;
        self.storage
            .validate()
            .context("invalid storage configuration")?;
        Ok(())
    }

    /// Logs the configuration without secrets.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            dotenv = cfg!(feature = "dotenv"),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            stage = %self.input.stage,
            data = %self.input.data.display(),
            base_dir = %self.worker.base_dir.display(),
            chunk_size = self.worker.chunk_size.get(),
            async_size = self.worker.async_size.get(),
            request_delay_ms = self.worker.request_delay_ms,
            batch_timeout_secs = self.worker.batch_timeout_secs,
            persist_audit = self.worker.persist_audit,
            "Worker configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            database_url = %self.postgres.database_url_masked(),
            max_connections = self.postgres.postgres_max_connections,
            bucket = %self.storage.s3_bucket,
            region = %self.storage.s3_region,
            "Store configuration"
        );

        if self.postgres.postgres_max_connections < self.worker.async_size.get() as u32 {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                max_connections = self.postgres.postgres_max_connections,
                async_size = self.worker.async_size.get(),
                "Fewer pooled connections than concurrent tasks, writes will queue"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pdl_worker::Stage;

    use super::*;

    const REQUIRED: [&str; 11] = [
        "pdl",
        "--ocr-url",
        "https://ocr.example.com/v1/pan",
        "--ocr-api-key",
        "key",
        "--audit-url",
        "https://events.example.com/audit",
        "--postgres-url",
        "postgresql://localhost/pdl",
        "--s3-bucket",
        "docs",
    ];

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(REQUIRED.iter().chain(extra.iter()))
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stage_aliases() {
        let cli = parse(&["--stage", "1"]).unwrap();
        assert_eq!(cli.input.stage, Stage::Download);

        let cli = parse(&["--stage", "recognize"]).unwrap();
        assert_eq!(cli.input.stage, Stage::Recognize);
        assert_eq!(cli.worker.chunk_size.get(), 100);
        assert_eq!(cli.worker.async_size.get(), 10);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(parse(&["--stage", "2", "--chunk-size", "0"]).is_err());
        assert!(parse(&["--stage", "2", "--async-size", "0"]).is_err());
        assert!(parse(&["--stage", "2", "--async-size", "5"]).is_ok());
    }
}
