//! Worker configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Result, WorkerError};

/// Default directory images are downloaded into.
pub const DEFAULT_BASE_DIR: &str = "./data";

/// Default number of items per outer batch.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// Default number of items per sub-batch task.
pub const DEFAULT_ASYNC_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Default pause before each OCR call, in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 20;

/// Default outer batch deadline, in seconds.
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 600;

/// Batch sizing, pacing and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WorkerConfig {
    /// Directory images are downloaded into and read from.
    #[cfg_attr(
        feature = "config",
        arg(long = "base-dir", env = "PDL_BASE_DIR", default_value = DEFAULT_BASE_DIR)
    )]
    pub base_dir: PathBuf,

    /// Items per outer batch; outer batches run one after another.
    #[cfg_attr(
        feature = "config",
        arg(long = "chunk-size", env = "PDL_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)
    )]
    pub chunk_size: NonZeroUsize,

    /// Items per concurrent sub-batch task.
    #[cfg_attr(
        feature = "config",
        arg(long = "async-size", env = "PDL_ASYNC_SIZE", default_value_t = DEFAULT_ASYNC_SIZE)
    )]
    pub async_size: NonZeroUsize,

    /// Pause before each OCR request, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "request-delay-ms",
            env = "PDL_REQUEST_DELAY_MS",
            default_value_t = DEFAULT_REQUEST_DELAY_MS
        )
    )]
    pub request_delay_ms: u64,

    /// Seconds an outer batch may run before unfinished sub-batches are aborted.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "batch-timeout-secs",
            env = "PDL_BATCH_TIMEOUT_SECS",
            default_value_t = DEFAULT_BATCH_TIMEOUT_SECS
        )
    )]
    pub batch_timeout_secs: u64,

    /// Also store every audit record in the local database.
    #[cfg_attr(feature = "config", arg(long = "persist-audit", env = "PDL_PERSIST_AUDIT"))]
    #[serde(default)]
    pub persist_audit: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
            async_size: DEFAULT_ASYNC_SIZE,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            batch_timeout_secs: DEFAULT_BATCH_TIMEOUT_SECS,
            persist_audit: false,
        }
    }
}

impl WorkerConfig {
    /// Sets the base directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Sets outer and inner batch sizes.
    pub fn with_sizes(mut self, chunk_size: NonZeroUsize, async_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self.async_size = async_size;
        self
    }

    /// Sets the per-request delay.
    pub fn with_request_delay_ms(mut self, request_delay_ms: u64) -> Self {
        self.request_delay_ms = request_delay_ms;
        self
    }

    /// Sets whether audit records are also stored locally.
    pub fn with_persist_audit(mut self, persist_audit: bool) -> Self {
        self.persist_audit = persist_audit;
        self
    }

    /// Pause before each OCR request.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Outer batch deadline.
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(WorkerError::config("base directory cannot be empty"));
        }

        if self.async_size > self.chunk_size {
            tracing::warn!(
                target: crate::TRACING_TARGET_PIPELINE,
                chunk_size = self.chunk_size.get(),
                async_size = self.async_size.get(),
                "Async size exceeds chunk size, each batch runs as a single sub-batch"
            );
        }

        if self.batch_timeout_secs == 0 {
            return Err(WorkerError::config("batch timeout must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.chunk_size.get(), 100);
        assert_eq!(config.async_size.get(), 10);
        assert_eq!(config.request_delay(), Duration::from_millis(20));
        assert_eq!(config.batch_timeout(), Duration::from_secs(600));
        assert!(!config.persist_audit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(WorkerConfig::default().with_base_dir("").validate().is_err());

        let mut config = WorkerConfig::default();
        config.batch_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
