//! Worker error types.

use std::borrow::Cow;

/// Result type alias for worker operations.
pub type Result<T, E = WorkerError> = std::result::Result<T, E>;

/// Run-level failures. Per-item failures never surface here, they are tallied.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The processed-customer set could not be loaded.
    #[error("resume filter failed: {0}")]
    Resume(#[source] pdl_core::Error),

    /// Invalid worker configuration.
    #[error("invalid configuration: {0}")]
    Config(Cow<'static, str>),

    /// Database setup failed.
    #[error("database error: {0}")]
    Database(#[from] pdl_postgres::PgError),
}

impl WorkerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(message.into())
    }
}
