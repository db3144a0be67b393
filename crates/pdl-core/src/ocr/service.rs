//! OCR service wrapper with a per-call deadline and observability.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{OcrProvider, OcrReply, TRACING_TARGET};
use crate::{Error, Result};

/// Default upper bound for a single recognition call, retries included.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// OCR service wrapper.
///
/// The inner provider is wrapped in an `Arc`, making this wrapper cheap to clone.
#[derive(Clone)]
pub struct OcrService {
    inner: Arc<dyn OcrProvider>,
    timeout: Duration,
}

impl OcrService {
    /// Creates a new service wrapper around a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: OcrProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a new service wrapper from a shared provider.
    pub fn from_arc(provider: Arc<dyn OcrProvider>) -> Self {
        Self {
            inner: provider,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Sets the upper bound for a single call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submits the image at `path`, failing with a timeout past the deadline.
    pub async fn request(&self, path: &Path) -> Result<OcrReply> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            "Requesting OCR"
        );

        let result = tokio::time::timeout(self.timeout, self.inner.request(path))
            .await
            .unwrap_or_else(|_| Err(Error::timeout().with_context(path.display().to_string())));

        let elapsed = started_at.elapsed();
        match &result {
            Ok(reply) => tracing::debug!(
                target: TRACING_TARGET,
                path = %path.display(),
                code = %reply.response.code,
                attempts = reply.attempts,
                elapsed_ms = elapsed.as_millis(),
                "OCR answered"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "OCR request failed"
            ),
        }

        result
    }
}

impl std::fmt::Debug for OcrService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
