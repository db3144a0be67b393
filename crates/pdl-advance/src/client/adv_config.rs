//! Configuration for the OCR provider client.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result, RetryPolicy};

/// Card type requested when none is configured.
pub const DEFAULT_CARD_TYPE: &str = "PAN_FRONT";

const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Longest accepted per-request timeout, one hour.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Longest accepted backoff between attempts, ten minutes.
const MAX_BACKOFF_MS: u64 = 600_000;

/// Endpoint, credentials and retry knobs for the OCR provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct AdvConfig {
    /// Recognition endpoint
    #[cfg_attr(feature = "config", arg(long = "ocr-url", env = "OCR_URL"))]
    pub ocr_url: String,

    /// Provider API key
    #[cfg_attr(feature = "config", arg(long = "ocr-api-key", env = "OCR_API_KEY"))]
    pub ocr_api_key: String,

    /// Card type sent with every image
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-card-type", env = "OCR_CARD_TYPE", default_value = DEFAULT_CARD_TYPE)
    )]
    pub ocr_card_type: String,

    /// Per-request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-timeout-secs", env = "OCR_TIMEOUT_SECS", default_value = "30")
    )]
    pub ocr_timeout_secs: u64,

    /// Total attempts while the provider reports it is busy
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-max-attempts", env = "OCR_MAX_ATTEMPTS", default_value = "3")
    )]
    pub ocr_max_attempts: u32,

    /// Backoff after the first busy answer, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ocr-initial-backoff-ms",
            env = "OCR_INITIAL_BACKOFF_MS",
            default_value = "200"
        )
    )]
    pub ocr_initial_backoff_ms: u64,

    /// Backoff cap, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ocr-max-backoff-ms",
            env = "OCR_MAX_BACKOFF_MS",
            default_value = "5000"
        )
    )]
    pub ocr_max_backoff_ms: u64,
}

impl AdvConfig {
    /// Creates a configuration with default timeout and retry knobs.
    pub fn new(ocr_url: impl Into<String>, ocr_api_key: impl Into<String>) -> Self {
        Self {
            ocr_url: ocr_url.into(),
            ocr_api_key: ocr_api_key.into(),
            ocr_card_type: DEFAULT_CARD_TYPE.to_owned(),
            ocr_timeout_secs: 30,
            ocr_max_attempts: 3,
            ocr_initial_backoff_ms: 200,
            ocr_max_backoff_ms: 5000,
        }
    }

    /// Sets the card type.
    pub fn with_card_type(mut self, card_type: impl Into<String>) -> Self {
        self.ocr_card_type = card_type.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Sets the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.ocr_max_attempts = max_attempts;
        self
    }

    /// Sets the backoff bounds.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.ocr_initial_backoff_ms = initial.as_millis() as u64;
        self.ocr_max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Per-request timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    /// Upper bound for one call with every retry and backoff included.
    pub fn call_budget(&self) -> Duration {
        let attempts = self.ocr_max_attempts.max(1);
        let backoff = Duration::from_millis(self.ocr_max_backoff_ms.saturating_mul(3) / 2);
        self.timeout()
            .saturating_mul(attempts)
            .saturating_add(backoff.saturating_mul(attempts - 1))
    }

    /// Retry schedule for busy answers.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.ocr_max_attempts,
            Duration::from_millis(self.ocr_initial_backoff_ms),
            Duration::from_millis(self.ocr_max_backoff_ms),
        )
    }

    /// Parsed endpoint.
    pub fn url(&self) -> Result<Url> {
        Url::parse(&self.ocr_url)
            .map_err(|e| Error::config(format!("Invalid OCR URL '{}': {e}", self.ocr_url)))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.url()?;

        if self.ocr_api_key.trim().is_empty() {
            return Err(Error::config("OCR API key must not be empty"));
        }

        if self.ocr_card_type.trim().is_empty() {
            return Err(Error::config("OCR card type must not be empty"));
        }

        if !(1..=MAX_TIMEOUT_SECS).contains(&self.ocr_timeout_secs) {
            return Err(Error::config(format!(
                "OCR timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {}",
                self.ocr_timeout_secs
            )));
        }

        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.ocr_max_attempts) {
            return Err(Error::config(format!(
                "OCR max attempts must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                self.ocr_max_attempts
            )));
        }

        if self.ocr_max_backoff_ms > MAX_BACKOFF_MS {
            return Err(Error::config(format!(
                "OCR max backoff must be at most {MAX_BACKOFF_MS} ms, got {}",
                self.ocr_max_backoff_ms
            )));
        }

        if self.ocr_initial_backoff_ms > self.ocr_max_backoff_ms {
            return Err(Error::config("OCR initial backoff exceeds the maximum backoff"));
        }

        Ok(())
    }
}

impl fmt::Debug for AdvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvConfig")
            .field("ocr_url", &self.ocr_url)
            .field("ocr_api_key", &"****")
            .field("ocr_card_type", &self.ocr_card_type)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("ocr_max_attempts", &self.ocr_max_attempts)
            .field("ocr_initial_backoff_ms", &self.ocr_initial_backoff_ms)
            .field("ocr_max_backoff_ms", &self.ocr_max_backoff_ms)
            .finish()
    }
}
