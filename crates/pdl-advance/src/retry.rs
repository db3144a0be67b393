//! Backoff schedule for busy-provider retries.

use std::time::Duration;

use rand::Rng;

/// Bounded retry with exponential backoff and jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Backoff after the first attempt
    pub initial_backoff: Duration,
    /// Upper bound of the backoff before jitter
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            ..Self::default()
        }
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Whether another attempt is allowed after `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff after the given 1-based attempt, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Backoff plus a random jitter of up to half of it.
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff(attempt);
        let spread = (base.as_millis() / 2) as u64;
        if spread == 0 {
            return base;
        }

        base + Duration::from_millis(rand::rng().random_range(0..=spread))
    }
}
