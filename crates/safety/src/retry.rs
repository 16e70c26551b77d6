//! Retry classification and pacing.
//!
//! The policy decides nothing about how an attempt is made; it only answers
//! "is this failure worth another attempt?" and "how long to wait first?".
//! The execution layer owns the loop, because a fresh attempt needs a fresh
//! sequence slot and a re-checked budget.

use stampede_types::ErrorKind;
use std::time::Duration;

/// Retry tuning.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts, including the first. 1 disables retries.
    pub max_attempts: u32,
    /// Backoff before the first re-attempt.
    pub base_backoff: Duration,
    /// Growth factor per further attempt.
    pub backoff_multiplier: f64,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Decides re-attempts from the shared failure taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Whether `attempt` (1-based) may be followed by another one for this
    /// failure kind. Transient network trouble and sequence mismatches
    /// retry; everything else is fatal for the call.
    pub fn should_retry(&self, kind: ErrorKind, attempt: u32) -> bool {
        attempt < self.max_attempts() && kind.is_retryable()
    }

    /// Backoff before re-attempt number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(30);
        let grown =
            self.config.base_backoff.as_secs_f64() * self.config.backoff_multiplier.powi(exp as i32);
        Duration::from_secs_f64(grown.min(self.config.max_backoff.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
