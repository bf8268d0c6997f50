//! Retry policy with exponential backoff for transient fetch failures.
//!
//! Only transport-level failures are retried; anti-bot and missing-page
//! answers are final on the first attempt (see [`FetchError::is_retryable`]).
//!
//! # Delay Calculation
//!
//! ```text
//! delay(attempt) = min(2^attempt * base, max) + random(0, jitter)
//! ```
//!
//! With the defaults (1s base, 1s jitter, 3 attempts) the waits are roughly
//! 1-2s and then 2-3s.
//!
//! [`FetchError::is_retryable`]: crate::crawler::FetchError::is_retryable

use crate::config::FetcherConfig;
use crate::crawler::random::RandomSource;
use std::time::Duration;

/// Attempt bound and backoff shape for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        max_jitter: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            max_jitter,
        }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.max_backoff_ms),
            Duration::from_millis(config.backoff_jitter_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if another attempt may follow the 0-based `attempt`
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Delay to wait after the failed 0-based `attempt`
    pub fn delay_for(&self, attempt: u32, random: &dyn RandomSource) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let exponential = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms = random.below(self.max_jitter.as_millis() as u64);
        exponential + Duration::from_millis(jitter_ms)
    }
}
