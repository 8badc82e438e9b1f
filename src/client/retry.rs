//! Request timeout and retry policy.

use std::time::Duration;

/// Timeout/retry policy applied to a single logical request.
///
/// The first attempt uses `initial_timeout`. Each retry grows the timeout
/// by `backoff_multiplier` times the previous timeout, so the default
/// multiplier of 1.0 doubles it. Attempts are issued back to back.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Timeout of the first attempt, in milliseconds.
    pub initial_timeout_ms: u64,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Timeout growth factor applied per retry.
    pub backoff_multiplier: f32,
}

/// Retries allowed when nothing else is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 1;
/// Backoff multiplier used when nothing else is configured.
pub const DEFAULT_BACKOFF_MULTIPLIER: f32 = 1.0;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_timeout(Duration::from_millis(2500))
    }
}

impl RetryPolicy {
    /// Policy with the given first-attempt timeout and default retries.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            initial_timeout_ms: timeout.as_millis() as u64,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Health check policy: 5 second first attempt.
    pub fn health() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Analyze policy: 30 second first attempt.
    pub fn analyze() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Timeout of the first attempt.
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_millis(self.initial_timeout_ms)
    }

    /// Total number of attempts, including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Timeout for the given zero-based attempt.
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        let mut millis = self.initial_timeout_ms as f64;
        for _ in 0..attempt.min(self.max_retries) {
            millis += millis * f64::from(self.backoff_multiplier);
        }
        Duration::from_micros((millis * 1000.0).round() as u64)
    }

    /// Timeouts of every attempt, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.attempts()).map(|a| self.timeout_for(a)).collect()
    }

    /// Rejects a zero timeout or a negative or non-finite multiplier.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_timeout_ms == 0 {
            return Err("timeout must be greater than zero".to_string());
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 0.0 {
            return Err(format!(
                "backoff multiplier must be a non-negative number, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}
