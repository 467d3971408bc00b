//! Retry policy for backend reads.
//!
//! The facade retries `SourceUnavailable` exactly once with backoff before
//! surfacing it. Terminal kinds (`NotSupported`, `Unsupported`,
//! `InvalidRequest`) and everything else are returned on the first failure.

use crate::error::AdapterResult;
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial call).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Whether to add jitter to the delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::source_unavailable()
    }
}

impl RetryConfig {
    /// One retry with a short jittered backoff.
    pub fn source_unavailable() -> Self {
        Self {
            max_retries: 1,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            jitter: true,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::source_unavailable()
        }
    }

    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let jitter_range = capped * 0.25;
            let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }

    /// Run `call`, retrying while it fails with a retryable kind.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> AdapterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.kind().is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying {} after: {}",
                        label,
                        e
                    );
                    futures_timer::Delay::new(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
