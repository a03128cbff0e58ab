// src/resilience/retry.rs

use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::error::Result;
use crate::metrics;

/// Exponential backoff schedule for transient upstream failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Delay applied after failed attempt `attempt` (1-based):
    /// `min(base_delay * backoff_factor^(attempt - 1), max_delay)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_factor
            .powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32);
        let raw_ms = self.base_delay.as_millis() as f64 * factor;
        let capped_ms = raw_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

/// Runs `call` until it succeeds, a non-retryable error appears, or the
/// attempt cap is reached. The final error is returned unchanged.
///
/// Rate-limit errors are never retried here; callers route them to their
/// fallback path instead.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && err.is_retryable() => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "{operation}: retry attempt {attempt}/{} after {}ms: {err}",
                    policy.max_attempts,
                    delay.as_millis()
                );
                metrics::increment_retry(operation);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
