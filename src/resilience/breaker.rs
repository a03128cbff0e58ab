// src/resilience/breaker.rs

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::warn;

use crate::metrics;

/// Failure-counting breaker for an upstream that degrades under load.
///
/// Opens once `failure_threshold` consecutive failures accumulate; while
/// open, [`CircuitBreaker::is_open`] reports `true` until `cooldown` has
/// elapsed since the last recorded failure. After the cooldown a single
/// probe call is allowed through: success closes the breaker, another
/// failure re-opens it immediately.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    // Millis since `started`, offset by one; zero means no failure recorded.
    last_failure_ms: AtomicU64,
    started: Instant,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            name,
            failure_threshold: failure_threshold.max(1),
            cooldown,
            consecutive_failures: AtomicU32::new(0),
            last_failure_ms: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        if self.consecutive_failures.load(Ordering::Relaxed) < self.failure_threshold {
            return false;
        }
        let stamp = self.last_failure_ms.load(Ordering::Relaxed);
        if stamp == 0 {
            return false;
        }
        let since_failure = self
            .started
            .elapsed()
            .saturating_sub(Duration::from_millis(stamp - 1));
        since_failure < self.cooldown
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.last_failure_ms.store(0, Ordering::Relaxed);
        metrics::set_circuit_breaker_state(self.name, 0.0);
    }

    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_failure_ms
            .store(self.started.elapsed().as_millis() as u64 + 1, Ordering::Relaxed);
        if failures == self.failure_threshold {
            warn!(
                "{} circuit breaker opened after {} consecutive failures (cooldown {}s)",
                self.name,
                failures,
                self.cooldown.as_secs()
            );
            metrics::increment_circuit_breaker_opened(self.name);
            metrics::set_circuit_breaker_state(self.name, 1.0);
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}
