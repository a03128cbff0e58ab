// src/resilience/mod.rs
//
// Generic caching, deduplication, retry, timeout and fallback primitives
// shared by every fetcher. Nothing here knows about ledger semantics.

/// Failure-counting circuit breaker
pub mod breaker;
/// Named TTL caches
pub mod cache;
/// Single-flight request collapsing
pub mod dedup;
/// Exponential backoff
pub mod retry;

pub use breaker::CircuitBreaker;
pub use cache::TtlCache;
pub use dedup::RequestDeduplicator;
pub use retry::{retry_with_backoff, RetryPolicy};

use std::future::Future;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::error::{AssetError, Result};
use crate::metrics;

/// Cache-first fetch pipeline: cache read, single-flight dedup, retry with
/// backoff, cache write.
#[derive(Clone)]
pub struct CachedFetcher<V> {
    cache: TtlCache<V>,
    dedup: std::sync::Arc<RequestDeduplicator<V>>,
    retry: RetryPolicy,
}

impl<V> CachedFetcher<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, max_entries: usize, retry: RetryPolicy) -> Self {
        Self {
            cache: TtlCache::new(name, max_entries),
            dedup: std::sync::Arc::new(RequestDeduplicator::new(dedup::DEFAULT_MAX_PENDING)),
            retry,
        }
    }

    /// Returns the cached value when fresh; otherwise collapses concurrent
    /// callers of `key` into one retried upstream call and caches its result.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }

        let cache = self.cache.clone();
        let retry = self.retry.clone();
        let owned_key = key.to_string();
        self.dedup
            .run(key, async move {
                let value = retry_with_backoff(&retry, &owned_key, &fetch).await?;
                cache.insert(owned_key, value.clone(), ttl);
                Ok(value)
            })
            .await
    }

    /// Last-resort read after a failed refresh; consumes the stale entry.
    pub fn take_stale(&self, key: &str) -> Option<V> {
        self.cache.take_stale(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.cache.insert(key, value, ttl);
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Bounds one upstream call. The timer does not cancel retries scheduled
/// around it; a timed-out call counts as one failed attempt.
pub async fn with_timeout<T, Fut>(duration: Duration, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(AssetError::Timeout(duration)),
    }
}

/// Primary-then-fallback composition. A fallback failure is logged and
/// discarded; the caller always sees the primary's error.
pub async fn with_fallback<T, P, F>(operation: &str, primary: P, fallback: F) -> Result<T>
where
    P: Future<Output = Result<T>>,
    F: Future<Output = Result<T>>,
{
    match primary.await {
        Ok(value) => Ok(value),
        Err(primary_err) => {
            warn!("{operation}: primary failed, trying fallback: {primary_err}");
            match fallback.await {
                Ok(value) => Ok(value),
                Err(fallback_err) => {
                    error!(
                        "{operation}: both primary and fallback failed (primary: {primary_err}, fallback: {fallback_err})"
                    );
                    Err(primary_err)
                }
            }
        }
    }
}

/// Completion line emitted by every service operation.
pub fn log_operation(operation: &str, started: Instant, success: bool, detail: &str) {
    let duration = started.elapsed();
    info!(
        "operation completed: operation={operation} success={success} duration_ms={} {detail}",
        duration.as_millis()
    );
    metrics::record_operation(operation, duration, success);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn get_or_fetch_caches_across_sequential_calls() {
        let fetcher: CachedFetcher<u64> = CachedFetcher::new("test", 16, RetryPolicy::default());
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = fetcher
                .get_or_fetch("k", Duration::from_secs(60), move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(5)
                    }
                })
                .await
                .unwrap();
            assert_eq!(value, 5);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let fetcher: Arc<CachedFetcher<u64>> =
            Arc::new(CachedFetcher::new("test", 16, RetryPolicy::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let fetcher = Arc::clone(&fetcher);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                fetcher
                    .get_or_fetch("k", Duration::from_secs(60), move || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(11)
                        }
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 11);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_stale_entry_takeable() {
        let fetcher: CachedFetcher<u64> = CachedFetcher::new(
            "test",
            16,
            RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::default()
            },
        );
        fetcher.insert("k", 3, Duration::ZERO);

        let result = fetcher
            .get_or_fetch("k", Duration::ZERO, || async {
                Err(AssetError::Transport("down".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(fetcher.take_stale("k"), Some(3));
        assert_eq!(fetcher.take_stale("k"), None);
    }

    #[tokio::test]
    async fn timeout_yields_typed_error() {
        let result: Result<()> = with_timeout(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        match result {
            Err(AssetError::Timeout(d)) => assert_eq!(d, Duration::from_millis(5)),
            other => panic!("unexpected result: {other:?}"),
        }

        let ok: Result<u8> = with_timeout(Duration::from_secs(5), async { Ok(1) }).await;
        assert_eq!(ok.unwrap(), 1);
    }

    #[tokio::test]
    async fn fallback_result_masks_primary_failure() {
        let value = with_fallback(
            "op",
            async { Err(AssetError::Transport("down".to_string())) },
            async { Ok(2) },
        )
        .await
        .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn primary_error_surfaces_when_both_fail() {
        let result: Result<u8> = with_fallback(
            "op",
            async { Err(AssetError::Transport("primary down".to_string())) },
            async { Err(AssetError::Timeout(Duration::from_secs(1))) },
        )
        .await;
        match result {
            Err(AssetError::Transport(msg)) => assert_eq!(msg, "primary down"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
