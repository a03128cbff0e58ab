// src/resilience/dedup.rs

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::debug;

use crate::error::Result;
use crate::metrics;

/// Upper bound on tracked in-flight calls before the oldest half is dropped.
pub const DEFAULT_MAX_PENDING: usize = 1000;

type SharedCall<V> = Shared<BoxFuture<'static, Result<V>>>;

struct Pending<V> {
    generation: u64,
    started_at: Instant,
    call: SharedCall<V>,
}

/// Collapses concurrent calls sharing a key into one upstream call.
///
/// The first caller for a key registers the in-flight future; every later
/// caller with the same key awaits a shared handle to it and receives a
/// clone of the same result. The entry is removed when the call settles, so
/// a subsequent caller starts a fresh upstream call.
pub struct RequestDeduplicator<V> {
    pending: Arc<DashMap<String, Pending<V>>>,
    max_pending: usize,
    generation: AtomicU64,
}

impl<V> RequestDeduplicator<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            max_pending,
            generation: AtomicU64::new(0),
        }
    }

    pub async fn run<F>(&self, key: &str, call: F) -> Result<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        if self.pending.len() >= self.max_pending {
            self.drop_oldest_half();
        }

        let shared = match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                metrics::increment_dedup_joined();
                entry.get().call.clone()
            }
            Entry::Vacant(slot) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let pending = Arc::clone(&self.pending);
                let owned_key = key.to_string();
                let shared: SharedCall<V> = async move {
                    let result = call.await;
                    // A generation check keeps a late completion from
                    // removing a successor registered under the same key.
                    pending.remove_if(&owned_key, |_, entry| entry.generation == generation);
                    metrics::set_dedup_pending(pending.len() as f64);
                    result
                }
                .boxed()
                .shared();
                slot.insert(Pending {
                    generation,
                    started_at: Instant::now(),
                    call: shared.clone(),
                });
                metrics::set_dedup_pending(self.pending.len() as f64);
                shared
            }
        };

        shared.await
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // Dropped entries lose deduplication only; their futures keep running
    // for the callers already attached.
    fn drop_oldest_half(&self) {
        let mut by_age: Vec<(String, Instant)> = self
            .pending
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().started_at))
            .collect();
        by_age.sort_by_key(|(_, started_at)| *started_at);
        let half = by_age.len() / 2;
        for (key, _) in by_age.into_iter().take(half) {
            self.pending.remove(&key);
        }
        debug!(
            "Dropped {} oldest pending dedup entries (size: {})",
            half,
            self.pending.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_callers_share_one_upstream_call() {
        let dedup: Arc<RequestDeduplicator<u64>> = Arc::new(RequestDeduplicator::new(100));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dedup = Arc::clone(&dedup);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                dedup
                    .run("same-key", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok(42)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_shared_and_entry_is_cleared() {
        let dedup: RequestDeduplicator<u64> = RequestDeduplicator::new(100);

        let result = dedup
            .run("k", async { Err(AssetError::Transport("down".to_string())) })
            .await;
        assert!(matches!(result, Err(AssetError::Transport(_))));
        assert_eq!(dedup.pending_len(), 0);

        // A later caller gets a fresh call, not the cached failure.
        let result = dedup.run("k", async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn sequential_calls_each_reach_upstream() {
        let dedup: RequestDeduplicator<u64> = RequestDeduplicator::new(100);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = dedup
                .run("k", async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await
                .unwrap();
            assert_eq!(value, 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
