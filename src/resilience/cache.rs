// src/resilience/cache.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::debug;

use crate::metrics;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// Named TTL cache backed by a lock-free map.
///
/// Expired entries read as misses but stay in place: after a failed refresh
/// the owner may serve one through [`TtlCache::take_stale`], which consumes
/// it so a stale value is never replayed twice.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    name: &'static str,
    entries: Arc<DashMap<String, Entry<V>>>,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, max_entries: usize) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fresh value for `key`, if any. Expired entries count as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh() => {
                metrics::increment_cache_hit(self.name);
                Some(entry.value.clone())
            }
            _ => {
                metrics::increment_cache_miss(self.name);
                None
            }
        }
    }

    /// Removes and returns the entry regardless of freshness. Last-resort
    /// read after a refresh failure.
    pub fn take_stale(&self, key: &str) -> Option<V> {
        let value = self.entries.remove(key).map(|(_, entry)| entry.value);
        if value.is_some() {
            metrics::increment_stale_served(self.name);
        }
        value
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
        self.maybe_evict();
        metrics::set_cache_size(self.name, self.entries.len() as f64);
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Oldest-first eviction once the map grows past its cap.
    fn maybe_evict(&self) {
        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().inserted_at))
            .collect();
        by_age.sort_by_key(|(_, inserted_at)| *inserted_at);
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!(
            "Evicted {} entries from {} cache (size: {})",
            excess,
            self.name,
            self.entries.len()
        );
    }
}
