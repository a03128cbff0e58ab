// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
    increment_counter, Unit,
};

// Without the observability feature the macros below expand to nothing,
// so call sites compile away.
#[cfg(not(feature = "observability"))]
pub enum Unit {}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! increment_counter {
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

// Stubs for the describe_* family, same shapes as the real macros.
#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

// The stubs land at the crate root via #[macro_export], pull them back in.
#[cfg(not(feature = "observability"))]
use crate::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
    increment_counter,
};

/// Registers name and help text for every metric the crate emits.
/// Call once at startup, before anything records.
pub fn describe_metrics() {
    // Cache metrics
    describe_counter!(
        "cache_hits_total",
        "Total lookups served from a live entry, labeled by cache name."
    );
    describe_counter!(
        "cache_miss_total",
        "Total lookups that found no live entry, labeled by cache name."
    );
    describe_gauge!(
        "cache_size_gauge",
        "Entries currently held, labeled by cache name."
    );
    describe_counter!(
        "cache_stale_served_total",
        Unit::Count,
        "Total times an expired cache entry was served after a failed refresh, labeled by cache name."
    );
    describe_gauge!(
        "dedup_pending_size",
        "Current number of in-flight deduplicated calls."
    );
    describe_counter!(
        "dedup_joined_total",
        Unit::Count,
        "Total callers that attached to an already in-flight call instead of issuing their own."
    );

    // Upstream (fullnode / indexer / external API) metrics
    describe_counter!(
        "upstream_requests_total",
        "Total upstream requests, labeled by endpoint."
    );
    describe_histogram!(
        "upstream_latency_ms",
        "Upstream request latency in milliseconds, labeled by endpoint."
    );
    describe_counter!(
        "upstream_429_total",
        "Total HTTP 429 responses, labeled by endpoint."
    );
    describe_counter!(
        "upstream_errors_total",
        "Total upstream request failures, labeled by endpoint."
    );

    // Resilience metrics
    describe_counter!(
        "retry_attempts_total",
        Unit::Count,
        "Total retry attempts scheduled after a transient failure, labeled by operation."
    );
    describe_counter!(
        "fallback_value_used_total",
        Unit::Count,
        "Total times a hardcoded fallback supply was substituted for a rate-limited token, labeled by symbol."
    );
    describe_counter!(
        "circuit_breaker_opened_total",
        Unit::Count,
        "Total number of times a circuit breaker has been opened, labeled by service."
    );
    describe_gauge!(
        "circuit_breaker_state",
        "The current state of a circuit breaker, labeled by service (0=Closed, 1=Open)."
    );

    // Aggregation metrics
    describe_counter!(
        "service_operations_total",
        Unit::Count,
        "Total service operations completed, labeled by operation and outcome."
    );
    describe_histogram!(
        "service_operation_duration_ms",
        "Service operation duration in milliseconds, labeled by operation."
    );
    describe_counter!(
        "supply_tokens_skipped_total",
        Unit::Count,
        "Total tokens skipped during a class aggregation because their fetch failed, labeled by symbol."
    );
    describe_gauge!(
        "positions_active_gauge",
        "Number of active positions found in the last wallet scan."
    );
}

// --- Recording helpers ---

pub fn increment_cache_hit(cache_name: &str) {
    counter!("cache_hits_total", 1, "cache" => cache_name.to_string());
}

pub fn increment_cache_miss(cache_name: &str) {
    counter!("cache_miss_total", 1, "cache" => cache_name.to_string());
}

pub fn set_cache_size(cache_name: &str, size: f64) {
    gauge!("cache_size_gauge", size, "cache" => cache_name.to_string());
}

pub fn increment_stale_served(cache_name: &str) {
    counter!("cache_stale_served_total", 1, "cache" => cache_name.to_string());
}

pub fn set_dedup_pending(size: f64) {
    gauge!("dedup_pending_size", size);
}

pub fn increment_dedup_joined() {
    increment_counter!("dedup_joined_total");
}

pub fn record_upstream_request(endpoint: &str, duration: std::time::Duration) {
    counter!("upstream_requests_total", 1, "endpoint" => endpoint.to_string());
    histogram!("upstream_latency_ms", duration.as_millis() as f64, "endpoint" => endpoint.to_string());
}

pub fn increment_upstream_429(endpoint: &str) {
    counter!("upstream_429_total", 1, "endpoint" => endpoint.to_string());
}

pub fn increment_upstream_error(endpoint: &str) {
    counter!("upstream_errors_total", 1, "endpoint" => endpoint.to_string());
}

pub fn increment_retry(operation: &str) {
    counter!("retry_attempts_total", 1, "operation" => operation.to_string());
}

pub fn increment_fallback_value(symbol: &str) {
    counter!("fallback_value_used_total", 1, "symbol" => symbol.to_string());
}

pub fn increment_circuit_breaker_opened(service: &str) {
    counter!("circuit_breaker_opened_total", 1, "service" => service.to_string());
}

pub fn set_circuit_breaker_state(service: &str, state: f64) {
    gauge!("circuit_breaker_state", state, "service" => service.to_string());
}

pub fn record_operation(operation: &str, duration: std::time::Duration, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!("service_operations_total", 1, "operation" => operation.to_string(), "outcome" => outcome.to_string());
    histogram!("service_operation_duration_ms", duration.as_millis() as f64, "operation" => operation.to_string());
}

pub fn increment_supply_token_skipped(symbol: &str) {
    counter!("supply_tokens_skipped_total", 1, "symbol" => symbol.to_string());
}

pub fn set_positions_active(count: f64) {
    gauge!("positions_active_gauge", count);
}
