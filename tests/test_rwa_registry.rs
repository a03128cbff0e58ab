//! Integration tests for the RWA registry client
//!
//! Tests cover:
//! - Failure response shape when the registry endpoint is unreachable
//! - Circuit breaker short-circuit after repeated refresh failures
//!
//! Note: the registry URL points at a loopback port nothing listens on, so
//! every request fails at connect time; no external network is touched.

use std::net::TcpListener;

use aptos_asset_sdk::{RwaRegistry, Settings};

/// Loopback URL with a port that was just released, guaranteeing an
/// immediate connection-refused on every request.
fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn fast_settings(api_url: String) -> Settings {
    let mut settings = Settings::default();
    settings.rwa.api_url = api_url;
    settings.retry.max_attempts = 1;
    settings.retry.base_delay_ms = 1;
    settings.cache.rwa_ttl_seconds = 0;
    settings.circuit_breaker.failure_threshold = 2;
    settings.circuit_breaker.cooldown_seconds = 300;
    settings
}

/// Test that an unreachable registry yields the empty failure response
/// instead of an error or a panic.
#[tokio::test]
async fn test_unreachable_registry_yields_failure_response() {
    let registry = RwaRegistry::new(&fast_settings(dead_endpoint())).expect("client");

    let report = registry.snapshot().await;

    assert!(!report.success);
    assert_eq!(report.asset_count, 0);
    assert!(report.assets.is_empty());
    assert_eq!(report.total_value_formatted, "$0.0M");
    assert_eq!(report.data_source, "Error - RWA.xyz API unavailable");
    assert!(report.error.is_some());
}

/// Test that repeated refresh failures open the breaker, after which
/// snapshots short-circuit with the breaker message instead of dialing out.
#[tokio::test]
async fn test_repeated_failures_open_the_breaker() {
    let registry = RwaRegistry::new(&fast_settings(dead_endpoint())).expect("client");

    // Dos fallas consecutivas llegan al umbral configurado.
    for _ in 0..2 {
        let report = registry.snapshot().await;
        assert!(!report.success);
    }

    let report = registry.snapshot().await;
    assert!(!report.success);
    assert_eq!(
        report.error.as_deref(),
        Some("Circuit breaker is open - too many recent failures")
    );
    assert_eq!(report.data_source, "Error - RWA.xyz API unavailable");
}
