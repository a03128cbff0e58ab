//! Integration tests for the supply aggregation services
//!
//! Tests cover:
//! - Representation dispatch (dual-form coins, metadata rows, holder aggregates)
//! - Rate-limit fallback to last known supplies
//! - Per-token skips versus class-wide failures
//! - Stale cache serving after a failed refresh
//! - USDT issuer-reserve subtraction
//! - Liquid staking grouping by issuing protocol
//!
//! Note: every service runs against an in-memory ledger behind the
//! `LedgerQuery` trait; no network access is required.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use serde_json::{json, Value};

use aptos_asset_sdk::error::{AssetError, Result};
use aptos_asset_sdk::token_registry::{self, Representation, USDT_ASSET_TYPE};
use aptos_asset_sdk::types::{
    AccountAddress, AccountResource, FungibleAssetMetadata, SupplyRecord,
};
use aptos_asset_sdk::{
    BitcoinSupply, LedgerQuery, LiquidStakingSupply, Settings, StablecoinSupply,
};

/// In-memory ledger. Each table is keyed by the identifier the
/// representation reads: coin types for CoinInfo counters, asset types for
/// metadata rows and holder aggregates.
#[derive(Default)]
struct MemoryLedger {
    coin_info: HashMap<String, u128>,
    metadata: HashMap<String, u128>,
    aggregates: HashMap<String, u128>,
    reserve: u128,
    rate_limited: HashSet<String>,
    unreachable: HashSet<String>,
    // Prendido, todo el ledger contesta con error de transporte.
    offline: AtomicBool,
}

impl MemoryLedger {
    fn check(&self, identifier: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AssetError::Transport("fullnode offline".to_string()));
        }
        if self.rate_limited.contains(identifier) {
            return Err(AssetError::RateLimited(format!(
                "{identifier}: upstream returned 429"
            )));
        }
        if self.unreachable.contains(identifier) {
            return Err(AssetError::Transport(format!(
                "{identifier}: connection reset"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerQuery for MemoryLedger {
    async fn account_resource(
        &self,
        _account: &str,
        resource_type: &str,
    ) -> Result<Option<Value>> {
        let coin_type = resource_type
            .strip_prefix("0x1::coin::CoinInfo<")
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(resource_type);
        self.check(coin_type)?;
        Ok(self.coin_info.get(coin_type).map(|supply| {
            json!({
                "type": resource_type,
                "data": {
                    "supply": {
                        "vec": [{ "integer": { "vec": [{ "value": supply.to_string() }] } }]
                    }
                }
            })
        }))
    }

    async fn account_resources(&self, _address: &AccountAddress) -> Result<Vec<AccountResource>> {
        Ok(Vec::new())
    }

    async fn fungible_asset_metadata(
        &self,
        asset_types: &[&str],
    ) -> Result<Vec<FungibleAssetMetadata>> {
        for asset_type in asset_types {
            self.check(asset_type)?;
        }
        Ok(asset_types
            .iter()
            .filter_map(|asset_type| {
                self.metadata.get(*asset_type).map(|supply| FungibleAssetMetadata {
                    asset_type: asset_type.to_string(),
                    supply_v2: Some(Value::String(supply.to_string())),
                    decimals: None,
                    symbol: None,
                    name: None,
                })
            })
            .collect())
    }

    async fn aggregate_balance(&self, asset_type: &str) -> Result<Option<u128>> {
        self.check(asset_type)?;
        Ok(self.aggregates.get(asset_type).copied())
    }

    async fn balances_for_owners(&self, _owners: &[&str], asset_type: &str) -> Result<u128> {
        self.check(asset_type)?;
        Ok(self.reserve)
    }
}

/// Settings with retries and pacing collapsed so sweeps finish instantly.
/// The zero TTL expires every cache entry on insert, which keeps each
/// `supplies()` call an independent refresh while leaving the entry behind
/// for the stale-serve path.
fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.retry.max_attempts = 1;
    settings.retry.base_delay_ms = 1;
    settings.cache.supply_ttl_seconds = 0;
    settings.aggregation.inter_request_delay_ms = 0;
    settings.aggregation.batch_delay_ms = 0;
    settings
}

fn representation(symbol: &str) -> Representation {
    token_registry::descriptor_for_symbol(symbol)
        .expect("registered token")
        .representation
}

fn dual_parts(symbol: &str) -> (&'static str, &'static str) {
    match representation(symbol) {
        Representation::Dual {
            coin_type,
            metadata_address,
        } => (coin_type, metadata_address),
        other => panic!("{symbol} is not dual-form: {other:?}"),
    }
}

fn object_address(symbol: &str) -> &'static str {
    match representation(symbol) {
        Representation::FungibleObject { metadata_address } => metadata_address,
        other => panic!("{symbol} is not a fungible object: {other:?}"),
    }
}

fn aggregate_type(symbol: &str) -> &'static str {
    match representation(symbol) {
        Representation::FungibleObjectAggregate { asset_type } => asset_type,
        other => panic!("{symbol} is not holder-aggregated: {other:?}"),
    }
}

fn formatted_cents(record: &SupplyRecord) -> u128 {
    let (whole, frac) = record
        .formatted_supply
        .split_once('.')
        .expect("two-decimal format");
    whole.parse::<u128>().expect("whole units") * 100 + frac.parse::<u128>().expect("cents")
}

fn assert_pct(record: &SupplyRecord, expected: f64) {
    let actual = record.percentage.expect("percentage set");
    assert!(
        (actual - expected).abs() < 1e-9,
        "{}: expected {expected}%, got {actual}%",
        record.symbol
    );
}

/// Test that a dual-form coin reports the sum of its legacy counter and
/// its fungible-asset supply, with a missing FA row counting as zero.
#[tokio::test]
async fn test_dual_representation_sums_coin_and_fa_legs() {
    let (sbtc_coin, _) = dual_parts("SBTC");
    let ledger = Arc::new(MemoryLedger {
        coin_info: HashMap::from([(sbtc_coin.to_string(), 74_899_087_500_u128)]),
        ..Default::default()
    });

    let response = BitcoinSupply::new(ledger, &fast_settings()).supplies().await;

    assert!(response.success, "sweep should succeed: {:?}", response.error);
    let sbtc = response.record("SBTC").expect("SBTC record");
    assert_eq!(sbtc.supply, "74899087500");
    assert_eq!(sbtc.formatted_supply, "748.99");
    assert_pct(sbtc, 100.0);
    assert_eq!(response.total_supply, "74899087500");
    assert_eq!(response.total_supply_formatted, "748.99");
    // Los demás wrappers sin datos reportan cero, no faltan.
    assert_eq!(response.supplies.len(), 5);
}

/// Test that a rate-limited wrapper serves its last known supply verbatim
/// instead of retrying or dropping out of the report.
#[tokio::test]
async fn test_rate_limited_wrapper_serves_last_known_supply() {
    let ledger = Arc::new(MemoryLedger {
        rate_limited: HashSet::from([object_address("xBTC").to_string()]),
        ..Default::default()
    });

    let response = BitcoinSupply::new(ledger, &fast_settings()).supplies().await;

    assert!(response.success);
    let xbtc = response.record("xBTC").expect("xBTC record");
    assert_eq!(xbtc.supply, "41956755496");
    assert_eq!(xbtc.formatted_supply, "419.57");
    assert_pct(xbtc, 100.0);
}

/// Test that one unreachable wrapper is skipped while the rest of the
/// class still reports, ordered by supply descending; the surviving dual
/// coin carries the exact sum of both its legs.
#[tokio::test]
async fn test_failed_wrapper_is_skipped_without_failing_the_class() {
    let (sbtc_coin, sbtc_fa) = dual_parts("SBTC");
    let ledger = Arc::new(MemoryLedger {
        coin_info: HashMap::from([(sbtc_coin.to_string(), 3_000_000_000_u128)]),
        metadata: HashMap::from([(sbtc_fa.to_string(), 1_000_000_000_u128)]),
        aggregates: HashMap::from([(aggregate_type("aBTC").to_string(), 100_000_000_000_u128)]),
        unreachable: HashSet::from([object_address("xBTC").to_string()]),
        ..Default::default()
    });

    let response = BitcoinSupply::new(ledger, &fast_settings()).supplies().await;

    assert!(response.success);
    assert!(response.record("xBTC").is_none(), "failed token must be dropped");
    assert_eq!(response.supplies.len(), 4);

    assert_eq!(response.supplies[0].symbol, "SBTC");
    assert_eq!(response.supplies[0].supply, "4000000000");
    assert_eq!(response.supplies[0].formatted_supply, "40.00");
    assert_eq!(response.supplies[1].symbol, "aBTC");
    assert_eq!(response.supplies[1].formatted_supply, "10.00");
    assert_pct(&response.supplies[0], 80.0);
    assert_pct(&response.supplies[1], 20.0);

    for (larger, smaller) in response.supplies.iter().tuple_windows() {
        assert!(
            formatted_cents(larger) >= formatted_cents(smaller),
            "records must be ordered by supply descending"
        );
    }
}

/// Test that a failed refresh first serves the previous response annotated
/// as stale, and only degrades to an empty failure once that is consumed.
#[tokio::test]
async fn test_refresh_failure_serves_stale_then_empty_failure() {
    let (sbtc_coin, _) = dual_parts("SBTC");
    let ledger = Arc::new(MemoryLedger {
        coin_info: HashMap::from([(sbtc_coin.to_string(), 74_899_087_500_u128)]),
        ..Default::default()
    });
    let service = BitcoinSupply::new(ledger.clone(), &fast_settings());

    // La primera pasada llena el caché; después el ledger se cae.
    let fresh = service.supplies().await;
    assert!(fresh.success);
    assert!(fresh.error.is_none());

    ledger.offline.store(true, Ordering::SeqCst);

    let stale = service.supplies().await;
    assert!(stale.success, "stale serve keeps the original success flag");
    assert_eq!(stale.error.as_deref(), Some("Using cached data (stale)"));
    assert_eq!(
        stale.record("SBTC").expect("cached record").supply,
        "74899087500"
    );

    let exhausted = service.supplies().await;
    assert!(!exhausted.success);
    assert!(exhausted.supplies.is_empty());
    assert_eq!(exhausted.total_supply, "0");
    let error = exhausted.error.expect("failure reason");
    assert!(error.contains("fullnode offline"), "unexpected error: {error}");
}

/// Test that USDT reports circulating supply net of the issuer reserve
/// while other stablecoins report their metadata rows as-is.
#[tokio::test]
async fn test_usdt_reports_net_of_issuer_reserve() {
    let ledger = Arc::new(MemoryLedger {
        metadata: HashMap::from([
            (USDT_ASSET_TYPE.to_string(), 1_000_000_000_000_u128),
            (object_address("USDC").to_string(), 500_000_000_000_u128),
        ]),
        reserve: 250_000_000_000,
        ..Default::default()
    });

    let response = StablecoinSupply::new(ledger, &fast_settings()).supplies().await;

    assert!(response.success);
    let usdt = response.record("USDT").expect("USDT record");
    assert_eq!(usdt.supply, "750000000000");
    assert_eq!(usdt.formatted_supply, "750000.00");
    assert_pct(usdt, 60.0);

    let usdc = response.record("USDC").expect("USDC record");
    assert_eq!(usdc.supply, "500000000000");
    assert_pct(usdc, 40.0);

    // Dos filas nativas más los seis puentes en cero.
    assert_eq!(response.supplies.len(), 8);
    assert_eq!(response.total_supply, "1250000000000");
    assert_eq!(response.total_supply_formatted, "1250000.00");
}

/// Test that losing the batched metadata query fails the stablecoin class
/// outright instead of reporting a partial native set.
#[tokio::test]
async fn test_metadata_outage_fails_the_stablecoin_class() {
    let ledger = Arc::new(MemoryLedger {
        unreachable: HashSet::from([USDT_ASSET_TYPE.to_string()]),
        ..Default::default()
    });

    let response = StablecoinSupply::new(ledger, &fast_settings()).supplies().await;

    assert!(!response.success);
    assert!(response.supplies.is_empty());
    assert_eq!(response.total_supply, "0");
    let error = response.error.expect("failure reason");
    assert!(error.contains("connection reset"), "unexpected error: {error}");
}

/// Test that liquid-staking tokens fold into one record per issuing
/// protocol, zero-supply members filtered out, members kept as breakdown.
#[tokio::test]
async fn test_liquid_staking_groups_by_issuing_protocol() {
    let ledger = Arc::new(MemoryLedger {
        aggregates: HashMap::from([
            (aggregate_type("amAPT").to_string(), 100_000_000_u128),
            (aggregate_type("stAPT").to_string(), 200_000_000_u128),
            (aggregate_type("thAPT").to_string(), 300_000_000_u128),
        ]),
        ..Default::default()
    });

    let response = LiquidStakingSupply::new(ledger, &fast_settings()).supplies().await;

    assert!(response.success);
    assert_eq!(response.supplies.len(), 2, "one record per protocol");

    let amnis = &response.supplies[0];
    assert_eq!(amnis.symbol, "amAPT / stAPT");
    assert_eq!(amnis.name.as_deref(), Some("Amnis Liquid Staking"));
    assert_eq!(amnis.protocol.as_deref(), Some("Amnis"));
    assert_eq!(amnis.supply, "300000000");
    assert_eq!(amnis.formatted_supply, "3.00");
    assert_pct(amnis, 50.0);
    let breakdown = amnis.token_breakdown.as_ref().expect("member breakdown");
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].symbol, "amAPT");
    assert_eq!(breakdown[0].formatted_supply, "1.00");
    assert_eq!(breakdown[1].symbol, "stAPT");

    let thala = &response.supplies[1];
    assert_eq!(thala.symbol, "thAPT");
    assert_eq!(thala.protocol.as_deref(), Some("Thala"));
    assert_eq!(thala.formatted_supply, "3.00");
    assert_pct(thala, 50.0);

    assert_eq!(response.total_supply, "600000000");
    assert_eq!(response.total_supply_formatted, "6.00");
}
