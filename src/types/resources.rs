// src/types/resources.rs
//
// Wire shapes for fullnode and indexer payloads, plus the tolerant
// extraction helpers that turn heterogeneous JSON into typed values.
// Extraction returns Option instead of erroring: an unexpected shape is
// "no data" to the aggregation layer, never a crash.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a fullnode `/accounts/{addr}/resources` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub data: Value,
}

/// One row of the indexer `fungible_asset_metadata` table.
///
/// `supply_v2` arrives as a string for most assets but has been observed
/// as a plain JSON number on older rows, so it is kept raw and parsed
/// through [`FungibleAssetMetadata::supply`].
#[derive(Debug, Clone, Deserialize)]
pub struct FungibleAssetMetadata {
    pub asset_type: String,
    #[serde(default)]
    pub supply_v2: Option<Value>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl FungibleAssetMetadata {
    pub fn supply(&self) -> Option<u128> {
        self.supply_v2.as_ref().and_then(parse_u128)
    }
}

/// One row of `current_fungible_asset_balances`. Queries select only the
/// columns they need, so every field tolerates absence.
#[derive(Debug, Clone, Deserialize)]
pub struct FungibleAssetBalance {
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub owner_address: String,
    #[serde(default)]
    pub amount: Option<Value>,
}

impl FungibleAssetBalance {
    pub fn amount(&self) -> u128 {
        self.amount.as_ref().and_then(parse_u128).unwrap_or(0)
    }
}

/// Accepts the two integer encodings the APIs produce: decimal strings
/// (the common case, values exceed f64-safe range) and raw JSON numbers.
pub fn parse_u128(value: &Value) -> Option<u128> {
    match value {
        Value::String(s) => s.trim().parse::<u128>().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    }
}

/// Pulls the supply counter out of a `0x1::coin::CoinInfo<T>` resource.
///
/// The payload shape differs by framework era; the probe order matches
/// what mainnet actually serves:
/// 1. optional-aggregator integer: `data.supply.vec[0].integer.vec[0].value`
/// 2. plain field: `data.supply`
/// 3. legacy top-level: `supply`
pub fn extract_coin_info_supply(resource: &Value) -> Option<u128> {
    if let Some(value) = resource
        .pointer("/data/supply/vec/0/integer/vec/0/value")
        .and_then(parse_u128)
    {
        return Some(value);
    }
    if let Some(value) = resource.pointer("/data/supply").and_then(parse_u128) {
        return Some(value);
    }
    resource.pointer("/supply").and_then(parse_u128)
}

/// Balance of a `0x1::coin::CoinStore<T>` resource; missing or malformed
/// payloads read as zero.
pub fn extract_coin_store_balance(data: &Value) -> u128 {
    data.pointer("/coin/value")
        .and_then(parse_u128)
        .unwrap_or(0)
}
