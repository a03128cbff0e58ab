// src/supply/mod.rs
//
// Per-asset-class supply aggregation. Each service walks its descriptor
// table, dispatches the representation-specific upstream read, absorbs
// per-token failures, and folds the survivors into a SupplyResponse.

pub mod bitcoin;
pub mod liquid_staking;
pub mod rwa;
pub mod stablecoin;

pub use bitcoin::BitcoinSupply;
pub use liquid_staking::LiquidStakingSupply;
pub use rwa::{RwaAsset, RwaRegistry, RwaResponse};
pub use stablecoin::StablecoinSupply;

use chrono::Utc;
use log::{debug, info};

use crate::error::Result;
use crate::node_client::LedgerQuery;
use crate::token_registry::{Representation, TokenDescriptor};
use crate::types::resources::extract_coin_info_supply;
use crate::types::{SupplyRecord, SupplyResponse};

/// Reads one token's raw supply from the source its representation
/// prescribes. Representation-internal "no data" shapes (missing resource,
/// absent metadata row, empty aggregate) count as zero; transport and
/// status failures propagate to the caller's retry/skip policy.
pub(crate) async fn fetch_raw_supply(
    client: &dyn LedgerQuery,
    token: &TokenDescriptor,
) -> Result<u128> {
    match token.representation {
        Representation::LegacyCoin { coin_type } => coin_info_supply(client, coin_type).await,
        Representation::LegacyCoinV2 { coin_type } => metadata_supply(client, coin_type).await,
        Representation::FungibleObject { metadata_address } => {
            metadata_supply(client, metadata_address).await
        }
        Representation::FungibleObjectAggregate { asset_type } => {
            Ok(client.aggregate_balance(asset_type).await?.unwrap_or(0))
        }
        Representation::Dual {
            coin_type,
            metadata_address,
        } => {
            // Cada pata tolera su propia falla; un 429 sí corta, porque la
            // sustitución por valor conocido se decide por token entero.
            let coin = match coin_info_supply(client, coin_type).await {
                Ok(value) => value,
                Err(err) if err.is_rate_limited() => return Err(err),
                Err(err) => {
                    debug!("no coin supply for {}: {err}", token.symbol);
                    0
                }
            };
            let fungible = match metadata_supply(client, metadata_address).await {
                Ok(value) => value,
                Err(err) if err.is_rate_limited() => return Err(err),
                Err(err) => {
                    debug!("no fungible supply for {}: {err}", token.symbol);
                    0
                }
            };
            let total = coin + fungible;
            info!(
                "{} total: coin={coin}, fa={fungible}, total={total}",
                token.symbol
            );
            Ok(total)
        }
    }
}

/// Ledger-wide counter from `0x1::coin::CoinInfo<T>`, read at the coin's
/// origin account (the first `::` segment of the type string).
async fn coin_info_supply(client: &dyn LedgerQuery, coin_type: &str) -> Result<u128> {
    let origin = coin_type.split("::").next().unwrap_or(coin_type);
    let resource_type = format!("0x1::coin::CoinInfo<{coin_type}>");
    match client.account_resource(origin, &resource_type).await? {
        Some(resource) => Ok(extract_coin_info_supply(&resource).unwrap_or(0)),
        None => {
            debug!("{coin_type}: no CoinInfo resource at {origin}");
            Ok(0)
        }
    }
}

/// Running total from the indexer metadata row for one asset type.
async fn metadata_supply(client: &dyn LedgerQuery, asset_type: &str) -> Result<u128> {
    let rows = client.fungible_asset_metadata(&[asset_type]).await?;
    Ok(rows.first().and_then(|row| row.supply()).unwrap_or(0))
}

/// Two-decimal fixed-point value of `raw` base units, rounded half up.
pub(crate) fn to_cents(raw: u128, decimals: u8) -> u128 {
    let divisor = 10u128.pow(u32::from(decimals));
    (raw * 100 + divisor / 2) / divisor
}

/// Renders a cent count as `"x.yy"`.
pub(crate) fn format_units(cents: u128) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Exact inverse of [`format_units`] for strings this module produced.
pub(crate) fn cents_from_formatted(formatted: &str) -> u128 {
    let (whole, frac) = match formatted.split_once('.') {
        Some(parts) => parts,
        None => (formatted, ""),
    };
    let whole: u128 = whole.parse().unwrap_or(0);
    let mut digits = frac.chars().filter_map(|c| c.to_digit(10).map(u128::from));
    let tens = digits.next().unwrap_or(0);
    let units = digits.next().unwrap_or(0);
    whole * 100 + tens * 10 + units
}

/// Display form of one raw amount.
pub(crate) fn format_raw(raw: u128, decimals: u8) -> String {
    format_units(to_cents(raw, decimals))
}

pub(crate) fn record_from_raw(token: &TokenDescriptor, raw: u128) -> SupplyRecord {
    SupplyRecord::new(
        token.symbol,
        raw.to_string(),
        format_raw(raw, token.decimals),
        token.decimals,
    )
}

/// Folds per-token records into the class response: raw total, formatted
/// total, per-record share of the formatted total, ordered largest first.
pub(crate) fn build_response(mut records: Vec<SupplyRecord>) -> SupplyResponse {
    let total_raw: u128 = records
        .iter()
        .filter_map(|record| record.supply.parse::<u128>().ok())
        .sum();
    let total_cents: u128 = records
        .iter()
        .map(|record| cents_from_formatted(&record.formatted_supply))
        .sum();

    for record in &mut records {
        let cents = cents_from_formatted(&record.formatted_supply);
        record.percentage = Some(if total_cents > 0 {
            cents as f64 / total_cents as f64 * 100.0
        } else {
            0.0
        });
    }

    records.sort_by(|a, b| {
        cents_from_formatted(&b.formatted_supply).cmp(&cents_from_formatted(&a.formatted_supply))
    });

    SupplyResponse {
        success: true,
        total_supply: total_raw.to_string(),
        total_supply_formatted: format_units(total_cents),
        supplies: records,
        timestamp: Utc::now(),
        error: None,
    }
}
