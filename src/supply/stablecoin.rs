// src/supply/stablecoin.rs
//
// Circulating-supply service for USD-pegged assets. Native fungible assets
// come from one batched metadata query; bridged wrappers still live on
// legacy coin counters and are read one by one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::error::Result;
use crate::metrics;
use crate::node_client::LedgerQuery;
use crate::resilience::{log_operation, retry_with_backoff, with_timeout, CachedFetcher, RetryPolicy};
use crate::settings::Settings;
use crate::token_registry::{
    Representation, TokenDescriptor, STABLECOIN_TOKENS, TETHER_RESERVE_ADDRESSES, USDT_ASSET_TYPE,
};
use crate::types::{SupplyRecord, SupplyResponse};

use super::{build_response, fetch_raw_supply, record_from_raw};

const CACHE_KEY: &str = "stables:supply";

/// Bridged counters sit on third-party accounts that stall under load.
const BRIDGED_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Aggregates circulating supply across native and bridged stablecoins.
/// USDT is reported net of the issuer's treasury reserve.
pub struct StablecoinSupply {
    client: Arc<dyn LedgerQuery>,
    fetcher: CachedFetcher<SupplyResponse>,
    retry: RetryPolicy,
    ttl: Duration,
    inter_request_delay: Duration,
}

impl StablecoinSupply {
    pub fn new(client: Arc<dyn LedgerQuery>, settings: &Settings) -> Self {
        Self {
            client,
            fetcher: CachedFetcher::new(
                "stablecoin_supply",
                settings.cache.max_entries,
                settings.retry.policy(),
            ),
            retry: settings.retry.policy(),
            ttl: settings.cache.supply_ttl(),
            inter_request_delay: settings.aggregation.inter_request_delay(),
        }
    }

    pub async fn supplies(&self) -> SupplyResponse {
        let client = Arc::clone(&self.client);
        let retry = self.retry.clone();
        let delay = self.inter_request_delay;

        let result = self
            .fetcher
            .get_or_fetch(CACHE_KEY, self.ttl, move || {
                let client = Arc::clone(&client);
                let retry = retry.clone();
                async move { fetch_all(client.as_ref(), &retry, delay).await }
            })
            .await;

        match result {
            Ok(response) => response,
            Err(err) => {
                warn!("⚠️ stablecoin supply refresh failed: {err}");
                match self.fetcher.take_stale(CACHE_KEY) {
                    Some(stale) => stale.annotate_stale(),
                    None => SupplyResponse::failure(err.to_string()),
                }
            }
        }
    }
}

async fn fetch_all(
    client: &dyn LedgerQuery,
    retry: &RetryPolicy,
    delay: Duration,
) -> Result<SupplyResponse> {
    let started = Instant::now();

    // Sin la tabla de metadatos no hay clase que reportar.
    let mut records = match fetch_native_records(client, retry).await {
        Ok(records) => records,
        Err(err) => {
            log_operation("stablecoin_supply_sweep", started, false, "phase=native");
            return Err(err);
        }
    };

    records.extend(fetch_bridged_records(client, delay).await);

    let fetched = records.len();
    let response = build_response(records);
    log_operation(
        "stablecoin_supply_sweep",
        started,
        true,
        &format!("tokens={} fetched={fetched}", STABLECOIN_TOKENS.len()),
    );
    Ok(response)
}

/// Batched metadata read for every native fungible asset, plus the USDT
/// issuer-reserve balance that is subtracted before reporting.
async fn fetch_native_records(
    client: &dyn LedgerQuery,
    retry: &RetryPolicy,
) -> Result<Vec<SupplyRecord>> {
    let native_types: Vec<&str> = STABLECOIN_TOKENS
        .iter()
        .filter_map(|token| match token.representation {
            Representation::LegacyCoinV2 { coin_type } => Some(coin_type),
            Representation::FungibleObject { metadata_address } => Some(metadata_address),
            _ => None,
        })
        .collect();

    let rows = retry_with_backoff(retry, "stablecoin_metadata", || {
        client.fungible_asset_metadata(&native_types)
    })
    .await?;

    let reserve = retry_with_backoff(retry, "usdt_reserve", || {
        client.balances_for_owners(TETHER_RESERVE_ADDRESSES, USDT_ASSET_TYPE)
    })
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(token) = registered_token(&row.asset_type) else {
            warn!("unknown stablecoin asset type: {}", row.asset_type);
            continue;
        };

        let mut supply = row.supply().unwrap_or(0);
        if token.symbol == "USDT" {
            let gross = supply;
            supply = supply.saturating_sub(reserve);
            info!("USDT: Total supply {gross}, Reserve {reserve}, Circulating {supply}");
        }

        records.push(record_from_raw(token, supply));
    }

    Ok(records)
}

/// Sequential legacy-counter reads for the bridged wrappers. A failed or
/// slow coin is skipped; the rest of the class still reports.
async fn fetch_bridged_records(client: &dyn LedgerQuery, delay: Duration) -> Vec<SupplyRecord> {
    let bridged: Vec<&TokenDescriptor> = STABLECOIN_TOKENS
        .iter()
        .filter(|token| matches!(token.representation, Representation::LegacyCoin { .. }))
        .collect();

    let mut records = Vec::with_capacity(bridged.len());
    for (index, token) in bridged.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match with_timeout(BRIDGED_READ_TIMEOUT, fetch_raw_supply(client, token)).await {
            Ok(raw) => records.push(record_from_raw(token, raw)),
            Err(err) => {
                warn!("⚠️ failed to fetch supply for {}: {err}", token.symbol);
                metrics::increment_supply_token_skipped(token.symbol);
            }
        }
    }
    records
}

fn registered_token(asset_type: &str) -> Option<&'static TokenDescriptor> {
    STABLECOIN_TOKENS
        .iter()
        .find(|token| token.matches_identifier(asset_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_filter_covers_fungible_and_migrated_coins() {
        let natives: Vec<&TokenDescriptor> = STABLECOIN_TOKENS
            .iter()
            .filter(|token| {
                matches!(
                    token.representation,
                    Representation::LegacyCoinV2 { .. } | Representation::FungibleObject { .. }
                )
            })
            .collect();
        let symbols: Vec<&str> = natives.iter().map(|t| t.symbol).collect();
        assert!(symbols.contains(&"USDT"));
        assert!(symbols.contains(&"MOD"));
        assert!(!symbols.contains(&"lzUSDC"));
    }

    #[test]
    fn registered_token_resolves_usdt_by_object_address() {
        let token = registered_token(USDT_ASSET_TYPE).expect("USDT registered");
        assert_eq!(token.symbol, "USDT");
        assert_eq!(token.decimals, 6);
    }
}
