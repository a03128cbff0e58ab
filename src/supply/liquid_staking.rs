// src/supply/liquid_staking.rs
//
// Supply service for liquid-staking tokens, reported per protocol. None of
// these assets maintains a supply counter, so every read is a holder-balance
// aggregate, paced in small batches against the indexer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use indexmap::IndexMap;
use log::{info, warn};

use crate::error::Result;
use crate::metrics;
use crate::node_client::LedgerQuery;
use crate::resilience::{log_operation, retry_with_backoff, CachedFetcher, RetryPolicy};
use crate::settings::Settings;
use crate::token_registry::{TokenDescriptor, LST_TOKENS};
use crate::types::{SupplyRecord, SupplyResponse, TokenShare};

use super::{build_response, cents_from_formatted, fetch_raw_supply, format_units, record_from_raw};

const CACHE_KEY: &str = "lst:supply";

/// Aggregates liquid-staking token supply and reports one record per
/// issuing protocol, each carrying its per-token breakdown.
pub struct LiquidStakingSupply {
    client: Arc<dyn LedgerQuery>,
    fetcher: CachedFetcher<SupplyResponse>,
    retry: RetryPolicy,
    ttl: Duration,
    batch_size: usize,
    batch_delay: Duration,
}

impl LiquidStakingSupply {
    pub fn new(client: Arc<dyn LedgerQuery>, settings: &Settings) -> Self {
        Self {
            client,
            fetcher: CachedFetcher::new(
                "lst_supply",
                settings.cache.max_entries,
                settings.retry.policy(),
            ),
            retry: settings.retry.policy(),
            ttl: settings.cache.supply_ttl(),
            batch_size: settings.aggregation.batch_size.max(1),
            batch_delay: settings.aggregation.batch_delay(),
        }
    }

    pub async fn supplies(&self) -> SupplyResponse {
        let client = Arc::clone(&self.client);
        let retry = self.retry.clone();
        let batch_size = self.batch_size;
        let batch_delay = self.batch_delay;

        let result = self
            .fetcher
            .get_or_fetch(CACHE_KEY, self.ttl, move || {
                let client = Arc::clone(&client);
                let retry = retry.clone();
                async move { fetch_all(client.as_ref(), &retry, batch_size, batch_delay).await }
            })
            .await;

        match result {
            Ok(response) => response,
            Err(err) => {
                warn!("⚠️ liquid staking supply refresh failed: {err}");
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
    batch_size: usize,
    batch_delay: Duration,
) -> Result<SupplyResponse> {
    let started = Instant::now();
    let mut fetched = Vec::with_capacity(LST_TOKENS.len());
    let mut rate_limit_error = None;

    for (batch_index, batch) in LST_TOKENS.chunks(batch_size).enumerate() {
        if batch_index > 0 && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }
        let outcomes =
            join_all(batch.iter().map(|token| collect_token(client, retry, token))).await;
        for outcome in outcomes {
            match outcome {
                Ok(record) => fetched.push(record),
                Err(err) if err.is_rate_limited() => rate_limit_error = Some(err),
                Err(_) => {}
            }
        }
    }

    info!(
        "fetched {}/{} LST supplies in {}ms",
        fetched.len(),
        LST_TOKENS.len(),
        started.elapsed().as_millis()
    );

    // La clase entera solo falla cuando nada pasó y hubo 429 de por medio.
    if fetched.is_empty() {
        if let Some(err) = rate_limit_error {
            log_operation(
                "lst_supply_sweep",
                started,
                false,
                &format!("tokens={} fetched=0", LST_TOKENS.len()),
            );
            return Err(err);
        }
    }

    let response = group_by_protocol(fetched);
    log_operation(
        "lst_supply_sweep",
        started,
        true,
        &format!("tokens={} groups={}", LST_TOKENS.len(), response.supplies.len()),
    );
    Ok(response)
}

async fn collect_token(
    client: &dyn LedgerQuery,
    retry: &RetryPolicy,
    token: &TokenDescriptor,
) -> Result<SupplyRecord> {
    match retry_with_backoff(retry, token.symbol, || fetch_raw_supply(client, token)).await {
        Ok(raw) => {
            if raw == 0 {
                info!("token {} has zero supply", token.symbol);
            }
            let mut record = record_from_raw(token, raw);
            record.name = Some(token.name.to_string());
            record.protocol = Some(token.protocol.to_string());
            Ok(record)
        }
        Err(err) => {
            warn!("⚠️ failed to fetch {} supply: {err}", token.symbol);
            metrics::increment_supply_token_skipped(token.symbol);
            Err(err)
        }
    }
}

/// Drops zero-supply tokens, then folds the rest into one record per
/// protocol: display symbol lists the member symbols, supply fields carry
/// the member sums, and the members survive as the token breakdown.
fn group_by_protocol(records: Vec<SupplyRecord>) -> SupplyResponse {
    let total = records.len();
    let active: Vec<SupplyRecord> = records
        .into_iter()
        .filter(|record| cents_from_formatted(&record.formatted_supply) > 0)
        .collect();
    info!("filtered to {} active LSTs out of {total} total", active.len());

    struct Group {
        raw: u128,
        cents: u128,
        members: Vec<TokenShare>,
    }

    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for record in active {
        let protocol = record
            .protocol
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        let entry = groups.entry(protocol).or_insert_with(|| Group {
            raw: 0,
            cents: 0,
            members: Vec::new(),
        });
        entry.raw += record.supply.parse::<u128>().unwrap_or(0);
        entry.cents += cents_from_formatted(&record.formatted_supply);
        entry.members.push(TokenShare {
            symbol: record.symbol,
            supply: record.supply,
            formatted_supply: record.formatted_supply,
        });
    }

    let grouped = groups
        .into_iter()
        .map(|(protocol, group)| {
            let mut symbols: Vec<&str> =
                group.members.iter().map(|m| m.symbol.as_str()).collect();
            symbols.sort_unstable();
            let symbol = symbols.join(" / ");
            SupplyRecord {
                symbol,
                name: Some(format!("{protocol} Liquid Staking")),
                supply: group.raw.to_string(),
                formatted_supply: format_units(group.cents),
                decimals: 8,
                protocol: Some(protocol),
                percentage: None,
                token_breakdown: Some(group.members),
            }
        })
        .collect();

    build_response(grouped)
}
