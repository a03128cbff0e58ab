// src/supply/bitcoin.rs
//
// Circulating-supply service for the tracked BTC wrappers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;

use crate::error::{AssetError, Result};
use crate::metrics;
use crate::node_client::LedgerQuery;
use crate::resilience::{log_operation, retry_with_backoff, CachedFetcher, RetryPolicy};
use crate::settings::Settings;
use crate::token_registry::{TokenDescriptor, BTC_TOKENS};
use crate::types::{SupplyRecord, SupplyResponse};

use super::{build_response, fetch_raw_supply, record_from_raw};

const CACHE_KEY: &str = "btc:supply";

/// Aggregates circulating supply across every tracked Bitcoin wrapper.
pub struct BitcoinSupply {
    client: Arc<dyn LedgerQuery>,
    fetcher: CachedFetcher<SupplyResponse>,
    retry: RetryPolicy,
    ttl: Duration,
    inter_request_delay: Duration,
}

impl BitcoinSupply {
    pub fn new(client: Arc<dyn LedgerQuery>, settings: &Settings) -> Self {
        Self {
            client,
            fetcher: CachedFetcher::new(
                "btc_supply",
                settings.cache.max_entries,
                settings.retry.policy(),
            ),
            retry: settings.retry.policy(),
            ttl: settings.cache.supply_ttl(),
            inter_request_delay: settings.aggregation.inter_request_delay(),
        }
    }

    /// Per-wrapper supplies with class totals and percentages. Serves the
    /// cached response while fresh; a failed refresh falls back to the stale
    /// entry, then to an empty failure response.
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
                warn!("⚠️ BTC supply refresh failed: {err}");
                match self.fetcher.take_stale(CACHE_KEY) {
                    Some(stale) => stale.annotate_stale(),
                    None => SupplyResponse::failure(err.to_string()),
                }
            }
        }
    }
}

/// One sweep over the wrapper table, sequential with pacing between tokens.
/// Individual failures drop that token; the sweep fails as a whole only
/// when no token produced a record.
async fn fetch_all(
    client: &dyn LedgerQuery,
    retry: &RetryPolicy,
    delay: Duration,
) -> Result<SupplyResponse> {
    let started = Instant::now();
    let mut records = Vec::with_capacity(BTC_TOKENS.len());
    let mut last_error = None;

    for (index, token) in BTC_TOKENS.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match collect_token(client, retry, token).await {
            Ok(record) => records.push(record),
            Err(err) => last_error = Some(err),
        }
    }

    if records.is_empty() {
        if let Some(err) = last_error {
            log_operation(
                "btc_supply_sweep",
                started,
                false,
                &format!("tokens={} fetched=0", BTC_TOKENS.len()),
            );
            return Err(err);
        }
    }

    let fetched = records.len();
    let response = build_response(records);
    log_operation(
        "btc_supply_sweep",
        started,
        true,
        &format!("tokens={} fetched={fetched}", BTC_TOKENS.len()),
    );
    Ok(response)
}

/// One token under the class retry schedule. A rate limit substitutes the
/// descriptor's last known supply immediately, without retrying.
async fn collect_token(
    client: &dyn LedgerQuery,
    retry: &RetryPolicy,
    token: &TokenDescriptor,
) -> Result<SupplyRecord> {
    match retry_with_backoff(retry, token.symbol, || fetch_raw_supply(client, token)).await {
        Ok(raw) => Ok(record_from_raw(token, raw)),
        Err(err) if err.is_rate_limited() => fallback_record(token, err),
        Err(err) => {
            warn!("⚠️ failed to fetch {} supply: {err}", token.symbol);
            metrics::increment_supply_token_skipped(token.symbol);
            Err(err)
        }
    }
}

fn fallback_record(token: &TokenDescriptor, err: AssetError) -> Result<SupplyRecord> {
    match token.rate_limit_fallback {
        Some(fallback) => {
            warn!(
                "⚠️ {} rate limited upstream, using last known supply {fallback}",
                token.symbol
            );
            metrics::increment_fallback_value(token.symbol);
            let raw = fallback.parse().unwrap_or(0);
            Ok(record_from_raw(token, raw))
        }
        None => {
            warn!(
                "⚠️ {} rate limited upstream and no fallback supply on record",
                token.symbol
            );
            metrics::increment_supply_token_skipped(token.symbol);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(symbol: &'static str) -> &'static TokenDescriptor {
        BTC_TOKENS
            .iter()
            .find(|t| t.symbol == symbol)
            .unwrap_or_else(|| panic!("{symbol} missing from table"))
    }

    #[test]
    fn rate_limited_token_with_fallback_keeps_its_recorded_supply() {
        let xbtc = descriptor("xBTC");
        let record =
            fallback_record(xbtc, AssetError::RateLimited("429".into())).expect("fallback");
        assert_eq!(record.supply, "41956755496");
        assert_eq!(record.symbol, "xBTC");
    }

    #[test]
    fn rate_limited_token_without_fallback_is_dropped() {
        let sbtc = descriptor("SBTC");
        let result = fallback_record(sbtc, AssetError::RateLimited("429".into()));
        assert!(matches!(result, Err(AssetError::RateLimited(_))));
    }
}
