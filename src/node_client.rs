// src/node_client.rs

use crate::error::{AssetError, Result};
use crate::metrics;
use crate::settings::NodeSettings;
use crate::types::resources::parse_u128;
use crate::types::{AccountAddress, AccountResource, FungibleAssetMetadata};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

type DefaultDirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Aptos mainnet fullnode REST base.
pub const MAINNET_REST_URL: &str = "https://api.mainnet.aptoslabs.com/v1";
/// Aptos mainnet indexer GraphQL endpoint.
pub const MAINNET_INDEXER_URL: &str = "https://api.mainnet.aptoslabs.com/v1/graphql";

const ERROR_BODY_LIMIT: usize = 300;

/// Read access to the ledger, as the aggregators consume it.
///
/// `NodeClient` is the production implementation; tests substitute an
/// in-memory ledger behind the same trait.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Single resource read by account + fully qualified type. `Ok(None)`
    /// when the account does not hold one (HTTP 404).
    async fn account_resource(&self, account: &str, resource_type: &str)
        -> Result<Option<Value>>;

    /// Full resource listing for one account.
    async fn account_resources(&self, address: &AccountAddress) -> Result<Vec<AccountResource>>;

    /// Batched metadata rows for a set of fungible asset types.
    async fn fungible_asset_metadata(
        &self,
        asset_types: &[&str],
    ) -> Result<Vec<FungibleAssetMetadata>>;

    /// Sum of all current holder balances for one asset type. `Ok(None)`
    /// when the indexer reports no aggregate (asset has no holders yet).
    async fn aggregate_balance(&self, asset_type: &str) -> Result<Option<u128>>;

    /// Summed balance of one asset type across a fixed set of owner
    /// accounts (issuer reserve lookups).
    async fn balances_for_owners(&self, owners: &[&str], asset_type: &str) -> Result<u128>;
}

/// HTTP client for the Aptos fullnode REST API and indexer GraphQL API.
///
/// One shared `reqwest::Client`; every request is paced by an optional
/// direct rate limiter and carries the bearer credential when configured.
pub struct NodeClient {
    http: reqwest::Client,
    rest_url: String,
    indexer_url: String,
    api_key: Option<String>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl NodeClient {
    pub fn new(settings: &NodeSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .map_err(|e| AssetError::Transport(format!("failed to build http client: {e}")))?;

        // Limiter global opcional; sin qps_limit cada request sale directo.
        let limiter = settings
            .qps_limit
            .and_then(NonZeroU32::new)
            .map(|qps| Arc::new(RateLimiter::direct(Quota::per_second(qps))));

        Ok(Self {
            http,
            rest_url: settings.rest_url.trim_end_matches('/').to_string(),
            indexer_url: settings.indexer_url.clone(),
            api_key: settings.api_key.clone(),
            limiter,
        })
    }

    async fn pace(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// GET against the fullnode. Maps 429 before anyone looks at the body;
    /// other statuses are left to the caller.
    async fn send_rest(&self, label: &str, url: &str) -> Result<reqwest::Response> {
        self.pace().await;
        let started = Instant::now();
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        metrics::record_upstream_request(label, started.elapsed());
        debug!(
            "{label}: {} in {}ms",
            response.status(),
            started.elapsed().as_millis()
        );

        if response.status().as_u16() == 429 {
            metrics::increment_upstream_429(label);
            return Err(AssetError::RateLimited(format!(
                "{label}: fullnode returned 429"
            )));
        }
        Ok(response)
    }

    /// POST one GraphQL document to the indexer and return its `data`.
    async fn graphql(&self, label: &str, query: String) -> Result<Value> {
        self.pace().await;
        let started = Instant::now();
        let mut request = self.http.post(&self.indexer_url).json(&json!({ "query": query }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        metrics::record_upstream_request(label, started.elapsed());
        debug!(
            "{label}: {} in {}ms",
            response.status(),
            started.elapsed().as_millis()
        );

        let status = response.status();
        if status.as_u16() == 429 {
            metrics::increment_upstream_429(label);
            return Err(AssetError::RateLimited(format!(
                "{label}: indexer returned 429"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::increment_upstream_error(label);
            return Err(AssetError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AssetError::Malformed(format!("{label}: invalid indexer JSON: {e}")))?;

        // GraphQL entrega errores con status 200; hay que mirar el array.
        if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                metrics::increment_upstream_error(label);
                let text = serde_json::to_string(errors).unwrap_or_default();
                let lowered = text.to_lowercase();
                if lowered.contains("429") || lowered.contains("rate limit") {
                    return Err(AssetError::RateLimited(format!("{label}: {}", truncate_body(&text))));
                }
                return Err(AssetError::Malformed(format!(
                    "{label}: indexer errors: {}",
                    truncate_body(&text)
                )));
            }
        }

        payload
            .get("data")
            .cloned()
            .ok_or_else(|| AssetError::Malformed(format!("{label}: indexer response missing data")))
    }
}

#[async_trait]
impl LedgerQuery for NodeClient {
    async fn account_resource(
        &self,
        account: &str,
        resource_type: &str,
    ) -> Result<Option<Value>> {
        let label = "account_resource";
        let url = format!(
            "{}/accounts/{}/resource/{}",
            self.rest_url,
            account,
            urlencoding::encode(resource_type)
        );
        let response = self.send_rest(label, &url).await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::increment_upstream_error(label);
            return Err(AssetError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let value = response
            .json()
            .await
            .map_err(|e| AssetError::Malformed(format!("{label}: invalid resource JSON: {e}")))?;
        Ok(Some(value))
    }

    async fn account_resources(&self, address: &AccountAddress) -> Result<Vec<AccountResource>> {
        let label = "account_resources";
        let url = format!("{}/accounts/{}/resources", self.rest_url, address);
        let response = self.send_rest(label, &url).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::increment_upstream_error(label);
            return Err(AssetError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        response
            .json()
            .await
            .map_err(|e| AssetError::Malformed(format!("{label}: invalid listing JSON: {e}")))
    }

    async fn fungible_asset_metadata(
        &self,
        asset_types: &[&str],
    ) -> Result<Vec<FungibleAssetMetadata>> {
        let data = self
            .graphql("fungible_asset_metadata", metadata_query(asset_types)?)
            .await?;
        let rows = data
            .get("fungible_asset_metadata")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(rows).map_err(|e| {
            AssetError::Malformed(format!("fungible_asset_metadata: unexpected row shape: {e}"))
        })
    }

    async fn aggregate_balance(&self, asset_type: &str) -> Result<Option<u128>> {
        let data = self
            .graphql("aggregate_balance", aggregate_query(asset_type))
            .await?;
        Ok(data
            .pointer("/current_fungible_asset_balances_aggregate/aggregate/sum/amount")
            .and_then(parse_u128))
    }

    async fn balances_for_owners(&self, owners: &[&str], asset_type: &str) -> Result<u128> {
        let data = self
            .graphql("owner_balances", owner_balances_query(owners, asset_type)?)
            .await?;
        let rows = data
            .get("current_fungible_asset_balances")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let balances: Vec<crate::types::FungibleAssetBalance> = serde_json::from_value(rows)
            .map_err(|e| {
                AssetError::Malformed(format!("owner_balances: unexpected row shape: {e}"))
            })?;
        Ok(balances.iter().map(|b| b.amount()).sum())
    }
}

fn metadata_query(asset_types: &[&str]) -> Result<String> {
    let types = serde_json::to_string(asset_types)
        .map_err(|e| AssetError::Malformed(format!("asset type list: {e}")))?;
    Ok(format!(
        "query AssetMetadata {{\n  fungible_asset_metadata(where: {{asset_type: {{_in: {types}}}}}) {{\n    asset_type\n    supply_v2\n    decimals\n    symbol\n    name\n  }}\n}}"
    ))
}

fn aggregate_query(asset_type: &str) -> String {
    format!(
        "query AggregateBalance {{\n  current_fungible_asset_balances_aggregate(where: {{asset_type: {{_eq: \"{asset_type}\"}}}}) {{\n    aggregate {{ sum {{ amount }} }}\n  }}\n}}"
    )
}

fn owner_balances_query(owners: &[&str], asset_type: &str) -> Result<String> {
    let owners = serde_json::to_string(owners)
        .map_err(|e| AssetError::Malformed(format!("owner list: {e}")))?;
    Ok(format!(
        "query OwnerBalances {{\n  current_fungible_asset_balances(where: {{owner_address: {{_in: {owners}}}, asset_type: {{_eq: \"{asset_type}\"}}}}) {{\n    amount\n    owner_address\n  }}\n}}"
    ))
}

fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut cut = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &body[..cut])
}
