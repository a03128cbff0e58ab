// src/supply/rwa.rs
//
// Tokenized real-world asset listings from the RWA.xyz registry. Unlike the
// on-chain classes this one rides an external HTTP API, so a circuit breaker
// sits in front of the shared cache/retry pipeline and the TTL runs a full
// day: issuance values move slowly and the registry rate-limits hard.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AssetError, Result};
use crate::metrics;
use crate::resilience::{log_operation, CachedFetcher, CircuitBreaker};
use crate::settings::Settings;

const CACHE_KEY: &str = "rwa:aptos:data";
const DATA_SOURCE: &str = "RWA.xyz API";
const BREAKER_OPEN_ERROR: &str = "Circuit breaker is open - too many recent failures";
/// Registry responses are slow but bounded; anything past this is a stall.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_SIZE: u32 = 100;

/// One tokenized real-world asset listed on the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RwaAsset {
    pub id: String,
    pub name: String,
    /// Dollar value of the issuance backing this token.
    pub total_value: f64,
    pub description: String,
    pub token_address: String,
    pub asset_ticker: String,
    pub asset_class: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RwaResponse {
    pub success: bool,
    pub total_value: f64,
    pub total_value_formatted: String,
    pub asset_count: usize,
    pub assets: Vec<RwaAsset>,
    pub timestamp: DateTime<Utc>,
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RwaResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            total_value: 0.0,
            total_value_formatted: "$0.0M".to_string(),
            asset_count: 0,
            assets: Vec::new(),
            timestamp: Utc::now(),
            data_source: "Error - RWA.xyz API unavailable".to_string(),
            error: Some(error.into()),
        }
    }

    /// Re-labels a previously cached snapshot served after a failed refresh.
    pub fn annotate_stale(mut self) -> Self {
        self.data_source = format!("{DATA_SOURCE} (cached - stale)");
        self
    }
}

/// Registry client for real-world asset listings.
///
/// Serves snapshots cache-first; a refresh hits the `/tokens` and `/assets`
/// endpoints in parallel, joins them and drops stablecoin entries that the
/// dedicated stablecoin class already covers. While the breaker is open every
/// refresh short-circuits to the stale/fallback path without touching the
/// network.
pub struct RwaRegistry {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    network_id: u32,
    fetcher: CachedFetcher<RwaResponse>,
    breaker: Arc<CircuitBreaker>,
    ttl: Duration,
}

impl RwaRegistry {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AssetError::Transport(format!("failed to build http client: {e}")))?;

        if settings.rwa.api_key.is_none() {
            warn!("RWA API key not configured, registry calls may be rejected");
        }

        Ok(Self {
            http,
            api_url: settings.rwa.api_url.trim_end_matches('/').to_string(),
            api_key: settings.rwa.api_key.clone(),
            network_id: settings.rwa.network_id,
            fetcher: CachedFetcher::new(
                "rwa_registry",
                settings.cache.max_entries,
                settings.retry.policy(),
            ),
            breaker: Arc::new(CircuitBreaker::new(
                "rwa_registry",
                settings.circuit_breaker.failure_threshold,
                settings.circuit_breaker.cooldown(),
            )),
            ttl: settings.cache.rwa_ttl(),
        })
    }

    /// Current registry snapshot, cache-first.
    pub async fn snapshot(&self) -> RwaResponse {
        let http = self.http.clone();
        let api_url = self.api_url.clone();
        let api_key = self.api_key.clone();
        let network_id = self.network_id;
        let breaker = Arc::clone(&self.breaker);

        let result = self
            .fetcher
            .get_or_fetch(CACHE_KEY, self.ttl, move || {
                let http = http.clone();
                let api_url = api_url.clone();
                let api_key = api_key.clone();
                let breaker = Arc::clone(&breaker);
                async move {
                    if breaker.is_open() {
                        return Err(AssetError::Validation(BREAKER_OPEN_ERROR.to_string()));
                    }
                    let snapshot =
                        fetch_snapshot(&http, &api_url, api_key.as_deref(), network_id).await?;
                    breaker.record_success();
                    Ok(snapshot)
                }
            })
            .await;

        match result {
            Ok(response) => response,
            Err(err) => {
                // Un corte del breaker no cuenta como falla nueva.
                let short_circuited = self.breaker.is_open();
                if short_circuited {
                    warn!("⚠️ RWA circuit breaker is open, returning fallback");
                } else {
                    self.breaker.record_failure();
                    warn!("⚠️ RWA registry refresh failed: {err}");
                }
                match self.fetcher.take_stale(CACHE_KEY) {
                    Some(previous) => previous.annotate_stale(),
                    None if short_circuited => RwaResponse::failure(BREAKER_OPEN_ERROR),
                    None => RwaResponse::failure(err.to_string()),
                }
            }
        }
    }
}

async fn fetch_snapshot(
    http: &reqwest::Client,
    api_url: &str,
    api_key: Option<&str>,
    network_id: u32,
) -> Result<RwaResponse> {
    let started = Instant::now();
    let tokens_url = listing_url(
        api_url,
        "tokens",
        &listing_query("network_id", "equals", network_id),
    );
    let assets_url = listing_url(
        api_url,
        "assets",
        &listing_query("network_ids", "includes", network_id),
    );

    let pages = tokio::try_join!(
        fetch_page::<TokenListing>(http, &tokens_url, api_key, "rwa_tokens"),
        fetch_page::<AssetListing>(http, &assets_url, api_key, "rwa_assets"),
    );
    let (tokens, assets) = match pages {
        Ok(pages) => pages,
        Err(err) => {
            log_operation("rwa_snapshot", started, false, "");
            return Err(err);
        }
    };

    let assets = process_listings(tokens, assets);
    let asset_count = assets.len();
    let total_value: f64 = assets.iter().map(|asset| asset.total_value).sum();
    log_operation(
        "rwa_snapshot",
        started,
        true,
        &format!("assets={asset_count}"),
    );

    Ok(RwaResponse {
        success: true,
        total_value,
        total_value_formatted: format_millions(total_value),
        asset_count,
        assets,
        timestamp: Utc::now(),
        data_source: DATA_SOURCE.to_string(),
        error: None,
    })
}

async fn fetch_page<T: DeserializeOwned + Default>(
    http: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    label: &str,
) -> Result<Vec<T>> {
    let started = Instant::now();
    let mut request = http.get(url).header("accept", "application/json");
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    let response = request.send().await?;
    metrics::record_upstream_request(label, started.elapsed());

    let status = response.status();
    if status.as_u16() == 429 {
        metrics::increment_upstream_429(label);
        return Err(AssetError::RateLimited(format!(
            "{label}: registry returned 429"
        )));
    }
    if !status.is_success() {
        metrics::increment_upstream_error(label);
        return Err(AssetError::Status {
            status: status.as_u16(),
            body: format!("RWA API error on {label}"),
        });
    }

    let listing: Listing<T> = response
        .json()
        .await
        .map_err(|e| AssetError::Malformed(format!("{label}: invalid registry JSON: {e}")))?;
    Ok(listing.results)
}

// El registro espera el filtro JSON completo URL-encodeado en `query`.
fn listing_query(field: &str, operator: &str, network_id: u32) -> String {
    json!({
        "pagination": { "page": 1, "perPage": PAGE_SIZE },
        "filter": {
            "operator": "and",
            "filters": [{ "field": field, "operator": operator, "value": network_id }],
        },
    })
    .to_string()
}

fn listing_url(api_url: &str, path: &str, query: &str) -> String {
    format!("{api_url}/{path}?query={}", urlencoding::encode(query))
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(default)]
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenListing {
    asset_id: i64,
    #[serde(default)]
    address: String,
    #[serde(default)]
    total_asset_value_dollar: Option<DollarValue>,
    #[serde(default)]
    asset: Option<ListedTicker>,
}

#[derive(Debug, Deserialize)]
struct DollarValue {
    #[serde(default)]
    val: f64,
}

#[derive(Debug, Deserialize)]
struct ListedTicker {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ticker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetListing {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    asset_class: Option<AssetClass>,
    #[serde(default)]
    issuer: Option<String>,
}

// The registry sends the class either as a bare label or as an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssetClass {
    Label(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        slug: Option<String>,
    },
}

/// Joins token listings against their asset records, drops entries with no
/// reported value and stablecoins, and sorts by dollar value descending.
fn process_listings(tokens: Vec<TokenListing>, assets: Vec<AssetListing>) -> Vec<RwaAsset> {
    let asset_map: HashMap<i64, AssetListing> =
        assets.into_iter().map(|asset| (asset.id, asset)).collect();

    let mut listings = Vec::new();
    for token in tokens {
        let value = token
            .total_asset_value_dollar
            .as_ref()
            .map(|dollar| dollar.val)
            .unwrap_or(0.0);
        if value <= 0.0 {
            continue;
        }
        let Some(asset) = asset_map.get(&token.asset_id) else {
            continue;
        };

        let ticker = token
            .asset
            .as_ref()
            .and_then(|listed| listed.ticker.clone())
            .filter(|t| !t.is_empty());
        let listed_name = token.asset.as_ref().map(|listed| listed.name.as_str());
        if is_stablecoin_listing(ticker.as_deref(), listed_name) {
            continue;
        }

        listings.push(RwaAsset {
            id: token.asset_id.to_string(),
            name: asset.name.clone(),
            total_value: value,
            description: asset
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| format!("{} issued on Aptos", asset.name)),
            token_address: token.address,
            asset_ticker: ticker.unwrap_or_else(|| "N/A".to_string()),
            asset_class: format_asset_class(asset.asset_class.as_ref()),
            protocol: asset
                .protocol
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            issuer: asset.issuer.clone().filter(|i| !i.is_empty()),
        });
    }

    listings.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    listings
}

// USDY se queda: rinde yield, no es un stablecoin estacionado.
fn is_stablecoin_listing(ticker: Option<&str>, name: Option<&str>) -> bool {
    const MARKERS: [&str; 4] = ["usdc", "usdt", "usd coin", "tether"];
    let ticker = ticker.unwrap_or("").to_lowercase();
    let name = name.unwrap_or("").to_lowercase();
    MARKERS
        .iter()
        .any(|marker| ticker.contains(marker) || name.contains(marker))
}

fn format_asset_class(asset_class: Option<&AssetClass>) -> String {
    match asset_class {
        Some(AssetClass::Label(label)) if !label.is_empty() => label.clone(),
        Some(AssetClass::Detailed { name, slug }) => name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| slug.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "rwa".to_string()),
        _ => "rwa".to_string(),
    }
}

fn format_millions(value: f64) -> String {
    format!("${:.1}M", value / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(asset_id: i64, value: f64, ticker: &str, name: &str) -> TokenListing {
        TokenListing {
            asset_id,
            address: format!("0x{asset_id}"),
            total_asset_value_dollar: Some(DollarValue { val: value }),
            asset: Some(ListedTicker {
                name: name.to_string(),
                ticker: Some(ticker.to_string()),
            }),
        }
    }

    fn asset(id: i64, name: &str) -> AssetListing {
        AssetListing {
            id,
            name: name.to_string(),
            description: None,
            protocol: Some("Ondo".to_string()),
            asset_class: Some(AssetClass::Label("treasuries".to_string())),
            issuer: None,
        }
    }

    #[test]
    fn listings_join_filter_and_sort() {
        let tokens = vec![
            token(1, 50_000_000.0, "PACT", "Pact Loans"),
            token(2, 0.0, "ZERO", "Zero Value"),
            token(3, 120_000_000.0, "BUIDL", "BlackRock BUIDL"),
            token(4, 10_000_000.0, "USDC", "USD Coin"),
            token(5, 30_000_000.0, "USDY", "Ondo US Dollar Yield"),
            token(6, 5_000_000.0, "GHOST", "No Asset Record"),
        ];
        let assets = vec![
            asset(1, "Pact Loans"),
            asset(3, "BlackRock BUIDL"),
            asset(4, "USD Coin"),
            asset(5, "Ondo US Dollar Yield"),
        ];

        let listings = process_listings(tokens, assets);
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        // Zero value, missing asset record and USDC are gone; USDY stays.
        assert_eq!(ids, vec!["3", "1", "5"]);
        assert_eq!(listings[0].total_value, 120_000_000.0);
        assert_eq!(listings[0].description, "BlackRock BUIDL issued on Aptos");
        assert_eq!(listings[0].asset_class, "treasuries");
        assert_eq!(listings[0].protocol, "Ondo");
    }

    #[test]
    fn asset_class_parses_both_shapes() {
        let label: AssetClass = serde_json::from_value(json!("private-credit")).unwrap();
        assert_eq!(format_asset_class(Some(&label)), "private-credit");

        let detailed: AssetClass =
            serde_json::from_value(json!({ "name": "US Treasuries", "slug": "treasuries" }))
                .unwrap();
        assert_eq!(format_asset_class(Some(&detailed)), "US Treasuries");

        let slug_only: AssetClass =
            serde_json::from_value(json!({ "slug": "treasuries" })).unwrap();
        assert_eq!(format_asset_class(Some(&slug_only)), "treasuries");

        assert_eq!(format_asset_class(None), "rwa");
        let empty: AssetClass = serde_json::from_value(json!("")).unwrap();
        assert_eq!(format_asset_class(Some(&empty)), "rwa");
    }

    #[test]
    fn dollar_totals_format_in_millions() {
        assert_eq!(format_millions(382_540_000.0), "$382.5M");
        assert_eq!(format_millions(0.0), "$0.0M");
    }

    #[test]
    fn failure_and_stale_annotations() {
        let failed = RwaResponse::failure("boom");
        assert!(!failed.success);
        assert_eq!(failed.total_value_formatted, "$0.0M");
        assert_eq!(failed.asset_count, 0);
        assert_eq!(failed.data_source, "Error - RWA.xyz API unavailable");
        assert_eq!(failed.error.as_deref(), Some("boom"));

        let stale = RwaResponse {
            success: true,
            total_value: 1.0,
            total_value_formatted: "$0.0M".to_string(),
            asset_count: 0,
            assets: Vec::new(),
            timestamp: Utc::now(),
            data_source: DATA_SOURCE.to_string(),
            error: None,
        }
        .annotate_stale();
        assert!(stale.success);
        assert_eq!(stale.data_source, "RWA.xyz API (cached - stale)");
    }

    #[test]
    fn token_listing_parses_registry_payload() {
        let payload = json!({
            "results": [{
                "asset_id": 42,
                "address": "0xabc",
                "total_asset_value_dollar": { "val": 1_000_000.0 },
                "asset": { "name": "Test Fund", "ticker": "TF" }
            }]
        });
        let listing: Listing<TokenListing> = serde_json::from_value(payload).unwrap();
        assert_eq!(listing.results.len(), 1);
        let row = &listing.results[0];
        assert_eq!(row.asset_id, 42);
        assert_eq!(row.address, "0xabc");
        assert_eq!(row.total_asset_value_dollar.as_ref().unwrap().val, 1_000_000.0);

        let url = listing_url(
            "https://api.example.com/v4",
            "tokens",
            &listing_query("network_id", "equals", 38),
        );
        assert!(url.starts_with("https://api.example.com/v4/tokens?query=%7B"));
        assert!(url.contains("network_id"));
    }

    #[tokio::test]
    async fn open_breaker_short_circuits_snapshot() {
        let settings = Settings::default();
        let registry = RwaRegistry::new(&settings).unwrap();
        for _ in 0..settings.circuit_breaker.failure_threshold {
            registry.breaker.record_failure();
        }

        let response = registry.snapshot().await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some(BREAKER_OPEN_ERROR));
        assert_eq!(response.data_source, "Error - RWA.xyz API unavailable");
    }
}
