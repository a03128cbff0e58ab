use crate::node_client::{MAINNET_INDEXER_URL, MAINNET_REST_URL};
use crate::resilience::RetryPolicy;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct NodeSettings {
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,
    /// Bearer credential sent on every fullnode and indexer request.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Per-process request pacing; `None` sends every request directly.
    #[serde(default)]
    pub qps_limit: Option<u32>,
}

fn default_rest_url() -> String {
    MAINNET_REST_URL.to_string()
}
fn default_indexer_url() -> String {
    MAINNET_INDEXER_URL.to_string()
}
fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            indexer_url: default_indexer_url(),
            api_key: None,
            request_timeout_seconds: default_request_timeout_seconds(),
            qps_limit: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_supply_ttl_seconds")]
    pub supply_ttl_seconds: u64,
    #[serde(default = "default_rwa_ttl_seconds")]
    pub rwa_ttl_seconds: u64,
}

fn default_cache_max_entries() -> usize {
    500
}
fn default_supply_ttl_seconds() -> u64 {
    600 // 10 minutes
}
fn default_rwa_ttl_seconds() -> u64 {
    86_400 // 24 hours
}

impl CacheSettings {
    pub fn supply_ttl(&self) -> Duration {
        Duration::from_secs(self.supply_ttl_seconds)
    }

    pub fn rwa_ttl(&self) -> Duration {
        Duration::from_secs(self.rwa_ttl_seconds)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_cache_max_entries(),
            supply_ttl_seconds: default_supply_ttl_seconds(),
            rwa_ttl_seconds: default_rwa_ttl_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_backoff_factor() -> f64 {
    2.0
}
fn default_max_delay_ms() -> u64 {
    10_000
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff_factor: self.backoff_factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Pacing for multi-token aggregation sweeps. Ledger-counter reads go out
/// sequentially spaced by `inter_request_delay_ms`; indexer aggregate reads
/// go out in batches of `batch_size` spaced by `batch_delay_ms`.
#[derive(Debug, Deserialize, Clone)]
pub struct AggregationSettings {
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_inter_request_delay_ms() -> u64 {
    200
}
fn default_batch_size() -> usize {
    3
}
fn default_batch_delay_ms() -> u64 {
    50
}

impl AggregationSettings {
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            inter_request_delay_ms: default_inter_request_delay_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

fn default_failure_threshold() -> u32 {
    3
}
fn default_cooldown_seconds() -> u64 {
    300 // 5 minutes
}

impl CircuitBreakerSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_seconds: default_cooldown_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RwaSettings {
    #[serde(default = "default_rwa_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Network filter applied to both registry listings.
    #[serde(default = "default_rwa_network_id")]
    pub network_id: u32,
}

fn default_rwa_api_url() -> String {
    "https://api.rwa.xyz/v4".to_string()
}
fn default_rwa_network_id() -> u32 {
    38 // Aptos mainnet in the registry's numbering
}

impl Default for RwaSettings {
    fn default() -> Self {
        Self {
            api_url: default_rwa_api_url(),
            api_key: None,
            network_id: default_rwa_network_id(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metrics {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9100
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[default]
    #[serde(rename = "pretty")]
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub node: NodeSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub aggregation: AggregationSettings,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    #[serde(default)]
    pub rwa: RwaSettings,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Load `Config.toml` when present, apply env overrides on top.
    /// Every section has full defaults, so a missing file still yields a
    /// working mainnet configuration.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config.toml").required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if let Ok(url) = env::var("ASSET_SDK_NODE_REST_URL") {
            if !url.trim().is_empty() {
                settings.node.rest_url = url.trim().to_string();
            }
        }
        if let Ok(url) = env::var("ASSET_SDK_NODE_INDEXER_URL") {
            if !url.trim().is_empty() {
                settings.node.indexer_url = url.trim().to_string();
            }
        }
        // APTOS_BUILD_SECRET es el nombre histórico de la credencial.
        for var in ["ASSET_SDK_NODE_API_KEY", "APTOS_BUILD_SECRET"] {
            if settings.node.api_key.is_some() {
                break;
            }
            if let Ok(key) = env::var(var) {
                if !key.trim().is_empty() {
                    settings.node.api_key = Some(key.trim().to_string());
                }
            }
        }
        if let Ok(key) = env::var("ASSET_SDK_RWA_API_KEY") {
            if !key.trim().is_empty() {
                settings.rwa.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(level) = env::var("ASSET_SDK_LOG_LEVEL") {
            if !level.trim().is_empty() {
                settings.log.level = level.trim().to_string();
            }
        }

        Ok(settings)
    }
}
