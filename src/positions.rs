// src/positions.rs
//
// Wallet position scanner. One resource listing per wallet, classified
// against the protocol registry and folded into per-(protocol, kind)
// positions. Liquidity-pool receipts are split out from plain coin stores
// and their constituent symbols recovered from the receipt's type
// parameters.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use log::{info, warn};

use crate::error::Result;
use crate::metrics;
use crate::node_client::LedgerQuery;
use crate::protocol_registry::{ProtocolCategory, ProtocolRecord, ProtocolRegistry};
use crate::resilience::{log_operation, retry_with_backoff, RetryPolicy};
use crate::settings::Settings;
use crate::token_registry;
use crate::types::resources::extract_coin_store_balance;
use crate::types::{
    AccountAddress, AccountResource, LpHolding, Position, PositionSummary, PositionType,
    TokenBalance,
};

const COIN_STORE_MARKER: &str = "::coin::CoinStore<";

/// Receipt wrappers that mark a resource as a pool share rather than a
/// plain balance. Checked in order; first match decides the pool kind.
const LP_WRAPPERS: [(&str, &str); 4] = [
    ("::stable_pool::StablePoolToken<", "Stable Pool"),
    ("::weighted_pool::WeightedPoolToken<", "Weighted Pool"),
    ("::lp_coin::LP<", "AMM Pool"),
    ("::lp_token::LP<", "AMM Pool"),
];

/// Scans a wallet's resources into an activity-annotated position report.
pub struct PositionTracker {
    client: Arc<dyn LedgerQuery>,
    registry: ProtocolRegistry,
    retry: RetryPolicy,
}

impl PositionTracker {
    pub fn new(client: Arc<dyn LedgerQuery>, settings: &Settings) -> Self {
        Self::with_registry(client, ProtocolRegistry::default(), settings)
    }

    pub fn with_registry(
        client: Arc<dyn LedgerQuery>,
        registry: ProtocolRegistry,
        settings: &Settings,
    ) -> Self {
        Self {
            client,
            registry,
            retry: settings.retry.policy(),
        }
    }

    /// Full position report for one wallet.
    ///
    /// The address is validated before any upstream call; a failed resource
    /// fetch degrades to an empty report instead of propagating.
    pub async fn position_summary(&self, wallet: &str) -> Result<PositionSummary> {
        let address: AccountAddress = wallet.parse()?;
        info!("🔍 Analyzing positions for wallet: {address}");
        let started = Instant::now();

        let resources = match retry_with_backoff(&self.retry, "account_resources", || {
            self.client.account_resources(&address)
        })
        .await
        {
            Ok(resources) => resources,
            Err(err) => {
                warn!("⚠️ failed to fetch account resources for {address}: {err}");
                log_operation("position_summary", started, false, "");
                return Ok(PositionSummary::empty(address.as_str()));
            }
        };

        Ok(self.summarize(address.as_str(), resources, started))
    }

    fn summarize(
        &self,
        wallet: &str,
        resources: Vec<AccountResource>,
        started: Instant,
    ) -> PositionSummary {
        struct Group {
            record: ProtocolRecord,
            resources: Vec<AccountResource>,
        }

        // Los recursos sin protocolo conocido se descartan acá.
        let mut groups: IndexMap<(&'static str, PositionType), Group> = IndexMap::new();
        for resource in resources {
            let Some(record) = self.registry.classify(&resource.resource_type) else {
                continue;
            };
            let kind = position_type_for(record.category);
            groups
                .entry((record.name, kind))
                .or_insert_with(|| Group {
                    record: *record,
                    resources: Vec::new(),
                })
                .resources
                .push(resource);
        }

        let mut positions = Vec::with_capacity(groups.len());
        let mut breakdown: IndexMap<String, usize> = IndexMap::new();

        for ((_, kind), group) in groups {
            let mut tokens = Vec::new();
            let mut lp_tokens = Vec::new();
            let mut any_balance = false;

            for resource in &group.resources {
                if let Some(receipt) = parse_lp_receipt(&resource.resource_type) {
                    let balance = extract_coin_store_balance(&resource.data);
                    any_balance |= balance != 0;
                    lp_tokens.push(LpHolding {
                        pool_type: receipt.pool_type.to_string(),
                        pool_tokens: receipt.constituents,
                        balance: balance.to_string(),
                    });
                } else if let Some(asset_type) = coin_store_asset(&resource.resource_type) {
                    let balance = extract_coin_store_balance(&resource.data);
                    any_balance |= balance != 0;
                    tokens.push(TokenBalance {
                        symbol: token_registry::symbol_for_asset_type(&asset_type),
                        address: asset_type,
                        balance: balance.to_string(),
                    });
                }
            }

            let protocol_address = group
                .record
                .addresses
                .iter()
                .find(|address| {
                    group
                        .resources
                        .iter()
                        .any(|r| r.resource_type.contains(*address))
                })
                .copied()
                .unwrap_or_default()
                .to_string();

            if any_balance {
                *breakdown.entry(group.record.name.to_string()).or_insert(0) += 1;
            }

            positions.push(Position {
                protocol: group.record.name.to_string(),
                protocol_address,
                position_type: kind,
                description: kind.describe().to_string(),
                tokens,
                lp_tokens,
                is_active: any_balance,
            });
        }

        positions.sort_by(|a, b| {
            b.is_active
                .cmp(&a.is_active)
                .then_with(|| a.protocol.cmp(&b.protocol))
        });

        let total_active = positions.iter().filter(|p| p.is_active).count();
        metrics::set_positions_active(total_active as f64);
        log_operation(
            "position_summary",
            started,
            true,
            &format!("positions={} active={total_active}", positions.len()),
        );

        PositionSummary {
            wallet_address: wallet.to_string(),
            positions,
            total_active_positions: total_active,
            total_protocols: breakdown.len(),
            protocol_breakdown: breakdown,
            last_updated: chrono::Utc::now(),
        }
    }
}

fn position_type_for(category: ProtocolCategory) -> PositionType {
    match category {
        ProtocolCategory::Dex => PositionType::Liquidity,
        ProtocolCategory::Farming => PositionType::Farming,
        ProtocolCategory::Lending => PositionType::Lending,
        ProtocolCategory::LiquidStaking => PositionType::Staking,
        ProtocolCategory::NftMarketplace => PositionType::Nft,
        ProtocolCategory::Derivatives => PositionType::Derivatives,
        ProtocolCategory::Bridge | ProtocolCategory::Infrastructure => PositionType::Other,
    }
}

struct LpReceipt {
    pool_type: &'static str,
    constituents: Vec<String>,
}

fn parse_lp_receipt(resource_type: &str) -> Option<LpReceipt> {
    for (marker, pool_type) in LP_WRAPPERS {
        if !resource_type.contains(marker) {
            continue;
        }
        let params = params_after_marker(resource_type, marker)?;
        let constituents = split_type_params(&params)
            .into_iter()
            .filter(|segment| !segment.contains("::base_pool::Null"))
            .map(|segment| token_registry::symbol_for_asset_type(&segment))
            .collect();
        return Some(LpReceipt {
            pool_type,
            constituents,
        });
    }
    None
}

/// Inner type of a `CoinStore<T>` resource, if the type reads as one.
fn coin_store_asset(resource_type: &str) -> Option<String> {
    let params = params_after_marker(resource_type, COIN_STORE_MARKER)?;
    split_type_params(&params).into_iter().next()
}

/// Generic parameter list following `marker` (which must end with `<`),
/// scanned to the matching close bracket.
fn params_after_marker(resource_type: &str, marker: &str) -> Option<String> {
    let start = resource_type.find(marker)? + marker.len();
    let mut depth = 1usize;
    for (offset, ch) in resource_type[start..].char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(resource_type[start..start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

// El split respeta genéricos anidados; solo corta comas de nivel cero.
fn split_type_params(params: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in params.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                let segment = params[start..i].trim();
                if !segment.is_empty() {
                    segments.push(segment.to_string());
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = params[start..].trim();
    if !tail.is_empty() {
        segments.push(tail.to_string());
    }
    segments
}
