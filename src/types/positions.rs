// src/types/positions.rs

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Position kind, derived from the owning protocol's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    Liquidity,
    Farming,
    Lending,
    Staking,
    Nft,
    Derivatives,
    Other,
}

impl PositionType {
    pub fn describe(self) -> &'static str {
        match self {
            PositionType::Liquidity => "DEX/Liquidity Pool",
            PositionType::Farming => "Yield Farming",
            PositionType::Lending => "Lending/Borrowing",
            PositionType::Staking => "Liquid Staking",
            PositionType::Nft => "NFT Platform",
            PositionType::Derivatives => "Derivatives Trading",
            PositionType::Other => "Other Protocol",
        }
    }
}

/// Plain token balance held under a protocol's resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub address: String,
    pub balance: String,
}

/// Liquidity-pool receipt balance with its recovered constituents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpHolding {
    pub pool_type: String,
    pub pool_tokens: Vec<String>,
    pub balance: String,
}

/// One wallet position, grouped by (protocol, position type).
///
/// Rebuilt from scratch on every query; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub protocol: String,
    pub protocol_address: String,
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub description: String,
    pub tokens: Vec<TokenBalance>,
    pub lp_tokens: Vec<LpHolding>,
    pub is_active: bool,
}

/// Wallet-wide position report. `protocol_breakdown` counts active
/// positions only; inactive positions still appear in `positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummary {
    pub wallet_address: String,
    pub positions: Vec<Position>,
    pub total_active_positions: usize,
    pub total_protocols: usize,
    pub protocol_breakdown: IndexMap<String, usize>,
    pub last_updated: DateTime<Utc>,
}

impl PositionSummary {
    /// Best-effort empty report, returned when the resource fetch fails.
    pub fn empty(wallet_address: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            positions: Vec::new(),
            total_active_positions: 0,
            total_protocols: 0,
            protocol_breakdown: IndexMap::new(),
            last_updated: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_with_dashboard_field_names() {
        let mut breakdown = IndexMap::new();
        breakdown.insert("Thala".to_string(), 1);
        let summary = PositionSummary {
            wallet_address: "0x1".to_string(),
            positions: vec![Position {
                protocol: "Thala".to_string(),
                protocol_address: "0x48271d39d0b05bd6efca2278f22277d6fcc375504f9839fd73f74ace240861af"
                    .to_string(),
                position_type: PositionType::Liquidity,
                description: "DEX/Liquidity Pool".to_string(),
                tokens: Vec::new(),
                lp_tokens: vec![LpHolding {
                    pool_type: "Stable Pool".to_string(),
                    pool_tokens: vec!["USDC".to_string(), "MOD".to_string()],
                    balance: "1000".to_string(),
                }],
                is_active: true,
            }],
            total_active_positions: 1,
            total_protocols: 1,
            protocol_breakdown: breakdown,
            last_updated: Utc::now(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["walletAddress"], "0x1");
        assert_eq!(json["totalActivePositions"], 1);
        assert_eq!(json["protocolBreakdown"]["Thala"], 1);
        assert_eq!(json["positions"][0]["type"], "liquidity");
        assert_eq!(json["positions"][0]["isActive"], true);
        assert_eq!(json["positions"][0]["lpTokens"][0]["poolType"], "Stable Pool");
    }

    #[test]
    fn empty_summary_has_no_positions() {
        let summary = PositionSummary::empty("0xabc");
        assert_eq!(summary.total_active_positions, 0);
        assert_eq!(summary.total_protocols, 0);
        assert!(summary.positions.is_empty());
    }
}
