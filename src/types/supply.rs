// src/types/supply.rs
//
// Report shapes shared by the supply aggregation services. Raw amounts
// stay as integer strings end to end; formatted fields are derived once
// at response build time and are display-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One token's contribution inside a grouped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenShare {
    pub symbol: String,
    pub supply: String,
    pub formatted_supply: String,
}

/// Per-token (or per-protocol-group) line of a supply response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRecord {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Integer supply in the token's native decimals. Values exceed the
    /// f64-safe range, so this is never parsed as a float.
    pub supply: String,
    /// Human form, two fractional digits.
    pub formatted_supply: String,
    pub decimals: u8,
    /// Issuing protocol; set on grouped liquid-staking records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Share of the class-wide formatted total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    /// Constituent tokens when this record aggregates a protocol group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_breakdown: Option<Vec<TokenShare>>,
}

impl SupplyRecord {
    pub fn new(
        symbol: impl Into<String>,
        supply: impl Into<String>,
        formatted_supply: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            supply: supply.into(),
            formatted_supply: formatted_supply.into(),
            decimals,
            protocol: None,
            percentage: None,
            token_breakdown: None,
        }
    }
}

/// Aggregated view over one asset class (BTC wrappers, stables, LSTs),
/// ordered by supply descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyResponse {
    pub success: bool,
    /// Sum of constituent raw supplies.
    pub total_supply: String,
    pub total_supply_formatted: String,
    pub supplies: Vec<SupplyRecord>,
    pub timestamp: DateTime<Utc>,
    /// Failure description, or a staleness annotation on a degraded serve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SupplyResponse {
    /// Empty failure response; used when no stale data exists to serve.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            total_supply: "0".to_string(),
            total_supply_formatted: "0.00".to_string(),
            supplies: Vec::new(),
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Re-serve of an expired cache entry after a failed refresh.
    pub fn annotate_stale(mut self) -> Self {
        self.error = Some("Using cached data (stale)".to_string());
        self
    }

    pub fn record(&self, symbol: &str) -> Option<&SupplyRecord> {
        self.supplies.iter().find(|r| r.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_round_trips_through_json() {
        let mut record = SupplyRecord::new("SBTC", "74899087500", "748.99", 8);
        record.percentage = Some(100.0);
        let response = SupplyResponse {
            success: true,
            total_supply: "74899087500".to_string(),
            total_supply_formatted: "748.99".to_string(),
            supplies: vec![record],
            timestamp: Utc::now(),
            error: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"error\""));
        assert!(!json.contains("\"token_breakdown\""));
        let back: SupplyResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
        assert_eq!(back.record("SBTC").unwrap().supply, "74899087500");
        assert!(back.record("WBTC").is_none());
    }

    #[test]
    fn grouped_records_serialize_their_breakdown() {
        let mut record = SupplyRecord::new("amAPT / stAPT", "300", "3.00", 8);
        record.protocol = Some("Amnis".to_string());
        record.token_breakdown = Some(vec![TokenShare {
            symbol: "amAPT".to_string(),
            supply: "300".to_string(),
            formatted_supply: "3.00".to_string(),
        }]);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"token_breakdown\""));
        assert!(json.contains("\"protocol\":\"Amnis\""));
    }

    #[test]
    fn failure_response_is_empty_and_flagged() {
        let response = SupplyResponse::failure("indexer unreachable");
        assert!(!response.success);
        assert_eq!(response.total_supply, "0");
        assert_eq!(response.total_supply_formatted, "0.00");
        assert!(response.supplies.is_empty());
        assert_eq!(response.error.as_deref(), Some("indexer unreachable"));
    }

    #[test]
    fn stale_annotation_keeps_data() {
        let response = SupplyResponse {
            success: true,
            total_supply: "5".to_string(),
            total_supply_formatted: "0.00".to_string(),
            supplies: Vec::new(),
            timestamp: Utc::now(),
            error: None,
        }
        .annotate_stale();
        assert!(response.success);
        assert_eq!(response.error.as_deref(), Some("Using cached data (stale)"));
        assert_eq!(response.total_supply, "5");
    }
}
