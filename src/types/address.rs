// src/types/address.rs

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// `0x` followed by 1-64 hex characters. Checked before any upstream call.
static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{1,64}$").expect("static address pattern"));

/// A validated Aptos account address, normalized to lowercase.
///
/// Construction is the validation boundary: anything that parses is safe
/// to interpolate into REST paths and indexer query variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn new(raw: &str) -> Result<Self, AssetError> {
        let trimmed = raw.trim();
        if !ADDRESS_RE.is_match(trimmed) {
            return Err(AssetError::Validation(format!(
                "invalid account address '{raw}': expected 0x followed by 1-64 hex characters"
            )));
        }
        Ok(AccountAddress(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountAddress::new(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountAddress::new(&value)
    }
}

impl From<AccountAddress> for String {
    fn from(addr: AccountAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_full_length_addresses() {
        assert!(AccountAddress::new("0x1").is_ok());
        let full = format!("0x{}", "a".repeat(64));
        assert!(AccountAddress::new(&full).is_ok());
    }

    #[test]
    fn normalizes_to_lowercase() {
        let addr = AccountAddress::new("0xABCdef123").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef123");
    }

    #[test]
    fn rejects_bad_inputs_before_any_io() {
        for bad in ["", "0x", "1abc", "0xzz", &format!("0x{}", "a".repeat(65))] {
            assert!(AccountAddress::new(bad).is_err(), "should reject {bad:?}");
        }
    }
}
