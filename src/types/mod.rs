// src/types/mod.rs

/// Validated account address newtype
pub mod address;
/// Wallet position report shapes
pub mod positions;
/// Fullnode/indexer payload shapes and tolerant extraction
pub mod resources;
/// Supply report shapes
pub mod supply;

pub use address::AccountAddress;
pub use positions::{LpHolding, Position, PositionSummary, PositionType, TokenBalance};
pub use resources::{AccountResource, FungibleAssetBalance, FungibleAssetMetadata};
pub use supply::{SupplyRecord, SupplyResponse, TokenShare};
