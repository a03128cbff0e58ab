//! # Aptos Asset SDK
//!
//! A Rust library for on-chain asset-state aggregation and classification on
//! Aptos mainnet. The SDK feeds portfolio dashboards with circulating-supply
//! reports for curated token classes, tokenized real-world asset listings,
//! and wallet position scans across the major DeFi protocols.
//!
//! ## Overview
//!
//! The SDK separates ledger access from aggregation logic. It focuses on:
//!
//! - **Supply**: per-class circulating supply (BTC wrappers, stablecoins,
//!   liquid staking tokens, real-world assets)
//! - **Classification**: protocol address registry with phantom-asset and
//!   suspicious-token heuristics
//! - **Positions**: wallet resource scans folded into per-protocol,
//!   activity-annotated position reports
//! - **Resilience**: caching, deduplication, retry, timeout and circuit
//!   breaking shared by every fetcher
//!
//! ## Architecture
//!
//! ### Ledger Access
//! `NodeClient` speaks to the fullnode REST API and the indexer GraphQL API
//! behind the `LedgerQuery` trait; aggregators never build requests.
//!
//! ### Resilience Layer
//! Every aggregate read runs cache-first through `CachedFetcher` (TTL cache,
//! single-flight dedup, bounded retry). Rate limits bypass retry entirely and
//! route to per-token fallback values; total failures fall back to a stale
//! cache entry when one exists.
//!
//! ### Aggregation Layer
//! Four supply services sum raw on-chain counters per token class, and the
//! position tracker classifies a wallet's resources against the protocol
//! registry.

// Core Types
/// Typed error taxonomy for every upstream interaction
pub mod error;
/// Report and wire shapes (addresses, resources, supply, positions)
pub mod types;

// Ledger Access
/// Fullnode REST and indexer GraphQL client behind the `LedgerQuery` trait
pub mod node_client;

// Resilience Layer
/// Caching, deduplication, retry, timeout and circuit-breaker primitives
pub mod resilience;

// Registries
/// Curated token descriptor tables and symbol resolution
pub mod token_registry;
/// Protocol address registry and phantom-asset classification
pub mod protocol_registry;

// Aggregation Layer
/// Circulating-supply aggregation per token class
pub mod supply;
/// Wallet position scanning
pub mod positions;

// Infrastructure
/// Metrics and observability
pub mod metrics;
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use error::{AssetError, Result};
pub use node_client::{LedgerQuery, NodeClient};
pub use positions::PositionTracker;
pub use protocol_registry::{Classification, ProtocolRegistry};
pub use settings::Settings;
pub use supply::{BitcoinSupply, LiquidStakingSupply, RwaRegistry, StablecoinSupply};
pub use types::{PositionSummary, SupplyResponse};
