// src/token_registry.rs
//
// Static tables mapping each tracked asset to its on-chain representation,
// plus the symbol/decimal resolution helpers the position tracker leans on.
// Addresses are mainnet; decimals come from the issuing contract.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// How a logical asset is expressed on chain. The variant fixes which
/// upstream read yields its supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Ledger-wide `0x1::coin::CoinInfo<T>` counter at the coin's origin
    /// account.
    LegacyCoin { coin_type: &'static str },
    /// Migrated coin; the running total lives in the indexer metadata
    /// table, keyed by the original coin type string.
    LegacyCoinV2 { coin_type: &'static str },
    /// Supply metadata attached to the fungible asset object.
    FungibleObject { metadata_address: &'static str },
    /// No running counter on chain; supply is the sum over all current
    /// holder balances.
    FungibleObjectAggregate { asset_type: &'static str },
    /// Coin mid-migration: a legacy counter and an object supply coexist
    /// and are summed.
    Dual {
        coin_type: &'static str,
        metadata_address: &'static str,
    },
}

/// One tracked asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
    /// Issuing protocol tag; liquid-staking responses group by it.
    pub protocol: &'static str,
    pub representation: Representation,
    /// Last known supply, served verbatim when the upstream rate-limits
    /// this token.
    pub rate_limit_fallback: Option<&'static str>,
}

impl TokenDescriptor {
    /// True when `identifier` is one of this token's on-chain identifiers.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        match self.representation {
            Representation::LegacyCoin { coin_type }
            | Representation::LegacyCoinV2 { coin_type } => coin_type == identifier,
            Representation::FungibleObject { metadata_address } => {
                metadata_address == identifier
            }
            Representation::FungibleObjectAggregate { asset_type } => asset_type == identifier,
            Representation::Dual {
                coin_type,
                metadata_address,
            } => coin_type == identifier || metadata_address == identifier,
        }
    }
}

pub const APT_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";
pub const APT_FA_ADDRESS: &str = "0xa";

/// Native USDT fungible asset; the reserve subtraction is keyed on it.
pub const USDT_ASSET_TYPE: &str =
    "0x357b0b74bc833e95a115ad22604854d6b0fca151cecd94111770e5d6ffc9dc2b";

/// Tether treasury accounts whose balances are not in circulation.
pub static TETHER_RESERVE_ADDRESSES: &[&str] =
    &["0xd5b71ee4d1bad5cb7f14c880ee55633c7befcb7384cf070919ea5c481019a4e9"];

/// Bitcoin-pegged wrappers tracked by the Bitcoin supply service.
pub static BTC_TOKENS: &[TokenDescriptor] = &[
    TokenDescriptor {
        symbol: "xBTC",
        name: "OKX wBTC",
        decimals: 8,
        protocol: "OKX",
        representation: Representation::FungibleObject {
            metadata_address: "0x81214a80d82035a190fcb76b6ff3c0145161c3a9f33d137f2bbaee4cfec8a387",
        },
        rate_limit_fallback: Some("41956755496"),
    },
    TokenDescriptor {
        symbol: "SBTC",
        name: "StakeStone Bitcoin",
        decimals: 8,
        protocol: "StakeStone",
        representation: Representation::Dual {
            coin_type: "0x5dee1d4b13fae338a1e1780f9ad2709a010e824388efd169171a26e3ea9029bb::stakestone_bitcoin::StakeStoneBitcoin",
            metadata_address: "0xef1f3c4126176b1aaff3bf0d460a9344b64ac4bd28ff3e53793d49ded5c2d42f",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "WBTC",
        name: "Wrapped Bitcoin",
        decimals: 8,
        protocol: "BitGo",
        representation: Representation::FungibleObject {
            metadata_address: "0x68844a0d7f2587e726ad0579f3d640865bb4162c08a4589eeda3f9689ec52a3d",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        // Sin contador en cadena; se suma sobre los holders.
        symbol: "aBTC",
        name: "Aptos Bitcoin",
        decimals: 10,
        protocol: "Echo Protocol",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0x4e1854f6d332c9525e258fb6e66f84b6af8aba687bbcb832a24768c4e175feec",
        },
        rate_limit_fallback: Some("23447697467284"),
    },
    TokenDescriptor {
        symbol: "FiaBTC",
        name: "Fiat Bitcoin",
        decimals: 8,
        protocol: "Fiamma",
        representation: Representation::FungibleObject {
            metadata_address: "0x75de592a7e62e6224d13763c392190fda8635ebb79c798a5e9dd0840102f3f93",
        },
        rate_limit_fallback: None,
    },
];

/// Stablecoins: native fungible assets first, bridged legacy coins after.
pub static STABLECOIN_TOKENS: &[TokenDescriptor] = &[
    TokenDescriptor {
        symbol: "USDT",
        name: "Tether USD",
        decimals: 6,
        protocol: "Tether",
        representation: Representation::FungibleObject {
            metadata_address: USDT_ASSET_TYPE,
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "USDC",
        name: "USD Coin",
        decimals: 6,
        protocol: "Circle",
        representation: Representation::FungibleObject {
            metadata_address: "0xbae207659db88bea0cbead6da0ed00aac12edcdda169e591cd41c94180b46f3b",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "USDe",
        name: "Ethena USDe",
        decimals: 6,
        protocol: "Ethena",
        representation: Representation::FungibleObject {
            metadata_address: "0xf37a8864fe737eb8ec2c2931047047cbaed1beed3fb0e5b7c5526dafd3b9c2e9",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "sUSDe",
        name: "Ethena sUSDe",
        decimals: 6,
        protocol: "Ethena",
        representation: Representation::FungibleObject {
            metadata_address: "0xb30a694a344edee467d9f82330bbe7c3b89f440a1ecd2da1f3bca266560fce69",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "USDA",
        name: "USD Aptos",
        decimals: 8,
        protocol: "USDA Issuer",
        representation: Representation::FungibleObject {
            metadata_address: "0x534e4c3dc0f038dab1a8259e89301c4da58779a5d482fb354a41c08147e6b9ec",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "USD1",
        name: "World Liberty Financial USD",
        decimals: 6,
        protocol: "World Liberty Financial",
        representation: Representation::FungibleObject {
            metadata_address: "0x05fabd1b12e39967a3c24e91b7b8f67719a6dacee74f3c8b9fb7d93e855437d2",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        // Migrado a FA pero el indexer lo sigue listando por el coin type.
        symbol: "MOD",
        name: "Move Dollar",
        decimals: 8,
        protocol: "Thala",
        representation: Representation::LegacyCoinV2 {
            coin_type: "0x6f986d146e4a90b828d8c12c14b6f4e003fdff11a8eecceceb63744363eaac01::mod_coin::MOD",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "lzUSDC",
        name: "LayerZero USDC",
        decimals: 6,
        protocol: "LayerZero",
        representation: Representation::LegacyCoin {
            coin_type: "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa::asset::USDC",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "lzUSDT",
        name: "LayerZero USDT",
        decimals: 6,
        protocol: "LayerZero",
        representation: Representation::LegacyCoin {
            coin_type: "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa::asset::USDT",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "whUSDC",
        name: "Wormhole USDC",
        decimals: 6,
        protocol: "Wormhole",
        representation: Representation::LegacyCoin {
            coin_type: "0x5e156f1207d0ebfa19a9eeff00d62a282278fb8719f4fab3a586a0a2c0fffbea::coin::T",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "whUSDT",
        name: "Wormhole USDT",
        decimals: 6,
        protocol: "Wormhole",
        representation: Representation::LegacyCoin {
            coin_type: "0xa2eda21a58856fda86451436513b867c97eecb4ba099da5775520e0f7492e852::coin::T",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "ceUSDC",
        name: "Celer USDC",
        decimals: 6,
        protocol: "Celer",
        representation: Representation::LegacyCoin {
            coin_type: "0x8d87a65ba30e09357fa2edea2c80dbac296e5dec2b18287113500b902942929d::celer_coin_manager::UsdcCoin",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "ceUSDT",
        name: "Celer USDT",
        decimals: 6,
        protocol: "Celer",
        representation: Representation::LegacyCoin {
            coin_type: "0x8d87a65ba30e09357fa2edea2c80dbac296e5dec2b18287113500b902942929d::celer_coin_manager::UsdtCoin",
        },
        rate_limit_fallback: None,
    },
];

/// Liquid-staking tokens. Coin and fungible-asset forms of the same token
/// are listed separately; both report through the holder-balance aggregate
/// because none of them maintains a supply counter.
pub static LST_TOKENS: &[TokenDescriptor] = &[
    TokenDescriptor {
        symbol: "amAPT",
        name: "Amnis APT",
        decimals: 8,
        protocol: "Amnis",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0x111ae3e5bc816a5e63c2da97d0aa3886519e0cd5e4b046659fa35796bd11542a::amapt_token::AmnisApt",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "amAPT-FA",
        name: "Amnis APT (FA)",
        decimals: 8,
        protocol: "Amnis",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0xa259be733b6a759909f92815927fa213904df6540519568692caf0b068fe8e62",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "stAPT",
        name: "Amnis Staked APT",
        decimals: 8,
        protocol: "Amnis",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0x111ae3e5bc816a5e63c2da97d0aa3886519e0cd5e4b046659fa35796bd11542a::stapt_token::StakedApt",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "stAPT-FA",
        name: "Amnis Staked APT (FA)",
        decimals: 8,
        protocol: "Amnis",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0xe9c192ff55cffab3963c695cff6dbf9dad6aff2bb5ac19a6415cad26a81860d9::staked_apt::StakedAptosAsset",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "thAPT",
        name: "Thala APT",
        decimals: 8,
        protocol: "Thala",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0xfaf4e633ae9eb31366c9ca24214231760926576c7b625313b3688b5e900731f6::staking::ThalaAPT",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "thAPT-FA",
        name: "Thala APT (FA)",
        decimals: 8,
        protocol: "Thala",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0xa0d9d647c5737a5aed08d2cfeb39c31cf901d44bc4aa024eaa7e5e68b804e011",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "sthAPT",
        name: "Thala Staked APT",
        decimals: 8,
        protocol: "Thala",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0xfaf4e633ae9eb31366c9ca24214231760926576c7b625313b3688b5e900731f6::staking::StakedThalaAPT",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "sthAPT-FA",
        name: "Thala Staked APT (FA)",
        decimals: 8,
        protocol: "Thala",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0x0a9ce1bddf93b074697ec5e483bc5050bc64cff2acd31e1ccfd8ac8cae5e4abe",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "kAPT",
        name: "Kofi APT",
        decimals: 8,
        protocol: "Kofi",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0x821c94e69bc7ca058c913b7b5e6b0a5c9fd1523d58723a966fb8c1f5ea888105",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "stkAPT",
        name: "Kofi Staked APT",
        decimals: 8,
        protocol: "Kofi",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0x42556039b88593e768c97ab1a3ab0c6a17230825769304482dff8fdebe4c002b",
        },
        rate_limit_fallback: None,
    },
    TokenDescriptor {
        symbol: "truAPT",
        name: "TruFin truAPT",
        decimals: 8,
        protocol: "TruFin",
        representation: Representation::FungibleObjectAggregate {
            asset_type: "0xaef6a8c3182e076db72d64324617114cacf9a52f28325edc10b483f7f05da0e7",
        },
        rate_limit_fallback: None,
    },
];

/// Every descriptor across the three class tables.
pub fn all_tokens() -> impl Iterator<Item = &'static TokenDescriptor> {
    BTC_TOKENS
        .iter()
        .chain(STABLECOIN_TOKENS.iter())
        .chain(LST_TOKENS.iter())
}

pub fn descriptor_for_symbol(symbol: &str) -> Option<&'static TokenDescriptor> {
    all_tokens().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// Chain-wide assets the dashboards resolve but no supply service tracks.
const EXTRA_SYMBOLS: &[(&str, &str)] = &[
    (
        "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa::asset::WETH",
        "WETH",
    ),
    (
        "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa::asset::WBTC",
        "WBTC",
    ),
    (
        "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa::asset::DAI",
        "DAI",
    ),
    (
        "0x7fd500c11216f0fe3095d0c4b8aa4d64a4e2e04f83758462f2b127255643615::thl_coin::THL",
        "THL",
    ),
    (
        "0x159df6b7689437016108a019fd5bef736bac692b6d4a1f10c941f6fbb9a74ca6::oft::CakeOFT",
        "CAKE",
    ),
];

static SYMBOL_BY_ASSET: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(APT_COIN_TYPE, "APT");
    map.insert(APT_FA_ADDRESS, "APT");
    for (asset_type, symbol) in EXTRA_SYMBOLS {
        map.insert(*asset_type, *symbol);
    }
    for token in all_tokens() {
        // Las formas -FA comparten símbolo con la moneda base.
        let symbol = token.symbol.strip_suffix("-FA").unwrap_or(token.symbol);
        match token.representation {
            Representation::LegacyCoin { coin_type }
            | Representation::LegacyCoinV2 { coin_type } => {
                map.entry(coin_type).or_insert(symbol);
            }
            Representation::FungibleObject { metadata_address } => {
                map.entry(metadata_address).or_insert(symbol);
            }
            Representation::FungibleObjectAggregate { asset_type } => {
                map.entry(asset_type).or_insert(symbol);
            }
            Representation::Dual {
                coin_type,
                metadata_address,
            } => {
                map.entry(coin_type).or_insert(symbol);
                map.entry(metadata_address).or_insert(symbol);
            }
        }
    }
    map
});

static MODULE_STRUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::([^:]+)::([^>]+)$").expect("static type pattern"));
static STRUCT_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::([^:]+)$").expect("static type pattern"));
static NAME_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Token|Coin|OFT|LP").expect("static noise pattern"));
static SCAM_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)test|fake|scam|airdrop|reward|bonus|gift|claim").expect("static scam pattern")
});

/// Resolve a type identifier or metadata address to a display symbol.
///
/// Known addresses first, then derivation patterns, then a name extracted
/// from the module/struct segments. Returns "UNKNOWN" when nothing fits.
pub fn symbol_for_asset_type(asset_type: &str) -> String {
    if asset_type.is_empty() {
        return "UNKNOWN".to_string();
    }
    if let Some(symbol) = SYMBOL_BY_ASSET.get(asset_type) {
        return (*symbol).to_string();
    }
    if is_liquid_staking_asset(asset_type) {
        // Derivado de APT pero sin entrada propia.
        return "stAPT".to_string();
    }
    for (needle, symbol) in [
        ("::asset::USDC", "USDC"),
        ("::asset::USDT", "USDT"),
        ("::asset::WETH", "WETH"),
        ("::asset::WBTC", "WBTC"),
        ("::asset::DAI", "DAI"),
    ] {
        if asset_type.contains(needle) {
            return symbol.to_string();
        }
    }
    if asset_type.contains("::thl_coin::") || asset_type.contains("::THL") {
        return "THL".to_string();
    }
    if asset_type.contains("::mod_coin::") || asset_type.contains("::MOD") {
        return "MOD".to_string();
    }
    extract_symbol(asset_type).unwrap_or_else(|| "UNKNOWN".to_string())
}

fn extract_symbol(asset_type: &str) -> Option<String> {
    for re in [&MODULE_STRUCT_RE, &STRUCT_ONLY_RE] {
        if let Some(caps) = re.captures(asset_type) {
            if let Some(last) = caps.get(caps.len() - 1) {
                let cleaned = NAME_NOISE_RE.replace_all(last.as_str(), "").to_uppercase();
                if !cleaned.is_empty() && cleaned != "UNKNOWN" {
                    return Some(cleaned);
                }
            }
        }
    }
    None
}

pub fn decimals_for_symbol(symbol: &str) -> Option<u8> {
    if symbol.eq_ignore_ascii_case("APT") {
        return Some(8);
    }
    descriptor_for_symbol(symbol).map(|t| t.decimals)
}

pub fn is_native_apt(asset_type: &str) -> bool {
    asset_type == APT_COIN_TYPE || asset_type == APT_FA_ADDRESS
}

pub fn is_liquid_staking_asset(asset_type: &str) -> bool {
    LST_TOKENS.iter().any(|t| t.matches_identifier(asset_type))
        || asset_type.contains("::stapt_token::")
        || asset_type.contains("::StakedApt")
        || asset_type.contains("::amapt_token::")
        || asset_type.contains("::AmnisApt")
        || asset_type.contains("::staking::ThalaAPT")
        || asset_type.contains("::staked_aptos_coin::")
}

pub fn is_stablecoin(asset_type: &str, symbol: Option<&str>) -> bool {
    if let Some(symbol) = symbol {
        let upper = symbol.to_uppercase();
        if ["USDT", "USDC", "BUSD", "DAI", "TUSD", "USDD"].contains(&upper.as_str()) {
            return true;
        }
    }
    asset_type.contains("::asset::USDC")
        || asset_type.contains("::asset::USDT")
        || asset_type.contains("::asset::DAI")
        || STABLECOIN_TOKENS
            .iter()
            .any(|t| t.matches_identifier(asset_type))
        || asset_type.to_lowercase().contains("usd")
}

/// Heuristic for fake/scam tokens: an "APT" symbol that is not the native
/// coin, or bait wording in the symbol or type identifier.
pub fn is_suspicious_asset(asset_type: &str, symbol: Option<&str>) -> bool {
    if let Some(symbol) = symbol {
        if symbol.eq_ignore_ascii_case("APT") && !is_native_apt(asset_type) {
            return true;
        }
        if SCAM_NAME_RE.is_match(symbol) {
            return true;
        }
    }
    SCAM_NAME_RE.is_match(asset_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_identifiers_resolve_to_their_symbol() {
        assert_eq!(symbol_for_asset_type(APT_COIN_TYPE), "APT");
        assert_eq!(symbol_for_asset_type(USDT_ASSET_TYPE), "USDT");
        // Both legs of a dual token answer to the same symbol.
        assert_eq!(
            symbol_for_asset_type(
                "0x5dee1d4b13fae338a1e1780f9ad2709a010e824388efd169171a26e3ea9029bb::stakestone_bitcoin::StakeStoneBitcoin"
            ),
            "SBTC"
        );
        assert_eq!(
            symbol_for_asset_type(
                "0xef1f3c4126176b1aaff3bf0d460a9344b64ac4bd28ff3e53793d49ded5c2d42f"
            ),
            "SBTC"
        );
        // FA forms drop the suffix.
        assert_eq!(
            symbol_for_asset_type(
                "0xa259be733b6a759909f92815927fa213904df6540519568692caf0b068fe8e62"
            ),
            "amAPT"
        );
    }

    #[test]
    fn unknown_staking_types_fall_back_to_generic_symbol() {
        assert_eq!(
            symbol_for_asset_type("0xdead::stapt_token::SomethingNew"),
            "stAPT"
        );
    }

    #[test]
    fn bridged_patterns_resolve_without_a_table_entry() {
        assert_eq!(symbol_for_asset_type("0x999::asset::USDT"), "USDT");
        assert_eq!(symbol_for_asset_type("0x999::asset::WETH"), "WETH");
    }

    #[test]
    fn falls_back_to_struct_name_extraction() {
        assert_eq!(
            symbol_for_asset_type("0xabc::vibrant::VibrantToken"),
            "VIBRANT"
        );
        assert_eq!(symbol_for_asset_type("not-a-type"), "UNKNOWN");
        assert_eq!(symbol_for_asset_type(""), "UNKNOWN");
    }

    #[test]
    fn decimals_lookup_is_case_insensitive() {
        assert_eq!(decimals_for_symbol("usdt"), Some(6));
        assert_eq!(decimals_for_symbol("aBTC"), Some(10));
        assert_eq!(decimals_for_symbol("APT"), Some(8));
        assert_eq!(decimals_for_symbol("NOPE"), None);
    }

    #[test]
    fn suspicious_assets_are_flagged() {
        assert!(is_suspicious_asset("0xbad::apt::APT", Some("APT")));
        assert!(!is_suspicious_asset(APT_COIN_TYPE, Some("APT")));
        assert!(is_suspicious_asset("0x1::coin::Legit", Some("FreeClaim")));
        assert!(is_suspicious_asset("0xbad::airdrop_v2::Drop", None));
        assert!(!is_suspicious_asset(
            "0x1::aptos_coin::AptosCoin",
            Some("WBTC")
        ));
    }

    #[test]
    fn stablecoin_check_covers_symbols_addresses_and_patterns() {
        assert!(is_stablecoin("0x0", Some("usdc")));
        assert!(is_stablecoin("0x999::asset::USDT", None));
        assert!(is_stablecoin(USDT_ASSET_TYPE, None));
        assert!(!is_stablecoin(APT_COIN_TYPE, Some("APT")));
    }

    #[test]
    fn identifiers_are_unique_across_tables() {
        let mut seen = std::collections::HashSet::new();
        for token in all_tokens() {
            match token.representation {
                Representation::LegacyCoin { coin_type }
                | Representation::LegacyCoinV2 { coin_type } => {
                    assert!(seen.insert(coin_type), "duplicate {coin_type}");
                }
                Representation::FungibleObject { metadata_address } => {
                    assert!(seen.insert(metadata_address), "duplicate {metadata_address}");
                }
                Representation::FungibleObjectAggregate { asset_type } => {
                    assert!(seen.insert(asset_type), "duplicate {asset_type}");
                }
                Representation::Dual {
                    coin_type,
                    metadata_address,
                } => {
                    assert!(seen.insert(coin_type), "duplicate {coin_type}");
                    assert!(seen.insert(metadata_address), "duplicate {metadata_address}");
                }
            }
        }
    }

    #[test]
    fn fallback_supplies_parse_as_integers() {
        for token in all_tokens() {
            if let Some(fallback) = token.rate_limit_fallback {
                fallback.parse::<u128>().unwrap();
            }
        }
    }
}
