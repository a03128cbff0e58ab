// src/protocol_registry.rs
//
// Ordered address matching from on-chain type identifiers to protocol
// records, plus the phantom-asset heuristics built on top of it. Lookup
// order (longest address first, then insertion order) is part of the
// contract: the most specific match wins, and ties are deterministic.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolCategory {
    LiquidStaking,
    Lending,
    Bridge,
    Farming,
    Dex,
    Derivatives,
    Infrastructure,
    NftMarketplace,
}

/// One protocol and the on-chain addresses that identify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtocolRecord {
    pub name: &'static str,
    /// Short display label.
    pub label: &'static str,
    pub category: ProtocolCategory,
    pub addresses: &'static [&'static str],
}

/// Classification bundle returned by the public `classification` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub is_phantom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phantom_reason: Option<String>,
}

/// Symbols that indicate a staked or otherwise locked derivative.
const STAKED_ASSET_SYMBOLS: &[&str] = &[
    "stAPT", "thAPT", "amAPT", "sUSDe", "xUSDC", "zUSDC", "zUSDT",
];

/// Freely tradable bridged assets; a bridge match alone does not make
/// these phantom.
const TRADABLE_BRIDGED_SYMBOLS: &[&str] = &["USDC", "USDT", "WETH", "WBTC", "ETH", "BTC"];

/// Type shapes that always mean the asset sits locked somewhere.
static PHANTOM_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // LayerZero assets, usually locked in the bridge
        "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa::asset::",
        // Amnis staked assets
        "0x111ae3e5bc816a5e63c2da97d0aa3886519e0cd5e4b046659fa35796bd11542a::stapt_token::",
        "0x7e783b349d3e89cf5931af376ebeadbfab855b3fa239b7ada8f5a92fbea6b387::staking::",
        // Thala staked assets
        "0xfaf4e633ae9eb31366c9ca24214231760926576c7b625313b3688b5e900731f6::",
        // CELL tokens, hidden from portfolio views
        "0x2ebb2ccac5e027a87fa0e2e5f656a3a4238d6a48d93ec9b610d570fc0aa0df12::",
        r"(?i)::locked::",
        r"(?i)::staked::",
        r"(?i)::deposit::",
    ])
    .expect("static phantom patterns")
});

static LOCKED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)::locked::").expect("static locked pattern"));
static STAKED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)::staked::").expect("static staked pattern"));
static DEPOSIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)::deposit::").expect("static deposit pattern"));

/// Mainnet protocol table. Framework addresses are stored in their padded
/// 64-hex form, so shorthand identifiers like `0x1::coin::CoinStore` do
/// not classify as framework activity.
pub static BUILTIN_PROTOCOLS: &[ProtocolRecord] = &[
    ProtocolRecord {
        name: "Aptos Framework",
        label: "0x1",
        category: ProtocolCategory::Infrastructure,
        addresses: &["0x0000000000000000000000000000000000000000000000000000000000000001"],
    },
    ProtocolRecord {
        name: "Digital Assets",
        label: "0x4",
        category: ProtocolCategory::Infrastructure,
        addresses: &["0x0000000000000000000000000000000000000000000000000000000000000004"],
    },
    ProtocolRecord {
        name: "Merkle",
        label: "MKLP",
        category: ProtocolCategory::Derivatives,
        addresses: &["0x5ae6789dd2fec1a9ec9cccfb3acaf12e93d432f0a3a42c92fe1a9d490b7bbc06"],
    },
    ProtocolRecord {
        name: "Amnis Finance",
        label: "Amnis",
        category: ProtocolCategory::LiquidStaking,
        addresses: &[
            "0x111ae3e5bc816a5e63c2da97d0aa3886519e0cd5e4b046659fa35796bd11542a",
            "0x7e783b349d3e89cf5931af376ebeadbfab855b3fa239b7ada8f5a92fbea6b387",
            "0x6f09bf7a232a2159ce8b0af83d641d7bdeda0921f724764e94e4f9b2d7e0d261",
            "0x7893a5d6cd60610f2bad22bb29668e596d14245b682d508a0794ce69613bcaab",
        ],
    },
    ProtocolRecord {
        name: "Thala Liquid Staking",
        label: "thAPT",
        category: ProtocolCategory::LiquidStaking,
        addresses: &["0xfaf4e633ae9eb31366c9ca24214231760926576c7b625313b3688b5e900731f6"],
    },
    ProtocolRecord {
        name: "Aries",
        label: "Aries",
        category: ProtocolCategory::Lending,
        addresses: &["0x9770fa9c725cbd97eb50b2be5f7416efdfd1f1554beb0750d4dae4c64e860da3"],
    },
    ProtocolRecord {
        name: "Aptin Finance",
        label: "Aptin",
        category: ProtocolCategory::Lending,
        addresses: &[
            "0x3c1d4a86594d681ff7e5d5a233965daeabdc6a15fe5672ceeda5260038857183",
            "0xb7d960e5f0a58cc0817774e611d7e3ae54c6843816521f02d7ced583d6434896",
        ],
    },
    ProtocolRecord {
        name: "Thala Farm",
        label: "Thala Farm",
        category: ProtocolCategory::Farming,
        addresses: &[
            "0x6b3720cd988adeaf721ed9d4730da4324d52364871a68eac62b46d21e4d2fa99",
            "0x3c4a58b4a8dffe6d14448072efcdd5a0e0089a22c6837b94f1d7e8bb1552137f",
            "0xb4a8b8462b4423780d6ee256f3a9a3b9ece5d9440d614f7ab2bfa4556aa4f69d",
        ],
    },
    ProtocolRecord {
        name: "PancakeSwap",
        label: "CAKE",
        category: ProtocolCategory::Dex,
        addresses: &[
            "0x7968a225eba6c99f5f1070aeec1b405757dee939eabcfda43ba91588bf5fccf3",
            "0xfd1d8a523f1be89277ac0787ae3469312667e3d0b3f75a5f01bfc95530a2dc91",
            "0x9936836587ca33240d3d3f91844651b16cb07802faf5e34514ed6f78580deb0a",
            "0xc7efb4076dbe143cbcd98cfaaa929ecfc8f299203dfff63b95ccb6bfe19850fa",
        ],
    },
    ProtocolRecord {
        name: "VibrantX",
        label: "VibrantX",
        category: ProtocolCategory::Dex,
        addresses: &["0x17f1e926a81639e9557f4e4934df93452945ec30bc962e11351db59eb0d78c33"],
    },
    ProtocolRecord {
        name: "Thala Infrastructure",
        label: "Thala",
        category: ProtocolCategory::Infrastructure,
        addresses: &[
            "0x9c6d58fa009e08dfb2f5928ded14b3a790a94131da89891466b41ba1e61d83e1",
            "0x4dcae85fc5559071906cd5c76b7420fcbb4b0a92f00ab40ffc394aadbbff5ee9",
            "0x93aa044a65a27bd89b163f8b3be3777b160b09a25c336643dcc2878dfd8f2a8d",
            "0x9e7309b2b63130211f5414c5efe2468bb725e884392dfca86b10975df25d78dd",
            "0x007730cd28ee1cdc9e999336cbc430f99e7c44397c0aa77516f6f23a78559bb5",
            "0x60955b957956d79bc80b096d3e41bad525dd400d8ce957cdeb05719ed1e4fc26",
            "0x1bf23f0881f8fa149500ff6b7a047f608967c028a8ad7a2100caa84833ce851d",
            "0xfb6e709add23c710c40e4844d889938f703719f72d2d4439ee682d67f07a15c5",
            "0x48271d39d0b05bd6efca2278f22277d6fcc375504f9839fd73f74ace240861af",
            "0x092e95ed77b5ac815d3fbc2227e76db238339e9ca43ace45031ec2589bea5b8c",
            "0x07fd500c11216f0fe3095d0c4b8aa4d64a4e2e04f83758462f2b127255643615",
            "0x6970b4878c3aea96732be3f31c2dded12d94d9455ff0c76c67d84859dce35136",
        ],
    },
    ProtocolRecord {
        name: "Thala CDP",
        label: "MOD",
        category: ProtocolCategory::Lending,
        addresses: &["0x6f986d146e4a90b828d8c12c14b6f4e003fdff11a8eecceceb63744363eaac01"],
    },
    ProtocolRecord {
        name: "Echelon",
        label: "Echelon",
        category: ProtocolCategory::Lending,
        addresses: &[
            "0xc6bc659f1649553c1a3fa05d9727433dc03843baac29473c817d06d39e7621ba",
            "0x024c90c44edf46aa02c3e370725b918a59c52b5aa551388feb258bd5a1e82271",
        ],
    },
    ProtocolRecord {
        name: "Echo Lending",
        label: "Echo",
        category: ProtocolCategory::Lending,
        addresses: &[
            "0xeab7ea4d635b6b6add79d5045c4a45d8148d88287b1cfa1c3b6a4b56f46839ed",
            "0x4e1854f6d332c9525e258fb6e66f84b6af8aba687bbcb832a24768c4e175feec",
        ],
    },
    ProtocolRecord {
        name: "Meso Finance",
        label: "Meso",
        category: ProtocolCategory::Lending,
        addresses: &["0x68476f9d437e3f32fd262ba898b5e3ee0a23a1d586a6cf29a28add35f253f6f7"],
    },
    ProtocolRecord {
        name: "Joule Finance",
        label: "Joule",
        category: ProtocolCategory::Lending,
        addresses: &[
            "0x2fe576faa841347a9b1b32c869685deb75a15e3f62dfe37cbd6d52cc403a16f6",
            "0x3b90501eae5cdc53c507d53b4ddc5a37e620743ef0b53a6aa4f711118890d1e5",
        ],
    },
    ProtocolRecord {
        name: "Superposition",
        label: "Superposition",
        category: ProtocolCategory::Lending,
        addresses: &["0xccd1a84ccea93531d7f165b90134aa0415feb30e8757ab1632dac68c0055f5c2"],
    },
    ProtocolRecord {
        name: "Aave",
        label: "AAVE",
        category: ProtocolCategory::Lending,
        addresses: &[
            "0x34c3e6af238f3a7fa3f3b0088cbc4b194d21f62e65a15b79ae91364de5a81a3a",
            "0x531069f4741cdead39d70b76e5779863864654fae6db8a752a244ff2f9916c15",
            "0x5eb5cc775c5a446db0f3a1c944e11563b97e6a7e1387b9fb459aa26168f738dc",
            "0xc0338eea778de2a5348824ddbfcec033c7f7cbe18da6da40869562906b63c78c",
            "0x12b05c42ac3209a3c6ffadff4ebb6c3e983e5115f26031d56652815b49a14245",
            "0x249676f3faddb83d64fd101baa3f84a171ae02505d796e3edbf4861038a4b5cc",
            "0x39ddcd9e1a39fa14f25e3f9ec8a86074d05cc0881cbf667df8a6ee70942016fb",
        ],
    },
    ProtocolRecord {
        name: "LiquidSwap",
        label: "LiquidSwap",
        category: ProtocolCategory::Dex,
        addresses: &[
            "0x190d44266241744264b964a37b8f09863167a12d3e70cda39376cfb4e3561e12",
            "0x0163df34fccbf003ce219d3f1d9e70d140b60622cb9dd47599c25fb2f797ba6e",
            "0x54cb0bb2c18564b86e34539b9f89cfe1186e39d89fce54e1cd007b8e61673a85",
            "0xb247ddeee87e848315caf9a33b8e4c71ac53db888cb88143d62d2370cca0ead2",
            "0x80273859084bc47f92a6c2d3e9257ebb2349668a1b0fb3db1d759a04c7628855",
            "0x61d2c22a6cb7831bee0f48363b0eec92369357aece0d1142062f7d5d85c7bef8",
            "0x05a97986a9d031c4567e15b797be516910cfcb4156312482efc6a19c0a30c948",
        ],
    },
    ProtocolRecord {
        name: "Cellana Finance",
        label: "CELL",
        category: ProtocolCategory::Dex,
        addresses: &[
            "0x4bf51972879e3b95c4781a5cdcb9e1ee24ef483e7d22f2d903626f126df62bd1",
            "0xea098f1fa9245447c792d18c069433f5da2904358e1e340c55bdc68a8f5fe037",
        ],
    },
    ProtocolRecord {
        name: "Panora Exchange",
        label: "Panora",
        category: ProtocolCategory::Dex,
        addresses: &["0x1c3206329806286fd2223647c9f9b130e66baeb6d7224a18c1f642ffe48f3b4c"],
    },
    ProtocolRecord {
        name: "KanaLabs",
        label: "KANA",
        category: ProtocolCategory::Dex,
        addresses: &[
            "0x9538c839fe490ccfaf32ad9f7491b5e84e610ff6edc110ff883f06ebde82463d",
            "0x7a38039fffd016adcac2c53795ee49325e5ec6fddf3bf02651c09f9a583655a6",
        ],
    },
    ProtocolRecord {
        name: "Hyperion",
        label: "Hyperion",
        category: ProtocolCategory::Dex,
        addresses: &["0x8b4a2c4bb53857c718a04c020b98f8c2e1f99a68b0f57389a8bf5434cd22e05c"],
    },
    ProtocolRecord {
        name: "Wormhole",
        label: "Wormhole",
        category: ProtocolCategory::Bridge,
        addresses: &[
            "0x5bc11445584a763c1fa7ed39081f1b920954da14e04b32440cba863d03e19625",
            "0x576410486a2da45eee6c949c995670112ddf2fbeedab20350d506328eefc9d4f",
        ],
    },
    ProtocolRecord {
        name: "Celer Bridge",
        label: "Celer",
        category: ProtocolCategory::Bridge,
        addresses: &["0x8d87a65ba30e09357fa2edea2c80dbac296e5dec2b18287113500b902942929d"],
    },
    ProtocolRecord {
        name: "TruFin",
        label: "TruFin",
        category: ProtocolCategory::LiquidStaking,
        addresses: &["0x6f8ca77dd0a4c65362f475adb1c26ae921b1d75aa6b70e53d0e340efd7d8bc80"],
    },
    ProtocolRecord {
        name: "Uptos Pump",
        label: "UPTOS",
        category: ProtocolCategory::Dex,
        addresses: &["0x4e5e85fd647c7e19560590831616a3c021080265576af3182535a1d19e8bc2b3"],
    },
    ProtocolRecord {
        name: "Defy",
        label: "DEFY",
        category: ProtocolCategory::Dex,
        addresses: &["0xcd7b88c2181881bf8e7ef741cae867aee038e75df94224496a4a81627edf7f65"],
    },
    ProtocolRecord {
        name: "Lucid Finance",
        label: "Lucid",
        category: ProtocolCategory::Dex,
        addresses: &["0xa3111961a31597ca770c60be02fc9f72bdee663f563e45223e79793557eef0d9"],
    },
    ProtocolRecord {
        name: "Pact Labs",
        label: "PACT",
        category: ProtocolCategory::Dex,
        addresses: &["0xddb92cba8f18ae94c40c49ca27a2ba31eca85ce37a436e25d36c8e1f516d9c62"],
    },
    ProtocolRecord {
        name: "Thetis",
        label: "Thetis",
        category: ProtocolCategory::Dex,
        addresses: &["0x0c727553dd5019c4887581f0a89dca9c8ea400116d70e9da7164897812c6646e"],
    },
    ProtocolRecord {
        name: "SushiSwap",
        label: "SUSHI",
        category: ProtocolCategory::Dex,
        addresses: &["0x31a6675cbe84365bf2b0cbce617ece6c47023ef70826533bde5203d32171dc3c"],
    },
    ProtocolRecord {
        name: "Wapal",
        label: "Wapal",
        category: ProtocolCategory::NftMarketplace,
        addresses: &["0x584b50b999c78ade62f8359c91b5165ff390338d45f8e55969a04e65d76258c9"],
    },
    ProtocolRecord {
        name: "Mercato",
        label: "Mercato",
        category: ProtocolCategory::NftMarketplace,
        addresses: &["0xe11c12ec495f3989c35e1c6a0af414451223305b579291fc8f3d9d0575a23c26"],
    },
    ProtocolRecord {
        name: "BlueMove",
        label: "BlueMove",
        category: ProtocolCategory::NftMarketplace,
        addresses: &[
            "0xd1fd99c1944b84d1670a2536417e997864ad12303d19eac725891691b04d614e",
            "0x51e68edb69491e23b350d1744cc612e837d26d76bf7b3f7cae2f42fab78f1671",
            "0xd520d8669b0a3de23119898dcdff3e0a27910db247663646ad18cf16e44c6f5",
        ],
    },
];

/// Address-ordered protocol lookup.
///
/// Construction flattens every record's address list into one lookup
/// vector sorted longest-first. Addresses must be globally unique across
/// records; a duplicate is a table bug, not a runtime condition.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    records: IndexMap<&'static str, ProtocolRecord>,
    /// (address, record name), longest address first.
    lookup: Vec<(&'static str, &'static str)>,
}

impl ProtocolRegistry {
    pub fn new(records: impl IntoIterator<Item = ProtocolRecord>) -> Self {
        let records: IndexMap<&'static str, ProtocolRecord> =
            records.into_iter().map(|r| (r.name, r)).collect();
        let mut lookup: Vec<(&'static str, &'static str)> = Vec::new();
        for record in records.values() {
            for address in record.addresses {
                lookup.push((address, record.name));
            }
        }
        // El sort es estable: a igual longitud manda el orden de inserción.
        lookup.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { records, lookup }
    }

    /// First record (longest-address-first order) whose address appears
    /// inside the identifier.
    pub fn classify(&self, type_identifier: &str) -> Option<&ProtocolRecord> {
        self.lookup
            .iter()
            .find(|(address, _)| type_identifier.contains(address))
            .and_then(|(_, name)| self.records.get(name))
    }

    /// Whether the asset is locked/wrapped rather than freely held.
    ///
    /// Three short-circuit tiers: pattern list, protocol category (with a
    /// tradable-symbol exception for bridges), then known staked symbols.
    pub fn is_phantom_asset(&self, type_identifier: &str, symbol: Option<&str>) -> bool {
        if PHANTOM_PATTERNS.is_match(type_identifier) {
            return true;
        }

        if let Some(record) = self.classify(type_identifier) {
            match record.category {
                ProtocolCategory::Bridge => {
                    if let Some(symbol) = symbol {
                        let upper = symbol.to_uppercase();
                        if TRADABLE_BRIDGED_SYMBOLS.iter().any(|t| upper.contains(t)) {
                            return false;
                        }
                    }
                    return true;
                }
                ProtocolCategory::LiquidStaking | ProtocolCategory::Farming => return true,
                _ => {}
            }
        }

        if let Some(symbol) = symbol {
            let lower = symbol.to_lowercase();
            if STAKED_ASSET_SYMBOLS
                .iter()
                .any(|s| lower.contains(&s.to_lowercase()))
            {
                return true;
            }
        }

        false
    }

    /// Human-readable reason an asset is considered phantom. Never fails;
    /// unclassified input gets a generic explanation.
    pub fn phantom_reason(&self, type_identifier: &str) -> String {
        if let Some(record) = self.classify(type_identifier) {
            return match record.category {
                ProtocolCategory::LiquidStaking => format!("Staked in {}", record.name),
                ProtocolCategory::Bridge => format!("Locked in {} bridge", record.name),
                ProtocolCategory::Farming => format!("Deposited in {} farm", record.name),
                ProtocolCategory::Lending => format!("Collateral in {}", record.name),
                _ => format!("Locked in {}", record.name),
            };
        }
        if LOCKED_RE.is_match(type_identifier) {
            return "Locked in protocol contract".to_string();
        }
        if STAKED_RE.is_match(type_identifier) {
            return "Staked in protocol".to_string();
        }
        if DEPOSIT_RE.is_match(type_identifier) {
            return "Deposited in protocol".to_string();
        }
        "Potentially locked in DeFi protocol".to_string()
    }

    /// Public classify operation: protocol, label, phantom flag, reason.
    pub fn classification(&self, type_identifier: &str, symbol: Option<&str>) -> Classification {
        let record = self.classify(type_identifier);
        let is_phantom = self.is_phantom_asset(type_identifier, symbol);
        Classification {
            protocol: record.map(|r| r.name.to_string()),
            label: record.map(|r| r.label.to_string()),
            is_phantom,
            phantom_reason: is_phantom.then(|| self.phantom_reason(type_identifier)),
        }
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &ProtocolRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new(BUILTIN_PROTOCOLS.iter().copied())
    }
}
