//! Chain and asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chains known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chain {
    Polkadot,
    AssetHubPolkadot,
    Kusama,
    AssetHubKusama,
    Hydration,
    AssetHubPaseo,
    CoretimePaseo,
    HydrationPaseo,
}

impl Chain {
    pub const ALL: [Chain; 8] = [
        Chain::Polkadot,
        Chain::AssetHubPolkadot,
        Chain::Kusama,
        Chain::AssetHubKusama,
        Chain::Hydration,
        Chain::AssetHubPaseo,
        Chain::CoretimePaseo,
        Chain::HydrationPaseo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Polkadot => "Polkadot",
            Chain::AssetHubPolkadot => "AssetHubPolkadot",
            Chain::Kusama => "Kusama",
            Chain::AssetHubKusama => "AssetHubKusama",
            Chain::Hydration => "Hydration",
            Chain::AssetHubPaseo => "AssetHubPaseo",
            Chain::CoretimePaseo => "CoretimePaseo",
            Chain::HydrationPaseo => "HydrationPaseo",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown chain: {0}")]
pub struct UnknownChain(pub String);

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| UnknownChain(s.to_string()))
    }
}

/// Assets known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Dot,
    Ksm,
    Hdx,
    Pas,
}

impl Asset {
    pub const ALL: [Asset; 4] = [Asset::Dot, Asset::Ksm, Asset::Hdx, Asset::Pas];

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Dot => "DOT",
            Asset::Ksm => "KSM",
            Asset::Hdx => "HDX",
            Asset::Pas => "PAS",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown asset: {0}")]
pub struct UnknownAsset(pub String);

impl FromStr for Asset {
    type Err = UnknownAsset;

    /// Symbols are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Asset::ALL
            .into_iter()
            .find(|asset| asset.as_str() == upper)
            .ok_or_else(|| UnknownAsset(s.to_string()))
    }
}

/// Relay ecosystem a chain belongs to. Transfers never cross ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    Polkadot,
    Kusama,
    Paseo,
}

/// Static per-chain properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainProperties {
    pub ss58_format: u16,
    pub token_decimals: u8,
    pub token_symbol: Asset,
    pub block_explorer: &'static str,
}
