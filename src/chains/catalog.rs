//! Compiled-in catalog of chain properties, assets and endpoints.

use alloy::primitives::{Address, B256, U256};

use crate::chains::types::{Asset, Chain, ChainProperties, Ecosystem};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// An asset held on a chain, with the chain's existential deposit for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetEntry {
    pub asset: Asset,
    pub existential_deposit: u128,
    pub decimals: u8,
}

const fn entry(asset: Asset, existential_deposit: u128, decimals: u8) -> AssetEntry {
    AssetEntry {
        asset,
        existential_deposit,
        decimals,
    }
}

pub fn chain_properties(chain: Chain) -> ChainProperties {
    let (ss58_format, token_decimals, token_symbol, block_explorer) = match chain {
        Chain::Polkadot => (0, 10, Asset::Dot, "https://polkadot.subscan.io/"),
        Chain::AssetHubPolkadot => (0, 10, Asset::Dot, "https://assethub-polkadot.subscan.io/"),
        Chain::Kusama => (2, 12, Asset::Ksm, "https://kusama.subscan.io/"),
        Chain::AssetHubKusama => (2, 12, Asset::Ksm, "https://assethub-kusama.subscan.io/"),
        Chain::Hydration => (2, 12, Asset::Hdx, "https://hydradx.subscan.io"),
        Chain::AssetHubPaseo => (2, 10, Asset::Pas, "https://assethub-paseo.subscan.io/"),
        Chain::CoretimePaseo => (2, 10, Asset::Pas, "https://coretime-paseo.subscan.io/"),
        Chain::HydrationPaseo => (2, 12, Asset::Hdx, "https://hydradx-paseo.subscan.io/"),
    };

    ChainProperties {
        ss58_format,
        token_decimals,
        token_symbol,
        block_explorer,
    }
}

/// Human-readable chain name.
pub fn chain_name(chain: Chain) -> &'static str {
    match chain {
        Chain::Polkadot => "Polkadot",
        Chain::AssetHubPolkadot => "PolkadotHub",
        Chain::Kusama => "Kusama",
        Chain::AssetHubKusama => "KusamaHub",
        Chain::Hydration => "Hydration",
        Chain::AssetHubPaseo => "AssetHub Paseo",
        Chain::CoretimePaseo => "Coretime Paseo",
        Chain::HydrationPaseo => "Hydration Paseo",
    }
}

pub fn block_explorer_of(chain: Chain) -> &'static str {
    chain_properties(chain).block_explorer
}

pub fn ecosystem_of(chain: Chain) -> Ecosystem {
    match chain {
        Chain::Polkadot | Chain::AssetHubPolkadot | Chain::Hydration => Ecosystem::Polkadot,
        Chain::Kusama | Chain::AssetHubKusama => Ecosystem::Kusama,
        Chain::AssetHubPaseo | Chain::CoretimePaseo | Chain::HydrationPaseo => Ecosystem::Paseo,
    }
}

/// Assets transferable on `chain`.
pub fn supported_assets(chain: Chain) -> &'static [AssetEntry] {
    const POLKADOT: &[AssetEntry] = &[entry(Asset::Dot, 10_000_000_000, 10)];
    const ASSET_HUB_POLKADOT: &[AssetEntry] = &[entry(Asset::Dot, 100_000_000, 10)];
    const HYDRATION: &[AssetEntry] = &[
        entry(Asset::Dot, 17_540_000, 10),
        entry(Asset::Hdx, 1_000_000_000_000, 12),
    ];
    const KUSAMA: &[AssetEntry] = &[entry(Asset::Ksm, 333_333_333, 12)];
    const ASSET_HUB_KUSAMA: &[AssetEntry] = &[entry(Asset::Ksm, 3_333_333, 12)];
    const ASSET_HUB_PASEO: &[AssetEntry] = &[entry(Asset::Pas, 100_000_000, 10)];
    const CORETIME_PASEO: &[AssetEntry] = &[entry(Asset::Pas, 100_000_000, 10)];
    const HYDRATION_PASEO: &[AssetEntry] = &[
        entry(Asset::Pas, 17_540_000, 10),
        entry(Asset::Hdx, 1_000_000_000_000, 12),
    ];

    match chain {
        Chain::Polkadot => POLKADOT,
        Chain::AssetHubPolkadot => ASSET_HUB_POLKADOT,
        Chain::Hydration => HYDRATION,
        Chain::Kusama => KUSAMA,
        Chain::AssetHubKusama => ASSET_HUB_KUSAMA,
        Chain::AssetHubPaseo => ASSET_HUB_PASEO,
        Chain::CoretimePaseo => CORETIME_PASEO,
        Chain::HydrationPaseo => HYDRATION_PASEO,
    }
}

fn asset_entry(chain: Chain, asset: Asset) -> Option<AssetEntry> {
    supported_assets(chain)
        .iter()
        .copied()
        .find(|entry| entry.asset == asset)
}

pub fn is_asset_supported(chain: Chain, asset: Asset) -> bool {
    asset_entry(chain, asset).is_some()
}

/// Existential deposit of `asset` on `chain`, or `None` if the chain does not hold it.
pub fn existential_deposit(chain: Chain, asset: Asset) -> Option<U256> {
    asset_entry(chain, asset).map(|entry| U256::from(entry.existential_deposit))
}

pub fn asset_decimals(chain: Chain, asset: Asset) -> Option<u8> {
    asset_entry(chain, asset).map(|entry| entry.decimals)
}

/// Chains a teleport to `destination` may touch: the destination first,
/// then every other chain of the same ecosystem holding `asset`.
///
/// Empty when the destination itself does not hold the asset.
pub fn route_chains(destination: Chain, asset: Asset) -> Vec<Chain> {
    if !is_asset_supported(destination, asset) {
        return Vec::new();
    }

    let ecosystem = ecosystem_of(destination);
    let origins = Chain::ALL.into_iter().filter(|origin| {
        *origin != destination
            && ecosystem_of(*origin) == ecosystem
            && is_asset_supported(*origin, asset)
    });

    std::iter::once(destination).chain(origins).collect()
}

/// Public RPC endpoints used when the configuration has no override.
pub fn default_endpoints(chain: Chain) -> &'static [&'static str] {
    match chain {
        Chain::Polkadot => &[
            "wss://polkadot-rpc.publicnode.com",
            "wss://rpc.ibp.network/polkadot",
            "wss://polkadot.dotters.network",
        ],
        Chain::AssetHubPolkadot => &[
            "wss://polkadot-asset-hub-rpc.polkadot.io",
            "wss://sys.ibp.network/asset-hub-polkadot",
            "wss://asset-hub-polkadot.dotters.network",
        ],
        Chain::Kusama => &[
            "wss://kusama-rpc.publicnode.com",
            "wss://rpc.ibp.network/kusama",
            "wss://kusama.dotters.network",
        ],
        Chain::AssetHubKusama => &[
            "wss://kusama-asset-hub-rpc.polkadot.io",
            "wss://sys.ibp.network/asset-hub-kusama",
            "wss://asset-hub-kusama.dotters.network",
        ],
        Chain::Hydration => &[
            "wss://rpc.hydradx.cloud",
            "wss://hydration.ibp.network",
            "wss://hydration.dotters.network",
        ],
        Chain::AssetHubPaseo => &[
            "wss://sys.ibp.network/asset-hub-paseo",
            "wss://asset-hub-paseo.dotters.network",
        ],
        Chain::CoretimePaseo => &[
            "wss://sys.ibp.network/coretime-paseo",
            "wss://coretime-paseo.dotters.network",
        ],
        Chain::HydrationPaseo => &["wss://paseo-rpc.play.hydration.cloud"],
    }
}

/// Shape check for an account address: a 20 or 32 byte 0x-hex key, or an
/// SS58-looking base58 string.
pub fn is_plausible_address(address: &str) -> bool {
    if address.starts_with("0x") {
        return address.parse::<Address>().is_ok() || address.parse::<B256>().is_ok();
    }

    (46..=48).contains(&address.len()) && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_chains_destination_first_same_ecosystem() {
        assert_eq!(
            route_chains(Chain::AssetHubPolkadot, Asset::Dot),
            vec![Chain::AssetHubPolkadot, Chain::Polkadot, Chain::Hydration]
        );
        assert_eq!(
            route_chains(Chain::Kusama, Asset::Ksm),
            vec![Chain::Kusama, Chain::AssetHubKusama]
        );
    }

    #[test]
    fn test_route_chains_empty_without_destination_support() {
        assert!(route_chains(Chain::Polkadot, Asset::Ksm).is_empty());
        assert!(route_chains(Chain::AssetHubKusama, Asset::Hdx).is_empty());
    }

    #[test]
    fn test_existential_deposits() {
        assert_eq!(
            existential_deposit(Chain::AssetHubPolkadot, Asset::Dot),
            Some(U256::from(100_000_000u64))
        );
        assert_eq!(existential_deposit(Chain::Kusama, Asset::Dot), None);
        assert_eq!(asset_decimals(Chain::Hydration, Asset::Hdx), Some(12));
    }

    #[test]
    fn test_chain_properties() {
        let props = chain_properties(Chain::Kusama);
        assert_eq!(props.ss58_format, 2);
        assert_eq!(props.token_decimals, 12);
        assert_eq!(chain_name(Chain::AssetHubKusama), "KusamaHub");
        assert!(block_explorer_of(Chain::Polkadot).contains("subscan"));
    }

    #[test]
    fn test_plausible_addresses() {
        assert!(is_plausible_address("15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5"));
        assert!(is_plausible_address("0x000000000000000000000000000000000000dEaD"));
        assert!(is_plausible_address(
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        ));
        assert!(!is_plausible_address("not-an-address"));
        assert!(!is_plausible_address("0x1234"));
        // '0' and 'l' are outside the base58 alphabet
        assert!(!is_plausible_address("0oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Spl"));
    }
}
