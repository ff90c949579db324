//! Teleport parameter normalization and validation.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::balance::ChainBackend;
use crate::chains::{self, Asset, Chain};
use crate::sdk::error::{SdkError, SdkResult};
use crate::teleport::types::{TeleportMode, TeleportParams};

/// Teleport parameters as supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTeleportParams {
    pub address: String,
    /// Destination chain name.
    pub chain: String,
    /// Base units as a decimal integer string.
    pub amount: String,
    pub asset: String,
    /// Defaults to `expected`.
    #[serde(default)]
    pub teleport_mode: Option<String>,
}

impl RawTeleportParams {
    pub fn new(address: &str, chain: Chain, amount: impl ToString, asset: Asset) -> Self {
        Self {
            address: address.to_string(),
            chain: chain.to_string(),
            amount: amount.to_string(),
            asset: asset.to_string(),
            teleport_mode: None,
        }
    }

    pub fn with_mode(mut self, mode: TeleportMode) -> Self {
        self.teleport_mode = Some(mode.as_str().to_string());
        self
    }
}

/// Normalize, validate and convert `raw`, reporting every violated rule at once.
pub fn prepare_params(raw: &RawTeleportParams, backend: &dyn ChainBackend) -> SdkResult<TeleportParams> {
    let address = raw.address.trim();
    let chain = raw.chain.trim().parse::<Chain>().ok();
    let asset = raw.asset.trim().parse::<Asset>().ok();
    let amount = U256::from_str_radix(raw.amount.trim(), 10)
        .ok()
        .filter(|amount| !amount.is_zero());
    let mode = match raw.teleport_mode.as_deref().map(str::trim) {
        None | Some("") => Some(TeleportMode::Expected),
        Some(mode) => TeleportMode::parse(mode),
    };
    let chain_holds_asset = match (chain, asset) {
        (Some(chain), Some(asset)) => chains::route_chains(chain, asset).contains(&chain),
        _ => false,
    };

    let mut errors = Vec::new();
    if !backend.is_valid_address(address) {
        errors.push("Invalid address format");
    }
    if asset.is_none() {
        errors.push("Invalid asset");
    }
    if amount.is_none() {
        errors.push("Amount must be greater than 0");
    }
    if chain.is_none() {
        errors.push("Invalid chain");
    }
    if !chain_holds_asset {
        errors.push("Asset not supported on the specified chain");
    }
    if mode.is_none() {
        errors.push("Invalid teleport mode");
    }

    match (chain, asset, amount, mode) {
        (Some(destination), Some(asset), Some(amount), Some(teleport_mode)) if errors.is_empty() => {
            Ok(TeleportParams {
                address: address.to_string(),
                destination,
                amount,
                asset,
                teleport_mode,
            })
        }
        _ => Err(SdkError::InvalidParams(format!(
            "Invalid teleport parameters: {}",
            errors.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{BalanceResult, BalanceStream};
    use async_trait::async_trait;

    const ADDRESS: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";

    struct ShapeOnly;

    #[async_trait]
    impl ChainBackend for ShapeOnly {
        async fn read(&self, _chain: Chain, _address: &str, _asset: Asset) -> BalanceResult<U256> {
            Ok(U256::ZERO)
        }

        async fn watch(&self, _chain: Chain, _address: &str, _asset: Asset) -> BalanceResult<BalanceStream> {
            Ok(Box::pin(futures_util::stream::empty()))
        }
    }

    #[test]
    fn test_defaults_mode_and_converts_amount() {
        let raw = RawTeleportParams::new(ADDRESS, Chain::AssetHubPolkadot, "1000000", Asset::Dot);
        let params = prepare_params(&raw, &ShapeOnly).unwrap();

        assert_eq!(params.teleport_mode, TeleportMode::Expected);
        assert_eq!(params.amount, U256::from(1_000_000u64));
        assert_eq!(params.destination, Chain::AssetHubPolkadot);
    }

    #[test]
    fn test_reports_every_violation() {
        let raw = RawTeleportParams {
            address: "nope".into(),
            chain: "Moonbeam".into(),
            amount: "0".into(),
            asset: "USDT".into(),
            teleport_mode: Some("sometimes".into()),
        };

        let err = prepare_params(&raw, &ShapeOnly).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid teleport parameters: Invalid address format, Invalid asset, \
             Amount must be greater than 0, Invalid chain, \
             Asset not supported on the specified chain, Invalid teleport mode"
        );
    }

    #[test]
    fn test_asset_must_live_on_destination() {
        let raw = RawTeleportParams::new(ADDRESS, Chain::Kusama, "5", Asset::Dot);
        let err = prepare_params(&raw, &ShapeOnly).unwrap_err();
        assert_eq!(
            err,
            SdkError::InvalidParams(
                "Invalid teleport parameters: Asset not supported on the specified chain".into()
            )
        );
    }

    #[test]
    fn test_fractional_amount_rejected() {
        let raw = RawTeleportParams::new(ADDRESS, Chain::Polkadot, "1.5", Asset::Dot).with_mode(TeleportMode::Only);
        assert!(prepare_params(&raw, &ShapeOnly).is_err());
    }
}
