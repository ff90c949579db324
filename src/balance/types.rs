//! Balance types, errors and the chain backend contract.

use alloy::primitives::U256;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;

use crate::chains::{self, Asset, Chain};

/// An account's balance of one asset on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub chain: Chain,
    pub address: String,
    pub asset: Asset,
    /// Raw free amount in base units.
    pub amount: U256,
    /// `amount` minus the existential deposit, floored at zero.
    pub transferable: U256,
}

impl Balance {
    pub fn new(
        chain: Chain,
        address: impl Into<String>,
        asset: Asset,
        amount: U256,
        existential_deposit: Option<U256>,
    ) -> Self {
        let transferable = amount.saturating_sub(existential_deposit.unwrap_or(U256::ZERO));
        Self {
            chain,
            address: address.into(),
            asset,
            amount,
            transferable,
        }
    }
}

/// Errors that can occur while reading or waiting on balances.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// The backend failed to read or subscribe.
    #[error("Balance backend error on {chain}: {message}")]
    Backend { chain: Chain, message: String },

    /// The chain does not hold the asset.
    #[error("Asset {asset} is not available on {chain}")]
    UnknownAsset { chain: Chain, asset: Asset },

    /// A polling attempt saw a balance below its target.
    #[error("Balance on {chain} is {current}, waiting for {target}")]
    BelowThreshold {
        chain: Chain,
        current: U256,
        target: U256,
    },

    /// Polling gave up.
    #[error("Balance threshold not met on {chain} after {attempts} attempts (target {target:?}, last seen {last_seen:?})")]
    ThresholdNotMet {
        chain: Chain,
        target: Option<U256>,
        last_seen: Option<U256>,
        attempts: u32,
    },

    /// A live balance watch could not be opened.
    #[error("Balance watch failed on {chain}: {message}")]
    Watch { chain: Chain, message: String },
}

/// Result type for balance operations.
pub type BalanceResult<T> = Result<T, BalanceError>;

/// Push-based stream of raw amounts.
pub type BalanceStream = BoxStream<'static, U256>;

/// Chain access the oracle depends on.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Read the raw free balance.
    async fn read(&self, chain: Chain, address: &str, asset: Asset) -> BalanceResult<U256>;

    /// Open a live stream of raw free balances.
    async fn watch(&self, chain: Chain, address: &str, asset: Asset) -> BalanceResult<BalanceStream>;

    fn existential_deposit(&self, chain: Chain, asset: Asset) -> Option<U256> {
        chains::existential_deposit(chain, asset)
    }

    /// Whether `address` is an account this backend can serve.
    fn is_valid_address(&self, address: &str) -> bool {
        chains::is_plausible_address(address)
    }
}
