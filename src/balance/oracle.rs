//! Balance reads, live subscriptions and threshold polling.

use alloy::primitives::U256;
use futures_util::future::{join_all, try_join_all};
use futures_util::StreamExt;
use std::sync::{Arc, OnceLock};

use crate::balance::types::{Balance, BalanceError, BalanceResult, BalanceStream, ChainBackend};
use crate::chains::{self, Asset, Chain};
use crate::lifecycle::Subscription;
use crate::observability::metrics;
use crate::resilience::{retry, RetryPolicy};

/// Invoked with the chain whose balance strictly increased.
pub type IncreaseCallback = Arc<dyn Fn(Chain) + Send + Sync>;

/// Reads balances through a [`ChainBackend`].
#[derive(Clone)]
pub struct BalanceOracle {
    backend: Arc<dyn ChainBackend>,
    policy: RetryPolicy,
}

/// Keeps the active-watch gauge honest when a watch task ends or is aborted.
struct WatchGuard;

impl WatchGuard {
    fn open() -> Self {
        metrics::watch_opened();
        WatchGuard
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        metrics::watch_closed();
    }
}

impl BalanceOracle {
    pub fn new(backend: Arc<dyn ChainBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &Arc<dyn ChainBackend> {
        &self.backend
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Single read. Not retried.
    pub async fn get_balance(&self, chain: Chain, address: &str, asset: Asset) -> BalanceResult<Balance> {
        if !chains::is_asset_supported(chain, asset) {
            return Err(BalanceError::UnknownAsset { chain, asset });
        }

        let amount = self.backend.read(chain, address, asset).await?;
        let existential_deposit = self.backend.existential_deposit(chain, asset);

        Ok(Balance::new(chain, address, asset, amount, existential_deposit))
    }

    /// Concurrent read across `chains`, in input order. Any failure fails the batch.
    pub async fn get_balances(&self, address: &str, asset: Asset, chains: &[Chain]) -> BalanceResult<Vec<Balance>> {
        try_join_all(chains.iter().map(|chain| self.get_balance(*chain, address, asset))).await
    }

    pub async fn has_enough_balance(
        &self,
        chain: Chain,
        address: &str,
        asset: Asset,
        amount: U256,
    ) -> BalanceResult<bool> {
        let balance = self.get_balance(chain, address, asset).await?;
        Ok(balance.transferable >= amount)
    }

    /// Watch every chain and call `on_increase` on each strict increase of
    /// the raw amount. Chains that cannot be watched are skipped.
    pub async fn subscribe_balances(
        &self,
        address: &str,
        asset: Asset,
        chains: &[Chain],
        on_increase: IncreaseCallback,
    ) -> Subscription {
        let opened = join_all(chains.iter().map(|chain| self.open_watch(*chain, address, asset))).await;

        let handles: Vec<Subscription> = opened
            .into_iter()
            .flatten()
            .map(|(chain, initial, mut stream)| {
                let on_increase = on_increase.clone();
                let task = tokio::spawn(async move {
                    let _guard = WatchGuard::open();
                    let mut last_seen = initial;

                    while let Some(amount) = stream.next().await {
                        if amount > last_seen {
                            tracing::debug!(chain = %chain, previous = %last_seen, current = %amount, "Balance increased");
                            on_increase(chain);
                        }
                        last_seen = amount;
                    }
                });
                Subscription::new(move || task.abort())
            })
            .collect();

        tracing::debug!(address = %address, asset = %asset, watches = handles.len(), "Balance subscriptions opened");
        Subscription::merge(handles)
    }

    async fn open_watch(
        &self,
        chain: Chain,
        address: &str,
        asset: Asset,
    ) -> Option<(Chain, U256, BalanceStream)> {
        let opened = async {
            let initial = self.backend.read(chain, address, asset).await?;
            let stream = self.backend.watch(chain, address, asset).await?;
            Ok::<_, BalanceError>((chain, initial, stream))
        }
        .await;

        match opened {
            Ok(watch) => Some(watch),
            Err(e) => {
                tracing::warn!(chain = %chain, error = %e, "Skipping balance subscription");
                None
            }
        }
    }

    /// Poll until the transferable balance reaches `target`.
    pub async fn wait_for_threshold(
        &self,
        address: &str,
        asset: Asset,
        chain: Chain,
        target: U256,
    ) -> BalanceResult<Balance> {
        self.poll_until(address, asset, chain, |_| target).await
    }

    /// Poll until the transferable balance grows by `delta` over the first
    /// successful reading.
    pub async fn wait_for_increase(
        &self,
        address: &str,
        asset: Asset,
        chain: Chain,
        delta: U256,
    ) -> BalanceResult<Balance> {
        let target = OnceLock::new();
        self.poll_until(address, asset, chain, |balance| {
            *target.get_or_init(|| balance.transferable.saturating_add(delta))
        })
        .await
    }

    async fn poll_until<F>(&self, address: &str, asset: Asset, chain: Chain, target_of: F) -> BalanceResult<Balance>
    where
        F: Fn(&Balance) -> U256,
    {
        let target_of = &target_of;
        let outcome = retry(self.policy, |attempt| async move {
            let balance = match self.get_balance(chain, address, asset).await {
                Ok(balance) => balance,
                Err(e) => {
                    metrics::record_balance_poll("retry");
                    tracing::debug!(chain = %chain, attempt, error = %e, "Balance poll failed");
                    return Err(e);
                }
            };

            let target = target_of(&balance);
            if balance.transferable >= target {
                metrics::record_balance_poll("met");
                Ok(balance)
            } else {
                metrics::record_balance_poll("retry");
                Err(BalanceError::BelowThreshold {
                    chain,
                    current: balance.transferable,
                    target,
                })
            }
        })
        .await;

        outcome.map_err(|exhausted| {
            metrics::record_balance_poll("exhausted");
            let (target, last_seen) = match exhausted.last_error {
                BalanceError::BelowThreshold { current, target, .. } => (Some(target), Some(current)),
                _ => (None, None),
            };
            tracing::error!(chain = %chain, attempts = exhausted.attempts, "Balance threshold not met");
            BalanceError::ThresholdNotMet {
                chain,
                target,
                last_seen,
                attempts: exhausted.attempts,
            }
        })
    }
}
