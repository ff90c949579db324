//! XCM adapter: origin selection, two-pass fee pricing and transfer submission.

use alloy::primitives::U256;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;

use crate::balance::{Balance, BalanceOracle};
use crate::bridges::adapter::BridgeAdapter;
use crate::bridges::types::{
    BridgeProtocol, BridgeResult, Quote, QuoteExecution, QuoteFees, Route, SignerProvider,
    TransactionCallback, TransferExecutor, TransferRequest,
};
use crate::chains;
use crate::config::SdkConfig;
use crate::lifecycle::Subscription;
use crate::observability::metrics;
use crate::teleport::types::{TeleportMode, TeleportParams};

const REQUIRED_SIGNATURE_COUNT: u32 = 1;

/// Amount to send from the origin, or `None` when it would be negative.
///
/// - Expected: `amount − destination_transferable + fee`
/// - Exact: `amount`
/// - Only: `amount − fee`
pub fn calculate_send_amount(
    mode: TeleportMode,
    amount: U256,
    fee: U256,
    destination_transferable: U256,
) -> Option<U256> {
    match mode {
        TeleportMode::Expected => amount.saturating_add(fee).checked_sub(destination_transferable),
        TeleportMode::Exact => Some(amount),
        TeleportMode::Only => amount.checked_sub(fee),
    }
}

pub struct XcmBridge {
    config: Arc<SdkConfig>,
    oracle: BalanceOracle,
    executor: Arc<dyn TransferExecutor>,
    signers: Arc<dyn SignerProvider>,
}

impl XcmBridge {
    pub fn new(
        config: Arc<SdkConfig>,
        oracle: BalanceOracle,
        executor: Arc<dyn TransferExecutor>,
        signers: Arc<dyn SignerProvider>,
    ) -> Self {
        Self {
            config,
            oracle,
            executor,
            signers,
        }
    }

    fn request(&self, origin: &Balance, params: &TeleportParams, amount: U256) -> TransferRequest {
        TransferRequest {
            origin: origin.chain,
            destination: params.destination,
            address: params.address.clone(),
            asset: params.asset,
            amount,
        }
    }

    async fn fee(&self, request: &TransferRequest) -> BridgeResult<U256> {
        let estimate = self.executor.estimate_fee(request).await?;
        Ok(estimate.total())
    }

    /// First candidate, by transferable balance descending, whose fee probe succeeds.
    async fn find_origin(&self, mut candidates: Vec<Balance>, params: &TeleportParams) -> Option<Balance> {
        // Stable: equal balances keep route order.
        candidates.sort_by(|a, b| b.transferable.cmp(&a.transferable));

        for candidate in candidates {
            let probe = self.request(&candidate, params, params.amount);
            match self.executor.estimate_fee(&probe).await {
                Ok(_) => return Some(candidate),
                Err(e) => {
                    tracing::debug!(origin = %candidate.chain, error = %e, "Origin probe failed, trying next");
                }
            }
        }

        None
    }

    async fn quote(&self, params: &TeleportParams) -> BridgeResult<Option<Quote>> {
        let route_chains: Vec<_> = chains::route_chains(params.destination, params.asset)
            .into_iter()
            .filter(|chain| self.config.is_chain_allowed(*chain))
            .collect();

        let balances = self
            .oracle
            .get_balances(&params.address, params.asset, &route_chains)
            .await?;

        let Some(destination) = balances.iter().find(|b| b.chain == params.destination).cloned() else {
            return Ok(None);
        };

        let candidates: Vec<Balance> = balances
            .into_iter()
            .filter(|b| b.chain != params.destination)
            .collect();

        let Some(origin) = self.find_origin(candidates, params).await else {
            return Ok(None);
        };

        // First pass always prices an Expected transfer.
        let probe_fee = self.fee(&self.request(&origin, params, params.amount)).await?;
        let Some(first_guess) = calculate_send_amount(
            TeleportMode::Expected,
            params.amount,
            probe_fee,
            destination.transferable,
        ) else {
            return Ok(None);
        };

        let fee = self.fee(&self.request(&origin, params, first_guess)).await?;
        let Some(send_amount) =
            calculate_send_amount(params.teleport_mode, params.amount, fee, destination.transferable)
        else {
            return Ok(None);
        };

        let dry_run = self
            .executor
            .dry_run(&self.request(&origin, params, send_amount))
            .await?;

        let receive_amount = send_amount.checked_sub(fee).unwrap_or(U256::ZERO);

        if send_amount.is_zero()
            || receive_amount.is_zero()
            || dry_run.failure_reason.is_some()
            || origin.transferable < send_amount
            || (params.teleport_mode == TeleportMode::Expected
                && destination.transferable.saturating_add(receive_amount) < params.amount)
        {
            tracing::debug!(
                origin = %origin.chain,
                send = %send_amount,
                receive = %receive_amount,
                dry_run_failure = ?dry_run.failure_reason,
                "Quote rejected"
            );
            return Ok(None);
        }

        Ok(Some(Quote {
            teleport_mode: params.teleport_mode,
            route: Route {
                origin: origin.chain,
                destination: params.destination,
                protocol: BridgeProtocol::Xcm,
            },
            fees: QuoteFees {
                bridge: fee,
                total: fee,
            },
            send_amount,
            receive_amount,
            asset: params.asset,
            execution: QuoteExecution {
                required_signature_count: REQUIRED_SIGNATURE_COUNT,
                estimated_time_ms: self.config.quote_time_ms,
            },
        }))
    }
}

#[async_trait]
impl BridgeAdapter for XcmBridge {
    fn protocol(&self) -> BridgeProtocol {
        BridgeProtocol::Xcm
    }

    async fn get_quote(&self, params: &TeleportParams) -> BridgeResult<Option<Quote>> {
        let quote = self.quote(params).await?;
        metrics::record_quote_outcome(if quote.is_some() { "quoted" } else { "infeasible" });
        Ok(quote)
    }

    async fn transfer(&self, request: &TransferRequest, callback: TransactionCallback) -> BridgeResult<Subscription> {
        let signer = self.signers.signer_for(&request.address).await?;
        let transaction = self.executor.build(request).await?;
        let mut updates = self.executor.submit_and_sign(transaction, signer).await?;

        tracing::info!(
            origin = %request.origin,
            destination = %request.destination,
            amount = %request.amount,
            "XCM transfer submitted"
        );

        let observer = tokio::spawn(async move {
            while let Some(update) = updates.next().await {
                callback(update);
            }
        });

        Ok(Subscription::new(move || observer.abort()))
    }
}
