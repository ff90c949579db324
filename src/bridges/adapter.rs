//! Bridge adapter contract.

use async_trait::async_trait;

use crate::bridges::types::{BridgeProtocol, BridgeResult, Quote, TransactionCallback, TransferRequest};
use crate::lifecycle::Subscription;
use crate::teleport::types::TeleportParams;

/// A protocol that can price and execute teleports.
#[async_trait]
pub trait BridgeAdapter: Send + Sync {
    fn protocol(&self) -> BridgeProtocol;

    /// Called once when the SDK initializes.
    async fn initialize(&self) -> BridgeResult<()> {
        Ok(())
    }

    /// Price a teleport. `Ok(None)` means no feasible route.
    async fn get_quote(&self, params: &TeleportParams) -> BridgeResult<Option<Quote>>;

    /// Build, sign and submit a transfer, forwarding lifecycle updates to
    /// `callback`. Never retries; the returned handle releases the observer.
    async fn transfer(&self, request: &TransferRequest, callback: TransactionCallback) -> BridgeResult<Subscription>;
}
