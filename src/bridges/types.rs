//! Quote model, transfer collaborator contracts and bridge errors.

use alloy::primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::balance::BalanceError;
use crate::chains::{Asset, Chain};
use crate::teleport::types::TeleportMode;

/// Cross-chain messaging protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BridgeProtocol {
    #[serde(rename = "XCM")]
    Xcm,
}

impl BridgeProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeProtocol::Xcm => "XCM",
        }
    }
}

impl fmt::Display for BridgeProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub origin: Chain,
    pub destination: Chain,
    pub protocol: BridgeProtocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFees {
    pub bridge: U256,
    pub total: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteExecution {
    pub required_signature_count: u32,
    pub estimated_time_ms: u64,
}

/// A priced, feasibility-checked teleport proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub teleport_mode: TeleportMode,
    pub route: Route,
    pub fees: QuoteFees,
    /// Deducted from the origin.
    pub send_amount: U256,
    /// Expected to arrive at the destination.
    pub receive_amount: U256,
    pub asset: Asset,
    pub execution: QuoteExecution,
}

/// Inputs shared by fee estimation, dry run, build and transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub origin: Chain,
    pub destination: Chain,
    pub address: String,
    pub asset: Asset,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeEstimate {
    pub origin_fee: U256,
    pub destination_fee: U256,
}

impl FeeEstimate {
    pub fn total(&self) -> U256 {
        self.origin_fee.saturating_add(self.destination_fee)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DryRunOutcome {
    pub failure_reason: Option<String>,
}

/// An encoded call ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub request: TransferRequest,
    pub call: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Unknown,
    Broadcast,
    Block,
    Finalized,
}

/// Lifecycle update streamed while a transaction is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub status: TransactionStatus,
    pub tx_hash: Option<B256>,
    pub error: Option<String>,
}

pub type TransactionCallback = Arc<dyn Fn(TransactionUpdate) + Send + Sync>;

pub type TransactionStream = BoxStream<'static, TransactionUpdate>;

/// Signs on behalf of one account.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn account(&self) -> &str;

    async fn sign(&self, payload: &[u8]) -> BridgeResult<Bytes>;
}

/// Supplies a signer for an account.
#[async_trait]
pub trait SignerProvider: Send + Sync {
    async fn signer_for(&self, address: &str) -> BridgeResult<Arc<dyn TransactionSigner>>;
}

/// Protocol-specific transaction builder and submitter.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn estimate_fee(&self, request: &TransferRequest) -> BridgeResult<FeeEstimate>;

    async fn dry_run(&self, request: &TransferRequest) -> BridgeResult<DryRunOutcome>;

    async fn build(&self, request: &TransferRequest) -> BridgeResult<BuiltTransaction>;

    async fn submit_and_sign(
        &self,
        transaction: BuiltTransaction,
        signer: Arc<dyn TransactionSigner>,
    ) -> BridgeResult<TransactionStream>;
}

/// Errors that can occur during bridge operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge adapter not registered: {0}")]
    NotRegistered(BridgeProtocol),

    #[error("Fee estimation failed from {origin}: {message}")]
    Fee { origin: Chain, message: String },

    #[error("Dry run failed: {0}")]
    DryRun(String),

    #[error("Transaction build failed: {0}")]
    Build(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error("Signer unavailable: {0}")]
    Signer(String),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
