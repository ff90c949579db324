//! Teleport and transaction records.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::bridges::types::{Route, TransactionStatus, TransferRequest};
use crate::chains::{Asset, Chain};
use crate::lifecycle::Subscription;
use crate::store::{Record, RecordEvent};

/// How the requested amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeleportMode {
    /// End up with `amount` available at the destination.
    #[default]
    Expected,
    /// Send exactly `amount`; the fee comes out of it.
    Exact,
    /// Spend at most `amount`, fee included.
    Only,
}

impl TeleportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeleportMode::Expected => "expected",
            TeleportMode::Exact => "exact",
            TeleportMode::Only => "only",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "expected" => Some(TeleportMode::Expected),
            "exact" => Some(TeleportMode::Exact),
            "only" => Some(TeleportMode::Only),
            _ => None,
        }
    }
}

/// Validated teleport request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeleportParams {
    pub address: String,
    /// Chain that must end up funded.
    pub destination: Chain,
    /// Target quantity in base units.
    pub amount: U256,
    pub asset: Asset,
    pub teleport_mode: TeleportMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeleportStatus {
    Pending,
    Transferring,
    Waiting,
    Completed,
    Failed,
}

impl TeleportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeleportStatus::Pending => "pending",
            TeleportStatus::Transferring => "transferring",
            TeleportStatus::Waiting => "waiting",
            TeleportStatus::Completed => "completed",
            TeleportStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TeleportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeleportEventKind {
    Started,
    Updated,
    Completed,
}

/// Immutable route and amounts of a teleport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeleportSummary {
    pub address: String,
    /// Sent from the origin, fees included.
    pub gross_amount: U256,
    /// Expected increase at the destination.
    pub expected_receive_amount: U256,
    pub asset: Asset,
    pub route: Route,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeleportDetails {
    pub id: String,
    pub status: TeleportStatus,
    pub details: TeleportSummary,
    pub events: Vec<RecordEvent>,
    pub timestamp_ms: u64,
    /// Completion confirmed by a destination balance check.
    pub checked: bool,
    /// Transferable destination balance before the first transfer. Arrival
    /// is confirmed against `baseline + expected_receive_amount`, so a
    /// retried confirmation still counts funds that landed late.
    pub destination_baseline: Option<U256>,
    pub error: Option<String>,
}

impl Record for TeleportDetails {
    type Status = TeleportStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> TeleportStatus {
        self.status
    }

    fn set_status(&mut self, status: TeleportStatus) {
        self.status = status;
    }

    fn events_mut(&mut self) -> &mut Vec<RecordEvent> {
        &mut self.events
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// What teleport listeners receive: the teleport and its transactions in order.
#[derive(Debug, Clone, Serialize)]
pub struct TeleportEventPayload {
    #[serde(flatten)]
    pub teleport: TeleportDetails,
    pub transactions: Vec<TransactionDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Teleport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionEventKind {
    Updated,
}

/// One step of a teleport.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub id: String,
    pub teleport_id: String,
    /// 0-based position in the teleport's sequence.
    pub order: u32,
    pub chain: Chain,
    pub kind: TransactionKind,
    pub details: TransferRequest,
    pub status: TransactionStatus,
    pub tx_hash: Option<B256>,
    pub error: Option<String>,
    /// Set once the transaction is finalized.
    pub succeeded: Option<bool>,
    pub events: Vec<RecordEvent>,
    pub timestamp_ms: u64,
    /// Releases the chain-side observer.
    #[serde(skip)]
    pub unsubscribe: Option<Subscription>,
}

impl Record for TransactionDetails {
    type Status = TransactionStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> TransactionStatus {
        self.status
    }

    fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    fn events_mut(&mut self) -> &mut Vec<RecordEvent> {
        &mut self.events
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Errors raised by teleport operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TeleportError {
    #[error("Teleport not found: {0}")]
    NotFound(String),

    #[error("Only failed teleports can be retried (status: {0})")]
    NotFailed(TeleportStatus),
}

/// Result type for teleport operations.
pub type TeleportResult<T> = Result<T, TeleportError>;
