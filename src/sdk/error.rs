//! SDK error taxonomy.

use thiserror::Error;

use crate::balance::BalanceError;
use crate::bridges::BridgeError;
use crate::teleport::TeleportError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SdkError {
    /// The configuration cannot be used.
    #[error("Invalid SDK configuration: {0}")]
    ConfigValidation(String),

    /// Initialization was repeated, skipped or failed.
    #[error("{0}")]
    Initialization(String),

    /// Every violated parameter rule, combined.
    #[error("{0}")]
    InvalidParams(String),

    /// Unknown session, or wrong status for the operation.
    #[error("{0}")]
    InvalidSession(String),

    #[error(transparent)]
    Teleport(#[from] TeleportError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
