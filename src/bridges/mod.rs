//! Bridge adapters and registry.
//!
//! # Data Flow
//! ```text
//! TeleportParams
//!     → registry.rs (protocol → adapter)
//!     → xcm.rs get_quote:
//!         route chains ∩ configured chains
//!         → balances (oracle, all-or-nothing)
//!         → origin probe (highest transferable first, first fee probe that succeeds)
//!         → two-pass fee (Expected first guess, then the requested mode)
//!         → dry run + feasibility checks → Quote | None
//!     → xcm.rs transfer: signer → build → submit_and_sign → callback per update
//! ```
//!
//! # Design Decisions
//! - Infeasible quotes are `Ok(None)`, not errors
//! - Adapters never retry submissions; the teleport state machine does
//! - Collaborators (executor, signer provider) are injected as trait objects

pub mod adapter;
pub mod registry;
pub mod types;
pub mod xcm;

pub use adapter::BridgeAdapter;
pub use registry::BridgeRegistry;
pub use types::{
    BridgeError, BridgeProtocol, BridgeResult, BuiltTransaction, DryRunOutcome, FeeEstimate, Quote,
    QuoteExecution, QuoteFees, Route, SignerProvider, TransactionCallback, TransactionSigner,
    TransactionStatus, TransactionStream, TransactionUpdate, TransferExecutor, TransferRequest,
};
pub use xcm::{calculate_send_amount, XcmBridge};
