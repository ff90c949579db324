//! Teleport execution subsystem.
//!
//! # Data Flow
//! ```text
//! create_teleport (Pending, silent)
//!     → initiate_teleport: transactions.rs creates order 0, emit Started
//!     → Pending action: find_next_pending → adapter.transfer (spawned);
//!       the first transfer records the destination baseline
//!     → chain updates → TransactionSequencer::apply_update → Updated
//!     → manager.rs handle_transaction_update:
//!         Pending → Transferring (left Unknown)
//!         Transferring → Waiting (last transaction finalized ok)
//!         Pending/Transferring → Failed (transaction failed)
//!     → Waiting action: oracle.wait_for_threshold(baseline + receive amount)
//!     → Completed (checked = true), Completed event emitted once
//! ```
//!
//! # Design Decisions
//! - Status actions are an exhaustive match, not a lookup table
//! - A transaction in flight is never submitted again until it finalizes or fails
//! - Failed is recoverable only through retry_teleport
//! - The baseline is stored once, so a retried confirmation counts late arrivals

pub mod manager;
pub mod transactions;
pub mod types;

pub use manager::{select_best_quote, TeleportManager};
pub use transactions::TransactionSequencer;
pub use types::{
    TeleportDetails, TeleportError, TeleportEventKind, TeleportEventPayload, TeleportMode,
    TeleportParams, TeleportResult, TeleportStatus, TeleportSummary, TransactionDetails,
    TransactionEventKind, TransactionKind,
};
