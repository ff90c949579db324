//! Balance oracle subsystem.
//!
//! # Data Flow
//! ```text
//! ChainBackend (read / watch / existential deposit)
//!     → oracle.rs get_balance (raw amount → transferable = raw − ED, floored at 0)
//!     → get_balances (concurrent fan-out, all-or-nothing)
//!     → subscribe_balances (one watch task per chain, fires on strict increase)
//!     → wait_for_threshold / wait_for_increase (bounded retry with backoff)
//! ```
//!
//! # Design Decisions
//! - Balances are never cached; every call reads the backend
//! - A chain whose watch cannot be opened is skipped with a warning
//! - Polling always terminates with ThresholdNotMet once the budget is spent

pub mod oracle;
pub mod types;

pub use oracle::BalanceOracle;
pub use types::{Balance, BalanceError, BalanceResult, BalanceStream, ChainBackend};
