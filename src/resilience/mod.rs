//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Polling loop (balance threshold / increase):
//!     → retries.rs (run attempt, classify outcome)
//!     → On failure: backoff.rs (exponential delay, jittered, clamped to [min, max])
//!     → After max_attempts: RetryExhausted carrying the last error
//! ```
//!
//! # Design Decisions
//! - Every polling loop is bounded; there is no "retry forever"
//! - Jittered backoff keeps concurrent watchers from polling in lockstep
//! - The attempt closure decides what counts as failure; retries.rs only counts

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{retry, RetryExhausted, RetryPolicy};
