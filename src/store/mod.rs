//! Generic record storage with typed event channels.
//!
//! # Data Flow
//! ```text
//! Manager method (session / teleport / transaction)
//!     → repository.rs (clone record out, patch, replace wholesale)
//!     → append "status-update" event to the record's log
//!     → channel.rs (emit projected payload to listeners of that kind)
//! ```
//!
//! # Design Decisions
//! - Composition, not inheritance: each manager owns one Repository
//! - Exactly one emission per mutation unless the caller opts out
//! - No lock is held while listeners run, so listeners may re-enter
//! - Unknown ids are silently ignored

pub mod channel;
pub mod repository;

pub use channel::{EventChannel, EventKind};
pub use repository::{now_ms, Record, RecordEvent, Repository, STATUS_UPDATE_EVENT};
