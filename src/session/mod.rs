//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! sdk init_session → SessionManager::create_session (Ready, Created event)
//! balance increase → re-quote → update_session (Updated event)
//! teleport Started → Processing, Completed → Completed, Failed → Failed
//! ```
//!
//! # Design Decisions
//! - One session owns at most one teleport
//! - The balance watch lives on the session and is released on execute, update or destroy

pub mod manager;
pub mod types;

pub use manager::SessionManager;
pub use types::{
    SessionCalculation, SessionEventKind, SessionFunds, SessionQuotes, SessionStatus, TeleportSession,
};
