//! Session records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bridges::types::Quote;
use crate::lifecycle::Subscription;
use crate::store::{Record, RecordEvent};
use crate::teleport::types::TeleportParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Ready,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Ready => "ready",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEventKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionQuotes {
    pub available: Vec<Quote>,
    pub selected: Option<Quote>,
    pub best_quote: Option<Quote>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionFunds {
    /// The destination lacks the requested amount.
    pub needed: bool,
    /// At least one quote exists.
    pub available: bool,
    /// Funds are needed and no bridge can supply them.
    pub no_funds_at_all: bool,
}

/// Outcome of pricing a session's params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionCalculation {
    pub quotes: SessionQuotes,
    pub funds: SessionFunds,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeleportSession {
    pub id: String,
    pub status: SessionStatus,
    pub params: TeleportParams,
    pub quotes: SessionQuotes,
    pub funds: SessionFunds,
    pub teleport_id: Option<String>,
    pub events: Vec<RecordEvent>,
    pub timestamp_ms: u64,
    /// Re-quotes the session when a watched balance increases.
    #[serde(skip)]
    pub balance_subscription: Option<Subscription>,
}

impl TeleportSession {
    /// Release the balance watch, if any.
    pub fn unsubscribe(&self) {
        if let Some(subscription) = &self.balance_subscription {
            subscription.unsubscribe();
        }
    }
}

impl Record for TeleportSession {
    type Status = SessionStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> SessionStatus {
        self.status
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    fn events_mut(&mut self) -> &mut Vec<RecordEvent> {
        &mut self.events
    }
}
