//! Engine metrics.
//!
//! # Metrics
//! - `paraport_sessions_total` (counter): session lifecycle events by `event`
//! - `paraport_teleport_transitions_total` (counter): teleport transitions by target `status`
//! - `paraport_quotes_total` (counter): quote requests by `outcome` (quoted, infeasible, error)
//! - `paraport_balance_polls_total` (counter): polling attempts by `outcome` (met, retry, exhausted)
//! - `paraport_active_balance_watches` (gauge): live per-chain balance watches

use metrics::{counter, gauge};

pub fn record_session_event(event: &'static str) {
    counter!("paraport_sessions_total", "event" => event).increment(1);
}

pub fn record_teleport_transition(status: &'static str) {
    counter!("paraport_teleport_transitions_total", "status" => status).increment(1);
}

pub fn record_quote_outcome(outcome: &'static str) {
    counter!("paraport_quotes_total", "outcome" => outcome).increment(1);
}

pub fn record_balance_poll(outcome: &'static str) {
    counter!("paraport_balance_polls_total", "outcome" => outcome).increment(1);
}

pub fn watch_opened() {
    gauge!("paraport_active_balance_watches").increment(1.0);
}

pub fn watch_closed() {
    gauge!("paraport_active_balance_watches").decrement(1.0);
}
