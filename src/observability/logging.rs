//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Map the configured `log_level` onto this crate's filter directive
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - A subscriber installed by the host is left alone

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Accepted values for `log_level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Install the fmt subscriber. Returns `false` if one was already installed.
pub fn init_logging(level: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("paraport={}", level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
