//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Session / teleport / balance subsystems produce:
//!     → logging.rs (structured tracing events, filtered per crate)
//!     → metrics.rs (counters and gauges through the `metrics` facade)
//!
//! Consumers:
//!     → stdout via tracing-subscriber's fmt layer
//!     → whichever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter; without a recorder the macros are no-ops
//! - Log initialization is idempotent so embedding hosts can own the subscriber

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
