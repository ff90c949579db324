//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Subscriptions (subscription.rs):
//!     event listener / balance watch / transaction observer
//!         → Subscription handle returned to the caller
//!         → caller invokes unsubscribe() to release the remote resource
//!
//! Shutdown (shutdown.rs):
//!     ParaPortSdk::destroy() → broadcast → confirmation polling loops exit
//! ```
//!
//! # Design Decisions
//! - Teardown is always explicit; dropping a handle never cancels anything
//! - Cancellation runs at most once, even when a handle is cloned
//! - Shutdown is a broadcast so every background task observes it

pub mod shutdown;
pub mod subscription;

pub use shutdown::Shutdown;
pub use subscription::Subscription;
