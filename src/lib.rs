//! ParaPort: cross-chain top-up orchestration.
//!
//! Decides whether an account needs funds on a destination chain, prices a
//! teleport from the best origin, executes it and confirms arrival by
//! watching the destination balance.

pub mod balance;
pub mod bridges;
pub mod chains;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod sdk;
pub mod session;
pub mod store;
pub mod teleport;

pub use config::SdkConfig;
pub use lifecycle::{Shutdown, Subscription};
pub use sdk::{ParaPortSdk, ParaPortSdkBuilder, RawTeleportParams, SdkError, SdkResult};
