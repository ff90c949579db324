//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or SdkConfig built in code
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all violations collected)
//!     → SdkConfig (validated, immutable)
//!     → shared via Arc with the SDK's managers and adapters
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the SDK is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{PollingConfig, SdkConfig};
pub use validation::{validate_config, ValidationError};
