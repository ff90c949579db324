//! Static chain and asset catalog.
//!
//! # Data Flow
//! ```text
//! Raw params / config (strings)
//!     → types.rs (parse into Chain / Asset)
//!     → catalog.rs (properties, existential deposits, route chains, endpoints)
//!     → balance oracle, bridge adapters, param validation
//! ```
//!
//! # Design Decisions
//! - The catalog is compiled in; nothing here touches the network
//! - Routes never cross relay ecosystems (Polkadot, Kusama, Paseo)
//! - Address checks are shape-only; backends may apply stricter rules

pub mod catalog;
pub mod types;

pub use catalog::{
    asset_decimals, block_explorer_of, chain_name, chain_properties, default_endpoints,
    ecosystem_of, existential_deposit, is_asset_supported, is_plausible_address, route_chains,
    supported_assets, AssetEntry,
};
pub use types::{Asset, Chain, ChainProperties, Ecosystem, UnknownAsset, UnknownChain};
