//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::bridges::types::BridgeProtocol;
use crate::chains::{default_endpoints, Chain};

/// Root configuration for the SDK.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Bridge protocols to register adapters for.
    pub bridge_protocols: Vec<BridgeProtocol>,

    /// Chains quotes may draw funds from.
    pub chains: Vec<Chain>,

    /// One of trace, debug, info, warn, error.
    pub log_level: String,

    /// Per-chain override of the catalog's default endpoints.
    pub endpoints: HashMap<Chain, Vec<String>>,

    /// Retry budget for balance polling.
    pub polling: PollingConfig,

    /// Estimated execution time stamped on quotes.
    pub quote_time_ms: u64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            bridge_protocols: vec![BridgeProtocol::Xcm],
            chains: Chain::ALL.to_vec(),
            log_level: "info".to_string(),
            endpoints: HashMap::new(),
            polling: PollingConfig::default(),
            quote_time_ms: 30_000,
        }
    }
}

impl SdkConfig {
    /// Configured endpoints for `chain`, falling back to the catalog defaults.
    pub fn endpoints_for(&self, chain: Chain) -> Vec<String> {
        match self.endpoints.get(&chain) {
            Some(urls) if !urls.is_empty() => urls.clone(),
            _ => default_endpoints(chain).iter().map(|url| url.to_string()).collect(),
        }
    }

    pub fn is_chain_allowed(&self, chain: Chain) -> bool {
        self.chains.contains(&chain)
    }
}

/// Bounded polling used while waiting for a balance to arrive.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            min_interval_ms: 5_000,
            max_interval_ms: 10_000,
        }
    }
}
