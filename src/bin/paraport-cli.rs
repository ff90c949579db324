use alloy::primitives::U256;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use paraport::balance::{BalanceError, BalanceResult, BalanceStream, ChainBackend};
use paraport::chains::{self, Asset, Chain};
use paraport::config::{load_config, SdkConfig};
use paraport::observability::init_logging;
use paraport::sdk::{prepare_params, RawTeleportParams};

#[derive(Parser)]
#[command(name = "paraport-cli")]
#[command(about = "Offline inspection of the ParaPort chain catalog and configuration", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known chains and their properties
    Chains,
    /// Chains a teleport of ASSET to CHAIN may touch
    Routes {
        #[arg(short, long)]
        chain: String,
        #[arg(short, long)]
        asset: String,
    },
    /// Load, validate and print a configuration file
    Config {
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
    /// Validate teleport parameters without touching the network
    CheckParams {
        #[arg(long)]
        address: String,
        #[arg(long)]
        chain: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        mode: Option<String>,
    },
}

/// Backend used for offline commands; only the address check is meaningful.
struct OfflineBackend;

#[async_trait]
impl ChainBackend for OfflineBackend {
    async fn read(&self, chain: Chain, _address: &str, _asset: Asset) -> BalanceResult<U256> {
        Err(BalanceError::Backend {
            chain,
            message: "offline".to_string(),
        })
    }

    async fn watch(&self, chain: Chain, _address: &str, _asset: Asset) -> BalanceResult<BalanceStream> {
        Err(BalanceError::Watch {
            chain,
            message: "offline".to_string(),
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let output = match cli.command {
        Commands::Chains => list_chains(),
        Commands::Routes { chain, asset } => {
            let chain: Chain = chain.parse()?;
            let asset: Asset = asset.parse()?;
            json!({
                "destination": chain,
                "asset": asset,
                "chains": chains::route_chains(chain, asset),
            })
        }
        Commands::Config { path } => {
            let config = match path {
                Some(path) => load_config(&path)?,
                None => SdkConfig::default(),
            };
            let endpoints: Value = config
                .chains
                .iter()
                .map(|chain| (chain.to_string(), json!(config.endpoints_for(*chain))))
                .collect::<serde_json::Map<String, Value>>()
                .into();
            json!({ "config": config, "resolved_endpoints": endpoints })
        }
        Commands::CheckParams {
            address,
            chain,
            amount,
            asset,
            mode,
        } => {
            let raw = RawTeleportParams {
                address,
                chain,
                amount,
                asset,
                teleport_mode: mode,
            };
            match prepare_params(&raw, &OfflineBackend) {
                Ok(params) => json!({ "valid": true, "params": params }),
                Err(e) => json!({ "valid": false, "error": e.to_string() }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn list_chains() -> Value {
    let chains: Vec<Value> = Chain::ALL
        .iter()
        .map(|chain| {
            let assets: Vec<Value> = chains::supported_assets(*chain)
                .iter()
                .map(|entry| {
                    json!({
                        "asset": entry.asset,
                        "decimals": entry.decimals,
                        "existential_deposit": entry.existential_deposit.to_string(),
                    })
                })
                .collect();

            json!({
                "chain": chain,
                "name": chains::chain_name(*chain),
                "ecosystem": chains::ecosystem_of(*chain),
                "properties": chains::chain_properties(*chain),
                "assets": assets,
            })
        })
        .collect();

    Value::Array(chains)
}
