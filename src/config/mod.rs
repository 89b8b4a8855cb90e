use anyhow::{bail, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::{SelfTradeBehavior, Side};

pub mod trading;

/* =======================
CLI ARGS
======================= */

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Order side
    #[arg(long, default_value = "buy")]
    pub side: Side,

    /// Quantity in base units
    #[arg(long, default_value = "0")]
    pub size: String,

    /// Limit price in quote units
    #[arg(long, default_value = "0")]
    pub price: String,

    /// Only rest on the book, never take
    #[arg(long, conflicts_with = "ioc")]
    pub post_only: bool,

    /// Immediate-or-cancel
    #[arg(long)]
    pub ioc: bool,

    /// Simulate instead of sending
    #[arg(long)]
    pub read_only: bool,
}

/* =======================
MAIN CONFIG
======================= */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub market: MarketConfig,
    pub wallet: WalletConfig,
    pub trading: TradingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(c: Commitment) -> Self {
        match c {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub address: String,
    pub program_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub keypair_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    #[serde(default)]
    pub self_trade_behavior: SelfTradeBehavior,
    #[serde(default)]
    pub read_only: bool,
}

/* =======================
DEFAULT CONFIG
======================= */

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                commitment: Commitment::Confirmed,
            },
            market: MarketConfig {
                // SOL/USDC
                address: "8BnEgHoWFysVcuFFX7QztDmzuH8r5ZFvyP3sYwn1XTh6".to_string(),
                program_id: "srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX".to_string(),
            },
            wallet: WalletConfig { keypair_path: None },
            trading: TradingConfig {
                self_trade_behavior: SelfTradeBehavior::DecrementTake,
                read_only: false,
            },
        }
    }
}

/* =======================
LOAD / CREATE CONFIG
======================= */

impl Config {
    pub fn load(path: &PathBuf) -> anyhow::Result<Self> {
        let cfg = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            let cfg = Config::default();
            let content = serde_json::to_string_pretty(&cfg)?;
            std::fs::write(path, content)?;
            cfg
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_rpc_url(&self.rpc_url())?;
        self.market_address()?;
        self.program_id()?;
        Ok(())
    }

    pub fn market_address(&self) -> anyhow::Result<Pubkey> {
        Pubkey::from_str(&self.market.address)
            .with_context(|| format!("Invalid market address '{}'", self.market.address))
    }

    pub fn program_id(&self) -> anyhow::Result<Pubkey> {
        Pubkey::from_str(&self.market.program_id)
            .with_context(|| format!("Invalid program id '{}'", self.market.program_id))
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.network.commitment.into()
    }
}

/// Checks the endpoint actually used, after the `RPC_URL` override.
fn validate_rpc_url(rpc_url: &str) -> anyhow::Result<()> {
    let url =
        url::Url::parse(rpc_url).with_context(|| format!("Invalid rpc_url '{}'", rpc_url))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("rpc_url must be http(s), got '{}'", url.scheme());
    }
    Ok(())
}
