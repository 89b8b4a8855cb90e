use serde::{Deserialize, Serialize};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    /// Wire value in the NewOrderV3 instruction (bid = 0, ask = 1).
    pub fn wire_value(&self) -> u32 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Side::Buy),
            "sell" | "ask" => Ok(Side::Sell),
            other => anyhow::bail!("unknown side '{}'", other),
        }
    }
}

/// Order flag. A single value, so post-only and IOC can never both be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderType {
    #[default]
    Limit,
    PostOnly,
    #[serde(rename = "ioc")]
    ImmediateOrCancel,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "limit",
            OrderType::PostOnly => "postOnly",
            OrderType::ImmediateOrCancel => "ioc",
        }
    }

    pub fn wire_value(&self) -> u32 {
        match self {
            OrderType::Limit => 0,
            OrderType::ImmediateOrCancel => 1,
            OrderType::PostOnly => 2,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelfTradeBehavior {
    #[default]
    DecrementTake,
    CancelProvide,
    AbortTransaction,
}

impl SelfTradeBehavior {
    pub fn wire_value(&self) -> u32 {
        match self {
            SelfTradeBehavior::DecrementTake => 0,
            SelfTradeBehavior::CancelProvide => 1,
            SelfTradeBehavior::AbortTransaction => 2,
        }
    }
}

/// Parameters handed to the market's order builder.
///
/// `payer` is `None` when no funding account could be resolved; the builder
/// decides how to fail on it. `price` and `size` may be NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub owner: Pubkey,
    pub payer: Option<Pubkey>,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub order_type: OrderType,
}

/// Instructions for one order plus the keypairs of any accounts they create.
#[derive(Debug, Default)]
pub struct PlacedOrder {
    pub instructions: Vec<Instruction>,
    pub signers: Vec<Keypair>,
}
