use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

// ==================================================
// ACCOUNT LAYOUT (DEX v3)
// ==================================================

pub const MARKET_STATE_LEN: usize = 388;
pub const OPEN_ORDERS_LEN: usize = 3228;

/// Byte offsets inside an open orders account, after the 5 byte head padding.
pub const OPEN_ORDERS_MARKET_OFFSET: usize = 13;
pub const OPEN_ORDERS_OWNER_OFFSET: usize = 45;

const HEAD_PADDING: &[u8; 5] = b"serum";
const TAIL_PADDING: &[u8; 7] = b"padding";

const FLAG_INITIALIZED: u64 = 1;
const FLAG_MARKET: u64 = 1 << 1;

/// Raw fields of an on-chain market account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub account_flags: u64,
    pub own_address: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub base_deposits_total: u64,
    pub base_fees_accrued: u64,
    pub quote_vault: Pubkey,
    pub quote_deposits_total: u64,
    pub quote_fees_accrued: u64,
    pub quote_dust_threshold: u64,
    pub request_queue: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| anyhow!("Market data truncated at byte {}", self.pos))?;
        self.pos = end;
        Ok(slice)
    }

    fn u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn pubkey(&mut self) -> Result<Pubkey> {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(self.take(32)?);
        Ok(Pubkey::new_from_array(buf))
    }
}

impl MarketState {
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != MARKET_STATE_LEN {
            bail!(
                "Market account has {} bytes, expected {}",
                data.len(),
                MARKET_STATE_LEN
            );
        }
        if &data[..5] != HEAD_PADDING || &data[MARKET_STATE_LEN - 7..] != TAIL_PADDING {
            bail!("Market account padding mismatch");
        }

        let mut r = Reader { data, pos: 5 };
        let state = Self {
            account_flags: r.u64()?,
            own_address: r.pubkey()?,
            vault_signer_nonce: r.u64()?,
            base_mint: r.pubkey()?,
            quote_mint: r.pubkey()?,
            base_vault: r.pubkey()?,
            base_deposits_total: r.u64()?,
            base_fees_accrued: r.u64()?,
            quote_vault: r.pubkey()?,
            quote_deposits_total: r.u64()?,
            quote_fees_accrued: r.u64()?,
            quote_dust_threshold: r.u64()?,
            request_queue: r.pubkey()?,
            event_queue: r.pubkey()?,
            bids: r.pubkey()?,
            asks: r.pubkey()?,
            base_lot_size: r.u64()?,
            quote_lot_size: r.u64()?,
            fee_rate_bps: r.u64()?,
            referrer_rebates_accrued: r.u64()?,
        };

        let required = FLAG_INITIALIZED | FLAG_MARKET;
        if state.account_flags & required != required {
            bail!("Account is not an initialized market");
        }

        Ok(state)
    }
}

// ==================================================
// MARKET DESCRIPTOR
// ==================================================

/// Everything needed to place orders on one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketDescriptor {
    #[serde(serialize_with = "as_string")]
    pub address: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub program_id: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub base_mint: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub quote_mint: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub base_vault: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub quote_vault: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub request_queue: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub event_queue: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub bids: Pubkey,
    #[serde(serialize_with = "as_string")]
    pub asks: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub base_decimals: u8,
    pub quote_decimals: u8,
}

fn as_string<S: serde::Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&key.to_string())
}

impl MarketDescriptor {
    pub fn from_state(
        address: Pubkey,
        program_id: Pubkey,
        state: &MarketState,
        base_decimals: u8,
        quote_decimals: u8,
    ) -> Result<Self> {
        if state.own_address != address {
            bail!(
                "Market account {} describes market {}",
                address,
                state.own_address
            );
        }
        if state.base_lot_size == 0 || state.quote_lot_size == 0 {
            bail!("Market {} has a zero lot size", address);
        }

        Ok(Self {
            address,
            program_id,
            base_mint: state.base_mint,
            quote_mint: state.quote_mint,
            base_vault: state.base_vault,
            quote_vault: state.quote_vault,
            request_queue: state.request_queue,
            event_queue: state.event_queue,
            bids: state.bids,
            asks: state.asks,
            vault_signer_nonce: state.vault_signer_nonce,
            base_lot_size: state.base_lot_size,
            quote_lot_size: state.quote_lot_size,
            fee_rate_bps: state.fee_rate_bps,
            base_decimals,
            quote_decimals,
        })
    }

    /// Limit price in quote units per base unit, as price lots.
    pub fn price_to_lots(&self, price: f64) -> Result<u64> {
        let price = finite(price, "Price")?;
        let num = price
            .checked_mul(pow10(self.quote_decimals)?)
            .and_then(|v| v.checked_mul(Decimal::from(self.base_lot_size)))
            .context("Price overflow")?;
        let den = pow10(self.base_decimals)?
            .checked_mul(Decimal::from(self.quote_lot_size))
            .context("Price overflow")?;
        to_lots(num.checked_div(den).context("Price overflow")?, "Price")
    }

    /// Order size in base units, as base lots.
    pub fn size_to_lots(&self, size: f64) -> Result<u64> {
        let size = finite(size, "Size")?;
        let native = size
            .checked_mul(pow10(self.base_decimals)?)
            .context("Size overflow")?;
        to_lots(
            native
                .checked_div(Decimal::from(self.base_lot_size))
                .context("Size overflow")?,
            "Size",
        )
    }

    /// Native quote amount locked by a bid of the given lots.
    pub fn max_quote_native(&self, price_lots: u64, size_lots: u64) -> Result<u64> {
        self.quote_lot_size
            .checked_mul(price_lots)
            .and_then(|v| v.checked_mul(size_lots))
            .context("Quote quantity overflow")
    }

    pub fn price_lots_to_number(&self, lots: u64) -> Result<Decimal> {
        let base_scale = pow10(self.base_decimals)?;
        let num = Decimal::from(lots)
            .checked_mul(Decimal::from(self.quote_lot_size))
            .and_then(|v| v.checked_mul(base_scale))
            .context("Price overflow")?;
        let den = Decimal::from(self.base_lot_size)
            .checked_mul(pow10(self.quote_decimals)?)
            .context("Price overflow")?;
        num.checked_div(den).context("Price overflow")
    }
}

fn finite(value: f64, what: &str) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| anyhow!("{} {} is not a finite number", what, value))
}

fn pow10(decimals: u8) -> Result<Decimal> {
    10u64
        .checked_pow(decimals as u32)
        .map(Decimal::from)
        .ok_or_else(|| anyhow!("Unsupported mint decimals {}", decimals))
}

fn to_lots(value: Decimal, what: &str) -> Result<u64> {
    let lots = value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or_else(|| anyhow!("{} {} is out of range", what, value))?;
    if lots == 0 {
        bail!("{} {} is below one lot", what, value);
    }
    Ok(lots)
}
