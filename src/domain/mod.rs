use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;

pub mod form;
pub mod order;
pub mod trade_result;

pub use form::OrderForm;
pub use order::{OrderRequest, OrderType, PlacedOrder, SelfTradeBehavior, Side};
pub use trade_result::SubmitOutcome;

// ==================================================
// NETWORK RECENCY
// ==================================================

/// Latest blockhash and the last block height at which it is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyToken {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

// ==================================================
// TOKEN ACCOUNTS
// ==================================================

/// An associated token account and the wallet that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedAccount {
    pub address: Pubkey,
    pub owner: Pubkey,
}
