use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

use crate::execution::transaction::TransactionEnvelope;

pub mod associated;
pub mod signer;

pub use associated::{AccountResolver, RpcAccountResolver};
pub use signer::KeypairWallet;

/// The identity that owns orders and pays fees.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// `None` while no wallet is connected.
    fn public_key(&self) -> Option<Pubkey>;

    /// Sign the envelope together with `signers` and broadcast it.
    async fn sign_and_send(
        &self,
        envelope: TransactionEnvelope,
        signers: &[Keypair],
    ) -> Result<Signature>;
}
