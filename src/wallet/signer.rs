use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::path::Path;
use std::sync::Arc;

use super::Wallet;
use crate::execution::transaction::TransactionEnvelope;

/// Wallet backed by a local keypair file.
///
/// In read-only mode transactions are signed and simulated but never
/// broadcast.
pub struct KeypairWallet {
    keypair: Option<Keypair>,
    rpc: Arc<RpcClient>,
    read_only: bool,
}

impl KeypairWallet {
    pub fn new(keypair: Option<Keypair>, rpc: Arc<RpcClient>, read_only: bool) -> Self {
        if read_only {
            warn!("READ-ONLY MODE ENABLED - transactions will be simulated, not sent");
        }
        Self {
            keypair,
            rpc,
            read_only,
        }
    }

    pub fn from_file(path: &Path, rpc: Arc<RpcClient>, read_only: bool) -> Result<Self> {
        let keypair = read_keypair_file(path)
            .map_err(|e| anyhow!("Failed to read keypair {}: {}", path.display(), e))?;
        Ok(Self::new(Some(keypair), rpc, read_only))
    }

    /// Signs with the wallet keypair first, then every auxiliary signer.
    pub fn sign(&self, envelope: TransactionEnvelope, signers: &[Keypair]) -> Result<Transaction> {
        let keypair = self
            .keypair
            .as_ref()
            .ok_or_else(|| anyhow!("Wallet not connected"))?;

        let blockhash = envelope.blockhash;
        let mut all: Vec<&Keypair> = Vec::with_capacity(signers.len() + 1);
        all.push(keypair);
        all.extend(signers.iter());

        let mut tx = envelope.into_unsigned_transaction();
        tx.try_sign(&all, blockhash)
            .context("Failed to sign transaction")?;
        Ok(tx)
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|k| k.pubkey())
    }

    async fn sign_and_send(
        &self,
        envelope: TransactionEnvelope,
        signers: &[Keypair],
    ) -> Result<Signature> {
        let last_valid = envelope.last_valid_block_height;
        let tx = self.sign(envelope, signers)?;

        let signature = *tx
            .signatures
            .first()
            .ok_or_else(|| anyhow!("Transaction has no signatures"))?;

        if self.read_only {
            let sim = self
                .rpc
                .simulate_transaction(&tx)
                .await
                .context("Failed to simulate transaction")?
                .value;

            if let Some(err) = sim.err {
                let logs = sim.logs.unwrap_or_default().join("\n");
                bail!("Simulation failed: {}\n{}", err, logs);
            }

            info!(
                "[READ-ONLY] Simulated {} ({} compute units)",
                signature,
                sim.units_consumed.unwrap_or_default()
            );
            return Ok(signature);
        }

        info!(
            "Sending {} (blockhash valid through height {})",
            signature, last_valid
        );

        self.rpc
            .send_and_confirm_transaction(&tx)
            .await
            .context("Failed to send transaction")
    }
}
