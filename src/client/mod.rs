use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use std::sync::Arc;

use crate::domain::RecencyToken;

/// Source of transaction recency data.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn latest_blockhash(&self) -> Result<RecencyToken>;
}

// ==================================================
// RPC CONNECTION
// ==================================================

#[derive(Clone)]
pub struct RpcConnection {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcConnection {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self::from_client(
            Arc::new(RpcClient::new_with_commitment(rpc_url.to_string(), commitment)),
            commitment,
        )
    }

    pub fn from_client(rpc: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }

    /// Shared handle for collaborators that talk to the same node.
    pub fn rpc(&self) -> Arc<RpcClient> {
        self.rpc.clone()
    }
}

#[async_trait]
impl Connection for RpcConnection {
    async fn latest_blockhash(&self) -> Result<RecencyToken> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .context("Failed to fetch latest blockhash")?;

        debug!(
            "blockhash {} valid through height {}",
            blockhash, last_valid_block_height
        );

        Ok(RecencyToken {
            blockhash,
            last_valid_block_height,
        })
    }
}
