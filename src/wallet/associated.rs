use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use spl_token::solana_program::program_pack::Pack;
use std::sync::Arc;

use crate::domain::AssociatedAccount;

/// Looks up a wallet's associated token account for a mint.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    /// `None` when the account has not been created yet.
    async fn associated_account(
        &self,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<Option<AssociatedAccount>>;
}

#[derive(Clone)]
pub struct RpcAccountResolver {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcAccountResolver {
    pub fn new(rpc: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }
}

#[async_trait]
impl AccountResolver for RpcAccountResolver {
    async fn associated_account(
        &self,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<Option<AssociatedAccount>> {
        let address = get_associated_token_address(owner, mint);

        let account = self
            .rpc
            .get_account_with_commitment(&address, self.commitment)
            .await
            .with_context(|| format!("Failed to fetch token account {}", address))?
            .value;

        match account {
            None => Ok(None),
            Some(account) => Ok(Some(AssociatedAccount {
                address,
                owner: token_account_owner(&account.data)?,
            })),
        }
    }
}

/// Owner field of an SPL token account.
pub fn token_account_owner(data: &[u8]) -> Result<Pubkey> {
    let len = spl_token::state::Account::LEN;
    let base = data
        .get(..len)
        .with_context(|| format!("Token account too short: {} bytes", data.len()))?;
    let account =
        spl_token::state::Account::unpack(base).context("Invalid token account data")?;
    Ok(account.owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_token::state::{Account, AccountState};

    fn packed(owner: Pubkey) -> Vec<u8> {
        let account = Account {
            mint: Pubkey::new_unique(),
            owner,
            amount: 42,
            state: AccountState::Initialized,
            ..Account::default()
        };
        let mut data = vec![0u8; Account::LEN];
        Account::pack(account, &mut data).unwrap();
        data
    }

    #[test]
    fn reads_owner_from_token_account() {
        let owner = Pubkey::new_unique();
        assert_eq!(token_account_owner(&packed(owner)).unwrap(), owner);
    }

    #[test]
    fn ignores_trailing_extension_bytes() {
        let owner = Pubkey::new_unique();
        let mut data = packed(owner);
        data.extend_from_slice(&[0u8; 12]);
        assert_eq!(token_account_owner(&data).unwrap(), owner);
    }

    #[test]
    fn rejects_short_data() {
        assert!(token_account_owner(&[0u8; 40]).is_err());
    }
}
