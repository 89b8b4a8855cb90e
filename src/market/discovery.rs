use anyhow::{bail, Context, Result};
use log::info;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

use super::layout::{MarketDescriptor, MarketState};

/// Fetch and decode a market account plus the decimals of both mints.
pub async fn load_market(
    rpc: &RpcClient,
    address: &Pubkey,
    program_id: &Pubkey,
) -> Result<MarketDescriptor> {
    let account = rpc
        .get_account(address)
        .await
        .with_context(|| format!("Failed to fetch market {}", address))?;

    if account.owner != *program_id {
        bail!(
            "Market {} is owned by {}, expected {}",
            address,
            account.owner,
            program_id
        );
    }

    let state = MarketState::decode(&account.data)
        .with_context(|| format!("Failed to decode market {}", address))?;

    let mints = rpc
        .get_multiple_accounts(&[state.base_mint, state.quote_mint])
        .await
        .context("Failed to fetch market mints")?;

    let base_decimals = mint_decimals(&state.base_mint, mints.first().cloned().flatten())?;
    let quote_decimals = mint_decimals(&state.quote_mint, mints.get(1).cloned().flatten())?;

    let descriptor =
        MarketDescriptor::from_state(*address, *program_id, &state, base_decimals, quote_decimals)?;

    info!(
        "Loaded market {} (base {} / quote {})",
        address, descriptor.base_mint, descriptor.quote_mint
    );

    Ok(descriptor)
}

fn mint_decimals(mint: &Pubkey, account: Option<Account>) -> Result<u8> {
    let account = account.with_context(|| format!("Mint {} not found", mint))?;
    let data = account
        .data
        .get(..Mint::LEN)
        .with_context(|| format!("Mint {} data too short", mint))?;
    let mint_state = Mint::unpack(data).with_context(|| format!("Invalid mint {}", mint))?;
    Ok(mint_state.decimals)
}
