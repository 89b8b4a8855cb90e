use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use solana_account_decoder::{UiAccountEncoding, UiDataSliceConfig};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::{system_instruction, sysvar};
use spl_associated_token_account::get_associated_token_address;
use spl_token::solana_program::program_pack::Pack;
use std::sync::Arc;

use super::layout::{
    MarketDescriptor, OPEN_ORDERS_LEN, OPEN_ORDERS_MARKET_OFFSET, OPEN_ORDERS_OWNER_OFFSET,
};
use super::MarketContext;
use crate::domain::{OrderRequest, OrderType, PlacedOrder, SelfTradeBehavior, Side};

const NEW_ORDER_V3_TAG: u32 = 10;
const DEFAULT_MATCH_LIMIT: u16 = u16::MAX;

// ==================================================
// NEW ORDER V3
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderV3 {
    pub side: Side,
    pub limit_price: u64,
    pub max_base_qty: u64,
    pub max_quote_qty: u64,
    pub self_trade_behavior: SelfTradeBehavior,
    pub order_type: OrderType,
    pub client_order_id: u64,
    pub limit: u16,
    pub max_ts: i64,
}

impl NewOrderV3 {
    pub const DATA_LEN: usize = 1 + 4 + 4 + 8 + 8 + 8 + 4 + 4 + 8 + 2 + 8;

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::DATA_LEN);
        data.push(0);
        data.extend_from_slice(&NEW_ORDER_V3_TAG.to_le_bytes());
        data.extend_from_slice(&self.side.wire_value().to_le_bytes());
        data.extend_from_slice(&self.limit_price.to_le_bytes());
        data.extend_from_slice(&self.max_base_qty.to_le_bytes());
        data.extend_from_slice(&self.max_quote_qty.to_le_bytes());
        data.extend_from_slice(&self.self_trade_behavior.wire_value().to_le_bytes());
        data.extend_from_slice(&self.order_type.wire_value().to_le_bytes());
        data.extend_from_slice(&self.client_order_id.to_le_bytes());
        data.extend_from_slice(&self.limit.to_le_bytes());
        data.extend_from_slice(&self.max_ts.to_le_bytes());
        data
    }

    pub fn instruction(
        &self,
        market: &MarketDescriptor,
        open_orders: &Pubkey,
        payer: &Pubkey,
        owner: &Pubkey,
    ) -> Instruction {
        Instruction {
            program_id: market.program_id,
            accounts: vec![
                AccountMeta::new(market.address, false),
                AccountMeta::new(*open_orders, false),
                AccountMeta::new(market.request_queue, false),
                AccountMeta::new(market.event_queue, false),
                AccountMeta::new(market.bids, false),
                AccountMeta::new(market.asks, false),
                AccountMeta::new(*payer, false),
                AccountMeta::new_readonly(*owner, true),
                AccountMeta::new(market.base_vault, false),
                AccountMeta::new(market.quote_vault, false),
                AccountMeta::new_readonly(spl_token::id(), false),
                AccountMeta::new_readonly(sysvar::rent::id(), false),
            ],
            data: self.pack(),
        }
    }
}

/// Chain state the order plan depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAccounts {
    /// Existing open orders account of the owner on this market.
    pub open_orders: Option<Pubkey>,
    pub open_orders_rent: u64,
    pub token_account_rent: u64,
    pub client_order_id: u64,
}

// ==================================================
// OPENBOOK MARKET
// ==================================================

pub struct OpenBookMarket {
    descriptor: MarketDescriptor,
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
    self_trade_behavior: SelfTradeBehavior,
}

impl OpenBookMarket {
    pub fn new(
        descriptor: MarketDescriptor,
        rpc: Arc<RpcClient>,
        commitment: CommitmentConfig,
        self_trade_behavior: SelfTradeBehavior,
    ) -> Self {
        Self {
            descriptor,
            rpc,
            commitment,
            self_trade_behavior,
        }
    }

    /// Open orders accounts the owner holds on this market.
    pub async fn find_open_orders(&self, owner: &Pubkey) -> Result<Vec<Pubkey>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                    OPEN_ORDERS_MARKET_OFFSET,
                    self.descriptor.address.as_ref(),
                )),
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                    OPEN_ORDERS_OWNER_OFFSET,
                    owner.as_ref(),
                )),
                RpcFilterType::DataSize(OPEN_ORDERS_LEN as u64),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: Some(UiDataSliceConfig {
                    offset: 0,
                    length: 0,
                }),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(&self.descriptor.program_id, config)
            .await
            .context("Failed to query open orders accounts")?;

        Ok(accounts.into_iter().map(|(key, _)| key).collect())
    }

    async fn order_accounts(&self, owner: &Pubkey) -> Result<OrderAccounts> {
        let open_orders = self.find_open_orders(owner).await?.into_iter().next();

        let open_orders_rent = if open_orders.is_none() {
            self.rpc
                .get_minimum_balance_for_rent_exemption(OPEN_ORDERS_LEN)
                .await
                .context("Failed to fetch open orders rent")?
        } else {
            0
        };

        let token_account_rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(spl_token::state::Account::LEN)
            .await
            .context("Failed to fetch token account rent")?;

        Ok(OrderAccounts {
            open_orders,
            open_orders_rent,
            token_account_rent,
            client_order_id: chrono::Utc::now().timestamp_millis().max(0) as u64,
        })
    }

    /// Instruction plan for one order given the chain state in `accounts`.
    pub fn build_place_order(
        &self,
        request: &OrderRequest,
        accounts: &OrderAccounts,
    ) -> Result<PlacedOrder> {
        let market = &self.descriptor;
        let owner = request.owner;
        let payer = request
            .payer
            .ok_or_else(|| anyhow!("No payer account for {} order", request.side))?;

        let price_lots = market
            .price_to_lots(request.price)
            .context("Invalid limit price")?;
        let size_lots = market.size_to_lots(request.size).context("Invalid size")?;
        let max_quote = market.max_quote_native(price_lots, size_lots)?;

        let order = NewOrderV3 {
            side: request.side,
            limit_price: price_lots,
            max_base_qty: size_lots,
            max_quote_qty: max_quote,
            self_trade_behavior: self.self_trade_behavior,
            order_type: request.order_type,
            client_order_id: accounts.client_order_id,
            limit: DEFAULT_MATCH_LIMIT,
            max_ts: i64::MAX,
        };

        let mut placed = PlacedOrder::default();

        let open_orders = match accounts.open_orders {
            Some(key) => key,
            None => {
                let account = Keypair::new();
                let key = account.pubkey();
                debug!("creating open orders account {}", key);
                placed.instructions.push(system_instruction::create_account(
                    &owner,
                    &key,
                    accounts.open_orders_rent,
                    OPEN_ORDERS_LEN as u64,
                    &market.program_id,
                ));
                placed.signers.push(account);
                key
            }
        };

        let spend_mint = match request.side {
            Side::Buy => market.quote_mint,
            Side::Sell => market.base_mint,
        };

        let mut close_after = None;
        let funding = if payer != owner {
            payer
        } else if spend_mint == spl_token::native_mint::id() {
            let native = match request.side {
                Side::Buy => max_quote,
                Side::Sell => size_lots
                    .checked_mul(market.base_lot_size)
                    .context("Size overflow")?,
            };
            let wrapped = Keypair::new();
            let key = wrapped.pubkey();
            let lamports = native
                .checked_add(accounts.token_account_rent)
                .context("Lamport overflow")?;
            info!("Wrapping {} lamports into {}", native, key);
            placed.instructions.push(system_instruction::create_account(
                &owner,
                &key,
                lamports,
                spl_token::state::Account::LEN as u64,
                &spl_token::id(),
            ));
            placed.instructions.push(spl_token::instruction::initialize_account(
                &spl_token::id(),
                &key,
                &spend_mint,
                &owner,
            )?);
            placed.signers.push(wrapped);
            close_after = Some(key);
            key
        } else {
            get_associated_token_address(&owner, &spend_mint)
        };

        placed
            .instructions
            .push(order.instruction(market, &open_orders, &funding, &owner));

        if let Some(key) = close_after {
            placed.instructions.push(spl_token::instruction::close_account(
                &spl_token::id(),
                &key,
                &owner,
                &owner,
                &[],
            )?);
        }

        Ok(placed)
    }
}

#[async_trait]
impl MarketContext for OpenBookMarket {
    fn descriptor(&self) -> &MarketDescriptor {
        &self.descriptor
    }

    async fn make_place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        // fail before the open orders and rent queries
        if request.payer.is_none() {
            bail!("No payer account for {} order", request.side);
        }
        let accounts = self.order_accounts(&request.owner).await?;
        self.build_place_order(request, &accounts)
    }
}
