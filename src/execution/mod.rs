use log::info;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{AssociatedAccount, OrderForm, OrderRequest, Side, SubmitOutcome};
use crate::logging::{log_failure, log_skipped, log_submitted};
use crate::market::MarketContext;
use crate::wallet::{AccountResolver, Wallet};

pub mod errors;
pub mod transaction;

pub use errors::SubmissionError;
pub use transaction::TransactionEnvelope;

// ==================================================
// Helpers
// ==================================================

/// Buy orders are funded from the quote token account; sell orders name the
/// wallet itself and leave the base account to the market.
pub fn payer_for(side: Side, quote_account: Option<AssociatedAccount>) -> Option<Pubkey> {
    match side {
        Side::Buy => quote_account.map(|a| a.address),
        Side::Sell => quote_account.map(|a| a.owner),
    }
}

pub fn order_request(owner: Pubkey, payer: Option<Pubkey>, form: &OrderForm) -> OrderRequest {
    OrderRequest {
        owner,
        payer,
        side: form.side(),
        price: form.price(),
        size: form.size(),
        order_type: form.order_type(),
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ==================================================
// OrderSubmitter
// ==================================================

pub struct OrderSubmitter {
    wallet: Arc<dyn Wallet>,
    connection: Arc<dyn Connection>,
    market: Arc<dyn MarketContext>,
    accounts: Arc<dyn AccountResolver>,
    in_flight: AtomicBool,
}

impl OrderSubmitter {
    pub fn new(
        wallet: Arc<dyn Wallet>,
        connection: Arc<dyn Connection>,
        market: Arc<dyn MarketContext>,
        accounts: Arc<dyn AccountResolver>,
    ) -> Self {
        Self {
            wallet,
            connection,
            market,
            accounts,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Place a limit order from the form.
    ///
    /// Never fails: every error is logged and returned as
    /// [`SubmitOutcome::Failed`]. The form is only read.
    pub async fn submit(&self, form: &OrderForm) -> SubmitOutcome {
        let Some(owner) = self.wallet.public_key() else {
            log_skipped("no wallet connected");
            return SubmitOutcome::Skipped;
        };

        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            log_skipped("a submission is already in flight");
            return SubmitOutcome::Busy;
        };

        match self.place(owner, form).await {
            Ok(signature) => {
                log_submitted(&signature);
                SubmitOutcome::Submitted(signature)
            }
            Err(e) => {
                log_failure(&e);
                SubmitOutcome::Failed(e)
            }
        }
    }

    pub async fn resolve_payer(
        &self,
        owner: &Pubkey,
        side: Side,
    ) -> Result<Option<Pubkey>, SubmissionError> {
        let quote_mint = self.market.descriptor().quote_mint;
        let quote_account = self
            .accounts
            .associated_account(&quote_mint, owner)
            .await
            .map_err(SubmissionError::AccountLookup)?;

        Ok(payer_for(side, quote_account))
    }

    async fn place(&self, owner: Pubkey, form: &OrderForm) -> Result<Signature, SubmissionError> {
        let payer = self.resolve_payer(&owner, form.side()).await?;
        let request = order_request(owner, payer, form);

        info!(
            "📝 {} {} @ {} ({})",
            request.side, request.size, request.price, request.order_type
        );

        let order = self
            .market
            .make_place_order(&request)
            .await
            .map_err(SubmissionError::OrderBuild)?;

        let recency = self
            .connection
            .latest_blockhash()
            .await
            .map_err(SubmissionError::Blockhash)?;

        let mut envelope = TransactionEnvelope::new(recency, owner);
        envelope.add(order.instructions);

        self.wallet
            .sign_and_send(envelope, &order.signers)
            .await
            .map_err(SubmissionError::SignAndSend)
    }
}
