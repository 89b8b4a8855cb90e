use anyhow::{anyhow, Result};
use async_trait::async_trait;
use openbook_order_entry::client::Connection;
use openbook_order_entry::domain::{
    AssociatedAccount, OrderForm, OrderRequest, OrderType, PlacedOrder, RecencyToken, Side,
    SubmitOutcome,
};
use openbook_order_entry::execution::{OrderSubmitter, SubmissionError, TransactionEnvelope};
use openbook_order_entry::market::{MarketContext, MarketDescriptor};
use openbook_order_entry::wallet::{AccountResolver, Wallet};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ==================================================
// MOCK COLLABORATORS
// ==================================================

#[derive(Default)]
struct Calls {
    lookups: AtomicUsize,
    builds: AtomicUsize,
    blockhashes: AtomicUsize,
    sends: AtomicUsize,
    sequence: Mutex<Vec<&'static str>>,
}

impl Calls {
    fn record(&self, counter: &AtomicUsize, step: &'static str) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.sequence.lock().unwrap().push(step);
    }

    fn sequence(&self) -> Vec<&'static str> {
        self.sequence.lock().unwrap().clone()
    }

    fn network_total(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
            + self.builds.load(Ordering::SeqCst)
            + self.blockhashes.load(Ordering::SeqCst)
            + self.sends.load(Ordering::SeqCst)
    }
}

struct MockWallet {
    key: Option<Pubkey>,
    fail: bool,
    gate: Option<Arc<Notify>>,
    calls: Arc<Calls>,
    sent: Mutex<Vec<(TransactionEnvelope, Vec<Pubkey>)>>,
}

#[async_trait]
impl Wallet for MockWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.key
    }

    async fn sign_and_send(
        &self,
        envelope: TransactionEnvelope,
        signers: &[Keypair],
    ) -> Result<Signature> {
        self.calls.record(&self.calls.sends, "send");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(anyhow!("User rejected the request"));
        }
        let keys = signers.iter().map(|k| k.pubkey()).collect();
        self.sent.lock().unwrap().push((envelope, keys));
        Ok(Signature::new_unique())
    }
}

struct MockConnection {
    recency: RecencyToken,
    calls: Arc<Calls>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn latest_blockhash(&self) -> Result<RecencyToken> {
        self.calls.record(&self.calls.blockhashes, "blockhash");
        Ok(self.recency)
    }
}

struct MockMarket {
    descriptor: MarketDescriptor,
    calls: Arc<Calls>,
    requests: Mutex<Vec<OrderRequest>>,
    order_ix: Instruction,
}

#[async_trait]
impl MarketContext for MockMarket {
    fn descriptor(&self) -> &MarketDescriptor {
        &self.descriptor
    }

    async fn make_place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        self.calls.record(&self.calls.builds, "build");
        self.requests.lock().unwrap().push(request.clone());
        if request.payer.is_none() {
            return Err(anyhow!("payer is required"));
        }
        Ok(PlacedOrder {
            instructions: vec![self.order_ix.clone()],
            signers: vec![Keypair::new()],
        })
    }
}

struct MockResolver {
    account: Option<AssociatedAccount>,
    calls: Arc<Calls>,
    mints: Mutex<Vec<Pubkey>>,
}

#[async_trait]
impl AccountResolver for MockResolver {
    async fn associated_account(
        &self,
        mint: &Pubkey,
        _owner: &Pubkey,
    ) -> Result<Option<AssociatedAccount>> {
        self.calls.record(&self.calls.lookups, "lookup");
        self.mints.lock().unwrap().push(*mint);
        Ok(self.account)
    }
}

// ==================================================
// HARNESS
// ==================================================

struct Harness {
    owner: Pubkey,
    quote_account: AssociatedAccount,
    recency: RecencyToken,
    calls: Arc<Calls>,
    wallet: Arc<MockWallet>,
    market: Arc<MockMarket>,
    resolver: Arc<MockResolver>,
    submitter: OrderSubmitter,
}

fn descriptor() -> MarketDescriptor {
    MarketDescriptor {
        address: Pubkey::new_unique(),
        program_id: Pubkey::new_unique(),
        base_mint: Pubkey::new_unique(),
        quote_mint: Pubkey::new_unique(),
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        request_queue: Pubkey::new_unique(),
        event_queue: Pubkey::new_unique(),
        bids: Pubkey::new_unique(),
        asks: Pubkey::new_unique(),
        vault_signer_nonce: 0,
        base_lot_size: 1_000_000,
        quote_lot_size: 1,
        fee_rate_bps: 0,
        base_decimals: 9,
        quote_decimals: 6,
    }
}

struct Setup {
    connected: bool,
    wallet_fails: bool,
    quote_account_exists: bool,
    gate: Option<Arc<Notify>>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            connected: true,
            wallet_fails: false,
            quote_account_exists: true,
            gate: None,
        }
    }
}

fn harness(setup: Setup) -> Harness {
    let owner = Pubkey::new_unique();
    let quote_account = AssociatedAccount {
        address: Pubkey::new_unique(),
        owner,
    };
    let recency = RecencyToken {
        blockhash: Hash::new_unique(),
        last_valid_block_height: 1_000,
    };
    let calls = Arc::new(Calls::default());

    let wallet = Arc::new(MockWallet {
        key: setup.connected.then_some(owner),
        fail: setup.wallet_fails,
        gate: setup.gate,
        calls: calls.clone(),
        sent: Mutex::new(Vec::new()),
    });
    let connection = Arc::new(MockConnection {
        recency,
        calls: calls.clone(),
    });
    let market = Arc::new(MockMarket {
        descriptor: descriptor(),
        calls: calls.clone(),
        requests: Mutex::new(Vec::new()),
        order_ix: Instruction::new_with_bytes(Pubkey::new_unique(), &[10], vec![]),
    });
    let resolver = Arc::new(MockResolver {
        account: setup.quote_account_exists.then_some(quote_account),
        calls: calls.clone(),
        mints: Mutex::new(Vec::new()),
    });

    let submitter = OrderSubmitter::new(
        wallet.clone(),
        connection,
        market.clone(),
        resolver.clone(),
    );

    Harness {
        owner,
        quote_account,
        recency,
        calls,
        wallet,
        market,
        resolver,
        submitter,
    }
}

fn filled_form(side: Side) -> OrderForm {
    let mut form = OrderForm::new();
    form.select_side(side);
    form.set_base_amount("12.5");
    form.set_quote_amount("21.75");
    form
}

fn last_request(h: &Harness) -> OrderRequest {
    h.market.requests.lock().unwrap().last().cloned().unwrap()
}

// ==================================================
// TESTS
// ==================================================

#[tokio::test]
async fn no_wallet_is_a_silent_no_op() {
    let h = harness(Setup {
        connected: false,
        ..Setup::default()
    });

    let outcome = h.submitter.submit(&filled_form(Side::Buy)).await;

    assert!(matches!(outcome, SubmitOutcome::Skipped));
    assert_eq!(h.calls.network_total(), 0);
}

#[tokio::test]
async fn buy_is_paid_from_quote_account() {
    let h = harness(Setup::default());

    let outcome = h.submitter.submit(&filled_form(Side::Buy)).await;
    assert!(outcome.is_submitted());

    let request = last_request(&h);
    assert_eq!(request.owner, h.owner);
    assert_eq!(request.payer, Some(h.quote_account.address));
    assert_ne!(request.payer, Some(h.owner));
    assert_eq!(
        h.resolver.mints.lock().unwrap().as_slice(),
        &[h.market.descriptor.quote_mint]
    );
}

#[tokio::test]
async fn sell_is_paid_by_owner() {
    let h = harness(Setup::default());

    let outcome = h.submitter.submit(&filled_form(Side::Sell)).await;
    assert!(outcome.is_submitted());

    let request = last_request(&h);
    assert_eq!(request.payer, Some(h.owner));
    assert_ne!(request.payer, Some(h.quote_account.address));
}

#[tokio::test]
async fn request_carries_numbers_and_flag() {
    let h = harness(Setup::default());
    let mut form = filled_form(Side::Buy);
    form.toggle_post_only();

    h.submitter.submit(&form).await;

    let request = last_request(&h);
    assert_eq!(request.size, 12.5);
    assert_eq!(request.price, 21.75);
    assert_eq!(request.order_type, OrderType::PostOnly);
}

#[tokio::test]
async fn non_numeric_input_reaches_builder_as_nan() {
    let h = harness(Setup::default());
    let mut form = OrderForm::new();
    form.set_base_amount("");
    form.set_quote_amount("twelve");

    h.submitter.submit(&form).await;

    assert_eq!(h.calls.builds.load(Ordering::SeqCst), 1);
    let request = last_request(&h);
    assert!(request.size.is_nan());
    assert!(request.price.is_nan());
}

#[tokio::test]
async fn envelope_is_built_from_fresh_recency() {
    let h = harness(Setup::default());

    h.submitter.submit(&filled_form(Side::Buy)).await;

    let sent = h.wallet.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (envelope, signers) = &sent[0];
    assert_eq!(envelope.blockhash, h.recency.blockhash);
    assert_eq!(envelope.last_valid_block_height, 1_000);
    assert_eq!(envelope.fee_payer, h.owner);
    assert_eq!(envelope.instructions, vec![h.market.order_ix.clone()]);
    assert_eq!(signers.len(), 1);
}

#[tokio::test]
async fn round_trips_run_in_order() {
    let h = harness(Setup::default());

    let outcome = h.submitter.submit(&filled_form(Side::Sell)).await;
    assert!(outcome.is_submitted());

    assert_eq!(
        h.calls.sequence(),
        vec!["lookup", "build", "blockhash", "send"]
    );
}

#[tokio::test]
async fn build_failure_stops_before_blockhash() {
    let h = harness(Setup {
        quote_account_exists: false,
        ..Setup::default()
    });

    h.submitter.submit(&filled_form(Side::Buy)).await;

    assert_eq!(h.calls.sequence(), vec!["lookup", "build"]);
}

#[tokio::test]
async fn wallet_rejection_is_contained() {
    let h = harness(Setup {
        wallet_fails: true,
        ..Setup::default()
    });
    let mut form = filled_form(Side::Buy);
    form.toggle_ioc();
    let before = form.clone();

    let outcome = h.submitter.submit(&form).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(SubmissionError::SignAndSend(_))
    ));
    assert_eq!(form, before);
    assert!(!h.submitter.is_in_flight());
}

#[tokio::test]
async fn missing_quote_account_fails_in_builder() {
    let h = harness(Setup {
        quote_account_exists: false,
        ..Setup::default()
    });

    let outcome = h.submitter.submit(&filled_form(Side::Sell)).await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(SubmissionError::OrderBuild(_))
    ));
    assert_eq!(last_request(&h).payer, None);
    assert_eq!(h.calls.blockhashes.load(Ordering::SeqCst), 0);
    assert_eq!(h.calls.sends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_submit_while_in_flight_is_refused() {
    let gate = Arc::new(Notify::new());
    let h = harness(Setup {
        gate: Some(gate.clone()),
        ..Setup::default()
    });
    let form = filled_form(Side::Buy);

    let (first, second) = tokio::join!(h.submitter.submit(&form), async {
        while !h.submitter.is_in_flight() {
            tokio::task::yield_now().await;
        }
        let outcome = h.submitter.submit(&form).await;
        gate.notify_one();
        outcome
    });

    assert!(first.is_submitted());
    assert!(matches!(second, SubmitOutcome::Busy));
    assert_eq!(h.calls.sends.load(Ordering::SeqCst), 1);
    assert!(!h.submitter.is_in_flight());
}
