use openbook_order_entry::*;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use config::{Args, Config};
use log::info;
use std::sync::Arc;

use client::RpcConnection;
use domain::{OrderForm, SubmitOutcome};
use execution::OrderSubmitter;
use market::discovery::load_market;
use market::OpenBookMarket;
use wallet::{KeypairWallet, RpcAccountResolver};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    // ===============================
    // CONNECTION
    // ===============================
    let rpc_url = config.rpc_url();
    let commitment = config.commitment();
    let connection = RpcConnection::new(&rpc_url, commitment);
    let rpc = connection.rpc();

    info!("🌐 RPC: {}", rpc_url);

    // ===============================
    // WALLET
    // ===============================
    let read_only = args.read_only || config.is_read_only();
    let wallet = match config.keypair_path() {
        Some(path) => KeypairWallet::from_file(&path, rpc.clone(), read_only)?,
        None => KeypairWallet::new(None, rpc.clone(), read_only),
    };

    // ===============================
    // MARKET
    // ===============================
    let descriptor = load_market(&rpc, &config.market_address()?, &config.program_id()?).await?;
    let market = OpenBookMarket::new(
        descriptor,
        rpc.clone(),
        commitment,
        config.trading.self_trade_behavior,
    );

    let submitter = OrderSubmitter::new(
        Arc::new(wallet),
        Arc::new(connection),
        Arc::new(market),
        Arc::new(RpcAccountResolver::new(rpc, commitment)),
    );

    // ===============================
    // FORM INPUT
    // ===============================
    let mut form = OrderForm::new();
    form.select_side(args.side);
    form.set_base_amount(args.size);
    form.set_quote_amount(args.price);
    if args.post_only {
        form.toggle_post_only();
    }
    if args.ioc {
        form.toggle_ioc();
    }

    let outcome = submitter.submit(&form).await;
    if let Some(sig) = outcome.signature() {
        println!("{} {}", "Submitted".green().bold(), sig);
    } else if let Some(e) = outcome.error() {
        println!("{} {}", "Failed".red().bold(), e);
        std::process::exit(1);
    } else if matches!(outcome, SubmitOutcome::Busy) {
        println!("{} submission already running", "Busy".yellow().bold());
    } else {
        println!("{} no keypair configured", "Skipped".yellow().bold());
    }

    Ok(())
}
