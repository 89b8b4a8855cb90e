use anyhow::Result;
use clap::Parser;
use openbook_order_entry::config::Config;
use openbook_order_entry::market::discovery::load_market;
use solana_client::nonblocking::rpc_client::RpcClient;
use std::path::PathBuf;

/// Print the decoded market and a few lot conversions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let rpc = RpcClient::new_with_commitment(config.rpc_url(), config.commitment());
    let market = load_market(&rpc, &config.market_address()?, &config.program_id()?).await?;

    println!("{}", serde_json::to_string_pretty(&market)?);
    println!("\nprice tick: {}", market.price_lots_to_number(1)?);
    println!(
        "min size:   {}",
        market.base_lot_size as f64 / 10f64.powi(market.base_decimals as i32)
    );

    Ok(())
}
