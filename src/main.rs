use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use staketally::addresses::load_addresses;
use staketally::aggregator::{tally_addresses, AddressOutcome};
use staketally::config::Config;
use staketally::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
use staketally::logger::{self, LogTag};
use staketally::rpc::{HttpLedgerClient, LedgerRpc};

/// Count historical transactions for a list of addresses, including the
/// stake accounts each address controls.
#[derive(Parser, Debug)]
#[command(name = "staketally", version, about)]
struct Args {
    /// Path to the newline-delimited address list
    addresses: PathBuf,

    /// RPC endpoint URL (overrides the STAKETALLY_RPC_URL environment variable)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Attempt ceiling for each remote operation
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Initial backoff delay in milliseconds, doubled after each failed attempt
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args = Args::parse();
    logger::init(args.debug);

    let config = Config::resolve(args.rpc_url, args.max_attempts, args.retry_delay_ms);
    logger::info(
        LogTag::System,
        &format!("staketally starting against {}", config.rpc_url),
    );

    // An unreadable address list is the one fatal error of the run.
    let addresses = match load_addresses(&args.addresses, &config.retry).await {
        Ok(addresses) => addresses,
        Err(e) => {
            logger::error(LogTag::System, &format!("cannot load address list: {}", e));
            std::process::exit(1);
        }
    };

    if addresses.is_empty() {
        logger::warning(LogTag::System, "no valid addresses to process");
    }

    let rpc: Arc<dyn LedgerRpc> = match HttpLedgerClient::new(&config.rpc_url) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            logger::error(LogTag::System, &format!("cannot reach the ledger: {}", e));
            std::process::exit(1);
        }
    };

    let summary = tally_addresses(&rpc, &addresses, &config.retry).await;

    let failed = summary
        .outcomes
        .iter()
        .filter(|o| matches!(o, AddressOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        logger::warning(
            LogTag::Tally,
            &format!("{} address(es) skipped after exhausted retries", failed),
        );
    }

    logger::info(
        LogTag::Tally,
        &format!(
            "total transactions across {} address(es): {}",
            addresses.len(),
            summary.total
        ),
    );
    println!("{}", summary.total);
}
