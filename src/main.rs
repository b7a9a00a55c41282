use dotenv::dotenv;
use tracing::{error, info};

use solswap::config::Settings;
use solswap::error::{log_error, Result, SwapError};
use solswap::monitoring::init_logging;
use solswap::service::{QuoteQuery, SwapService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first
    dotenv().ok();

    let settings = Settings::from_env()?;

    let console_level =
        std::env::var("RUST_LOG").unwrap_or_else(|_| settings.log_level.clone());
    let log_dir = std::env::var("LOG_DIR").ok();
    let _guard = init_logging(&console_level, log_dir.as_deref())?;

    info!("Starting solswap...");
    info!("Solana RPC: {}", settings.rpc_url);

    let service = SwapService::from_settings(&settings);

    match std::env::var("FLOW").ok().as_deref() {
        Some("quote") => run_quote_flow(&service).await,
        Some("holdings") => run_holdings_flow(&service).await,
        _ => {
            error!("Please set the FLOW environment variable (quote | holdings)");
            Ok(())
        }
    }
}

/// Resolves, quotes, and builds the unsigned swap for the query described
/// by the environment, printing the tagged outcome as JSON.
async fn run_quote_flow(service: &SwapService) -> Result<()> {
    let query = QuoteQuery {
        user_address: required_env("USER_ADDRESS")?,
        sell_token: required_env("SELL_TOKEN")?,
        buy_token: required_env("BUY_TOKEN")?,
        amount: required_env("AMOUNT")?
            .parse()
            .map_err(|e| SwapError::Environment(format!("AMOUNT is not a number: {e}")))?,
    };

    match service.run(&query).await {
        Ok(outcome) => {
            info!(status = outcome.status(), "quote flow finished");
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Err(e) => {
            log_error(&e, "quote flow");
            println!("{}", serde_json::to_string_pretty(&e.to_body())?);
        }
    }
    Ok(())
}

async fn run_holdings_flow(service: &SwapService) -> Result<()> {
    let user_address = required_env("USER_ADDRESS")?;
    match service.holdings(&user_address).await {
        Ok(holdings) => {
            println!("{}", serde_json::to_string_pretty(&holdings)?);
        }
        Err(e) => {
            log_error(&e, "holdings flow");
            println!("{}", serde_json::to_string_pretty(&e.to_body())?);
        }
    }
    Ok(())
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| SwapError::Environment(format!("{key} is not set")))
}
