use gridbot::api::HttpMarketData;
use gridbot::execution::{HttpBundleRelay, RpcChainAccount};
use gridbot::{Pipeline, PipelineConfig, Result, RunStatus};

use serde_json::json;
use tokio::time::{interval, Duration, MissedTickBehavior};

const DEFAULT_SYMBOL: &str = "BTC-USDT";
const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    tracing::info!("gridbot starting");

    let symbol = env_or("GRIDBOT_SYMBOL", DEFAULT_SYMBOL);
    let rpc_url = env_or("GRIDBOT_RPC_URL", "http://127.0.0.1:8899");
    let relay_url = env_or("GRIDBOT_RELAY_URL", "http://127.0.0.1:9100");
    let account_address =
        std::env::var("GRIDBOT_ACCOUNT_ADDRESS").expect("GRIDBOT_ACCOUNT_ADDRESS not found in environment");
    let private_key =
        std::env::var("GRIDBOT_PRIVATE_KEY").expect("GRIDBOT_PRIVATE_KEY not found in environment");
    let poll_minutes = std::env::var("GRIDBOT_POLL_INTERVAL_MINUTES")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MINUTES);

    let mut config = PipelineConfig::default();
    if let Some(balance) = std::env::var("GRIDBOT_ACCOUNT_BALANCE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
    {
        config.account_balance = balance;
    }

    tracing::info!("configuration:");
    tracing::info!("  symbol: {}", symbol);
    tracing::info!("  timeframe: {}", config.timeframe);
    tracing::info!("  account balance: {:.2}", config.account_balance);
    tracing::info!("  poll interval: {} min", poll_minutes);

    let market = HttpMarketData::new();
    let relay = HttpBundleRelay::new(relay_url);
    let account = RpcChainAccount::new(rpc_url, account_address, private_key);
    let pipeline = Pipeline::new(market, relay, account, config);

    let mut ticker = interval(Duration::from_secs(poll_minutes * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received Ctrl+C, shutting down");
                break;
            }
            _ = ticker.tick() => {
                // Each tick is an independent run with its own nonce fetch,
                // so overlapping invocations cannot collide on the account
                match pipeline.run(&symbol).await {
                    Ok(status) => log_status(&status),
                    Err(e) => tracing::error!("run terminated: {}", e),
                }
            }
        }
    }

    tracing::info!("gridbot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridbot=info".into()),
        )
        .init();
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn log_status(status: &RunStatus) {
    match serde_json::to_string_pretty(&json!({ status.symbol.clone(): status })) {
        Ok(rendered) => tracing::info!("system status:\n{}", rendered),
        Err(e) => tracing::warn!("failed to render status: {}", e),
    }
}
