//! Price watch bot.
//!
//! Telegram bot serving Binance candlestick charts and price-threshold
//! alerts.

mod checker;
mod config;
mod keepalive;
mod telegram;

use clap::Parser;
use config::Args;
use pricewatch_alerts::AlertStore;
use pricewatch_market::{BinanceClient, SymbolCache};
use std::sync::Arc;
use std::time::Duration;
use telegram::PriceWatchBot;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let token = match config::telegram_token() {
        Some(token) => token,
        None => {
            error!("{} is not set; refusing to start", config::TOKEN_ENV);
            std::process::exit(1);
        }
    };

    info!("🚀 Price watch bot starting...");
    info!("  Alerts file: {}", args.alerts_file);
    info!("  Check interval: {}s", args.check_interval);

    let store = Arc::new(AlertStore::load(&args.alerts_file));
    let market = BinanceClient::new();

    // A failed refresh is non-fatal; /alert falls back to live probes.
    let symbols = Arc::new(SymbolCache::new());
    symbols.refresh(&market).await;

    let port = args.keepalive_port();
    tokio::spawn(keepalive::run_keepalive(port));

    let bot = Arc::new(PriceWatchBot::new(&token, market, symbols, store));

    let checker_bot = Arc::clone(&bot);
    let check_interval = Duration::from_secs(args.check_interval.max(1));
    tokio::spawn(async move {
        checker::run_alert_checker(checker_bot, check_interval).await;
    });

    info!("Bot is up, dispatching updates");
    bot.run().await;

    info!("👋 Price watch bot stopped");
}
