//! Telegram bot handlers.

use pricewatch_alerts::{AlertStore, StoreError, TriggeredAlert};
use pricewatch_chart::{ChartError, ChartSummary, RenderedChart, MAX_PLOT_CANDLES, WARMUP_CANDLES};
use pricewatch_core::{Alert, AlertCondition, Interval};
use pricewatch_market::{BinanceClient, MarketError, SymbolCache};
use std::sync::Arc;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{
    InlineQuery, InlineQueryResult, InlineQueryResultArticle, InputFile, InputMessageContent,
    InputMessageContentText, ParseMode,
};
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_CHART_DAYS: u32 = 30;
const MAX_CHART_DAYS: u32 = 500;

/// Inline queries shorter than this are ignored.
const MIN_INLINE_QUERY_LEN: usize = 2;
const MAX_INLINE_RESULTS: usize = 20;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show usage")]
    Start,
    #[command(description = "Candlestick chart. Usage: /chart BTCUSDT 1d 90")]
    Chart(String),
    #[command(description = "Set a price alert. Usage: /alert BTCUSDT > 65000")]
    Alert(String),
    #[command(description = "List your alerts")]
    MyAlerts,
    #[command(description = "Delete an alert by number. Usage: /delete_alert 1")]
    DeleteAlert(String),
}

/// The bot service object: Telegram handle plus all shared state.
pub struct PriceWatchBot {
    bot: Bot,
    market: BinanceClient,
    symbols: Arc<SymbolCache>,
    store: Arc<AlertStore>,
}

impl PriceWatchBot {
    pub fn new(
        token: &str,
        market: BinanceClient,
        symbols: Arc<SymbolCache>,
        store: Arc<AlertStore>,
    ) -> Self {
        Self {
            bot: Bot::new(token),
            market,
            symbols,
            store,
        }
    }

    pub fn market(&self) -> &BinanceClient {
        &self.market
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    /// Push a notification to a chat, used by the periodic checker.
    pub async fn notify(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    /// Run the dispatcher until shutdown.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let cmd_self = Arc::clone(&self);
        let inline_self = Arc::clone(&self);

        let handler = dptree::entry()
            .branch(Update::filter_message().filter_command::<Command>().endpoint(
                move |bot: Bot, msg: Message, cmd: Command| {
                    let this = Arc::clone(&cmd_self);
                    async move { this.handle_command(bot, msg, cmd).await }
                },
            ))
            .branch(Update::filter_inline_query().endpoint(
                move |bot: Bot, query: InlineQuery| {
                    let this = Arc::clone(&inline_self);
                    async move { this.handle_inline_query(bot, query).await }
                },
            ));

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(&self, bot: Bot, msg: Message, cmd: Command) -> Result<(), BotError> {
        match cmd {
            Command::Start => {
                bot.send_message(msg.chat.id, usage_text())
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            Command::Chart(args) => self.handle_chart(&bot, &msg, &args).await?,
            Command::Alert(args) => self.handle_alert(&bot, &msg, &args).await?,
            Command::MyAlerts => {
                let alerts = self.store.list(msg.chat.id.0);
                bot.send_message(msg.chat.id, format_alert_list(&alerts))
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            Command::DeleteAlert(args) => self.handle_delete_alert(&bot, &msg, &args).await?,
        }
        Ok(())
    }

    async fn handle_chart(&self, bot: &Bot, msg: &Message, args: &str) -> Result<(), BotError> {
        let request = match parse_chart_args(args) {
            Ok(request) => request,
            Err(hint) => {
                bot.send_message(msg.chat.id, hint).await?;
                return Ok(());
            }
        };

        let status = bot
            .send_message(msg.chat.id, format!("⏳ Fetching {} data…", request.symbol))
            .await?;

        match self.fetch_and_render(&request).await {
            Ok(chart) => {
                // Best effort: a failed delete must not block the photo.
                if let Err(e) = bot.delete_message(msg.chat.id, status.id).await {
                    warn!("Failed to delete status message: {}", e);
                }
                let caption = chart_caption(&request, &chart.summary);
                bot.send_photo(
                    msg.chat.id,
                    InputFile::memory(chart.png).file_name("chart.png"),
                )
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .await?;
            }
            Err(notice) => {
                // The transient status message is always resolved: edit it
                // in place, or replace it if even the edit fails.
                if bot
                    .edit_message_text(msg.chat.id, status.id, notice.clone())
                    .await
                    .is_err()
                {
                    bot.send_message(msg.chat.id, notice).await?;
                }
            }
        }
        Ok(())
    }

    /// Fetch candles and render; failures come back as the user-facing
    /// notice so the caller only deals with messaging.
    async fn fetch_and_render(&self, request: &ChartRequest) -> Result<RenderedChart, String> {
        let secs = request.interval.secs();
        let display = (((request.days as u64 * 86_400) + secs - 1) / secs)
            .min(MAX_PLOT_CANDLES as u64) as usize;
        let total = display + WARMUP_CANDLES;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let start_ms = now_ms - (total as i64) * (secs as i64) * 1000;

        let candles = match self
            .market
            .klines(&request.symbol, request.interval, start_ms, total)
            .await
        {
            Ok(candles) => candles,
            Err(MarketError::UnknownSymbol(_)) => return Err(no_data_notice(&request.symbol)),
            Err(e) => {
                warn!("Failed to fetch klines for {}: {}", request.symbol, e);
                return Err("⚠️ Failed to fetch chart data.".to_string());
            }
        };

        let display_from = candles.len().saturating_sub(display);
        match pricewatch_chart::render(&candles, display_from) {
            Ok(chart) => Ok(chart),
            Err(ChartError::NoData) => Err(no_data_notice(&request.symbol)),
            Err(e) => {
                warn!("Failed to render chart for {}: {}", request.symbol, e);
                Err("⚠️ Failed to render chart.".to_string())
            }
        }
    }

    async fn handle_alert(&self, bot: &Bot, msg: &Message, args: &str) -> Result<(), BotError> {
        let (symbol, condition, price) = match parse_alert_args(args) {
            Ok(parsed) => parsed,
            Err(hint) => {
                bot.send_message(msg.chat.id, hint).await?;
                return Ok(());
            }
        };

        // Cache miss falls back to a live probe, in case the pair listed
        // after the startup refresh.
        if !self.symbols.contains(&symbol) {
            match self.market.ticker_price(&symbol).await {
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    warn!("Symbol probe for {} failed: {}", symbol, e);
                    bot.send_message(msg.chat.id, "⚠️ Could not verify the symbol, try again.")
                        .await?;
                    return Ok(());
                }
                Err(_) => {
                    bot.send_message(msg.chat.id, format!("Pair '{}' not found.", symbol))
                        .await?;
                    return Ok(());
                }
            }
        }

        let alert = self.store.add(msg.chat.id.0, symbol, condition, price);
        info!("Alert set: chat={} {} {} {}", msg.chat.id, alert.symbol, alert.condition, alert.price);
        bot.send_message(
            msg.chat.id,
            format!("✅ Alert set for <b>{}</b>!", alert.symbol),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        Ok(())
    }

    async fn handle_delete_alert(&self, bot: &Bot, msg: &Message, args: &str) -> Result<(), BotError> {
        let position = match args.trim().parse::<usize>() {
            Ok(position) => position,
            Err(_) => {
                bot.send_message(msg.chat.id, "Usage: /delete_alert <number>\nExample: /delete_alert 1")
                    .await?;
                return Ok(());
            }
        };

        match self.store.remove(msg.chat.id.0, position) {
            Ok(removed) => {
                bot.send_message(msg.chat.id, format!("🗑️ Removed: {}", removed.symbol))
                    .await?;
            }
            Err(StoreError::InvalidIndex) => {
                bot.send_message(
                    msg.chat.id,
                    "Invalid alert number. Use /my_alerts to see the numbering.",
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn handle_inline_query(&self, bot: Bot, query: InlineQuery) -> Result<(), BotError> {
        let needle = query.query.trim().to_uppercase();
        if needle.len() < MIN_INLINE_QUERY_LEN {
            return Ok(());
        }

        let results: Vec<InlineQueryResult> = self
            .symbols
            .matching(&needle, MAX_INLINE_RESULTS)
            .into_iter()
            .map(|symbol| {
                let content = InputMessageContent::Text(InputMessageContentText::new(
                    inline_suggestion(&symbol),
                ));
                InlineQueryResult::Article(
                    InlineQueryResultArticle::new(symbol.clone(), symbol.clone(), content)
                        .description(format!("{} chart", symbol)),
                )
            })
            .collect();

        bot.answer_inline_query(query.id, results).await?;
        Ok(())
    }
}

fn usage_text() -> String {
    "Hi! I watch Binance prices for you.\n\n\
     📈 /chart &lt;SYMBOL&gt; &lt;INTERVAL&gt; [DAYS]\n\
     🔔 /alert &lt;SYMBOL&gt; &gt;|&lt; &lt;PRICE&gt;\n\
     📋 /my_alerts\n\
     🗑️ /delete_alert &lt;NUMBER&gt;"
        .to_string()
}

#[derive(Debug, Clone, PartialEq)]
struct ChartRequest {
    symbol: String,
    interval: Interval,
    days: u32,
}

fn parse_chart_args(args: &str) -> Result<ChartRequest, String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() < 2 {
        return Err("Usage: /chart <SYMBOL> <INTERVAL> [DAYS]\nExample: /chart BTCUSDT 1d 90".to_string());
    }

    let symbol = parts[0].to_uppercase();
    let interval: Interval = parts[1]
        .parse()
        .map_err(|_| format!("Unknown interval '{}'. Try 15m, 1h, 4h, 1d or 1w.", parts[1]))?;

    let days = match parts.get(2) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a number of days.", raw))?,
        None => DEFAULT_CHART_DAYS,
    };
    let days = days.clamp(1, MAX_CHART_DAYS);

    Ok(ChartRequest { symbol, interval, days })
}

fn parse_alert_args(args: &str) -> Result<(String, AlertCondition, f64), String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 3 {
        return Err("Usage: /alert <SYMBOL> <condition> <PRICE>\nExample: /alert BTCUSDT > 65000".to_string());
    }

    let symbol = parts[0].to_uppercase();
    let condition: AlertCondition = parts[1]
        .parse()
        .map_err(|_| "Condition must be '>' or '<'.".to_string())?;
    let price = parts[2]
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| format!("'{}' is not a valid price.", parts[2]))?;

    Ok((symbol, condition, price))
}

fn format_alert_list(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No alerts set.".to_string();
    }
    let mut out = String::from("📋 <b>Your alerts:</b>\n");
    for (i, alert) in alerts.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} {} {:?}\n",
            i + 1,
            alert.symbol,
            alert.condition,
            alert.price
        ));
    }
    out
}

fn chart_caption(request: &ChartRequest, summary: &ChartSummary) -> String {
    format!(
        "<b>{} | {}</b>\n\
         Close: {}\n\
         High: {} / Low: {} ({}d)",
        request.symbol,
        request.interval,
        format_price(summary.last_close),
        format_price(summary.high),
        format_price(summary.low),
        request.days
    )
}

fn no_data_notice(symbol: &str) -> String {
    format!("No data for {}.", symbol)
}

fn inline_suggestion(symbol: &str) -> String {
    format!("/chart {} 1d", symbol)
}

/// Format an alert trigger as a notification message.
pub fn format_alert_notification(triggered: &TriggeredAlert) -> String {
    let alert = &triggered.alert;
    let now = chrono::Utc::now();
    format!(
        "🔔 <b>{}</b> hit {}\n\
         Condition: {} {}\n\n\
         ⏰ {}",
        alert.symbol,
        format_price(triggered.price),
        alert.condition,
        format_price(alert.price),
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Format a price with precision appropriate to its magnitude.
fn format_price(price: f64) -> String {
    let abs = price.abs();
    if abs >= 1000.0 {
        format!("{:.2}", price)
    } else if abs >= 1.0 {
        format!("{:.4}", price)
    } else if abs >= 0.01 {
        format!("{:.6}", price)
    } else {
        format!("{:.8}", price)
    }
}
