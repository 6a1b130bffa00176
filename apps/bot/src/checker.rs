//! Periodic alert checker.

use crate::telegram::{format_alert_notification, PriceWatchBot};
use pricewatch_alerts::{distinct_symbols, triggered_alerts};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Delay before the first cycle after startup.
const FIRST_RUN_DELAY: Duration = Duration::from_secs(10);

/// Run the checker forever: one cycle shortly after startup, then one per
/// `interval`.
pub async fn run_alert_checker(bot: Arc<PriceWatchBot>, interval: Duration) {
    info!("Starting alert checker (every {:?})", interval);
    tokio::time::sleep(FIRST_RUN_DELAY).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        run_cycle(&bot).await;
    }
}

/// One poll-compare-notify cycle.
///
/// Iterates over a snapshot so concurrent /alert and /delete_alert cannot
/// corrupt the pass. Per-symbol fetch failures and per-chat send failures
/// are isolated: a failed send leaves the alert in place for the next
/// cycle.
async fn run_cycle(bot: &Arc<PriceWatchBot>) {
    let snapshot = bot.store().snapshot();
    if snapshot.is_empty() {
        return;
    }

    let symbols = distinct_symbols(&snapshot);
    let mut prices: HashMap<String, f64> = HashMap::new();
    for symbol in &symbols {
        match bot.market().ticker_price(symbol).await {
            Ok(price) => {
                prices.insert(symbol.clone(), price);
            }
            Err(e) => {
                warn!("Skipping {} this cycle, price fetch failed: {}", symbol, e);
            }
        }
    }

    let triggered = triggered_alerts(&snapshot, &prices);
    if triggered.is_empty() {
        debug!("Checker cycle: {} symbols polled, nothing triggered", symbols.len());
        return;
    }

    let mut removals: HashMap<i64, Vec<u64>> = HashMap::new();
    for t in &triggered {
        match bot.notify(t.chat_id, &format_alert_notification(t)).await {
            Ok(()) => {
                removals.entry(t.chat_id).or_default().push(t.alert.id);
            }
            Err(e) => {
                warn!(
                    "Failed to notify chat {} about {}, keeping alert: {}",
                    t.chat_id, t.alert.symbol, e
                );
            }
        }
    }

    let removed = bot.store().remove_many(&removals);
    info!(
        "Checker cycle: {} triggered, {} notified and removed",
        triggered.len(),
        removed
    );
}
