//! Pure evaluation helpers for the periodic alert checker.
//!
//! The polling loop itself lives in the bot binary; everything here is
//! side-effect free so the trigger logic is testable without a network.

use pricewatch_core::Alert;
use std::collections::{BTreeSet, HashMap};

/// An alert whose condition held against a fetched price.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub chat_id: i64,
    pub alert: Alert,
    /// The price observed this cycle.
    pub price: f64,
}

/// The deduplicated set of symbols referenced across all chats' alerts.
/// One price lookup per distinct symbol bounds API calls per cycle.
pub fn distinct_symbols(snapshot: &HashMap<i64, Vec<Alert>>) -> BTreeSet<String> {
    snapshot
        .values()
        .flatten()
        .map(|a| a.symbol.clone())
        .collect()
}

/// Every alert whose symbol has a fetched price and whose condition holds.
/// Symbols missing from `prices` (failed lookups) are skipped this cycle.
pub fn triggered_alerts(
    snapshot: &HashMap<i64, Vec<Alert>>,
    prices: &HashMap<String, f64>,
) -> Vec<TriggeredAlert> {
    let mut triggered = Vec::new();
    for (&chat_id, alerts) in snapshot {
        for alert in alerts {
            if let Some(&price) = prices.get(&alert.symbol) {
                if alert.is_triggered(price) {
                    triggered.push(TriggeredAlert {
                        chat_id,
                        alert: alert.clone(),
                        price,
                    });
                }
            }
        }
    }
    triggered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pricewatch_core::AlertCondition;

    fn alert(id: u64, symbol: &str, condition: AlertCondition, price: f64) -> Alert {
        Alert {
            id,
            symbol: symbol.to_string(),
            condition,
            price,
        }
    }

    #[test]
    fn test_distinct_symbols_deduplicates_across_chats() {
        let mut snapshot = HashMap::new();
        snapshot.insert(
            1,
            vec![
                alert(1, "BTCUSDT", AlertCondition::Above, 65000.0),
                alert(2, "ETHUSDT", AlertCondition::Below, 3000.0),
            ],
        );
        snapshot.insert(2, vec![alert(3, "BTCUSDT", AlertCondition::Below, 50000.0)]);

        let symbols = distinct_symbols(&snapshot);
        assert_eq!(symbols.len(), 2);
        assert!(symbols.contains("BTCUSDT"));
        assert!(symbols.contains("ETHUSDT"));
    }

    #[test]
    fn test_triggered_above_threshold() {
        let mut snapshot = HashMap::new();
        snapshot.insert(42, vec![alert(1, "BTCUSDT", AlertCondition::Above, 65000.0)]);
        let prices = HashMap::from([("BTCUSDT".to_string(), 70000.0)]);

        let triggered = triggered_alerts(&snapshot, &prices);
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].chat_id, 42);
        assert_eq!(triggered[0].alert.id, 1);
        assert_eq!(triggered[0].price, 70000.0);
    }

    #[test]
    fn test_not_triggered_at_or_below_threshold() {
        let mut snapshot = HashMap::new();
        snapshot.insert(42, vec![alert(1, "BTCUSDT", AlertCondition::Above, 65000.0)]);

        let at = HashMap::from([("BTCUSDT".to_string(), 65000.0)]);
        assert!(triggered_alerts(&snapshot, &at).is_empty());

        let below = HashMap::from([("BTCUSDT".to_string(), 64999.9)]);
        assert!(triggered_alerts(&snapshot, &below).is_empty());
    }

    #[test]
    fn test_missing_price_skips_alert() {
        let mut snapshot = HashMap::new();
        snapshot.insert(
            42,
            vec![
                alert(1, "BTCUSDT", AlertCondition::Above, 1.0),
                alert(2, "ETHUSDT", AlertCondition::Above, 1.0),
            ],
        );
        // ETHUSDT lookup failed this cycle.
        let prices = HashMap::from([("BTCUSDT".to_string(), 70000.0)]);

        let triggered = triggered_alerts(&snapshot, &prices);
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].alert.symbol, "BTCUSDT");
    }

    #[test]
    fn test_cycle_then_empty_cycle() {
        // A full cycle against 70000 triggers the one alert; once removed,
        // the next cycle triggers nothing.
        use crate::store::AlertStore;

        let path = std::env::temp_dir().join(format!(
            "pricewatch-checker-cycle-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let store = AlertStore::load(&path);
        store.add(42, "BTCUSDT".to_string(), AlertCondition::Above, 65000.0);

        let prices = HashMap::from([("BTCUSDT".to_string(), 70000.0)]);
        let triggered = triggered_alerts(&store.snapshot(), &prices);
        assert_eq!(triggered.len(), 1);

        let mut removals: HashMap<i64, Vec<u64>> = HashMap::new();
        for t in &triggered {
            removals.entry(t.chat_id).or_default().push(t.alert.id);
        }
        assert_eq!(store.remove_many(&removals), 1);

        let triggered = triggered_alerts(&store.snapshot(), &prices);
        assert!(triggered.is_empty());

        let _ = std::fs::remove_file(&path);
    }
}
