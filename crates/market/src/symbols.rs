//! Cache of tradable symbol names.

use crate::BinanceClient;
use std::sync::RwLock;
use tracing::{info, warn};

/// Set of currently tradable trading-pair names.
///
/// Refreshed once at startup from exchange metadata and read-mostly after
/// that. A failed refresh keeps the previous (possibly empty) set.
#[derive(Default)]
pub struct SymbolCache {
    symbols: RwLock<Vec<String>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached set with symbols whose status is TRADING.
    ///
    /// Any failure is logged and leaves the existing set in place; the
    /// caller never sees an error.
    pub async fn refresh(&self, client: &BinanceClient) {
        match client.exchange_info().await {
            Ok(infos) => {
                let mut symbols: Vec<String> = infos
                    .into_iter()
                    .filter(|s| s.is_trading())
                    .map(|s| s.symbol)
                    .collect();
                symbols.sort_unstable();
                info!("Symbol cache refreshed: {} trading pairs", symbols.len());
                *self.symbols.write().expect("symbol cache lock poisoned") = symbols;
            }
            Err(e) => {
                warn!("Failed to refresh symbol cache, keeping previous set: {}", e);
            }
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols
            .read()
            .expect("symbol cache lock poisoned")
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .is_ok()
    }

    /// Substring matches for an inline query, capped at `limit`.
    pub fn matching(&self, query: &str, limit: usize) -> Vec<String> {
        self.symbols
            .read()
            .expect("symbol cache lock poisoned")
            .iter()
            .filter(|s| s.contains(query))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.read().expect("symbol cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test helper: seed the cache without hitting the network.
    #[doc(hidden)]
    pub fn with_symbols(symbols: Vec<String>) -> Self {
        let mut symbols = symbols;
        symbols.sort_unstable();
        Self {
            symbols: RwLock::new(symbols),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cache() -> SymbolCache {
        SymbolCache::with_symbols(vec![
            "BTCUSDT".to_string(),
            "ETHUSDT".to_string(),
            "ETHBTC".to_string(),
            "WBTCUSDT".to_string(),
            "SOLUSDT".to_string(),
        ])
    }

    #[test]
    fn test_contains() {
        let cache = cache();
        assert!(cache.contains("BTCUSDT"));
        assert!(!cache.contains("XXXXYYYY"));
        assert!(!cache.contains("btcusdt"));
    }

    #[test]
    fn test_matching_substring_only() {
        let cache = cache();
        let matches = cache.matching("BTC", 20);
        assert_eq!(matches, vec!["BTCUSDT", "ETHBTC", "WBTCUSDT"]);
    }

    #[test]
    fn test_matching_caps_at_limit() {
        let symbols: Vec<String> = (0..50).map(|i| format!("BTC{:02}USDT", i)).collect();
        let cache = SymbolCache::with_symbols(symbols);
        assert_eq!(cache.matching("BTC", 20).len(), 20);
    }

    #[test]
    fn test_matching_no_hits() {
        assert!(cache().matching("DOGE", 20).is_empty());
    }

    #[test]
    fn test_empty_cache() {
        let cache = SymbolCache::new();
        assert!(cache.is_empty());
        assert!(!cache.contains("BTCUSDT"));
    }
}
