//! OHLCV candle data.

use serde::{Deserialize, Serialize};

/// One interval's worth of market data for a trading pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds since epoch.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Close time in milliseconds since epoch.
    pub close_time: i64,
}

impl Candle {
    /// Whether the candle closed at or above its open.
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_bullish() {
        let up = Candle {
            open_time: 0,
            open: 100.0,
            high: 110.0,
            low: 95.0,
            close: 105.0,
            volume: 1.0,
            close_time: 59_999,
        };
        assert!(up.is_bullish());

        let down = Candle { close: 95.0, ..up };
        assert!(!down.is_bullish());
    }
}
