//! Binance REST client.
//!
//! Talks to the public spot endpoints only; no authentication.

use crate::MarketError;
use pricewatch_core::{Candle, Interval};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance returns at most 1000 klines per request.
const KLINES_PAGE_LIMIT: usize = 1000;

/// Binance error code for an unknown trading pair.
const CODE_INVALID_SYMBOL: i64 = -1121;

/// One entry from the exchangeInfo symbol list.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
}

impl SymbolInfo {
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeInfoResponse {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// HTTP client for the Binance public market-data API.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host, e.g. a Binance mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch all symbols with their trading status.
    pub async fn exchange_info(&self) -> Result<Vec<SymbolInfo>, MarketError> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let resp: ExchangeInfoResponse = self.get_json(&url).await?;
        debug!("Binance: fetched {} symbols", resp.symbols.len());
        Ok(resp.symbols)
    }

    /// Fetch the current spot price for a symbol.
    pub async fn ticker_price(&self, symbol: &str) -> Result<f64, MarketError> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);
        let resp: TickerPriceResponse = self.get_json(&url).await?;
        resp.price
            .parse::<f64>()
            .map_err(|e| MarketError::Parse(format!("bad price '{}': {}", resp.price, e)))
    }

    /// Fetch up to `max` klines starting at `start_ms`, in ascending order.
    ///
    /// Pages through the API in chunks of 1000, advancing `startTime` past
    /// the last open time, until `max` candles or history is exhausted.
    pub async fn klines(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
        max: usize,
    ) -> Result<Vec<Candle>, MarketError> {
        let mut candles: Vec<Candle> = Vec::new();
        let mut cursor = start_ms;

        while candles.len() < max {
            let limit = (max - candles.len()).min(KLINES_PAGE_LIMIT);
            let url = format!(
                "{}/api/v3/klines?symbol={}&interval={}&startTime={}&limit={}",
                self.base_url,
                symbol,
                interval.as_str(),
                cursor,
                limit
            );
            let rows: Vec<Vec<serde_json::Value>> = self.get_json(&url).await?;
            if rows.is_empty() {
                break;
            }
            let page_len = rows.len();
            for row in &rows {
                candles.push(parse_kline_row(row)?);
            }
            // Safe: the page was non-empty.
            cursor = candles[candles.len() - 1].open_time + 1;
            if page_len < limit {
                break;
            }
        }

        debug!("Binance: fetched {} {} klines for {}", candles.len(), interval, symbol);
        Ok(candles)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, MarketError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketError::FetchFailed(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 || status.as_u16() == 418 {
            return Err(MarketError::RateLimited);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| MarketError::FetchFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| MarketError::Parse(e.to_string()))
    }
}

/// Map a non-success response body to a typed error.
fn parse_api_error(http_status: u16, body: &str) -> MarketError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) if err.code == CODE_INVALID_SYMBOL => MarketError::UnknownSymbol(err.msg),
        Ok(err) => MarketError::Api {
            code: err.code,
            message: err.msg,
        },
        Err(_) => MarketError::FetchFailed(format!("HTTP {}", http_status)),
    }
}

/// Parse one row of the klines response.
///
/// Rows are heterogeneous arrays: open time and close time are integers,
/// prices and volume are decimal strings, followed by fields we ignore.
fn parse_kline_row(row: &[serde_json::Value]) -> Result<Candle, MarketError> {
    if row.len() < 7 {
        return Err(MarketError::Parse(format!(
            "kline row has {} fields, expected at least 7",
            row.len()
        )));
    }

    let time_at = |i: usize| -> Result<i64, MarketError> {
        row[i]
            .as_i64()
            .ok_or_else(|| MarketError::Parse(format!("kline field {} is not a timestamp", i)))
    };
    let num_at = |i: usize| -> Result<f64, MarketError> {
        match &row[i] {
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map_err(|e| MarketError::Parse(format!("kline field {}: {}", i, e))),
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| MarketError::Parse(format!("kline field {} is not finite", i))),
            _ => Err(MarketError::Parse(format!("kline field {} is not a number", i))),
        }
    };

    Ok(Candle {
        open_time: time_at(0)?,
        open: num_at(1)?,
        high: num_at(2)?,
        low: num_at(3)?,
        close: num_at(4)?,
        volume: num_at(5)?,
        close_time: time_at(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_exchange_info_response() {
        let json = r#"{
            "timezone": "UTC",
            "serverTime": 1700000000000,
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC"},
                {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA"}
            ]
        }"#;
        let resp: ExchangeInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.symbols.len(), 2);
        assert!(resp.symbols[0].is_trading());
        assert!(!resp.symbols[1].is_trading());
    }

    #[test]
    fn test_parse_ticker_price_response() {
        let json = r#"{"symbol": "BTCUSDT", "price": "65432.10000000"}"#;
        let resp: TickerPriceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.price.parse::<f64>().unwrap(), 65432.1);
    }

    #[test]
    fn test_parse_kline_row() {
        let json = r#"[
            1700000000000, "37000.01", "37500.00", "36800.50", "37200.99", "1234.567",
            1700003599999, "45000000.0", 8800, "600.0", "22000000.0", "0"
        ]"#;
        let row: Vec<serde_json::Value> = serde_json::from_str(json).unwrap();
        let candle = parse_kline_row(&row).unwrap();
        assert_eq!(candle.open_time, 1_700_000_000_000);
        assert_eq!(candle.open, 37000.01);
        assert_eq!(candle.high, 37500.0);
        assert_eq!(candle.low, 36800.5);
        assert_eq!(candle.close, 37200.99);
        assert_eq!(candle.volume, 1234.567);
        assert_eq!(candle.close_time, 1_700_003_599_999);
    }

    #[test]
    fn test_parse_kline_row_too_short() {
        let row: Vec<serde_json::Value> = serde_json::from_str("[1700000000000]").unwrap();
        assert!(matches!(parse_kline_row(&row), Err(MarketError::Parse(_))));
    }

    #[test]
    fn test_parse_api_error_unknown_symbol() {
        let err = parse_api_error(400, r#"{"code": -1121, "msg": "Invalid symbol."}"#);
        assert!(matches!(err, MarketError::UnknownSymbol(_)));
    }

    #[test]
    fn test_parse_api_error_other_code() {
        let err = parse_api_error(400, r#"{"code": -1100, "msg": "Illegal characters."}"#);
        match err {
            MarketError::Api { code, message } => {
                assert_eq!(code, -1100);
                assert_eq!(message, "Illegal characters.");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_api_error_unstructured_body() {
        let err = parse_api_error(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, MarketError::FetchFailed(_)));
    }
}
