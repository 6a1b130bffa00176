//! Error types for market-data operations.

use thiserror::Error;

/// Errors from the Binance public API.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("request failed: {0}")]
    FetchFailed(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
}

impl MarketError {
    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarketError::FetchFailed(_) | MarketError::RateLimited
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(MarketError::FetchFailed("timeout".into()).is_transient());
        assert!(MarketError::RateLimited.is_transient());
        assert!(!MarketError::UnknownSymbol("XXXXYYYY".into()).is_transient());
        assert!(!MarketError::Parse("bad json".into()).is_transient());
    }
}
