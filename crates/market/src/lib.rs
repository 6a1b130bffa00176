//! Binance public market-data client and symbol cache.

pub mod client;
pub mod error;
pub mod symbols;

pub use client::{BinanceClient, SymbolInfo};
pub use error::MarketError;
pub use symbols::SymbolCache;
