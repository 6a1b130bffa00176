//! Price alert storage and threshold evaluation.
//!
//! This crate provides:
//! - A JSON-file-backed alert store keyed by chat id
//! - Pure evaluation helpers for the periodic checker

pub mod checker;
pub mod store;

pub use checker::{distinct_symbols, triggered_alerts, TriggeredAlert};
pub use store::{AlertStore, StoreError};
