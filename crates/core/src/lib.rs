//! Core data types for the price watch bot.

pub mod alert;
pub mod candle;
pub mod indicators;
pub mod interval;

pub use alert::*;
pub use candle::*;
pub use interval::*;
