//! Price alert records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("condition must be '>' or '<'")]
pub struct ParseConditionError;

/// Direction of a price threshold alert.
///
/// Serializes as the operator token so the alerts file stays readable
/// (`">"` / `"<"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCondition {
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<")]
    Below,
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCondition::Above => f.write_str(">"),
            AlertCondition::Below => f.write_str("<"),
        }
    }
}

impl FromStr for AlertCondition {
    type Err = ParseConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(AlertCondition::Above),
            "<" => Ok(AlertCondition::Below),
            _ => Err(ParseConditionError),
        }
    }
}

/// A single price alert owned by one chat.
///
/// The `id` is assigned by the store at runtime and never serialized;
/// users only ever see a derived 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(skip)]
    pub id: u64,
    pub symbol: String,
    pub condition: AlertCondition,
    pub price: f64,
}

impl Alert {
    /// Whether the current price satisfies the alert condition.
    /// Both comparisons are strict.
    pub fn is_triggered(&self, current_price: f64) -> bool {
        match self.condition {
            AlertCondition::Above => current_price > self.price,
            AlertCondition::Below => current_price < self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alert(condition: AlertCondition, price: f64) -> Alert {
        Alert {
            id: 1,
            symbol: "BTCUSDT".to_string(),
            condition,
            price,
        }
    }

    #[test]
    fn test_condition_parse_and_display() {
        assert_eq!(">".parse::<AlertCondition>().unwrap(), AlertCondition::Above);
        assert_eq!("<".parse::<AlertCondition>().unwrap(), AlertCondition::Below);
        assert!(">=".parse::<AlertCondition>().is_err());
        assert_eq!(AlertCondition::Above.to_string(), ">");
        assert_eq!(AlertCondition::Below.to_string(), "<");
    }

    #[test]
    fn test_is_triggered_strict() {
        let above = alert(AlertCondition::Above, 65000.0);
        assert!(above.is_triggered(70000.0));
        assert!(!above.is_triggered(65000.0));
        assert!(!above.is_triggered(60000.0));

        let below = alert(AlertCondition::Below, 65000.0);
        assert!(below.is_triggered(60000.0));
        assert!(!below.is_triggered(65000.0));
        assert!(!below.is_triggered(70000.0));
    }

    #[test]
    fn test_serde_operator_tokens() {
        let a = alert(AlertCondition::Above, 65000.0);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"symbol":"BTCUSDT","condition":">","price":65000.0}"#);

        let parsed: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.symbol, "BTCUSDT");
        assert_eq!(parsed.condition, AlertCondition::Above);
        assert_eq!(parsed.price, 65000.0);
        // Skipped field deserializes to its default.
        assert_eq!(parsed.id, 0);
    }
}
