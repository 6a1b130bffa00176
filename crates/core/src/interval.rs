//! Binance kline intervals.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown interval: {0}")]
pub struct ParseIntervalError(pub String);

/// A candle interval as understood by the Binance klines endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Min1,
    Min3,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour2,
    Hour4,
    Hour6,
    Hour8,
    Hour12,
    Day1,
    Day3,
    Week1,
    Month1,
}

impl Interval {
    /// The exact string Binance expects (case-sensitive: "1m" is a minute,
    /// "1M" is a month).
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Min1 => "1m",
            Interval::Min3 => "3m",
            Interval::Min5 => "5m",
            Interval::Min15 => "15m",
            Interval::Min30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Hour2 => "2h",
            Interval::Hour4 => "4h",
            Interval::Hour6 => "6h",
            Interval::Hour8 => "8h",
            Interval::Hour12 => "12h",
            Interval::Day1 => "1d",
            Interval::Day3 => "3d",
            Interval::Week1 => "1w",
            Interval::Month1 => "1M",
        }
    }

    /// Interval length in seconds. Months count as 30 days.
    pub fn secs(&self) -> u64 {
        match self {
            Interval::Min1 => 60,
            Interval::Min3 => 3 * 60,
            Interval::Min5 => 5 * 60,
            Interval::Min15 => 15 * 60,
            Interval::Min30 => 30 * 60,
            Interval::Hour1 => 3600,
            Interval::Hour2 => 2 * 3600,
            Interval::Hour4 => 4 * 3600,
            Interval::Hour6 => 6 * 3600,
            Interval::Hour8 => 8 * 3600,
            Interval::Hour12 => 12 * 3600,
            Interval::Day1 => 86_400,
            Interval::Day3 => 3 * 86_400,
            Interval::Week1 => 7 * 86_400,
            Interval::Month1 => 30 * 86_400,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseIntervalError;

    /// Accepts the exact Binance form first, then falls back to a
    /// case-insensitive match so "1D" parses. The fallback never matches
    /// the month interval, which would collide with "1m".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => return Ok(Interval::Min1),
            "3m" => return Ok(Interval::Min3),
            "5m" => return Ok(Interval::Min5),
            "15m" => return Ok(Interval::Min15),
            "30m" => return Ok(Interval::Min30),
            "1M" => return Ok(Interval::Month1),
            _ => {}
        }
        match s.to_lowercase().as_str() {
            "1h" => Ok(Interval::Hour1),
            "2h" => Ok(Interval::Hour2),
            "4h" => Ok(Interval::Hour4),
            "6h" => Ok(Interval::Hour6),
            "8h" => Ok(Interval::Hour8),
            "12h" => Ok(Interval::Hour12),
            "1d" => Ok(Interval::Day1),
            "3d" => Ok(Interval::Day3),
            "1w" => Ok(Interval::Week1),
            _ => Err(ParseIntervalError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_exact() {
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::Min1);
        assert_eq!("1d".parse::<Interval>().unwrap(), Interval::Day1);
        assert_eq!("1M".parse::<Interval>().unwrap(), Interval::Month1);
    }

    #[test]
    fn test_parse_case_insensitive_fallback() {
        assert_eq!("1D".parse::<Interval>().unwrap(), Interval::Day1);
        assert_eq!("4H".parse::<Interval>().unwrap(), Interval::Hour4);
        assert_eq!("1W".parse::<Interval>().unwrap(), Interval::Week1);
    }

    #[test]
    fn test_minute_and_month_stay_distinct() {
        // "1M" must never resolve to a minute via the lowercase fallback.
        assert_eq!("1M".parse::<Interval>().unwrap(), Interval::Month1);
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::Min1);
    }

    #[test]
    fn test_parse_unknown() {
        assert!("7x".parse::<Interval>().is_err());
        assert!("".parse::<Interval>().is_err());
    }

    #[test]
    fn test_secs() {
        assert_eq!(Interval::Min1.secs(), 60);
        assert_eq!(Interval::Day1.secs(), 86_400);
        assert_eq!(Interval::Week1.secs(), 604_800);
    }

    #[test]
    fn test_roundtrip_as_str() {
        for s in ["1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M"] {
            assert_eq!(s.parse::<Interval>().unwrap().as_str(), s);
        }
    }
}
