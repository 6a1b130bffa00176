//! Runtime configuration.

use clap::Parser;

pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";
const PORT_ENV: &str = "PORT";
const DEFAULT_PORT: u16 = 8080;

/// Price watch bot CLI
#[derive(Parser, Debug)]
#[command(name = "pricewatch")]
#[command(about = "Telegram bot for Binance charts and price alerts", long_about = None)]
pub struct Args {
    /// Path of the JSON file holding persisted alerts
    #[arg(long, default_value = "alerts.json")]
    pub alerts_file: String,

    /// Seconds between alert checker cycles
    #[arg(long, default_value_t = 60)]
    pub check_interval: u64,

    /// Keep-alive HTTP port (falls back to $PORT, then 8080)
    #[arg(long)]
    pub port: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Resolve the keep-alive port: flag, then `PORT` env, then 8080.
    pub fn keepalive_port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var(PORT_ENV).ok().and_then(|v| v.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }
}

/// The bot token is the one required secret; absence is startup-fatal
/// at the call site.
pub fn telegram_token() -> Option<String> {
    match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["pricewatch"]);
        assert_eq!(args.alerts_file, "alerts.json");
        assert_eq!(args.check_interval, 60);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.port, None);
    }

    #[test]
    fn test_explicit_port_wins() {
        let args = Args::parse_from(["pricewatch", "--port", "3000"]);
        assert_eq!(args.keepalive_port(), 3000);
    }
}
