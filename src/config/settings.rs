use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use zeroize::Zeroizing;

use crate::services::{
    market_data,
    notifier,
    strategies::{surge::Thresholds, CandleInterval, Market},
};
use crate::utils::errors::ConfigError;

#[derive(Clone)]
pub struct Settings {
    pub server_port: u16,
    pub upbit_api_url: String,
    pub telegram_api_url: String,
    pub telegram_bot_token: Zeroizing<String>,
    pub telegram_chat_id: String,
    pub http_timeout: Duration,
    pub defaults: RadarDefaults,
}

/// What the dashboard uses when a request leaves a parameter out.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RadarDefaults {
    pub market: Market,
    pub interval: CandleInterval,
    pub count: u16,
    pub thresholds: Thresholds,
}

impl Default for RadarDefaults {
    fn default() -> Self {
        Self {
            market: Market::KrwBtc,
            interval: CandleInterval::default(),
            count: 50,
            thresholds: Thresholds {
                volume_threshold_pct: 200.0,
                price_threshold_pct: 50.0,
            },
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok(); // loads `.env` file automatically
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let telegram_bot_token = Zeroizing::new(required("TELEGRAM_BOT_TOKEN")?);
        let telegram_chat_id = required("TELEGRAM_CHAT_ID")?;

        let server_port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;
        let upbit_api_url = lookup("UPBIT_API_URL")
            .unwrap_or_else(|| market_data::DEFAULT_BASE_URL.into());
        let telegram_api_url = lookup("TELEGRAM_API_URL")
            .unwrap_or_else(|| notifier::DEFAULT_TELEGRAM_URL.into());

        let timeout_secs: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(invalid("HTTP_TIMEOUT_SECS", "0", "must be greater than zero"));
        }

        let base = RadarDefaults::default();
        let count: u16 = parse_or(&lookup, "CANDLE_COUNT", base.count)?;
        if count == 0 || count > market_data::MAX_CANDLE_COUNT {
            return Err(invalid(
                "CANDLE_COUNT",
                &count.to_string(),
                &format!("must be within 1..={}", market_data::MAX_CANDLE_COUNT),
            ));
        }

        let volume_threshold_pct = parse_or(
            &lookup,
            "VOLUME_THRESHOLD_PCT",
            base.thresholds.volume_threshold_pct,
        )?;
        let price_threshold_pct = parse_or(
            &lookup,
            "PRICE_THRESHOLD_PCT",
            base.thresholds.price_threshold_pct,
        )?;
        for (key, v) in [
            ("VOLUME_THRESHOLD_PCT", volume_threshold_pct),
            ("PRICE_THRESHOLD_PCT", price_threshold_pct),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(key, &v.to_string(), "must be a non-negative number"));
            }
        }

        Ok(Self {
            server_port,
            upbit_api_url,
            telegram_api_url,
            telegram_bot_token,
            telegram_chat_id,
            http_timeout: Duration::from_secs(timeout_secs),
            defaults: RadarDefaults {
                market: parse_or(&lookup, "DEFAULT_MARKET", base.market)?,
                interval: parse_or(&lookup, "CANDLE_INTERVAL", base.interval)?,
                count,
                thresholds: Thresholds {
                    volume_threshold_pct,
                    price_threshold_pct,
                },
            },
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server_port", &self.server_port)
            .field("upbit_api_url", &self.upbit_api_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("telegram_bot_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("http_timeout", &self.http_timeout)
            .field("defaults", &self.defaults)
            .finish()
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(key, &raw, &e.to_string())),
    }
}
