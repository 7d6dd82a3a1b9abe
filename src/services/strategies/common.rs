// src/services/strategies/common.rs
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

/// One time-bucketed observation as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    /// Exchange-local (KST) bucket start, no offset attached.
    pub timestamp:          NaiveDateTime,
    pub trade_price:        f64,
    /// Cumulative within the bucket.
    pub accumulated_volume: f64,
}

// ─── Market ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Market {
    #[serde(rename = "KRW-BTC")]
    KrwBtc,
    #[serde(rename = "KRW-ETH")]
    KrwEth,
    #[serde(rename = "KRW-XRP")]
    KrwXrp,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::KrwBtc, Market::KrwEth, Market::KrwXrp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::KrwBtc => "KRW-BTC",
            Market::KrwEth => "KRW-ETH",
            Market::KrwXrp => "KRW-XRP",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unsupported market '{0}'")]
pub struct UnsupportedMarket(pub String);

impl FromStr for Market {
    type Err = UnsupportedMarket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Market::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnsupportedMarket(s.to_string()))
    }
}

// ─── Candle interval ──────────────────────────────────────────────────────

/// Minute units the candle endpoint accepts.
pub const MINUTE_UNITS: [u16; 8] = [1, 3, 5, 10, 15, 30, 60, 240];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleInterval {
    Minutes(u16),
    Days,
    Weeks,
    Months,
}

impl Default for CandleInterval {
    fn default() -> Self {
        CandleInterval::Minutes(30)
    }
}

impl CandleInterval {
    pub fn minutes(unit: u16) -> Option<Self> {
        MINUTE_UNITS
            .contains(&unit)
            .then_some(CandleInterval::Minutes(unit))
    }

    /// Every interval the fetcher supports, shortest first.
    pub fn all() -> Vec<CandleInterval> {
        MINUTE_UNITS
            .iter()
            .map(|&u| CandleInterval::Minutes(u))
            .chain([CandleInterval::Days, CandleInterval::Weeks, CandleInterval::Months])
            .collect()
    }

    /// Path segment below `/v1/candles/`.
    pub fn path(&self) -> String {
        match self {
            CandleInterval::Minutes(u) => format!("minutes/{u}"),
            CandleInterval::Days => "days".into(),
            CandleInterval::Weeks => "weeks".into(),
            CandleInterval::Months => "months".into(),
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandleInterval::Minutes(u) => write!(f, "minute{u}"),
            CandleInterval::Days => f.write_str("days"),
            CandleInterval::Weeks => f.write_str("weeks"),
            CandleInterval::Months => f.write_str("months"),
        }
    }
}

impl Serialize for CandleInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unsupported candle interval '{0}'")]
pub struct UnsupportedInterval(pub String);

impl FromStr for CandleInterval {
    type Err = UnsupportedInterval;

    /// Accepts `minute30`, `minutes/30`, `30m`, `day`/`days`, `week`/`weeks`,
    /// `month`/`months`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let unsupported = || UnsupportedInterval(s.to_string());

        match raw.as_str() {
            "day" | "days" => return Ok(CandleInterval::Days),
            "week" | "weeks" => return Ok(CandleInterval::Weeks),
            "month" | "months" => return Ok(CandleInterval::Months),
            _ => {}
        }

        let unit = raw
            .strip_prefix("minutes/")
            .or_else(|| raw.strip_prefix("minute"))
            .or_else(|| raw.strip_suffix('m'))
            .ok_or_else(unsupported)?;

        unit.parse::<u16>()
            .ok()
            .and_then(CandleInterval::minutes)
            .ok_or_else(unsupported)
    }
}
