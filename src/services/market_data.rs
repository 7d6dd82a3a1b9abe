//! Candle retrieval from the exchange's public REST API.
//! -----------------------------------------------------------------
//! ‣ One request per cycle, no retries, no caching.
//! ‣ The exchange answers newest-first; [`normalize_series`] turns that into
//!   the ascending, duplicate-free series the calculator expects.
//! ‣ Anything that does not look like a candle record is rejected with
//!   [`FetchError::MalformedData`] instead of being coerced to zero.
//! -----------------------------------------------------------------

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{header, Client};
use serde_json::Value;

use crate::services::strategies::{Candle, CandleInterval, Market};
use crate::utils::errors::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://api.upbit.com";
/// Per-request cap on the candle endpoint.
pub const MAX_CANDLE_COUNT: u16 = 200;

const TS_FIELD: &str = "candle_date_time_kst";
const PRICE_FIELD: &str = "trade_price";
const VOLUME_FIELD: &str = "candle_acc_trade_volume";

/// Anything that can hand over a window of recent candles.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Returns at most `count` candles, ascending by timestamp.
    async fn fetch_candles(
        &self,
        market: Market,
        interval: CandleInterval,
        count: u16,
    ) -> Result<Vec<Candle>, FetchError>;
}

/// Upbit quotation API client.
#[derive(Clone)]
pub struct UpbitClient {
    http:     Client,
    base_url: String,
}

impl UpbitClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn candles_url(&self, interval: CandleInterval) -> String {
        format!("{}/v1/candles/{}", self.base_url, interval.path())
    }
}

#[async_trait]
impl CandleSource for UpbitClient {
    async fn fetch_candles(
        &self,
        market: Market,
        interval: CandleInterval,
        count: u16,
    ) -> Result<Vec<Candle>, FetchError> {
        let url = self.candles_url(interval);
        let count_param = count.to_string();
        log::debug!("GET {url} market={market} count={count}");

        let resp = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[("market", market.as_str()), ("count", count_param.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let candles = parse_candles(&body)?;
        Ok(normalize_series(candles, count as usize))
    }
}

/// Upbit errors look like `{"error":{"name":..,"message":..}}`; fall back to
/// the raw body.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

/// Decodes the response body into candles, in the order received.
pub fn parse_candles(body: &[u8]) -> Result<Vec<Candle>, FetchError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedData(format!("response is not JSON: {e}")))?;

    let records = value
        .as_array()
        .ok_or_else(|| FetchError::MalformedData("response is not a JSON array".into()))?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| parse_record(i, rec))
        .collect()
}

fn parse_record(index: usize, rec: &Value) -> Result<Candle, FetchError> {
    let bad = |field: &str, why: &str| {
        FetchError::MalformedData(format!("record #{index}: `{field}` {why}"))
    };

    let ts_raw = rec
        .get(TS_FIELD)
        .ok_or_else(|| bad(TS_FIELD, "is missing"))?
        .as_str()
        .ok_or_else(|| bad(TS_FIELD, "is not a string"))?;
    let timestamp = ts_raw
        .parse::<NaiveDateTime>()
        .map_err(|_| bad(TS_FIELD, "is not an ISO-8601 local timestamp"))?;

    let number = |field: &str| -> Result<f64, FetchError> {
        let n = rec
            .get(field)
            .ok_or_else(|| bad(field, "is missing"))?
            .as_f64()
            .ok_or_else(|| bad(field, "is not numeric"))?;
        if n.is_finite() {
            Ok(n)
        } else {
            Err(bad(field, "is not finite"))
        }
    };

    let trade_price = number(PRICE_FIELD)?;
    if trade_price <= 0.0 {
        return Err(bad(PRICE_FIELD, "must be positive"));
    }
    let accumulated_volume = number(VOLUME_FIELD)?;
    if accumulated_volume < 0.0 {
        return Err(bad(VOLUME_FIELD, "must not be negative"));
    }

    Ok(Candle {
        timestamp,
        trade_price,
        accumulated_volume,
    })
}

/// Sorts ascending by timestamp, keeps the first record seen for any
/// duplicated timestamp, then keeps the newest `limit` entries.
pub fn normalize_series(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp); // stable
    candles.dedup_by_key(|c| c.timestamp);
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}
