// Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use surge_radar::{
    services::{
        market_data::CandleSource,
        notifier::Notifier,
        strategies::{Candle, CandleInterval, Market},
    },
    utils::errors::{DeliveryError, FetchError},
};

pub fn ts(i: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 29)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + Duration::minutes(30 * i)
}

/// `(price, volume)` pairs → ascending candles 30 minutes apart.
pub fn candles(points: &[(f64, f64)]) -> Vec<Candle> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(trade_price, accumulated_volume))| Candle {
            timestamp: ts(i as i64),
            trade_price,
            accumulated_volume,
        })
        .collect()
}

pub enum Canned {
    Candles(Vec<Candle>),
    Unavailable,
    Malformed,
}

/// Serves a fixed answer and remembers how it was called.
pub struct FakeSource {
    canned: Canned,
    pub calls: Mutex<Vec<(Market, CandleInterval, u16)>>,
}

impl FakeSource {
    pub fn with(canned: Canned) -> Self {
        Self {
            canned,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CandleSource for FakeSource {
    async fn fetch_candles(
        &self,
        market: Market,
        interval: CandleInterval,
        count: u16,
    ) -> Result<Vec<Candle>, FetchError> {
        self.calls.lock().unwrap().push((market, interval, count));
        match &self.canned {
            Canned::Candles(c) => Ok(c.clone()),
            Canned::Unavailable => Err(FetchError::Status {
                status: 503,
                message: "service unavailable".into(),
            }),
            Canned::Malformed => Err(FetchError::MalformedData(
                "record #0: `trade_price` is missing".into(),
            )),
        }
    }
}

/// Records every message; optionally refuses them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub attempts: AtomicUsize,
    pub reject: bool,
}

impl RecordingNotifier {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(DeliveryError::Rejected {
                status: 403,
                description: "Forbidden: bot was blocked by the user".into(),
            });
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
