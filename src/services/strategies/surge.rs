//! Volume/price surge detection.
//!
//! Two pure functions: [`calculate_trends`] derives the period-over-period
//! percentage changes, [`detect`] inspects the newest row against the
//! user's thresholds. Neither touches I/O or keeps state between calls.
//!
//! A zero (or non-finite) predecessor makes a change undefined. The field is
//! then `None`, exactly like the first row, and `None` never fires.
//! This deliberately departs from a plain `pct_change` over the column,
//! where a 0 → positive volume yields `+inf` and would fire on any
//! threshold. A candle with no prior volume is not treated as a spike.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::services::strategies::Candle;

/// A candle plus its change relative to the previous candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendRow {
    pub timestamp:          NaiveDateTime,
    pub trade_price:        f64,
    pub accumulated_volume: f64,
    pub volume_change_pct:  Option<f64>,
    pub price_change_pct:   Option<f64>,
}

/// Both limits are strict lower bounds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub volume_threshold_pct: f64,
    pub price_threshold_pct:  f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub fired:  bool,
    /// Chronologically last row, `None` for an empty series.
    pub latest: Option<TrendRow>,
}

/// `(current - previous) / previous * 100`, or `None` when undefined.
pub fn pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    let pct = (current - previous) / previous * 100.0;
    pct.is_finite().then_some(pct)
}

/// Expects `candles` sorted ascending by timestamp; the output is parallel
/// to the input.
pub fn calculate_trends(candles: &[Candle]) -> Vec<TrendRow> {
    let mut rows = Vec::with_capacity(candles.len());
    let mut prev: Option<&Candle> = None;

    for c in candles {
        let (volume_change_pct, price_change_pct) = match prev {
            Some(p) => (
                pct_change(p.accumulated_volume, c.accumulated_volume),
                pct_change(p.trade_price, c.trade_price),
            ),
            None => (None, None),
        };

        rows.push(TrendRow {
            timestamp: c.timestamp,
            trade_price: c.trade_price,
            accumulated_volume: c.accumulated_volume,
            volume_change_pct,
            price_change_pct,
        });
        prev = Some(c);
    }
    rows
}

/// Fires iff the last row's volume change AND price change are both
/// strictly above their thresholds. Never fails.
pub fn detect(rows: &[TrendRow], thresholds: &Thresholds) -> Detection {
    let latest = rows.last().copied();

    let fired = match latest {
        Some(TrendRow {
            volume_change_pct: Some(vol),
            price_change_pct: Some(price),
            ..
        }) => vol > thresholds.volume_threshold_pct && price > thresholds.price_threshold_pct,
        _ => false,
    };

    Detection { fired, latest }
}
