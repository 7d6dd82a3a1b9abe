//! One detection cycle: fetch → calculate → detect → (maybe) notify.
//!
//! Stateless by construction. A spike that persists across refreshes is
//! alerted on every cycle; suppressing repeats needs a record of the last
//! alert kept outside [`run_cycle`].

use metrics::increment_counter;
use serde::Serialize;
use uuid::Uuid;

use crate::services::{
    market_data::CandleSource,
    notifier::Notifier,
    strategies::{
        surge::{calculate_trends, detect, Detection, Thresholds, TrendRow},
        CandleInterval, Market,
    },
};
use crate::utils::errors::FetchError;

pub const NO_SIGNAL_MESSAGE: &str = "No signal currently meets the thresholds.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleRequest {
    pub market:     Market,
    pub interval:   CandleInterval,
    pub count:      u16,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    NotAttempted,
    Sent,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id:  Uuid,
    pub request:   CycleRequest,
    pub rows:      Vec<TrendRow>,
    pub detection: Detection,
    /// Present only when the detector fired.
    pub alert:     Option<String>,
    pub delivery:  Delivery,
}

impl CycleReport {
    /// Alert text, or the "no signal" notice.
    pub fn status_message(&self) -> &str {
        self.alert.as_deref().unwrap_or(NO_SIGNAL_MESSAGE)
    }
}

/// Alert body pushed to the channel and echoed to the dashboard.
pub fn format_alert(market: Market, row: &TrendRow) -> String {
    let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"));
    format!(
        "Surge signal detected!\n\
         Market: {market}\n\
         Price change: {}\n\
         Volume change: {}\n\
         Current price: {:.2} KRW",
        pct(row.price_change_pct),
        pct(row.volume_change_pct),
        row.trade_price,
    )
}

/// Runs one full cycle. A fetch failure aborts before any calculation;
/// a delivery failure is logged and recorded in the report.
pub async fn run_cycle(
    source: &dyn CandleSource,
    notifier: &dyn Notifier,
    req: &CycleRequest,
) -> Result<CycleReport, FetchError> {
    let cycle_id = Uuid::new_v4();
    let market = req.market.as_str();

    let candles = match source.fetch_candles(req.market, req.interval, req.count).await {
        Ok(c) => c,
        Err(e) => {
            log::error!("cycle {cycle_id}: fetching {market} {} failed: {e}", req.interval);
            increment_counter!("radar_cycles_total", "market" => market, "outcome" => "fetch_error");
            return Err(e);
        }
    };

    let rows = calculate_trends(&candles);
    let detection = detect(&rows, &req.thresholds);
    log::info!(
        "cycle {cycle_id}: {market} {} candles={} fired={}",
        req.interval,
        rows.len(),
        detection.fired
    );

    let (alert, delivery) = match detection.latest {
        Some(latest) if detection.fired => {
            let text = format_alert(req.market, &latest);
            increment_counter!("radar_alerts_total", "market" => market);
            // no cooldown: a sustained spike alerts on every cycle
            log::info!("cycle {cycle_id}: surge on {market}, notifying");

            let delivery = match notifier.send(&text).await {
                Ok(()) => Delivery::Sent,
                Err(e) => {
                    log::warn!("cycle {cycle_id}: alert delivery failed: {e}");
                    increment_counter!("radar_delivery_failures_total", "market" => market);
                    Delivery::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            (Some(text), delivery)
        }
        _ => (None, Delivery::NotAttempted),
    };

    increment_counter!("radar_cycles_total", "market" => market, "outcome" => "ok");

    Ok(CycleReport {
        cycle_id,
        request: *req,
        rows,
        detection,
        alert,
        delivery,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn alert_text_layout() {
        let row = TrendRow {
            timestamp: NaiveDate::from_ymd_opt(2024, 11, 29)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            trade_price: 160.0,
            accumulated_volume: 41.0,
            volume_change_pct: Some(310.0),
            price_change_pct: Some(60.0),
        };
        assert_eq!(
            format_alert(Market::KrwBtc, &row),
            "Surge signal detected!\n\
             Market: KRW-BTC\n\
             Price change: 60.00%\n\
             Volume change: 310.00%\n\
             Current price: 160.00 KRW"
        );
    }

    #[test]
    fn delivery_serialises_with_status_tag() {
        let v = serde_json::to_value(Delivery::Failed { reason: "x".into() }).unwrap();
        assert_eq!(v, serde_json::json!({"status": "failed", "reason": "x"}));
        let v = serde_json::to_value(Delivery::NotAttempted).unwrap();
        assert_eq!(v, serde_json::json!({"status": "not_attempted"}));
    }
}
