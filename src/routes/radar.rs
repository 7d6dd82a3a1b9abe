// src/routes/radar.rs

use std::sync::Arc;

use actix_web::{
    dev::HttpServiceFactory,
    error::{InternalError, QueryPayloadError},
    get, web, HttpRequest, HttpResponse, Responder,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::settings::RadarDefaults;
use crate::middleware::path_logger::PathLogger;
use crate::services::{
    market_data::{CandleSource, MAX_CANDLE_COUNT},
    notifier::Notifier,
    radar::{run_cycle, CycleReport, CycleRequest, Delivery},
    strategies::{
        surge::{Detection, Thresholds, TrendRow},
        CandleInterval, Market,
    },
};
use crate::utils::types::ApiResponse;

/// Slider ranges offered by the dashboard, in percent.
pub const VOLUME_THRESHOLD_RANGE: (f64, f64) = (0.0, 500.0);
pub const PRICE_THRESHOLD_RANGE: (f64, f64) = (0.0, 200.0);

/// Collaborators shared by every request; built once in `main`.
#[derive(Clone)]
pub struct RadarState {
    pub source:   Arc<dyn CandleSource>,
    pub notifier: Arc<dyn Notifier>,
    pub defaults: RadarDefaults,
}

#[derive(Debug, Default, Deserialize)]
pub struct RadarQuery {
    pub market: Option<String>,
    pub volume_threshold: Option<f64>,
    pub price_threshold: Option<f64>,
    pub interval: Option<String>,
    pub count: Option<u16>,
}

impl RadarQuery {
    /// Fills gaps from `defaults` and range-checks the result.
    pub fn resolve(&self, defaults: &RadarDefaults) -> Result<CycleRequest, String> {
        let market = match &self.market {
            Some(m) => m.parse::<Market>().map_err(|e| e.to_string())?,
            None => defaults.market,
        };
        let interval = match &self.interval {
            Some(i) => i.parse::<CandleInterval>().map_err(|e| e.to_string())?,
            None => defaults.interval,
        };

        let count = self.count.unwrap_or(defaults.count);
        if count == 0 || count > MAX_CANDLE_COUNT {
            return Err(format!("count must be within 1..={MAX_CANDLE_COUNT}"));
        }

        let volume = self
            .volume_threshold
            .unwrap_or(defaults.thresholds.volume_threshold_pct);
        let price = self
            .price_threshold
            .unwrap_or(defaults.thresholds.price_threshold_pct);
        check_range("volume_threshold", volume, VOLUME_THRESHOLD_RANGE)?;
        check_range("price_threshold", price, PRICE_THRESHOLD_RANGE)?;

        Ok(CycleRequest {
            market,
            interval,
            count,
            thresholds: Thresholds {
                volume_threshold_pct: volume,
                price_threshold_pct: price,
            },
        })
    }
}

fn check_range(name: &str, v: f64, (lo, hi): (f64, f64)) -> Result<(), String> {
    if v.is_finite() && (lo..=hi).contains(&v) {
        Ok(())
    } else {
        Err(format!("{name} must be within {lo}..={hi}"))
    }
}

// ─── Views ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Alert,
    NoSignal,
}

#[derive(Debug, Serialize)]
pub struct Charts {
    pub price:  Vec<(NaiveDateTime, f64)>,
    pub volume: Vec<(NaiveDateTime, f64)>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub cycle_id:  uuid::Uuid,
    pub request:   CycleRequest,
    pub status:    SignalStatus,
    pub message:   String,
    pub detection: Detection,
    pub delivery:  Delivery,
    pub charts:    Charts,
    pub table:     Vec<TrendRow>,
}

impl From<CycleReport> for Dashboard {
    fn from(report: CycleReport) -> Self {
        let charts = Charts {
            price: report.rows.iter().map(|r| (r.timestamp, r.trade_price)).collect(),
            volume: report
                .rows
                .iter()
                .map(|r| (r.timestamp, r.accumulated_volume))
                .collect(),
        };
        let status = if report.detection.fired {
            SignalStatus::Alert
        } else {
            SignalStatus::NoSignal
        };

        Self {
            cycle_id: report.cycle_id,
            request: report.request,
            status,
            message: report.status_message().to_string(),
            detection: report.detection,
            delivery: report.delivery,
            charts,
            table: report.rows,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarketsInfo {
    pub markets:   Vec<Market>,
    pub intervals: Vec<CandleInterval>,
    pub max_count: u16,
    pub volume_threshold_range: (f64, f64),
    pub price_threshold_range:  (f64, f64),
    pub defaults:  RadarDefaults,
}

// ─── Handlers ─────────────────────────────────────────────────────────────

#[get("/markets")]
pub async fn markets(state: web::Data<RadarState>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::ok(
        "Supported markets",
        MarketsInfo {
            markets: Market::ALL.to_vec(),
            intervals: CandleInterval::all(),
            max_count: MAX_CANDLE_COUNT,
            volume_threshold_range: VOLUME_THRESHOLD_RANGE,
            price_threshold_range: PRICE_THRESHOLD_RANGE,
            defaults: state.defaults,
        },
    ))
}

#[get("/radar")]
pub async fn radar(
    query: web::Query<RadarQuery>,
    state: web::Data<RadarState>,
) -> impl Responder {
    let req = match query.resolve(&state.defaults) {
        Ok(r) => r,
        Err(msg) => return HttpResponse::BadRequest().json(ApiResponse::error(msg)),
    };

    match run_cycle(state.source.as_ref(), state.notifier.as_ref(), &req).await {
        Ok(report) => {
            let dashboard = Dashboard::from(report);
            let message = dashboard.message.clone();
            HttpResponse::Ok().json(ApiResponse::ok(message, dashboard))
        }
        Err(e) => HttpResponse::BadGateway().json(ApiResponse::error(format!(
            "Market data error: {e}"
        ))),
    }
}

/// Undecodable query strings (`count=70000`, `volume_threshold=abc`) get the
/// same JSON envelope as range errors.
fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ApiResponse::error(format!("Invalid query: {err}"));
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

pub fn radar_scope() -> impl HttpServiceFactory {
    web::scope("/api")
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .wrap(PathLogger)
        .service(markets)
        .service(radar)
}
