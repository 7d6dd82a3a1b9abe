// tests/routes.rs
mod support;

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::Value;
use support::{candles, Canned, FakeSource, RecordingNotifier};
use surge_radar::{
    config::settings::RadarDefaults,
    middleware::metrics::Metrics,
    routes::{
        health::health_routes,
        radar::{radar_scope, RadarState},
    },
    utils::route_debug::dump_routes,
};

fn state(source: FakeSource, notifier: RecordingNotifier) -> (RadarState, Arc<FakeSource>, Arc<RecordingNotifier>) {
    let source = Arc::new(source);
    let notifier = Arc::new(notifier);
    let st = RadarState {
        source: source.clone(),
        notifier: notifier.clone(),
        defaults: RadarDefaults::default(),
    };
    (st, source, notifier)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(health_routes)
                .service(radar_scope())
                .service(dump_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn health_and_debug_routes_respond() {
    let (st, _, _) = state(FakeSource::with(Canned::Candles(vec![])), RecordingNotifier::default());
    let app = app!(st);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(test::read_body(resp).await, "OK");

    let routes: Vec<String> =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/debug/routes").to_request()).await;
    assert!(routes.contains(&"GET /api/radar".to_string()));

    // no recorder installed in tests
    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn markets_lists_supported_pairs_and_ranges() {
    let (st, _, _) = state(FakeSource::with(Canned::Candles(vec![])), RecordingNotifier::default());
    let app = app!(st);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/markets").to_request()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["markets"], serde_json::json!(["KRW-BTC", "KRW-ETH", "KRW-XRP"]));
    assert_eq!(body["data"]["volume_threshold_range"], serde_json::json!([0.0, 500.0]));
    assert_eq!(body["data"]["defaults"]["interval"], "minute30");
    assert_eq!(body["data"]["defaults"]["count"], 50);
}

#[actix_rt::test]
async fn radar_reports_alert_with_charts_and_table() {
    let (st, source, notifier) = state(
        FakeSource::with(Canned::Candles(candles(&[(100.0, 10.0), (160.0, 41.0)]))),
        RecordingNotifier::default(),
    );
    let app = app!(st);

    let req = test::TestRequest::get()
        .uri("/api/radar?market=KRW-ETH&volume_threshold=200&price_threshold=50&interval=minute5&count=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;

    let data = &body["data"];
    assert_eq!(data["status"], "alert");
    assert!(data["message"].as_str().unwrap().starts_with("Surge signal detected!"));
    assert_eq!(data["detection"]["fired"], true);
    assert_eq!(data["delivery"]["status"], "sent");
    assert_eq!(data["charts"]["price"].as_array().unwrap().len(), 2);
    assert_eq!(data["charts"]["volume"][1][1], 41.0);
    assert_eq!(data["table"][0]["price_change_pct"], Value::Null);
    let pct = data["table"][1]["price_change_pct"].as_f64().unwrap();
    assert!((pct - 60.0).abs() < 1e-9);

    let calls = source.calls.lock().unwrap();
    assert_eq!(calls[0].2, 2);
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[actix_rt::test]
async fn radar_without_signal_uses_defaults() {
    let (st, source, notifier) = state(
        FakeSource::with(Canned::Candles(candles(&[(100.0, 10.0), (101.0, 11.0)]))),
        RecordingNotifier::default(),
    );
    let app = app!(st);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/radar").to_request()).await;
    assert_eq!(body["data"]["status"], "no_signal");
    assert_eq!(body["message"], "No signal currently meets the thresholds.");
    assert_eq!(body["data"]["delivery"]["status"], "not_attempted");
    assert_eq!(body["data"]["request"]["market"], "KRW-BTC");
    assert_eq!(source.calls.lock().unwrap()[0].2, 50);
    assert_eq!(notifier.attempts(), 0);
}

#[actix_rt::test]
async fn delivery_failure_still_shows_result() {
    let (st, _, _) = state(
        FakeSource::with(Canned::Candles(candles(&[(100.0, 10.0), (160.0, 41.0)]))),
        RecordingNotifier::rejecting(),
    );
    let app = app!(st);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/radar").to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["detection"]["fired"], true);
    assert_eq!(body["data"]["delivery"]["status"], "failed");
}

#[actix_rt::test]
async fn invalid_query_is_a_bad_request() {
    let (st, source, _) = state(FakeSource::with(Canned::Candles(vec![])), RecordingNotifier::default());
    let app = app!(st);

    for uri in [
        "/api/radar?market=KRW-DOGE",
        "/api/radar?volume_threshold=900",
        "/api/radar?price_threshold=-1",
        "/api/radar?count=0",
        "/api/radar?interval=fortnight",
        "/api/radar?count=70000",
        "/api/radar?volume_threshold=abc",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), 400, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false, "{uri}");
        assert_eq!(body["data"], Value::Null, "{uri}");
        assert!(body["message"].as_str().is_some(), "{uri}");
    }
    assert!(source.calls.lock().unwrap().is_empty());
}

#[actix_rt::test]
async fn fetch_failure_is_bad_gateway_without_data() {
    for canned in [Canned::Unavailable, Canned::Malformed] {
        let (st, _, notifier) = state(FakeSource::with(canned), RecordingNotifier::default());
        let app = app!(st);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/radar").to_request()).await;
        assert_eq!(resp.status(), 502);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);
        assert!(body["message"].as_str().unwrap().starts_with("Market data error"));
        assert_eq!(notifier.attempts(), 0);
    }
}

#[actix_rt::test]
async fn metrics_middleware_passes_responses_through() {
    let (st, _, _) = state(FakeSource::with(Canned::Candles(vec![])), RecordingNotifier::default());
    let app = test::init_service(
        App::new()
            .wrap(Metrics)
            .app_data(web::Data::new(st))
            .configure(health_routes)
            .service(radar_scope()),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), 200);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/nowhere").to_request()).await;
    assert_eq!(resp.status(), 404);
}
