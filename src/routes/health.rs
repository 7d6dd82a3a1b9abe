use actix_web::{get, web, HttpResponse};
use metrics_exporter_prometheus::PrometheusHandle;

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Prometheus text exposition; 404 when no recorder was installed.
#[get("/metrics")]
async fn prometheus(handle: Option<web::Data<PrometheusHandle>>) -> HttpResponse {
    match handle {
        Some(h) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(h.render()),
        None => HttpResponse::NotFound().body("metrics recorder not installed"),
    }
}

/// Registered on the app root via `.configure(health_routes)`.
pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check).service(prometheus);
}
