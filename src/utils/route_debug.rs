use actix_web::{get, HttpResponse, Responder};

pub const ROUTES: [&str; 5] = [
    "GET /health",
    "GET /metrics",
    "GET /api/markets",
    "GET /api/radar",
    "GET /debug/routes", // This route
];

#[get("/debug/routes")]
pub async fn dump_routes() -> impl Responder {
    HttpResponse::Ok().json(ROUTES)
}
