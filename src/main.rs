use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;

use surge_radar::{
    config::settings::Settings,
    middleware::metrics::Metrics,
    routes::{
        health::health_routes,
        radar::{radar_scope, RadarState},
    },
    services::{market_data::UpbitClient, notifier::TelegramNotifier},
    utils::route_debug::dump_routes,
};

fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {e}");
        std::process::exit(1);
    });
    log::info!("Starting surge radar on port {}…", settings.server_port);
    log::debug!("{settings:?}");

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")?;

    let source = UpbitClient::new(settings.upbit_api_url.clone(), settings.http_timeout)
        .context("building upbit client")?;
    let notifier = TelegramNotifier::new(
        settings.telegram_api_url.clone(),
        settings.telegram_bot_token.clone(),
        settings.telegram_chat_id.clone(),
        settings.http_timeout,
    )
    .context("building telegram notifier")?;

    let state = RadarState {
        source: Arc::new(source),
        notifier: Arc::new(notifier),
        defaults: settings.defaults,
    };

    HttpServer::new(move || {
        App::new()
            .wrap(Metrics)
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(prometheus.clone()))

            .configure(health_routes)
            .service(radar_scope())

            //debug
            .service(dump_routes)
    })
        .bind(("0.0.0.0", settings.server_port))?
        .run()
        .await?;

    Ok(())
}
