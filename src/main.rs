use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::database;
use crate::services::dispatch_service::DispatchContext;
use crate::services::smtp_relay::SmtpRelay;
use crate::services::template_service::TemplateService;
use crate::services::tracking_injector::TrackingInjector;
use crate::services::tracking_service::TrackingService;

mod app;
mod config;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env();

    let db_pool = database::connect(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("{:#}", e)))?;

    let tracking_service = TrackingService::new(db_pool.clone());
    let template_service = TemplateService::new(db_pool.clone());

    // Compartido por todas las sesiones; los cursores de rotación no.
    let dispatch_context = DispatchContext {
        relay: Arc::new(SmtpRelay::new(config.timeouts, config.accept_invalid_certs)),
        tracking: tracking_service.clone(),
        injector: TrackingInjector::new(config.base_url.clone()),
    };

    log::info!(
        "Levantando servidor en {}:{} (tracking en {})",
        config.bind_address,
        config.port,
        config.base_url
    );

    let bind = (config.bind_address.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(tracking_service.clone()))
            .app_data(web::Data::new(template_service.clone()))
            .app_data(web::Data::new(dispatch_context.clone()))
            .app_data(web::JsonConfig::default().limit(50 * 1024 * 1024))
            .configure(app::init_app)
    })
    .bind(bind)?
    .run()
    .await
}
