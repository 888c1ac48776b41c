//! app.rs
use crate::handlers::{health_handler, session_handler, template_handler, tracking_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(session_handler::session_endpoint))
        .service(
            web::scope("/track")
                .route(
                    "/open/{id}",
                    web::get().to(tracking_handler::track_open_endpoint),
                )
                .route(
                    "/click/{id}",
                    web::get().to(tracking_handler::track_click_endpoint),
                ),
        )
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health_handler::health_endpoint))
                .service(
                    web::scope("/tracking")
                        .route(
                            "",
                            web::get().to(tracking_handler::tracking_summary_endpoint),
                        )
                        .route(
                            "/events",
                            web::get().to(tracking_handler::tracking_document_endpoint),
                        ),
                )
                .service(
                    web::scope("/templates")
                        .route(
                            "",
                            web::get().to(template_handler::list_templates_endpoint),
                        )
                        .route(
                            "",
                            web::post().to(template_handler::replace_templates_endpoint),
                        )
                        .route(
                            "/save",
                            web::post().to(template_handler::save_template_endpoint),
                        )
                        .route(
                            "/{id}",
                            web::delete().to(template_handler::delete_template_endpoint),
                        ),
                ),
        );
}
