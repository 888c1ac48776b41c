//! handlers/tracking_handler.rs
//! Endpoints de píxel de apertura, redirección de clicks y resumen.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use serde_json::json;

use crate::config::app_config::AppConfig;
use crate::models::tracking_model::ClickQuery;
use crate::services::tracking_service::TrackingService;

const TRANSPARENT_GIF_B64: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

static TRANSPARENT_GIF: Lazy<Vec<u8>> =
    Lazy::new(|| base64::decode(TRANSPARENT_GIF_B64).unwrap_or_default());

fn source_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(str::to_string)
}

/// GET /track/open/{id}
pub async fn track_open_endpoint(
    tracking: web::Data<TrackingService>,
    path: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let message_id = path.into_inner();
    let ip = source_ip(&req);

    match tracking.record_open(&message_id, ip.as_deref()).await {
        Ok(true) => log::info!("Open tracked: {}", message_id),
        Ok(false) => {}
        Err(e) => log::warn!("No se pudo registrar apertura {}: {:?}", message_id, e),
    }

    HttpResponse::Ok()
        .content_type("image/gif")
        .append_header((
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate",
        ))
        .body(TRANSPARENT_GIF.clone())
}

/// GET /track/click/{id}?url=...
pub async fn track_click_endpoint(
    tracking: web::Data<TrackingService>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
    query: web::Query<ClickQuery>,
    req: HttpRequest,
) -> HttpResponse {
    let message_id = path.into_inner();
    let ip = source_ip(&req);
    let target = query.into_inner().url.filter(|url| !url.trim().is_empty());

    match tracking
        .record_click(&message_id, ip.as_deref(), target.as_deref())
        .await
    {
        Ok(true) => log::info!("Click tracked: {}", message_id),
        Ok(false) => {}
        Err(e) => log::warn!("No se pudo registrar click {}: {:?}", message_id, e),
    }

    // Solo se redirige a destinos http(s)
    let location = target
        .filter(|url| {
            let lower = url.to_ascii_lowercase();
            lower.starts_with("http://") || lower.starts_with("https://")
        })
        .unwrap_or_else(|| config.click_fallback_url.clone());

    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// GET /api/tracking
pub async fn tracking_summary_endpoint(tracking: web::Data<TrackingService>) -> HttpResponse {
    match tracking.summary().await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            log::error!("Tracking summary error: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// GET /api/tracking/events
pub async fn tracking_document_endpoint(tracking: web::Data<TrackingService>) -> HttpResponse {
    match tracking.document().await {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(e) => {
            log::error!("Tracking document error: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}
