use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::template_model::{SaveTemplateRequest, Template};
use crate::services::template_service::TemplateService;

fn storage_error(context: &str, e: anyhow::Error) -> HttpResponse {
    log::error!("{}: {:?}", context, e);
    HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": e.to_string()
    }))
}

/// GET /api/templates
pub async fn list_templates_endpoint(templates: web::Data<TemplateService>) -> HttpResponse {
    match templates.list().await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => storage_error("Template list error", e),
    }
}

/// POST /api/templates
/// Reemplaza todas las plantillas guardadas.
pub async fn replace_templates_endpoint(
    templates: web::Data<TemplateService>,
    body: web::Json<Vec<Template>>,
) -> HttpResponse {
    match templates.replace_all(body.into_inner()).await {
        Ok(count) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": count
        })),
        Err(e) => storage_error("Template replace error", e),
    }
}

/// POST /api/templates/save
pub async fn save_template_endpoint(
    templates: web::Data<TemplateService>,
    body: web::Json<SaveTemplateRequest>,
) -> HttpResponse {
    match templates.save(body.into_inner()).await {
        Ok((template, total)) => HttpResponse::Ok().json(json!({
            "success": true,
            "template": template,
            "total": total
        })),
        Err(e) => storage_error("Template save error", e),
    }
}

/// DELETE /api/templates/{id}
pub async fn delete_template_endpoint(
    templates: web::Data<TemplateService>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match templates.delete(&id).await {
        Ok(remaining) => HttpResponse::Ok().json(json!({
            "success": true,
            "remaining": remaining
        })),
        Err(e) => storage_error("Template delete error", e),
    }
}
