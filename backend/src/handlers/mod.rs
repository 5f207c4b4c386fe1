use actix_web::{error::InternalError, web, HttpResponse};
use shared::ApiError;

pub mod tasks;

/// Reject unreadable JSON bodies with the same error shape as the handlers
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ApiError::new("validation_error", message)),
        )
        .into()
    })
}

/// Same error shape for unreadable query strings
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ApiError::new("validation_error", message)),
        )
        .into()
    })
}

/// Task routes live at the root and under `/api`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());
    cfg.app_data(query_config());
    cfg.service(web::scope("/api").configure(tasks::configure));
    tasks::configure(cfg);
}
