pub mod form;
pub mod response_handlers;
pub mod survey_handlers;

use actix_web::{web, HttpResponse};

use crate::store::SurveyStore;

/// Register survey and response routes for a store backend.
/// The store itself must be registered as `web::Data<S>`.
pub fn configure<S: SurveyStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/surveys")
            .route("/{id}", web::get().to(survey_handlers::show::<S>))
            .route("/{id}/results", web::get().to(survey_handlers::results::<S>))
            .route("/{id}/refresh-count", web::post().to(survey_handlers::refresh_count::<S>)),
    );
    cfg.service(
        web::scope("/responses")
            .route("", web::post().to(response_handlers::submit::<S>))
            .route("/{id}", web::get().to(response_handlers::show::<S>)),
    );
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not Found" }))
}
