use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::models::response::{self, SubmitOutcome};
use crate::store::SurveyStore;
use super::form;

/// POST /responses - Record a submitted survey form.
pub async fn submit<S: SurveyStore + 'static>(
    store: web::Data<S>,
    fields: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let submission = form::parse_submission(&fields);

    match response::submit_response(store.get_ref(), &submission).await? {
        SubmitOutcome::Recorded { response_id } => Ok(HttpResponse::Created().json(serde_json::json!({
            "recorded": true,
            "response_id": response_id,
        }))),
        SubmitOutcome::Rejected => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "recorded": false,
            "error": format!("{} missing or not a positive integer", form::SURVEY_ID_FIELD),
        }))),
    }
}

/// GET /responses/{id} - A recorded response with its survey.
pub async fn show<S: SurveyStore + 'static>(
    store: web::Data<S>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let view = response::load_response(store.get_ref(), path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(view))
}
