use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::models::{response, result, survey};
use crate::store::SurveyStore;

/// GET /surveys/{id} - Survey with its questions and answers.
pub async fn show<S: SurveyStore + 'static>(
    store: web::Data<S>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let survey = survey::load_survey(store.get_ref(), path.into_inner()).await?;
    if !survey.is_valid {
        return Err(AppError::NotFound);
    }
    Ok(HttpResponse::Ok().json(survey))
}

/// GET /surveys/{id}/results - Per-answer tallies.
pub async fn results<S: SurveyStore + 'static>(
    store: web::Data<S>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let results = result::load_results(store.get_ref(), path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(results))
}

/// POST /surveys/{id}/refresh-count - Recompute the cached response count.
pub async fn refresh_count<S: SurveyStore + 'static>(
    store: web::Data<S>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let survey_id = path.into_inner();
    let total = response::refresh_response_count(store.get_ref(), survey_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "survey_id": survey_id,
        "total_responses": total,
    })))
}
