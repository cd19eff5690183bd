use crate::errors::AppError;
use crate::models::survey::load_survey;
use crate::store::{ResponseTx, SurveyStore};
use super::types::*;

/// Record one respondent's submission.
///
/// The response row and every selection row are written in one transaction;
/// if any insert fails the transaction is rolled back and the error returned,
/// so no partial response is ever visible. After commit the survey's cached
/// response count is recomputed. A failure there is logged and ignored.
pub async fn submit_response<S: SurveyStore>(
    store: &S,
    submission: &ResponseSubmission,
) -> Result<SubmitOutcome, AppError> {
    let Some(survey_id) = submission.survey_id else {
        log::debug!("Submission rejected: no usable survey id");
        return Ok(SubmitOutcome::Rejected);
    };

    let response_id = record_selections(store, survey_id, &submission.selections).await?;
    log::info!(
        "Recorded response {} for survey {} ({} selections)",
        response_id,
        survey_id,
        submission.selections.pair_count()
    );

    if let Err(e) = refresh_response_count(store, survey_id).await {
        log::warn!("Response count refresh for survey {} failed: {}", survey_id, e);
    }

    Ok(SubmitOutcome::Recorded { response_id })
}

async fn record_selections<S: SurveyStore>(
    store: &S,
    survey_id: i64,
    selections: &Selections,
) -> Result<i64, AppError> {
    let mut tx = store.begin().await?;

    match insert_all(&mut tx, survey_id, selections).await {
        Ok(response_id) => {
            tx.commit().await?;
            Ok(response_id)
        }
        Err(e) => {
            log::error!("Rolling back response for survey {}: {}", survey_id, e);
            if let Err(rb) = tx.rollback().await {
                log::error!("Rollback failed: {}", rb);
            }
            Err(e)
        }
    }
}

async fn insert_all<T: ResponseTx>(
    tx: &mut T,
    survey_id: i64,
    selections: &Selections,
) -> Result<i64, AppError> {
    let created_at = chrono::Utc::now();
    let response_id = tx.insert_response(survey_id, created_at).await?;
    for (question_id, answer_id) in selections.pairs() {
        tx.insert_selection(response_id, question_id, answer_id).await?;
    }
    Ok(response_id)
}

/// Recompute a survey's cached response count from the response rows and
/// store it. Returns the new count; non-positive ids are a no-op returning 0.
///
/// Count and update are separate statements, so concurrent submissions can
/// leave the counter briefly stale until the next refresh.
pub async fn refresh_response_count<S: SurveyStore>(store: &S, survey_id: i64) -> Result<i64, AppError> {
    if survey_id <= 0 {
        return Ok(0);
    }
    let total = store.count_responses(survey_id).await?;
    store.set_total_responses(survey_id, total).await?;
    Ok(total)
}

/// Load a committed response along with the survey it answers.
pub async fn load_response<S: SurveyStore>(
    store: &S,
    response_id: i64,
) -> Result<Option<ResponseView>, AppError> {
    if response_id <= 0 {
        return Ok(None);
    }
    let Some(row) = store.fetch_response(response_id).await? else {
        return Ok(None);
    };

    let survey = load_survey(store, row.survey_id).await?;
    let selections = store
        .fetch_selections(response_id)
        .await?
        .into_iter()
        .map(|s| SelectionPair {
            question_id: s.question_id,
            answer_id: s.answer_id,
        })
        .collect();

    Ok(Some(ResponseView {
        response: Response {
            id: row.response_id,
            survey_id: row.survey_id,
            created_at: row.date_added,
            selections,
        },
        survey,
    }))
}
