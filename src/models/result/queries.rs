use std::collections::HashMap;

use crate::errors::AppError;
use crate::models::survey::load_survey;
use crate::store::SurveyStore;
use super::types::*;

/// Tally every answer of a survey across its committed responses.
///
/// Percentages are relative to the survey's cached `total_responses`.
/// Returns `None` when the survey is invalid.
pub async fn load_results<S: SurveyStore>(
    store: &S,
    survey_id: i64,
) -> Result<Option<SurveyResult>, AppError> {
    let survey = load_survey(store, survey_id).await?;
    if !survey.is_valid {
        return Ok(None);
    }

    let tallies: HashMap<i64, i64> = store
        .fetch_answer_tallies(survey_id)
        .await?
        .into_iter()
        .map(|row| (row.answer_id, row.tally))
        .collect();

    let total_responses = survey.total_responses;
    let questions = survey
        .questions
        .into_iter()
        .map(|q| QuestionResult {
            question_id: q.id,
            number: q.number,
            text: q.text,
            description: q.description,
            input_type: q.input_type,
            answers: q
                .answers
                .into_iter()
                .map(|a| {
                    let tally = tallies.get(&a.id).copied().unwrap_or(0);
                    AnswerTally {
                        answer_id: a.id,
                        text: a.text,
                        description: a.description,
                        tally,
                        percentage: percentage(tally, total_responses),
                    }
                })
                .collect(),
        })
        .collect();

    Ok(Some(SurveyResult {
        survey_id,
        title: survey.title,
        description: survey.description,
        total_responses,
        questions,
    }))
}
