use crate::errors::AppError;
use crate::store::SurveyStore;
use super::types::*;

/// Load a survey with its questions and answers.
///
/// Issues at most three reads: the survey row, its questions, and a single
/// join over all of its answers. A non-positive `survey_id` or a missing row
/// yields a survey with `is_valid == false`; only storage failures are errors.
pub async fn load_survey<S: SurveyStore>(store: &S, survey_id: i64) -> Result<Survey, AppError> {
    if survey_id <= 0 {
        return Ok(Survey::invalid(survey_id));
    }

    let Some(row) = store.fetch_survey(survey_id).await? else {
        log::debug!("Survey {} not found", survey_id);
        return Ok(Survey::invalid(survey_id));
    };

    let mut survey = Survey {
        id: survey_id,
        title: row.title,
        description: row.description,
        is_valid: true,
        total_responses: row.total_responses,
        questions: Vec::new(),
    };

    for q in store.fetch_questions(survey_id).await? {
        let input_type = q.input_type.parse::<InputType>().map_err(|e| {
            AppError::InvalidData(format!("question {}: {}", q.question_id, e))
        })?;
        let number = survey.questions.len() + 1;
        survey.questions.push(Question {
            id: q.question_id,
            text: q.question,
            description: q.description,
            number,
            input_type,
            answers: Vec::new(),
        });
    }

    for a in store.fetch_answers(survey_id).await? {
        // The join is scoped to this survey, so a miss here means the row
        // belongs to nothing we loaded.
        match survey.questions.iter_mut().find(|q| q.id == a.question_id) {
            Some(question) => question.answers.push(Answer {
                id: a.answer_id,
                text: a.answer,
                description: a.description,
            }),
            None => log::warn!(
                "Answer {} references question {} outside survey {}",
                a.answer_id,
                a.question_id,
                survey_id
            ),
        }
    }

    log::debug!(
        "Loaded survey {} ({} questions)",
        survey_id,
        survey.total_questions()
    );
    Ok(survey)
}
