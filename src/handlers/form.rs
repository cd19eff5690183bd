//! Turns a posted survey form into a typed `ResponseSubmission`.
//!
//! Field conventions: `SurveyID` names the target survey, `q_<question id>`
//! carries a single choice and `q_<question id>[]` one of several checkbox
//! choices. Repeated fields accumulate.

use crate::models::response::{ResponseSubmission, Selections};

pub const SURVEY_ID_FIELD: &str = "SurveyID";
const QUESTION_PREFIX: &str = "q_";

pub fn parse_submission(fields: &[(String, String)]) -> ResponseSubmission {
    let mut survey_id: Option<&str> = None;
    let mut selections = Selections::new();

    for (name, value) in fields {
        if name == SURVEY_ID_FIELD {
            survey_id.get_or_insert(value.as_str());
            continue;
        }
        let Some(question) = name.strip_prefix(QUESTION_PREFIX) else {
            continue;
        };
        let question = question.strip_suffix("[]").unwrap_or(question);
        match (question.parse::<i64>(), value.trim().parse::<i64>()) {
            (Ok(question_id), Ok(answer_id)) => selections.insert(question_id, answer_id),
            _ => log::warn!("Ignoring malformed form field {}={:?}", name, value),
        }
    }

    ResponseSubmission::from_raw(survey_id, selections)
}
