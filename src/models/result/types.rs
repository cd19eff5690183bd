use serde::Serialize;

use crate::models::survey::InputType;

/// How often one answer was chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerTally {
    pub answer_id: i64,
    pub text: String,
    pub description: String,
    pub tally: i64,
    /// Share of the survey's responses that chose this answer, 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub number: usize,
    pub text: String,
    pub description: String,
    pub input_type: InputType,
    pub answers: Vec<AnswerTally>,
}

impl QuestionResult {
    /// Total selections across this question's answers. Exceeds the
    /// response count for checkbox questions.
    pub fn total_selections(&self) -> i64 {
        self.answers.iter().map(|a| a.tally).sum()
    }
}

/// Aggregated results for a survey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyResult {
    pub survey_id: i64,
    pub title: String,
    pub description: String,
    pub total_responses: i64,
    pub questions: Vec<QuestionResult>,
}

pub(crate) fn percentage(tally: i64, total_responses: i64) -> f64 {
    if total_responses <= 0 {
        return 0.0;
    }
    let pct = tally as f64 * 100.0 / total_responses as f64;
    (pct * 10.0).round() / 10.0
}
