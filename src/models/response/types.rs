use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::survey::{Answer, Survey};

/// Chosen answer ids keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections(BTreeMap<i64, BTreeSet<i64>>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one chosen answer. Choosing the same answer twice is a no-op.
    pub fn insert(&mut self, question_id: i64, answer_id: i64) {
        self.0.entry(question_id).or_default().insert(answer_id);
    }

    pub fn with(mut self, question_id: i64, answer_ids: &[i64]) -> Self {
        for &answer_id in answer_ids {
            self.insert(question_id, answer_id);
        }
        self
    }

    /// Every (question id, answer id) pair, ordered by question then answer.
    pub fn pairs(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0
            .iter()
            .flat_map(|(&q, answers)| answers.iter().map(move |&a| (q, a)))
    }

    pub fn pair_count(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pair_count() == 0
    }
}

/// A typed submission as assembled by the presentation layer.
///
/// `survey_id` is `None` when the posted survey identifier was absent or
/// not a positive integer; such a submission is rejected without writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSubmission {
    pub survey_id: Option<i64>,
    pub selections: Selections,
}

impl ResponseSubmission {
    pub fn new(survey_id: i64, selections: Selections) -> Self {
        ResponseSubmission {
            survey_id: Some(survey_id),
            selections,
        }
    }

    /// Build from the raw posted survey identifier.
    pub fn from_raw(survey_id: Option<&str>, selections: Selections) -> Self {
        ResponseSubmission {
            survey_id: survey_id.and_then(parse_survey_id),
            selections,
        }
    }
}

fn parse_survey_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Terminal state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// No usable survey identifier; nothing was written.
    Rejected,
    /// Committed. The count refresh ran afterwards, best-effort.
    Recorded { response_id: i64 },
}

impl SubmitOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, SubmitOutcome::Recorded { .. })
    }

    pub fn response_id(&self) -> Option<i64> {
        match self {
            SubmitOutcome::Recorded { response_id } => Some(*response_id),
            SubmitOutcome::Rejected => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionPair {
    pub question_id: i64,
    pub answer_id: i64,
}

/// One committed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: i64,
    pub survey_id: i64,
    pub created_at: DateTime<Utc>,
    pub selections: Vec<SelectionPair>,
}

/// A response together with the survey it answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseView {
    pub response: Response,
    pub survey: Survey,
}

impl ResponseView {
    /// Answers the respondent chose for a question, in the question's answer order.
    pub fn chosen_answers(&self, question_id: i64) -> Vec<&Answer> {
        let Some(question) = self.survey.question(question_id) else {
            return Vec::new();
        };
        question
            .answers
            .iter()
            .filter(|a| {
                self.response
                    .selections
                    .iter()
                    .any(|s| s.question_id == question_id && s.answer_id == a.id)
            })
            .collect()
    }
}
