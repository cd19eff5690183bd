use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a question's candidate answers are offered to a respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Radio,
    Checkbox,
    Select,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Radio => "radio",
            InputType::Checkbox => "checkbox",
            InputType::Select => "select",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "radio" => Ok(InputType::Radio),
            "checkbox" => Ok(InputType::Checkbox),
            "select" => Ok(InputType::Select),
            other => Err(format!("unknown input type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub id: i64,
    pub text: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub description: String,
    /// 1-based position within the survey, assigned at load time.
    pub number: usize,
    pub input_type: InputType,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn total_answers(&self) -> usize {
        self.answers.len()
    }

    pub fn answer(&self, answer_id: i64) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }
}

/// Read-only snapshot of one survey with its questions and their answers.
///
/// `is_valid` is false when no survey row matched; such a survey never
/// carries questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_valid: bool,
    /// Cached counter, refreshed after each recorded response.
    pub total_responses: i64,
    pub questions: Vec<Question>,
}

impl Survey {
    pub(crate) fn invalid(id: i64) -> Self {
        Survey {
            id,
            title: String::new(),
            description: String::new(),
            is_valid: false,
            total_responses: 0,
            questions: Vec::new(),
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}
