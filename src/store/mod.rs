//! Storage seam for the survey aggregate and response recording.
//!
//! `SurveyStore` is the query executor the loader and recorder are handed;
//! nothing in `models` reaches for a global connection. Two backends ship:
//! `postgres::PgSurveyStore` (sqlx) and, behind the `test-util` feature,
//! `memory::MemoryStore`.

use chrono::{DateTime, Utc};

use crate::errors::AppError;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{Fault, MemoryStore};
pub use postgres::PgSurveyStore;

/// Survey metadata row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SurveyRow {
    pub title: String,
    pub description: String,
    pub total_responses: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionRow {
    pub question_id: i64,
    pub question: String,
    pub description: String,
    pub input_type: String,
}

/// One row of the survey ⋈ question ⋈ answer join.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub answer_id: i64,
    pub answer: String,
    pub description: String,
    pub question_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResponseRow {
    pub response_id: i64,
    pub survey_id: i64,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SelectionRow {
    pub question_id: i64,
    pub answer_id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerTallyRow {
    pub answer_id: i64,
    pub tally: i64,
}

/// Read and write operations over the survey tables.
#[allow(async_fn_in_trait)]
pub trait SurveyStore {
    type Tx<'a>: ResponseTx
    where
        Self: 'a;

    async fn fetch_survey(&self, survey_id: i64) -> Result<Option<SurveyRow>, AppError>;

    /// All questions of a survey in fetch order.
    async fn fetch_questions(&self, survey_id: i64) -> Result<Vec<QuestionRow>, AppError>;

    /// Every answer of every question of the survey, ordered by answer id.
    async fn fetch_answers(&self, survey_id: i64) -> Result<Vec<AnswerRow>, AppError>;

    async fn count_responses(&self, survey_id: i64) -> Result<i64, AppError>;

    async fn set_total_responses(&self, survey_id: i64, total: i64) -> Result<(), AppError>;

    async fn fetch_response(&self, response_id: i64) -> Result<Option<ResponseRow>, AppError>;

    async fn fetch_selections(&self, response_id: i64) -> Result<Vec<SelectionRow>, AppError>;

    /// Committed selection counts per answer for one survey. Answers never
    /// selected are absent.
    async fn fetch_answer_tallies(&self, survey_id: i64) -> Result<Vec<AnswerTallyRow>, AppError>;

    /// Open a write transaction for one response submission.
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}

/// An open write transaction. Dropping it without `commit` discards every
/// row written through it.
#[allow(async_fn_in_trait)]
pub trait ResponseTx {
    /// Insert the response row and return its generated id.
    async fn insert_response(&mut self, survey_id: i64, created_at: DateTime<Utc>) -> Result<i64, AppError>;

    async fn insert_selection(&mut self, response_id: i64, question_id: i64, answer_id: i64) -> Result<(), AppError>;

    async fn commit(self) -> Result<(), AppError>;

    async fn rollback(self) -> Result<(), AppError>;
}
