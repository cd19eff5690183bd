use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::*;

/// sqlx-backed store. Table names are `<prefix><table>`.
#[derive(Debug, Clone)]
pub struct PgSurveyStore {
    pool: PgPool,
    prefix: String,
}

impl PgSurveyStore {
    pub fn new(pool: PgPool, prefix: impl Into<String>) -> Self {
        PgSurveyStore { pool, prefix: prefix.into() }
    }
}

impl SurveyStore for PgSurveyStore {
    type Tx<'a> = PgResponseTx<'a>;

    async fn fetch_survey(&self, survey_id: i64) -> Result<Option<SurveyRow>, AppError> {
        let sql = format!(
            "SELECT title, description, total_responses FROM {}surveys WHERE survey_id = $1",
            self.prefix
        );
        let row = sqlx::query_as::<_, SurveyRow>(&sql)
            .bind(survey_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn fetch_questions(&self, survey_id: i64) -> Result<Vec<QuestionRow>, AppError> {
        let sql = format!(
            "SELECT question_id, question, description, input_type \
             FROM {}questions WHERE survey_id = $1 \
             ORDER BY question_id",
            self.prefix
        );
        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(survey_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_answers(&self, survey_id: i64) -> Result<Vec<AnswerRow>, AppError> {
        let p = &self.prefix;
        let sql = format!(
            "SELECT a.answer_id, a.answer, a.description, a.question_id \
             FROM {p}surveys s \
             INNER JOIN {p}questions q ON q.survey_id = s.survey_id \
             INNER JOIN {p}answers a ON a.question_id = q.question_id \
             WHERE s.survey_id = $1 \
             ORDER BY a.answer_id ASC"
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(survey_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_responses(&self, survey_id: i64) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {}responses WHERE survey_id = $1", self.prefix);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(survey_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn set_total_responses(&self, survey_id: i64, total: i64) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {}surveys SET total_responses = $1 WHERE survey_id = $2",
            self.prefix
        );
        sqlx::query(&sql)
            .bind(total)
            .bind(survey_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_response(&self, response_id: i64) -> Result<Option<ResponseRow>, AppError> {
        let sql = format!(
            "SELECT response_id, survey_id, date_added FROM {}responses WHERE response_id = $1",
            self.prefix
        );
        let row = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(response_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn fetch_selections(&self, response_id: i64) -> Result<Vec<SelectionRow>, AppError> {
        let sql = format!(
            "SELECT question_id, answer_id FROM {}responses_answers \
             WHERE response_id = $1 ORDER BY id",
            self.prefix
        );
        let rows = sqlx::query_as::<_, SelectionRow>(&sql)
            .bind(response_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_answer_tallies(&self, survey_id: i64) -> Result<Vec<AnswerTallyRow>, AppError> {
        let p = &self.prefix;
        let sql = format!(
            "SELECT ra.answer_id, COUNT(*) AS tally \
             FROM {p}responses_answers ra \
             INNER JOIN {p}responses r ON r.response_id = ra.response_id \
             WHERE r.survey_id = $1 \
             GROUP BY ra.answer_id"
        );
        let rows = sqlx::query_as::<_, AnswerTallyRow>(&sql)
            .bind(survey_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgResponseTx { tx, prefix: &self.prefix })
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back if dropped uncommitted.
pub struct PgResponseTx<'a> {
    tx: Transaction<'static, Postgres>,
    prefix: &'a str,
}

impl ResponseTx for PgResponseTx<'_> {
    async fn insert_response(&mut self, survey_id: i64, created_at: DateTime<Utc>) -> Result<i64, AppError> {
        let sql = format!(
            "INSERT INTO {}responses (survey_id, date_added) VALUES ($1, $2) RETURNING response_id",
            self.prefix
        );
        let response_id: i64 = sqlx::query_scalar(&sql)
            .bind(survey_id)
            .bind(created_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(response_id)
    }

    async fn insert_selection(&mut self, response_id: i64, question_id: i64, answer_id: i64) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {}responses_answers (response_id, question_id, answer_id) VALUES ($1, $2, $3)",
            self.prefix
        );
        sqlx::query(&sql)
            .bind(response_id)
            .bind(question_id)
            .bind(answer_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
