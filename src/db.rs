use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::survey::InputType;

/// Schema template; `{prefix}` is replaced with the configured table prefix.
pub const MIGRATIONS: &str = include_str!("schema.sql");

const DEMO_SEED: &str = include_str!("../data/seed/survey.json");

pub async fn init_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Render the schema for a table prefix.
pub fn schema_sql(prefix: &str) -> String {
    MIGRATIONS.replace("{prefix}", prefix)
}

/// Create the survey tables if they do not exist yet.
pub async fn run_migrations(pool: &PgPool, prefix: &str) -> Result<(), sqlx::Error> {
    let sql = schema_sql(prefix);
    sqlx::raw_sql(&sql).execute(pool).await?;
    log::info!("Database migrations complete (prefix '{}')", prefix);
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAnswer {
    pub answer: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedQuestion {
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub input_type: InputType,
    #[serde(default)]
    pub answers: Vec<SeedAnswer>,
}

/// A survey definition as written by an operator.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSurvey {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<SeedQuestion>,
}

/// Ids generated while seeding, in definition order.
#[derive(Debug, Clone)]
pub struct SeededSurvey {
    pub survey_id: i64,
    /// (question id, answer ids) per question.
    pub questions: Vec<(i64, Vec<i64>)>,
}

/// Insert a survey definition. The whole definition runs in a single transaction.
pub async fn seed_survey(pool: &PgPool, prefix: &str, seed: &SeedSurvey) -> Result<SeededSurvey, AppError> {
    let mut tx = pool.begin().await?;

    let survey_sql = format!(
        "INSERT INTO {prefix}surveys (title, description) VALUES ($1, $2) RETURNING survey_id"
    );
    let survey_id: i64 = sqlx::query_scalar(&survey_sql)
        .bind(&seed.title)
        .bind(&seed.description)
        .fetch_one(&mut *tx)
        .await?;

    let question_sql = format!(
        "INSERT INTO {prefix}questions (survey_id, question, description, input_type) \
         VALUES ($1, $2, $3, $4) RETURNING question_id"
    );
    let answer_sql = format!(
        "INSERT INTO {prefix}answers (question_id, answer, description) \
         VALUES ($1, $2, $3) RETURNING answer_id"
    );

    let mut questions = Vec::with_capacity(seed.questions.len());
    for q in &seed.questions {
        let question_id: i64 = sqlx::query_scalar(&question_sql)
            .bind(survey_id)
            .bind(&q.question)
            .bind(&q.description)
            .bind(q.input_type.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let mut answer_ids = Vec::with_capacity(q.answers.len());
        for a in &q.answers {
            let answer_id: i64 = sqlx::query_scalar(&answer_sql)
                .bind(question_id)
                .bind(&a.answer)
                .bind(&a.description)
                .fetch_one(&mut *tx)
                .await?;
            answer_ids.push(answer_id);
        }
        questions.push((question_id, answer_ids));
    }

    tx.commit().await?;
    Ok(SeededSurvey { survey_id, questions })
}

/// Seed the bundled demo survey when no survey exists yet.
/// Returns the new survey id, or `None` if the table already had data.
pub async fn seed_demo(pool: &PgPool, prefix: &str) -> Result<Option<i64>, AppError> {
    let count_sql = format!("SELECT COUNT(*) FROM {prefix}surveys");
    let count: i64 = sqlx::query_scalar(&count_sql).fetch_one(pool).await?;
    if count > 0 {
        log::info!("Database already has {} surveys, skipping demo seed", count);
        return Ok(None);
    }

    let seed: SeedSurvey = serde_json::from_str(DEMO_SEED)
        .map_err(|e| AppError::InvalidData(format!("bad demo seed JSON: {e}")))?;
    let seeded = seed_survey(pool, prefix, &seed).await?;
    log::info!(
        "Seeded demo survey {} ({} questions)",
        seeded.survey_id,
        seeded.questions.len()
    );
    Ok(Some(seeded.survey_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_uses_prefix_everywhere() {
        let sql = schema_sql("t1_");
        assert!(!sql.contains("{prefix}"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS t1_surveys"));
        assert!(sql.contains("REFERENCES t1_responses (response_id)"));
    }

    #[test]
    fn demo_seed_parses() {
        let seed: SeedSurvey = serde_json::from_str(DEMO_SEED).unwrap();
        assert!(!seed.title.is_empty());
        assert_eq!(seed.questions.len(), 3);
        assert_eq!(seed.questions[1].input_type, InputType::Checkbox);
        assert!(seed.questions.iter().all(|q| !q.answers.is_empty()));
    }
}
