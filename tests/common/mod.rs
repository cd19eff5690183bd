//! Shared test infrastructure.
//!
//! - `scenario_store()` - in-memory store holding two surveys
//! - `setup_test_db()` - Postgres tables under a fresh random prefix, or
//!   `None` when `DATABASE_URL` is not set

#![allow(dead_code)]

use sqlx::PgPool;

use surveyor::db;
use surveyor::models::survey::InputType;
use surveyor::store::{MemoryStore, PgSurveyStore};

// ============================================================================
// IN-MEMORY FIXTURES
// ============================================================================

pub const SURVEY: i64 = 1;
pub const OTHER_SURVEY: i64 = 2;
pub const RADIO_Q: i64 = 10;
pub const CHECKBOX_Q: i64 = 11;
pub const OTHER_Q: i64 = 20;

/// Survey 1: question 10 (radio: 100, 101) and question 11
/// (checkbox: 200, 201, 202).
/// Survey 2: question 20 (select: 102, 150) whose answer ids interleave
/// with survey 1's.
pub fn scenario_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .add_survey(SURVEY, "Campus Coffee", "How you take your coffee")
        .add_question(RADIO_Q, SURVEY, "How often?", "Pick one", InputType::Radio)
        .add_question(CHECKBOX_Q, SURVEY, "Which drinks?", "Check all that apply", InputType::Checkbox)
        .add_answer(202, CHECKBOX_Q, "Cold brew", "")
        .add_answer(100, RADIO_Q, "Daily", "")
        .add_answer(200, CHECKBOX_Q, "Drip", "")
        .add_answer(101, RADIO_Q, "Rarely", "")
        .add_answer(201, CHECKBOX_Q, "Espresso", "including lattes");
    store
        .add_survey(OTHER_SURVEY, "Library Hours", "")
        .add_question(OTHER_Q, OTHER_SURVEY, "Preferred closing time?", "", InputType::Select)
        .add_answer(102, OTHER_Q, "Midnight", "")
        .add_answer(150, OTHER_Q, "2am", "");
    store
}

// ============================================================================
// POSTGRES
// ============================================================================

pub struct TestDb {
    pool: PgPool,
    prefix: String,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> PgSurveyStore {
        PgSurveyStore::new(self.pool.clone(), self.prefix.clone())
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}{}", self.prefix, table);
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .expect("count rows")
    }

    /// Drop every prefixed table this run created.
    pub async fn teardown(self) {
        for table in ["responses_answers", "responses", "answers", "questions", "surveys"] {
            let sql = format!("DROP TABLE IF EXISTS {}{} CASCADE", self.prefix, table);
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .expect("drop test table");
        }
        self.pool.close().await;
    }
}

/// Number of tables in the current schema whose names start with `prefix`.
pub async fn tables_with_prefix(pool: &PgPool, prefix: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name LIKE $1",
    )
    .bind(format!("{prefix}%"))
    .fetch_one(pool)
    .await
    .expect("count prefixed tables")
}

/// Create the schema under a random table prefix so tests never share rows.
pub async fn setup_test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };
    let pool = PgPool::connect(&url).await.expect("Failed to connect to test DB");

    let suffix: [u8; 4] = rand::random();
    let prefix = format!("t{}_", hex::encode(suffix));
    db::run_migrations(&pool, &prefix)
        .await
        .expect("Failed to run migrations");

    Some(TestDb { pool, prefix })
}
