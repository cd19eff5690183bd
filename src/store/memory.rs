//! In-process store with the same referential rules as the Postgres schema.
//!
//! Writes made through a `MemoryTx` are buffered and only become visible on
//! commit. Faults can be armed to make a specific operation fail, and every
//! read issued through `SurveyStore` is counted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::*;
use crate::models::survey::InputType;

/// An operation the store can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail every survey-row lookup.
    SurveyFetch,
    /// Fail every answer join.
    AnswerFetch,
    /// Fail the response-row insert.
    ResponseInsert,
    /// Fail the nth (1-based) selection insert of a transaction.
    SelectionInsert(usize),
    /// Fail the cached-counter update.
    CountUpdate,
    /// Fail commit.
    Commit,
}

#[derive(Debug, Clone)]
struct SurveyRecord {
    id: i64,
    title: String,
    description: String,
    total_responses: i64,
}

#[derive(Debug, Clone)]
struct QuestionRecord {
    id: i64,
    survey_id: i64,
    text: String,
    description: String,
    input_type: String,
}

#[derive(Debug, Clone)]
struct AnswerRecord {
    id: i64,
    question_id: i64,
    text: String,
    description: String,
}

/// A committed response row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub response_id: i64,
    pub survey_id: i64,
    pub date_added: DateTime<Utc>,
}

/// A committed response-answer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredSelection {
    pub response_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
}

#[derive(Debug, Default)]
struct Tables {
    surveys: Vec<SurveyRecord>,
    questions: Vec<QuestionRecord>,
    answers: Vec<AnswerRecord>,
    responses: Vec<StoredResponse>,
    selections: Vec<StoredSelection>,
}

#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    faults: Mutex<Vec<Fault>>,
    next_response_id: AtomicI64,
    reads: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tables: Mutex::new(Tables::default()),
            faults: Mutex::new(Vec::new()),
            next_response_id: AtomicI64::new(1),
            reads: AtomicUsize::new(0),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&fault)
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------
    // Fixture setup
    // ------------------------------------------------------------------

    pub fn add_survey(&self, id: i64, title: &str, description: &str) -> &Self {
        self.tables().surveys.push(SurveyRecord {
            id,
            title: title.to_string(),
            description: description.to_string(),
            total_responses: 0,
        });
        self
    }

    pub fn add_question(
        &self,
        id: i64,
        survey_id: i64,
        text: &str,
        description: &str,
        input_type: InputType,
    ) -> &Self {
        self.add_question_raw(id, survey_id, text, description, input_type.as_str())
    }

    /// Insert a question with an arbitrary input-type tag, bypassing the
    /// enum. Used to simulate rows the schema would not admit.
    pub fn add_question_raw(
        &self,
        id: i64,
        survey_id: i64,
        text: &str,
        description: &str,
        input_type: &str,
    ) -> &Self {
        self.tables().questions.push(QuestionRecord {
            id,
            survey_id,
            text: text.to_string(),
            description: description.to_string(),
            input_type: input_type.to_string(),
        });
        self
    }

    pub fn add_answer(&self, id: i64, question_id: i64, text: &str, description: &str) -> &Self {
        self.tables().answers.push(AnswerRecord {
            id,
            question_id,
            text: text.to_string(),
            description: description.to_string(),
        });
        self
    }

    /// Overwrite a survey's cached response counter.
    pub fn set_cached_total(&self, survey_id: i64, total: i64) {
        for survey in self.tables().surveys.iter_mut().filter(|s| s.id == survey_id) {
            survey.total_responses = total;
        }
    }

    // ------------------------------------------------------------------
    // Fault injection and inspection
    // ------------------------------------------------------------------

    pub fn inject_fault(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault);
    }

    pub fn clear_faults(&self) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of reads issued through `SurveyStore` so far.
    pub fn reads_issued(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn responses(&self) -> Vec<StoredResponse> {
        self.tables().responses.clone()
    }

    pub fn selections(&self) -> Vec<StoredSelection> {
        self.tables().selections.clone()
    }

    pub fn cached_total(&self, survey_id: i64) -> Option<i64> {
        self.tables()
            .surveys
            .iter()
            .find(|s| s.id == survey_id)
            .map(|s| s.total_responses)
    }
}

impl SurveyStore for MemoryStore {
    type Tx<'a> = MemoryTx<'a>;

    async fn fetch_survey(&self, survey_id: i64) -> Result<Option<SurveyRow>, AppError> {
        self.read();
        if self.has_fault(Fault::SurveyFetch) {
            return Err(AppError::Storage("injected fault: survey fetch".into()));
        }
        Ok(self
            .tables()
            .surveys
            .iter()
            .find(|s| s.id == survey_id)
            .map(|s| SurveyRow {
                title: s.title.clone(),
                description: s.description.clone(),
                total_responses: s.total_responses,
            }))
    }

    async fn fetch_questions(&self, survey_id: i64) -> Result<Vec<QuestionRow>, AppError> {
        self.read();
        Ok(self
            .tables()
            .questions
            .iter()
            .filter(|q| q.survey_id == survey_id)
            .map(|q| QuestionRow {
                question_id: q.id,
                question: q.text.clone(),
                description: q.description.clone(),
                input_type: q.input_type.clone(),
            })
            .collect())
    }

    async fn fetch_answers(&self, survey_id: i64) -> Result<Vec<AnswerRow>, AppError> {
        self.read();
        if self.has_fault(Fault::AnswerFetch) {
            return Err(AppError::Storage("injected fault: answer fetch".into()));
        }
        let tables = self.tables();
        if !tables.surveys.iter().any(|s| s.id == survey_id) {
            return Ok(Vec::new());
        }
        let mut rows: Vec<AnswerRow> = tables
            .answers
            .iter()
            .filter(|a| {
                tables
                    .questions
                    .iter()
                    .any(|q| q.id == a.question_id && q.survey_id == survey_id)
            })
            .map(|a| AnswerRow {
                answer_id: a.id,
                answer: a.text.clone(),
                description: a.description.clone(),
                question_id: a.question_id,
            })
            .collect();
        rows.sort_by_key(|r| r.answer_id);
        Ok(rows)
    }

    async fn count_responses(&self, survey_id: i64) -> Result<i64, AppError> {
        self.read();
        let count = self
            .tables()
            .responses
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .count();
        Ok(count as i64)
    }

    async fn set_total_responses(&self, survey_id: i64, total: i64) -> Result<(), AppError> {
        if self.has_fault(Fault::CountUpdate) {
            return Err(AppError::Storage("injected fault: count update".into()));
        }
        self.set_cached_total(survey_id, total);
        Ok(())
    }

    async fn fetch_response(&self, response_id: i64) -> Result<Option<ResponseRow>, AppError> {
        self.read();
        Ok(self
            .tables()
            .responses
            .iter()
            .find(|r| r.response_id == response_id)
            .map(|r| ResponseRow {
                response_id: r.response_id,
                survey_id: r.survey_id,
                date_added: r.date_added,
            }))
    }

    async fn fetch_selections(&self, response_id: i64) -> Result<Vec<SelectionRow>, AppError> {
        self.read();
        Ok(self
            .tables()
            .selections
            .iter()
            .filter(|s| s.response_id == response_id)
            .map(|s| SelectionRow {
                question_id: s.question_id,
                answer_id: s.answer_id,
            })
            .collect())
    }

    async fn fetch_answer_tallies(&self, survey_id: i64) -> Result<Vec<AnswerTallyRow>, AppError> {
        self.read();
        let tables = self.tables();
        let mut tallies: HashMap<i64, i64> = HashMap::new();
        for selection in &tables.selections {
            let in_survey = tables
                .responses
                .iter()
                .any(|r| r.response_id == selection.response_id && r.survey_id == survey_id);
            if in_survey {
                *tallies.entry(selection.answer_id).or_insert(0) += 1;
            }
        }
        Ok(tallies
            .into_iter()
            .map(|(answer_id, tally)| AnswerTallyRow { answer_id, tally })
            .collect())
    }

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        Ok(MemoryTx {
            store: self,
            responses: Vec::new(),
            selections: Vec::new(),
        })
    }
}

/// Buffered writes for one submission.
pub struct MemoryTx<'a> {
    store: &'a MemoryStore,
    responses: Vec<StoredResponse>,
    selections: Vec<StoredSelection>,
}

impl ResponseTx for MemoryTx<'_> {
    async fn insert_response(&mut self, survey_id: i64, created_at: DateTime<Utc>) -> Result<i64, AppError> {
        if self.store.has_fault(Fault::ResponseInsert) {
            return Err(AppError::Storage("injected fault: response insert".into()));
        }
        if !self.store.tables().surveys.iter().any(|s| s.id == survey_id) {
            return Err(AppError::Storage(format!(
                "foreign key violation: survey {survey_id} does not exist"
            )));
        }
        // Like a database sequence, ids are consumed even if the transaction rolls back.
        let response_id = self.store.next_response_id.fetch_add(1, Ordering::SeqCst);
        self.responses.push(StoredResponse {
            response_id,
            survey_id,
            date_added: created_at,
        });
        Ok(response_id)
    }

    async fn insert_selection(&mut self, response_id: i64, question_id: i64, answer_id: i64) -> Result<(), AppError> {
        let ordinal = self.selections.len() + 1;
        if self.store.has_fault(Fault::SelectionInsert(ordinal)) {
            return Err(AppError::Storage(format!(
                "injected fault: selection insert #{ordinal}"
            )));
        }
        if !self.responses.iter().any(|r| r.response_id == response_id) {
            return Err(AppError::Storage(format!(
                "foreign key violation: response {response_id} does not exist"
            )));
        }
        {
            let tables = self.store.tables();
            if !tables.questions.iter().any(|q| q.id == question_id) {
                return Err(AppError::Storage(format!(
                    "foreign key violation: question {question_id} does not exist"
                )));
            }
            if !tables.answers.iter().any(|a| a.id == answer_id) {
                return Err(AppError::Storage(format!(
                    "foreign key violation: answer {answer_id} does not exist"
                )));
            }
        }
        self.selections.push(StoredSelection {
            response_id,
            question_id,
            answer_id,
        });
        Ok(())
    }

    async fn commit(self) -> Result<(), AppError> {
        if self.store.has_fault(Fault::Commit) {
            return Err(AppError::Storage("injected fault: commit".into()));
        }
        let mut tables = self.store.tables();
        tables.responses.extend(self.responses);
        tables.selections.extend(self.selections);
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}
