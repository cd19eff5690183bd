//! Integration tests for recording responses: transactional inserts,
//! rejection, rollback on partial failure and the count refresh.

mod common;

use common::*;
use surveyor::errors::AppError;
use surveyor::models::response::{self, ResponseSubmission, Selections, SubmitOutcome};
use surveyor::models::survey;
use surveyor::store::Fault;
use surveyor::store::memory::StoredSelection;

fn scenario_selections() -> Selections {
    Selections::new()
        .with(RADIO_Q, &[100])
        .with(CHECKBOX_Q, &[200, 202])
}

#[tokio::test]
async fn test_submit_records_response_and_selections() {
    let store = scenario_store();
    store.set_cached_total(SURVEY, 4);

    let outcome = response::submit_response(
        &store,
        &ResponseSubmission::new(SURVEY, scenario_selections()),
    )
    .await
    .unwrap();

    let response_id = outcome.response_id().expect("should be recorded");
    assert!(response_id > 0);

    let responses = store.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].response_id, response_id);
    assert_eq!(responses[0].survey_id, SURVEY);

    let mut rows = store.selections();
    rows.sort_by_key(|s| (s.question_id, s.answer_id));
    assert_eq!(
        rows,
        vec![
            StoredSelection { response_id, question_id: RADIO_Q, answer_id: 100 },
            StoredSelection { response_id, question_id: CHECKBOX_Q, answer_id: 200 },
            StoredSelection { response_id, question_id: CHECKBOX_Q, answer_id: 202 },
        ]
    );

    // The refresh recomputes from rows: one committed response exists.
    assert_eq!(store.cached_total(SURVEY), Some(1));
}

#[tokio::test]
async fn test_count_refresh_after_submission_is_prior_plus_one() {
    let store = scenario_store();

    for _ in 0..2 {
        response::submit_response(&store, &ResponseSubmission::new(SURVEY, scenario_selections()))
            .await
            .unwrap();
    }
    let before = survey::load_survey(&store, SURVEY).await.unwrap().total_responses;

    response::submit_response(&store, &ResponseSubmission::new(SURVEY, scenario_selections()))
        .await
        .unwrap();
    let after = survey::load_survey(&store, SURVEY).await.unwrap().total_responses;

    assert_eq!(before, 2);
    assert_eq!(after, before + 1);
}

#[tokio::test]
async fn test_missing_survey_id_is_rejected_without_writes() {
    let store = scenario_store();

    let submission = ResponseSubmission {
        survey_id: None,
        selections: scenario_selections(),
    };
    let outcome = response::submit_response(&store, &submission).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(!outcome.is_recorded());
    assert!(store.responses().is_empty());
    assert!(store.selections().is_empty());
    assert_eq!(store.reads_issued(), 0);
}

#[tokio::test]
async fn test_non_numeric_survey_id_is_rejected() {
    let store = scenario_store();

    let submission = ResponseSubmission::from_raw(Some("first"), scenario_selections());
    let outcome = response::submit_response(&store, &submission).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(store.responses().is_empty());
}

#[tokio::test]
async fn test_several_answers_on_single_choice_question_are_stored_as_given() {
    let store = scenario_store();

    let selections = Selections::new().with(RADIO_Q, &[100, 101]);
    let outcome = response::submit_response(&store, &ResponseSubmission::new(SURVEY, selections))
        .await
        .unwrap();

    let response_id = outcome.response_id().expect("should be recorded");
    let mut answers: Vec<i64> = store
        .selections()
        .iter()
        .filter(|s| s.response_id == response_id && s.question_id == RADIO_Q)
        .map(|s| s.answer_id)
        .collect();
    answers.sort();
    assert_eq!(answers, vec![100, 101]);
}

#[tokio::test]
async fn test_empty_selections_still_recorded() {
    let store = scenario_store();

    let outcome = response::submit_response(&store, &ResponseSubmission::new(SURVEY, Selections::new()))
        .await
        .unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.responses().len(), 1);
    assert!(store.selections().is_empty());
    assert_eq!(store.cached_total(SURVEY), Some(1));
}

#[tokio::test]
async fn test_fault_on_second_selection_rolls_back_everything() {
    let store = scenario_store();
    store.inject_fault(Fault::SelectionInsert(2));

    let err = response::submit_response(
        &store,
        &ResponseSubmission::new(SURVEY, scenario_selections()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(store.responses().is_empty(), "no response row may remain");
    assert!(store.selections().is_empty(), "no response-answer row may remain");
    assert_eq!(store.cached_total(SURVEY), Some(0), "count untouched on rollback");
}

#[tokio::test]
async fn test_fault_on_response_insert_writes_nothing() {
    let store = scenario_store();
    store.inject_fault(Fault::ResponseInsert);

    let result = response::submit_response(
        &store,
        &ResponseSubmission::new(SURVEY, scenario_selections()),
    )
    .await;

    assert!(result.is_err());
    assert!(store.responses().is_empty());
    assert!(store.selections().is_empty());
}

#[tokio::test]
async fn test_commit_failure_is_fatal() {
    let store = scenario_store();
    store.inject_fault(Fault::Commit);

    let result = response::submit_response(
        &store,
        &ResponseSubmission::new(SURVEY, scenario_selections()),
    )
    .await;

    assert!(result.is_err());
    assert!(store.responses().is_empty());
}

#[tokio::test]
async fn test_unknown_answer_rolls_back() {
    let store = scenario_store();

    let selections = Selections::new().with(RADIO_Q, &[100]).with(CHECKBOX_Q, &[999]);
    let result = response::submit_response(&store, &ResponseSubmission::new(SURVEY, selections)).await;

    assert!(result.is_err());
    assert!(store.responses().is_empty());
    assert!(store.selections().is_empty());
}

#[tokio::test]
async fn test_unknown_survey_is_fatal_not_rejected() {
    let store = scenario_store();

    let result = response::submit_response(&store, &ResponseSubmission::new(404, Selections::new())).await;

    assert!(result.is_err());
    assert!(store.responses().is_empty());
}

#[tokio::test]
async fn test_count_refresh_failure_does_not_undo_commit() {
    let store = scenario_store();
    store.inject_fault(Fault::CountUpdate);

    let outcome = response::submit_response(
        &store,
        &ResponseSubmission::new(SURVEY, scenario_selections()),
    )
    .await
    .unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.responses().len(), 1);
    assert_eq!(store.selections().len(), 3);
    assert_eq!(store.cached_total(SURVEY), Some(0), "stale cache is tolerated");

    store.clear_faults();
    let total = response::refresh_response_count(&store, SURVEY).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(store.cached_total(SURVEY), Some(1));
}

#[tokio::test]
async fn test_refresh_count_is_idempotent_recomputation() {
    let store = scenario_store();
    store.set_cached_total(SURVEY, 50);

    // Before any submission the recomputed count overwrites the stale cache.
    assert_eq!(response::refresh_response_count(&store, SURVEY).await.unwrap(), 0);

    for _ in 0..3 {
        response::submit_response(&store, &ResponseSubmission::new(SURVEY, scenario_selections()))
            .await
            .unwrap();
    }
    store.set_cached_total(SURVEY, 99);

    assert_eq!(response::refresh_response_count(&store, SURVEY).await.unwrap(), 3);
    assert_eq!(response::refresh_response_count(&store, SURVEY).await.unwrap(), 3);
    assert_eq!(store.cached_total(SURVEY), Some(3));
}

#[tokio::test]
async fn test_refresh_count_counts_only_its_survey() {
    let store = scenario_store();

    response::submit_response(&store, &ResponseSubmission::new(SURVEY, scenario_selections()))
        .await
        .unwrap();
    response::submit_response(
        &store,
        &ResponseSubmission::new(OTHER_SURVEY, Selections::new().with(OTHER_Q, &[150])),
    )
    .await
    .unwrap();

    assert_eq!(store.cached_total(SURVEY), Some(1));
    assert_eq!(store.cached_total(OTHER_SURVEY), Some(1));
}

#[tokio::test]
async fn test_refresh_count_ignores_non_positive_id() {
    let store = scenario_store();

    assert_eq!(response::refresh_response_count(&store, 0).await.unwrap(), 0);
    assert_eq!(store.reads_issued(), 0);
}

#[tokio::test]
async fn test_load_response_view() {
    let store = scenario_store();
    let response_id = response::submit_response(
        &store,
        &ResponseSubmission::new(SURVEY, scenario_selections()),
    )
    .await
    .unwrap()
    .response_id()
    .unwrap();

    let view = response::load_response(&store, response_id)
        .await
        .unwrap()
        .expect("response should load");

    assert_eq!(view.response.id, response_id);
    assert_eq!(view.response.survey_id, SURVEY);
    assert_eq!(view.response.selections.len(), 3);
    assert!(view.survey.is_valid);
    assert_eq!(view.survey.total_responses, 1);

    let radio: Vec<i64> = view.chosen_answers(RADIO_Q).iter().map(|a| a.id).collect();
    assert_eq!(radio, vec![100]);
    let checkbox: Vec<i64> = view.chosen_answers(CHECKBOX_Q).iter().map(|a| a.id).collect();
    assert_eq!(checkbox, vec![200, 202]);
    assert!(view.chosen_answers(OTHER_Q).is_empty());
}

#[tokio::test]
async fn test_load_response_missing() {
    let store = scenario_store();

    assert!(response::load_response(&store, 0).await.unwrap().is_none());
    assert!(response::load_response(&store, 12345).await.unwrap().is_none());
}

#[tokio::test]
async fn test_interleaved_submissions_settle_on_exact_count() {
    let store = scenario_store();
    let a = ResponseSubmission::new(SURVEY, scenario_selections());
    let b = ResponseSubmission::new(SURVEY, Selections::new().with(RADIO_Q, &[101]));
    let c = ResponseSubmission::new(SURVEY, Selections::new());

    let (ra, rb, rc) = tokio::join!(
        response::submit_response(&store, &a),
        response::submit_response(&store, &b),
        response::submit_response(&store, &c),
    );
    let ids = [ra.unwrap(), rb.unwrap(), rc.unwrap()].map(|o| o.response_id().unwrap());
    assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
    assert_eq!(store.selections().len(), 4);

    assert_eq!(response::refresh_response_count(&store, SURVEY).await.unwrap(), 3);
}
