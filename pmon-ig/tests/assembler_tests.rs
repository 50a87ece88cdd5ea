//! Session assembler state machine tests
//!
//! Covers boundary detection, completion, abandonment, integrity discards
//! and evaluation window switching.

mod helpers;

use helpers::{policy, readings, routes, test_store, RecordingOutbound, EVALUATION_URL, PREPARATION_URL};
use pmon_common::models::TelemetrySample;
use pmon_common::db::open_in_memory;
use pmon_common::work_queue;
use pmon_ig::config::{OperativeMode, SessionPolicy};
use pmon_ig::integrity::IntegrityChecker;
use pmon_ig::store::SessionStore;
use pmon_ig::window::{EvaluationWindow, Mode};
use pmon_ig::{AssemblyOutcome, SessionAssembler};
use std::sync::Arc;

async fn assembler(
    policy: SessionPolicy,
    window: EvaluationWindow,
    outbound: Arc<RecordingOutbound>,
    operative_mode: OperativeMode,
) -> SessionAssembler {
    let store = test_store(policy.clone()).await;
    SessionAssembler::new(
        store,
        IntegrityChecker::new(policy),
        outbound,
        routes(),
        window,
        operative_mode,
    )
}

async fn production_assembler(
    policy: SessionPolicy,
    outbound: Arc<RecordingOutbound>,
) -> SessionAssembler {
    assembler(
        policy,
        EvaluationWindow::new(Mode::Production, 10, 10),
        outbound,
        OperativeMode::Production,
    )
    .await
}

async fn feed(assembler: &mut SessionAssembler, samples: Vec<TelemetrySample>) -> Vec<AssemblyOutcome> {
    let mut outcomes = Vec::new();
    for sample in samples {
        outcomes.push(assembler.handle_sample(sample).await);
    }
    outcomes
}

#[tokio::test]
async fn test_single_session_completes_in_order() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = production_assembler(policy(3, 1), outbound.clone()).await;

    let outcomes = feed(&mut assembler, readings("a", &[0, 1, 2])).await;
    assert_eq!(
        outcomes,
        vec![
            AssemblyOutcome::Tracking { uuid: "a".into() },
            AssemblyOutcome::Waiting { uuid: "a".into() },
            AssemblyOutcome::Forwarded {
                uuid: "a".into(),
                labelled: false,
                switched_to: None,
            },
        ]
    );

    assert_eq!(assembler.store().session_count().await.unwrap(), 0);
    assert_eq!(assembler.pending_uuid(), None);

    let forwarded = outbound.sent_to(PREPARATION_URL);
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0]["uuid"], "a");
    assert_eq!(forwarded[0]["time_series"].as_array().unwrap().len(), 3);
    assert!(outbound.sent_to(EVALUATION_URL).is_empty());
}

#[tokio::test]
async fn test_completed_session_removed_exactly_once() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = production_assembler(policy(2, 0), outbound.clone()).await;

    feed(&mut assembler, readings("a", &[0, 1])).await;
    // Late duplicate of an already forwarded session starts cold again
    let late = feed(&mut assembler, readings("a", &[1])).await;
    assert_eq!(late, vec![AssemblyOutcome::Tracking { uuid: "a".into() }]);

    assert_eq!(outbound.sent_to(PREPARATION_URL).len(), 1);
}

#[tokio::test]
async fn test_boundary_completes_previous_session_within_tolerance() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = production_assembler(policy(3, 1), outbound.clone()).await;

    feed(&mut assembler, readings("a", &[0, 1])).await;
    let outcome = assembler
        .handle_sample(TelemetrySample::pressure("b", 0, 40.0))
        .await;

    assert_eq!(
        outcome,
        AssemblyOutcome::Forwarded {
            uuid: "a".into(),
            labelled: false,
            switched_to: None,
        }
    );
    let forwarded = outbound.sent_to(PREPARATION_URL);
    assert_eq!(forwarded[0]["time_series"][2], serde_json::Value::Null);

    // Tracking restarts cold; the boundary record itself stays stored
    assert_eq!(assembler.pending_uuid(), None);
    assert_eq!(assembler.store().session_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_boundary_evaluates_previous_even_if_never_resent() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = production_assembler(policy(3, 1), outbound.clone()).await;

    // "a" is seen exactly once; the next id must still trigger its evaluation
    let outcomes = feed(
        &mut assembler,
        vec![
            TelemetrySample::pressure("a", 0, 40.0),
            TelemetrySample::pressure("b", 0, 40.0),
        ],
    )
    .await;

    assert_eq!(outcomes[1], AssemblyOutcome::Abandoned { uuid: "a".into() });
    assert!(assembler.store().load_raw_session("a").await.unwrap().is_none());
    assert!(assembler.store().load_raw_session("b").await.unwrap().is_some());
    assert_eq!(assembler.pending_uuid(), None);
    assert!(outbound.sent().is_empty());
}

#[tokio::test]
async fn test_interleaved_sessions_are_a_known_limitation() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = production_assembler(policy(3, 0), outbound.clone()).await;

    let outcomes = feed(
        &mut assembler,
        vec![
            TelemetrySample::pressure("a", 0, 40.0),
            TelemetrySample::pressure("a", 1, 40.0),
            TelemetrySample::pressure("b", 0, 40.0),
            TelemetrySample::pressure("a", 2, 40.0),
        ],
    )
    .await;

    assert_eq!(outcomes[2], AssemblyOutcome::Abandoned { uuid: "a".into() });
    assert_eq!(outcomes[3], AssemblyOutcome::Tracking { uuid: "a".into() });
    assert!(outbound.sent().is_empty());
}

#[tokio::test]
async fn test_integrity_failure_discards_without_forwarding() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = production_assembler(policy(3, 1), outbound.clone()).await;

    let outcomes = feed(
        &mut assembler,
        vec![
            TelemetrySample::pressure("a", 0, 500.0),
            TelemetrySample::pressure("a", 1, 500.0),
            TelemetrySample::pressure("a", 2, 50.0),
        ],
    )
    .await;

    assert_eq!(
        outcomes[2],
        AssemblyOutcome::Discarded { uuid: "a".into(), missing: 2 }
    );
    assert!(outbound.sent().is_empty());
    assert_eq!(assembler.window().sessions_to_produce(), 0);
    assert_eq!(assembler.store().session_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_evaluation_mode_emits_label_and_returns_to_production() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = assembler(
        policy(2, 0),
        EvaluationWindow::new(Mode::Evaluation, 2, 5),
        outbound.clone(),
        OperativeMode::Production,
    )
    .await;

    // Readings alone are not enough while evaluating
    let outcomes = feed(&mut assembler, readings("a", &[0, 1])).await;
    assert_eq!(outcomes[1], AssemblyOutcome::Waiting { uuid: "a".into() });

    let outcome = assembler
        .handle_sample(TelemetrySample::label("a", "anomalous"))
        .await;
    assert_eq!(
        outcome,
        AssemblyOutcome::Forwarded {
            uuid: "a".into(),
            labelled: true,
            switched_to: None,
        }
    );
    let labels = outbound.sent_to(EVALUATION_URL);
    assert_eq!(labels, vec![serde_json::json!({"uuid": "a", "label": "anomalous"})]);
    assert_eq!(assembler.window().sessions_to_evaluation(), 1);

    let mut second = readings("b", &[0, 1]);
    second.push(TelemetrySample::label("b", "regular"));
    let outcomes = feed(&mut assembler, second).await;
    assert_eq!(
        outcomes[2],
        AssemblyOutcome::Forwarded {
            uuid: "b".into(),
            labelled: true,
            switched_to: Some(Mode::Production),
        }
    );
    assert_eq!(assembler.window().mode(), Mode::Production);
    assert_eq!(assembler.window().sessions_to_evaluation(), 0);

    // Back in production: no more labels
    feed(&mut assembler, readings("c", &[0, 1])).await;
    assert_eq!(outbound.sent_to(EVALUATION_URL).len(), 2);
    assert_eq!(outbound.sent_to(PREPARATION_URL).len(), 3);
}

#[tokio::test]
async fn test_production_window_switches_to_evaluation() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = assembler(
        policy(1, 0),
        EvaluationWindow::new(Mode::Production, 3, 2),
        outbound.clone(),
        OperativeMode::Production,
    )
    .await;

    // With one expected reading, a session completes on its second
    // record (the first only starts tracking)
    let first = feed(&mut assembler, readings("a", &[0, 0])).await;
    assert_eq!(
        first[1],
        AssemblyOutcome::Forwarded { uuid: "a".into(), labelled: false, switched_to: None }
    );

    let second = feed(&mut assembler, readings("b", &[0, 0])).await;
    assert_eq!(
        second[1],
        AssemblyOutcome::Forwarded {
            uuid: "b".into(),
            labelled: false,
            switched_to: Some(Mode::Evaluation),
        }
    );
    assert!(assembler.window().is_evaluation());
    assert_eq!(assembler.window().sessions_to_produce(), 0);
}

#[tokio::test]
async fn test_failed_sends_are_logged_not_retried() {
    let outbound = Arc::new(RecordingOutbound::failing());
    let mut assembler = assembler(
        policy(2, 0),
        EvaluationWindow::new(Mode::Evaluation, 5, 5),
        outbound.clone(),
        OperativeMode::Production,
    )
    .await;

    let mut samples = readings("a", &[0, 1]);
    samples.push(TelemetrySample::label("a", "regular"));
    let outcomes = feed(&mut assembler, samples).await;

    assert_eq!(
        outcomes[2],
        AssemblyOutcome::Forwarded { uuid: "a".into(), labelled: true, switched_to: None }
    );
    // One attempt per destination
    assert_eq!(outbound.sent().len(), 2);
    assert_eq!(assembler.window().sessions_to_evaluation(), 1);
}

#[tokio::test]
async fn test_development_mode_requires_label_and_never_switches() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = assembler(
        policy(2, 0),
        EvaluationWindow::development(Mode::Production, 2),
        outbound.clone(),
        OperativeMode::Development,
    )
    .await;

    let outcomes = feed(&mut assembler, readings("a", &[0, 1])).await;
    assert_eq!(outcomes[1], AssemblyOutcome::Waiting { uuid: "a".into() });

    let outcome = assembler.handle_sample(TelemetrySample::label("a", "regular")).await;
    assert_eq!(
        outcome,
        AssemblyOutcome::Forwarded { uuid: "a".into(), labelled: false, switched_to: None }
    );
    let forwarded = outbound.sent_to(PREPARATION_URL);
    assert_eq!(forwarded[0]["pressure_detected"], "regular");
}

#[tokio::test]
async fn test_development_mode_labels_one_evaluation_window_only() {
    let outbound = Arc::new(RecordingOutbound::new());
    let mut assembler = assembler(
        policy(1, 0),
        EvaluationWindow::development(Mode::Evaluation, 2),
        outbound.clone(),
        OperativeMode::Development,
    )
    .await;

    let mut labelled = Vec::new();
    for uuid in ["a", "b", "c", "d", "e"] {
        let mut samples = readings(uuid, &[0]);
        samples.push(TelemetrySample::label(uuid, "regular"));
        let outcomes = feed(&mut assembler, samples).await;
        match outcomes.last() {
            Some(AssemblyOutcome::Forwarded { labelled: l, .. }) => labelled.push(*l),
            other => panic!("session {} not forwarded: {:?}", uuid, other),
        }
    }

    assert_eq!(labelled, vec![true, true, false, false, false]);
    assert_eq!(outbound.sent_to(EVALUATION_URL).len(), 2);
    assert_eq!(outbound.sent_to(PREPARATION_URL).len(), 5);
    assert_eq!(assembler.window().mode(), Mode::Production);
}

#[tokio::test]
async fn test_unreadable_session_is_dropped() {
    let outbound = Arc::new(RecordingOutbound::new());
    let pool = open_in_memory().await.unwrap();
    let store = SessionStore::new(pool.clone(), policy(2, 0)).await.unwrap();
    let mut assembler = SessionAssembler::new(
        store,
        IntegrityChecker::new(policy(2, 0)),
        outbound.clone(),
        routes(),
        EvaluationWindow::new(Mode::Production, 10, 10),
        OperativeMode::Production,
    );

    assembler.handle_sample(TelemetrySample::pressure("a", 0, 40.0)).await;
    // A value the store cannot decode back into a reading
    sqlx::query(
        "INSERT INTO raw_samples (uuid, sample_index, value, received_at) VALUES ('a', 1, 'garbled', 'now')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let outcome = assembler.handle_sample(TelemetrySample::pressure("a", 1, 41.0)).await;
    assert_eq!(outcome, AssemblyOutcome::LoadFailed { uuid: "a".into() });
    assert_eq!(assembler.store().session_count().await.unwrap(), 0);
    assert_eq!(assembler.pending_uuid(), None);
    assert!(outbound.sent().is_empty());
}

#[tokio::test]
async fn test_run_drains_queue_in_fifo_order() {
    let outbound = Arc::new(RecordingOutbound::new());
    let assembler = production_assembler(policy(2, 0), outbound.clone()).await;

    let (tx, rx) = work_queue();
    tx.push_start().unwrap();
    for sample in readings("a", &[0, 1]).into_iter().chain(readings("b", &[0, 1])) {
        tx.push(sample).unwrap();
    }
    drop(tx);

    assembler.run(rx).await;

    let uuids: Vec<String> = outbound
        .sent_to(PREPARATION_URL)
        .iter()
        .map(|body| body["uuid"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(uuids, vec!["a".to_string(), "b".to_string()]);
}
