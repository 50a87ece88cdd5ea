//! Integration tests for pmon-ir API endpoints

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use helpers::{RecordingOutbound, INGESTION_URL};
use pmon_common::{work_queue, QueueMessage, QueueReceiver};
use pmon_ir::timestamps::{TimestampEntry, INPUT_SYSTEM};
use pmon_ir::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

fn setup_app(
    outbound: Arc<RecordingOutbound>,
) -> (axum::Router, AppState, QueueReceiver<TimestampEntry>) {
    let (tx, rx) = work_queue();
    let state = AppState::new(outbound, INGESTION_URL, tx);
    (build_router(state.clone()), state, rx)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// POST /record
// =============================================================================

#[tokio::test]
async fn test_record_forwarded_and_timestamped() {
    let outbound = Arc::new(RecordingOutbound::new());
    let (app, _state, mut rx) = setup_app(outbound.clone());

    let response = app
        .oneshot(post_json(
            "/record",
            r#"{"uuid":"r-1","kind":"pressure","index":0,"value":12.5}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = outbound.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, INGESTION_URL);
    assert_eq!(
        sent[0].1,
        json!({"uuid": "r-1", "kind": "pressure", "index": 0, "value": 12.5})
    );

    match rx.next().await {
        Some(QueueMessage::Item(entry)) => {
            assert_eq!(entry.record_id, "r-1");
            assert_eq!(entry.system_source, INPUT_SYSTEM);
        }
        other => panic!("expected a timestamp entry, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_forward_is_bad_gateway_and_not_logged() {
    let outbound = Arc::new(RecordingOutbound::failing());
    let (app, state, _rx) = setup_app(outbound);

    let response = app
        .oneshot(post_json(
            "/record",
            r#"{"uuid":"r-1","kind":"label","pressure_detected":"regular"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(state.timestamps.depth(), 0);
}

#[tokio::test]
async fn test_invalid_record_not_forwarded() {
    let outbound = Arc::new(RecordingOutbound::new());
    let (app, _state, _rx) = setup_app(outbound.clone());

    let response = app
        .oneshot(post_json("/record", r#"{"uuid":"r-1","kind":"pressure"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(outbound.sent().is_empty());
}

// =============================================================================
// POST /log
// =============================================================================

#[tokio::test]
async fn test_log_keeps_reported_timestamp() {
    let (app, _state, mut rx) = setup_app(Arc::new(RecordingOutbound::new()));
    let body = r#"{"uuid":"r-1","system_source":"evaluation_system","timestamp":"2026-02-03T10:11:12.000001"}"#;

    let response = app.oneshot(post_json("/log", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        rx.next().await,
        Some(QueueMessage::Item(TimestampEntry {
            record_id: "r-1".to_string(),
            system_source: "evaluation_system".to_string(),
            timestamp: "2026-02-03T10:11:12.000001".to_string(),
        }))
    );
}

#[tokio::test]
async fn test_log_rejects_bad_timestamp() {
    let (app, state, _rx) = setup_app(Arc::new(RecordingOutbound::new()));
    let body = r#"{"uuid":"r-1","system_source":"evaluation_system","timestamp":"noon"}"#;

    let response = app.oneshot(post_json("/log", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.timestamps.depth(), 0);
}

// =============================================================================
// Receivers, /start, /health
// =============================================================================

#[tokio::test]
async fn test_label_receiver_validates() {
    let (app, _state, _rx) = setup_app(Arc::new(RecordingOutbound::new()));

    let ok = app
        .clone()
        .oneshot(post_json("/label", r#"{"uuid":"r-1","label":"anomalous"}"#))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let missing = app
        .oneshot(post_json("/label", r#"{"uuid":"r-1"}"#))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_evaluation_report_receiver() {
    let (app, _state, _rx) = setup_app(Arc::new(RecordingOutbound::new()));

    let ok = app
        .clone()
        .oneshot(post_json(
            "/evaluationReport",
            r#"{"total_labels":5,"total_errors":4,"max_consecutive_errors_found":3,"is_valid":false}"#,
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let not_object = app
        .oneshot(post_json("/evaluationReport", "[1, 2]"))
        .await
        .unwrap();
    assert_eq!(not_object.status(), StatusCode::BAD_REQUEST);
    let json = extract_json(not_object.into_body()).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_start_and_health() {
    let (app, _state, mut rx) = setup_app(Arc::new(RecordingOutbound::new()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/start").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(rx.next().await, Some(QueueMessage::Start));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "pmon-ir");
}
