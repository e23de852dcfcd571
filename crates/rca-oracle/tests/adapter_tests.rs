//! Adapter behaviour against a scripted oracle

use pretty_assertions::assert_eq;
use rca_artifact::Stage;
use rca_oracle::{
    ControlSignal, Oracle, OracleAdapter, OracleError, OracleRequest, OracleSettings, ScriptedOracle,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn valid(message: &str) -> Value {
    json!({
        "assistantMessage": message,
        "patch": {"ideas": ["overtime is unplanned"]},
        "controlSignal": "needsClarification"
    })
}

fn adapter(oracle: &Arc<ScriptedOracle>) -> OracleAdapter<Arc<ScriptedOracle>> {
    OracleAdapter::new(Arc::clone(oracle), &OracleSettings::default()).unwrap()
}

#[tokio::test]
async fn valid_proposal_is_accepted_first_time() {
    let oracle = Arc::new(ScriptedOracle::new(vec![valid("Noted.")]));
    let outcome = adapter(&oracle)
        .propose(OracleRequest::new(Stage::Ideas, "we pay overtime"))
        .await;

    assert!(!outcome.is_fallback());
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.proposal.assistant_message, "Noted.");
    assert_eq!(outcome.proposal.patch["ideas"], json!(["overtime is unplanned"]));
}

#[tokio::test]
async fn request_carries_response_schema() {
    let oracle = Arc::new(ScriptedOracle::new(vec![valid("ok")]));
    let adapter = adapter(&oracle);
    adapter.propose(OracleRequest::new(Stage::Ideas, "hi")).await;

    let seen = oracle.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(&seen[0].response_schema, adapter.schema());
}

#[tokio::test]
async fn malformed_twice_falls_back_after_one_retry() {
    let missing_message = json!({"patch": {}, "controlSignal": "done"});
    let oracle = Arc::new(ScriptedOracle::new(vec![
        missing_message.clone(),
        missing_message,
        valid("never reached"),
    ]));
    let outcome = adapter(&oracle)
        .propose(OracleRequest::new(Stage::Ideas, "hi"))
        .await;

    assert!(outcome.is_fallback());
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.proposal.is_inert());
    assert_eq!(outcome.proposal.control_signal, ControlSignal::NeedsClarification);
    assert_eq!(oracle.remaining(), 1);
}

#[tokio::test]
async fn malformed_then_valid_succeeds_on_retry() {
    let oracle = Arc::new(ScriptedOracle::new(vec![json!("plain text"), valid("Second try.")]));
    let outcome = adapter(&oracle)
        .propose(OracleRequest::new(Stage::Ideas, "hi"))
        .await;

    assert!(!outcome.is_fallback());
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.proposal.assistant_message, "Second try.");
}

#[tokio::test]
async fn no_retry_when_disabled() {
    let oracle = Arc::new(ScriptedOracle::new(vec![json!({}), valid("unused")]));
    let settings = OracleSettings::default().with_max_retries(0);
    let adapter = OracleAdapter::new(Arc::clone(&oracle), &settings).unwrap();
    let outcome = adapter.propose(OracleRequest::new(Stage::Ideas, "hi")).await;

    assert!(outcome.is_fallback());
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn timeout_falls_back_without_retry() {
    let oracle = Arc::new(
        ScriptedOracle::new(vec![valid("too late"), valid("also late")])
            .with_delay(Duration::from_millis(200)),
    );
    let settings = OracleSettings::default().with_timeout(Duration::from_millis(20));
    let adapter = OracleAdapter::new(Arc::clone(&oracle), &settings).unwrap();
    let outcome = adapter.propose(OracleRequest::new(Stage::Ideas, "hi")).await;

    assert_eq!(outcome.fallback, Some(OracleError::Timeout(Duration::from_millis(20))));
    assert_eq!(outcome.attempts, 1);
    assert_eq!(oracle.requests().len(), 1);
}

#[tokio::test]
async fn transport_error_falls_back_without_retry() {
    let oracle = Arc::new(ScriptedOracle::default());
    oracle.push_error(OracleError::Transport("connection refused".into()));
    oracle.push(valid("unused"));
    let outcome = adapter(&oracle)
        .propose(OracleRequest::new(Stage::Ideas, "hi"))
        .await;

    assert!(matches!(outcome.fallback, Some(OracleError::Transport(_))));
    assert_eq!(outcome.attempts, 1);
    assert_eq!(oracle.remaining(), 1);
}

#[tokio::test]
async fn patch_with_wrong_stage_shape_is_rejected() {
    let bad = json!({
        "assistantMessage": "Here are the quadrants",
        "patch": {"strengths": "not a list"},
        "controlSignal": "readyToAdvance"
    });
    let oracle = Arc::new(ScriptedOracle::new(vec![bad.clone(), bad]));
    let outcome = adapter(&oracle)
        .propose(OracleRequest::new(Stage::Quadrants, "hi"))
        .await;

    assert!(matches!(outcome.fallback, Some(OracleError::Malformed(_))));
    assert!(outcome.proposal.patch.is_empty());
}

#[tokio::test]
async fn shared_oracle_keeps_its_name() {
    let oracle = Arc::new(ScriptedOracle::default());
    assert_eq!(oracle.name(), "scripted");
}
