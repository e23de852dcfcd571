//! Workflow service end to end against in-memory and file stores

use pretty_assertions::assert_eq;
use rca_artifact::{ArtifactKey, ArtifactKind, PeriodKey, Stage, StagePayload};
use rca_core::{Locator, RcaConfig, RcaError, TurnAction, TurnRequest, WorkflowService};
use rca_oracle::ScriptedOracle;
use rca_store::{ArtifactStore, FileStore, MemoryStore};
use rca_test_utils::{self as fixtures, owner, period, proposal, proposal_with};
use serde_json::{json, Value};
use std::sync::Arc;

type Service = WorkflowService<MemoryStore, Arc<ScriptedOracle>>;

fn service(script: Vec<Value>) -> (Service, Arc<ScriptedOracle>) {
    let oracle = Arc::new(ScriptedOracle::new(script));
    let service = WorkflowService::new(MemoryStore::new(), Arc::clone(&oracle), &RcaConfig::default()).unwrap();
    (service, oracle)
}

fn at(stage: Stage) -> Locator {
    Locator::new(owner(), stage).with_period(period())
}

#[tokio::test]
async fn malformed_oracle_output_never_touches_the_draft() {
    let missing_message = json!({"patch": {"ideas": ["hijacked"]}, "controlSignal": "done"});
    let (service, oracle) = service(vec![missing_message.clone(), missing_message]);
    fixtures::seed_upstream(service.store(), Stage::Ideas).await;
    service
        .save_state(&at(Stage::Ideas), json!({"problemStatement": "late deliveries", "ideas": ["a"]}))
        .await
        .unwrap();
    let before = service.get_state(&at(Stage::Ideas)).await.unwrap();

    let response = service
        .turn(TurnRequest::new(at(Stage::Ideas), "add some ideas"))
        .await
        .unwrap();

    assert!(!response.persisted);
    assert_eq!(response.updates.action, TurnAction::Clarify);
    assert_eq!(response.updates.next_state, before.payload);
    assert_eq!(oracle.requests().len(), 2);
    let after = service.get_state(&at(Stage::Ideas)).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn turn_returns_merged_state() {
    let (service, oracle) = service(vec![proposal(
        "Good, two more ideas.",
        json!({"ideas": ["idea 1", "idea 2", "idea 3"]}),
        "needsClarification",
    )]);
    fixtures::seed_upstream(service.store(), Stage::Ideas).await;
    service
        .save_state(&at(Stage::Ideas), json!({"problemStatement": "late deliveries", "ideas": ["idea 1"]}))
        .await
        .unwrap();

    let response = service
        .turn(TurnRequest::new(at(Stage::Ideas), "also idea 2 and idea 3"))
        .await
        .unwrap();

    assert!(response.persisted);
    assert_eq!(response.updates.action, TurnAction::Continue);
    assert_eq!(response.updates.next_state["problemStatement"], json!("late deliveries"));
    assert_eq!(response.updates.next_state["ideas"].as_array().unwrap().len(), 3);

    let sent = &oracle.requests()[0];
    assert_eq!(sent.draft["ideas"], json!(["idea 1"]));
    assert!(sent.upstream.contains_key("quadrants"));
    assert!(sent.upstream.contains_key("case_context"));
}

#[tokio::test]
async fn turn_without_upstream_final_is_a_lineage_error() {
    let (service, oracle) = service(vec![proposal("ok", json!({}), "done")]);
    let result = service
        .turn(TurnRequest::new(at(Stage::Quadrants), "we have loyal clients"))
        .await;
    assert!(matches!(result, Err(RcaError::Lineage(_))));
    assert!(oracle.requests().is_empty());
}

#[tokio::test]
async fn cause_tree_holds_other_categories_until_confirmed() {
    let first = proposal(
        "Why does the oven break down?",
        json!({
            "problem": "Deliveries leave late",
            "categories": [{"name": "Machine", "mainCauses": [{"name": "Oven breaks down"}]}]
        }),
        "needsClarification",
    );
    let drift = proposal(
        "Noted, that is a method issue.",
        json!({"categories": [{"name": "Method", "mainCauses": [{"name": "No dispatch schedule"}]}]}),
        "needsClarification",
    );
    let confirm = proposal_with("Switching to Method.", json!({}), json!({"confirmBranchSwitch": true}));
    let (service, _) = service(vec![first, drift, confirm]);
    fixtures::seed_upstream(service.store(), Stage::CauseTree).await;
    let locator = at(Stage::CauseTree);

    let opened = service.turn(TurnRequest::new(locator.clone(), "the oven breaks")).await.unwrap();
    assert_eq!(
        opened.updates.next_state["cursor"],
        json!({"categoryId": "machine", "mainCauseId": "oven-breaks-down"})
    );

    let held = service.turn(TurnRequest::new(locator.clone(), "also no schedule")).await.unwrap();
    assert_eq!(held.updates.action, TurnAction::ConfirmBranchSwitch);
    let categories: Vec<&str> = held.updates.next_state["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["machine"]);
    assert_eq!(held.updates.next_state["pendingBranchSwitch"]["categoryIds"], json!(["method"]));

    let switched = service.turn(TurnRequest::new(locator.clone(), "yes, switch")).await.unwrap();
    assert!(switched.updates.next_state.get("pendingBranchSwitch").map_or(true, Value::is_null));
    let categories = switched.updates.next_state["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(switched.updates.next_state["cursor"]["categoryId"], json!("method"));
    assert_eq!(switched.updates.next_state["problem"]["text"], json!("Deliveries leave late"));
}

#[tokio::test]
async fn objectives_without_finalized_prioritization_are_rejected() {
    let (service, _) = service(Vec::new());
    fixtures::seed_upstream(service.store(), Stage::Prioritization).await;
    let locator = at(Stage::Objectives);
    service
        .save_state(&locator, fixtures::complete_payload(Stage::Objectives))
        .await
        .unwrap();

    let response = service.validate(&locator).await.unwrap();
    assert!(!response.valid);
    assert!(response.message.contains("not finalized"), "{}", response.message);
    let final_key = ArtifactKey::final_of(&owner(), Stage::Objectives, &period());
    assert!(service.store().get(&final_key).await.unwrap().is_none());
}

#[tokio::test]
async fn sparse_cause_tree_cites_categories_and_minimum() {
    let (service, _) = service(Vec::new());
    fixtures::seed_upstream(service.store(), Stage::CauseTree).await;
    let mut tree = fixtures::cause_tree(2);
    tree.categories[0].main_causes.truncate(1);
    tree.categories[3].main_causes.truncate(1);
    let locator = at(Stage::CauseTree);
    service.save_state(&locator, tree.to_payload().unwrap()).await.unwrap();

    let response = service.validate(&locator).await.unwrap();
    assert!(!response.valid);
    assert!(response.message.contains("Machine, Manpower"), "{}", response.message);
    assert!(response.message.contains("minimum 2"), "{}", response.message);
}

#[tokio::test]
async fn prioritization_needs_twenty_percent_critical() {
    let (service, _) = service(Vec::new());
    fixtures::seed_upstream(service.store(), Stage::Prioritization).await;
    let locator = at(Stage::Prioritization);

    service
        .save_state(&locator, fixtures::prioritization(12, 1).to_payload().unwrap())
        .await
        .unwrap();
    let rejected = service.validate(&locator).await.unwrap();
    assert!(!rejected.valid);
    assert!(rejected.message.contains("criticalRoots has 1, minimum 3"), "{}", rejected.message);

    service
        .save_state(&locator, json!({"criticalRoots": ["root 1", "root 2", "root 3"]}))
        .await
        .unwrap();
    let accepted = service.validate(&locator).await.unwrap();
    assert!(accepted.valid, "{}", accepted.message);
    assert!(accepted.score.is_some());

    let evaluation_key = ArtifactKey::evaluation(&owner(), Stage::Prioritization, &period());
    let evaluation = service.store().get(&evaluation_key).await.unwrap().unwrap();
    assert_eq!(evaluation.score, accepted.score);
    assert!(evaluation.payload["id"].is_string());
}

#[tokio::test]
async fn revalidation_overwrites_the_final() {
    let (service, _) = service(Vec::new());
    fixtures::seed_upstream(service.store(), Stage::Ideas).await;
    let locator = at(Stage::Ideas);
    service.save_state(&locator, fixtures::ideas(10).to_payload().unwrap()).await.unwrap();
    let first = service.validate(&locator).await.unwrap();

    service
        .save_state(&locator, fixtures::ideas(15).to_payload().unwrap())
        .await
        .unwrap();
    let second = service.validate(&locator).await.unwrap();

    assert!(first.valid && second.valid);
    assert!(second.score > first.score);
    let final_key = ArtifactKey::final_of(&owner(), Stage::Ideas, &period());
    let stored = service.store().get(&final_key).await.unwrap().unwrap();
    assert_eq!(stored.payload["ideas"].as_array().unwrap().len(), 15);
    assert_eq!(stored.score, second.score);
}

#[tokio::test]
async fn confirmed_case_context_is_locked() {
    let (service, _) = service(Vec::new());
    let locator = at(Stage::CaseContext);
    service
        .save_state(&locator, fixtures::complete_payload(Stage::CaseContext))
        .await
        .unwrap();
    assert!(service.validate(&locator).await.unwrap().valid);

    let result = service.save_state(&locator, json!({"sector": "Retail"})).await;
    assert!(matches!(result, Err(RcaError::StageLocked { stage: Stage::CaseContext, .. })));
}

#[tokio::test]
async fn malformed_patch_is_rejected_before_writing() {
    let (service, _) = service(Vec::new());
    let locator = at(Stage::Quadrants);
    let not_object = service.save_state(&locator, json!(["a"])).await;
    assert!(matches!(not_object, Err(RcaError::InputShape(_))));
    let wrong_shape = service.save_state(&locator, json!({"strengths": "many"})).await;
    assert!(matches!(wrong_shape, Err(RcaError::InputShape(_))));
    assert!(!service.get_state(&locator).await.unwrap().exists);
}

#[tokio::test]
async fn new_period_resumes_unfinished_draft() {
    let (service, _) = service(Vec::new());
    let locator = at(Stage::Ideas);
    service
        .save_state(&locator, json!({"problemStatement": "late deliveries"}))
        .await
        .unwrap();

    let next_month = Locator::new(owner(), Stage::Ideas).with_period(PeriodKey::new("2026-11").unwrap());
    let view = service.get_state(&next_month).await.unwrap();
    assert!(view.exists);
    assert_eq!(view.period, period());
    assert_eq!(view.payload["problemStatement"], json!("late deliveries"));
}

#[tokio::test]
async fn finished_draft_is_not_resumed() {
    let (service, _) = service(Vec::new());
    fixtures::seed_upstream(service.store(), Stage::Ideas).await;
    let locator = at(Stage::Ideas);
    service.save_state(&locator, fixtures::complete_payload(Stage::Ideas)).await.unwrap();
    assert!(service.validate(&locator).await.unwrap().valid);

    let next_month = Locator::new(owner(), Stage::Ideas).with_period(PeriodKey::new("2026-11").unwrap());
    let view = service.get_state(&next_month).await.unwrap();
    assert!(!view.exists);
    assert_eq!(view.period.as_str(), "2026-11");
}

#[tokio::test]
async fn conversation_ref_finds_its_draft() {
    let (service, _) = service(Vec::new());
    let locator = at(Stage::Quadrants).with_conversation("conv-7");
    service
        .save_state(&locator, json!({"strengths": [{"text": "Loyal clients"}]}))
        .await
        .unwrap();

    let elsewhere = Locator::new(owner(), Stage::Quadrants)
        .with_period(PeriodKey::new("2027-01").unwrap())
        .with_conversation("conv-7");
    let view = service.get_state(&elsewhere).await.unwrap();
    assert_eq!(view.period, period());
}

#[tokio::test]
async fn status_tracks_pipeline_position() {
    let (service, _) = service(Vec::new());
    fixtures::seed_upstream(service.store(), Stage::Ideas).await;
    service
        .save_state(&at(Stage::Ideas), json!({"problemStatement": "late"}))
        .await
        .unwrap();

    let status = service.status(&owner(), &period()).await.unwrap();
    assert_eq!(status.next_stage(), Some(Stage::Ideas));
    let ideas = &status.stages[Stage::Ideas.index() as usize];
    assert!(ideas.draft && !ideas.validated && !ideas.locked);
    let tree = &status.stages[Stage::CauseTree.index() as usize];
    assert!(tree.locked);
    assert_eq!(status.stages[0].score, Some(10.0));
}

#[tokio::test]
async fn file_backed_service_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rca.json");
    let config = RcaConfig::default().with_store_path(&path);
    {
        let service =
            WorkflowService::new(FileStore::new(&config.store.path), ScriptedOracle::default(), &config).unwrap();
        service
            .save_state(&at(Stage::CaseContext), json!({"sector": "Bakery"}))
            .await
            .unwrap();
    }
    let reopened = WorkflowService::new(FileStore::new(&path), ScriptedOracle::default(), &config).unwrap();
    let view = reopened.get_state(&at(Stage::CaseContext)).await.unwrap();
    assert_eq!(view.payload["sector"], json!("Bakery"));
    let drafts = reopened
        .store()
        .latest_across_periods(&owner(), Stage::CaseContext, ArtifactKind::Draft)
        .await
        .unwrap();
    assert!(drafts.is_some());
}
