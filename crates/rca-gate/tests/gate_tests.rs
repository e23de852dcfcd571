//! Gate behaviour across stages

use chrono::Utc;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rca_artifact::types::{Category, CauseTree, Criterion, MainCause, ObjectivesState, PrioritizationState, SubCause};
use rca_artifact::{ArtifactKey, ArtifactStatus, OwnerId, PeriodKey, Stage, StageArtifact, StagePayload};
use rca_gate::{linkage, FailureKind, GateFailure, StageGate, Thresholds};
use serde_json::json;

fn final_artifact<P: StagePayload>(payload: &P, status: ArtifactStatus) -> StageArtifact {
    let key = ArtifactKey::final_of(&OwnerId::new("ana").unwrap(), P::STAGE, &PeriodKey::new("2026-10").unwrap());
    StageArtifact::new(key, payload.to_payload().unwrap(), status, Utc::now())
}

fn roots(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("root {i}")).collect()
}

/// Six categories, two main causes each, one sub-cause per main cause
fn complete_tree() -> CauseTree {
    let mut tree = CauseTree::with_problem("late deliveries");
    let mut n = 0;
    for name in ["Machine", "Method", "Material", "Manpower", "Measurement", "Environment"] {
        let mut category = Category::named(name);
        for branch in ["a", "b"] {
            n += 1;
            category = category.with_main_cause(
                MainCause::named(&format!("{name} {branch}")).with_sub_cause(SubCause::named(&format!("root {n}"))),
            );
        }
        tree.categories.push(category);
    }
    tree
}

fn prioritization(selected: usize, critical: usize) -> PrioritizationState {
    PrioritizationState {
        selected_roots: roots(selected),
        criteria: vec![Criterion::new("impact", 9), Criterion::new("cost", 4), Criterion::new("speed", 2)],
        critical_roots: roots(critical),
        ..PrioritizationState::default()
    }
}

fn complete_objectives() -> ObjectivesState {
    ObjectivesState {
        general_objective: "Halve late deliveries".into(),
        specific_objectives: vec!["schedule maintenance".into(), "train staff".into(), "audit suppliers".into()],
        linked_critical_roots: vec!["root 1".into()],
        ..ObjectivesState::default()
    }
}

#[test]
fn objectives_without_validated_prioritization_fail_on_lineage() {
    let gate = StageGate::default();
    let draft = complete_objectives().to_payload().unwrap();

    let missing = gate.evaluate(Stage::Objectives, &draft, None).unwrap_err();
    assert_eq!(
        missing,
        GateFailure::UpstreamNotFinalized {
            stage: Stage::Objectives,
            upstream: Stage::Prioritization
        }
    );
    assert_eq!(missing.kind(), FailureKind::Lineage);

    let unvalidated = final_artifact(&prioritization(12, 3), ArtifactStatus::Draft);
    assert!(matches!(
        gate.evaluate(Stage::Objectives, &draft, Some(&unvalidated)),
        Err(GateFailure::UpstreamNotFinalized { .. })
    ));
}

#[test]
fn objectives_pass_with_validated_prioritization() {
    let gate = StageGate::default();
    let upstream = final_artifact(&prioritization(12, 3), ArtifactStatus::Validated);
    let evaluation = gate
        .evaluate(Stage::Objectives, &complete_objectives().to_payload().unwrap(), Some(&upstream))
        .unwrap();
    assert_eq!(evaluation.stage, Stage::Objectives);
    assert!(evaluation.score > 0.0 && evaluation.score <= 10.0);
}

#[test]
fn prioritization_checks_against_tree_candidates() {
    let gate = StageGate::default();
    let tree = final_artifact(&complete_tree(), ArtifactStatus::Validated);

    let failing = prioritization(12, 1).to_payload().unwrap();
    let failure = gate.evaluate(Stage::Prioritization, &failing, Some(&tree)).unwrap_err();
    assert_eq!(failure.to_string(), "stage 5 (Pareto prioritization): criticalRoots has 1, minimum 3");

    let passing = prioritization(12, 3).to_payload().unwrap();
    let evaluation = gate.evaluate(Stage::Prioritization, &passing, Some(&tree)).unwrap();
    assert_eq!(evaluation.pareto, None);
}

#[test]
fn prioritization_reports_pareto_when_scored() {
    let gate = StageGate::default();
    let tree = final_artifact(&complete_tree(), ArtifactStatus::Validated);
    let mut draft = prioritization(10, 2).to_payload().unwrap();
    let scores: Vec<_> = (1..=10)
        .map(|i| json!({"root": format!("root {i}"), "values": [f64::from(i), 1.0, 1.0]}))
        .collect();
    draft["scores"] = json!(scores);

    let evaluation = gate.evaluate(Stage::Prioritization, &draft, Some(&tree)).unwrap();
    let report = evaluation.pareto.unwrap();
    assert_eq!(report.top, vec!["root 10".to_string(), "root 9".to_string()]);
    assert_eq!(report.outside_top, vec!["root 1".to_string(), "root 2".to_string()]);
}

#[test]
fn case_context_has_no_upstream() {
    let gate = StageGate::default();
    let draft = json!({"sector": "Bakery", "products": ["bread"], "processFocus": ["baking"]});
    let evaluation = gate.evaluate(Stage::CaseContext, &draft, None).unwrap();
    assert_eq!(evaluation.metrics.len(), 3);
}

#[test]
fn wrong_upstream_stage_is_not_lineage() {
    let gate = StageGate::default();
    let wrong = final_artifact(&complete_tree(), ArtifactStatus::Validated);
    assert!(gate.check_lineage(Stage::Objectives, Some(&wrong)).is_err());
    assert!(gate.check_lineage(Stage::Prioritization, Some(&wrong)).is_ok());
}

#[test]
fn malformed_draft_is_a_shape_failure() {
    let gate = StageGate::default();
    let failure = gate.evaluate(Stage::CaseContext, &json!({"products": 3}), None).unwrap_err();
    assert_eq!(failure.kind(), FailureKind::Shape);
}

proptest! {
    /// Any selection drawn from the candidates with enough critical roots
    /// drawn from the selection passes.
    #[test]
    fn subsets_within_bounds_pass(selected in 10usize..=15, extra in 0usize..5, pick in any::<prop::sample::Index>()) {
        let t = Thresholds::default();
        let candidates = roots(selected + extra);
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let floor = t.critical_floor(selected);
        let critical = floor + pick.index(selected - floor + 1);
        prop_assert!(linkage::prioritization(&prioritization(selected, critical), &candidates, &t).is_ok());
    }

    /// A critical root outside the selection is always rejected.
    #[test]
    fn critical_outside_selection_rejected(selected in 10usize..=15, stray in 16usize..40) {
        let t = Thresholds::default();
        let candidates = roots(40);
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let mut state = prioritization(selected, t.critical_floor(selected));
        state.critical_roots.push(format!("root {stray}"));
        let result = linkage::prioritization(&state, &candidates, &t);
        let is_subset_failure = matches!(result, Err(GateFailure::NotSubset { field: "criticalRoots", .. }));
        prop_assert!(is_subset_failure);
    }

    /// A selected root outside the candidates is always rejected.
    #[test]
    fn selected_outside_candidates_rejected(selected in 10usize..=15) {
        let t = Thresholds::default();
        let candidates = roots(selected - 1);
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let result = linkage::prioritization(&prioritization(selected, 3), &candidates, &t);
        let is_subset_failure = matches!(result, Err(GateFailure::NotSubset { field: "selectedRoots", .. }));
        prop_assert!(is_subset_failure);
    }
}
