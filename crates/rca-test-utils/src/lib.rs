//! Testing utilities for the RCA workspace
//!
//! Payload builders that satisfy the default thresholds, store seeding
//! helpers, and oracle response fixtures.

#![allow(missing_docs)]

use rca_artifact::types::{
    CaseContext, Category, CauseTree, CostItem, Criterion, Idea, IdeaList, MainCause,
    ObjectivesState, PrioritizationState, ProductivityDraft, QuadrantItem, QuadrantState, SubCause,
    UnitType,
};
use rca_artifact::{ArtifactKey, ArtifactStatus, OwnerId, PeriodKey, Stage, StageArtifact, StagePayload};
use rca_store::{ArtifactStore, ArtifactWrite};
use serde_json::{json, Value};

pub const CATEGORIES: [&str; 6] = ["Machine", "Method", "Material", "Manpower", "Measurement", "Environment"];

pub fn owner() -> OwnerId {
    OwnerId::new("ana").unwrap()
}

pub fn period() -> PeriodKey {
    PeriodKey::new("2026-10").unwrap()
}

pub fn root(n: usize) -> String {
    format!("root {n}")
}

pub fn roots(n: usize) -> Vec<String> {
    (1..=n).map(root).collect()
}

pub fn case_context() -> CaseContext {
    CaseContext {
        sector: "Food manufacturing".into(),
        products: vec!["Bread".into(), "Pastries".into()],
        process_focus: vec!["Baking".into()],
        ..CaseContext::default()
    }
}

pub fn productivity() -> ProductivityDraft {
    let mut draft = ProductivityDraft::with_default_items();
    draft.unit_type = Some(UnitType::Monetary);
    draft.justification = "Sales and costs are recorded monthly".into();
    draft.income = Some(12_000.0);
    draft.cost_items[0] = CostItem {
        amount: Some(4_000.0),
        ..CostItem::named("materials")
    };
    draft
}

pub fn quadrants() -> QuadrantState {
    let items = |prefix: &str| {
        (1..=3)
            .map(|i| QuadrantItem::new(&format!("{prefix} {i}")).with_evidence("monthly report"))
            .collect::<Vec<_>>()
    };
    QuadrantState {
        strengths: items("strength"),
        weaknesses: items("weakness"),
        opportunities: items("opportunity"),
        threats: items("threat"),
        ..QuadrantState::default()
    }
}

pub fn ideas(count: usize) -> IdeaList {
    IdeaList {
        problem_statement: "Deliveries leave the bakery late".into(),
        ideas: (1..=count).map(|i| Idea::new(format!("idea {i}"))).collect(),
        ..IdeaList::default()
    }
}

/// Six categories with `mains_per_category` main causes, one sub-cause each
///
/// Sub-causes are named `root 1`, `root 2`, … in tree order.
pub fn cause_tree(mains_per_category: usize) -> CauseTree {
    let mut tree = CauseTree::with_problem("Deliveries leave the bakery late");
    let mut n = 0;
    for name in CATEGORIES {
        let mut category = Category::named(name);
        for branch in 1..=mains_per_category {
            n += 1;
            category = category.with_main_cause(
                MainCause::named(&format!("{name} cause {branch}")).with_sub_cause(SubCause::named(&root(n))),
            );
        }
        tree.categories.push(category);
    }
    tree
}

pub fn prioritization(selected: usize, critical: usize) -> PrioritizationState {
    PrioritizationState {
        selected_roots: roots(selected),
        criteria: vec![
            Criterion::new("impact", 9),
            Criterion::new("cost", 5),
            Criterion::new("speed", 3),
        ],
        critical_roots: roots(critical),
        ..PrioritizationState::default()
    }
}

pub fn objectives(linked: &[&str]) -> ObjectivesState {
    ObjectivesState {
        general_objective: "Halve late deliveries within six months".into(),
        specific_objectives: vec![
            "Schedule oven maintenance".into(),
            "Train night shift".into(),
            "Audit flour suppliers".into(),
        ],
        linked_critical_roots: linked.iter().map(|s| (*s).to_string()).collect(),
        ..ObjectivesState::default()
    }
}

/// Payload passing the default thresholds for `stage`
pub fn complete_payload(stage: Stage) -> Value {
    let payload = match stage {
        Stage::CaseContext => case_context().to_payload(),
        Stage::Productivity => productivity().to_payload(),
        Stage::Quadrants => quadrants().to_payload(),
        Stage::Ideas => ideas(10).to_payload(),
        Stage::CauseTree => cause_tree(2).to_payload(),
        Stage::Prioritization => prioritization(12, 3).to_payload(),
        Stage::Objectives => objectives(&["root 1"]).to_payload(),
    };
    payload.unwrap()
}

/// Write a validated final for `stage`
pub async fn seed_final<S: ArtifactStore>(store: &S, stage: Stage, payload: Value) -> StageArtifact {
    let key = ArtifactKey::final_of(&owner(), stage, &period());
    let write = ArtifactWrite::new(key, payload)
        .with_status(ArtifactStatus::Validated)
        .with_score(10.0);
    store.commit(vec![write]).await.unwrap().remove(0)
}

/// Validated finals for every stage before `stage`
pub async fn seed_upstream<S: ArtifactStore>(store: &S, stage: Stage) {
    for earlier in Stage::iter().filter(|s| *s < stage) {
        seed_final(store, earlier, complete_payload(earlier)).await;
    }
}

/// Raw oracle response
pub fn proposal(message: &str, patch: Value, signal: &str) -> Value {
    json!({
        "assistantMessage": message,
        "patch": patch,
        "controlSignal": signal,
    })
}

/// Raw oracle response with directives
pub fn proposal_with(message: &str, patch: Value, directives: Value) -> Value {
    json!({
        "assistantMessage": message,
        "patch": patch,
        "controlSignal": "needsClarification",
        "directives": directives,
    })
}
