//! Prioritization and objective linkage
//!
//! Both stages draw their items from a validated upstream artifact. The
//! containment chain is `critical ⊆ selected ⊆ root candidates` for
//! prioritization and `linked ⊆ critical` for objectives. Items are
//! compared by normalised text.

use crate::failure::GateFailure;
use crate::score::Metric;
use crate::thresholds::Thresholds;
use rca_artifact::text::{has_content, normalize};
use rca_artifact::types::{ObjectivesState, PrioritizationState};
use rca_artifact::Stage;
use std::collections::HashSet;
use tracing::debug;

/// Non-blank items, de-duplicated by normalised text
fn distinct(items: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(normalize(s)))
        .collect()
}

/// Items of `items` absent from `scope`
fn outside<'a>(items: &[&'a str], scope: &[&str]) -> Vec<String> {
    let scope: HashSet<String> = scope.iter().map(|s| normalize(s)).collect();
    items
        .iter()
        .filter(|i| !scope.contains(&normalize(i)))
        .map(|i| (*i).to_string())
        .collect()
}

/// Validate the Pareto selection against the upstream root candidates
///
/// Order: selected count, selected ⊆ candidates, criteria count, weights,
/// critical floor, critical ⊆ selected.
pub fn prioritization(
    state: &PrioritizationState,
    candidates: &[&str],
    t: &Thresholds,
) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::Prioritization;
    let selected = distinct(&state.selected_roots);
    if selected.len() < t.min_selected_roots {
        return Err(GateFailure::below(STAGE, "selectedRoots", selected.len(), t.min_selected_roots));
    }
    if selected.len() > t.max_selected_roots {
        return Err(GateFailure::AboveMaximum {
            stage: STAGE,
            metric: "selectedRoots",
            current: selected.len(),
            allowed: t.max_selected_roots,
        });
    }
    let missing = outside(&selected, candidates);
    if !missing.is_empty() {
        return Err(GateFailure::NotSubset {
            stage: STAGE,
            field: "selectedRoots",
            scope: "root candidates",
            missing,
        });
    }
    if state.criteria.len() != t.criteria_count {
        return Err(GateFailure::WrongCount {
            stage: STAGE,
            metric: "criteria",
            current: state.criteria.len(),
            required: t.criteria_count,
        });
    }
    if let Some(bad) = state
        .criteria
        .iter()
        .find(|c| !(t.min_weight..=t.max_weight).contains(&c.weight))
    {
        return Err(GateFailure::WeightOutOfRange {
            stage: STAGE,
            name: bad.name.clone(),
            weight: bad.weight,
            min: t.min_weight,
            max: t.max_weight,
        });
    }
    let critical = distinct(&state.critical_roots);
    let floor = t.critical_floor(selected.len());
    if critical.len() < floor {
        return Err(GateFailure::below(STAGE, "criticalRoots", critical.len(), floor));
    }
    let missing = outside(&critical, &selected);
    if !missing.is_empty() {
        return Err(GateFailure::NotSubset {
            stage: STAGE,
            field: "criticalRoots",
            scope: "selected roots",
            missing,
        });
    }
    debug!(
        "prioritization linkage holds: {} critical of {} selected of {} candidates",
        critical.len(),
        selected.len(),
        candidates.len()
    );
    Ok(vec![
        Metric::new("selectedRoots", selected.len(), t.min_selected_roots),
        Metric::new("criteria", state.criteria.len(), t.criteria_count),
        Metric::new("criticalRoots", critical.len(), floor),
    ])
}

/// Validate objectives against the validated prioritization's critical roots
pub fn objectives(
    state: &ObjectivesState,
    critical_roots: &[String],
    t: &Thresholds,
) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::Objectives;
    if !has_content(Some(&state.general_objective)) {
        return Err(GateFailure::MissingField {
            stage: STAGE,
            field: "generalObjective",
        });
    }
    let specific = state.filled_specific();
    if specific < t.min_specific_objectives {
        return Err(GateFailure::below(STAGE, "specificObjectives", specific, t.min_specific_objectives));
    }
    let linked = distinct(&state.linked_critical_roots);
    if linked.is_empty() {
        return Err(GateFailure::below(STAGE, "linkedCriticalRoots", 0, 1));
    }
    let critical = distinct(critical_roots);
    let missing = outside(&linked, &critical);
    if !missing.is_empty() {
        return Err(GateFailure::NotSubset {
            stage: STAGE,
            field: "linkedCriticalRoots",
            scope: "critical roots",
            missing,
        });
    }
    Ok(vec![
        Metric::new("specificObjectives", specific, t.min_specific_objectives),
        Metric::new("linkedCriticalRoots", linked.len(), critical.len()),
    ])
}
