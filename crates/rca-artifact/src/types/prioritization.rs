//! Pareto prioritization (stage 5)

use crate::artifact::{private, StagePayload};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Weighted criterion
///
/// The weight is kept as a signed integer so out-of-range input (0, 11,
/// negatives) reaches the validator instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Criterion name
    pub name: String,
    /// Weight, valid range 1..=10
    pub weight: i64,
}

impl Criterion {
    /// New criterion
    #[must_use]
    pub fn new(name: &str, weight: i64) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }
}

/// Per-root scores against each criterion, in criteria order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootScore {
    /// Root text (one of the selected roots)
    pub root: String,
    /// One value per criterion
    pub values: Vec<f64>,
}

/// 80/20 selection state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationState {
    /// Subset of the upstream root-candidate set
    #[serde(default)]
    pub selected_roots: Vec<String>,
    /// Exactly three weighted criteria
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    /// Externally computed top ~20% of the selected roots
    #[serde(default)]
    pub critical_roots: Vec<String>,
    /// Optional scoring matrix behind the critical roots
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<RootScore>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl private::Sealed for PrioritizationState {}

impl StagePayload for PrioritizationState {
    const STAGE: Stage = Stage::Prioritization;
}
