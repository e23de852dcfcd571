//! Objectives (stage 6)

use crate::artifact::{private, StagePayload};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// General and specific objectives linked to critical roots
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectivesState {
    /// One general objective
    #[serde(default)]
    pub general_objective: String,
    /// At least three specific objectives
    #[serde(default)]
    pub specific_objectives: Vec<String>,
    /// Critical roots these objectives address
    #[serde(default)]
    pub linked_critical_roots: Vec<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectivesState {
    /// Specific objectives with content
    #[must_use]
    pub fn filled_specific(&self) -> usize {
        self.specific_objectives
            .iter()
            .filter(|o| !o.trim().is_empty())
            .count()
    }
}

impl private::Sealed for ObjectivesState {}

impl StagePayload for ObjectivesState {
    const STAGE: Stage = Stage::Objectives;
}
