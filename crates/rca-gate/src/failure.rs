//! Gate failure reasons
//!
//! Every variant names the condition that failed together with the current
//! and required values, so the conversation layer can phrase guidance.

use rca_artifact::{ArtifactError, Stage};

/// Why a stage could not be validated
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateFailure {
    /// The stage's upstream has no validated final artifact for the period
    #[error("{stage} cannot be validated: upstream {upstream} not finalized")]
    UpstreamNotFinalized { stage: Stage, upstream: Stage },

    /// A required field is blank
    #[error("{stage}: {field} is required")]
    MissingField { stage: Stage, field: &'static str },

    /// Too few items
    #[error("{stage}: {metric} has {current}, minimum {required}")]
    BelowMinimum {
        stage: Stage,
        metric: &'static str,
        current: usize,
        required: usize,
    },

    /// Too many items
    #[error("{stage}: {metric} has {current}, maximum {allowed}")]
    AboveMaximum {
        stage: Stage,
        metric: &'static str,
        current: usize,
        allowed: usize,
    },

    /// Item count must match exactly
    #[error("{stage}: {metric} must be exactly {required}, found {current}")]
    WrongCount {
        stage: Stage,
        metric: &'static str,
        current: usize,
        required: usize,
    },

    /// External quadrant items without evidence
    #[error("{stage}: {quadrant} items need evidence: {}", .items.join("; "))]
    MissingEvidence {
        stage: Stage,
        quadrant: &'static str,
        items: Vec<String>,
    },

    /// Categories with too few main causes
    #[error(
        "cause tree categories {} have fewer main causes than required (minimum {required})",
        .categories.join(", ")
    )]
    SparseCategories { categories: Vec<String>, required: usize },

    /// Main causes with too few sub-causes
    #[error(
        "cause tree main causes {} have fewer sub-causes than required (minimum {required})",
        .main_causes.join(", ")
    )]
    SparseMainCauses { main_causes: Vec<String>, required: usize },

    /// Ids repeated within one parent
    #[error("cause tree has duplicate ids: {}", .ids.join(", "))]
    DuplicateIds { ids: Vec<String> },

    /// Criterion weight out of bounds
    #[error("{stage}: criterion {name:?} has weight {weight}, allowed {min}..={max}")]
    WeightOutOfRange {
        stage: Stage,
        name: String,
        weight: i64,
        min: i64,
        max: i64,
    },

    /// Items not drawn from the set they must come from
    #[error("{stage}: {field} not found in {scope}: {}", .missing.join("; "))]
    NotSubset {
        stage: Stage,
        field: &'static str,
        scope: &'static str,
        missing: Vec<String>,
    },

    /// Draft or upstream payload does not parse
    #[error(transparent)]
    Payload(#[from] ArtifactError),
}

/// Error class of a [`GateFailure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Missing upstream final
    Lineage,
    /// Content below (or outside) configured bounds
    Threshold,
    /// Payload does not parse
    Shape,
}

impl GateFailure {
    /// Error class
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UpstreamNotFinalized { .. } => FailureKind::Lineage,
            Self::Payload(_) => FailureKind::Shape,
            _ => FailureKind::Threshold,
        }
    }

    pub(crate) fn below(stage: Stage, metric: &'static str, current: usize, required: usize) -> Self {
        Self::BelowMinimum {
            stage,
            metric,
            current,
            required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_counts() {
        let failure = GateFailure::below(Stage::Prioritization, "criticalRoots", 1, 3);
        assert_eq!(
            failure.to_string(),
            "stage 5 (Pareto prioritization): criticalRoots has 1, minimum 3"
        );
        assert_eq!(failure.kind(), FailureKind::Threshold);
    }

    #[test]
    fn sparse_categories_lists_labels() {
        let failure = GateFailure::SparseCategories {
            categories: vec!["Machine".into(), "Method".into()],
            required: 2,
        };
        let message = failure.to_string();
        assert!(message.contains("Machine, Method"));
        assert!(message.contains("minimum 2"));
    }

    #[test]
    fn lineage_is_its_own_kind() {
        let failure = GateFailure::UpstreamNotFinalized {
            stage: Stage::Objectives,
            upstream: Stage::Prioritization,
        };
        assert_eq!(failure.kind(), FailureKind::Lineage);
        assert!(failure.to_string().contains("not finalized"));
    }
}
