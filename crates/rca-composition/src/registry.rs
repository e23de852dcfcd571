//! Strategy registry
//!
//! Provides [`StrategyRegistry`], which picks the merge strategy for a stage
//! and serves as the store's merge-on-write hook.

use crate::shallow::ShallowMergeStrategy;
use crate::strategy::{MergeError, MergeStrategy, Merged};
use crate::tree::TreeMergeStrategy;
use rca_artifact::types::{
    CaseContext, CauseTree, IdeaList, ObjectivesState, PrioritizationState, ProductivityDraft,
    QuadrantState,
};
use rca_artifact::{ArtifactError, PayloadMerge, Stage, StagePayload};
use serde_json::Value;

/// Stage → strategy mapping
///
/// - cause tree → [`TreeMergeStrategy`]
/// - every flat stage → [`ShallowMergeStrategy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyRegistry {
    tree: TreeMergeStrategy,
    flat: ShallowMergeStrategy,
}

impl StrategyRegistry {
    /// Registry with the given cause-tree strategy
    #[inline]
    #[must_use]
    pub fn new(tree: TreeMergeStrategy) -> Self {
        Self {
            tree,
            flat: ShallowMergeStrategy,
        }
    }

    /// Strategy for a stage
    #[must_use]
    pub fn for_stage(&self, stage: Stage) -> &dyn MergeStrategy {
        if stage.is_structured() {
            &self.tree
        } else {
            &self.flat
        }
    }

    /// Cause-tree strategy
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &TreeMergeStrategy {
        &self.tree
    }

    /// Merge and check the result parses for the stage
    ///
    /// # Errors
    /// Returns [`MergeError`] if either side is malformed or the result does
    /// not parse as the stage's payload
    pub fn merge(&self, stage: Stage, base: Option<&Value>, patch: &Value) -> Result<Merged, MergeError> {
        let strategy = self.for_stage(stage);
        let merged = strategy.merge(base.unwrap_or(&Value::Null), patch)?;
        check_shape(stage, &merged.payload)?;
        tracing::debug!("{} merge for {}: {:?}", strategy.name(), stage, merged.report);
        Ok(merged)
    }
}

impl PayloadMerge for StrategyRegistry {
    fn merge_payload(
        &self,
        stage: Stage,
        base: Option<&Value>,
        patch: &Value,
    ) -> Result<Value, ArtifactError> {
        self.merge(stage, base, patch)
            .map(|m| m.payload)
            .map_err(|e| match e {
                MergeError::Payload(inner) => inner,
                other => ArtifactError::Merge {
                    stage,
                    message: other.to_string(),
                },
            })
    }
}

/// Parse `payload` as the stage's typed view
///
/// # Errors
/// Returns [`ArtifactError::Shape`] if it does not parse
pub fn check_shape(stage: Stage, payload: &Value) -> Result<(), ArtifactError> {
    match stage {
        Stage::CaseContext => CaseContext::from_payload(payload).map(drop),
        Stage::Productivity => ProductivityDraft::from_payload(payload).map(drop),
        Stage::Quadrants => QuadrantState::from_payload(payload).map(drop),
        Stage::Ideas => IdeaList::from_payload(payload).map(drop),
        Stage::CauseTree => CauseTree::from_payload(payload).map(drop),
        Stage::Prioritization => PrioritizationState::from_payload(payload).map(drop),
        Stage::Objectives => ObjectivesState::from_payload(payload).map(drop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_tree_for_cause_tree_only() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.for_stage(Stage::CauseTree).name(), "tree");
        for stage in Stage::iter().filter(|s| !s.is_structured()) {
            assert_eq!(registry.for_stage(stage).name(), "shallow");
        }
    }

    #[test]
    fn rejects_merge_that_breaks_stage_shape() {
        let registry = StrategyRegistry::default();
        let result = registry.merge_payload(Stage::Ideas, None, &json!({"ideas": "not a list"}));
        assert!(matches!(result, Err(ArtifactError::Shape { stage: Stage::Ideas, .. })));
    }

    #[test]
    fn non_object_patch_maps_to_merge_error() {
        let registry = StrategyRegistry::default();
        let result = registry.merge_payload(Stage::Quadrants, None, &json!([]));
        assert!(matches!(result, Err(ArtifactError::Merge { .. })));
    }
}
