//! Stage gate: lineage, thresholds and scoring

use crate::checks;
use crate::failure::GateFailure;
use crate::linkage;
use crate::score::{pareto, Evaluation};
use crate::thresholds::Thresholds;
use rca_artifact::types::{
    CaseContext, CauseTree, IdeaList, ObjectivesState, PrioritizationState, ProductivityDraft,
    QuadrantState,
};
use rca_artifact::{ArtifactKind, Stage, StageArtifact, StagePayload};
use serde_json::Value;
use tracing::{debug, info};

/// Decides whether a draft may become a stage's final artifact
///
/// Pure: the caller supplies the draft payload and the upstream final (if
/// any) and decides what to persist.
#[derive(Debug, Clone, Default)]
pub struct StageGate {
    thresholds: Thresholds,
}

impl StageGate {
    /// Gate using `thresholds`
    #[inline]
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Configured thresholds
    #[inline]
    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Check lineage only
    ///
    /// # Errors
    /// [`GateFailure::UpstreamNotFinalized`] unless `upstream` is the
    /// validated final of the stage `stage` depends on
    pub fn check_lineage(&self, stage: Stage, upstream: Option<&StageArtifact>) -> Result<(), GateFailure> {
        let Some(required) = stage.upstream() else {
            return Ok(());
        };
        match upstream {
            Some(a) if a.stage() == required && a.kind() == ArtifactKind::Final && a.is_validated() => Ok(()),
            _ => Err(GateFailure::UpstreamNotFinalized {
                stage,
                upstream: required,
            }),
        }
    }

    /// Evaluate `draft` for `stage`
    ///
    /// Lineage is checked before any threshold, so a complete draft without
    /// a validated upstream still fails with the lineage reason.
    ///
    /// # Errors
    /// The first unmet condition as a [`GateFailure`]
    pub fn evaluate(
        &self,
        stage: Stage,
        draft: &Value,
        upstream: Option<&StageArtifact>,
    ) -> Result<Evaluation, GateFailure> {
        let result = self.evaluate_inner(stage, draft, upstream);
        match &result {
            Ok(evaluation) => info!("gate passed {} with score {}", stage, evaluation.score),
            Err(failure) => info!("gate rejected {}: {}", stage, failure),
        }
        result
    }

    fn evaluate_inner(
        &self,
        stage: Stage,
        draft: &Value,
        upstream: Option<&StageArtifact>,
    ) -> Result<Evaluation, GateFailure> {
        self.check_lineage(stage, upstream)?;
        let t = &self.thresholds;
        let metrics = match stage {
            Stage::CaseContext => checks::case_context(&CaseContext::from_payload(draft)?, t)?,
            Stage::Productivity => checks::productivity(&ProductivityDraft::from_payload(draft)?, t)?,
            Stage::Quadrants => checks::quadrants(&QuadrantState::from_payload(draft)?, t)?,
            Stage::Ideas => checks::ideas(&IdeaList::from_payload(draft)?, t)?,
            Stage::CauseTree => checks::cause_tree(&CauseTree::from_payload(draft)?, t)?,
            Stage::Prioritization => {
                let state = PrioritizationState::from_payload(draft)?;
                let tree = upstream_view::<CauseTree>(stage, upstream)?;
                let candidates = tree.root_candidates();
                let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
                let metrics = linkage::prioritization(&state, &texts, t)?;
                let top = t.critical_floor(state.selected_roots.len());
                let report = pareto(&state, top);
                if let Some(report) = &report {
                    debug!("pareto ranking: {} of critical roots outside top {}", report.outside_top.len(), top);
                }
                return Ok(Evaluation::new(stage, metrics).with_pareto(report));
            }
            Stage::Objectives => {
                let state = ObjectivesState::from_payload(draft)?;
                let upstream_state = upstream_view::<PrioritizationState>(stage, upstream)?;
                linkage::objectives(&state, &upstream_state.critical_roots, t)?
            }
        };
        Ok(Evaluation::new(stage, metrics))
    }
}

fn upstream_view<P: StagePayload>(stage: Stage, upstream: Option<&StageArtifact>) -> Result<P, GateFailure> {
    let artifact = upstream.ok_or(GateFailure::UpstreamNotFinalized {
        stage,
        upstream: P::STAGE,
    })?;
    Ok(artifact.typed::<P>()?)
}
