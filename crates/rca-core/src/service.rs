//! Workflow service
//!
//! Ties the store, the oracle adapter, the merge engine and the gate into
//! the four request types the conversation layer issues: read a draft,
//! write a draft, run a guided turn, validate a stage. Each request is
//! independent; all durable state lives in the store.

use crate::api::{
    Locator, PipelineStatus, SaveResponse, StageStatus, StateView, TurnAction, TurnRequest,
    TurnResponse, TurnUpdates, ValidateResponse,
};
use crate::config::RcaConfig;
use crate::error::RcaError;
use chrono::Utc;
use rca_artifact::types::CauseTree;
use rca_artifact::{
    ArtifactKey, ArtifactKind, ArtifactStatus, OwnerId, PeriodKey, Stage, StageArtifact, StagePayload,
};
use rca_composition::{check_shape, FocusMachine, StrategyRegistry};
use rca_gate::{FailureKind, StageGate};
use rca_oracle::{Oracle, OracleAdapter, OracleRequest};
use rca_store::{ArtifactStore, ArtifactWrite};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Where a locator resolved to
#[derive(Debug)]
struct Resolved {
    key: ArtifactKey,
    artifact: Option<StageArtifact>,
}

/// Staged root-cause-analysis workflow
pub struct WorkflowService<S, O> {
    store: S,
    adapter: OracleAdapter<O>,
    gate: StageGate,
    registry: StrategyRegistry,
    focus: FocusMachine,
    history_window: usize,
}

impl<S, O> std::fmt::Debug for WorkflowService<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService")
            .field("adapter", &self.adapter)
            .field("gate", &self.gate)
            .field("history_window", &self.history_window)
            .finish_non_exhaustive()
    }
}

impl<S: ArtifactStore, O: Oracle> WorkflowService<S, O> {
    /// Create service
    ///
    /// # Errors
    /// Returns [`RcaError::Config`] if `config` is inconsistent
    pub fn new(store: S, oracle: O, config: &RcaConfig) -> Result<Self, RcaError> {
        config.validate()?;
        let adapter = OracleAdapter::new(oracle, &config.oracle).map_err(|e| RcaError::Config(e.to_string()))?;
        let registry = config.registry();
        Ok(Self {
            store,
            adapter,
            gate: StageGate::new(config.thresholds.clone()),
            registry,
            focus: FocusMachine::new(config.focus_limits(), *registry.tree()),
            history_window: config.oracle.history_window,
        })
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Oracle adapter
    #[inline]
    #[must_use]
    pub fn adapter(&self) -> &OracleAdapter<O> {
        &self.adapter
    }

    /// Read the addressed draft
    ///
    /// # Errors
    /// Returns [`RcaError::Storage`] if the store fails
    pub async fn get_state(&self, locator: &Locator) -> Result<StateView, RcaError> {
        let resolved = self.resolve(locator).await?;
        Ok(StateView::of(resolved.artifact.as_ref(), resolved.key.period))
    }

    /// Merge `patch` into the addressed draft
    ///
    /// # Errors
    /// - [`RcaError::InputShape`] if `patch` is not a payload for the stage
    /// - [`RcaError::StageLocked`] if the case context is already confirmed
    /// - [`RcaError::Storage`] if the store fails
    pub async fn save_state(&self, locator: &Locator, patch: Value) -> Result<SaveResponse, RcaError> {
        if !patch.is_object() {
            return Err(RcaError::input(format!("{}: patch must be a JSON object", locator.stage)));
        }
        check_shape(locator.stage, &patch)?;
        let resolved = self.resolve(locator).await?;
        self.ensure_open(&resolved.key).await?;
        let write = ArtifactWrite::new(resolved.key.clone(), patch).with_conversation_ref(locator.conversation_ref.clone());
        let stored = self.store.put(write, &self.registry).await?;
        tracing::info!("Saved draft {} (v{})", stored.key, stored.version);
        Ok(SaveResponse {
            saved: true,
            period: stored.key.period.clone(),
            version: stored.version,
            payload: stored.payload,
        })
    }

    /// Run one guided turn
    ///
    /// The oracle's proposal is merged into the stored draft and the merged
    /// draft is returned. An unusable proposal persists nothing and asks for
    /// clarification.
    ///
    /// # Errors
    /// - [`RcaError::Lineage`] if the upstream stage is not finalized
    /// - [`RcaError::StageLocked`] if the case context is already confirmed
    /// - [`RcaError::Storage`] if the store fails
    pub async fn turn(&self, request: TurnRequest) -> Result<TurnResponse, RcaError> {
        let locator = &request.locator;
        let stage = locator.stage;
        let resolved = self.resolve(locator).await?;
        self.ensure_open(&resolved.key).await?;
        let upstream = self.upstream_final(&resolved.key).await?;
        self.gate.check_lineage(stage, upstream.as_ref())?;

        let draft = resolved
            .artifact
            .as_ref()
            .map_or_else(|| json!({}), |a| a.payload.clone());
        let mut oracle_request = OracleRequest::new(stage, request.message.as_str())
            .with_draft(draft.clone())
            .with_history(&request.history, self.history_window);
        for (upstream_stage, payload) in self.upstream_context(&resolved.key).await? {
            oracle_request = oracle_request.with_upstream(upstream_stage, payload);
        }
        let base_tree = if stage == Stage::CauseTree {
            let tree = CauseTree::from_payload(&draft)?;
            oracle_request = oracle_request.with_tree_state(tree.cursor.clone(), tree.progress());
            Some(tree)
        } else {
            None
        };

        let outcome = self.adapter.propose(oracle_request).await;
        if outcome.is_fallback() {
            tracing::warn!("Turn on {} fell back to clarification; draft unchanged", resolved.key);
            return Ok(TurnResponse {
                assistant_message: outcome.proposal.assistant_message,
                updates: TurnUpdates {
                    next_state: draft,
                    action: TurnAction::Clarify,
                },
                persisted: false,
            });
        }
        let proposal = outcome.proposal;
        let mut action = TurnAction::from(proposal.control_signal);

        let patch = match base_tree {
            Some(_) if proposal.is_inert() => None,
            Some(base) => {
                let incoming = CauseTree::from_payload(&proposal.patch_value())?;
                let step = self
                    .focus
                    .step(&base, incoming, &proposal.directives.navigation())
                    .map_err(|e| RcaError::input(e.to_string()))?;
                if step.awaits_switch_confirmation() {
                    action = TurnAction::ConfirmBranchSwitch;
                }
                Some(step.patch)
            }
            None if proposal.patch.is_empty() => None,
            None => Some(proposal.patch_value()),
        };

        let Some(patch) = patch else {
            return Ok(TurnResponse {
                assistant_message: proposal.assistant_message,
                updates: TurnUpdates {
                    next_state: draft,
                    action,
                },
                persisted: false,
            });
        };
        let write = ArtifactWrite::new(resolved.key.clone(), patch).with_conversation_ref(locator.conversation_ref.clone());
        let stored = self.store.put(write, &self.registry).await?;
        tracing::info!("Turn merged into {} (v{}), action {:?}", stored.key, stored.version, action);
        Ok(TurnResponse {
            assistant_message: proposal.assistant_message,
            updates: TurnUpdates {
                next_state: stored.payload,
                action,
            },
            persisted: true,
        })
    }

    /// Validate the addressed draft and write its final artifact
    ///
    /// Re-validation re-checks the current draft and overwrites the final.
    /// The final and its evaluation record are committed together or not
    /// at all.
    ///
    /// # Errors
    /// - [`RcaError::InputShape`] if the draft does not parse
    /// - [`RcaError::Storage`] if the store fails
    ///
    /// Unmet thresholds and missing upstream finals are reported through
    /// `valid: false`, not as errors.
    pub async fn validate(&self, locator: &Locator) -> Result<ValidateResponse, RcaError> {
        let stage = locator.stage;
        let resolved = self.resolve(locator).await?;
        let draft = resolved
            .artifact
            .as_ref()
            .map_or_else(|| json!({}), |a| a.payload.clone());
        let upstream = self.upstream_final(&resolved.key).await?;

        let evaluation = match self.gate.evaluate(stage, &draft, upstream.as_ref()) {
            Ok(evaluation) => evaluation,
            Err(failure) if failure.kind() == FailureKind::Shape => return Err(failure.into()),
            Err(failure) => return Ok(ValidateResponse::rejected(failure.to_string())),
        };

        let period = resolved.key.period.clone();
        let final_key = ArtifactKey::final_of(&locator.owner, stage, &period);
        let evaluation_key = ArtifactKey::evaluation(&locator.owner, stage, &period);
        let record = json!({
            "id": ulid::Ulid::new().to_string(),
            "evaluatedAt": Utc::now(),
            "draftRevision": resolved.artifact.as_ref().map(|a| a.revision),
            "evaluation": evaluation,
        });
        let writes = vec![
            ArtifactWrite::new(final_key, draft.clone())
                .with_status(ArtifactStatus::Validated)
                .with_score(evaluation.score)
                .with_conversation_ref(locator.conversation_ref.clone()),
            ArtifactWrite::new(evaluation_key, record)
                .with_status(ArtifactStatus::Validated)
                .with_score(evaluation.score)
                .with_conversation_ref(locator.conversation_ref.clone()),
        ];
        let written = self.store.commit(writes).await?;
        tracing::info!("Validated {} for {} (score {})", stage, period, evaluation.score);
        Ok(ValidateResponse {
            valid: true,
            message: format!("{} validated with score {:.1}", stage.title(), evaluation.score),
            final_payload: written.into_iter().next().map(|a| a.payload),
            score: Some(evaluation.score),
            evaluation: Some(evaluation),
        })
    }

    /// Pipeline position of every stage for a period
    ///
    /// # Errors
    /// Returns [`RcaError::Storage`] if the store fails
    pub async fn status(&self, owner: &OwnerId, period: &PeriodKey) -> Result<PipelineStatus, RcaError> {
        let records = self.store.list(owner, period).await?;
        let by_key: HashMap<(Stage, ArtifactKind), &StageArtifact> =
            records.iter().map(|a| ((a.stage(), a.kind()), a)).collect();
        let validated = |stage: Stage| {
            by_key
                .get(&(stage, ArtifactKind::Final))
                .is_some_and(|a| a.is_validated())
        };
        let stages = Stage::iter()
            .map(|stage| StageStatus {
                stage,
                title: stage.title().to_string(),
                draft: by_key.contains_key(&(stage, ArtifactKind::Draft)),
                validated: validated(stage),
                locked: stage.upstream().is_some_and(|up| !validated(up)),
                score: by_key
                    .get(&(stage, ArtifactKind::Final))
                    .and_then(|a| a.score),
            })
            .collect();
        Ok(PipelineStatus {
            owner: owner.clone(),
            period: period.clone(),
            stages,
        })
    }

    /// Resolve a locator to a draft key and whatever is stored there
    ///
    /// Order: exact key, draft last written by the conversation, most recent
    /// draft whose stage is not yet finalized for its period, then a fresh
    /// key for the requested period.
    async fn resolve(&self, locator: &Locator) -> Result<Resolved, RcaError> {
        let period = locator
            .period
            .clone()
            .unwrap_or_else(|| PeriodKey::for_date(Utc::now().date_naive()));
        let key = ArtifactKey::draft(&locator.owner, locator.stage, &period);
        if let Some(found) = self.store.get(&key).await? {
            return Ok(Resolved {
                key,
                artifact: Some(found),
            });
        }
        if let Some(conversation) = &locator.conversation_ref {
            let found = self
                .store
                .find_by_conversation(&locator.owner, locator.stage, ArtifactKind::Draft, conversation)
                .await?;
            if let Some(found) = found {
                tracing::debug!("Resolved {} by conversation {}", found.key, conversation);
                return Ok(Resolved {
                    key: found.key.clone(),
                    artifact: Some(found),
                });
            }
        }
        let latest = self
            .store
            .latest_across_periods(&locator.owner, locator.stage, ArtifactKind::Draft)
            .await?;
        if let Some(found) = latest {
            let finished = self
                .store
                .get(&found.key.with_kind(ArtifactKind::Final))
                .await?
                .is_some_and(|f| f.is_validated());
            if !finished {
                tracing::info!("No draft at {}, resuming {}", key, found.key);
                return Ok(Resolved {
                    key: found.key.clone(),
                    artifact: Some(found),
                });
            }
        }
        Ok(Resolved { key, artifact: None })
    }

    /// Refuse writes to a confirmed case context
    async fn ensure_open(&self, key: &ArtifactKey) -> Result<(), RcaError> {
        if key.stage != Stage::CaseContext {
            return Ok(());
        }
        let confirmed = self
            .store
            .get(&key.with_kind(ArtifactKind::Final))
            .await?
            .is_some_and(|f| f.is_validated());
        if confirmed {
            return Err(RcaError::StageLocked {
                stage: key.stage,
                reason: format!("case context already confirmed for {}", key.period),
            });
        }
        Ok(())
    }

    /// Validated final of the stage `key` depends on, same period
    async fn upstream_final(&self, key: &ArtifactKey) -> Result<Option<StageArtifact>, RcaError> {
        let Some(upstream) = key.stage.upstream() else {
            return Ok(None);
        };
        let found = self
            .store
            .get(&ArtifactKey::final_of(&key.owner, upstream, &key.period))
            .await?;
        Ok(found.filter(StageArtifact::is_validated))
    }

    /// Validated finals of every earlier stage, same period
    async fn upstream_context(&self, key: &ArtifactKey) -> Result<Vec<(Stage, Value)>, RcaError> {
        let records = self.store.list(&key.owner, &key.period).await?;
        Ok(records
            .into_iter()
            .filter(|a| a.kind() == ArtifactKind::Final && a.is_validated() && a.stage() < key.stage)
            .map(|a| (a.stage(), a.payload))
            .collect())
    }
}
