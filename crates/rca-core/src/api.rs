//! Request and response shapes of the workflow service

use chrono::{DateTime, Utc};
use rca_artifact::{ArtifactStatus, OwnerId, PeriodKey, Stage, StageArtifact};
use rca_gate::Evaluation;
use rca_oracle::{ControlSignal, HistoryTurn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which draft an operation addresses
///
/// Without a period the current month is used. When nothing is stored at the
/// addressed key, the draft last written by `conversation_ref` is used, then
/// the most recent unfinished draft of the same owner and stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locator {
    /// Owner
    pub owner: OwnerId,
    /// Stage
    pub stage: Stage,
    /// Period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodKey>,
    /// Conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_ref: Option<String>,
}

impl Locator {
    /// Locator for the current period
    #[inline]
    #[must_use]
    pub fn new(owner: OwnerId, stage: Stage) -> Self {
        Self {
            owner,
            stage,
            period: None,
            conversation_ref: None,
        }
    }

    /// Builder: set period
    #[inline]
    #[must_use]
    pub fn with_period(mut self, period: PeriodKey) -> Self {
        self.period = Some(period);
        self
    }

    /// Builder: set conversation reference
    #[inline]
    #[must_use]
    pub fn with_conversation(mut self, conversation_ref: impl Into<String>) -> Self {
        self.conversation_ref = Some(conversation_ref.into());
        self
    }

    /// Same locator for another stage
    #[inline]
    #[must_use]
    pub fn for_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }
}

/// Stored draft as seen by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    /// Whether a draft was found
    pub exists: bool,
    /// Draft payload (`{}` when absent)
    pub payload: Value,
    /// Draft status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ArtifactStatus>,
    /// Last write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Period the draft belongs to
    pub period: PeriodKey,
}

impl StateView {
    pub(crate) fn of(artifact: Option<&StageArtifact>, period: PeriodKey) -> Self {
        match artifact {
            Some(a) => Self {
                exists: true,
                payload: a.payload.clone(),
                status: Some(a.status),
                updated_at: Some(a.updated_at),
                period,
            },
            None => Self {
                exists: false,
                payload: Value::Object(serde_json::Map::new()),
                status: None,
                updated_at: None,
                period,
            },
        }
    }
}

/// Result of a draft write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Always true; failures are errors
    pub saved: bool,
    /// Period written
    pub period: PeriodKey,
    /// Store version of the write
    pub version: u64,
    /// Payload after the merge
    pub payload: Value,
}

/// Result of a validation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether the stage passed its gate
    pub valid: bool,
    /// Outcome, naming the unmet condition on failure
    pub message: String,
    /// Final payload written
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_payload: Option<Value>,
    /// Derived score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Per-metric breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
}

impl ValidateResponse {
    pub(crate) fn rejected(message: String) -> Self {
        Self {
            valid: false,
            message,
            final_payload: None,
            score: None,
            evaluation: None,
        }
    }
}

/// One conversational turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Addressed draft
    pub locator: Locator,
    /// What the student said
    pub message: String,
    /// Earlier turns, oldest first
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

impl TurnRequest {
    /// Turn with no history
    #[must_use]
    pub fn new(locator: Locator, message: impl Into<String>) -> Self {
        Self {
            locator,
            message: message.into(),
            history: Vec::new(),
        }
    }

    /// Builder: set history
    #[must_use]
    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }
}

/// What the conversation layer should do after a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnAction {
    /// Keep collecting input
    Continue,
    /// The oracle output was unusable; ask the student to rephrase
    Clarify,
    /// Content for another category is held; ask whether to switch
    ConfirmBranchSwitch,
    /// Offer validation
    ReadyToAdvance,
    /// Stage complete
    Done,
}

impl From<ControlSignal> for TurnAction {
    fn from(signal: ControlSignal) -> Self {
        match signal {
            ControlSignal::NeedsClarification => Self::Continue,
            ControlSignal::ReadyToAdvance => Self::ReadyToAdvance,
            ControlSignal::Done => Self::Done,
        }
    }
}

/// State changes produced by a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnUpdates {
    /// Draft after the merge
    pub next_state: Value,
    /// Next step
    pub action: TurnAction,
}

/// Result of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    /// Reply for the student
    pub assistant_message: String,
    /// State changes
    pub updates: TurnUpdates,
    /// Whether the draft was written
    pub persisted: bool,
}

/// Per-stage pipeline position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    /// Stage
    pub stage: Stage,
    /// Stage title
    pub title: String,
    /// A draft exists
    pub draft: bool,
    /// A validated final exists
    pub validated: bool,
    /// Upstream not validated yet
    pub locked: bool,
    /// Final score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Pipeline status of one owner and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    /// Owner
    pub owner: OwnerId,
    /// Period
    pub period: PeriodKey,
    /// Every stage in order
    pub stages: Vec<StageStatus>,
}

impl PipelineStatus {
    /// First stage not yet validated
    #[must_use]
    pub fn next_stage(&self) -> Option<Stage> {
        self.stages.iter().find(|s| !s.validated).map(|s| s.stage)
    }
}
