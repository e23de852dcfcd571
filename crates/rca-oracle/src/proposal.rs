//! Structured proposals returned by the oracle
//!
//! The JSON schema sent with every request is generated from [`Proposal`],
//! and every response is checked against it before any field is read.

use crate::error::OracleError;
use rca_artifact::types::Cursor;
use rca_artifact::Stage;
use rca_composition::Navigation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the conversation should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ControlSignal {
    /// More input is needed from the student
    NeedsClarification,
    /// The draft looks ready for validation
    ReadyToAdvance,
    /// The stage is complete
    Done,
}

/// Focus selection requested by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FocusTarget {
    /// Category to focus
    pub category_id: String,
    /// Main cause to drill into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_cause_id: Option<String>,
    /// Sub-cause being deepened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_cause_id: Option<String>,
}

impl From<&FocusTarget> for Cursor {
    fn from(target: &FocusTarget) -> Self {
        match (&target.main_cause_id, &target.sub_cause_id) {
            (Some(main), Some(sub)) => {
                Cursor::branch(target.category_id.clone(), main.clone()).with_sub_cause(sub.clone())
            }
            (Some(main), None) => Cursor::branch(target.category_id.clone(), main.clone()),
            (None, _) => Cursor::category(target.category_id.clone()),
        }
    }
}

/// Navigation directives that accompany a patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Directives {
    /// Close the focused cause-tree branch
    #[serde(default)]
    pub close_branch: bool,
    /// Student confirmed switching to held content
    #[serde(default)]
    pub confirm_branch_switch: bool,
    /// Student declined switching to held content
    #[serde(default)]
    pub decline_branch_switch: bool,
    /// Explicit focus selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusTarget>,
}

impl Directives {
    /// Focus machine input for these directives
    #[must_use]
    pub fn navigation(&self) -> Navigation {
        Navigation {
            close_branch: self.close_branch,
            confirm_switch: self.confirm_branch_switch,
            decline_switch: self.decline_branch_switch,
            focus: self.focus.as_ref().map(Cursor::from),
        }
    }
}

/// Validated oracle output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Reply shown to the student
    pub assistant_message: String,
    /// Partial payload for the active stage
    #[serde(default)]
    pub patch: Map<String, Value>,
    /// Next conversational step
    pub control_signal: ControlSignal,
    /// Navigation directives
    #[serde(default)]
    pub directives: Directives,
}

impl Proposal {
    /// Generic clarification request carrying no state change
    #[must_use]
    pub fn clarification(stage: Stage) -> Self {
        Self {
            assistant_message: format!(
                "I could not make sense of that for {}. Could you rephrase it or add a bit more detail?",
                stage.title().to_lowercase()
            ),
            patch: Map::new(),
            control_signal: ControlSignal::NeedsClarification,
            directives: Directives::default(),
        }
    }

    /// Patch as a JSON value
    #[must_use]
    pub fn patch_value(&self) -> Value {
        Value::Object(self.patch.clone())
    }

    /// Whether the proposal changes nothing
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.patch.is_empty() && self.directives == Directives::default()
    }
}

/// JSON schema every oracle response must satisfy
///
/// # Errors
/// Returns [`OracleError::Config`] if the schema cannot be rendered
pub fn proposal_schema() -> Result<Value, OracleError> {
    let root = schemars::schema_for!(Proposal);
    serde_json::to_value(root).map_err(|e| OracleError::Config(e.to_string()))
}
