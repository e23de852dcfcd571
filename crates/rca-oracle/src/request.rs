//! Request context sent to the oracle

use rca_artifact::types::{Cursor, TreeProgress};
use rca_artifact::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default number of history turns forwarded
pub const DEFAULT_HISTORY_WINDOW: usize = 8;

/// Who spoke a history turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The student
    Student,
    /// The guide
    Assistant,
}

/// One earlier turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTurn {
    /// Speaker
    pub speaker: Speaker,
    /// What was said
    pub text: String,
}

impl HistoryTurn {
    /// Student turn
    #[must_use]
    pub fn student(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Student,
            text: text.into(),
        }
    }

    /// Assistant turn
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Everything the oracle sees for one turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    /// Active stage
    pub stage: Stage,
    /// Active stage title
    pub stage_title: &'static str,
    /// Current draft payload (`{}` when nothing is stored)
    pub draft: Value,
    /// Most recent turns, oldest first
    pub history: Vec<HistoryTurn>,
    /// Validated upstream payloads by stage slug
    pub upstream: BTreeMap<&'static str, Value>,
    /// What the student just said
    pub utterance: String,
    /// Cause-tree focus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
    /// Cause-tree progress summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<TreeProgress>,
    /// Schema the response must satisfy
    pub response_schema: Value,
}

impl OracleRequest {
    /// Request for `stage` with the student's utterance
    #[must_use]
    pub fn new(stage: Stage, utterance: impl Into<String>) -> Self {
        Self {
            stage,
            stage_title: stage.title(),
            draft: Value::Object(serde_json::Map::new()),
            history: Vec::new(),
            upstream: BTreeMap::new(),
            utterance: utterance.into(),
            cursor: None,
            progress: None,
            response_schema: Value::Null,
        }
    }

    /// Builder: set draft
    #[inline]
    #[must_use]
    pub fn with_draft(mut self, draft: Value) -> Self {
        self.draft = draft;
        self
    }

    /// Builder: keep the last `window` turns of `history`
    #[must_use]
    pub fn with_history(mut self, history: &[HistoryTurn], window: usize) -> Self {
        let start = history.len().saturating_sub(window);
        self.history = history[start..].to_vec();
        self
    }

    /// Builder: add a validated upstream payload
    #[inline]
    #[must_use]
    pub fn with_upstream(mut self, stage: Stage, payload: Value) -> Self {
        self.upstream.insert(stage.slug(), payload);
        self
    }

    /// Builder: set cause-tree focus and progress
    #[inline]
    #[must_use]
    pub fn with_tree_state(mut self, cursor: Option<Cursor>, progress: TreeProgress) -> Self {
        self.cursor = cursor;
        self.progress = Some(progress);
        self
    }

    /// Builder: set response schema
    #[inline]
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = schema;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_window_keeps_latest_turns() {
        let history: Vec<_> = (0..12).map(|i| HistoryTurn::student(format!("turn {i}"))).collect();
        let request = OracleRequest::new(Stage::Ideas, "hi").with_history(&history, 8);
        assert_eq!(request.history.len(), 8);
        assert_eq!(request.history[0].text, "turn 4");
    }

    #[test]
    fn serializes_camel_case_with_upstream_slugs() {
        let request = OracleRequest::new(Stage::Prioritization, "pick these")
            .with_upstream(Stage::CauseTree, json!({"categories": []}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stage"], json!(5));
        assert_eq!(value["stageTitle"], json!("Pareto prioritization"));
        assert!(value["upstream"]["cause_tree"].is_object());
        assert!(value.get("cursor").is_none());
    }
}
