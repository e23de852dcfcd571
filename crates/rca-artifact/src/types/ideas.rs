//! Idea brainstorm (stage 3)

use crate::artifact::{private, StagePayload};
use crate::stage::Stage;
use crate::text::{collapse_whitespace, normalize};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Brainstormed idea, accepted as a bare string or `{text}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IdeaRepr")]
pub struct Idea {
    /// Idea text
    pub text: String,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdeaRepr {
    Text(String),
    Object {
        #[serde(default)]
        text: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<IdeaRepr> for Idea {
    fn from(repr: IdeaRepr) -> Self {
        match repr {
            IdeaRepr::Text(text) => Idea {
                text,
                extra: Map::new(),
            },
            IdeaRepr::Object { text, extra } => Idea { text, extra },
        }
    }
}

impl Idea {
    /// Idea with the given text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// Problem statement plus free-text ideas
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaList {
    /// Problem the ideas address
    #[serde(default)]
    pub problem_statement: String,
    /// Ideas in capture order
    #[serde(default)]
    pub ideas: Vec<Idea>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdeaList {
    /// Non-blank ideas, de-duplicated by normalised text
    #[must_use]
    pub fn distinct_ideas(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.ideas
            .iter()
            .map(|i| collapse_whitespace(&i.text))
            .filter(|t| !t.is_empty() && seen.insert(normalize(t)))
            .collect()
    }
}

impl private::Sealed for IdeaList {}

impl StagePayload for IdeaList {
    const STAGE: Stage = Stage::Ideas;
}
