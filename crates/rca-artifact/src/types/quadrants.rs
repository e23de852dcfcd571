//! FODA / SWOT quadrants (stage 2)

use crate::artifact::{private, StagePayload};
use crate::stage::Stage;
use crate::text::has_content;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One of the four buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Internal strength
    Strength,
    /// Internal weakness
    Weakness,
    /// External opportunity
    Opportunity,
    /// External threat
    Threat,
}

impl Quadrant {
    /// All buckets in display order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Strength,
        Quadrant::Weakness,
        Quadrant::Opportunity,
        Quadrant::Threat,
    ];

    /// External buckets require evidence
    #[inline]
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Quadrant::Opportunity | Quadrant::Threat)
    }

    /// Payload field name
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Quadrant::Strength => "strengths",
            Quadrant::Weakness => "weaknesses",
            Quadrant::Opportunity => "opportunities",
            Quadrant::Threat => "threats",
        }
    }
}

/// Bucket entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadrantItem {
    /// Statement
    pub text: String,
    /// Supporting evidence (required for external buckets)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuadrantItem {
    /// Item without evidence
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            evidence: None,
            extra: Map::new(),
        }
    }

    /// Builder: attach evidence
    #[must_use]
    pub fn with_evidence(mut self, evidence: &str) -> Self {
        self.evidence = Some(evidence.to_string());
        self
    }

    /// Whether the statement has content
    #[inline]
    #[must_use]
    pub fn has_text(&self) -> bool {
        has_content(Some(&self.text))
    }

    /// Whether evidence has content
    #[inline]
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        has_content(self.evidence.as_deref())
    }
}

/// Four internal/external buckets
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadrantState {
    /// Internal strengths
    #[serde(default)]
    pub strengths: Vec<QuadrantItem>,
    /// Internal weaknesses
    #[serde(default)]
    pub weaknesses: Vec<QuadrantItem>,
    /// External opportunities
    #[serde(default)]
    pub opportunities: Vec<QuadrantItem>,
    /// External threats
    #[serde(default)]
    pub threats: Vec<QuadrantItem>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuadrantState {
    /// Items of a bucket
    #[must_use]
    pub fn bucket(&self, quadrant: Quadrant) -> &[QuadrantItem] {
        match quadrant {
            Quadrant::Strength => &self.strengths,
            Quadrant::Weakness => &self.weaknesses,
            Quadrant::Opportunity => &self.opportunities,
            Quadrant::Threat => &self.threats,
        }
    }

    /// Items with content in a bucket
    #[must_use]
    pub fn filled(&self, quadrant: Quadrant) -> usize {
        self.bucket(quadrant).iter().filter(|i| i.has_text()).count()
    }
}

impl private::Sealed for QuadrantState {}

impl StagePayload for QuadrantState {
    const STAGE: Stage = Stage::Quadrants;
}
