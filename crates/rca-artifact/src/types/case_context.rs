//! Case context (stage 0)

use crate::artifact::{private, StagePayload};
use crate::stage::Stage;
use crate::text::has_content;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sector, products/services and process focus of the case
///
/// Confirmation is terminal for the period and unlocks stage 1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseContext {
    /// Economic sector
    #[serde(default)]
    pub sector: String,
    /// One to three products or services
    #[serde(default)]
    pub products: Vec<String>,
    /// One to three process-focus areas
    #[serde(default)]
    pub process_focus: Vec<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CaseContext {
    /// Products with content
    #[must_use]
    pub fn filled_products(&self) -> Vec<&str> {
        filled(&self.products)
    }

    /// Process-focus areas with content
    #[must_use]
    pub fn filled_process_focus(&self) -> Vec<&str> {
        filled(&self.process_focus)
    }

    /// Names of the fields that are still empty
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !has_content(Some(&self.sector)) {
            missing.push("sector");
        }
        if self.filled_products().is_empty() {
            missing.push("products");
        }
        if self.filled_process_focus().is_empty() {
            missing.push("processFocus");
        }
        missing
    }
}

fn filled(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

impl private::Sealed for CaseContext {}

impl StagePayload for CaseContext {
    const STAGE: Stage = Stage::CaseContext;
}
