//! Baseline productivity (stage 1)

use crate::artifact::{private, StagePayload};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cost item names offered by default, in display order
pub const DEFAULT_COST_ITEMS: [&str; 5] = ["materials", "labor", "energy", "overhead", "other"];

/// How productivity is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// Income over cost
    Monetary,
    /// Output units over input units
    Physical,
}

/// Named cost line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostItem {
    /// Item name
    pub name: String,
    /// Amount for the period, if captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CostItem {
    /// Item without an amount
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: None,
            extra: Map::new(),
        }
    }
}

/// Productivity draft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityDraft {
    /// Chosen unit type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<UnitType>,
    /// Why the unit type fits the case
    #[serde(default)]
    pub justification: String,
    /// Period the figures refer to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_key: Option<String>,
    /// Income for the period (monetary)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    /// Fixed list of cost lines
    #[serde(default)]
    pub cost_items: Vec<CostItem>,
    /// Output units (physical)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_output: Option<f64>,
    /// Input units (physical)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_input: Option<f64>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductivityDraft {
    /// Draft pre-populated with [`DEFAULT_COST_ITEMS`]
    #[must_use]
    pub fn with_default_items() -> Self {
        Self {
            cost_items: DEFAULT_COST_ITEMS.iter().map(|n| CostItem::named(n)).collect(),
            ..Self::default()
        }
    }

    /// Sum of captured amounts, `None` when no item has an amount
    #[must_use]
    pub fn total_cost(&self) -> Option<f64> {
        let amounts: Vec<f64> = self.cost_items.iter().filter_map(|i| i.amount).collect();
        if amounts.is_empty() {
            None
        } else {
            Some(amounts.iter().sum())
        }
    }

    /// Productivity ratio for the chosen unit type
    ///
    /// Monetary: `income / total_cost`. Physical: `output / input`.
    /// `None` when an operand is missing or the denominator is not positive.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        let (numerator, denominator) = match self.unit_type? {
            UnitType::Monetary => (self.income?, self.total_cost()?),
            UnitType::Physical => (self.physical_output?, self.physical_input?),
        };
        (denominator > 0.0).then(|| numerator / denominator)
    }
}

impl private::Sealed for ProductivityDraft {}

impl StagePayload for ProductivityDraft {
    const STAGE: Stage = Stage::Productivity;
}
