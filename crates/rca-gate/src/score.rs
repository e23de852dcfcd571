//! Deterministic stage scoring and Pareto ranking

use rca_artifact::text::normalize;
use rca_artifact::types::PrioritizationState;
use rca_artifact::Stage;
use serde::{Deserialize, Serialize};

/// Required values are scaled by this factor before computing coverage
const HEADROOM: f64 = 1.5;

/// One threshold measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Metric name
    pub name: String,
    /// Measured value
    pub current: usize,
    /// Required value
    pub required: usize,
    /// `min(current / (required * 1.5), 1)`
    pub coverage: f64,
}

impl Metric {
    /// Measure `current` against `required`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(name: &str, current: usize, required: usize) -> Self {
        let coverage = if required == 0 {
            1.0
        } else {
            (current as f64 / (required as f64 * HEADROOM)).min(1.0)
        };
        Self {
            name: name.to_string(),
            current,
            required,
            coverage,
        }
    }
}

/// Root with its weighted criterion total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRoot {
    /// Root text
    pub root: String,
    /// Sum of weight × value across criteria
    pub weighted: f64,
}

/// Weighted Pareto ranking of selected roots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoReport {
    /// Roots by descending weighted total
    pub ranking: Vec<RankedRoot>,
    /// The top ceil(critical share) roots
    pub top: Vec<String>,
    /// Critical roots outside the computed top
    pub outside_top: Vec<String>,
}

/// Derived evaluation written beside a final artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Evaluated stage
    pub stage: Stage,
    /// Per-metric breakdown
    pub metrics: Vec<Metric>,
    /// 0.0..=10.0, one decimal
    pub score: f64,
    /// Pareto ranking (prioritization with per-root scores only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pareto: Option<ParetoReport>,
}

impl Evaluation {
    /// Score `metrics` for `stage`
    #[must_use]
    pub fn new(stage: Stage, metrics: Vec<Metric>) -> Self {
        let score = score(&metrics);
        Self {
            stage,
            metrics,
            score,
            pareto: None,
        }
    }

    /// Builder: attach a Pareto report
    #[inline]
    #[must_use]
    pub fn with_pareto(mut self, pareto: Option<ParetoReport>) -> Self {
        self.pareto = pareto;
        self
    }
}

/// Ten times the mean coverage, rounded to one decimal
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(metrics: &[Metric]) -> f64 {
    if metrics.is_empty() {
        return 10.0;
    }
    let mean = metrics.iter().map(|m| m.coverage).sum::<f64>() / metrics.len() as f64;
    (mean * 100.0).round() / 10.0
}

/// Rank selected roots by weighted criterion totals
///
/// Returns `None` unless every selected root has a score row with one value
/// per criterion. Ties keep selection order.
#[must_use]
pub fn pareto(state: &PrioritizationState, top_count: usize) -> Option<ParetoReport> {
    if state.scores.is_empty() || state.criteria.is_empty() {
        return None;
    }
    let mut ranking = Vec::with_capacity(state.selected_roots.len());
    for root in &state.selected_roots {
        let key = normalize(root);
        let row = state.scores.iter().find(|s| normalize(&s.root) == key)?;
        if row.values.len() != state.criteria.len() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let weighted = state
            .criteria
            .iter()
            .zip(&row.values)
            .map(|(c, v)| c.weight as f64 * v)
            .sum();
        ranking.push(RankedRoot {
            root: root.clone(),
            weighted,
        });
    }
    ranking.sort_by(|a, b| b.weighted.total_cmp(&a.weighted));
    let top: Vec<String> = ranking.iter().take(top_count).map(|r| r.root.clone()).collect();
    let top_keys: Vec<String> = top.iter().map(|t| normalize(t)).collect();
    let outside_top = state
        .critical_roots
        .iter()
        .filter(|c| !top_keys.contains(&normalize(c)))
        .cloned()
        .collect();
    Some(ParetoReport {
        ranking,
        top,
        outside_top,
    })
}
