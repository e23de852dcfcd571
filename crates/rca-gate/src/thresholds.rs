//! Configurable stage minimums

use serde::{Deserialize, Serialize};

/// Minimum-content thresholds for every stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Most products or services in the case context
    pub max_products: usize,
    /// Most process-focus areas in the case context
    pub max_process_focus: usize,
    /// Items required in each quadrant
    pub min_quadrant_items: usize,
    /// Distinct ideas required
    pub min_ideas: usize,
    /// Categories required in the cause tree
    pub min_categories: usize,
    /// Main causes required per category
    pub min_main_causes: usize,
    /// Sub-causes required per main cause
    pub min_sub_causes: usize,
    /// Longest why-chain kept per sub-cause
    pub max_whys: usize,
    /// Why depth at which a sub-cause counts as deepened
    pub close_depth: usize,
    /// Root candidates required to finalize the cause tree
    pub min_root_candidates: usize,
    /// Fewest selected roots
    pub min_selected_roots: usize,
    /// Most selected roots
    pub max_selected_roots: usize,
    /// Number of weighted criteria
    pub criteria_count: usize,
    /// Lowest criterion weight
    pub min_weight: i64,
    /// Highest criterion weight
    pub max_weight: i64,
    /// Critical roots as a percentage of selected roots, rounded up
    pub critical_percent: usize,
    /// Specific objectives required
    pub min_specific_objectives: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_products: 3,
            max_process_focus: 3,
            min_quadrant_items: 3,
            min_ideas: 10,
            min_categories: 6,
            min_main_causes: 2,
            min_sub_causes: 1,
            max_whys: 5,
            close_depth: 3,
            min_root_candidates: 10,
            min_selected_roots: 10,
            max_selected_roots: 15,
            criteria_count: 3,
            min_weight: 1,
            max_weight: 10,
            critical_percent: 20,
            min_specific_objectives: 3,
        }
    }
}

impl Thresholds {
    /// Critical roots required for `selected` selected roots
    ///
    /// Integer ceiling of `critical_percent`% so that 15 roots need 3, not 4.
    #[inline]
    #[must_use]
    pub fn critical_floor(&self, selected: usize) -> usize {
        (selected * self.critical_percent).div_ceil(100)
    }

    /// Builder: set minimum idea count
    #[inline]
    #[must_use]
    pub fn with_min_ideas(mut self, min: usize) -> Self {
        self.min_ideas = min;
        self
    }

    /// Builder: set cause-tree minimums
    #[inline]
    #[must_use]
    pub fn with_tree_minimums(mut self, categories: usize, main_causes: usize, root_candidates: usize) -> Self {
        self.min_categories = categories;
        self.min_main_causes = main_causes;
        self.min_root_candidates = root_candidates;
        self
    }

    /// Builder: set selected-root bounds
    #[inline]
    #[must_use]
    pub fn with_selected_roots(mut self, min: usize, max: usize) -> Self {
        self.min_selected_roots = min;
        self.max_selected_roots = max;
        self
    }

    /// Reject inconsistent settings
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found
    pub fn validate(&self) -> Result<(), String> {
        if self.min_selected_roots > self.max_selected_roots {
            return Err(format!(
                "min_selected_roots ({}) exceeds max_selected_roots ({})",
                self.min_selected_roots, self.max_selected_roots
            ));
        }
        if self.min_weight < 1 || self.max_weight > 10 || self.min_weight > self.max_weight {
            return Err(format!(
                "criterion weights must lie within 1..=10, got {}..={}",
                self.min_weight, self.max_weight
            ));
        }
        if self.critical_percent == 0 || self.critical_percent > 100 {
            return Err(format!("critical_percent must be 1..=100, got {}", self.critical_percent));
        }
        if self.max_whys == 0 || self.close_depth == 0 || self.close_depth > self.max_whys {
            return Err(format!(
                "close_depth ({}) must be between 1 and max_whys ({})",
                self.close_depth, self.max_whys
            ));
        }
        if self.max_products == 0 || self.max_process_focus == 0 {
            return Err("case context maximums must be positive".to_string());
        }
        if self.criteria_count == 0 {
            return Err("criteria_count must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_floor_rounds_up() {
        let t = Thresholds::default();
        assert_eq!(t.critical_floor(12), 3);
        assert_eq!(t.critical_floor(10), 2);
        assert_eq!(t.critical_floor(15), 3);
        assert_eq!(t.critical_floor(0), 0);
    }

    #[test]
    fn defaults_are_consistent() {
        assert_eq!(Thresholds::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let t = Thresholds::default().with_selected_roots(16, 15);
        assert!(t.validate().unwrap_err().contains("min_selected_roots"));
        let t = Thresholds {
            max_weight: 11,
            ..Thresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let t: Thresholds = serde_json::from_str(r#"{"min_ideas": 4}"#).unwrap();
        assert_eq!(t.min_ideas, 4);
        assert_eq!(t.min_categories, 6);
    }
}
