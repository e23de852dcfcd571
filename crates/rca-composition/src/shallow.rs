//! Field-level merge for flat stages

use crate::strategy::{base_object, patch_object, MergeError, MergeReport, MergeStrategy, Merged};
use serde_json::Value;

/// Top-level shallow merge
///
/// Incoming non-null fields replace the stored value; `null` or absent
/// fields keep it. Lists are replaced as a whole. Fields the patch does not
/// mention are preserved, known or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMergeStrategy;

impl ShallowMergeStrategy {
    /// Create new shallow strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MergeStrategy for ShallowMergeStrategy {
    fn merge(&self, base: &Value, patch: &Value) -> Result<Merged, MergeError> {
        let mut merged = base_object(base)?;
        let mut report = MergeReport::default();
        for (field, value) in patch_object(patch)? {
            if value.is_null() || merged.get(field) == Some(value) {
                continue;
            }
            merged.insert(field.clone(), value.clone());
            report.fields_updated += 1;
        }
        Ok(Merged {
            payload: Value::Object(merged),
            report,
        })
    }

    fn name(&self) -> &'static str {
        "shallow"
    }
}
