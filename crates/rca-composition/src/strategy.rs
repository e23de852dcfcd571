//! Merge strategy trait and core types
//!
//! Provides the [`MergeStrategy`] trait for combining a stored draft with an
//! incoming patch.

use rca_artifact::ArtifactError;
use serde::Serialize;
use serde_json::Value;

/// Merge strategy for one family of stage payloads
///
/// # Contract
/// All strategies must be deterministic, and must never remove structure
/// present in `base`.
pub trait MergeStrategy: Send + Sync + std::fmt::Debug {
    /// Combine `base` (JSON `null` when nothing is stored) with `patch`
    ///
    /// # Errors
    /// Returns [`MergeError`] if either side has the wrong shape
    fn merge(&self, base: &Value, patch: &Value) -> Result<Merged, MergeError>;

    /// Strategy name (for logging)
    fn name(&self) -> &'static str;
}

/// Merge output
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Resulting payload
    pub payload: Value,
    /// What changed
    pub report: MergeReport,
}

/// Counts of what a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Top-level or node fields overwritten by the patch
    pub fields_updated: usize,
    /// New categories
    pub categories_added: usize,
    /// New main causes
    pub main_causes_added: usize,
    /// New sub-causes
    pub sub_causes_added: usize,
    /// New why answers
    pub whys_added: usize,
    /// Why answers not appended because the chain was full
    pub whys_dropped: usize,
}

impl MergeReport {
    /// Whether the merge added any tree node or why
    #[inline]
    #[must_use]
    pub fn added_structure(&self) -> bool {
        self.categories_added + self.main_causes_added + self.sub_causes_added + self.whys_added > 0
    }

    /// Whether the merge changed nothing
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.fields_updated == 0 && !self.added_structure()
    }
}

/// Merge errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// Base or patch is not a JSON object
    #[error("{side} must be a JSON object")]
    NotAnObject {
        /// `"base"` or `"patch"`
        side: &'static str,
    },

    /// Payload does not parse for the stage
    #[error(transparent)]
    Payload(#[from] ArtifactError),
}

impl MergeError {
    /// Patch is not an object
    #[inline]
    #[must_use]
    pub fn patch_not_object() -> Self {
        Self::NotAnObject { side: "patch" }
    }

    /// Stored base is not an object
    #[inline]
    #[must_use]
    pub fn base_not_object() -> Self {
        Self::NotAnObject { side: "base" }
    }
}

/// Object view of a base payload, treating `null` as empty
pub(crate) fn base_object(base: &Value) -> Result<serde_json::Map<String, Value>, MergeError> {
    match base {
        Value::Null => Ok(serde_json::Map::new()),
        Value::Object(map) => Ok(map.clone()),
        _ => Err(MergeError::base_not_object()),
    }
}

/// Object view of a patch
pub(crate) fn patch_object(patch: &Value) -> Result<&serde_json::Map<String, Value>, MergeError> {
    patch.as_object().ok_or_else(MergeError::patch_not_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_noop() {
        assert!(MergeReport::default().is_noop());
        let report = MergeReport {
            whys_added: 1,
            ..MergeReport::default()
        };
        assert!(report.added_structure());
    }

    #[test]
    fn null_base_is_empty() {
        assert!(base_object(&Value::Null).unwrap().is_empty());
        assert!(base_object(&json!([1])).is_err());
        assert_eq!(patch_object(&json!(3)), Err(MergeError::patch_not_object()));
    }
}
