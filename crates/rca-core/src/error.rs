//! Error types for the workflow service
//!
//! Classes:
//! - input shape: the request is malformed, nothing was touched
//! - lineage: the upstream stage is not finalized for the period
//! - threshold: stage content is below the configured minimums
//! - storage: the store failed; the request wrote nothing
//! - stage locked: the stage is closed for the period
//! - config: settings are unusable

use rca_artifact::{ArtifactError, Stage};
use rca_gate::{FailureKind, GateFailure};
use rca_store::StoreError;

/// Main workflow error type
#[derive(Debug, thiserror::Error)]
pub enum RcaError {
    /// Malformed request payload
    #[error("invalid input: {0}")]
    InputShape(String),

    /// Upstream stage not finalized
    #[error("{0}")]
    Lineage(GateFailure),

    /// Content below stage minimums
    #[error("{0}")]
    Threshold(GateFailure),

    /// Store failure
    #[error("storage failure: {0}")]
    Storage(StoreError),

    /// Stage closed for the period
    #[error("{stage} is locked: {reason}")]
    StageLocked { stage: Stage, reason: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl RcaError {
    /// Whether continuing the conversation can resolve the error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Threshold(_))
    }

    /// Create input-shape error
    #[inline]
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputShape(message.into())
    }
}

impl From<GateFailure> for RcaError {
    fn from(failure: GateFailure) -> Self {
        match failure.kind() {
            FailureKind::Lineage => Self::Lineage(failure),
            FailureKind::Threshold => Self::Threshold(failure),
            FailureKind::Shape => Self::InputShape(failure.to_string()),
        }
    }
}

impl From<StoreError> for RcaError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Payload(inner) => Self::InputShape(inner.to_string()),
            other => Self::Storage(other),
        }
    }
}

impl From<ArtifactError> for RcaError {
    fn from(e: ArtifactError) -> Self {
        Self::InputShape(e.to_string())
    }
}
