//! Stored stage artifacts and typed payload views
//!
//! A [`StageArtifact`] is a self-describing document: its payload is kept as
//! raw JSON so that fields this crate does not know about survive every
//! merge. Typed access goes through the [`StagePayload`] trait.

use crate::hash::ContentHash;
use crate::key::{ArtifactKey, ArtifactKind, ArtifactStatus};
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// Typed view over one stage's payload
///
/// This trait is **sealed**: only the payload types in [`crate::types`]
/// implement it.
///
/// # Contract
/// - `from_payload(to_payload(x)) == x`
/// - unknown fields present in the stored JSON are carried through a
///   typed round-trip
pub trait StagePayload:
    Serialize + DeserializeOwned + Debug + Clone + PartialEq + Send + Sync + 'static + private::Sealed
{
    /// Stage this payload belongs to
    const STAGE: Stage;

    /// Parse from a stored payload
    ///
    /// # Errors
    /// Returns [`ArtifactError::Shape`] if the JSON does not match the stage
    fn from_payload(value: &Value) -> Result<Self, ArtifactError> {
        serde_json::from_value(value.clone()).map_err(|e| ArtifactError::Shape {
            stage: Self::STAGE,
            message: e.to_string(),
        })
    }

    /// Serialize to a storable payload
    ///
    /// # Errors
    /// Returns error if serialization fails
    fn to_payload(&self) -> Result<Value, ArtifactError> {
        serde_json::to_value(self).map_err(|e| ArtifactError::Shape {
            stage: Self::STAGE,
            message: e.to_string(),
        })
    }
}

#[doc(hidden)]
pub mod private {
    /// Sealed trait marker
    pub trait Sealed {}
}

/// Errors related to artifact payloads
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArtifactError {
    /// Payload JSON does not match the stage's shape
    #[error("{stage}: malformed payload: {message}")]
    Shape { stage: Stage, message: String },

    /// Typed view requested for the wrong stage
    #[error("stage mismatch: artifact is {actual}, expected {expected}")]
    StageMismatch { expected: Stage, actual: Stage },

    /// Payload must be a JSON object
    #[error("{stage}: payload must be a JSON object")]
    NotAnObject { stage: Stage },

    /// Patch could not be merged into the stored payload
    #[error("{stage}: merge failed: {message}")]
    Merge { stage: Stage, message: String },
}

/// Merge-on-write hook used by stores
///
/// Implementations combine the stored payload (if any) with an incoming
/// patch. They must never drop structure present in `base`.
pub trait PayloadMerge: Send + Sync {
    /// Combine `base` with `patch` for `stage`
    ///
    /// # Errors
    /// Returns [`ArtifactError`] if either side does not parse for the stage
    fn merge_payload(
        &self,
        stage: Stage,
        base: Option<&Value>,
        patch: &Value,
    ) -> Result<Value, ArtifactError>;
}

/// Merge that replaces the payload wholesale
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplacePayload;

impl PayloadMerge for ReplacePayload {
    fn merge_payload(
        &self,
        _stage: Stage,
        _base: Option<&Value>,
        patch: &Value,
    ) -> Result<Value, ArtifactError> {
        Ok(patch.clone())
    }
}

/// Versioned, owner-scoped stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageArtifact {
    /// Composite key
    pub key: ArtifactKey,
    /// Lifecycle status
    pub status: ArtifactStatus,
    /// Self-describing payload
    pub payload: Value,
    /// Derived score (final and evaluation records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Canonical hash of `payload`
    pub revision: ContentHash,
    /// Store-wide monotonically increasing write counter
    pub version: u64,
    /// Conversation that last wrote this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_ref: Option<String>,
    /// First write
    pub created_at: DateTime<Utc>,
    /// Last write
    pub updated_at: DateTime<Utc>,
}

impl StageArtifact {
    /// Create a fresh record
    #[must_use]
    pub fn new(key: ArtifactKey, payload: Value, status: ArtifactStatus, now: DateTime<Utc>) -> Self {
        let revision = ContentHash::of_json(&payload);
        Self {
            key,
            status,
            payload,
            score: None,
            revision,
            version: 0,
            conversation_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stage of this record
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.key.stage
    }

    /// Kind of this record
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.key.kind
    }

    /// Whether this record passed the gate
    #[inline]
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.status == ArtifactStatus::Validated
    }

    /// Replace the payload, refreshing the revision
    pub fn set_payload(&mut self, payload: Value) {
        self.revision = ContentHash::of_json(&payload);
        self.payload = payload;
    }

    /// Typed view of the payload
    ///
    /// # Errors
    /// - [`ArtifactError::StageMismatch`] if `P` belongs to another stage
    /// - [`ArtifactError::Shape`] if the payload does not parse
    pub fn typed<P: StagePayload>(&self) -> Result<P, ArtifactError> {
        if P::STAGE != self.key.stage {
            return Err(ArtifactError::StageMismatch {
                expected: P::STAGE,
                actual: self.key.stage,
            });
        }
        P::from_payload(&self.payload)
    }
}
