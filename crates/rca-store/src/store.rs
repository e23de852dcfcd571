//! Storage contract

use crate::error::StoreError;
use async_trait::async_trait;
use rca_artifact::{
    ArtifactKey, ArtifactKind, ArtifactStatus, OwnerId, PayloadMerge, PeriodKey, Stage,
    StageArtifact,
};
use serde_json::Value;

/// One pending write
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactWrite {
    /// Target key
    pub key: ArtifactKey,
    /// Patch (for `put`) or full payload (for `commit`)
    pub payload: Value,
    /// Status to record
    pub status: ArtifactStatus,
    /// Derived score, if any
    pub score: Option<f64>,
    /// Conversation responsible for the write
    pub conversation_ref: Option<String>,
}

impl ArtifactWrite {
    /// Draft-status write
    #[inline]
    #[must_use]
    pub fn new(key: ArtifactKey, payload: Value) -> Self {
        Self {
            key,
            payload,
            status: ArtifactStatus::Draft,
            score: None,
            conversation_ref: None,
        }
    }

    /// Builder: set status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ArtifactStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: set score
    #[inline]
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Builder: set conversation reference
    #[inline]
    #[must_use]
    pub fn with_conversation_ref(mut self, conversation_ref: Option<String>) -> Self {
        self.conversation_ref = conversation_ref;
        self
    }
}

/// Persistence for stage artifacts
///
/// Implementations must be safe to share across concurrent requests. Two
/// `put`s on the same key are serialised so the second merges against the
/// result of the first.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Exact lookup
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backing storage fails
    async fn get(&self, key: &ArtifactKey) -> Result<Option<StageArtifact>, StoreError>;

    /// Most recently updated record for `(owner, stage, kind)`, any period
    ///
    /// Ties on `updated_at` are broken by the higher write version.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backing storage fails
    async fn latest_across_periods(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
    ) -> Result<Option<StageArtifact>, StoreError>;

    /// Most recent record for `(owner, stage, kind)` last written by a conversation
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backing storage fails
    async fn find_by_conversation(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
        conversation_ref: &str,
    ) -> Result<Option<StageArtifact>, StoreError>;

    /// All records of an owner for one period
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backing storage fails
    async fn list(
        &self,
        owner: &OwnerId,
        period: &PeriodKey,
    ) -> Result<Vec<StageArtifact>, StoreError>;

    /// Create-or-merge by key
    ///
    /// The stored payload becomes `merge(existing, write.payload)`.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the merge rejects the payload or storage fails;
    /// nothing is written in either case
    async fn put(
        &self,
        write: ArtifactWrite,
        merge: &dyn PayloadMerge,
    ) -> Result<StageArtifact, StoreError>;

    /// Replace every record in `writes` wholesale, all or nothing
    ///
    /// # Errors
    /// Returns [`StoreError`] if any write is rejected; nothing is written
    async fn commit(&self, writes: Vec<ArtifactWrite>) -> Result<Vec<StageArtifact>, StoreError>;

    /// Exact lookup falling back to the latest record of the same lineage
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backing storage fails
    async fn get_or_latest(&self, key: &ArtifactKey) -> Result<Option<StageArtifact>, StoreError> {
        if let Some(found) = self.get(key).await? {
            return Ok(Some(found));
        }
        let latest = self
            .latest_across_periods(&key.owner, key.stage, key.kind)
            .await?;
        if let Some(found) = &latest {
            tracing::debug!("No record at {}, resuming {}", key, found.key);
        }
        Ok(latest)
    }
}
