//! Write application shared by the store implementations

use crate::error::StoreError;
use crate::store::ArtifactWrite;
use chrono::{DateTime, Utc};
use rca_artifact::{
    ArtifactError, ArtifactKey, ArtifactKind, OwnerId, PayloadMerge, Stage, StageArtifact,
};
use std::collections::HashSet;

/// Build the record a `put` leaves behind
pub(crate) fn merged(
    existing: Option<&StageArtifact>,
    write: ArtifactWrite,
    merge: &dyn PayloadMerge,
    version: u64,
    now: DateTime<Utc>,
) -> Result<StageArtifact, StoreError> {
    let stage = write.key.stage;
    let payload = merge.merge_payload(stage, existing.map(|e| &e.payload), &write.payload)?;
    let score = write.score.or_else(|| existing.and_then(|e| e.score));
    replaced(existing, ArtifactWrite { payload, score, ..write }, version, now)
}

/// Build the record a `commit` leaves behind
pub(crate) fn replaced(
    existing: Option<&StageArtifact>,
    write: ArtifactWrite,
    version: u64,
    now: DateTime<Utc>,
) -> Result<StageArtifact, StoreError> {
    if !write.payload.is_object() {
        return Err(ArtifactError::NotAnObject {
            stage: write.key.stage,
        }
        .into());
    }
    let mut record = StageArtifact::new(write.key, write.payload, write.status, now);
    record.version = version;
    record.score = write.score;
    record.conversation_ref = write
        .conversation_ref
        .or_else(|| existing.and_then(|e| e.conversation_ref.clone()));
    if let Some(existing) = existing {
        record.created_at = existing.created_at;
    }
    Ok(record)
}

/// Reject commits naming a key twice
pub(crate) fn check_distinct(writes: &[ArtifactWrite]) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for write in writes {
        if !seen.insert(&write.key) {
            return Err(StoreError::DuplicateKey(write.key.clone()));
        }
    }
    Ok(())
}

/// Whether `key` belongs to the `(owner, stage, kind)` lineage
pub(crate) fn in_lineage(key: &ArtifactKey, owner: &OwnerId, stage: Stage, kind: ArtifactKind) -> bool {
    &key.owner == owner && key.stage == stage && key.kind == kind
}

/// Most recent record: latest `updated_at`, then highest version
pub(crate) fn most_recent<'a>(
    records: impl Iterator<Item = &'a StageArtifact>,
) -> Option<&'a StageArtifact> {
    records.max_by(|a, b| {
        a.updated_at
            .cmp(&b.updated_at)
            .then_with(|| a.version.cmp(&b.version))
    })
}
