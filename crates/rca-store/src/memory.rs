//! In-process store backed by `DashMap`

use crate::error::StoreError;
use crate::record;
use crate::store::{ArtifactStore, ArtifactWrite};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rca_artifact::{
    ArtifactKey, ArtifactKind, OwnerId, PayloadMerge, PeriodKey, Stage, StageArtifact,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent in-memory artifact store
///
/// Single-key writes lock only the key's shard. Commits take the store-wide
/// write gate so readers never observe half of a commit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<ArtifactKey, StageArtifact>,
    version: AtomicU64,
    commit_gate: RwLock<()>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn latest_matching(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
        filter: impl Fn(&StageArtifact) -> bool,
    ) -> Option<StageArtifact> {
        let _gate = self.commit_gate.read();
        let candidates: Vec<StageArtifact> = self
            .records
            .iter()
            .filter(|r| record::in_lineage(r.key(), owner, stage, kind) && filter(r.value()))
            .map(|r| r.value().clone())
            .collect();
        record::most_recent(candidates.iter()).cloned()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn get(&self, key: &ArtifactKey) -> Result<Option<StageArtifact>, StoreError> {
        let _gate = self.commit_gate.read();
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    async fn latest_across_periods(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
    ) -> Result<Option<StageArtifact>, StoreError> {
        Ok(self.latest_matching(owner, stage, kind, |_| true))
    }

    async fn find_by_conversation(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
        conversation_ref: &str,
    ) -> Result<Option<StageArtifact>, StoreError> {
        Ok(self.latest_matching(owner, stage, kind, |r| {
            r.conversation_ref.as_deref() == Some(conversation_ref)
        }))
    }

    async fn list(
        &self,
        owner: &OwnerId,
        period: &PeriodKey,
    ) -> Result<Vec<StageArtifact>, StoreError> {
        let _gate = self.commit_gate.read();
        let mut found: Vec<StageArtifact> = self
            .records
            .iter()
            .filter(|r| &r.key().owner == owner && &r.key().period == period)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    async fn put(
        &self,
        write: ArtifactWrite,
        merge: &dyn PayloadMerge,
    ) -> Result<StageArtifact, StoreError> {
        let _gate = self.commit_gate.read();
        let version = self.next_version();
        // The entry guard serialises concurrent puts on the same key.
        let stored = match self.records.entry(write.key.clone()) {
            Entry::Occupied(mut occupied) => {
                let stored = record::merged(Some(occupied.get()), write, merge, version, Utc::now())?;
                occupied.insert(stored.clone());
                stored
            }
            Entry::Vacant(vacant) => {
                let stored = record::merged(None, write, merge, version, Utc::now())?;
                vacant.insert(stored.clone());
                stored
            }
        };
        tracing::debug!("Stored {} (version {})", stored.key, stored.version);
        Ok(stored)
    }

    async fn commit(&self, writes: Vec<ArtifactWrite>) -> Result<Vec<StageArtifact>, StoreError> {
        record::check_distinct(&writes)?;
        let _gate = self.commit_gate.write();
        let now = Utc::now();
        let mut staged = Vec::with_capacity(writes.len());
        for write in writes {
            let existing = self.records.get(&write.key).map(|r| r.value().clone());
            staged.push(record::replaced(existing.as_ref(), write, self.next_version(), now)?);
        }
        for stored in &staged {
            self.records.insert(stored.key.clone(), stored.clone());
        }
        tracing::info!("Committed {} record(s)", staged.len());
        Ok(staged)
    }
}
