//! Store persisted as one JSON document on disk

use crate::error::StoreError;
use crate::record;
use crate::store::{ArtifactStore, ArtifactWrite};
use async_trait::async_trait;
use chrono::Utc;
use rca_artifact::{
    ArtifactKey, ArtifactKind, OwnerId, PayloadMerge, PeriodKey, Stage, StageArtifact,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    /// Last write version handed out
    version: u64,
    /// Records ordered by key
    artifacts: Vec<StageArtifact>,
}

#[derive(Debug, Default)]
struct Inner {
    version: u64,
    records: BTreeMap<ArtifactKey, StageArtifact>,
}

/// File-backed artifact store
///
/// The whole document is rewritten through a temporary file and renamed
/// into place, so a failed write leaves the previous document intact. The
/// in-memory copy only changes after the file write succeeds.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<Option<Inner>>,
}

impl FileStore {
    /// Store at `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn loaded<'a>(&self, slot: &'a mut Option<Inner>) -> Result<&'a mut Inner, StoreError> {
        if slot.is_none() {
            *slot = Some(read_document(&self.path).await?);
        }
        slot.as_mut()
            .ok_or_else(|| StoreError::Task("store state not loaded".to_string()))
    }

    async fn persist(
        &self,
        version: u64,
        records: &BTreeMap<ArtifactKey, StageArtifact>,
    ) -> Result<(), StoreError> {
        let document = Document {
            version,
            artifacts: records.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!("Persisted {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }

    async fn latest_matching(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
        filter: impl Fn(&StageArtifact) -> bool + Send,
    ) -> Result<Option<StageArtifact>, StoreError> {
        let mut guard = self.state.lock().await;
        let inner = self.loaded(&mut guard).await?;
        let matching = inner
            .records
            .values()
            .filter(|r| record::in_lineage(&r.key, owner, stage, kind) && filter(r));
        Ok(record::most_recent(matching).cloned())
    }
}

async fn read_document(path: &Path) -> Result<Inner, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Inner::default()),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    let document: Document =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        "Loaded {} record(s) from {}",
        document.artifacts.len(),
        path.display()
    );
    Ok(Inner {
        version: document.version,
        records: document
            .artifacts
            .into_iter()
            .map(|a| (a.key.clone(), a))
            .collect(),
    })
}

#[async_trait]
impl ArtifactStore for FileStore {
    async fn get(&self, key: &ArtifactKey) -> Result<Option<StageArtifact>, StoreError> {
        let mut guard = self.state.lock().await;
        let inner = self.loaded(&mut guard).await?;
        Ok(inner.records.get(key).cloned())
    }

    async fn latest_across_periods(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
    ) -> Result<Option<StageArtifact>, StoreError> {
        self.latest_matching(owner, stage, kind, |_| true).await
    }

    async fn find_by_conversation(
        &self,
        owner: &OwnerId,
        stage: Stage,
        kind: ArtifactKind,
        conversation_ref: &str,
    ) -> Result<Option<StageArtifact>, StoreError> {
        self.latest_matching(owner, stage, kind, |r| {
            r.conversation_ref.as_deref() == Some(conversation_ref)
        })
        .await
    }

    async fn list(
        &self,
        owner: &OwnerId,
        period: &PeriodKey,
    ) -> Result<Vec<StageArtifact>, StoreError> {
        let mut guard = self.state.lock().await;
        let inner = self.loaded(&mut guard).await?;
        Ok(inner
            .records
            .values()
            .filter(|r| &r.key.owner == owner && &r.key.period == period)
            .cloned()
            .collect())
    }

    async fn put(
        &self,
        write: ArtifactWrite,
        merge: &dyn PayloadMerge,
    ) -> Result<StageArtifact, StoreError> {
        let mut guard = self.state.lock().await;
        let inner = self.loaded(&mut guard).await?;
        let version = inner.version + 1;
        let stored = record::merged(inner.records.get(&write.key), write, merge, version, Utc::now())?;
        let mut next = inner.records.clone();
        next.insert(stored.key.clone(), stored.clone());
        self.persist(version, &next).await?;
        inner.records = next;
        inner.version = version;
        tracing::debug!("Stored {} (version {})", stored.key, stored.version);
        Ok(stored)
    }

    async fn commit(&self, writes: Vec<ArtifactWrite>) -> Result<Vec<StageArtifact>, StoreError> {
        record::check_distinct(&writes)?;
        let mut guard = self.state.lock().await;
        let inner = self.loaded(&mut guard).await?;
        let now = Utc::now();
        let mut version = inner.version;
        let mut next = inner.records.clone();
        let mut staged = Vec::with_capacity(writes.len());
        for write in writes {
            version += 1;
            let stored = record::replaced(inner.records.get(&write.key), write, version, now)?;
            next.insert(stored.key.clone(), stored.clone());
            staged.push(stored);
        }
        self.persist(version, &next).await?;
        inner.records = next;
        inner.version = version;
        tracing::info!("Committed {} record(s) to {}", staged.len(), self.path.display());
        Ok(staged)
    }
}
