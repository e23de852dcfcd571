//! Storage errors
//!
//! Every variant is fatal for the request that hit it; no store operation
//! leaves a partial write behind.

use rca_artifact::{ArtifactError, ArtifactKey};
use std::path::PathBuf;

/// Errors raised by [`crate::ArtifactStore`] implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Backing document does not parse
    #[error("corrupt store document {path}: {source}")]
    Corrupt {
        /// Backing file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Document could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload rejected by the merge hook
    #[error(transparent)]
    Payload(#[from] ArtifactError),

    /// The same key appears twice in one commit
    #[error("commit names {0} more than once")]
    DuplicateKey(ArtifactKey),

    /// Background task failed
    #[error("storage task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Create I/O error for a path
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
