//! RCA Artifact Model
//!
//! Stage artifacts for the guided root-cause-analysis workflow.
//!
//! # Core Concepts
//!
//! - [`Stage`]: the seven methodology steps and their dependency chain
//! - [`ArtifactKey`]: explicit `(owner, stage, kind, period)` address
//! - [`StageArtifact`]: versioned stored document with a raw JSON payload
//! - [`StagePayload`]: typed views over payloads, one per stage
//! - [`ContentHash`]: Blake3 revision of a payload's canonical JSON
//! - [`CauseTree`]: the four-level Ishikawa tree
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_artifact::{ArtifactKey, OwnerId, PeriodKey, Stage, StagePayload};
//! use rca_artifact::types::CauseTree;
//!
//! let owner = OwnerId::new("ana")?;
//! let key = ArtifactKey::draft(&owner, Stage::CauseTree, &PeriodKey::new("2026-10")?);
//! let tree = CauseTree::from_payload(&stored.payload)?;
//! println!("{key}: {} root candidates", tree.root_candidates().len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod hash;
mod key;
mod stage;
pub mod text;
pub mod types;

pub use artifact::{ArtifactError, PayloadMerge, ReplacePayload, StageArtifact, StagePayload};
pub use hash::{ContentHash, HashError};
pub use key::{ArtifactKey, ArtifactKind, ArtifactStatus, KeyError, OwnerId, PeriodKey};
pub use stage::{Stage, StageIndexError};
pub use types::{
    CaseContext, CauseTree, IdeaList, ObjectivesState, PrioritizationState, ProductivityDraft,
    QuadrantState,
};

/// Sealed trait support for payload types.
/// **Note:** This is only for internal/testing use and may change.
#[doc(hidden)]
pub mod __private {
    pub use super::artifact::private::Sealed;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
