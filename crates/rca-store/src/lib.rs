//! RCA Stage Artifact Store
//!
//! Persistence for stage drafts, finals and evaluation records, addressed by
//! the explicit key tuple `(owner, stage, kind, period)`.
//!
//! # Core Concepts
//!
//! - [`ArtifactStore`]: async storage contract
//! - [`ArtifactWrite`]: one pending write (payload, status, score, conversation)
//! - [`MemoryStore`]: concurrent in-process store
//! - [`FileStore`]: single JSON document on disk
//!
//! Draft writes go through [`ArtifactStore::put`], which merges the patch
//! into whatever the key currently holds. Validation writes go through
//! [`ArtifactStore::commit`], which replaces a set of records atomically.
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_store::{ArtifactStore, ArtifactWrite, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let stored = store.put(ArtifactWrite::new(key.clone(), patch), &merge).await?;
//! let resumed = store.get_or_latest(&next_month_key).await?;
//! ```

#![warn(unreachable_pub)]

mod error;
mod file;
mod memory;
mod record;
mod store;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{ArtifactStore, ArtifactWrite};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
