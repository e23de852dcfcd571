//! RCA Composition
//!
//! Merge-on-write for stage drafts.
//!
//! # Core Concepts
//!
//! - [`MergeStrategy`]: combine a stored payload with an incoming patch
//! - [`TreeMergeStrategy`]: id-keyed recursive upsert for the cause tree
//! - [`ShallowMergeStrategy`]: field-level merge for flat stages
//! - [`StrategyRegistry`]: stage → strategy, usable as the store's merge hook
//! - [`FocusMachine`]: cursor-driven drill-down with branch-switch hold-back
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_composition::{FocusMachine, Navigation, StrategyRegistry};
//!
//! let registry = StrategyRegistry::default();
//! let step = FocusMachine::default().step(&draft_tree, proposal_tree, &Navigation::default())?;
//! let stored = store.put(ArtifactWrite::new(key, step.patch), &registry).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod focus;
mod registry;
mod shallow;
mod strategy;
mod tree;

pub use focus::{Focus, FocusLimits, FocusMachine, FocusStep, Navigation};
pub use registry::{check_shape, StrategyRegistry};
pub use shallow::ShallowMergeStrategy;
pub use strategy::{MergeError, MergeReport, MergeStrategy, Merged};
pub use tree::{TreeMergeStrategy, DEFAULT_MAX_WHYS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
