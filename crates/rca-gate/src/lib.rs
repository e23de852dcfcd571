//! RCA Stage Gate
//!
//! Decides whether a stage draft may become the stage's final artifact.
//!
//! # Checks
//!
//! - **Lineage**: every stage after the case context needs the validated
//!   final of the stage before it
//! - **Thresholds**: minimum content per stage ([`Thresholds`])
//! - **Linkage**: `critical ⊆ selected ⊆ root candidates` for the Pareto
//!   stage and `linked ⊆ critical` for objectives
//!
//! A passing draft yields an [`Evaluation`] with a per-metric breakdown and
//! a 0.0..=10.0 score. A failing draft yields the first [`GateFailure`]
//! found, naming the unmet condition with current and required values.
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_gate::{StageGate, Thresholds};
//!
//! let gate = StageGate::new(Thresholds::default());
//! match gate.evaluate(Stage::Prioritization, &draft.payload, Some(&tree_final)) {
//!     Ok(evaluation) => println!("score {}", evaluation.score),
//!     Err(failure) => println!("{failure}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod checks;
mod failure;
mod gate;
pub mod linkage;
mod score;
mod thresholds;

pub use failure::{FailureKind, GateFailure};
pub use gate::StageGate;
pub use score::{pareto, score, Evaluation, Metric, ParetoReport, RankedRoot};
pub use thresholds::Thresholds;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
