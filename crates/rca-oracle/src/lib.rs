//! RCA Oracle Boundary
//!
//! The trusted boundary between the free-text interpretation oracle and
//! stage state. Oracle output is untrusted input: it reaches the draft only
//! as a [`Proposal`] that passed schema and shape checks.
//!
//! # Architecture
//!
//! ```text
//! OracleRequest → Oracle (http | scripted) → raw JSON → OracleAdapter
//!                                                         │ schema check
//!                                                         │ shape check
//!                                                         ↓
//!                                   Proposal  or  clarification fallback
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_oracle::{HttpOracle, OracleAdapter, OracleRequest, OracleSettings};
//!
//! let settings = OracleSettings::default().with_endpoint("https://oracle.local/interpret");
//! let adapter = OracleAdapter::new(HttpOracle::new(settings.endpoint.clone().unwrap())?, &settings)?;
//! let outcome = adapter.propose(OracleRequest::new(stage, "deliveries are late")).await;
//! if outcome.is_fallback() {
//!     // nothing is persisted this turn
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod adapter;
mod error;
mod oracle;
mod proposal;
mod request;
mod settings;

pub use adapter::{OracleAdapter, Outcome};
pub use error::OracleError;
pub use oracle::{HttpOracle, Oracle, ScriptedOracle};
pub use proposal::{proposal_schema, ControlSignal, Directives, FocusTarget, Proposal};
pub use request::{HistoryTurn, OracleRequest, Speaker, DEFAULT_HISTORY_WINDOW};
pub use settings::OracleSettings;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
