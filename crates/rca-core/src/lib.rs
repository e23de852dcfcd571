//! RCA Core
//!
//! The staged root-cause-analysis workflow: guided turns that merge oracle
//! proposals into stage drafts, and stage validation that turns a draft
//! into the final artifact the next stage consumes.
//!
//! # Flow
//!
//! ```text
//! turn:     utterance → OracleAdapter → Proposal → FocusMachine / merge → store.put
//! validate: draft + upstream final → StageGate → commit(final, evaluation)
//! ```
//!
//! Stages form the chain 0 → 1 → … → 6; every stage after the case context
//! needs the validated final of the stage before it for the same period.
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_core::{Locator, RcaConfig, TurnRequest, WorkflowService};
//! use rca_store::MemoryStore;
//! use rca_oracle::ScriptedOracle;
//!
//! let service = WorkflowService::new(MemoryStore::new(), ScriptedOracle::new(script), &RcaConfig::default())?;
//! let locator = Locator::new(owner, Stage::CauseTree).with_period(period);
//! let reply = service.turn(TurnRequest::new(locator.clone(), "machines break down weekly")).await?;
//! let verdict = service.validate(&locator).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod api;
mod config;
mod error;
mod service;

pub use api::{
    Locator, PipelineStatus, SaveResponse, StageStatus, StateView, TurnAction, TurnRequest,
    TurnResponse, TurnUpdates, ValidateResponse,
};
pub use config::{RcaConfig, StoreSettings};
pub use error::RcaError;
pub use service::WorkflowService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
