//! Typed payload views, one per stage

pub mod case_context;
pub mod cause_tree;
pub mod ideas;
pub mod objectives;
pub mod prioritization;
pub mod productivity;
pub mod quadrants;

pub use case_context::CaseContext;
pub use cause_tree::{
    derive_id, Category, CategoryProgress, CauseTree, Cursor, MainCause, PendingSwitch, Problem,
    RootCandidate, SubCause, TreeProgress,
};
pub use ideas::{Idea, IdeaList};
pub use objectives::ObjectivesState;
pub use prioritization::{Criterion, PrioritizationState, RootScore};
pub use productivity::{CostItem, ProductivityDraft, UnitType, DEFAULT_COST_ITEMS};
pub use quadrants::{Quadrant, QuadrantItem, QuadrantState};
