//! Guided drill-down focus for the cause tree
//!
//! The cursor stored in the draft drives a small state machine:
//!
//! | state | meaning |
//! |---|---|
//! | [`Focus::Unfocused`] | no branch under drill-down |
//! | [`Focus::Category`] | a category still collecting main causes |
//! | [`Focus::Branch`] | one main cause being deepened with whys |
//!
//! Transitions:
//! - selecting or creating a main cause moves to `Branch`
//! - closing the branch (explicitly, or when every sub-cause of the focused
//!   main cause first reaches `close_depth` whys) returns to `Category`
//!   while the category is below `min_main_causes`, otherwise `Unfocused`
//!
//! While a branch is focused, incoming content for any other category is
//! held in `pendingBranchSwitch` instead of being merged. A confirmed
//! switch releases it into the tree; a declined switch discards it.

use crate::strategy::MergeError;
use crate::tree::TreeMergeStrategy;
use rca_artifact::types::{Category, CauseTree, Cursor, PendingSwitch};
use rca_artifact::StagePayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Focus state derived from a stored cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Focus {
    /// Nothing focused
    #[default]
    Unfocused,
    /// Category collecting main causes
    Category {
        /// Focused category
        category_id: String,
    },
    /// Main cause under drill-down
    Branch {
        /// Owning category
        category_id: String,
        /// Focused main cause
        main_cause_id: String,
        /// Sub-cause most recently worked on
        sub_cause_id: Option<String>,
    },
}

impl Focus {
    /// State for a stored cursor
    #[must_use]
    pub fn from_cursor(cursor: Option<&Cursor>) -> Self {
        match cursor {
            None => Focus::Unfocused,
            Some(Cursor {
                category_id,
                main_cause_id: None,
                ..
            }) => Focus::Category {
                category_id: category_id.clone(),
            },
            Some(Cursor {
                category_id,
                main_cause_id: Some(main),
                sub_cause_id,
            }) => Focus::Branch {
                category_id: category_id.clone(),
                main_cause_id: main.clone(),
                sub_cause_id: sub_cause_id.clone(),
            },
        }
    }

    /// Cursor to store for this state
    #[must_use]
    pub fn to_cursor(&self) -> Option<Cursor> {
        match self {
            Focus::Unfocused => None,
            Focus::Category { category_id } => Some(Cursor::category(category_id.clone())),
            Focus::Branch {
                category_id,
                main_cause_id,
                sub_cause_id,
            } => {
                let cursor = Cursor::branch(category_id.clone(), main_cause_id.clone());
                Some(match sub_cause_id {
                    Some(sub) => cursor.with_sub_cause(sub.clone()),
                    None => cursor,
                })
            }
        }
    }

    /// Focused category, if any
    #[must_use]
    pub fn category_id(&self) -> Option<&str> {
        match self {
            Focus::Unfocused => None,
            Focus::Category { category_id } | Focus::Branch { category_id, .. } => {
                Some(category_id.as_str())
            }
        }
    }

    /// Whether a main cause is under drill-down
    #[inline]
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(self, Focus::Branch { .. })
    }

    /// Short state name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Focus::Unfocused => "unfocused",
            Focus::Category { .. } => "category",
            Focus::Branch { .. } => "branch",
        }
    }
}

/// Thresholds the focus machine consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusLimits {
    /// Main causes a category needs before focus leaves it
    pub min_main_causes: usize,
    /// Sub-causes a main cause needs before its branch can close by depth
    pub min_sub_causes: usize,
    /// Why depth at which a branch closes on its own
    pub close_depth: usize,
}

impl Default for FocusLimits {
    fn default() -> Self {
        Self {
            min_main_causes: 2,
            min_sub_causes: 1,
            close_depth: 3,
        }
    }
}

/// Navigation instructions accompanying a patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    /// Close the focused branch now
    pub close_branch: bool,
    /// Apply held content and move focus to it
    pub confirm_switch: bool,
    /// Discard held content
    pub decline_switch: bool,
    /// Explicit selection
    pub focus: Option<Cursor>,
}

/// Result of one focus step
#[derive(Debug, Clone, PartialEq)]
pub struct FocusStep {
    /// Patch to persist, with `cursor` and `pendingBranchSwitch` set explicitly
    pub patch: Value,
    /// State before the step
    pub before: Focus,
    /// State after the step
    pub after: Focus,
    /// Category ids held back this turn
    pub held: Vec<String>,
    /// Category ids released by a confirmed switch
    pub released: Vec<String>,
    /// Whether held content was discarded
    pub discarded: bool,
    /// Whether the focused branch closed this turn
    pub branch_closed: bool,
}

impl FocusStep {
    /// Whether the student must confirm a branch switch
    #[inline]
    #[must_use]
    pub fn awaits_switch_confirmation(&self) -> bool {
        !self.held.is_empty()
    }
}

/// Focus state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusMachine {
    limits: FocusLimits,
    merge: TreeMergeStrategy,
}

impl FocusMachine {
    /// Machine using `limits` and `merge`
    #[inline]
    #[must_use]
    pub fn new(limits: FocusLimits, merge: TreeMergeStrategy) -> Self {
        Self { limits, merge }
    }

    /// Configured limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &FocusLimits {
        &self.limits
    }

    /// Filter `incoming` against the focus in `base` and compute the next focus
    ///
    /// `incoming`'s own cursor and pending switch are ignored; focus moves
    /// only through `nav` and tree content.
    ///
    /// # Errors
    /// Returns [`MergeError`] if the admitted patch cannot be serialized
    pub fn step(
        &self,
        base: &CauseTree,
        incoming: CauseTree,
        nav: &Navigation,
    ) -> Result<FocusStep, MergeError> {
        let before = Focus::from_cursor(base.cursor.as_ref());
        let mut focus = settle(before.clone(), base);
        let mut pending = base.pending_switch.clone();

        let mut released = Vec::new();
        let mut release = Vec::new();
        let discarded = nav.decline_switch && pending.is_some();
        if nav.decline_switch {
            pending = None;
        } else if nav.confirm_switch {
            if let Some(held) = pending.take() {
                released = held.category_ids;
                release = held.categories;
            }
        }
        if let Some(first) = released.first() {
            focus = Focus::Category {
                category_id: first.clone(),
            };
        }
        if let Some(selected) = &nav.focus {
            focus = Focus::from_cursor(Some(selected));
        }

        let CauseTree {
            problem,
            categories,
            extra,
            ..
        } = incoming;
        let (admitted, held_categories) = self.partition(base, &focus, categories);
        let held: Vec<String> = held_categories.iter().map(|c| c.id.clone()).collect();
        if !held_categories.is_empty() {
            pending = Some(self.hold(pending, held_categories));
        }

        let mut patch_tree = CauseTree {
            problem,
            categories: release.into_iter().chain(admitted).collect(),
            cursor: None,
            pending_switch: None,
            extra,
        };

        let (merged, _) = self.merge.merge_trees(base.clone(), patch_tree.clone());
        focus = follow_creation(focus, base, &patch_tree);
        focus = settle(focus, &merged);

        let mut branch_closed = false;
        if let Focus::Branch {
            category_id,
            main_cause_id,
            ..
        } = &focus
        {
            let reached_now = self.depth_reached(&merged, category_id, main_cause_id)
                && !self.depth_reached(base, category_id, main_cause_id);
            if nav.close_branch || reached_now {
                branch_closed = true;
                let mains = merged
                    .category(category_id)
                    .map_or(0, |c| c.main_causes.len());
                focus = if mains < self.limits.min_main_causes {
                    Focus::Category {
                        category_id: category_id.clone(),
                    }
                } else {
                    Focus::Unfocused
                };
            }
        }

        if before != focus {
            tracing::info!("Focus {} -> {}", before.name(), focus.name());
        }
        if !held.is_empty() {
            tracing::info!("Held {} category update(s) pending branch switch", held.len());
        }

        patch_tree.cursor = focus.to_cursor();
        patch_tree.pending_switch = pending.clone();
        let mut patch = patch_tree.to_payload()?;
        if let Value::Object(map) = &mut patch {
            map.insert(
                "cursor".to_string(),
                serde_json::to_value(focus.to_cursor()).map_err(|e| shape_error(&e))?,
            );
            map.insert(
                "pendingBranchSwitch".to_string(),
                serde_json::to_value(pending).map_err(|e| shape_error(&e))?,
            );
        }

        Ok(FocusStep {
            patch,
            before,
            after: focus,
            held,
            released,
            discarded,
            branch_closed,
        })
    }

    /// Split incoming categories into admitted and held
    fn partition(
        &self,
        base: &CauseTree,
        focus: &Focus,
        categories: Vec<Category>,
    ) -> (Vec<Category>, Vec<Category>) {
        let Focus::Branch { category_id, .. } = focus else {
            return (categories, Vec::new());
        };
        let mut admitted = Vec::new();
        let mut held = Vec::new();
        for category in categories {
            if &category.id == category_id {
                admitted.push(category);
            } else if self.merge.changes(base.category(&category.id), &category) {
                held.push(category);
            }
            // Echoes of unchanged categories are dropped.
        }
        (admitted, held)
    }

    fn hold(&self, pending: Option<PendingSwitch>, categories: Vec<Category>) -> PendingSwitch {
        let (mut ids, existing) = pending
            .map(|p| (p.category_ids, p.categories))
            .unwrap_or_default();
        for category in &categories {
            if !ids.contains(&category.id) {
                ids.push(category.id.clone());
            }
        }
        PendingSwitch {
            category_ids: ids,
            categories: self.merge.merge_categories(existing, categories),
        }
    }

    /// Every sub-cause of the branch is at least `close_depth` deep
    fn depth_reached(&self, tree: &CauseTree, category_id: &str, main_cause_id: &str) -> bool {
        let Some(main) = tree.main_cause(category_id, main_cause_id) else {
            return false;
        };
        main.sub_causes.len() >= self.limits.min_sub_causes.max(1)
            && main
                .sub_causes
                .iter()
                .all(|s| s.whys.len() >= self.limits.close_depth)
    }
}

/// Move focus onto main causes and sub-causes created by the patch
fn follow_creation(focus: Focus, base: &CauseTree, patch: &CauseTree) -> Focus {
    match focus {
        Focus::Branch {
            category_id,
            main_cause_id,
            sub_cause_id,
        } => {
            let new_sub = patch
                .main_cause(&category_id, &main_cause_id)
                .and_then(|m| {
                    m.sub_causes
                        .iter()
                        .filter(|s| base.sub_cause(&category_id, &main_cause_id, &s.id).is_none())
                        .last()
                })
                .map(|s| s.id.clone());
            Focus::Branch {
                sub_cause_id: new_sub.or(sub_cause_id),
                category_id,
                main_cause_id,
            }
        }
        other => {
            let preferred = other.category_id().map(str::to_string);
            let created = patch
                .categories
                .iter()
                .filter(|c| preferred.as_deref().map_or(true, |p| p == c.id))
                .chain(
                    patch
                        .categories
                        .iter()
                        .filter(|c| preferred.as_deref().is_some_and(|p| p != c.id)),
                )
                .find_map(|c| {
                    c.main_causes
                        .iter()
                        .find(|m| base.main_cause(&c.id, &m.id).is_none())
                        .map(|m| (c.id.clone(), m.id.clone()))
                });
            match created {
                Some((category_id, main_cause_id)) => Focus::Branch {
                    category_id,
                    main_cause_id,
                    sub_cause_id: None,
                },
                None => other,
            }
        }
    }
}

/// Drop focus components that do not resolve in `tree`
fn settle(focus: Focus, tree: &CauseTree) -> Focus {
    match focus {
        Focus::Branch {
            category_id,
            main_cause_id,
            sub_cause_id,
        } => {
            if tree.main_cause(&category_id, &main_cause_id).is_some() {
                let sub_cause_id = sub_cause_id
                    .filter(|s| tree.sub_cause(&category_id, &main_cause_id, s).is_some());
                Focus::Branch {
                    category_id,
                    main_cause_id,
                    sub_cause_id,
                }
            } else {
                settle(Focus::Category { category_id }, tree)
            }
        }
        Focus::Category { category_id } if tree.category(&category_id).is_none() => {
            Focus::Unfocused
        }
        other => other,
    }
}

fn shape_error(e: &serde_json::Error) -> MergeError {
    MergeError::Payload(rca_artifact::ArtifactError::Shape {
        stage: rca_artifact::Stage::CauseTree,
        message: e.to_string(),
    })
}
