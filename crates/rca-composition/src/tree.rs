//! Cause-tree merge engine
//!
//! Id-keyed recursive upsert over the four tree levels. Each level is
//! rebuilt as an [`IndexMap`] arena keyed by node id:
//!
//! 1. base entries are inserted in base order
//! 2. incoming entries with a known id are shallow-merged into the base
//!    entry (incoming non-null fields win, children merge recursively)
//! 3. incoming entries with a new id are appended in incoming order
//!
//! Why-chains are append-only: base answers keep their order and incoming
//! answers not already present are appended until the chain holds
//! `max_whys` answers. A chain is never truncated.
//!
//! A blank incoming problem never replaces a populated one.
//!
//! # Control fields
//!
//! `cursor` and `pendingBranchSwitch` follow presence semantics: a patch
//! that names the key (even as `null`) sets it, a patch that omits it keeps
//! the stored value.

use crate::strategy::{base_object, patch_object, MergeError, MergeReport, MergeStrategy, Merged};
use indexmap::map::Entry;
use indexmap::IndexMap;
use rca_artifact::text::normalize;
use rca_artifact::types::{Category, CauseTree, MainCause, SubCause};
use rca_artifact::StagePayload;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Default upper bound on a why-chain
pub const DEFAULT_MAX_WHYS: usize = 5;

const CURSOR: &str = "cursor";
const PENDING: &str = "pendingBranchSwitch";

/// Merge strategy for the cause tree
#[derive(Debug, Clone, Copy)]
pub struct TreeMergeStrategy {
    max_whys: usize,
}

impl Default for TreeMergeStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WHYS)
    }
}

impl TreeMergeStrategy {
    /// Strategy appending at most `max_whys` answers per chain
    #[inline]
    #[must_use]
    pub fn new(max_whys: usize) -> Self {
        Self { max_whys }
    }

    /// Configured chain bound
    #[inline]
    #[must_use]
    pub fn max_whys(&self) -> usize {
        self.max_whys
    }

    /// Merge typed trees, ignoring control fields
    ///
    /// The result keeps `base`'s cursor and pending switch.
    #[must_use]
    pub fn merge_trees(&self, base: CauseTree, incoming: CauseTree) -> (CauseTree, MergeReport) {
        let mut ctx = Ctx::new(self.max_whys);
        let mut tree = base;

        if !incoming.problem.is_blank() && tree.problem.text != incoming.problem.text {
            tree.problem.text = incoming.problem.text;
            ctx.report.fields_updated += 1;
        }
        merge_extra(&mut tree.problem.extra, incoming.problem.extra, &mut ctx);
        merge_extra(&mut tree.extra, incoming.extra, &mut ctx);

        tree.categories = upsert_all(
            std::mem::take(&mut tree.categories),
            incoming.categories,
            &mut ctx,
        );
        (tree, ctx.report)
    }

    /// Merge category lists with the same rules as a full tree
    #[must_use]
    pub fn merge_categories(&self, base: Vec<Category>, incoming: Vec<Category>) -> Vec<Category> {
        let mut ctx = Ctx::new(self.max_whys);
        upsert_all(base, incoming, &mut ctx)
    }

    /// Whether merging `incoming` into `base` would change `base`
    #[must_use]
    pub fn changes(&self, base: Option<&Category>, incoming: &Category) -> bool {
        let Some(base) = base else {
            return true;
        };
        let merged = self.merge_categories(vec![base.clone()], vec![incoming.clone()]);
        merged.first() != Some(base)
    }
}

impl MergeStrategy for TreeMergeStrategy {
    fn merge(&self, base: &Value, patch: &Value) -> Result<Merged, MergeError> {
        let base_map = base_object(base)?;
        let patch_map = patch_object(patch)?;
        let base_tree = CauseTree::from_payload(&Value::Object(base_map))?;
        let incoming = CauseTree::from_payload(patch)?;

        let cursor = incoming.cursor.clone();
        let pending = incoming.pending_switch.clone();
        let (mut tree, mut report) = self.merge_trees(base_tree, incoming);

        if patch_map.contains_key(CURSOR) && tree.cursor != cursor {
            tree.cursor = cursor;
            report.fields_updated += 1;
        }
        if patch_map.contains_key(PENDING) && tree.pending_switch != pending {
            tree.pending_switch = pending;
            report.fields_updated += 1;
        }

        tracing::debug!(
            "Tree merge: +{} categories, +{} main causes, +{} sub-causes, +{} whys ({} dropped)",
            report.categories_added,
            report.main_causes_added,
            report.sub_causes_added,
            report.whys_added,
            report.whys_dropped
        );
        Ok(Merged {
            payload: tree.to_payload()?,
            report,
        })
    }

    fn name(&self) -> &'static str {
        "tree"
    }
}

/// Merge state threaded through one tree merge
struct Ctx {
    max_whys: usize,
    report: MergeReport,
    counting: bool,
}

impl Ctx {
    fn new(max_whys: usize) -> Self {
        Self {
            max_whys,
            report: MergeReport::default(),
            counting: true,
        }
    }

    fn count(&mut self, f: impl FnOnce(&mut MergeReport)) {
        if self.counting {
            f(&mut self.report);
        }
    }
}

/// A tree level that can be upserted by id
trait Upsert: Sized {
    fn key(&self) -> &str;

    /// Fold `incoming` (same id) into `self`
    fn absorb(&mut self, incoming: Self, ctx: &mut Ctx);

    /// Prepare a node that is new to the tree
    fn admit(&mut self, ctx: &mut Ctx);
}

fn upsert_all<T: Upsert>(base: Vec<T>, incoming: Vec<T>, ctx: &mut Ctx) -> Vec<T> {
    let mut arena: IndexMap<String, T> = IndexMap::with_capacity(base.len() + incoming.len());

    // Base duplicates fold silently; only incoming changes are reported.
    let counting = ctx.counting;
    ctx.counting = false;
    for node in base {
        match arena.entry(node.key().to_string()) {
            Entry::Occupied(mut slot) => slot.get_mut().absorb(node, ctx),
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
        }
    }
    ctx.counting = counting;

    for mut node in incoming {
        match arena.entry(node.key().to_string()) {
            Entry::Occupied(mut slot) => slot.get_mut().absorb(node, ctx),
            Entry::Vacant(slot) => {
                node.admit(ctx);
                slot.insert(node);
            }
        }
    }
    arena.into_values().collect()
}

fn merge_name(target: &mut Option<String>, incoming: Option<String>, ctx: &mut Ctx) {
    if let Some(name) = incoming {
        if target.as_deref() != Some(name.as_str()) {
            *target = Some(name);
            ctx.count(|r| r.fields_updated += 1);
        }
    }
}

fn merge_extra(target: &mut Map<String, Value>, incoming: Map<String, Value>, ctx: &mut Ctx) {
    for (field, value) in incoming {
        if value.is_null() || target.get(&field) == Some(&value) {
            continue;
        }
        target.insert(field, value);
        ctx.count(|r| r.fields_updated += 1);
    }
}

/// Append `incoming` answers not already in `whys`, up to `max`
fn append_whys(whys: &mut Vec<String>, incoming: Vec<String>, ctx: &mut Ctx) {
    let mut seen: HashSet<String> = whys.iter().map(|w| normalize(w)).collect();
    for why in incoming {
        if !seen.insert(normalize(&why)) {
            continue;
        }
        if whys.len() >= ctx.max_whys {
            ctx.count(|r| r.whys_dropped += 1);
            continue;
        }
        whys.push(why);
        ctx.count(|r| r.whys_added += 1);
    }
}

impl Upsert for Category {
    fn key(&self) -> &str {
        &self.id
    }

    fn absorb(&mut self, incoming: Self, ctx: &mut Ctx) {
        merge_name(&mut self.name, incoming.name, ctx);
        merge_extra(&mut self.extra, incoming.extra, ctx);
        self.main_causes = upsert_all(std::mem::take(&mut self.main_causes), incoming.main_causes, ctx);
    }

    fn admit(&mut self, ctx: &mut Ctx) {
        ctx.count(|r| r.categories_added += 1);
        self.main_causes = upsert_all(Vec::new(), std::mem::take(&mut self.main_causes), ctx);
    }
}

impl Upsert for MainCause {
    fn key(&self) -> &str {
        &self.id
    }

    fn absorb(&mut self, incoming: Self, ctx: &mut Ctx) {
        merge_name(&mut self.name, incoming.name, ctx);
        merge_extra(&mut self.extra, incoming.extra, ctx);
        self.sub_causes = upsert_all(std::mem::take(&mut self.sub_causes), incoming.sub_causes, ctx);
    }

    fn admit(&mut self, ctx: &mut Ctx) {
        ctx.count(|r| r.main_causes_added += 1);
        self.sub_causes = upsert_all(Vec::new(), std::mem::take(&mut self.sub_causes), ctx);
    }
}

impl Upsert for SubCause {
    fn key(&self) -> &str {
        &self.id
    }

    fn absorb(&mut self, incoming: Self, ctx: &mut Ctx) {
        merge_name(&mut self.name, incoming.name, ctx);
        merge_extra(&mut self.extra, incoming.extra, ctx);
        append_whys(&mut self.whys, incoming.whys, ctx);
    }

    fn admit(&mut self, ctx: &mut Ctx) {
        ctx.count(|r| r.sub_causes_added += 1);
        let whys = std::mem::take(&mut self.whys);
        append_whys(&mut self.whys, whys, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn merge(base: &Value, patch: &Value) -> Merged {
        TreeMergeStrategy::default().merge(base, patch).unwrap()
    }

    #[test]
    fn blank_problem_keeps_base() {
        let merged = merge(&json!({"problem": {"text": "Scrap"}}), &json!({"problem": "  "}));
        assert_eq!(merged.payload["problem"], json!({"text": "Scrap"}));
    }

    #[test]
    fn problem_is_normalized_to_text_object() {
        let merged = merge(&Value::Null, &json!({"problem": "Late orders"}));
        assert_eq!(merged.payload["problem"], json!({"text": "Late orders"}));
    }

    #[test]
    fn base_entries_are_retained_and_new_appended() {
        let base = json!({"categories": [
            {"id": "a", "name": "Machine", "mainCauses": []},
            {"id": "b", "name": "Method", "mainCauses": []}
        ]});
        let patch = json!({"categories": [
            {"id": "c", "name": "People"},
            {"id": "a", "name": "Machinery"}
        ]});
        let merged = merge(&base, &patch);
        let ids: Vec<_> = merged.payload["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged.payload["categories"][0]["name"], json!("Machinery"));
        assert_eq!(merged.report.categories_added, 1);
        assert_eq!(merged.report.fields_updated, 1);
    }

    #[test]
    fn nested_levels_merge_by_id() {
        let base = json!({"categories": [{"id": "a", "mainCauses": [
            {"id": "m", "name": "Old press", "subCauses": [{"id": "s", "name": "No plan", "whys": ["w1"]}]}
        ]}]});
        let patch = json!({"categories": [{"id": "a", "mainCauses": [
            {"id": "m", "subCauses": [
                {"id": "s", "whys": ["w1", "w2"]},
                {"id": "t", "name": "No spare parts"}
            ]}
        ]}]});
        let merged = merge(&base, &patch);
        let subs = &merged.payload["categories"][0]["mainCauses"][0]["subCauses"];
        assert_eq!(subs[0]["whys"], json!(["w1", "w2"]));
        assert_eq!(subs[0]["name"], json!("No plan"));
        assert_eq!(subs[1]["id"], json!("t"));
        assert_eq!(merged.payload["categories"][0]["mainCauses"][0]["name"], json!("Old press"));
        assert_eq!(merged.report.sub_causes_added, 1);
        assert_eq!(merged.report.whys_added, 1);
    }

    #[test]
    fn missing_children_never_delete() {
        let base = json!({"categories": [{"id": "a", "mainCauses": [{"id": "m", "subCauses": [{"id": "s"}]}]}]});
        let patch = json!({"categories": [{"id": "a", "mainCauses": []}]});
        let merged = merge(&base, &patch);
        assert_eq!(merged.payload["categories"][0]["mainCauses"][0]["subCauses"][0]["id"], json!("s"));
    }

    #[test]
    fn whys_stop_at_limit_without_truncating() {
        let base = json!({"categories": [{"id": "a", "mainCauses": [{"id": "m", "subCauses": [
            {"id": "s", "whys": ["1", "2", "3", "4", "5", "6"]}
        ]}]}]});
        let patch = json!({"categories": [{"id": "a", "mainCauses": [{"id": "m", "subCauses": [
            {"id": "s", "whys": ["7"]}
        ]}]}]});
        let merged = merge(&base, &patch);
        let whys = &merged.payload["categories"][0]["mainCauses"][0]["subCauses"][0]["whys"];
        assert_eq!(whys.as_array().unwrap().len(), 6);
        assert_eq!(merged.report.whys_dropped, 1);
    }

    #[test]
    fn duplicate_incoming_ids_fold() {
        let patch = json!({"categories": [
            {"id": "a", "name": "Machine", "mainCauses": [{"id": "m1"}]},
            {"id": "a", "mainCauses": [{"id": "m2"}]}
        ]});
        let merged = merge(&Value::Null, &patch);
        let cats = merged.payload["categories"].as_array().unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0]["mainCauses"].as_array().unwrap().len(), 2);
        assert_eq!(cats[0]["name"], json!("Machine"));
    }

    #[test]
    fn labels_without_ids_land_on_same_node() {
        let base = merge(&Value::Null, &json!({"categories": [{"name": "Mano de obra"}]})).payload;
        let again = merge(&base, &json!({"categories": [{"text": "Mano de obra", "mainCauses": ["Turnover"]}]}));
        let cats = again.payload["categories"].as_array().unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0]["mainCauses"][0]["id"], json!("turnover"));
    }

    #[test]
    fn unknown_fields_survive() {
        let base = json!({"stageNote": "x", "categories": [{"id": "a", "color": "red"}]});
        let merged = merge(&base, &json!({"categories": [{"id": "a", "icon": "gear"}]}));
        assert_eq!(merged.payload["stageNote"], json!("x"));
        assert_eq!(merged.payload["categories"][0]["color"], json!("red"));
        assert_eq!(merged.payload["categories"][0]["icon"], json!("gear"));
    }

    #[test]
    fn control_fields_use_presence() {
        let base = json!({"cursor": {"categoryId": "a"}, "categories": [{"id": "a"}]});
        let kept = merge(&base, &json!({"categories": []}));
        assert_eq!(kept.payload["cursor"], json!({"categoryId": "a"}));

        let cleared = merge(&base, &json!({"cursor": null}));
        assert!(cleared.payload.get("cursor").is_none());

        let moved = merge(&base, &json!({"cursor": {"categoryId": "a", "mainCauseId": "m"}}));
        assert_eq!(moved.payload["cursor"]["mainCauseId"], json!("m"));
    }

    #[test]
    fn rejects_non_object_patch() {
        let result = TreeMergeStrategy::default().merge(&Value::Null, &json!(["a"]));
        assert_eq!(result, Err(MergeError::patch_not_object()));
    }

    #[test]
    fn changes_detects_noop_category() {
        let strategy = TreeMergeStrategy::default();
        let base = Category::named("Machine").with_main_cause(MainCause::named("Old press"));
        assert!(!strategy.changes(Some(&base), &Category::named("Machine")));
        assert!(strategy.changes(
            Some(&base),
            &Category::named("Machine").with_main_cause(MainCause::named("Dull tools"))
        ));
        assert!(strategy.changes(None, &Category::named("Machine")));
    }
}
