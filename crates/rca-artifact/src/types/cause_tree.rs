//! Ishikawa cause tree (stage 4)
//!
//! Four bounded levels: categories → main causes → sub-causes → why-chains.
//! The tree is parsed leniently because it arrives both from storage and
//! from the interpretation oracle:
//!
//! - `name` and `text` are accepted interchangeably as a node label
//! - ids may be strings or numbers; a missing id is derived from the label
//! - nodes with neither id nor label are discarded
//! - the problem may be a bare string or `{text}`
//!
//! Serialization always produces the canonical shape (`name`, `{text}`).
//! Unknown fields on every node are preserved.

use crate::artifact::{private, StagePayload};
use crate::hash::ContentHash;
use crate::stage::Stage;
use crate::text::{collapse_whitespace, normalize, slug};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// The tree as stored in a stage 4 payload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCauseTree")]
pub struct CauseTree {
    /// Problem under analysis
    pub problem: Problem,
    /// Top-level categories (e.g. the 6M)
    pub categories: Vec<Category>,
    /// Branch under guided drill-down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
    /// Content held back until the student confirms a branch switch
    #[serde(rename = "pendingBranchSwitch", skip_serializing_if = "Option::is_none")]
    pub pending_switch: Option<PendingSwitch>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Problem statement in canonical `{text}` form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ProblemRepr")]
pub struct Problem {
    /// Statement; blank means absent
    pub text: String,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Problem {
    /// Problem with the given statement
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }

    /// Whether the statement has content
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Cause category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCategory")]
pub struct Category {
    /// Id, unique among categories
    pub id: String,
    /// Label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Main causes
    pub main_causes: Vec<MainCause>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Main cause within a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawMainCause")]
pub struct MainCause {
    /// Id, unique within its category
    pub id: String,
    /// Label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sub-causes
    pub sub_causes: Vec<SubCause>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sub-cause with its why-chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSubCause")]
pub struct SubCause {
    /// Id, unique within its main cause
    pub id: String,
    /// Label; sub-causes with a label are root candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered why answers, shallowest first
    pub whys: Vec<String>,
    /// Unknown fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Focus pointer, holding ids only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCursor")]
pub struct Cursor {
    /// Focused category
    pub category_id: String,
    /// Focused main cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_cause_id: Option<String>,
    /// Focused sub-cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_cause_id: Option<String>,
}

impl Cursor {
    /// Cursor on a category only
    #[must_use]
    pub fn category(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            main_cause_id: None,
            sub_cause_id: None,
        }
    }

    /// Cursor on a main cause branch
    #[must_use]
    pub fn branch(category_id: impl Into<String>, main_cause_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            main_cause_id: Some(main_cause_id.into()),
            sub_cause_id: None,
        }
    }

    /// Same cursor also pointing at a sub-cause
    #[must_use]
    pub fn with_sub_cause(mut self, sub_cause_id: impl Into<String>) -> Self {
        self.sub_cause_id = Some(sub_cause_id.into());
        self
    }
}

/// Categories held back while another branch is focused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSwitch {
    /// Ids of the held categories, in arrival order
    pub category_ids: Vec<String>,
    /// Held content
    pub categories: Vec<Category>,
}

/// One entry of the root-candidate set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCandidate {
    /// Owning category
    pub category_id: String,
    /// Owning main cause
    pub main_cause_id: String,
    /// Sub-cause id
    pub sub_cause_id: String,
    /// Sub-cause text
    pub text: String,
}

/// Per-category counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    /// Category id
    pub id: String,
    /// Category label (or id)
    pub label: String,
    /// Number of main causes
    pub main_causes: usize,
    /// Number of sub-causes across main causes
    pub sub_causes: usize,
    /// Longest why-chain in the category
    pub deepest_why: usize,
}

/// Summary used by gate messages and oracle context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeProgress {
    /// Per-category counts
    pub categories: Vec<CategoryProgress>,
    /// Size of the de-duplicated root-candidate set
    pub root_candidates: usize,
}

impl CauseTree {
    /// Empty tree for a problem
    #[must_use]
    pub fn with_problem(problem: impl Into<String>) -> Self {
        Self {
            problem: Problem::new(problem),
            ..Self::default()
        }
    }

    /// Whether nothing has been captured yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problem.is_blank() && self.categories.is_empty()
    }

    /// Category by id
    #[must_use]
    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Main cause by ids
    #[must_use]
    pub fn main_cause(&self, category_id: &str, main_cause_id: &str) -> Option<&MainCause> {
        self.category(category_id)?
            .main_causes
            .iter()
            .find(|m| m.id == main_cause_id)
    }

    /// Sub-cause by ids
    #[must_use]
    pub fn sub_cause(
        &self,
        category_id: &str,
        main_cause_id: &str,
        sub_cause_id: &str,
    ) -> Option<&SubCause> {
        self.main_cause(category_id, main_cause_id)?
            .sub_causes
            .iter()
            .find(|s| s.id == sub_cause_id)
    }

    /// Whether `cursor` resolves to existing nodes
    #[must_use]
    pub fn resolves(&self, cursor: &Cursor) -> bool {
        match (&cursor.main_cause_id, &cursor.sub_cause_id) {
            (None, None) => self.category(&cursor.category_id).is_some(),
            (Some(main), None) => self.main_cause(&cursor.category_id, main).is_some(),
            (Some(main), Some(sub)) => self.sub_cause(&cursor.category_id, main, sub).is_some(),
            (None, Some(_)) => false,
        }
    }

    /// Total main causes
    #[must_use]
    pub fn main_cause_count(&self) -> usize {
        self.categories.iter().map(|c| c.main_causes.len()).sum()
    }

    /// Total why answers across all sub-causes
    #[must_use]
    pub fn why_count(&self) -> usize {
        self.sub_causes().map(|(_, _, s)| s.whys.len()).sum()
    }

    /// Iterate over `(category, main cause, sub-cause)` triples
    pub fn sub_causes(&self) -> impl Iterator<Item = (&Category, &MainCause, &SubCause)> {
        self.categories.iter().flat_map(|c| {
            c.main_causes
                .iter()
                .flat_map(move |m| m.sub_causes.iter().map(move |s| (c, m, s)))
        })
    }

    /// Flattened sub-cause texts, de-duplicated by normalised text
    #[must_use]
    pub fn root_candidates(&self) -> Vec<RootCandidate> {
        let mut seen = HashSet::new();
        self.sub_causes()
            .filter_map(|(c, m, s)| {
                let text = collapse_whitespace(s.name.as_deref()?);
                if text.is_empty() || !seen.insert(normalize(&text)) {
                    return None;
                }
                Some(RootCandidate {
                    category_id: c.id.clone(),
                    main_cause_id: m.id.clone(),
                    sub_cause_id: s.id.clone(),
                    text,
                })
            })
            .collect()
    }

    /// Per-category counts and candidate total
    #[must_use]
    pub fn progress(&self) -> TreeProgress {
        let categories = self
            .categories
            .iter()
            .map(|c| CategoryProgress {
                id: c.id.clone(),
                label: c.label().to_string(),
                main_causes: c.main_causes.len(),
                sub_causes: c.main_causes.iter().map(|m| m.sub_causes.len()).sum(),
                deepest_why: c
                    .main_causes
                    .iter()
                    .flat_map(|m| m.sub_causes.iter())
                    .map(|s| s.whys.len())
                    .max()
                    .unwrap_or(0),
            })
            .collect();
        TreeProgress {
            categories,
            root_candidates: self.root_candidates().len(),
        }
    }

    /// Node paths whose id repeats within the same parent
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut dups = Vec::new();
        let mut cats = HashSet::new();
        for c in &self.categories {
            if !cats.insert(c.id.as_str()) {
                dups.push(c.id.clone());
            }
            let mut mains = HashSet::new();
            for m in &c.main_causes {
                if !mains.insert(m.id.as_str()) {
                    dups.push(format!("{}/{}", c.id, m.id));
                }
                let mut subs = HashSet::new();
                for s in &m.sub_causes {
                    if !subs.insert(s.id.as_str()) {
                        dups.push(format!("{}/{}/{}", c.id, m.id, s.id));
                    }
                }
            }
        }
        dups
    }
}

impl Category {
    /// Category with a label, id derived from it
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            id: derive_id(name),
            name: Some(name.to_string()),
            main_causes: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder: append a main cause
    #[must_use]
    pub fn with_main_cause(mut self, main: MainCause) -> Self {
        self.main_causes.push(main);
        self
    }

    /// Label or id
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl MainCause {
    /// Main cause with a label, id derived from it
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            id: derive_id(name),
            name: Some(name.to_string()),
            sub_causes: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder: append a sub-cause
    #[must_use]
    pub fn with_sub_cause(mut self, sub: SubCause) -> Self {
        self.sub_causes.push(sub);
        self
    }

    /// Label or id
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl SubCause {
    /// Sub-cause with a label, id derived from it
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            id: derive_id(name),
            name: Some(name.to_string()),
            whys: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder: append a why answer
    #[must_use]
    pub fn with_why(mut self, why: &str) -> Self {
        self.whys.push(why.to_string());
        self
    }

    /// Label or id
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl private::Sealed for CauseTree {}

impl StagePayload for CauseTree {
    const STAGE: Stage = Stage::CauseTree;
}

/// Id for a node that arrived without one
///
/// Derived from the label so re-sending the same unnamed entry lands on the
/// same node.
#[must_use]
pub fn derive_id(label: &str) -> String {
    let id = slug(label);
    if id.is_empty() {
        format!("n-{}", ContentHash::compute(normalize(label).as_bytes()).short())
    } else {
        id
    }
}

// ---------------------------------------------------------------------------
// Lenient wire forms
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCauseTree {
    #[serde(default)]
    problem: Option<Problem>,
    #[serde(default, deserialize_with = "de_nodes")]
    categories: Vec<Category>,
    #[serde(default, deserialize_with = "de_cursor")]
    cursor: Option<Cursor>,
    #[serde(default, rename = "pendingBranchSwitch")]
    pending_switch: Option<PendingSwitch>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawCauseTree> for CauseTree {
    fn from(raw: RawCauseTree) -> Self {
        Self {
            problem: raw.problem.unwrap_or_default(),
            categories: raw.categories,
            cursor: raw.cursor,
            pending_switch: raw.pending_switch,
            extra: raw.extra,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProblemRepr {
    Text(String),
    Object {
        #[serde(default)]
        text: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<ProblemRepr> for Problem {
    fn from(repr: ProblemRepr) -> Self {
        match repr {
            ProblemRepr::Text(text) => Problem::new(text.trim()),
            ProblemRepr::Object { text, extra } => Problem {
                text: text.map(|t| t.trim().to_string()).unwrap_or_default(),
                extra,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    #[serde(default, deserialize_with = "de_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "de_nodes")]
    main_causes: Vec<MainCause>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawCategory> for Category {
    fn from(raw: RawCategory) -> Self {
        let name = label_of(raw.name, raw.text);
        Self {
            id: id_of(raw.id, name.as_deref()),
            name,
            main_causes: raw.main_causes,
            extra: raw.extra,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMainCause {
    #[serde(default, deserialize_with = "de_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "de_nodes")]
    sub_causes: Vec<SubCause>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawMainCause> for MainCause {
    fn from(raw: RawMainCause) -> Self {
        let name = label_of(raw.name, raw.text);
        Self {
            id: id_of(raw.id, name.as_deref()),
            name,
            sub_causes: raw.sub_causes,
            extra: raw.extra,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubCause {
    #[serde(default, deserialize_with = "de_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "de_whys")]
    whys: Vec<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawSubCause> for SubCause {
    fn from(raw: RawSubCause) -> Self {
        let name = label_of(raw.name, raw.text);
        Self {
            id: id_of(raw.id, name.as_deref()),
            name,
            whys: raw.whys,
            extra: raw.extra,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCursor {
    #[serde(default, deserialize_with = "de_id")]
    category_id: Option<String>,
    #[serde(default, deserialize_with = "de_id")]
    main_cause_id: Option<String>,
    #[serde(default, deserialize_with = "de_id")]
    sub_cause_id: Option<String>,
}

impl TryFrom<RawCursor> for Cursor {
    type Error = String;

    fn try_from(raw: RawCursor) -> Result<Self, Self::Error> {
        let category_id = raw
            .category_id
            .ok_or_else(|| "cursor requires categoryId".to_string())?;
        // A sub-cause focus is meaningless without its main cause.
        let sub_cause_id = raw.sub_cause_id.filter(|_| raw.main_cause_id.is_some());
        Ok(Self {
            category_id,
            main_cause_id: raw.main_cause_id,
            sub_cause_id,
        })
    }
}

/// Trait implemented by node types so `de_nodes` can drop unusable entries
trait Node {
    fn is_usable(&self) -> bool;
}

impl Node for Category {
    fn is_usable(&self) -> bool {
        !self.id.is_empty()
    }
}

impl Node for MainCause {
    fn is_usable(&self) -> bool {
        !self.id.is_empty()
    }
}

impl Node for SubCause {
    fn is_usable(&self) -> bool {
        !self.id.is_empty()
    }
}

fn label_of(name: Option<String>, text: Option<String>) -> Option<String> {
    name.into_iter()
        .chain(text)
        .map(|l| collapse_whitespace(&l))
        .find(|l| !l.is_empty())
}

fn id_of(id: Option<String>, label: Option<&str>) -> String {
    match id.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()) {
        Some(id) => id,
        None => label.map(derive_id).unwrap_or_default(),
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        None => None,
        Some(IdRepr::Str(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(IdRepr::Int(i)) => Some(i.to_string()),
        Some(IdRepr::Float(f)) => Some(f.to_string()),
    })
}

fn de_nodes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Node,
{
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut nodes = Vec::with_capacity(items.len());
    for item in items {
        let item = match item {
            Value::Null => continue,
            Value::String(label) => serde_json::json!({ "name": label }),
            other => other,
        };
        let node: T = serde_json::from_value(item).map_err(serde::de::Error::custom)?;
        if node.is_usable() {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn de_whys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WhyRepr {
        Text(String),
        Object { text: String },
    }

    let items = Option::<Vec<Option<WhyRepr>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .flatten()
        .map(|w| match w {
            WhyRepr::Text(t) | WhyRepr::Object { text: t } => collapse_whitespace(&t),
        })
        .filter(|w| !w.is_empty())
        .collect())
}

fn de_cursor<'de, D>(deserializer: D) -> Result<Option<Cursor>, D::Error>
where
    D: Deserializer<'de>,
{
    // A malformed cursor is dropped rather than failing the whole tree.
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value::<Cursor>(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_bare_string_problem() {
        let tree: CauseTree = serde_json::from_value(json!({"problem": " Late orders "})).unwrap();
        assert_eq!(tree.problem.text, "Late orders");
        let out = serde_json::to_value(&tree).unwrap();
        assert_eq!(out["problem"], json!({"text": "Late orders"}));
    }

    #[test]
    fn accepts_text_alias_and_numeric_ids() {
        let tree: CauseTree = serde_json::from_value(json!({
            "categories": [{
                "id": 1,
                "text": "Machine",
                "mainCauses": [{"text": "Old press", "subCauses": [{"id": "s1", "text": "No maintenance plan"}]}]
            }]
        }))
        .unwrap();
        let cat = &tree.categories[0];
        assert_eq!(cat.id, "1");
        assert_eq!(cat.name.as_deref(), Some("Machine"));
        assert_eq!(cat.main_causes[0].id, "old-press");
        assert_eq!(cat.main_causes[0].sub_causes[0].id, "s1");
    }

    #[test]
    fn drops_nodes_without_id_or_label() {
        let tree: CauseTree = serde_json::from_value(json!({
            "categories": [{"name": "  "}, null, {"id": "c2"}]
        }))
        .unwrap();
        assert_eq!(tree.categories.len(), 1);
        assert_eq!(tree.categories[0].id, "c2");
        assert_eq!(tree.categories[0].name, None);
    }

    #[test]
    fn whys_accept_objects_and_skip_blanks() {
        let tree: CauseTree = serde_json::from_value(json!({
            "categories": [{"id": "c", "mainCauses": [{"id": "m", "subCauses": [
                {"id": "s", "whys": ["one", {"text": "two"}, "  ", null]}
            ]}]}]
        }))
        .unwrap();
        assert_eq!(tree.sub_cause("c", "m", "s").unwrap().whys, vec!["one", "two"]);
    }

    #[test]
    fn preserves_unknown_fields() {
        let input = json!({
            "problem": {"text": "p", "owner": "team"},
            "version": 3,
            "categories": [{"id": "c", "name": "Method", "color": "red", "mainCauses": []}]
        });
        let tree: CauseTree = serde_json::from_value(input).unwrap();
        let out = serde_json::to_value(&tree).unwrap();
        assert_eq!(out["version"], json!(3));
        assert_eq!(out["problem"]["owner"], json!("team"));
        assert_eq!(out["categories"][0]["color"], json!("red"));
    }

    #[test]
    fn bare_string_nodes_become_labels() {
        let tree: CauseTree =
            serde_json::from_value(json!({"categories": ["Machine", "Method"]})).unwrap();
        let ids: Vec<_> = tree.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["machine", "method"]);
    }

    #[test]
    fn malformed_cursor_is_dropped() {
        let tree: CauseTree =
            serde_json::from_value(json!({"cursor": {"mainCauseId": "m"}})).unwrap();
        assert_eq!(tree.cursor, None);
    }

    #[test]
    fn root_candidates_dedupe_by_normalized_text() {
        let tree = CauseTree::with_problem("p").categories_from(vec![
            Category::named("Method").with_main_cause(
                MainCause::named("No standard")
                    .with_sub_cause(SubCause::named("Missing checklist"))
                    .with_sub_cause(SubCause::named("missing  CHECKLIST")),
            ),
            Category::named("People")
                .with_main_cause(MainCause::named("Training").with_sub_cause(SubCause::named("No onboarding"))),
        ]);
        let texts: Vec<_> = tree.root_candidates().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["Missing checklist", "No onboarding"]);
    }

    #[test]
    fn duplicate_ids_are_reported_per_scope() {
        let tree = CauseTree::default().categories_from(vec![
            Category::named("A").with_main_cause(MainCause::named("x")).with_main_cause(MainCause::named("x")),
            Category::named("B").with_main_cause(MainCause::named("x")),
        ]);
        assert_eq!(tree.duplicate_ids(), vec!["a/x".to_string()]);
    }

    #[test]
    fn progress_counts() {
        let tree = CauseTree::default().categories_from(vec![Category::named("A").with_main_cause(
            MainCause::named("m").with_sub_cause(SubCause::named("s").with_why("w1").with_why("w2")),
        )]);
        let progress = tree.progress();
        assert_eq!(progress.categories[0].main_causes, 1);
        assert_eq!(progress.categories[0].deepest_why, 2);
        assert_eq!(progress.root_candidates, 1);
    }

    #[test]
    fn derive_id_falls_back_to_hash() {
        assert_eq!(derive_id("Mano de obra"), "mano-de-obra");
        assert!(derive_id("???").starts_with("n-"));
    }

    impl CauseTree {
        fn categories_from(mut self, categories: Vec<Category>) -> Self {
            self.categories = categories;
            self
        }
    }
}
