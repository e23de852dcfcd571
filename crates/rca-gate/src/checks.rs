//! Minimum-content checks for stages 0 through 4
//!
//! Each check returns the metrics it measured on success and the first
//! unmet condition otherwise. Checks run in a fixed order so the same
//! draft always reports the same reason.

use crate::failure::GateFailure;
use crate::score::Metric;
use crate::thresholds::Thresholds;
use rca_artifact::text::has_content;
use rca_artifact::types::{
    CaseContext, CauseTree, IdeaList, ProductivityDraft, Quadrant, QuadrantState, UnitType,
};
use rca_artifact::Stage;

/// Sector, products and process focus
pub fn case_context(ctx: &CaseContext, t: &Thresholds) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::CaseContext;
    if let Some(field) = ctx.missing_fields().first().copied() {
        return Err(GateFailure::MissingField { stage: STAGE, field });
    }
    let products = ctx.filled_products().len();
    if products > t.max_products {
        return Err(GateFailure::AboveMaximum {
            stage: STAGE,
            metric: "products",
            current: products,
            allowed: t.max_products,
        });
    }
    let focus = ctx.filled_process_focus().len();
    if focus > t.max_process_focus {
        return Err(GateFailure::AboveMaximum {
            stage: STAGE,
            metric: "processFocus",
            current: focus,
            allowed: t.max_process_focus,
        });
    }
    Ok(vec![
        Metric::new("sector", 1, 1),
        Metric::new("products", products, 1),
        Metric::new("processFocus", focus, 1),
    ])
}

/// Unit type with justification; monetary needs income and costs
pub fn productivity(draft: &ProductivityDraft, _t: &Thresholds) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::Productivity;
    let Some(unit) = draft.unit_type else {
        return Err(GateFailure::MissingField {
            stage: STAGE,
            field: "unitType",
        });
    };
    if !has_content(Some(&draft.justification)) {
        return Err(GateFailure::MissingField {
            stage: STAGE,
            field: "justification",
        });
    }
    let priced = draft.cost_items.iter().filter(|c| c.amount.is_some()).count();
    let mut metrics = vec![Metric::new("justification", 1, 1)];
    if unit == UnitType::Monetary {
        if draft.income.is_none() {
            return Err(GateFailure::MissingField {
                stage: STAGE,
                field: "income",
            });
        }
        if draft.total_cost().is_none() {
            return Err(GateFailure::below(STAGE, "costItems", priced, 1));
        }
        metrics.push(Metric::new("income", 1, 1));
        metrics.push(Metric::new("costItems", priced, 1));
    } else {
        let supplied = usize::from(draft.physical_output.is_some()) + usize::from(draft.physical_input.is_some());
        metrics.push(Metric::new("physicalMeasures", supplied, 2));
    }
    Ok(metrics)
}

/// Item counts per bucket; external items need evidence
pub fn quadrants(state: &QuadrantState, t: &Thresholds) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::Quadrants;
    let mut metrics = Vec::with_capacity(Quadrant::ALL.len());
    for quadrant in Quadrant::ALL {
        let filled = state.filled(quadrant);
        if filled < t.min_quadrant_items {
            return Err(GateFailure::below(STAGE, quadrant.field(), filled, t.min_quadrant_items));
        }
        metrics.push(Metric::new(quadrant.field(), filled, t.min_quadrant_items));
    }
    for quadrant in Quadrant::ALL.into_iter().filter(|q| q.is_external()) {
        let items: Vec<String> = state
            .bucket(quadrant)
            .iter()
            .filter(|i| i.has_text() && !i.has_evidence())
            .map(|i| i.text.trim().to_string())
            .collect();
        if !items.is_empty() {
            return Err(GateFailure::MissingEvidence {
                stage: STAGE,
                quadrant: quadrant.field(),
                items,
            });
        }
    }
    Ok(metrics)
}

/// Problem statement and distinct idea count
pub fn ideas(list: &IdeaList, t: &Thresholds) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::Ideas;
    if !has_content(Some(&list.problem_statement)) {
        return Err(GateFailure::MissingField {
            stage: STAGE,
            field: "problemStatement",
        });
    }
    let distinct = list.distinct_ideas().len();
    if distinct < t.min_ideas {
        return Err(GateFailure::below(STAGE, "ideas", distinct, t.min_ideas));
    }
    Ok(vec![Metric::new("ideas", distinct, t.min_ideas)])
}

/// Tree shape, per-level minimums and root-candidate count
pub fn cause_tree(tree: &CauseTree, t: &Thresholds) -> Result<Vec<Metric>, GateFailure> {
    const STAGE: Stage = Stage::CauseTree;
    let ids = tree.duplicate_ids();
    if !ids.is_empty() {
        return Err(GateFailure::DuplicateIds { ids });
    }
    if tree.problem.is_blank() {
        return Err(GateFailure::MissingField {
            stage: STAGE,
            field: "problem",
        });
    }
    let categories = tree.categories.len();
    if categories < t.min_categories {
        return Err(GateFailure::below(STAGE, "categories", categories, t.min_categories));
    }
    let sparse: Vec<String> = tree
        .categories
        .iter()
        .filter(|c| c.main_causes.len() < t.min_main_causes)
        .map(|c| c.label().to_string())
        .collect();
    if !sparse.is_empty() {
        return Err(GateFailure::SparseCategories {
            categories: sparse,
            required: t.min_main_causes,
        });
    }
    let shallow: Vec<String> = tree
        .categories
        .iter()
        .flat_map(|c| c.main_causes.iter())
        .filter(|m| m.sub_causes.len() < t.min_sub_causes)
        .map(|m| m.label().to_string())
        .collect();
    if !shallow.is_empty() {
        return Err(GateFailure::SparseMainCauses {
            main_causes: shallow,
            required: t.min_sub_causes,
        });
    }
    let candidates = tree.root_candidates().len();
    if candidates < t.min_root_candidates {
        return Err(GateFailure::below(STAGE, "rootCandidates", candidates, t.min_root_candidates));
    }
    Ok(vec![
        Metric::new("categories", categories, t.min_categories),
        Metric::new("mainCauses", tree.main_cause_count(), t.min_categories * t.min_main_causes),
        Metric::new("rootCandidates", candidates, t.min_root_candidates),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rca_artifact::types::{Category, CostItem, Idea, MainCause, QuadrantItem, SubCause};

    fn branch(name: &str) -> MainCause {
        MainCause::named(name).with_sub_cause(SubCause::named(&format!("{name} root")))
    }

    #[test]
    fn case_context_reports_first_missing_field() {
        let ctx = CaseContext {
            sector: "Bakery".into(),
            ..CaseContext::default()
        };
        assert_eq!(
            case_context(&ctx, &Thresholds::default()),
            Err(GateFailure::MissingField {
                stage: Stage::CaseContext,
                field: "products"
            })
        );
    }

    #[test]
    fn case_context_caps_products() {
        let ctx = CaseContext {
            sector: "Bakery".into(),
            products: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            process_focus: vec!["baking".into()],
            ..CaseContext::default()
        };
        assert!(matches!(
            case_context(&ctx, &Thresholds::default()),
            Err(GateFailure::AboveMaximum { current: 4, allowed: 3, .. })
        ));
    }

    #[test]
    fn monetary_productivity_needs_priced_cost() {
        let mut draft = ProductivityDraft::with_default_items();
        draft.unit_type = Some(UnitType::Monetary);
        draft.justification = "sales are tracked in money".into();
        draft.income = Some(1200.0);
        assert!(matches!(
            productivity(&draft, &Thresholds::default()),
            Err(GateFailure::BelowMinimum { metric: "costItems", .. })
        ));
        draft.cost_items[0] = CostItem {
            amount: Some(300.0),
            ..CostItem::named("materials")
        };
        assert!(productivity(&draft, &Thresholds::default()).is_ok());
    }

    #[test]
    fn physical_productivity_only_needs_justification() {
        let draft = ProductivityDraft {
            unit_type: Some(UnitType::Physical),
            justification: "units per hour".into(),
            ..ProductivityDraft::default()
        };
        assert!(productivity(&draft, &Thresholds::default()).is_ok());
    }

    #[test]
    fn external_quadrants_need_evidence() {
        let three = |q: &str| {
            (1..=3)
                .map(|i| QuadrantItem::new(&format!("{q} {i}")).with_evidence("report"))
                .collect::<Vec<_>>()
        };
        let mut state = QuadrantState {
            strengths: three("s"),
            weaknesses: three("w"),
            opportunities: three("o"),
            threats: three("t"),
            ..QuadrantState::default()
        };
        assert!(quadrants(&state, &Thresholds::default()).is_ok());
        state.threats.push(QuadrantItem::new("new competitor"));
        assert_eq!(
            quadrants(&state, &Thresholds::default()),
            Err(GateFailure::MissingEvidence {
                stage: Stage::Quadrants,
                quadrant: "threats",
                items: vec!["new competitor".into()],
            })
        );
    }

    #[test]
    fn ideas_count_distinct_texts() {
        let list = IdeaList {
            problem_statement: "late deliveries".into(),
            ideas: (0..12).map(|i| Idea::new(format!("idea {}", i % 6))).collect(),
            ..IdeaList::default()
        };
        assert_eq!(
            ideas(&list, &Thresholds::default()),
            Err(GateFailure::below(Stage::Ideas, "ideas", 6, 10))
        );
    }

    #[test]
    fn tree_cites_sparse_categories() {
        let names = ["Machine", "Method", "Material", "Manpower", "Measurement", "Environment"];
        let mut tree = CauseTree::with_problem("late deliveries");
        for (i, name) in names.iter().enumerate() {
            let mut category = Category::named(name).with_main_cause(branch(&format!("{name} a")));
            if i >= 2 {
                category = category.with_main_cause(branch(&format!("{name} b")));
            }
            tree.categories.push(category);
        }
        let failure = cause_tree(&tree, &Thresholds::default()).unwrap_err();
        assert_eq!(
            failure,
            GateFailure::SparseCategories {
                categories: vec!["Machine".into(), "Method".into()],
                required: 2
            }
        );
        assert!(failure.to_string().contains("minimum 2"));
    }

    #[test]
    fn complete_tree_passes() {
        let names = ["Machine", "Method", "Material", "Manpower", "Measurement", "Environment"];
        let mut tree = CauseTree::with_problem("late deliveries");
        for name in names {
            tree.categories.push(
                Category::named(name)
                    .with_main_cause(branch(&format!("{name} a")))
                    .with_main_cause(branch(&format!("{name} b"))),
            );
        }
        let metrics = cause_tree(&tree, &Thresholds::default()).unwrap();
        assert_eq!(metrics[2], Metric::new("rootCandidates", 12, 10));
    }
}
