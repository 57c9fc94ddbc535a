#![doc(test(attr(deny(warnings))))]

//! Where-clause planning (spec.md Sec. 4.3): turns a parsed where-clause into
//! one `flake-exec` can run efficiently, by reordering its binding-pattern
//! prefix by estimated selectivity, inlining/pushing down filters, and
//! recognizing the simple-subject-crawl fast path. Also produces the
//! human-readable [`PlanExplanation`].
//!
//! Unlike the teacher's `rdf-fusion-logical`, which builds a DataFusion
//! `LogicalPlan` tree to hand to the optimizer and physical planner, this
//! crate operates directly on `flake-parser`'s row-oriented `WherePattern`
//! list and returns a (possibly reordered) list of the same shape — there is
//! no separate logical-plan IR, since the row-oriented executor (spec.md
//! Sec. 9) runs the where-clause directly.

mod bindings;
mod crawl;
mod explain;
mod pushdown;
mod reorder;

pub use explain::{explain, PatternExplanation, PlanExplanation, Segment};

use flake_common::Optimizable;
use flake_parser::{ParsedQuery, WherePattern};

/// The outcome of planning: the where-clause `flake-exec` should run, whether
/// it qualifies for the simple-subject-crawl fast path, and a diagnostic
/// explanation of the decisions made.
#[derive(Debug)]
pub struct PlannedQuery {
    pub where_clause: Vec<WherePattern>,
    /// Set when the query is eligible for `flake_exec::simple_subject_crawl`
    /// (spec.md Sec. 4.7): a single-variable select-crawl over triple patterns
    /// that all share that subject.
    pub simple_subject_crawl: bool,
    pub explanation: PlanExplanation,
}

/// Plans `query.where_clause` against `optimizable`'s selectivity estimates
/// (spec.md Sec. 4.3). Planning cannot fail: a where-clause that doesn't
/// qualify for any optimization is simply returned unchanged (minus the
/// mandatory reorder/pushdown passes, which are no-ops on an already-optimal
/// clause).
pub fn plan(query: &ParsedQuery, optimizable: &dyn Optimizable) -> PlannedQuery {
    let where_clause = reorder::reorder(query.where_clause.clone(), optimizable);
    let where_clause = pushdown::push_down_filters(where_clause);
    let simple_subject_crawl = crawl::is_simple_subject_crawl(&query.select, &where_clause);
    let explanation = explain::explain(&where_clause, &query.context, optimizable);
    PlannedQuery { where_clause, simple_subject_crawl, explanation }
}

// `active_graph.rs`, `expr_builder*.rs`, `extend/`, `join/`,
// `logical_plan_builder*.rs`, `minus/`, `paths/`, `patterns/`, `quad_pattern/`,
// `quads/`, `system_columns.rs`, and `tests/logical_plan/` — pristine teacher
// reference material building DataFusion `LogicalPlan` trees with no
// counterpart in this crate's row-oriented where-clause planning — were
// removed in the final trimming pass.

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::{NamedNode, TypedValue, VariableId, VariableTable};
    use flake_parser::{Context, OpType, PredRef, SelectClause, SelectMode, SelectTree, Term};
    use flake_storage::test_util::Fixture;

    fn iri(s: &str) -> PredRef {
        PredRef::Iri(NamedNode::new(s).unwrap())
    }

    fn query(where_clause: Vec<WherePattern>, select: SelectClause) -> ParsedQuery {
        ParsedQuery {
            variables: VariableTable::new(),
            op_type: OpType::Select,
            select,
            select_mode: SelectMode::Many,
            where_clause,
            order_by: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            limit: None,
            offset: 0,
            depth: 1,
            context: Context::default(),
            dialect: Default::default(),
            supplied_vars: Vec::new(),
            max_fuel: None,
            opts: serde_json::Value::Null,
        }
    }

    #[test]
    fn plan_reorders_and_recognizes_crawl_eligibility() {
        let mut fixture = Fixture::new();
        fixture.triple("ex:alice", "ex:name", TypedValue::string("Alice"));
        for i in 0..50 {
            fixture.triple(&format!("ex:s{i}"), "ex:country", TypedValue::string("US"));
        }
        let snapshot = fixture.build();

        let v0 = VariableId(0);
        let v1 = VariableId(1);
        let where_clause = vec![
            WherePattern::Triple { subject: Term::Var(v0), predicate: iri("ex:country"), object: Term::Var(v1) },
            WherePattern::Triple {
                subject: Term::Var(v0),
                predicate: iri("ex:name"),
                object: Term::Literal(TypedValue::string("Alice")),
            },
        ];
        let select = SelectClause::Crawl { variable: v0, tree: SelectTree::default() };
        let q = query(where_clause, select);

        let planned = plan(&q, snapshot.as_ref());
        assert!(planned.simple_subject_crawl);
        match &planned.where_clause[0] {
            WherePattern::Triple { predicate: PredRef::Iri(p), .. } => assert_eq!(p.as_str(), "ex:name"),
            other => panic!("expected the more selective pattern first, got {other:?}"),
        }
        assert!(planned.explanation.to_string().contains("triple"));
    }

    #[test]
    fn non_crawl_select_is_never_flagged_eligible() {
        let snapshot = Fixture::new().triple("ex:a", "ex:p", TypedValue::integer(1)).build();
        let v0 = VariableId(0);
        let where_clause =
            vec![WherePattern::Triple { subject: Term::Var(v0), predicate: iri("ex:p"), object: Term::Var(VariableId(1)) }];
        let select = SelectClause::Items(vec![flake_parser::SelectItem::Var(v0)]);
        let planned = plan(&query(where_clause, select), snapshot.as_ref());
        assert!(!planned.simple_subject_crawl);
    }
}
