//! Explain output (spec.md Sec. 4.3 "Explain"): "ordered list of patterns
//! with pattern-type, selectivity, whether optimizable, a user-printable
//! (subject, property, object) rendering with IRIs compacted via the query
//! context, and segmentation into reorderable runs and fence boundaries."
//!
//! `PlanExplanation` mirrors the teacher's `QueryExplanation`
//! (`lib/engine/src/sparql/explanation.rs`, a before/after/executed-plan
//! bundle) in spirit — a diagnostic snapshot taken alongside planning — but
//! carries plain data instead of DataFusion plan trees, and implements
//! [`std::fmt::Display`] directly (SPEC_FULL.md's supplemented-features
//! section) rather than relying on a caller to pretty-print a `LogicalPlan`.

use flake_common::{Optimizable, PatternShape};
use flake_parser::{Context, PredRef, Term, WherePattern};
use std::fmt;

/// One line of the explanation: a pattern's type, its estimated selectivity
/// (absent for non-triple patterns, which the selectivity estimator does not
/// score), whether the planner was free to reorder it, and its rendered form.
#[derive(Clone, Debug)]
pub struct PatternExplanation {
    pub kind: &'static str,
    pub selectivity: Option<u64>,
    pub optimizable: bool,
    pub rendering: String,
}

/// Whether segment `i` starts a new reorderable run or continues the
/// previous one (spec.md Sec. 4.3 "segmentation into reorderable runs and
/// fence boundaries").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    RunStart,
    RunContinues,
    Fence,
}

#[derive(Clone, Debug)]
pub struct PlanExplanation {
    pub patterns: Vec<(Segment, PatternExplanation)>,
}

fn compact(context: &Context, iri: &str) -> String {
    context
        .prefixes
        .iter()
        .rev()
        .filter(|(_, ns)| iri.starts_with(ns.as_str()) && !ns.is_empty())
        .max_by_key(|(_, ns)| ns.len())
        .map(|(prefix, ns)| format!("{prefix}:{}", &iri[ns.len()..]))
        .unwrap_or_else(|| format!("<{iri}>"))
}

fn render_term(context: &Context, term: &Term) -> String {
    match term {
        Term::Var(v) => format!("?{}", v.0),
        Term::Iri(iri) => compact(context, iri.as_str()),
        Term::Literal(value) => format!("{value:?}"),
        Term::Id => "_id".to_owned(),
        Term::AtId => "@id".to_owned(),
        Term::RdfType => "rdf:type".to_owned(),
    }
}

fn render_pred(context: &Context, pred: &PredRef) -> String {
    match pred {
        PredRef::Iri(iri) => compact(context, iri.as_str()),
        PredRef::Var(v) => format!("?{}", v.0),
        PredRef::Recursive { predicate, max_hops } => match max_hops {
            Some(n) => format!("{}+{n}", compact(context, predicate.as_str())),
            None => format!("{}+", compact(context, predicate.as_str())),
        },
        PredRef::FullText(iri) => format!("fullText:{}", compact(context, iri.as_str())),
    }
}

fn pattern_shape(term_subject: &Term, predicate: &PredRef, term_object: &Term) -> PatternShape {
    use flake_common::SlotShape;
    let shape_of = |t: &Term| match t {
        Term::Var(_) => SlotShape::Variable,
        Term::Literal(_) | Term::Iri(_) => SlotShape::ValueBound,
        Term::Id | Term::AtId | Term::RdfType => SlotShape::Ident,
    };
    let pred_shape = match predicate {
        PredRef::Var(_) => SlotShape::Variable,
        PredRef::Iri(_) | PredRef::Recursive { .. } | PredRef::FullText(_) => SlotShape::ValueBound,
    };
    PatternShape { subject: shape_of(term_subject), predicate: pred_shape, object: shape_of(term_object), predicate_iri: None }
}

fn explain_one(pattern: &WherePattern, context: &Context, optimizable: &dyn Optimizable) -> PatternExplanation {
    match pattern {
        WherePattern::Triple { subject, predicate, object } => PatternExplanation {
            kind: "triple",
            selectivity: Some(optimizable.selectivity(pattern_shape(subject, predicate, object))),
            optimizable: true,
            rendering: format!(
                "({}, {}, {})",
                render_term(context, subject),
                render_pred(context, predicate),
                render_term(context, object)
            ),
        },
        WherePattern::NamedTriple { subject, predicate, object, .. } => PatternExplanation {
            kind: "named-triple",
            selectivity: Some(optimizable.selectivity(pattern_shape(subject, predicate, object))),
            optimizable: true,
            rendering: format!(
                "({}, {}, {})",
                render_term(context, subject),
                render_pred(context, predicate),
                render_term(context, object)
            ),
        },
        WherePattern::Bind { variable, .. } => PatternExplanation {
            kind: "bind",
            selectivity: None,
            optimizable: false,
            rendering: format!("?{} := <expr>", variable.0),
        },
        WherePattern::BindMap(assignments) => PatternExplanation {
            kind: "bind-map",
            selectivity: None,
            optimizable: false,
            rendering: format!("{{{} assignments}}", assignments.len()),
        },
        WherePattern::Optional(inner) => PatternExplanation {
            kind: "optional",
            selectivity: None,
            optimizable: false,
            rendering: format!("optional {{{} patterns}}", inner.len()),
        },
        WherePattern::Union(branches) => PatternExplanation {
            kind: "union",
            selectivity: None,
            optimizable: false,
            rendering: format!("union {{{} branches}}", branches.len()),
        },
        WherePattern::Filter(exprs) => PatternExplanation {
            kind: "filter",
            selectivity: None,
            optimizable: false,
            rendering: format!("filter {{{} exprs}}", exprs.len()),
        },
        WherePattern::Minus(inner) => PatternExplanation {
            kind: "minus",
            selectivity: None,
            optimizable: false,
            rendering: format!("minus {{{} patterns}}", inner.len()),
        },
        WherePattern::Exists(inner) => PatternExplanation {
            kind: "exists",
            selectivity: None,
            optimizable: false,
            rendering: format!("exists {{{} patterns}}", inner.len()),
        },
        WherePattern::NotExists(inner) => PatternExplanation {
            kind: "not-exists",
            selectivity: None,
            optimizable: false,
            rendering: format!("notExists {{{} patterns}}", inner.len()),
        },
        WherePattern::Values { variable, rows } => PatternExplanation {
            kind: "values",
            selectivity: None,
            optimizable: false,
            rendering: format!("values ?{} {{{} rows}}", variable.0, rows.len()),
        },
    }
}

/// Builds the explanation for an already-planned where-clause (i.e. one that
/// has already been through [`crate::reorder::reorder`] and
/// [`crate::pushdown::push_down_filters`]).
pub fn explain(where_clause: &[WherePattern], context: &Context, optimizable: &dyn Optimizable) -> PlanExplanation {
    let mut patterns = Vec::with_capacity(where_clause.len());
    let mut in_run = false;
    for pattern in where_clause {
        let reorderable = matches!(pattern, WherePattern::Triple { .. } | WherePattern::NamedTriple { .. });
        let segment = match (reorderable, in_run) {
            (true, false) => Segment::RunStart,
            (true, true) => Segment::RunContinues,
            (false, _) => Segment::Fence,
        };
        in_run = reorderable;
        patterns.push((segment, explain_one(pattern, context, optimizable)));
    }
    PlanExplanation { patterns }
}

impl fmt::Display for PlanExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan:")?;
        for (i, (segment, explanation)) in self.patterns.iter().enumerate() {
            if *segment == Segment::Fence {
                writeln!(f, "  -- fence --")?;
            }
            write!(f, "  [{i}] {:<12} optimizable={:<5}", explanation.kind, explanation.optimizable)?;
            match explanation.selectivity {
                Some(s) => write!(f, " selectivity~{s:<8}")?,
                None => write!(f, " selectivity~{:<8}", "n/a")?,
            }
            writeln!(f, " {}", explanation.rendering)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::{NamedNode, TypedValue, VariableId};
    use flake_storage::test_util::Fixture;

    fn iri(s: &str) -> PredRef {
        PredRef::Iri(NamedNode::new(s).unwrap())
    }

    #[test]
    fn renders_iris_compacted_and_marks_fences() {
        let mut fixture = Fixture::new();
        fixture.triple("ex:alice", "ex:name", TypedValue::string("Alice"));
        let snapshot = fixture.build();

        let context = Context::from_json(&serde_json::json!({"ex": "https://example.org/"})).unwrap();
        let where_clause = vec![
            WherePattern::Triple {
                subject: Term::Var(VariableId(0)),
                predicate: iri("https://example.org/name"),
                object: Term::Var(VariableId(1)),
            },
            WherePattern::Filter(vec![]),
        ];
        let explanation = explain(&where_clause, &context, snapshot.as_ref());
        assert_eq!(explanation.patterns[0].0, Segment::RunStart);
        assert_eq!(explanation.patterns[1].0, Segment::Fence);
        let rendered = explanation.to_string();
        assert!(rendered.contains("ex:name"), "expected compacted IRI in:\n{rendered}");
        assert!(rendered.contains("-- fence --"));
    }
}
