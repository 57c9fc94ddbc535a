//! Pattern reorder (spec.md Sec. 4.3 "Pattern reorder", "Selectivity
//! estimator"): within each contiguous run of binding patterns, run the
//! pattern expected to emit the fewest extensions first.
//!
//! No teacher counterpart (the teacher's `rdf-fusion-logical::join` module
//! reorders DataFusion join trees by join-graph structure, not per-pattern
//! selectivity scoring over a row-oriented where-clause); grounded directly
//! on spec.md's own rules.

use flake_common::{Optimizable, PatternShape, SlotShape};
use flake_parser::{PredRef, Term, WherePattern};

/// Whether `pattern` belongs to the reorderable prefix (spec.md Sec. 4.3:
/// "Only the contiguous prefix of `:tuple`, `:class`, `:iri`, and other
/// binding patterns is reordered"). Everything else — `optional`, `filter`,
/// `bind`, `union`, `minus`, `values`, `graph`, `service` — is a fence.
fn is_reorderable(pattern: &WherePattern) -> bool {
    matches!(pattern, WherePattern::Triple { .. } | WherePattern::NamedTriple { .. })
}

fn term_shape(term: &Term) -> SlotShape {
    match term {
        Term::Var(_) => SlotShape::Variable,
        Term::Literal(_) | Term::Iri(_) => SlotShape::ValueBound,
        Term::Id | Term::AtId | Term::RdfType => SlotShape::Ident,
    }
}

fn pred_shape(pred: &PredRef) -> SlotShape {
    match pred {
        PredRef::Var(_) => SlotShape::Variable,
        PredRef::Iri(_) | PredRef::Recursive { .. } | PredRef::FullText(_) => SlotShape::ValueBound,
    }
}

/// `value-bound > ident > variable`, as a sortable rank (lower sorts first).
fn shape_rank(shape: SlotShape) -> u8 {
    match shape {
        SlotShape::ValueBound => 0,
        SlotShape::Ident => 1,
        SlotShape::Variable => 2,
    }
}

fn pattern_shape(pattern: &WherePattern) -> Option<PatternShape> {
    let (subject, predicate, object) = match pattern {
        WherePattern::Triple { subject, predicate, object } => (subject, predicate, object),
        WherePattern::NamedTriple { subject, predicate, object, .. } => (subject, predicate, object),
        _ => return None,
    };
    Some(PatternShape {
        subject: term_shape(subject),
        predicate: pred_shape(predicate),
        object: term_shape(object),
        predicate_iri: None,
    })
}

/// A sort key: `(selectivity, subject-rank, predicate-rank, object-rank,
/// original-index)` — the last element makes the sort stable even though
/// `Vec::sort_by_key` is itself already stable, documenting the spec's
/// explicit tie-break order (spec.md Sec. 4.3: "Tie-breaking is by the order
/// `value-bound > ident > variable` across s, p, o, then by lexicographic
/// input order for stability").
fn sort_key(pattern: &WherePattern, optimizable: &dyn Optimizable, original_index: usize) -> (u64, u8, u8, u8, usize) {
    let Some(shape) = pattern_shape(pattern) else {
        return (0, 0, 0, 0, original_index);
    };
    let selectivity = optimizable.selectivity(shape);
    (
        selectivity,
        shape_rank(shape.subject),
        shape_rank(shape.predicate),
        shape_rank(shape.object),
        original_index,
    )
}

/// Reorders `patterns` in place: each maximal reorderable run is sorted by
/// estimated selectivity (spec.md Sec. 4.3 "Pattern reorder", Sec. 8 property
/// 2 "Pattern reorder equivalence").
pub fn reorder(patterns: Vec<WherePattern>, optimizable: &dyn Optimizable) -> Vec<WherePattern> {
    let mut out = Vec::with_capacity(patterns.len());
    let mut run: Vec<(usize, WherePattern)> = Vec::new();

    let flush = |run: &mut Vec<(usize, WherePattern)>, out: &mut Vec<WherePattern>| {
        run.sort_by_key(|(idx, p)| sort_key(p, optimizable, *idx));
        out.extend(run.drain(..).map(|(_, p)| p));
    };

    for (idx, pattern) in patterns.into_iter().enumerate() {
        if is_reorderable(&pattern) {
            run.push((idx, pattern));
        } else {
            flush(&mut run, &mut out);
            out.push(pattern);
        }
    }
    flush(&mut run, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::{NamedNode, TypedValue, VariableId};
    use flake_storage::test_util::Fixture;

    fn var(n: u32) -> Term {
        Term::Var(VariableId(n))
    }

    fn iri(s: &str) -> PredRef {
        PredRef::Iri(NamedNode::new(s).unwrap())
    }

    #[test]
    fn most_selective_pattern_runs_first() {
        let mut fixture = Fixture::new();
        fixture.triple("ex:alice", "ex:name", TypedValue::string("Alice"));
        for i in 0..100 {
            fixture.triple(&format!("ex:s{i}"), "ex:country", TypedValue::string("US"));
        }
        let snapshot = fixture.build();

        // `ex:country` leaves both subject and object unbound (predicate-only
        // shape), while `ex:name` additionally pins the object to a literal
        // (predicate+object shape): the estimator scores the latter lower, so
        // it should run first.
        let patterns = vec![
            WherePattern::Triple { subject: var(0), predicate: iri("ex:country"), object: var(1) },
            WherePattern::Triple {
                subject: var(0),
                predicate: iri("ex:name"),
                object: Term::Literal(TypedValue::string("Alice")),
            },
        ];
        let reordered = reorder(patterns, snapshot.as_ref());
        match &reordered[0] {
            WherePattern::Triple { predicate: PredRef::Iri(p), .. } => assert_eq!(p.as_str(), "ex:name"),
            other => panic!("unexpected first pattern: {other:?}"),
        }
    }

    #[test]
    fn fences_stop_reordering_across_them() {
        let mut fixture = Fixture::new();
        fixture.triple("ex:a", "ex:p", TypedValue::integer(1));
        let snapshot = fixture.build();

        let patterns = vec![
            WherePattern::Triple { subject: var(0), predicate: iri("ex:country"), object: var(1) },
            WherePattern::Filter(vec![]),
            WherePattern::Triple {
                subject: var(0),
                predicate: iri("ex:name"),
                object: Term::Literal(TypedValue::string("Alice")),
            },
        ];
        let reordered = reorder(patterns, snapshot.as_ref());
        assert!(matches!(reordered[1], WherePattern::Filter(_)));
        match &reordered[2] {
            WherePattern::Triple { predicate: PredRef::Iri(p), .. } => assert_eq!(p.as_str(), "ex:name"),
            other => panic!("unexpected pattern after fence: {other:?}"),
        }
    }
}
