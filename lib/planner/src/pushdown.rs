//! Filter inlining / pushdown (spec.md Sec. 4.3 "Filter pushdown"): move a
//! `filter` as close as possible to the pattern that binds the variables it
//! needs, so [`flake_exec`](../flake_exec) can evaluate it during the scan
//! rather than after materializing a wider intermediate solution.
//!
//! Scope decision (recorded in `DESIGN.md`): only two safe, narrow forms are
//! implemented here —
//!
//! 1. single-variable filter inlining within a fence-delimited run, and
//! 2. pushing a filter immediately following a `union` into every branch.
//!
//! Pushing into `optional`/`minus`/`exists`/`not-exists` is deliberately not
//! attempted: spec.md Sec. 4.3 says these fences leave "the outer variables
//! remain[ing]" unchanged, i.e. they are anti-/semi-join-shaped, and moving a
//! filter across that boundary can change which outer rows survive. The AST
//! also has no `graph`/`service` variant (`flake-parser::ast::WherePattern`),
//! so there is nothing to push into there either.

use crate::bindings::{expr_vars, pattern_bound_vars, VarSet};
use flake_parser::{Expr, WherePattern};

fn is_fence(pattern: &WherePattern) -> bool {
    !matches!(pattern, WherePattern::Triple { .. } | WherePattern::NamedTriple { .. })
}

/// Variables `expr` references.
fn vars_of(expr: &Expr) -> VarSet {
    let mut out = VarSet::default();
    expr_vars(expr, &mut out);
    out
}

/// Pushes filters down within their fence-delimited run, and into `union`
/// branches immediately preceding them.
pub fn push_down_filters(patterns: Vec<WherePattern>) -> Vec<WherePattern> {
    let patterns = push_into_union_branches(patterns);
    inline_single_variable_filters(patterns)
}

/// For every `filter` immediately following a `union`, if every variable the
/// filter's exprs reference is bound by *all* branches of that union (i.e. in
/// the intersection `bindings::pattern_bound_vars` computes for `Union`),
/// append a copy of those exprs as a trailing `filter` inside each branch and
/// drop them from the top level.
fn push_into_union_branches(patterns: Vec<WherePattern>) -> Vec<WherePattern> {
    let mut out: Vec<WherePattern> = Vec::with_capacity(patterns.len());
    let mut iter = patterns.into_iter().peekable();

    while let Some(pattern) = iter.next() {
        let WherePattern::Union(branches) = pattern else {
            out.push(pattern);
            continue;
        };
        let union_bound = pattern_bound_vars(&WherePattern::Union(branches.clone()));

        let mut branches = branches;
        if let Some(WherePattern::Filter(exprs)) = iter.peek() {
            let (pushable, remaining): (Vec<Expr>, Vec<Expr>) = exprs
                .iter()
                .cloned()
                .partition(|e| vars_of(e).is_subset(&union_bound));
            if !pushable.is_empty() {
                for branch in branches.iter_mut() {
                    branch.push(WherePattern::Filter(pushable.clone()));
                }
                // Consume the peeked filter now that we've used it.
                iter.next();
                out.push(WherePattern::Union(branches));
                if !remaining.is_empty() {
                    out.push(WherePattern::Filter(remaining));
                }
                continue;
            }
        }
        out.push(WherePattern::Union(branches));
    }
    out
}

/// Within each fence-delimited run, moves a single-variable filter to sit
/// immediately after the first pattern in that run binding its variable.
fn inline_single_variable_filters(patterns: Vec<WherePattern>) -> Vec<WherePattern> {
    let mut out = Vec::with_capacity(patterns.len());
    let mut run_start = 0;

    let mut i = 0;
    while i < patterns.len() {
        if is_fence(&patterns[i]) && !matches!(patterns[i], WherePattern::Filter(_)) {
            flush_run(&patterns[run_start..i], &mut out);
            out.push(patterns[i].clone());
            i += 1;
            run_start = i;
            continue;
        }
        i += 1;
    }
    flush_run(&patterns[run_start..], &mut out);
    out
}

/// Reorders one fence-delimited run so that every single-variable `filter`
/// sits directly after the first pattern binding that variable, leaving
/// multi-variable filters and all binding patterns in their relative order.
fn flush_run(run: &[WherePattern], out: &mut Vec<WherePattern>) {
    let mut bound_so_far = VarSet::default();
    let mut pending_filters: Vec<(flake_model::VariableId, Expr)> = Vec::new();
    let mut carried_filters: Vec<Expr> = Vec::new();

    for pattern in run {
        if let WherePattern::Filter(exprs) = pattern {
            for expr in exprs {
                let vars = vars_of(expr);
                match vars.len() {
                    1 => {
                        let v = *vars.iter().next().unwrap();
                        pending_filters.push((v, expr.clone()));
                    }
                    _ => carried_filters.push(expr.clone()),
                }
            }
            continue;
        }
        out.push(pattern.clone());
        bound_so_far.extend(pattern_bound_vars(pattern));

        let (ready, not_ready): (Vec<_>, Vec<_>) =
            pending_filters.drain(..).partition(|(v, _)| bound_so_far.contains(v));
        if !ready.is_empty() {
            out.push(WherePattern::Filter(ready.into_iter().map(|(_, e)| e).collect()));
        }
        pending_filters = not_ready;
    }

    // Anything never resolved (e.g. references a variable the run never
    // binds, such as one from an outer scope) stays at the run's end.
    let leftover: Vec<Expr> = pending_filters
        .into_iter()
        .map(|(_, e)| e)
        .chain(carried_filters)
        .collect();
    if !leftover.is_empty() {
        out.push(WherePattern::Filter(leftover));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::{NamedNode, VariableId};

    fn var(n: u32) -> flake_parser::Term {
        flake_parser::Term::Var(VariableId(n))
    }

    fn iri(s: &str) -> flake_parser::PredRef {
        flake_parser::PredRef::Iri(NamedNode::new(s).unwrap())
    }

    #[test]
    fn single_variable_filter_moves_next_to_its_binder() {
        let patterns = vec![
            WherePattern::Triple { subject: var(0), predicate: iri("ex:name"), object: var(1) },
            WherePattern::Triple { subject: var(0), predicate: iri("ex:age"), object: var(2) },
            WherePattern::Filter(vec![Expr::Var(VariableId(1))]),
        ];
        let pushed = push_down_filters(patterns);
        assert!(matches!(pushed[0], WherePattern::Triple { .. }));
        assert!(matches!(pushed[1], WherePattern::Filter(_)));
        assert!(matches!(pushed[2], WherePattern::Triple { .. }));
    }

    #[test]
    fn filter_referencing_both_union_branches_vars_pushes_into_each() {
        let patterns = vec![
            WherePattern::Union(vec![
                vec![WherePattern::Triple { subject: var(0), predicate: iri("ex:a"), object: var(1) }],
                vec![WherePattern::Triple { subject: var(0), predicate: iri("ex:b"), object: var(1) }],
            ]),
            WherePattern::Filter(vec![Expr::Var(VariableId(1))]),
        ];
        let pushed = push_down_filters(patterns);
        assert_eq!(pushed.len(), 1);
        let WherePattern::Union(branches) = &pushed[0] else { panic!("expected union") };
        for branch in branches {
            assert!(matches!(branch.last(), Some(WherePattern::Filter(_))));
        }
    }

    #[test]
    fn filter_on_var_not_bound_by_all_branches_stays_outside() {
        let patterns = vec![
            WherePattern::Union(vec![
                vec![WherePattern::Triple { subject: var(0), predicate: iri("ex:a"), object: var(1) }],
                vec![WherePattern::Triple { subject: var(0), predicate: iri("ex:b"), object: var(2) }],
            ]),
            WherePattern::Filter(vec![Expr::Var(VariableId(1))]),
        ];
        let pushed = push_down_filters(patterns);
        assert!(matches!(pushed.last(), Some(WherePattern::Filter(_))));
    }
}
