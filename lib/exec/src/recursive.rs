//! Recursive predicate traversal (spec.md Sec. 4.6): bounded fixed-point
//! expansion of `[subject, predicate+n, ?object]`.
//!
//! No teacher equivalent (property paths are entirely out of the teacher's
//! `rdf-fusion-logical::paths` SPARQL-path scope, which models `zeroOrMore`
//! over an Arrow-batched join); this is grounded directly on spec.md Sec. 4.6's
//! work-set/reachable-set description and built from the same
//! [`range::resolve_flake_range`] primitive the rest of the executor uses.

use crate::error::QueryError;
use crate::exec::{ExecContext, SolutionStream};
use crate::range::{self, Slot, TriplePattern};
use flake_common::Snapshot;
use flake_model::{NamedNode, PredicateId, Solution, SubjectId, TypedValue};
use flake_parser::Term;
use futures::stream::{self, StreamExt};
use rustc_hash::FxHashSet;

/// Matches one `p+n` pattern for one incoming solution.
pub(crate) async fn recursive_stream<'s>(
    ctx: ExecContext<'s>,
    solution: Solution,
    subject: &Term,
    predicate: &NamedNode,
    object: &Term,
    max_hops: Option<u32>,
) -> Result<SolutionStream<'s>, QueryError> {
    let object_var = match object {
        Term::Var(v) => *v,
        _ => {
            return Err(QueryError::InvalidRecursion(
                "the object of a recursive predicate pattern must be a variable".to_owned(),
            ))
        }
    };

    let predicate_id = ctx
        .snapshot
        .predicate_id(predicate.as_str())
        .ok_or_else(|| QueryError::InvalidPredicate(predicate.as_str().to_owned()))?;
    let hops = max_hops.unwrap_or(ctx.default_recursion_bound);

    let bound_origin: Option<SubjectId> = match subject {
        Term::Var(v) => match solution.get(*v) {
            Some(TypedValue::Id(id)) => Some(*id),
            Some(_) => return Ok(Box::pin(stream::empty())),
            None => None,
        },
        Term::Iri(iri) => match ctx.snapshot.subject_for_iri(iri.as_str()) {
            Some(id) => Some(id),
            None => return Ok(Box::pin(stream::empty())),
        },
        _ => {
            return Err(QueryError::InvalidRecursion(
                "the subject of a recursive predicate pattern must be a variable or an iri".to_owned(),
            ))
        }
    };
    let subject_var = match subject {
        Term::Var(v) if !solution.is_bound(*v) => Some(*v),
        _ => None,
    };

    let origins = match bound_origin {
        Some(id) => vec![id],
        None => distinct_subjects_with_predicate(ctx.snapshot, predicate_id).await?,
    };

    let mut output = Vec::new();
    for origin in origins {
        let reachable = expand_origin(ctx.snapshot, predicate_id, origin, hops).await?;
        for target in reachable {
            let mut extended = solution.clone();
            if let Some(v) = subject_var {
                extended.bind(v, TypedValue::Id(origin));
            }
            extended.bind(object_var, TypedValue::Id(target));
            ctx.fuel.spend(2)?;
            output.push(Ok(extended));
        }
    }
    Ok(Box::pin(stream::iter(output)))
}

/// Breadth-first expansion from `origin` along `predicate_id`, up to `max_hops`
/// hops. Self-loops are naturally excluded from causing further re-expansion
/// (the visited set dedups the frontier) but still appear in the result if
/// encountered within the hop bound.
async fn expand_origin(
    snapshot: &dyn Snapshot,
    predicate_id: PredicateId,
    origin: SubjectId,
    max_hops: u32,
) -> Result<Vec<SubjectId>, QueryError> {
    let mut frontier = vec![origin];
    let mut visited: FxHashSet<SubjectId> = FxHashSet::default();
    let mut reachable = Vec::new();

    for _ in 0..max_hops {
        let mut next_frontier = Vec::new();
        for subject in &frontier {
            let pattern = TriplePattern {
                subject: Slot::Bound(*subject),
                predicate: Slot::Bound(predicate_id),
                object: Slot::Unbound,
                object_filter: None,
            };
            let mut flakes = range::resolve_flake_range(snapshot, pattern).await?;
            while let Some(flake) = flakes.next().await {
                let flake = flake?;
                if let TypedValue::Id(neighbor) = flake.object {
                    if visited.insert(neighbor) {
                        reachable.push(neighbor);
                        next_frontier.push(neighbor);
                    }
                }
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
    }
    Ok(reachable)
}

/// The work set when the recursive pattern's subject is unbound: every
/// subject with at least one outgoing `predicate_id` edge.
async fn distinct_subjects_with_predicate(
    snapshot: &dyn Snapshot,
    predicate_id: PredicateId,
) -> Result<Vec<SubjectId>, QueryError> {
    let pattern = TriplePattern {
        subject: Slot::Unbound,
        predicate: Slot::Bound(predicate_id),
        object: Slot::Unbound,
        object_filter: None,
    };
    let mut flakes = range::resolve_flake_range(snapshot, pattern).await?;
    let mut seen = FxHashSet::default();
    let mut subjects = Vec::new();
    while let Some(flake) = flakes.next().await {
        let flake = flake?;
        if seen.insert(flake.subject) {
            subjects.push(flake.subject);
        }
    }
    Ok(subjects)
}
