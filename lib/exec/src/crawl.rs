//! The simple-subject-crawl fast path (spec.md Sec. 4.7): taken when every
//! where-clause triple shares the same subject variable and the select is a
//! single-variable select-crawl. `flake-planner` recognizes eligibility; this
//! module supplies the specialized execution: stream the most selective
//! pattern's subjects, check the remaining patterns in-memory against each
//! subject's full `spot` slice, then apply offset/limit.
//!
//! No direct teacher analogue (the teacher always goes through a DataFusion
//! `QuadPatternExec`/join plan, never a single-subject fast path); grounded on
//! spec.md Sec. 4.7's description and built from the same [`range`] primitive
//! the general triple combinator uses.

use crate::error::QueryError;
use crate::exec::ExecContext;
use crate::range::{self, Slot, TriplePattern};
use flake_common::Snapshot;
use flake_model::{Flake, PredicateId, SubjectId};
use flake_parser::{PredRef, Term, WherePattern};
use futures::StreamExt;

/// Streams the subject ids matching every `patterns` entry, honoring
/// `offset`/`limit`. `patterns` is expected to already be reordered so
/// `patterns[0]` is the most selective (the planner's job); this module only
/// executes, it does not reorder.
pub async fn simple_subject_crawl(
    ctx: ExecContext<'_>,
    patterns: &[WherePattern],
    offset: u64,
    limit: Option<u64>,
) -> Result<Vec<SubjectId>, QueryError> {
    let (first, rest) = patterns.split_first().ok_or_else(|| {
        QueryError::OptimizationFailure("simple-subject-crawl requires at least one where pattern".to_owned())
    })?;
    let WherePattern::Triple { predicate, object, .. } = first else {
        return Err(QueryError::OptimizationFailure(
            "simple-subject-crawl's first pattern must be a triple".to_owned(),
        ));
    };

    let predicate_id = fixed_predicate_id(predicate, ctx.snapshot)?;
    let object_filter = match object {
        Term::Literal(value) => Some(value.clone()),
        _ => None,
    };
    let pattern = TriplePattern {
        subject: Slot::Unbound,
        predicate: Slot::Bound(predicate_id),
        object: match &object_filter {
            Some(value) => Slot::Bound(value.clone()),
            None => Slot::Unbound,
        },
        object_filter: None,
    };

    let mut candidates = range::resolve_flake_range(ctx.snapshot, pattern).await?;
    let mut matched = Vec::new();
    let mut skipped = 0u64;

    while let Some(flake) = candidates.next().await {
        let flake = flake?;
        if let Some(count) = limit {
            if matched.len() as u64 >= count {
                break;
            }
        }
        if !subject_satisfies_rest(ctx.snapshot, flake.subject, rest).await? {
            continue;
        }
        if skipped < offset {
            skipped += 1;
            continue;
        }
        matched.push(flake.subject);
    }
    Ok(matched)
}

async fn subject_satisfies_rest(
    snapshot: &dyn Snapshot,
    subject: SubjectId,
    rest: &[WherePattern],
) -> Result<bool, QueryError> {
    if rest.is_empty() {
        return Ok(true);
    }
    let slice = subject_slice(snapshot, subject).await?;
    for pattern in rest {
        if !pattern_matches_slice(pattern, &slice, snapshot)? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn subject_slice(snapshot: &dyn Snapshot, subject: SubjectId) -> Result<Vec<Flake>, QueryError> {
    let pattern = TriplePattern { subject: Slot::Bound(subject), predicate: Slot::Unbound, object: Slot::Unbound, object_filter: None };
    let mut flakes = range::resolve_flake_range(snapshot, pattern).await?;
    let mut out = Vec::new();
    while let Some(flake) = flakes.next().await {
        out.push(flake?);
    }
    Ok(out)
}

fn pattern_matches_slice(pattern: &WherePattern, slice: &[Flake], snapshot: &dyn Snapshot) -> Result<bool, QueryError> {
    let WherePattern::Triple { predicate, object, .. } = pattern else {
        return Err(QueryError::OptimizationFailure(
            "simple-subject-crawl only supports plain triple patterns".to_owned(),
        ));
    };
    let predicate_id = fixed_predicate_id(predicate, snapshot)?;
    Ok(slice.iter().any(|flake| {
        flake.predicate == predicate_id
            && match object {
                Term::Literal(value) => &flake.object == value,
                _ => true,
            }
    }))
}

fn fixed_predicate_id(predicate: &PredRef, snapshot: &dyn Snapshot) -> Result<PredicateId, QueryError> {
    match predicate {
        PredRef::Iri(iri) => snapshot
            .predicate_id(iri.as_str())
            .ok_or_else(|| QueryError::InvalidPredicate(iri.as_str().to_owned())),
        _ => Err(QueryError::OptimizationFailure(
            "simple-subject-crawl requires every pattern to use a fixed predicate".to_owned(),
        )),
    }
}
