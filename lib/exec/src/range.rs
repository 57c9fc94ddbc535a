//! The index-range resolver (spec.md Sec. 4.1): given a triple pattern with
//! each slot known-or-not, picks one of the four sort orders and streams the
//! matching flakes from the snapshot.

use crate::error::QueryError;
use flake_common::{Bound, FlakeRange, ObjectFilter, Snapshot};
use flake_model::{IndexOrder, PredicateId, SubjectId, TypedValue};

/// A triple pattern's slot: known ahead of the scan, or left open.
#[derive(Clone, Debug)]
pub enum Slot<T> {
    Bound(T),
    Unbound,
}

impl<T> Slot<T> {
    pub fn is_bound(&self) -> bool {
        matches!(self, Slot::Bound(_))
    }
}

/// A fully-resolved triple pattern, ready to become an index scan. Built by
/// the where executor after substituting any variables the current solution
/// already binds.
pub struct TriplePattern {
    pub subject: Slot<SubjectId>,
    pub predicate: Slot<PredicateId>,
    pub object: Slot<TypedValue>,
    /// An inlined single-variable filter pushed down by the planner (spec.md
    /// Sec. 4.3 "Filter pushdown").
    pub object_filter: Option<ObjectFilter>,
}

/// Picks the index per spec.md Sec. 4.1 "Index choice":
/// - s bound → `spot`
/// - p and o bound (and p indexed for range) → `post`
/// - only p bound → `psot`
/// - only o bound → `opst`
/// - none bound → `spot`
///
/// A non-indexed predicate queried with a bound object and unbound subject
/// falls back to `psot` with the object applied as a post-scan filter rather
/// than an index bound (spec.md Sec. 4.1 "Failures").
fn choose_index(predicate_indexed_for_range: Option<bool>, subject_bound: bool, object_bound: bool) -> IndexOrder {
    if subject_bound {
        return IndexOrder::Spot;
    }
    if object_bound {
        return match predicate_indexed_for_range {
            Some(true) => IndexOrder::Post,
            Some(false) => {
                tracing::debug!("non-indexed predicate queried with a bound object; falling back to psot");
                IndexOrder::Psot
            }
            None => IndexOrder::Opst,
        };
    }
    match predicate_indexed_for_range {
        Some(_) => IndexOrder::Psot,
        None => IndexOrder::Spot,
    }
}

/// Resolves `pattern` against `snapshot`, returning the exact subset of
/// flakes matching every bound slot (spec.md Sec. 4.1 "Contract").
pub async fn resolve_flake_range<'s>(
    snapshot: &'s dyn Snapshot,
    pattern: TriplePattern,
) -> Result<flake_common::BoxFlakeStream<'s>, QueryError> {
    let predicate_indexed = match &pattern.predicate {
        Slot::Bound(id) => Some(
            snapshot
                .schema()
                .predicate_by_id(*id)
                .ok_or_else(|| QueryError::InvalidPredicate(id.to_string()))?
                .indexed_for_range,
        ),
        Slot::Unbound => None,
    };

    let index = choose_index(predicate_indexed, pattern.subject.is_bound(), pattern.object.is_bound());

    let range = FlakeRange {
        index,
        subject: match pattern.subject {
            Slot::Bound(s) => Bound::Inclusive(s),
            Slot::Unbound => Bound::Unbounded,
        },
        predicate: match pattern.predicate {
            Slot::Bound(p) => Bound::Inclusive(p),
            Slot::Unbound => Bound::Unbounded,
        },
        object: match pattern.object {
            Slot::Bound(o) => Bound::Inclusive(o),
            Slot::Unbound => Bound::Unbounded,
        },
        object_filter: pattern.object_filter,
        exclude_retracted: true,
    };
    Ok(snapshot.index_range(range).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_bound_always_wins() {
        assert_eq!(choose_index(Some(false), true, true), IndexOrder::Spot);
    }

    #[test]
    fn indexed_predicate_with_bound_object_uses_post() {
        assert_eq!(choose_index(Some(true), false, true), IndexOrder::Post);
    }

    #[test]
    fn non_indexed_predicate_with_bound_object_falls_back_to_psot() {
        assert_eq!(choose_index(Some(false), false, true), IndexOrder::Psot);
    }

    #[test]
    fn only_object_bound_uses_opst() {
        assert_eq!(choose_index(None, false, true), IndexOrder::Opst);
    }

    #[test]
    fn nothing_bound_uses_spot() {
        assert_eq!(choose_index(None, false, false), IndexOrder::Spot);
    }
}
