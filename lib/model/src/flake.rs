use crate::{PredicateId, SubjectId, TxId, TypedValue};
use std::cmp::Ordering;

/// The smallest storage unit (spec.md Sec. 3 "Triple / Flake").
///
/// A flake asserts or retracts one `(subject, predicate, object)` fact as of a
/// transaction. The same set of flakes is maintained in four sorted structures
/// (see [`IndexOrder`]); this struct is the element type shared by all four.
#[derive(Clone, PartialEq, Debug)]
pub struct Flake {
    pub subject: SubjectId,
    pub predicate: PredicateId,
    pub object: TypedValue,
    pub tx: TxId,
    /// `true` for an assertion, `false` for a retraction.
    pub asserted: bool,
}

impl Flake {
    pub fn new(
        subject: SubjectId,
        predicate: PredicateId,
        object: TypedValue,
        tx: TxId,
        asserted: bool,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            tx,
            asserted,
        }
    }

    fn object_cmp(&self, other: &Self) -> Ordering {
        self.object
            .datatype()
            .cmp(&other.object.datatype())
            .then_with(|| {
                self.object
                    .compare(&other.object)
                    .unwrap_or_else(|_| self.object.lexical_form().cmp(&other.object.lexical_form()))
            })
    }

    /// Total order for the given index, comparing each comparator field in
    /// turn (spec.md Sec. 3: "A flake is totally ordered under each of four
    /// comparators"), with transaction id as the final tie-breaker.
    pub fn cmp_by(&self, other: &Self, index: IndexOrder) -> Ordering {
        let field_order = match index {
            IndexOrder::Spot => self
                .subject
                .cmp(&other.subject)
                .then_with(|| self.predicate.cmp(&other.predicate))
                .then_with(|| self.object_cmp(other)),
            IndexOrder::Post => self
                .predicate
                .cmp(&other.predicate)
                .then_with(|| self.object_cmp(other))
                .then_with(|| self.subject.cmp(&other.subject)),
            IndexOrder::Psot => self
                .predicate
                .cmp(&other.predicate)
                .then_with(|| self.subject.cmp(&other.subject))
                .then_with(|| self.object_cmp(other)),
            IndexOrder::Opst => self
                .object_cmp(other)
                .then_with(|| self.predicate.cmp(&other.predicate))
                .then_with(|| self.subject.cmp(&other.subject)),
        };
        field_order.then(other.tx.cmp(&self.tx))
    }
}

/// The four sort orders a snapshot maintains the same flake set under
/// (spec.md Sec. 3 and Sec. 4.1).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IndexOrder {
    /// subject-predicate-object-time.
    Spot,
    /// predicate-object-subject-time.
    Post,
    /// predicate-subject-object-time.
    Psot,
    /// object-predicate-subject-time.
    Opst,
}

impl IndexOrder {
    pub const ALL: [IndexOrder; 4] = [
        IndexOrder::Spot,
        IndexOrder::Post,
        IndexOrder::Psot,
        IndexOrder::Opst,
    ];
}
