use crate::schema::Schema;
use async_trait::async_trait;
use flake_model::{ClassId, Flake, IndexOrder, PredicateId, StorageError, SubjectId, TxId, TypedValue};
use futures::stream::BoxStream;
use std::fmt::Debug;

pub type StorageResult<T> = Result<T, StorageError>;
pub type BoxFlakeStream<'a> = BoxStream<'a, StorageResult<Flake>>;

/// One bound of a [`FlakeRange`] scan (spec.md Sec. 4.1 "Protocol": "a scan is
/// defined by `(start-flake, end-flake, start-test, end-test)`").
#[derive(Clone, Copy, Debug)]
pub enum Bound<T> {
    Unbounded,
    Inclusive(T),
    Exclusive(T),
}

/// A bracketed range over the chosen index's comparator key, plus an optional
/// post-scan object predicate (spec.md Sec. 4.1).
pub struct FlakeRange {
    pub index: IndexOrder,
    pub subject: Bound<SubjectId>,
    pub predicate: Bound<PredicateId>,
    /// Object bound as a pre-encoded comparison key (only meaningful together
    /// with a bound predicate, i.e. on `post`/`opst`).
    pub object: Bound<TypedValue>,
    /// An additional filter evaluated per-candidate flake, used for inlined
    /// single-variable filters (spec.md Sec. 4.3 "Filter pushdown").
    pub object_filter: Option<ObjectFilter>,
    /// Whether retracted flakes should be excluded (almost always `true`;
    /// novelty merging needs to see retractions to cancel prior assertions).
    pub exclude_retracted: bool,
}

impl FlakeRange {
    pub fn full_scan(index: IndexOrder) -> Self {
        Self {
            index,
            subject: Bound::Unbounded,
            predicate: Bound::Unbounded,
            object: Bound::Unbounded,
            object_filter: None,
            exclude_retracted: true,
        }
    }
}

/// A boxed predicate over a flake's object, used for the inlined object filter
/// and for the advisory non-indexed-predicate fallback (spec.md Sec. 4.1
/// "Failures").
pub type ObjectFilter = std::sync::Arc<dyn Fn(&TypedValue) -> bool + Send + Sync>;

/// Scope of a full-text search: a specific predicate or every predicate of a
/// class (spec.md Sec. 3 "`:full-text`").
#[derive(Clone, Debug)]
pub enum FullTextScope {
    Predicate(PredicateId),
    Class(ClassId),
}

/// The snapshot consumer interface the engine depends on (spec.md Sec. 6.3).
///
/// This is the flake-indexed analogue of the teacher's `QuadStorage` /
/// `QuadPatternEvaluator` traits (`lib/common/src/quad_storage.rs`): instead of
/// handing back an Arrow `TableProvider`/`RecordBatchStream`, a snapshot hands
/// back a boxed async stream of [`Flake`]s bracketed by a [`FlakeRange`]. The
/// storage engine and on-disk format behind this trait are out of scope (spec.md
/// Sec. 1); only this read interface is specified.
#[async_trait]
pub trait Snapshot: Debug + Send + Sync {
    fn schema(&self) -> &Schema;

    /// The monotonically decreasing version id of this snapshot.
    fn t(&self) -> TxId;

    /// Streams the flakes in `range`, merging novelty in ordered fashion
    /// (spec.md Sec. 4.1 "Protocol": "Novelty is merged in ordered fashion per
    /// leaf (assertions added, retractions subtracted)").
    async fn index_range(&self, range: FlakeRange) -> StorageResult<BoxFlakeStream<'_>>;

    fn predicate_id(&self, iri: &str) -> Option<PredicateId>;

    fn class_id(&self, iri: &str) -> Option<ClassId>;

    /// Resolves a subject id back to its IRI (or blank node label), used for
    /// `@id` output and compaction.
    fn iri_for_subject(&self, sid: SubjectId) -> Option<String>;

    fn subject_for_iri(&self, iri: &str) -> Option<SubjectId>;

    /// Calls the external full-text search collaborator (spec.md Sec. 4.1
    /// "Full-text patterns bypass the indexes and call the external full-text
    /// search collaborator"); out of scope to implement, so a snapshot without
    /// full-text support should return `StorageError::Other` (spec.md Sec. 7
    /// "Resource errors": "full-text engine not available").
    async fn full_text_search(
        &self,
        scope: FullTextScope,
        query: &str,
    ) -> StorageResult<Vec<SubjectId>>;
}

/// A shape of a triple pattern's bound-ness, used purely to estimate selectivity
/// (spec.md Sec. 4.3). Kept deliberately decoupled from the parser's pattern
/// types so that `flake-common` does not need to depend on `flake-parser`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlotShape {
    ValueBound,
    Ident,
    Variable,
}

#[derive(Clone, Copy, Debug)]
pub struct PatternShape {
    pub subject: SlotShape,
    pub predicate: SlotShape,
    pub object: SlotShape,
    pub predicate_iri: Option<&'static str>,
}

/// Exposes selectivity estimates and a total-triple count used by the planner
/// (spec.md Sec. 4.3 "Selectivity estimator" and Sec. 6.3 `Optimizable`).
pub trait Optimizable {
    /// Estimated number of flakes this pattern would emit.
    fn selectivity(&self, pattern: PatternShape) -> u64;

    fn total_triple_count(&self) -> u64;
}
