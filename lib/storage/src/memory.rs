use async_trait::async_trait;
use flake_common::{
    Bound, FlakeRange, FullTextScope, Optimizable, PatternShape, Schema, SlotShape,
    Snapshot, StorageResult,
};
use flake_model::{ClassId, Flake, IndexOrder, PredicateId, StorageError, SubjectId, TxId};
use futures::stream;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A versioned, in-memory four-index store, built incrementally and then frozen
/// into immutable [`MemorySnapshot`]s.
///
/// This stands in for the on-disk storage engine, which is explicitly out of
/// scope (spec.md Sec. 1): it exists so the rest of the workspace (and its
/// tests) have a working [`Snapshot`] implementation to run against. The shape —
/// a mutable builder producing cheap, immutable, `Arc`-shared snapshots tagged
/// with a version number — is grounded on the teacher's versioned index content
/// (`lib/storage/src/memory/storage/index/index.rs`'s `IndexContent { version,
/// index }` under an `Arc<RwLock<_>>`), simplified here to four plain sorted
/// `Vec<Flake>`s since the real B+-tree leaf-chunked scan machinery is, per
/// spec.md Sec. 1, the storage engine's concern and not specified here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    flakes: Vec<Flake>,
    schema: Schema,
    subject_iri: FxHashMap<SubjectId, String>,
    iri_subject: FxHashMap<String, SubjectId>,
    class_ids: FxHashMap<String, ClassId>,
    next_subject: i64,
    next_class: i64,
    t: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    /// Interns `iri` to a stable [`SubjectId`], creating one if unseen.
    pub fn intern_subject(&mut self, iri: &str) -> SubjectId {
        if let Some(id) = self.iri_subject.get(iri) {
            return *id;
        }
        let id = SubjectId(self.next_subject);
        self.next_subject += 1;
        self.subject_iri.insert(id, iri.to_owned());
        self.iri_subject.insert(iri.to_owned(), id);
        id
    }

    pub fn intern_class(&mut self, iri: &str) -> ClassId {
        if let Some(id) = self.class_ids.get(iri) {
            return *id;
        }
        let id = ClassId(self.next_class);
        self.next_class += 1;
        self.class_ids.insert(iri.to_owned(), id);
        id
    }

    pub fn insert(&mut self, flake: Flake) {
        self.flakes.push(flake);
    }

    /// Freezes the current state into an immutable, shareable snapshot and
    /// advances `t`. Per spec.md Sec. 3, `t` is monotonically *decreasing*: later
    /// snapshots carry a smaller `t` than earlier ones, so callers can treat `t`
    /// as "distance from the present".
    pub fn snapshot(&mut self) -> Arc<MemorySnapshot> {
        self.t -= 1;
        let mut indexes: [Vec<Flake>; 4] = Default::default();
        for (i, index) in IndexOrder::ALL.into_iter().enumerate() {
            let mut sorted = self.flakes.clone();
            sorted.sort_by(|a, b| a.cmp_by(b, index));
            indexes[i] = sorted;
        }
        Arc::new(MemorySnapshot {
            indexes,
            schema: self.schema.clone(),
            subject_iri: self.subject_iri.clone(),
            iri_subject: self.iri_subject.clone(),
            class_ids: self.class_ids.clone(),
            t: TxId(self.t),
        })
    }
}

/// An immutable snapshot `(schema, indexes, novelty, t)` (spec.md Sec. 3). This
/// in-memory variant has no separate "novelty" layer since `MemoryStore::insert`
/// already folds new flakes into the frozen snapshot at `snapshot()` time; a
/// durable engine instead keeps recent writes unflushed and merges them in per
/// scan (spec.md Sec. 4.1 "Novelty is merged in ordered fashion per leaf").
#[derive(Debug)]
pub struct MemorySnapshot {
    indexes: [Vec<Flake>; 4],
    schema: Schema,
    subject_iri: FxHashMap<SubjectId, String>,
    iri_subject: FxHashMap<String, SubjectId>,
    class_ids: FxHashMap<String, ClassId>,
    t: TxId,
}

impl MemorySnapshot {
    fn index_slice(&self, index: IndexOrder) -> &[Flake] {
        let i = match index {
            IndexOrder::Spot => 0,
            IndexOrder::Post => 1,
            IndexOrder::Psot => 2,
            IndexOrder::Opst => 3,
        };
        &self.indexes[i]
    }
}

fn in_bound_subject(flake: &Flake, bound: &Bound<SubjectId>) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Inclusive(s) => flake.subject == *s,
        Bound::Exclusive(s) => flake.subject != *s,
    }
}

fn in_bound_predicate(flake: &Flake, bound: &Bound<PredicateId>) -> bool {
    match bound {
        Bound::Unbounded => true,
        Bound::Inclusive(p) => flake.predicate == *p,
        Bound::Exclusive(p) => flake.predicate != *p,
    }
}

#[async_trait]
impl Snapshot for MemorySnapshot {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn t(&self) -> TxId {
        self.t
    }

    async fn index_range(
        &self,
        range: FlakeRange,
    ) -> StorageResult<flake_common::BoxFlakeStream<'_>> {
        let object_bound = range.object.clone();
        let object_eq = move |flake: &Flake| match &object_bound {
            Bound::Unbounded => true,
            Bound::Inclusive(o) => &flake.object == o,
            Bound::Exclusive(o) => &flake.object != o,
        };
        let object_filter = range.object_filter.clone();
        let exclude_retracted = range.exclude_retracted;

        let matches: Vec<Flake> = self
            .index_slice(range.index)
            .iter()
            .filter(|f| in_bound_subject(f, &range.subject))
            .filter(|f| in_bound_predicate(f, &range.predicate))
            .filter(|f| object_eq(f))
            .filter(|f| !exclude_retracted || f.asserted)
            .filter(|f| object_filter.as_ref().map_or(true, |p| p(&f.object)))
            .cloned()
            .collect();
        Ok(Box::pin(stream::iter(matches.into_iter().map(Ok))))
    }

    fn predicate_id(&self, iri: &str) -> Option<PredicateId> {
        self.schema.predicate(iri).map(|p| p.id)
    }

    fn class_id(&self, iri: &str) -> Option<ClassId> {
        self.class_ids.get(iri).copied()
    }

    fn iri_for_subject(&self, sid: SubjectId) -> Option<String> {
        self.subject_iri.get(&sid).cloned()
    }

    fn subject_for_iri(&self, iri: &str) -> Option<SubjectId> {
        self.iri_subject.get(iri).copied()
    }

    async fn full_text_search(
        &self,
        _scope: FullTextScope,
        _query: &str,
    ) -> StorageResult<Vec<SubjectId>> {
        Err(StorageError::Other(
            "full-text search is not available on an in-memory-only snapshot".into(),
        ))
    }
}

impl Optimizable for MemorySnapshot {
    fn selectivity(&self, pattern: PatternShape) -> u64 {
        let total = self.total_triple_count().max(1);
        match (pattern.subject, pattern.predicate, pattern.object) {
            (SlotShape::ValueBound, SlotShape::ValueBound, SlotShape::ValueBound) => 1,
            (SlotShape::ValueBound, SlotShape::ValueBound, _)
            | (SlotShape::ValueBound, _, SlotShape::ValueBound) => (total / 20).max(1),
            (SlotShape::ValueBound, _, _) => (total / 10).max(1),
            (_, SlotShape::ValueBound, SlotShape::ValueBound) => (total / 50).max(1),
            (_, SlotShape::ValueBound, _) => (total / 5).max(1),
            (_, _, SlotShape::ValueBound) => (total / 3).max(1),
            _ => total,
        }
    }

    fn total_triple_count(&self) -> u64 {
        self.index_slice(IndexOrder::Spot).len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Fixture;

    #[tokio::test]
    async fn index_equivalence_across_all_four_orders() {
        let snapshot = Fixture::new()
            .triple("ex:alice", "ex:name", flake_model::TypedValue::string("Alice"))
            .triple("ex:bob", "ex:name", flake_model::TypedValue::string("Bob"))
            .triple("ex:alice", "ex:age", flake_model::TypedValue::integer(30))
            .build();

        let mut counts = Vec::new();
        for index in IndexOrder::ALL {
            let stream = snapshot
                .index_range(FlakeRange::full_scan(index))
                .await
                .unwrap();
            let results: Vec<_> = futures::StreamExt::collect::<Vec<_>>(stream).await;
            counts.push(results.len());
        }
        assert!(counts.iter().all(|c| *c == counts[0]));
        assert_eq!(counts[0], 3);
    }

    #[tokio::test]
    async fn bound_subject_uses_spot_and_filters_correctly() {
        let snapshot = Fixture::new()
            .triple("ex:alice", "ex:name", flake_model::TypedValue::string("Alice"))
            .triple("ex:bob", "ex:name", flake_model::TypedValue::string("Bob"))
            .build();
        let alice = snapshot.subject_for_iri("ex:alice").unwrap();
        let range = FlakeRange {
            subject: Bound::Inclusive(alice),
            ..FlakeRange::full_scan(IndexOrder::Spot)
        };
        let stream = snapshot.index_range(range).await.unwrap();
        let results: Vec<_> = futures::StreamExt::collect::<Vec<_>>(stream).await;
        assert_eq!(results.len(), 1);
    }
}
