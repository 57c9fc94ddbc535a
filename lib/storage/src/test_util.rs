//! A tiny fixture builder shared by this crate's tests and (via `pub`) by
//! downstream crates' tests, analogous to the teacher's
//! `oxigraph_memory`-backed test harness.

use crate::{MemorySnapshot, MemoryStore};
use flake_common::schema::{Cardinality, PredicateMeta};
use flake_model::{Flake, TxId, TypedValue};
use std::sync::Arc;

/// Builds a snapshot from `(subject, predicate, object)` string/value triples,
/// auto-interning subjects and predicates and registering every predicate as
/// multi-valued, non-reference, range-indexed, non-full-text by default.
pub struct Fixture {
    store: MemoryStore,
    tx: i64,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            tx: 1,
        }
    }

    pub fn predicate(&mut self, iri: &str, is_ref: bool) -> &mut Self {
        let id = self.store.intern_subject(&format!("__pred__{iri}"));
        self.store.schema_mut().register_predicate(PredicateMeta {
            id: flake_model::PredicateId(id.0),
            iri: iri.to_owned(),
            cardinality: Cardinality::Multi,
            is_ref,
            indexed_for_range: true,
            full_text_indexed: false,
        });
        self
    }

    fn predicate_id(&mut self, iri: &str) -> flake_model::PredicateId {
        match self.store.schema_mut().predicate(iri) {
            Some(meta) => meta.id,
            None => {
                self.predicate(iri, false);
                self.store.schema_mut().predicate(iri).unwrap().id
            }
        }
    }

    pub fn triple(&mut self, subject: &str, predicate: &str, object: TypedValue) -> &mut Self {
        let s = self.store.intern_subject(subject);
        let p = self.predicate_id(predicate);
        self.tx += 1;
        self.store
            .insert(Flake::new(s, p, object, TxId(self.tx), true));
        self
    }

    pub fn ref_triple(&mut self, subject: &str, predicate: &str, object_iri: &str) -> &mut Self {
        let object_id = self.store.intern_subject(object_iri);
        self.predicate(predicate, true);
        self.triple(subject, predicate, TypedValue::Id(object_id))
    }

    pub fn class(&mut self, subject: &str, class_iri: &str) -> &mut Self {
        let class_id = self.store.intern_class(class_iri);
        self.triple(
            subject,
            "rdf:type",
            TypedValue::Id(flake_model::SubjectId(class_id.0)),
        )
    }

    pub fn build(&mut self) -> Arc<MemorySnapshot> {
        self.store.snapshot()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
