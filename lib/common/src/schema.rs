use crate::PredicateId;
use rustc_hash::FxHashMap;

/// Cardinality of a predicate, as recorded in [`PredicateMeta`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cardinality {
    /// At most one value per subject.
    Single,
    /// Any number of values per subject.
    Multi,
}

/// Predicate metadata tracked by the schema (spec.md Sec. 3 "Snapshot / Database
/// value"): "for each predicate, its id, datatype class, cardinality
/// (single/multi), whether it is a reference, whether it is indexed for range,
/// whether it is full-text indexed."
#[derive(Clone, Debug)]
pub struct PredicateMeta {
    pub id: PredicateId,
    pub iri: String,
    pub cardinality: Cardinality,
    /// Whether the object of this predicate is a reference to another subject
    /// rather than a literal.
    pub is_ref: bool,
    /// Whether a bound-object scan on this predicate may use `post` (spec.md
    /// Sec. 4.1 index choice rules).
    pub indexed_for_range: bool,
    pub full_text_indexed: bool,
}

/// Class (`rdf:type`) metadata: subclass closure used to expand a `:class`
/// pattern to its transitive subclasses (spec.md Sec. 4.2 "Class patterns...
/// expand the object value to the transitive-subclasses set").
#[derive(Clone, Debug, Default)]
pub struct ClassHierarchy {
    /// direct_subclasses\[c\] = classes that directly extend c.
    direct_subclasses: FxHashMap<String, Vec<String>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subclass(&mut self, parent: impl Into<String>, child: impl Into<String>) {
        self.direct_subclasses
            .entry(parent.into())
            .or_default()
            .push(child.into());
    }

    /// Returns `class` plus every transitive subclass, deduplicated. Cached per
    /// schema version by callers (spec.md Sec. 9: "cache a precomputed adjacency
    /// map per schema version").
    pub fn transitive_subclasses(&self, class: &str) -> Vec<String> {
        let mut seen = vec![class.to_owned()];
        let mut frontier = vec![class.to_owned()];
        while let Some(current) = frontier.pop() {
            if let Some(children) = self.direct_subclasses.get(&current) {
                for child in children {
                    if !seen.contains(child) {
                        seen.push(child.clone());
                        frontier.push(child.clone());
                    }
                }
            }
        }
        seen
    }
}

/// Schema metadata for one snapshot: predicate and class information (spec.md
/// Sec. 3).
#[derive(Clone, Debug, Default)]
pub struct Schema {
    predicates: FxHashMap<String, PredicateMeta>,
    pub classes: ClassHierarchy,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_predicate(&mut self, meta: PredicateMeta) {
        self.predicates.insert(meta.iri.clone(), meta);
    }

    pub fn predicate(&self, iri: &str) -> Option<&PredicateMeta> {
        self.predicates.get(iri)
    }

    pub fn predicate_by_id(&self, id: PredicateId) -> Option<&PredicateMeta> {
        self.predicates.values().find(|p| p.id == id)
    }
}
