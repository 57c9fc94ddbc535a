use std::fmt;

/// The internal integer identifier of a subject (or any node used as a subject).
///
/// Flakes store subjects and reference objects as [`SubjectId`]s rather than IRIs;
/// the mapping between an IRI/blank node and its id lives on the snapshot (see
/// `flake_common::Snapshot::iri_for_subject`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The internal integer identifier of a predicate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PredicateId(pub i64);

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The internal integer identifier of an `rdf:type` class.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClassId(pub i64);

/// A monotonically decreasing version id identifying a snapshot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TxId(pub i64);

/// An interned query variable.
///
/// Rather than keying solutions by variable name (an open map, as the source
/// system does), the parser interns every `?var` it encounters into a dense
/// [`VariableId`] assigned by position. This lets a [`crate::Solution`] be a plain
/// `Vec<Option<TypedValue>>` indexed by `VariableId`, per the re-architecture note
/// in spec.md Sec. 9.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VariableId(pub u32);

impl VariableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interns variable names into dense [`VariableId`]s in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    names: Vec<String>,
    lookup: rustc_hash::FxHashMap<String, VariableId>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, interning it if this is the first occurrence.
    pub fn intern(&mut self, name: &str) -> VariableId {
        if let Some(id) = self.lookup.get(name) {
            return *id;
        }
        let id = VariableId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.lookup.insert(name.to_owned(), id);
        id
    }

    /// Looks up an already-interned variable without creating a new entry.
    pub fn get(&self, name: &str) -> Option<VariableId> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, id: VariableId) -> &str {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (VariableId(i as u32), name.as_str()))
    }
}
