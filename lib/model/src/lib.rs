#![doc(test(attr(deny(warnings))))]

//! The data model for the flake-indexed analytical query engine: RDF terms,
//! typed values, flakes, solutions, and the error types shared by every other
//! crate in the workspace.
//!
//! Large portions of the term vocabulary are re-exported from
//! [Oxigraph](https://github.com/oxigraph/oxigraph) (`oxrdf`, `oxiri`,
//! `oxsdatatypes`) rather than reimplemented, the same way the teacher crate
//! this workspace is grounded on does.

mod datatype;
mod error;
mod flake;
mod ids;
mod solution;
mod value;

pub use datatype::Datatype;
pub use error::*;
pub use flake::{Flake, IndexOrder};
pub use ids::{ClassId, PredicateId, SubjectId, TxId, VariableId, VariableTable};
pub use solution::Solution;
pub use value::{LangString, TypedValue};

// Re-exported RDF term types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, NamedOrBlankNode, Term, TermRef, Triple, TripleRef, Variable, VariableRef,
};
