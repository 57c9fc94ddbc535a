//! Shared abstractions used by every crate in the workspace: the [`Snapshot`]
//! and [`Optimizable`] traits the storage layer implements, and the schema
//! metadata types (spec.md Sec. 3, Sec. 6.3).

pub mod schema;
mod snapshot;

pub use flake_model::{PredicateId, SubjectId};
pub use schema::{Cardinality, ClassHierarchy, PredicateMeta, Schema};
pub use snapshot::{
    Bound, BoxFlakeStream, FlakeRange, FullTextScope, ObjectFilter, Optimizable, PatternShape,
    Snapshot, SlotShape, StorageResult,
};
