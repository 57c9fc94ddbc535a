//! Execution-time errors (spec.md Sec. 6.5, Sec. 7 "Execution errors").
//!
//! Mirrors `flake-parser::ParseError`'s one-variant-per-cause,
//! `#[non_exhaustive]`, stable-tag-plus-status shape, which itself follows the
//! teacher's `QueryEvaluationError`/`EvaluationError` split
//! (`lib/oxigraph/src/sparql/error.rs`).

use flake_model::StorageError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// `resolve_flake_range` was asked for an unknown predicate name.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),
    /// A recursive predicate pattern had a variable predicate or a
    /// non-variable object (spec.md Sec. 4.6).
    #[error("invalid recursive predicate pattern: {0}")]
    InvalidRecursion(String),
    /// A `bind` rebound a variable that was already bound (spec.md Sec. 4.2).
    #[error("variable {0} is already bound")]
    Rebinding(String),
    /// A value could not be coerced to the datatype a comparison/cast needed.
    #[error("value coercion failure: {0}")]
    ValueCoercion(String),
    /// `max_fuel` was exceeded; the whole execution is cancelled (spec.md Sec. 5
    /// "Fuel accounting").
    #[error("exceeded cost: {spent} units spent, budget was {budget}")]
    ExceededCost { spent: u64, budget: u64 },
    /// A requested capability (full-text search, `SERVICE`, a named graph) is
    /// not backed by this snapshot.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The planner produced an inconsistent plan (a fence inside a reorderable
    /// run, an unrecognized pattern shape, ...).
    #[error("optimization failure: {0}")]
    OptimizationFailure(String),
    /// Propagated from the snapshot's storage layer.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    /// The stable `:db/...` tag (spec.md Sec. 6.5).
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidPredicate(_) => ":db/invalid-predicate",
            QueryError::InvalidRecursion(_) | QueryError::Rebinding(_) => ":db/invalid-query",
            QueryError::ValueCoercion(_) => ":db/value-coercion",
            QueryError::ExceededCost { .. } => ":db/exceeded-cost",
            QueryError::Unsupported(_) => ":db/unsupported",
            QueryError::OptimizationFailure(_) => ":db/optimization-failure",
            QueryError::Storage(_) => ":db/invalid-predicate",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            QueryError::OptimizationFailure(_) => 500,
            _ => 400,
        }
    }
}
