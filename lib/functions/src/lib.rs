#![doc(test(attr(deny(warnings))))]

//! Scalar and aggregate FQL/SPARQL filter functions over [`flake_model::TypedValue`]
//! (spec.md Sec. 4.2).
//!
//! Grounded on the teacher's `rdf-fusion-functions`/`graphfusion-sparql-functions`
//! crates: one small struct per function, implementing a fixed-arity `*Op`
//! trait, dispatched by name from a [`registry`]. The teacher's traits are
//! columnar and lifetime-parameterized (`ScalarUnaryRdfOp<Arg<'data>>` over
//! Arrow arrays); this crate's traits operate directly on owned
//! [`flake_model::TypedValue`] since solutions here are row-oriented
//! (spec.md Sec. 9), not columnar.

pub mod aggregate;
pub mod name;
pub mod registry;
pub mod scalar;

pub use name::{AggregateName, BuiltinName};
pub use registry::dispatch;

use flake_model::{ThinError, ThinResult, TypedValue};
use std::fmt::Debug;

/// A nullary scalar function (`now()`, `uuid()`, `bnode()`, `rand()`).
pub trait ScalarNullaryOp: Debug {
    fn evaluate(&self) -> ThinResult<TypedValue>;
}

/// A unary scalar function.
pub trait ScalarUnaryOp: Debug {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue>;

    /// Called when `arg` itself failed to evaluate. Most functions simply
    /// propagate the failure; [`scalar::functional_forms::BoundOp`] overrides
    /// this to observe "was this unbound" rather than "what is its value".
    fn evaluate_error(&self) -> ThinResult<TypedValue> {
        ThinError::expected()
    }
}

/// A binary scalar function.
pub trait ScalarBinaryOp: Debug {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue>;
}

/// A ternary scalar function.
pub trait ScalarTernaryOp: Debug {
    fn evaluate(&self, a: &TypedValue, b: &TypedValue, c: &TypedValue) -> ThinResult<TypedValue>;
}

/// A variadic scalar function (`coalesce`, `concat`, `in`).
pub trait ScalarVariadicOp: Debug {
    fn evaluate(&self, args: &[TypedValue]) -> ThinResult<TypedValue>;
}
