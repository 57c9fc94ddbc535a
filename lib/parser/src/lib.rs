#![doc(test(attr(deny(warnings))))]

//! Parses and validates the FQL query document (spec.md Sec. 4.5, Sec. 6.1)
//! into a [`ParsedQuery`](ast::ParsedQuery): a variable-interned AST ready for
//! `flake-planner` to optimize and `flake-exec` to run.
//!
//! `flake-sparql` feeds this crate too: it translates a SPARQL query into the
//! same JSON document shape before handing it to [`parse`].

pub mod ast;
pub mod context;
pub mod document;
pub mod error;
pub mod sexpr;

pub use ast::{
    AggregateCall, BindValue, Context, Dataset, Dialect, Direction, Expr, OpType, OrderKey,
    ParsedQuery, PredRef, SelectClause, SelectItem, SelectMode, SelectTree, SelectTreeEntry, Term,
    WherePattern,
};
pub use error::ParseError;

/// Parses a complete FQL query document into a [`ParsedQuery`].
pub fn parse(document: &serde_json::Value) -> Result<ParsedQuery, ParseError> {
    document::parse(document)
}
