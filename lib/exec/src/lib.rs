#![doc(test(attr(deny(warnings))))]

//! The where-clause executor (spec.md Sec. 4.1, 4.2, 4.6, 4.7): resolves a
//! triple pattern against a snapshot's index, folds a parsed where-clause into
//! an async stream of [`Solution`](flake_model::Solution)s, expands recursive
//! predicate patterns, and runs the simple-subject-crawl fast path.
//!
//! `flake-planner` hands this crate a reordered, pushdown-applied where-clause;
//! `flake-engine` drives [`execute_where`] and post-processes its output.

mod crawl;
mod exec;
mod expr;
mod fuel;
mod range;
mod recursive;

pub mod error;

pub use crawl::simple_subject_crawl;
pub use error::QueryError;
pub use exec::{execute_where, ExecContext, SolutionStream};
pub use expr::{evaluate, evaluate_aggregate, evaluate_filter, EvalContext};
pub use fuel::FuelCounter;
pub use range::{resolve_flake_range, Slot, TriplePattern};

// `join/`, `paths/`, `quad_pattern/`, `quads/` — pristine teacher reference
// material (DataFusion physical operators) with no counterpart in this
// crate's row-oriented stream combinators — were removed in the final
// trimming pass, along with their `async-trait`/`itertools` dependencies.
