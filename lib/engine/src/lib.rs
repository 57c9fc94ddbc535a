#![doc(test(attr(deny(warnings))))]

//! The top-level query engine (spec.md Sec. 2, 6): wires `flake-parser`,
//! `flake-sparql`, `flake-planner`, and `flake-exec` together behind
//! [`Engine`], and runs the post-processing pipeline (spec.md Sec. 4.4) that
//! turns a raw solution stream into a tuple- or document-shaped
//! [`QueryResults`].

mod engine;
pub mod error;
mod options;
mod postprocess;
mod results;

pub use engine::{Engine, QueryOutcome, QuerySnapshot};
pub use error::QueryError;
pub use flake_planner::PlanExplanation;
pub use options::QueryOptions;
pub use results::{MetaEnvelope, QueryResults};
