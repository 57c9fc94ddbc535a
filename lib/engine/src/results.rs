//! Query results (spec.md Sec. 4.4 steps 7-9, Sec. 6.4 "Meta envelope").
//!
//! Two result shapes fall out of the post-processing pipeline depending on
//! the select clause: a plain tuple projection (`SelectClause::Items`) or a
//! crawled JSON-LD-style document per subject (`SelectClause::Crawl`),
//! mirroring the teacher's own `QueryResults::Solutions`/`QueryResults::Graph`
//! split (`lib/engine/src/results`) rather than returning an untyped
//! `serde_json::Value` for both.

use flake_model::Solution;
use serde_json::Value;
use std::time::Duration;

/// The shaped output of one query, before any [`MetaEnvelope`] wrapping.
#[derive(Debug, Clone)]
pub enum QueryResults {
    /// One [`Solution`] per result row (spec.md Sec. 4.4 step 7, tuple
    /// projection). Variable names are resolved via the query's
    /// `VariableTable`, not carried on the solution itself.
    Solutions(Vec<Solution>),
    /// One JSON-LD-style document per crawled subject (spec.md Sec. 4.4
    /// step 8).
    Document(Vec<Value>),
}

impl QueryResults {
    pub fn len(&self) -> usize {
        match self {
            QueryResults::Solutions(rows) => rows.len(),
            QueryResults::Document(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a result when `opts.meta` or `opts.maxFuel` is set (spec.md Sec.
/// 6.4): `{status, result, fuel?, policy?, time}`.
#[derive(Debug, Clone)]
pub struct MetaEnvelope {
    pub status: u16,
    pub result: QueryResults,
    /// Fuel units spent (spec.md Sec. 5), present whenever a fuel budget was
    /// tracked at all, independent of whether the budget was ever exceeded.
    pub fuel: Option<u64>,
    /// Echoes `opts.policy`/`opts.policy-class`/`opts.policy-values` back
    /// out, unexamined; no enforcement happens in this crate.
    pub policy: Option<Value>,
    /// Wall-clock time spent executing and post-processing the query.
    pub time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_solutions_is_empty() {
        let results = QueryResults::Solutions(vec![]);
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
    }

    #[test]
    fn document_len_counts_top_level_entries() {
        let results = QueryResults::Document(vec![Value::Null, Value::Null]);
        assert_eq!(results.len(), 2);
    }
}
