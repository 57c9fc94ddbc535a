//! The top-level query engine (spec.md Sec. 2, 6): parses a query document
//! or a SPARQL string, plans and runs its where-clause, and post-processes
//! the raw solution stream into a [`QueryResults`]/[`MetaEnvelope`].
//!
//! Ties `flake-parser`, `flake-sparql`, `flake-planner`, and `flake-exec`
//! together behind [`Engine::query`]/[`Engine::query_sparql`]; no teacher
//! analogue exists for this exact shape (the teacher's own
//! `GraphFusionInstance` plays the same role, wiring a `SessionContext`
//! around `evaluate_query`, but over a DataFusion logical-plan pipeline
//! rather than the row-oriented executor this crate runs).

use crate::error::QueryError;
use crate::options::QueryOptions;
use crate::postprocess;
use crate::results::{MetaEnvelope, QueryResults};
use flake_common::{Optimizable, Snapshot};
use flake_exec::{EvalContext, ExecContext, FuelCounter};
use flake_model::Solution;
use flake_parser::{ParsedQuery, SelectClause, SelectMode, WherePattern};
use flake_planner::PlanExplanation;
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Everything an [`Engine`] needs from a storage backend: the executor's
/// index lookups and full-text search (`Snapshot`) plus the planner's
/// selectivity estimates (`Optimizable`). Blanket-implemented for any type
/// that already satisfies both, so callers only ever need to hand the engine
/// one trait object.
pub trait QuerySnapshot: Snapshot + Optimizable {}
impl<T: Snapshot + Optimizable + ?Sized> QuerySnapshot for T {}

/// The outcome of running a query: either the bare shaped result, or the
/// same result wrapped in a [`MetaEnvelope`] when `opts.meta`/`opts.maxFuel`
/// asked for one (spec.md Sec. 6.4).
#[derive(Debug)]
pub enum QueryOutcome {
    Plain(QueryResults),
    Enveloped(MetaEnvelope),
}

impl QueryOutcome {
    /// The shaped result, unwrapping a [`MetaEnvelope`] if present.
    pub fn results(&self) -> &QueryResults {
        match self {
            QueryOutcome::Plain(results) => results,
            QueryOutcome::Enveloped(envelope) => &envelope.result,
        }
    }
}

/// A query engine bound to one snapshot.
///
/// A fresh `Engine` is expected per request, not a long-lived singleton
/// mutated in place — the snapshot already represents one fixed
/// point-in-time view (spec.md Sec. 3: "a query runs against one immutable
/// snapshot").
///
/// Stores the snapshot behind two separate trait-object handles
/// (`Snapshot`/`Optimizable`) rather than one combined `dyn QuerySnapshot`,
/// since converting a fat pointer from one trait object to another
/// (supertrait upcasting) isn't available at this crate's MSRV; both handles
/// are cloned from the same `Arc` allocation in [`Engine::new`].
pub struct Engine {
    snapshot: Arc<dyn Snapshot>,
    optimizable: Arc<dyn Optimizable>,
    /// Hop bound for a `p+` pattern that omits its `n` (spec.md Sec. 9:
    /// "100 as a default bound... should be a configurable limit").
    default_recursion_bound: u32,
}

impl Engine {
    pub fn new<S: QuerySnapshot + 'static>(snapshot: Arc<S>) -> Self {
        Self {
            optimizable: snapshot.clone() as Arc<dyn Optimizable>,
            snapshot: snapshot as Arc<dyn Snapshot>,
            default_recursion_bound: 100,
        }
    }

    pub fn with_default_recursion_bound(mut self, bound: u32) -> Self {
        self.default_recursion_bound = bound;
        self
    }

    /// Runs an FQL query document (spec.md Sec. 6.1).
    #[tracing::instrument(skip(self, document))]
    pub async fn query(&self, document: &serde_json::Value) -> Result<QueryOutcome, QueryError> {
        let parsed = flake_parser::parse(document)?;
        self.run(parsed).await
    }

    /// Translates `sparql` into an FQL query document and runs it (spec.md
    /// Sec. 4.8).
    #[tracing::instrument(skip(self, sparql))]
    pub async fn query_sparql(&self, sparql: &str, base_iri: Option<&str>) -> Result<QueryOutcome, QueryError> {
        let document = flake_sparql::translate_query(sparql, base_iri)?;
        let parsed = flake_parser::parse(&document)?;
        self.run(parsed).await
    }

    /// Plans and explains a query document without executing it (spec.md
    /// Sec. 4.3 "Explain").
    pub fn explain(&self, document: &serde_json::Value) -> Result<PlanExplanation, QueryError> {
        let parsed = flake_parser::parse(document)?;
        let planned = flake_planner::plan(&parsed, self.optimizable.as_ref());
        Ok(planned.explanation)
    }

    async fn run(&self, parsed: ParsedQuery) -> Result<QueryOutcome, QueryError> {
        let started = Instant::now();
        let opts = QueryOptions::from_opts(&parsed.opts);
        let max_fuel = opts.max_fuel.or(parsed.max_fuel);
        let fuel = FuelCounter::new(max_fuel);
        let eval_ctx = EvalContext { query_time: oxsdatatypes::DateTime::now() };

        let planned = flake_planner::plan(&parsed, self.optimizable.as_ref());
        tracing::debug!(explanation = %planned.explanation, "planned query");

        // The planner's own eligibility check has no opinion on
        // group/having/order/distinct (spec.md Sec. 4.7 only describes the
        // crawl/triple-shape condition); the fast path skips straight from
        // matched subjects to document expansion, so it's only safe to take
        // when none of those modifiers are present.
        let takes_fast_path = planned.simple_subject_crawl
            && parsed.group_by.is_empty()
            && parsed.having.is_empty()
            && parsed.order_by.is_empty()
            && !matches!(parsed.select_mode, SelectMode::Distinct | SelectMode::Reduced);

        let results = if takes_fast_path {
            self.run_simple_subject_crawl(&parsed, &planned.where_clause, &fuel, &eval_ctx, opts.component).await?
        } else {
            self.run_general(&parsed, &planned.where_clause, &fuel, &eval_ctx, opts.component).await?
        };

        let elapsed = started.elapsed();
        tracing::debug!(rows = results.len(), fuel_spent = fuel.spent(), ?elapsed, "query finished");

        if opts.meta || max_fuel.is_some() {
            Ok(QueryOutcome::Enveloped(MetaEnvelope {
                status: 200,
                result: results,
                fuel: max_fuel.is_some().then(|| fuel.spent()),
                policy: opts.policy,
                time: elapsed,
            }))
        } else {
            Ok(QueryOutcome::Plain(results))
        }
    }

    async fn run_general(
        &self,
        parsed: &ParsedQuery,
        where_clause: &[WherePattern],
        fuel: &FuelCounter,
        eval_ctx: &EvalContext,
        component: bool,
    ) -> Result<QueryResults, QueryError> {
        let ctx = ExecContext {
            snapshot: self.snapshot.as_ref(),
            fuel: fuel.clone(),
            eval: eval_ctx.clone(),
            default_recursion_bound: self.default_recursion_bound,
            dialect: parsed.dialect,
        };
        let rows: Vec<Solution> =
            flake_exec::execute_where(ctx, where_clause, &parsed.supplied_vars, parsed.variables.len())
                .try_collect()
                .await?;
        postprocess::postprocess(parsed, self.snapshot.as_ref(), eval_ctx, fuel, rows, component).await
    }

    async fn run_simple_subject_crawl(
        &self,
        parsed: &ParsedQuery,
        where_clause: &[WherePattern],
        fuel: &FuelCounter,
        eval_ctx: &EvalContext,
        component: bool,
    ) -> Result<QueryResults, QueryError> {
        let SelectClause::Crawl { tree, .. } = &parsed.select else {
            return Err(QueryError::Exec(flake_exec::QueryError::OptimizationFailure(
                "simple-subject-crawl is only valid for a select-crawl query".to_owned(),
            )));
        };
        let ctx = ExecContext {
            snapshot: self.snapshot.as_ref(),
            fuel: fuel.clone(),
            eval: eval_ctx.clone(),
            default_recursion_bound: self.default_recursion_bound,
            dialect: parsed.dialect,
        };
        let subjects = flake_exec::simple_subject_crawl(ctx, where_clause, parsed.offset, parsed.limit).await?;
        let mut docs = Vec::with_capacity(subjects.len());
        for sid in subjects {
            let doc =
                postprocess::crawl::crawl_subject(self.snapshot.as_ref(), sid, tree, component, parsed.depth, &parsed.context, fuel)
                    .await?;
            docs.push(doc);
        }
        Ok(QueryResults::Document(docs))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("default_recursion_bound", &self.default_recursion_bound).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::TypedValue;
    use flake_storage::test_util::Fixture;

    fn engine(mut fixture: Fixture) -> Engine {
        Engine::new(fixture.build())
    }

    #[tokio::test]
    async fn runs_a_plain_triple_query() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/alice", "http://ex.org/name", TypedValue::string("Alice"));
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?name"],
            "where": [["http://ex.org/alice", "http://ex.org/name", "?name"]],
        });
        let outcome = engine.query(&doc).await.unwrap();
        assert_eq!(outcome.results().len(), 1);
    }

    #[tokio::test]
    async fn meta_true_wraps_the_result_in_an_envelope() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/alice", "http://ex.org/name", TypedValue::string("Alice"));
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?name"],
            "where": [["http://ex.org/alice", "http://ex.org/name", "?name"]],
            "opts": {"meta": true},
        });
        let outcome = engine.query(&doc).await.unwrap();
        assert!(matches!(outcome, QueryOutcome::Enveloped(_)));
    }

    #[tokio::test]
    async fn max_fuel_exceeded_fails_the_query() {
        let mut fixture = Fixture::new();
        for i in 0..10 {
            fixture.triple(&format!("http://ex.org/s{i}"), "http://ex.org/p", TypedValue::integer(i));
        }
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?s", "?o"],
            "where": [["?s", "http://ex.org/p", "?o"]],
            "opts": {"maxFuel": 1},
        });
        let err = engine.query(&doc).await.unwrap_err();
        assert_eq!(err.code(), ":db/exceeded-cost");
    }

    #[tokio::test]
    async fn sparql_select_translates_and_runs() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/alice", "http://ex.org/name", TypedValue::string("Alice"));
        let engine = engine(fixture);
        let outcome = engine
            .query_sparql("SELECT ?name WHERE { <http://ex.org/alice> <http://ex.org/name> ?name }", None)
            .await
            .unwrap();
        assert_eq!(outcome.results().len(), 1);
    }

    #[test]
    fn explain_plans_without_executing() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/alice", "http://ex.org/name", TypedValue::string("Alice"));
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?name"],
            "where": [["http://ex.org/alice", "http://ex.org/name", "?name"]],
        });
        let explanation = engine.explain(&doc).unwrap();
        assert!(explanation.to_string().contains("Plan:"));
    }

    /// S1: class scan with select-crawl (spec.md Sec. 8).
    #[tokio::test]
    async fn s1_class_scan_with_select_crawl() {
        let mut fixture = Fixture::new();
        fixture.class("http://ex.org/100", "http://ex.org/Person");
        fixture.triple("http://ex.org/100", "http://ex.org/name", TypedValue::string("a"));
        fixture.class("http://ex.org/101", "http://ex.org/Person");
        fixture.triple("http://ex.org/101", "http://ex.org/name", TypedValue::string("b"));
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "context": {"ex": "http://ex.org/"},
            "select": {"?u": ["*"]},
            "where": [["?u", "rdf:type", "ex:Person"]],
        });
        let outcome = engine.query(&doc).await.unwrap();
        let QueryResults::Document(docs) = outcome.results() else { panic!("expected document results") };
        assert_eq!(docs.len(), 2);
        let names: std::collections::HashSet<_> =
            docs.iter().map(|d| d["name"].as_str().unwrap().to_owned()).collect();
        assert_eq!(names, ["a".to_owned(), "b".to_owned()].into_iter().collect());
        for doc in docs {
            let id = doc["@id"].as_str().unwrap();
            assert!(id == "ex:100" || id == "ex:101", "unexpected @id: {id}");
        }
    }

    /// S2: optional with filter (spec.md Sec. 8) — the solution missing an
    /// email is retained by `optional` with `?e` unbound, then dropped by the
    /// `bound(?e)`-implying `strStarts` filter.
    #[tokio::test]
    async fn s2_optional_with_filter() {
        let mut fixture = Fixture::new();
        fixture.class("http://ex.org/100", "http://ex.org/Person");
        fixture.triple("http://ex.org/100", "http://ex.org/email", TypedValue::string("alice@x"));
        fixture.class("http://ex.org/101", "http://ex.org/Person");
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "context": {"ex": "http://ex.org/"},
            "select": ["?u", "?e"],
            "where": [
                ["?u", "rdf:type", "ex:Person"],
                {"optional": [["?u", "ex:email", "?e"]]},
                {"filter": ["(strStarts ?e \"a\")"]},
            ],
        });
        let outcome = engine.query(&doc).await.unwrap();
        let QueryResults::Solutions(rows) = outcome.results() else { panic!("expected tuple results") };
        assert_eq!(rows.len(), 1);

        let parsed = flake_parser::parse(&doc).unwrap();
        let e = parsed.variables.get("e").unwrap();
        assert_eq!(rows[0].get(e).unwrap().lexical_form(), "alice@x");
    }

    /// S3: union of two class scans (spec.md Sec. 8).
    #[tokio::test]
    async fn s3_union_of_two_classes() {
        let mut fixture = Fixture::new();
        fixture.class("http://ex.org/100", "http://ex.org/Person");
        fixture.class("http://ex.org/101", "http://ex.org/Person");
        fixture.class("http://ex.org/200", "http://ex.org/Organization");
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "context": {"ex": "http://ex.org/"},
            "select": ["?x"],
            "where": [{"union": [
                [["?x", "rdf:type", "ex:Person"]],
                [["?x", "rdf:type", "ex:Organization"]],
            ]}],
        });
        let outcome = engine.query(&doc).await.unwrap();
        assert_eq!(outcome.results().len(), 3);
    }

    /// S4: group-by then aggregate (spec.md Sec. 8) — one row per distinct
    /// country, no row for a country that never appears.
    #[tokio::test]
    async fn s4_group_by_then_count() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/u1", "http://ex.org/country", TypedValue::string("US"));
        fixture.triple("http://ex.org/u2", "http://ex.org/country", TypedValue::string("US"));
        fixture.triple("http://ex.org/u3", "http://ex.org/country", TypedValue::string("FR"));
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?c", "(count ?u)"],
            "where": [["?u", "http://ex.org/country", "?c"]],
            "groupBy": ["?c"],
        });
        let outcome = engine.query(&doc).await.unwrap();
        let QueryResults::Solutions(rows) = outcome.results() else { panic!("expected tuple results") };
        assert_eq!(rows.len(), 2);

        let parsed = flake_parser::parse(&doc).unwrap();
        let c = parsed.variables.get("c").unwrap();
        let count = parsed.variables.get("_anon_(count ?u)").unwrap();
        let counts: std::collections::HashMap<String, String> = rows
            .iter()
            .map(|row| (row.get(c).unwrap().lexical_form(), row.get(count).unwrap().lexical_form()))
            .collect();
        assert_eq!(counts.get("US").unwrap(), "2");
        assert_eq!(counts.get("FR").unwrap(), "1");
    }

    /// S5: recursive predicate bounded to 3 hops over `A -> B -> C -> D -> E`
    /// (spec.md Sec. 8) — `E` sits at depth 4 and is excluded.
    #[tokio::test]
    async fn s5_recursive_predicate_bounded_to_three_hops() {
        let mut fixture = Fixture::new();
        fixture.ref_triple("http://ex.org/A", "http://ex.org/follows", "http://ex.org/B");
        fixture.ref_triple("http://ex.org/B", "http://ex.org/follows", "http://ex.org/C");
        fixture.ref_triple("http://ex.org/C", "http://ex.org/follows", "http://ex.org/D");
        fixture.ref_triple("http://ex.org/D", "http://ex.org/follows", "http://ex.org/E");
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?y"],
            "where": [["http://ex.org/A", "http://ex.org/follows+3", "?y"]],
        });
        let outcome = engine.query(&doc).await.unwrap();
        let QueryResults::Solutions(rows) = outcome.results() else { panic!("expected tuple results") };

        let parsed = flake_parser::parse(&doc).unwrap();
        let y = parsed.variables.get("y").unwrap();
        let reached: std::collections::HashSet<_> =
            rows.iter().map(|row| row.get(y).unwrap().lexical_form()).collect();
        assert_eq!(reached.len(), 3);
        for target in ["B", "C", "D"] {
            assert!(reached.iter().any(|r| r.ends_with(target)), "missing {target} in {reached:?}");
        }
        assert!(!reached.iter().any(|r| r.ends_with('E')));
    }

    /// S6: a SPARQL query and the FQL query it translates to yield the same
    /// result multiset (spec.md Sec. 8).
    #[tokio::test]
    async fn s6_sparql_translation_round_trip() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/s1", "http://ex.org/name", TypedValue::string("one"));
        fixture.triple("http://ex.org/s2", "http://ex.org/name", TypedValue::string("two"));
        fixture.triple("http://ex.org/s3", "http://ex.org/name", TypedValue::string("three"));
        let engine = engine(fixture);

        let sparql_outcome = engine
            .query_sparql("SELECT ?n WHERE { ?s <http://ex.org/name> ?n } LIMIT 2", None)
            .await
            .unwrap();
        let fql_doc = serde_json::json!({
            "select": ["?n"],
            "where": [["?s", "http://ex.org/name", "?n"]],
            "limit": 2,
        });
        let fql_outcome = engine.query(&fql_doc).await.unwrap();

        assert_eq!(sparql_outcome.results().len(), 2);
        assert_eq!(sparql_outcome.results().len(), fql_outcome.results().len());
    }

    /// `minus` is a hard error in the FQL dialect (spec.md Sec. 3).
    #[tokio::test]
    async fn fql_minus_is_a_hard_error() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/alice", "http://ex.org/name", TypedValue::string("Alice"));
        let engine = engine(fixture);
        let doc = serde_json::json!({
            "select": ["?name"],
            "where": [
                ["?u", "http://ex.org/name", "?name"],
                {"minus": [["?u", "http://ex.org/name", "Bob"]]},
            ],
        });
        let err = engine.query(&doc).await.unwrap_err();
        assert_eq!(err.code(), ":db/unsupported");
    }

    /// The same shape is legal when translated from SPARQL `MINUS`.
    #[tokio::test]
    async fn sparql_minus_is_supported() {
        let mut fixture = Fixture::new();
        fixture.triple("http://ex.org/alice", "http://ex.org/name", TypedValue::string("Alice"));
        fixture.triple("http://ex.org/bob", "http://ex.org/name", TypedValue::string("Bob"));
        let engine = engine(fixture);
        let outcome = engine
            .query_sparql(
                "SELECT ?u WHERE { ?u <http://ex.org/name> ?n MINUS { ?u <http://ex.org/name> \"Bob\" } }",
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.results().len(), 1);
    }
}
