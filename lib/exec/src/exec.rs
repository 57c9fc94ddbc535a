//! The where executor (spec.md Sec. 4.2): folds the ordered where-clause over
//! a seed stream of one empty solution, each pattern a combinator over the
//! previous stage's [`SolutionStream`].
//!
//! Grounded on spec.md Sec. 9's re-architecture directive ("replace
//! channel-chained go-blocks with an async iterator trait... each pattern is
//! a combinator over the iterator"); there is no teacher equivalent since the
//! teacher dataflow is DataFusion `ExecutionPlan`/`RecordBatchStream`
//! operators over Arrow batches; this crate instead chains `futures::Stream`
//! combinators directly over row-oriented [`Solution`]s.

use crate::error::QueryError;
use crate::expr::{self, EvalContext};
use crate::fuel::FuelCounter;
use crate::range::{self, Slot, TriplePattern};
use flake_common::Snapshot;
use flake_model::{NamedNode, PredicateId, Solution, SubjectId, TypedValue, VariableId};
use flake_parser::{BindValue, Dataset, Dialect, PredRef, Term, WherePattern};
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt, TryStreamExt};
use std::sync::Arc;

pub type SolutionStream<'s> = BoxStream<'s, Result<Solution, QueryError>>;

/// The reserved `rdf:type` predicate IRI (spec.md Sec. 3 "`:class`").
pub(crate) const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Per-execution context threaded through every combinator.
#[derive(Clone)]
pub struct ExecContext<'s> {
    pub snapshot: &'s dyn Snapshot,
    pub fuel: FuelCounter,
    pub eval: EvalContext,
    /// Recursive-predicate hop bound used when a `p+n` pattern omits `n`
    /// (spec.md Sec. 9: "100 as a default bound... should be a configurable
    /// limit").
    pub default_recursion_bound: u32,
    /// Which surface this query came from (spec.md Sec. 3: `minus` is a hard
    /// execution error in the FQL dialect, legal only via SPARQL translation).
    pub dialect: Dialect,
}

/// Runs the full where-clause over a seed of `supplied_vars`, as produced by
/// the parser's `vars` key (spec.md Sec. 4.2 "Contract").
pub fn execute_where<'s>(
    ctx: ExecContext<'s>,
    patterns: &'s [WherePattern],
    supplied_vars: &[(VariableId, TypedValue)],
    width: usize,
) -> SolutionStream<'s> {
    let mut seed = Solution::empty(width);
    for (var, value) in supplied_vars {
        seed.bind(*var, value.clone());
    }
    let initial: SolutionStream<'s> = Box::pin(stream::iter(vec![Ok(seed)]));
    run_patterns(ctx, patterns, initial)
}

/// Folds `patterns` over `seed` (spec.md Sec. 4.2, shared by the top-level
/// executor and every nested clause: `optional`, `union`'s branches,
/// `minus`/`exists`/`not-exists`).
pub(crate) fn run_patterns<'s>(ctx: ExecContext<'s>, patterns: &'s [WherePattern], seed: SolutionStream<'s>) -> SolutionStream<'s> {
    patterns.iter().fold(seed, |stream, pattern| execute_pattern(ctx.clone(), pattern, stream))
}

fn execute_pattern<'s>(ctx: ExecContext<'s>, pattern: &'s WherePattern, incoming: SolutionStream<'s>) -> SolutionStream<'s> {
    match pattern {
        WherePattern::Triple { subject, predicate, object } => triple_stream(ctx, subject, predicate, object, incoming),
        WherePattern::NamedTriple { dataset, subject, predicate, object } => {
            named_triple_stream(ctx, dataset, subject, predicate, object, incoming)
        }
        WherePattern::Bind { variable, value } => bind_stream(ctx, *variable, value, incoming),
        WherePattern::BindMap(assignments) => bind_map_stream(ctx, assignments, incoming),
        WherePattern::Filter(exprs) => filter_stream(ctx, exprs, incoming),
        WherePattern::Optional(inner) => optional_stream(ctx, inner, incoming),
        WherePattern::Union(branches) => union_stream(ctx, branches, incoming),
        WherePattern::Minus(inner) => {
            if ctx.dialect == Dialect::Fql {
                let err = QueryError::Unsupported(
                    "minus is not supported in the FQL dialect; use SPARQL translation".to_owned(),
                );
                return Box::pin(stream::iter(vec![Err(err)]));
            }
            semi_join_stream(ctx, inner, incoming, true)
        }
        WherePattern::Exists(inner) => semi_join_stream(ctx, inner, incoming, false),
        WherePattern::NotExists(inner) => semi_join_stream(ctx, inner, incoming, true),
        WherePattern::Values { variable, rows } => values_stream(*variable, rows.clone(), incoming),
    }
}

/// Chains `incoming` through `f`, which turns one solution into the async
/// substream it expands to (a pattern match, a nested clause run, ...),
/// concatenating every substream in arrival order. This is the one place the
/// "cooperative, single-writer" scheduling model (spec.md Sec. 4.2) is
/// realized: each `f` is driven to completion before the next is polled.
fn chain<'s>(
    incoming: SolutionStream<'s>,
    f: impl Fn(Solution) -> BoxFuture<'s, Result<SolutionStream<'s>, QueryError>> + Send + Sync + 's,
) -> SolutionStream<'s> {
    let f = Arc::new(f);
    Box::pin(
        incoming
            .map(move |sol_res| {
                let f = f.clone();
                async move {
                    let solution = sol_res?;
                    f(solution).await
                }
            })
            .then(|fut| fut)
            .try_flatten(),
    )
}

// ---------------------------------------------------------------------
// Triple / class / iri patterns
// ---------------------------------------------------------------------

fn triple_stream<'s>(
    ctx: ExecContext<'s>,
    subject: &'s Term,
    predicate: &'s PredRef,
    object: &'s Term,
    incoming: SolutionStream<'s>,
) -> SolutionStream<'s> {
    chain(incoming, move |solution| {
        let ctx = ctx.clone();
        async move { match_triple(ctx, solution, subject, predicate, object).await }.boxed()
    })
}

async fn match_triple<'s>(
    ctx: ExecContext<'s>,
    solution: Solution,
    subject: &Term,
    predicate: &PredRef,
    object: &Term,
) -> Result<SolutionStream<'s>, QueryError> {
    if let PredRef::Recursive { predicate, max_hops } = predicate {
        return crate::recursive::recursive_stream(ctx, solution, subject, predicate, object, *max_hops).await;
    }
    if let PredRef::FullText(predicate_iri) = predicate {
        return full_text_stream(ctx, solution, subject, predicate_iri, object).await;
    }

    let predicate_slot = match resolve_predicate(predicate, &solution, ctx.snapshot)? {
        Some(slot) => slot,
        None => return Ok(Box::pin(stream::empty())),
    };

    if let Slot::Bound(pred_id) = &predicate_slot {
        let is_rdf_type = ctx
            .snapshot
            .schema()
            .predicate_by_id(*pred_id)
            .is_some_and(|meta| meta.iri == RDF_TYPE_IRI);
        if is_rdf_type {
            return class_pattern_stream(ctx, solution, subject, *pred_id, object).await;
        }
    }

    let (Some(subject_slot), Some(object_slot)) =
        (resolve_subject(subject, &solution, ctx.snapshot), resolve_object(object, &solution, ctx.snapshot))
    else {
        return Ok(Box::pin(stream::empty()));
    };

    let subject_var = unbound_var(subject, &subject_slot);
    let predicate_var = unbound_predicate_var(predicate, &predicate_slot);
    let object_var = unbound_var(object, &object_slot);

    let pattern = TriplePattern { subject: subject_slot, predicate: predicate_slot, object: object_slot, object_filter: None };
    let flakes = range::resolve_flake_range(ctx.snapshot, pattern).await?;
    let fuel = ctx.fuel.clone();
    let snapshot = ctx.snapshot;
    let out = flakes.map(move |flake_result| {
        let flake = flake_result.map_err(QueryError::from)?;
        fuel.spend(1)?;
        let mut extended = solution.clone();
        if let Some(v) = subject_var {
            extended.bind(v, TypedValue::Id(flake.subject));
        }
        if let Some(v) = predicate_var {
            if let Some(node) = snapshot
                .schema()
                .predicate_by_id(flake.predicate)
                .and_then(|meta| NamedNode::new(meta.iri.clone()).ok())
            {
                extended.bind(v, TypedValue::Iri(node));
            }
        }
        if let Some(v) = object_var {
            extended.bind(v, flake.object.clone());
        }
        fuel.spend(1)?;
        Ok(extended)
    });
    Ok(Box::pin(out))
}

/// Expands an `rdf:type` pattern to the transitive subclasses of its object
/// class and scans once per class, deduplicating emitted subjects (spec.md
/// Sec. 4.2 "Class patterns").
async fn class_pattern_stream<'s>(
    ctx: ExecContext<'s>,
    solution: Solution,
    subject: &Term,
    predicate_id: PredicateId,
    object: &Term,
) -> Result<SolutionStream<'s>, QueryError> {
    let class_name = match object {
        Term::Literal(value) => value.lexical_form(),
        Term::Iri(iri) => iri.as_str().to_owned(),
        _ => return Ok(Box::pin(stream::empty())),
    };
    let Some(subject_slot) = resolve_subject(subject, &solution, ctx.snapshot) else {
        return Ok(Box::pin(stream::empty()));
    };
    let subject_var = unbound_var(subject, &subject_slot);

    let classes = ctx.snapshot.schema().classes.transitive_subclasses(&class_name);
    let mut branches = Vec::with_capacity(classes.len());
    for class_iri in classes {
        let Some(class_id) = ctx.snapshot.class_id(&class_iri) else { continue };
        let pattern = TriplePattern {
            subject: subject_slot.clone(),
            predicate: Slot::Bound(predicate_id),
            object: Slot::Bound(TypedValue::Id(SubjectId(class_id.0))),
            object_filter: None,
        };
        branches.push(range::resolve_flake_range(ctx.snapshot, pattern).await?);
    }

    let fuel = ctx.fuel.clone();
    let seen = Arc::new(std::sync::Mutex::new(rustc_hash::FxHashSet::default()));
    let out = stream::iter(branches).flatten().filter_map(move |flake_result| {
        let solution = solution.clone();
        let fuel = fuel.clone();
        let seen = seen.clone();
        async move {
            let flake = match flake_result.map_err(QueryError::from) {
                Ok(flake) => flake,
                Err(e) => return Some(Err(e)),
            };
            if let Err(e) = fuel.spend(1) {
                return Some(Err(e));
            }
            if !seen.lock().unwrap().insert(flake.subject) {
                return None;
            }
            let mut extended = solution;
            if let Some(v) = subject_var {
                extended.bind(v, TypedValue::Id(flake.subject));
            }
            if let Err(e) = fuel.spend(1) {
                return Some(Err(e));
            }
            Some(Ok(extended))
        }
    });
    Ok(Box::pin(out))
}

async fn full_text_stream<'s>(
    ctx: ExecContext<'s>,
    solution: Solution,
    subject: &Term,
    predicate_iri: &NamedNode,
    object: &Term,
) -> Result<SolutionStream<'s>, QueryError> {
    let query = match object {
        Term::Literal(value) => value.lexical_form(),
        _ => return Err(QueryError::Unsupported("a fullText query object must be a literal".to_owned())),
    };
    let predicate_id = ctx
        .snapshot
        .predicate_id(predicate_iri.as_str())
        .ok_or_else(|| QueryError::InvalidPredicate(predicate_iri.as_str().to_owned()))?;
    let subjects = ctx
        .snapshot
        .full_text_search(flake_common::FullTextScope::Predicate(predicate_id), &query)
        .await?;
    let subject_var = match subject {
        Term::Var(v) if !solution.is_bound(*v) => Some(*v),
        _ => None,
    };
    let fuel = ctx.fuel.clone();
    let out: Vec<Result<Solution, QueryError>> = subjects
        .into_iter()
        .map(|sid| {
            fuel.spend(1)?;
            let mut extended = solution.clone();
            if let Some(v) = subject_var {
                extended.bind(v, TypedValue::Id(sid));
            }
            Ok(extended)
        })
        .collect();
    Ok(Box::pin(stream::iter(out)))
}

fn named_triple_stream<'s>(
    ctx: ExecContext<'s>,
    dataset: &'s Dataset,
    subject: &'s Term,
    predicate: &'s PredRef,
    object: &'s Term,
    incoming: SolutionStream<'s>,
) -> SolutionStream<'s> {
    match dataset {
        // `$fdb` (optionally with a ledger-name block, ignored here) addresses
        // the current snapshot; multi-ledger routing is a storage-engine
        // concern out of scope per spec.md Sec. 1.
        Dataset::Fdb { .. } => triple_stream(ctx, subject, predicate, object, incoming),
        Dataset::Wd | Dataset::Named(_) => Box::pin(incoming.map(|sol_res| {
            sol_res.and_then(|_| {
                Err(QueryError::Unsupported(
                    "named and federated datasets are not supported (spec.md Sec. 1 Non-goals)".to_owned(),
                ))
            })
        })),
    }
}

// ---------------------------------------------------------------------
// Term/pred-ref resolution
// ---------------------------------------------------------------------

/// `None` means the pattern is unsatisfiable for this solution (e.g. a
/// variable already bound to a value of the wrong shape); `Some(Slot::Unbound)`
/// means the slot is open and should come from the scan.
pub(crate) fn resolve_subject(term: &Term, solution: &Solution, snapshot: &dyn Snapshot) -> Option<Slot<SubjectId>> {
    match term {
        Term::Var(v) => match solution.get(*v) {
            Some(TypedValue::Id(id)) => Some(Slot::Bound(*id)),
            Some(_) => None,
            None => Some(Slot::Unbound),
        },
        Term::Iri(iri) => snapshot.subject_for_iri(iri.as_str()).map(Slot::Bound),
        Term::Literal(_) | Term::RdfType | Term::AtId | Term::Id => None,
    }
}

pub(crate) fn resolve_object(term: &Term, solution: &Solution, snapshot: &dyn Snapshot) -> Option<Slot<TypedValue>> {
    match term {
        Term::Var(v) => match solution.get(*v) {
            Some(value) => Some(Slot::Bound(value.clone())),
            None => Some(Slot::Unbound),
        },
        Term::Literal(value) => Some(Slot::Bound(value.clone())),
        Term::Iri(iri) => Some(Slot::Bound(match snapshot.subject_for_iri(iri.as_str()) {
            Some(sid) => TypedValue::Id(sid),
            None => TypedValue::Iri(iri.clone()),
        })),
        Term::RdfType => NamedNode::new(RDF_TYPE_IRI).ok().map(|n| Slot::Bound(TypedValue::Iri(n))),
        Term::Id | Term::AtId => None,
    }
}

pub(crate) fn resolve_predicate(
    pred: &PredRef,
    solution: &Solution,
    snapshot: &dyn Snapshot,
) -> Result<Option<Slot<PredicateId>>, QueryError> {
    match pred {
        PredRef::Var(v) => match solution.get(*v) {
            Some(TypedValue::Iri(iri)) => resolve_named_predicate(iri.as_str(), snapshot).map(Some),
            Some(_) => Ok(None),
            None => Ok(Some(Slot::Unbound)),
        },
        PredRef::Iri(iri) => resolve_named_predicate(iri.as_str(), snapshot).map(Some),
        PredRef::Recursive { .. } | PredRef::FullText(_) => {
            unreachable!("recursive/fullText predicates are dispatched before resolve_predicate is called")
        }
    }
}

fn resolve_named_predicate(iri: &str, snapshot: &dyn Snapshot) -> Result<Slot<PredicateId>, QueryError> {
    snapshot.predicate_id(iri).map(Slot::Bound).ok_or_else(|| QueryError::InvalidPredicate(iri.to_owned()))
}

fn unbound_var<T>(term: &Term, slot: &Slot<T>) -> Option<VariableId> {
    match (term, slot) {
        (Term::Var(v), Slot::Unbound) => Some(*v),
        _ => None,
    }
}

fn unbound_predicate_var(pred: &PredRef, slot: &Slot<PredicateId>) -> Option<VariableId> {
    match (pred, slot) {
        (PredRef::Var(v), Slot::Unbound) => Some(*v),
        _ => None,
    }
}

// ---------------------------------------------------------------------
// Optional / union / minus / exists / not-exists
// ---------------------------------------------------------------------

fn optional_stream<'s>(ctx: ExecContext<'s>, inner: &'s [WherePattern], incoming: SolutionStream<'s>) -> SolutionStream<'s> {
    chain(incoming, move |solution| {
        let ctx = ctx.clone();
        async move {
            let seed: SolutionStream<'s> = Box::pin(stream::iter(vec![Ok(solution.clone())]));
            let mut results = run_patterns(ctx.clone(), inner, seed).try_collect::<Vec<_>>().await?;
            if results.is_empty() {
                results.push(solution);
            }
            Ok(Box::pin(stream::iter(results.into_iter().map(Ok))) as SolutionStream<'s>)
        }
        .boxed()
    })
}

fn union_stream<'s>(ctx: ExecContext<'s>, branches: &'s [Vec<WherePattern>], incoming: SolutionStream<'s>) -> SolutionStream<'s> {
    chain(incoming, move |solution| {
        let ctx = ctx.clone();
        async move {
            let mut combined: SolutionStream<'s> = Box::pin(stream::empty());
            for branch in branches {
                let seed: SolutionStream<'s> = Box::pin(stream::iter(vec![Ok(solution.clone())]));
                let branch_stream = run_patterns(ctx.clone(), branch, seed);
                combined = Box::pin(combined.chain(branch_stream));
            }
            Ok(combined)
        }
        .boxed()
    })
}

/// Shared implementation of `minus`/`exists`/`not-exists` (spec.md Sec. 3:
/// "`minus`, `exists`, `not-exists` — anti/semi-joins... `exists` is dual").
/// Only peeks the nested clause's first result, since all three only care
/// whether *any* match exists.
fn semi_join_stream<'s>(
    ctx: ExecContext<'s>,
    inner: &'s [WherePattern],
    incoming: SolutionStream<'s>,
    drop_if_match: bool,
) -> SolutionStream<'s> {
    chain(incoming, move |solution| {
        let ctx = ctx.clone();
        async move {
            let seed: SolutionStream<'s> = Box::pin(stream::iter(vec![Ok(solution.clone())]));
            let mut inner_stream = run_patterns(ctx.clone(), inner, seed);
            let has_match = inner_stream.next().await.transpose()?.is_some();
            let keep = has_match != drop_if_match;
            let out: SolutionStream<'s> =
                if keep { Box::pin(stream::iter(vec![Ok(solution)])) } else { Box::pin(stream::empty()) };
            Ok(out)
        }
        .boxed()
    })
}

// ---------------------------------------------------------------------
// Bind / filter / values
// ---------------------------------------------------------------------

fn bind_stream<'s>(
    ctx: ExecContext<'s>,
    variable: VariableId,
    value: &'s BindValue,
    incoming: SolutionStream<'s>,
) -> SolutionStream<'s> {
    let eval_ctx = ctx.eval;
    Box::pin(incoming.map(move |sol_res| apply_bind(variable, value, sol_res?, &eval_ctx)))
}

fn bind_map_stream<'s>(
    ctx: ExecContext<'s>,
    assignments: &'s [(VariableId, BindValue)],
    incoming: SolutionStream<'s>,
) -> SolutionStream<'s> {
    let eval_ctx = ctx.eval;
    Box::pin(incoming.map(move |sol_res| {
        let mut solution = sol_res?;
        for (variable, value) in assignments {
            solution = apply_bind(*variable, value, solution, &eval_ctx)?;
        }
        Ok(solution)
    }))
}

/// Binds one `variable -> value`, raising `Rebinding` if already bound
/// (spec.md Sec. 4.2 "Bind"). A scalar expression that fails to evaluate
/// leaves the variable unbound rather than failing the solution (spec.md
/// Sec. 7); an aggregate's value is left for the post-processing pipeline
/// (spec.md Sec. 4.4 step 1) to fill in after grouping.
fn apply_bind(
    variable: VariableId,
    value: &BindValue,
    mut solution: Solution,
    eval_ctx: &EvalContext,
) -> Result<Solution, QueryError> {
    if solution.is_bound(variable) {
        return Err(QueryError::Rebinding(format!("{variable:?}")));
    }
    if let BindValue::Expr(expr) = value {
        if let Ok(v) = expr::evaluate(expr, &solution, eval_ctx) {
            solution.bind(variable, v);
        }
    }
    Ok(solution)
}

fn filter_stream<'s>(ctx: ExecContext<'s>, exprs: &'s [flake_parser::Expr], incoming: SolutionStream<'s>) -> SolutionStream<'s> {
    let eval_ctx = ctx.eval;
    Box::pin(incoming.filter(move |sol_res| {
        let keep = match sol_res {
            Ok(solution) => exprs.iter().all(|e| expr::evaluate_filter(e, solution, &eval_ctx)),
            Err(_) => true,
        };
        futures::future::ready(keep)
    }))
}

fn values_stream<'s>(variable: VariableId, rows: Vec<Option<TypedValue>>, incoming: SolutionStream<'s>) -> SolutionStream<'s> {
    Box::pin(incoming.flat_map(move |sol_res| match sol_res {
        Ok(solution) => {
            let expanded: Vec<_> = rows
                .iter()
                .map(|row| {
                    let mut extended = solution.clone();
                    if let Some(value) = row {
                        extended.bind(variable, value.clone());
                    }
                    Ok(extended)
                })
                .collect();
            stream::iter(expanded)
        }
        Err(e) => stream::iter(vec![Err(e)]),
    }))
}
