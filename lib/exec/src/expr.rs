//! Evaluates a parsed filter/bind expression or aggregate call against a
//! [`Solution`] (spec.md Sec. 4.2 "Filter expressions", Sec. 4.4 step 1).
//!
//! Dispatch itself (`name(args...) -> TypedValue`) lives in
//! `flake-functions::registry`; this module only walks the
//! `flake-parser::Expr` tree, substituting bound variables, and drives
//! `flake-functions::aggregate`'s incremental accumulators over a group.

use flake_functions::aggregate::{make_aggregate, Aggregate as _};
use flake_model::{Solution, ThinError, ThinResult, TypedValue};
use flake_parser::{AggregateCall, Expr};
use oxsdatatypes::DateTime;

/// Per-query evaluation context. `query_time` is a single fixed clock reading
/// for the whole query (spec.md Sec. 4.2: "`now`... a fixed clock reading for
/// the whole query").
#[derive(Clone, Copy, Debug)]
pub struct EvalContext {
    pub query_time: DateTime,
}

/// Evaluates `expr` under `solution`. An unbound variable, a wrong-datatype
/// argument, or any other function error is a [`ThinError`] (spec.md Sec. 7:
/// "Function errors within `filter` predicates degrade the solution to
/// *excluded*; function errors within `bind` expressions leave the variable
/// unbound").
pub fn evaluate(expr: &Expr, solution: &Solution, ctx: &EvalContext) -> ThinResult<TypedValue> {
    match expr {
        Expr::Var(var) => solution.get(*var).cloned().ok_or(ThinError::ExpectedError),
        Expr::Const(value) => Ok(value.clone()),
        Expr::Call { name, args } => {
            let evaluated = args
                .iter()
                .map(|arg| evaluate(arg, solution, ctx))
                .collect::<ThinResult<Vec<_>>>()?;
            flake_functions::dispatch(*name, &evaluated, ctx.query_time)
        }
    }
}

/// Evaluates a `filter` expression's effective boolean value. Per spec.md
/// Sec. 3 "Invariants": "Filter predicates that reference any unbound
/// variable evaluate to `false`" — any evaluation error, not only an unbound
/// variable, is folded to `false` here, matching SPARQL's "error excludes".
pub fn evaluate_filter(expr: &Expr, solution: &Solution, ctx: &EvalContext) -> bool {
    evaluate(expr, solution, ctx)
        .and_then(|v| v.effective_boolean_value())
        .unwrap_or(false)
}

/// Runs one aggregate over every solution in `group`, honoring `distinct`.
/// Aggregates over an empty group are defined (spec.md Sec. 3 "Invariants"):
/// `count` yields `0`; everything else is left to
/// `flake_functions::aggregate`'s own empty-group behavior (`sum` also yields
/// `0`; the rest yield an error, which the binder turns into `UNDEF`).
pub fn evaluate_aggregate(call: &AggregateCall, group: &[Solution], ctx: &EvalContext) -> ThinResult<TypedValue> {
    let mut acc = make_aggregate(call.name, call.distinct, call.separator.clone());
    for solution in group {
        let value = match &call.arg {
            Some(arg) => evaluate(arg, solution, ctx),
            // `count(*)`: the accumulator ignores the pushed value.
            None => Ok(TypedValue::boolean(true)),
        };
        if let Ok(value) = value {
            acc.push(&value);
        }
    }
    acc.finish()
}
