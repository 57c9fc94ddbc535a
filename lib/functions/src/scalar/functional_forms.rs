//! `bound`, `coalesce`, `if`, `in`, `not in`.

use crate::{ScalarTernaryOp, ScalarUnaryOp, ScalarVariadicOp};
use flake_model::{ThinError, ThinResult, TypedValue};

/// Whether a variable is bound. The only function that inspects *whether* an
/// argument failed to evaluate rather than its value — grounded on the
/// teacher's `BoundRdfOp`, which overrides `evaluate_error` to return `false`
/// instead of propagating.
#[derive(Debug, Default)]
pub struct BoundOp;

impl ScalarUnaryOp for BoundOp {
    fn evaluate(&self, _arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(true))
    }

    fn evaluate_error(&self) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(false))
    }
}

/// `coalesce(...)`: the first argument that evaluates without error. Callers
/// must pass already-evaluated arguments; an argument that failed to evaluate
/// should simply be omitted from `args` before calling this, since `coalesce`
/// has no access to "was this an error" once the caller has unwrapped to
/// `TypedValue`. The where-executor instead evaluates each sub-expression
/// itself and passes only the survivors in evaluation order.
#[derive(Debug, Default)]
pub struct CoalesceOp;

impl ScalarVariadicOp for CoalesceOp {
    fn evaluate(&self, args: &[TypedValue]) -> ThinResult<TypedValue> {
        args.first().cloned().ok_or(ThinError::ExpectedError)
    }
}

/// `if(cond, then, else)`.
#[derive(Debug, Default)]
pub struct IfOp;

impl ScalarTernaryOp for IfOp {
    fn evaluate(&self, cond: &TypedValue, then: &TypedValue, otherwise: &TypedValue) -> ThinResult<TypedValue> {
        if cond.effective_boolean_value()? {
            Ok(then.clone())
        } else {
            Ok(otherwise.clone())
        }
    }
}

/// `?x in (a, b, c)`.
#[derive(Debug, Default)]
pub struct InOp;

impl ScalarVariadicOp for InOp {
    fn evaluate(&self, args: &[TypedValue]) -> ThinResult<TypedValue> {
        let (needle, haystack) = args.split_first().ok_or(ThinError::ExpectedError)?;
        let mut saw_error = false;
        for candidate in haystack {
            match needle.compare(candidate) {
                Ok(std::cmp::Ordering::Equal) => return Ok(TypedValue::boolean(true)),
                Ok(_) => {}
                Err(_) => saw_error = true,
            }
        }
        if saw_error {
            ThinError::expected()
        } else {
            Ok(TypedValue::boolean(false))
        }
    }
}

/// `?x not in (a, b, c)`.
#[derive(Debug, Default)]
pub struct NotInOp;

impl ScalarVariadicOp for NotInOp {
    fn evaluate(&self, args: &[TypedValue]) -> ThinResult<TypedValue> {
        let result = InOp.evaluate(args)?;
        match result {
            TypedValue::Boolean(b) => Ok(TypedValue::boolean(!b.as_bool())),
            _ => unreachable!("InOp always returns a Boolean"),
        }
    }
}
