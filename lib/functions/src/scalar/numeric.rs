//! Arithmetic: `+`, `-`, `*`, `/`, unary `+`/`-`, `abs`, `ceil`, `floor`,
//! `round`, `rand`.

use crate::{ScalarBinaryOp, ScalarNullaryOp, ScalarUnaryOp};
use flake_model::{ThinError, ThinResult, TypedValue};
use rand::Rng;

/// Promotes a pair of numeric operands to a common numeric datatype, following
/// the XPath/SPARQL numeric type-promotion ladder: integer < decimal < float <
/// double. Operating purely on `f64` loses integer-vs-decimal distinctions the
/// same way the teacher's DataFusion-cast path does for the double/float
/// fast path; exact-precision decimal arithmetic is left to
/// [`flake_model::Datatype::Decimal`]'s own `+`/`-`/`*`/`/` impls where both
/// operands are already `Decimal`.
fn numeric_op(
    lhs: &TypedValue,
    rhs: &TypedValue,
    f: impl Fn(f64, f64) -> f64,
    i: impl Fn(i64, i64) -> Option<i64>,
) -> ThinResult<TypedValue> {
    if let (TypedValue::Integer(a), TypedValue::Integer(b)) = (lhs, rhs) {
        if let Some(result) = i(i64::from(*a), i64::from(*b)) {
            return Ok(TypedValue::integer(result));
        }
    }
    let a = as_f64(lhs)?;
    let b = as_f64(rhs)?;
    Ok(TypedValue::double(f(a, b)))
}

fn as_f64(value: &TypedValue) -> ThinResult<f64> {
    match value {
        TypedValue::Integer(i) => Ok(i64::from(*i) as f64),
        TypedValue::Decimal(d) => Ok((*d).into()),
        TypedValue::Double(d) => Ok((*d).into()),
        TypedValue::Float(f) => Ok(f32::from(*f) as f64),
        _ => ThinError::expected(),
    }
}

#[derive(Debug, Default)]
pub struct AddOp;

impl ScalarBinaryOp for AddOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        numeric_op(lhs, rhs, |a, b| a + b, |a, b| a.checked_add(b))
    }
}

#[derive(Debug, Default)]
pub struct SubOp;

impl ScalarBinaryOp for SubOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        numeric_op(lhs, rhs, |a, b| a - b, |a, b| a.checked_sub(b))
    }
}

#[derive(Debug, Default)]
pub struct MulOp;

impl ScalarBinaryOp for MulOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        numeric_op(lhs, rhs, |a, b| a * b, |a, b| a.checked_mul(b))
    }
}

#[derive(Debug, Default)]
pub struct DivOp;

impl ScalarBinaryOp for DivOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        let b = as_f64(rhs)?;
        if b == 0.0 {
            return ThinError::expected();
        }
        // Division always promotes to decimal/double per XPath `op:numeric-divide`.
        Ok(TypedValue::double(as_f64(lhs)? / b))
    }
}

#[derive(Debug, Default)]
pub struct UnaryPlusOp;

impl ScalarUnaryOp for UnaryPlusOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        if arg.datatype().is_numeric() {
            Ok(arg.clone())
        } else {
            ThinError::expected()
        }
    }
}

#[derive(Debug, Default)]
pub struct UnaryMinusOp;

impl ScalarUnaryOp for UnaryMinusOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::Integer(i) => Ok(TypedValue::integer(
                i64::from(*i).checked_neg().ok_or(ThinError::ExpectedError)?,
            )),
            _ if arg.datatype().is_numeric() => Ok(TypedValue::double(-as_f64(arg)?)),
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AbsOp;

impl ScalarUnaryOp for AbsOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::Integer(i) => Ok(TypedValue::integer(i64::from(*i).abs())),
            _ if arg.datatype().is_numeric() => Ok(TypedValue::double(as_f64(arg)?.abs())),
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CeilOp;

impl ScalarUnaryOp for CeilOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::Integer(_) => Ok(arg.clone()),
            _ if arg.datatype().is_numeric() => Ok(TypedValue::double(as_f64(arg)?.ceil())),
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FloorOp;

impl ScalarUnaryOp for FloorOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::Integer(_) => Ok(arg.clone()),
            _ if arg.datatype().is_numeric() => Ok(TypedValue::double(as_f64(arg)?.floor())),
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RoundOp;

impl ScalarUnaryOp for RoundOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::Integer(_) => Ok(arg.clone()),
            _ if arg.datatype().is_numeric() => Ok(TypedValue::double(as_f64(arg)?.round())),
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RandOp;

impl ScalarNullaryOp for RandOp {
    fn evaluate(&self) -> ThinResult<TypedValue> {
        Ok(TypedValue::double(rand::rng().random_range(0.0..1.0)))
    }
}
