//! `=`, `!=`, `<`, `<=`, `>`, `>=`, `sameTerm`, logical `&&`/`||`/`!`.

use crate::{ScalarBinaryOp, ScalarUnaryOp};
use flake_model::{ThinResult, TypedValue};
use std::cmp::Ordering;

#[derive(Debug, Default)]
pub struct EqualOp;

impl ScalarBinaryOp for EqualOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.compare(rhs)? == Ordering::Equal))
    }
}

#[derive(Debug, Default)]
pub struct NotEqualOp;

impl ScalarBinaryOp for NotEqualOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.compare(rhs)? != Ordering::Equal))
    }
}

#[derive(Debug, Default)]
pub struct LessThanOp;

impl ScalarBinaryOp for LessThanOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.compare(rhs)? == Ordering::Less))
    }
}

#[derive(Debug, Default)]
pub struct LessOrEqualOp;

impl ScalarBinaryOp for LessOrEqualOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.compare(rhs)? != Ordering::Greater))
    }
}

#[derive(Debug, Default)]
pub struct GreaterThanOp;

impl ScalarBinaryOp for GreaterThanOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.compare(rhs)? == Ordering::Greater))
    }
}

#[derive(Debug, Default)]
pub struct GreaterOrEqualOp;

impl ScalarBinaryOp for GreaterOrEqualOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.compare(rhs)? != Ordering::Less))
    }
}

#[derive(Debug, Default)]
pub struct SameTermOp;

impl ScalarBinaryOp for SameTermOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(lhs.same_term(rhs)))
    }
}

#[derive(Debug, Default)]
pub struct AndOp;

impl ScalarBinaryOp for AndOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        // Per SPARQL `&&`: a `false` on either side short-circuits even if the
        // other side is an error.
        let left = lhs.effective_boolean_value();
        if left == Ok(false) {
            return Ok(TypedValue::boolean(false));
        }
        let right = rhs.effective_boolean_value();
        if right == Ok(false) {
            return Ok(TypedValue::boolean(false));
        }
        Ok(TypedValue::boolean(left? && right?))
    }
}

#[derive(Debug, Default)]
pub struct OrOp;

impl ScalarBinaryOp for OrOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        let left = lhs.effective_boolean_value();
        if left == Ok(true) {
            return Ok(TypedValue::boolean(true));
        }
        let right = rhs.effective_boolean_value();
        if right == Ok(true) {
            return Ok(TypedValue::boolean(true));
        }
        Ok(TypedValue::boolean(left? || right?))
    }
}

#[derive(Debug, Default)]
pub struct NotOp;

impl ScalarUnaryOp for NotOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(!arg.effective_boolean_value()?))
    }
}
