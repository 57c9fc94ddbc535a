//! `md5`, `sha1`, `sha256`, `sha384`, `sha512`.

use crate::ScalarUnaryOp;
use flake_model::{ThinError, ThinResult, TypedValue};
use md5::Digest as _;
use sha1::Digest as _;
use sha2::{Digest, Sha256, Sha384, Sha512};

fn as_lexical(value: &TypedValue) -> ThinResult<String> {
    match value {
        TypedValue::String(_) => Ok(value.lexical_form()),
        _ => ThinError::expected(),
    }
}

#[derive(Debug, Default)]
pub struct Md5Op;

impl ScalarUnaryOp for Md5Op {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let input = as_lexical(arg)?;
        let digest = md5::Md5::digest(input.as_bytes());
        Ok(TypedValue::string(hex::encode(digest)))
    }
}

#[derive(Debug, Default)]
pub struct Sha1Op;

impl ScalarUnaryOp for Sha1Op {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let input = as_lexical(arg)?;
        let digest = sha1::Sha1::digest(input.as_bytes());
        Ok(TypedValue::string(hex::encode(digest)))
    }
}

#[derive(Debug, Default)]
pub struct Sha256Op;

impl ScalarUnaryOp for Sha256Op {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let input = as_lexical(arg)?;
        let digest = Sha256::digest(input.as_bytes());
        Ok(TypedValue::string(hex::encode(digest)))
    }
}

#[derive(Debug, Default)]
pub struct Sha384Op;

impl ScalarUnaryOp for Sha384Op {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let input = as_lexical(arg)?;
        let digest = Sha384::digest(input.as_bytes());
        Ok(TypedValue::string(hex::encode(digest)))
    }
}

#[derive(Debug, Default)]
pub struct Sha512Op;

impl ScalarUnaryOp for Sha512Op {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let input = as_lexical(arg)?;
        let digest = Sha512::digest(input.as_bytes());
        Ok(TypedValue::string(hex::encode(digest)))
    }
}
