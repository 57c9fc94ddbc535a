//! `str`, `lang`, `datatype`, `iri`, `bnode`, `strdt`, `strlang`, `isIri`,
//! `isLiteral`, `isNumeric`, `isBlank`, `uuid`, `struuid`.

use crate::{ScalarNullaryOp, ScalarUnaryOp, ScalarBinaryOp};
use flake_model::{Datatype, LangString, NamedNode, ThinError, ThinResult, TypedValue};

#[derive(Debug, Default)]
pub struct StrOp;

impl ScalarUnaryOp for StrOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::string(arg.lexical_form()))
    }
}

#[derive(Debug, Default)]
pub struct LangOp;

impl ScalarUnaryOp for LangOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::LangString(LangString { language, .. }) => {
                Ok(TypedValue::string(language.clone()))
            }
            TypedValue::String(_) | TypedValue::Opaque { .. } => Ok(TypedValue::string("")),
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DatatypeOp;

impl ScalarUnaryOp for DatatypeOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let iri = match arg.datatype() {
            Datatype::String => "http://www.w3.org/2001/XMLSchema#string",
            Datatype::Boolean => "http://www.w3.org/2001/XMLSchema#boolean",
            Datatype::Integer => "http://www.w3.org/2001/XMLSchema#integer",
            Datatype::Decimal => "http://www.w3.org/2001/XMLSchema#decimal",
            Datatype::Double => "http://www.w3.org/2001/XMLSchema#double",
            Datatype::Float => "http://www.w3.org/2001/XMLSchema#float",
            Datatype::Date => "http://www.w3.org/2001/XMLSchema#date",
            Datatype::DateTime => "http://www.w3.org/2001/XMLSchema#dateTime",
            Datatype::Time => "http://www.w3.org/2001/XMLSchema#time",
            Datatype::LangString => "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString",
            Datatype::Opaque => {
                if let TypedValue::Opaque { datatype, .. } = arg {
                    return Ok(TypedValue::Iri(datatype.clone()));
                }
                return ThinError::expected();
            }
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Iri(
            NamedNode::new(iri).map_err(|_| ThinError::ExpectedError)?,
        ))
    }
}

#[derive(Debug, Default)]
pub struct IriOp;

impl ScalarUnaryOp for IriOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        match arg {
            TypedValue::Iri(iri) => Ok(TypedValue::Iri(iri.clone())),
            TypedValue::String(s) => {
                Ok(TypedValue::Iri(NamedNode::new(s).map_err(|_| ThinError::ExpectedError)?))
            }
            _ => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct StrDtOp;

impl ScalarBinaryOp for StrDtOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        let lexical = lhs.lexical_form();
        let datatype = match rhs {
            TypedValue::Iri(iri) => iri.clone(),
            _ => return ThinError::expected(),
        };
        TypedValue::coerce_lexical(&lexical, datatype.as_ref())
    }
}

#[derive(Debug, Default)]
pub struct StrLangOp;

impl ScalarBinaryOp for StrLangOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        let value = lhs.lexical_form();
        let language = rhs.lexical_form();
        Ok(TypedValue::LangString(LangString { value, language }))
    }
}

#[derive(Debug, Default)]
pub struct IsIriOp;

impl ScalarUnaryOp for IsIriOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(matches!(arg, TypedValue::Iri(_))))
    }
}

#[derive(Debug, Default)]
pub struct IsLiteralOp;

impl ScalarUnaryOp for IsLiteralOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(!matches!(
            arg,
            TypedValue::Iri(_) | TypedValue::Id(_)
        )))
    }
}

#[derive(Debug, Default)]
pub struct IsNumericOp;

impl ScalarUnaryOp for IsNumericOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(arg.datatype().is_numeric()))
    }
}

#[derive(Debug, Default)]
pub struct IsBlankOp;

impl ScalarUnaryOp for IsBlankOp {
    fn evaluate(&self, _arg: &TypedValue) -> ThinResult<TypedValue> {
        // Blank nodes are not a distinct `TypedValue` variant in this engine
        // (spec.md Sec. 3 models subjects as resolved `SubjectId`s); no value
        // produced by a flake scan or filter expression is ever a blank node.
        Ok(TypedValue::boolean(false))
    }
}

#[derive(Debug, Default)]
pub struct BNodeOp;

impl ScalarNullaryOp for BNodeOp {
    fn evaluate(&self) -> ThinResult<TypedValue> {
        Ok(TypedValue::string(format!(
            "_:b{}",
            uuid::Uuid::new_v4().simple()
        )))
    }
}

impl ScalarUnaryOp for BNodeOp {
    fn evaluate(&self, seed: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::string(format!("_:{}", seed.lexical_form())))
    }
}

#[derive(Debug, Default)]
pub struct UuidOp;

impl ScalarNullaryOp for UuidOp {
    fn evaluate(&self) -> ThinResult<TypedValue> {
        Ok(TypedValue::Iri(
            NamedNode::new(format!("urn:uuid:{}", uuid::Uuid::new_v4()))
                .map_err(|_| ThinError::ExpectedError)?,
        ))
    }
}

#[derive(Debug, Default)]
pub struct StrUuidOp;

impl ScalarNullaryOp for StrUuidOp {
    fn evaluate(&self) -> ThinResult<TypedValue> {
        Ok(TypedValue::string(uuid::Uuid::new_v4().to_string()))
    }
}
