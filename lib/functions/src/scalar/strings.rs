//! String functions: `strlen`, `ucase`, `lcase`, `substr`, `contains`,
//! `strstarts`, `strends`, `strbefore`, `strafter`, `replace`, `regex`,
//! `encodeForUri`, `concat`.

use crate::{ScalarBinaryOp, ScalarTernaryOp, ScalarUnaryOp, ScalarVariadicOp};
use flake_model::{ThinError, ThinResult, TypedValue};
use regex::Regex;

fn as_lexical(value: &TypedValue) -> ThinResult<String> {
    match value {
        TypedValue::String(_) | TypedValue::LangString(_) | TypedValue::Opaque { .. } => {
            Ok(value.lexical_form())
        }
        _ => ThinError::expected(),
    }
}

#[derive(Debug, Default)]
pub struct StrLenOp;

impl ScalarUnaryOp for StrLenOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let s = as_lexical(arg)?;
        Ok(TypedValue::integer(s.chars().count() as i64))
    }
}

#[derive(Debug, Default)]
pub struct UCaseOp;

impl ScalarUnaryOp for UCaseOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(with_same_string_shape(arg, as_lexical(arg)?.to_uppercase()))
    }
}

#[derive(Debug, Default)]
pub struct LCaseOp;

impl ScalarUnaryOp for LCaseOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        Ok(with_same_string_shape(arg, as_lexical(arg)?.to_lowercase()))
    }
}

/// Rebuilds a string-like value with a new lexical form, preserving a language
/// tag if `arg` carried one (per SPARQL string function semantics).
fn with_same_string_shape(arg: &TypedValue, new_value: String) -> TypedValue {
    match arg {
        TypedValue::LangString(ls) => TypedValue::LangString(flake_model::LangString {
            value: new_value,
            language: ls.language.clone(),
        }),
        _ => TypedValue::string(new_value),
    }
}

#[derive(Debug, Default)]
pub struct ContainsOp;

impl ScalarBinaryOp for ContainsOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(
            as_lexical(lhs)?.contains(&as_lexical(rhs)?),
        ))
    }
}

#[derive(Debug, Default)]
pub struct StrStartsOp;

impl ScalarBinaryOp for StrStartsOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(
            as_lexical(lhs)?.starts_with(&as_lexical(rhs)?),
        ))
    }
}

#[derive(Debug, Default)]
pub struct StrEndsOp;

impl ScalarBinaryOp for StrEndsOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        Ok(TypedValue::boolean(
            as_lexical(lhs)?.ends_with(&as_lexical(rhs)?),
        ))
    }
}

#[derive(Debug, Default)]
pub struct StrBeforeOp;

impl ScalarBinaryOp for StrBeforeOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        let (haystack, needle) = (as_lexical(lhs)?, as_lexical(rhs)?);
        match haystack.find(&needle) {
            Some(idx) => Ok(with_same_string_shape(lhs, haystack[..idx].to_owned())),
            None => Ok(TypedValue::string("")),
        }
    }
}

#[derive(Debug, Default)]
pub struct StrAfterOp;

impl ScalarBinaryOp for StrAfterOp {
    fn evaluate(&self, lhs: &TypedValue, rhs: &TypedValue) -> ThinResult<TypedValue> {
        let (haystack, needle) = (as_lexical(lhs)?, as_lexical(rhs)?);
        match haystack.find(&needle) {
            Some(idx) => Ok(with_same_string_shape(
                lhs,
                haystack[idx + needle.len()..].to_owned(),
            )),
            None => Ok(TypedValue::string("")),
        }
    }
}

/// `substr(str, start[, length])`, 1-indexed per SPARQL/XPath. Implemented as a
/// ternary op; the 2-arg form passes [`TypedValue::Integer`] of `i64::MAX` for
/// `length` from the registry dispatcher.
#[derive(Debug, Default)]
pub struct SubStrOp;

impl ScalarTernaryOp for SubStrOp {
    fn evaluate(&self, s: &TypedValue, start: &TypedValue, length: &TypedValue) -> ThinResult<TypedValue> {
        let text = as_lexical(s)?;
        let start = as_i64(start)?;
        let length = as_i64(length)?;
        let chars: Vec<char> = text.chars().collect();
        let start0 = (start - 1).max(0) as usize;
        let end0 = if length == i64::MAX {
            chars.len()
        } else {
            ((start - 1).max(0) + length.max(0)) as usize
        }
        .min(chars.len());
        let slice = if start0 >= chars.len() || start0 >= end0 {
            String::new()
        } else {
            chars[start0..end0].iter().collect()
        };
        Ok(with_same_string_shape(s, slice))
    }
}

fn as_i64(value: &TypedValue) -> ThinResult<i64> {
    match value {
        TypedValue::Integer(i) => Ok(i64::from(*i)),
        TypedValue::Double(d) => Ok(f64::from(*d) as i64),
        TypedValue::Decimal(d) => Ok(f64::from(*d) as i64),
        _ => ThinError::expected(),
    }
}

#[derive(Debug)]
pub struct RegexOp {
    pub case_insensitive: bool,
}

impl ScalarBinaryOp for RegexOp {
    fn evaluate(&self, text: &TypedValue, pattern: &TypedValue) -> ThinResult<TypedValue> {
        let text = as_lexical(text)?;
        let pattern = as_lexical(pattern)?;
        let pattern = if self.case_insensitive {
            format!("(?i){pattern}")
        } else {
            pattern
        };
        let re = Regex::new(&pattern).map_err(|_| ThinError::ExpectedError)?;
        Ok(TypedValue::boolean(re.is_match(&text)))
    }
}

#[derive(Debug, Default)]
pub struct ReplaceOp;

impl ScalarTernaryOp for ReplaceOp {
    fn evaluate(&self, text: &TypedValue, pattern: &TypedValue, replacement: &TypedValue) -> ThinResult<TypedValue> {
        let text = as_lexical(text)?;
        let pattern = as_lexical(pattern)?;
        let replacement = as_lexical(replacement)?;
        let re = Regex::new(&pattern).map_err(|_| ThinError::ExpectedError)?;
        Ok(TypedValue::string(re.replace_all(&text, replacement.as_str()).into_owned()))
    }
}

#[derive(Debug, Default)]
pub struct EncodeForUriOp;

impl ScalarUnaryOp for EncodeForUriOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let s = as_lexical(arg)?;
        let encoded: String = s
            .bytes()
            .map(|b| {
                if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
                    (b as char).to_string()
                } else {
                    format!("%{b:02X}")
                }
            })
            .collect();
        Ok(TypedValue::string(encoded))
    }
}

#[derive(Debug, Default)]
pub struct ConcatOp;

impl ScalarVariadicOp for ConcatOp {
    fn evaluate(&self, args: &[TypedValue]) -> ThinResult<TypedValue> {
        let mut out = String::new();
        for arg in args {
            out.push_str(&as_lexical(arg)?);
        }
        Ok(TypedValue::string(out))
    }
}

#[derive(Debug, Default)]
pub struct LangMatchesOp;

impl ScalarBinaryOp for LangMatchesOp {
    fn evaluate(&self, tag: &TypedValue, range: &TypedValue) -> ThinResult<TypedValue> {
        let tag = as_lexical(tag)?.to_lowercase();
        let range = as_lexical(range)?.to_lowercase();
        let matches = range == "*" && !tag.is_empty()
            || tag == range
            || tag.starts_with(&format!("{range}-"));
        Ok(TypedValue::boolean(matches))
    }
}
