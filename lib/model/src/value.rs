use crate::{Datatype, SubjectId, ThinError, ThinResult};
use oxrdf::{NamedNode, NamedNodeRef};
use oxsdatatypes::{Boolean, Date, DateTime, Decimal, Double, Float, Integer, Time};
use std::cmp::Ordering;
use std::fmt;

/// A language-tagged string (`rdf:langString`).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct LangString {
    pub value: String,
    pub language: String,
}

/// A `(value, datatype)` pair, per spec.md Sec. 3 "Typed value".
///
/// This is the in-memory representation flowing through solutions, filter
/// evaluation, and select-crawl output. It purposefully mirrors the teacher's
/// `TypedValue`/`TypedValueRef` split in shape (one tagged enum per concrete
/// datatype) but is row-oriented rather than columnar, and leans on
/// [`oxsdatatypes`] for XSD scalar parsing/arithmetic instead of re-implementing
/// thin newtype wrappers around it.
#[derive(Clone, PartialEq, Debug)]
pub enum TypedValue {
    String(String),
    LangString(LangString),
    Boolean(Boolean),
    Integer(Integer),
    Decimal(Decimal),
    Double(Double),
    Float(Float),
    Date(Date),
    DateTime(DateTime),
    Time(Time),
    Json(serde_json::Value),
    /// An `xsd:hexBinary` literal, kept as its lexical (hex-digit) form.
    HexBinary(String),
    /// An `xsd:base64Binary` literal, kept as its lexical (base64) form.
    Base64Binary(String),
    /// A dense numeric vector (embeddings and similar).
    Vector(Vec<f64>),
    /// A reference to another subject (a resolved `@id`/IRI object).
    Id(SubjectId),
    /// A free-standing IRI term that is not (yet) resolved to a subject id.
    Iri(NamedNode),
    /// A literal of an unrecognized datatype, kept verbatim and never coerced.
    Opaque { value: String, datatype: NamedNode },
}

impl TypedValue {
    pub fn datatype(&self) -> Datatype {
        match self {
            TypedValue::String(_) => Datatype::String,
            TypedValue::LangString(_) => Datatype::LangString,
            TypedValue::Boolean(_) => Datatype::Boolean,
            TypedValue::Integer(_) => Datatype::Integer,
            TypedValue::Decimal(_) => Datatype::Decimal,
            TypedValue::Double(_) => Datatype::Double,
            TypedValue::Float(_) => Datatype::Float,
            TypedValue::Date(_) => Datatype::Date,
            TypedValue::DateTime(_) => Datatype::DateTime,
            TypedValue::Time(_) => Datatype::Time,
            TypedValue::Json(_) => Datatype::Json,
            TypedValue::HexBinary(_) => Datatype::HexBinary,
            TypedValue::Base64Binary(_) => Datatype::Base64Binary,
            TypedValue::Vector(_) => Datatype::Vector,
            TypedValue::Id(_) | TypedValue::Iri(_) => Datatype::Id,
            TypedValue::Opaque { .. } => Datatype::Opaque,
        }
    }

    pub fn boolean(value: bool) -> Self {
        TypedValue::Boolean(Boolean::from(value))
    }

    pub fn integer(value: i64) -> Self {
        TypedValue::Integer(Integer::from(value))
    }

    pub fn double(value: f64) -> Self {
        TypedValue::Double(Double::from(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::String(value.into())
    }

    /// Effective boolean value per SPARQL `EBV` rules; used by `filter`, `&&`,
    /// `||`, and `if`.
    pub fn effective_boolean_value(&self) -> ThinResult<bool> {
        match self {
            TypedValue::Boolean(b) => Ok(b.as_bool()),
            TypedValue::String(s) => Ok(!s.is_empty()),
            TypedValue::LangString(s) => Ok(!s.value.is_empty()),
            TypedValue::Integer(i) => Ok(i64::from(*i) != 0),
            TypedValue::Decimal(d) => Ok(*d != Decimal::from(0)),
            TypedValue::Double(d) => Ok(*d != Double::from(0.) && !d.is_nan()),
            TypedValue::Float(f) => Ok(*f != Float::from(0.) && !f.is_nan()),
            _ => ThinError::expected(),
        }
    }

    /// `str(...)`: the lexical form of the value, as it would be serialized.
    pub fn lexical_form(&self) -> String {
        match self {
            TypedValue::String(s) | TypedValue::Opaque { value: s, .. } => s.clone(),
            TypedValue::LangString(s) => s.value.clone(),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Integer(i) => i.to_string(),
            TypedValue::Decimal(d) => d.to_string(),
            TypedValue::Double(d) => d.to_string(),
            TypedValue::Float(f) => f.to_string(),
            TypedValue::Date(d) => d.to_string(),
            TypedValue::DateTime(d) => d.to_string(),
            TypedValue::Time(t) => t.to_string(),
            TypedValue::Json(j) => j.to_string(),
            TypedValue::HexBinary(s) | TypedValue::Base64Binary(s) => s.clone(),
            TypedValue::Vector(v) => format!("[{}]", v.iter().map(f64::to_string).collect::<Vec<_>>().join(",")),
            TypedValue::Id(id) => id.to_string(),
            TypedValue::Iri(iri) => iri.as_str().to_owned(),
        }
    }

    /// Infers the typed value for a plain JSON scalar, following the JSON-LD
    /// compatible inference rules in spec.md Sec. 3:
    /// "plain string -> string (or langString if `@language`); integer-valued
    /// number -> integer; non-integer number -> double; boolean -> boolean."
    pub fn infer_from_json(value: &serde_json::Value, language: Option<&str>) -> ThinResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(match language {
                Some(lang) => TypedValue::LangString(LangString {
                    value: s.clone(),
                    language: lang.to_owned(),
                }),
                None => TypedValue::String(s.clone()),
            }),
            serde_json::Value::Bool(b) => Ok(TypedValue::boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(TypedValue::Integer(Integer::from(i)))
                } else {
                    let f = n.as_f64().ok_or(ThinError::ExpectedError)?;
                    Ok(TypedValue::Double(Double::from(f)))
                }
            }
            serde_json::Value::Null => ThinError::expected(),
            other => Ok(TypedValue::Json(other.clone())),
        }
    }

    /// Coerces a literal's lexical form into a [`TypedValue`] for a known,
    /// recognized `datatype` IRI. Unrecognized datatypes are accepted as
    /// [`TypedValue::Opaque`] rather than rejected, per spec.md Sec. 3.
    pub fn coerce_lexical(lexical: &str, datatype: NamedNodeRef<'_>) -> ThinResult<Self> {
        use oxrdf::vocab::xsd;
        Ok(match datatype {
            xsd::STRING => TypedValue::String(lexical.to_owned()),
            xsd::BOOLEAN => TypedValue::Boolean(lexical.parse()?),
            xsd::INTEGER
            | xsd::INT
            | xsd::LONG
            | xsd::SHORT
            | xsd::BYTE
            | xsd::NON_NEGATIVE_INTEGER
            | xsd::NON_POSITIVE_INTEGER
            | xsd::POSITIVE_INTEGER
            | xsd::NEGATIVE_INTEGER
            | xsd::UNSIGNED_LONG
            | xsd::UNSIGNED_INT
            | xsd::UNSIGNED_SHORT
            | xsd::UNSIGNED_BYTE => TypedValue::Integer(lexical.parse()?),
            xsd::DECIMAL => TypedValue::Decimal(lexical.parse()?),
            xsd::DOUBLE => TypedValue::Double(lexical.parse()?),
            xsd::FLOAT => TypedValue::Float(lexical.parse()?),
            xsd::DATE => TypedValue::Date(lexical.parse()?),
            xsd::DATE_TIME | xsd::DATE_TIME_STAMP => TypedValue::DateTime(lexical.parse()?),
            xsd::TIME => TypedValue::Time(lexical.parse()?),
            xsd::NORMALIZED_STRING | xsd::TOKEN | xsd::LANGUAGE => {
                TypedValue::String(lexical.to_owned())
            }
            xsd::HEX_BINARY => TypedValue::HexBinary(lexical.to_owned()),
            xsd::BASE64_BINARY => TypedValue::Base64Binary(lexical.to_owned()),
            xsd::ANY_URI => {
                TypedValue::Iri(NamedNode::new(lexical).map_err(|_| ThinError::ExpectedError)?)
            }
            _ => TypedValue::Opaque {
                value: lexical.to_owned(),
                datatype: datatype.into_owned(),
            },
        })
    }

    /// Explicit `xsd:*` cast, used by the `CastXSparqlOp` family of filter
    /// functions (spec.md Sec. 4.2 scalar function list).
    pub fn coerce_to(&self, target: Datatype) -> ThinResult<Self> {
        if self.datatype() == target {
            return Ok(self.clone());
        }
        Ok(match target {
            Datatype::String => TypedValue::String(self.lexical_form()),
            Datatype::Boolean => TypedValue::Boolean(self.effective_boolean_value()?.into()),
            Datatype::Integer => TypedValue::Integer(self.as_numeric_str()?.parse()?),
            Datatype::Decimal => TypedValue::Decimal(self.as_numeric_str()?.parse()?),
            Datatype::Double => TypedValue::Double(self.as_numeric_str()?.parse()?),
            Datatype::Float => TypedValue::Float(self.as_numeric_str()?.parse()?),
            Datatype::DateTime => TypedValue::DateTime(self.lexical_form().parse()?),
            _ => return ThinError::expected(),
        })
    }

    fn as_numeric_str(&self) -> ThinResult<String> {
        match self {
            TypedValue::String(s) | TypedValue::LangString(LangString { value: s, .. }) => {
                Ok(s.clone())
            }
            TypedValue::Boolean(b) => Ok(if b.as_bool() { "1" } else { "0" }.to_owned()),
            _ if self.datatype().is_numeric() => Ok(self.lexical_form()),
            _ => ThinError::expected(),
        }
    }

    /// SPARQL `sameTerm`: structural equality including datatype/language, as
    /// opposed to value equality.
    pub fn same_term(&self, other: &Self) -> bool {
        self == other
    }

    /// Comparison following SPARQL `=`/`<`/`<=`/`>`/`>=` semantics: comparing
    /// values of incompatible datatypes is an error (excluded by the caller per
    /// spec.md Sec. 7), not merely "unequal".
    pub fn compare(&self, other: &Self) -> ThinResult<Ordering> {
        use TypedValue::{Boolean as B, Date as Da, DateTime as Dt, Decimal as De, Double as Do, Float as F, Integer as I, LangString as L, String as S, Time as T};
        match (self, other) {
            (S(a), S(b)) => Ok(a.cmp(b)),
            (L(a), L(b)) if a.language == b.language => Ok(a.value.cmp(&b.value)),
            (B(a), B(b)) => Ok(a.cmp(b)),
            (Da(a), Da(b)) => a.partial_cmp(b).ok_or(ThinError::ExpectedError),
            (Dt(a), Dt(b)) => a.partial_cmp(b).ok_or(ThinError::ExpectedError),
            (T(a), T(b)) => a.partial_cmp(b).ok_or(ThinError::ExpectedError),
            (a, b) if a.datatype().is_numeric() && b.datatype().is_numeric() => {
                let (a, b) = (a.as_f64()?, b.as_f64()?);
                a.partial_cmp(&b).ok_or(ThinError::ExpectedError)
            }
            _ => ThinError::expected(),
        }
    }

    fn as_f64(&self) -> ThinResult<f64> {
        match self {
            TypedValue::Integer(i) => Ok(i64::from(*i) as f64),
            TypedValue::Decimal(d) => Ok((*d).into()),
            TypedValue::Double(d) => Ok((*d).into()),
            TypedValue::Float(f) => Ok(f32::from(*f) as f64),
            _ => ThinError::expected(),
        }
    }

    /// Total order used by `order-by` (spec.md Sec. 4.4 step 4): same-datatype
    /// scalar compare; across datatypes, compare by datatype-id first.
    pub fn order_by_cmp(&self, other: &Self) -> Ordering {
        let dt_cmp = self.datatype().compare_datatype_id(other.datatype());
        if dt_cmp != Ordering::Equal {
            return dt_cmp;
        }
        self.compare(other).unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexical_form())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_integer_vs_double() {
        let int_val = TypedValue::infer_from_json(&serde_json::json!(4), None).unwrap();
        assert_eq!(int_val.datatype(), Datatype::Integer);

        let double_val = TypedValue::infer_from_json(&serde_json::json!(4.5), None).unwrap();
        assert_eq!(double_val.datatype(), Datatype::Double);
    }

    #[test]
    fn infers_lang_string_when_language_present() {
        let value = TypedValue::infer_from_json(&serde_json::json!("hello"), Some("en")).unwrap();
        assert!(matches!(value, TypedValue::LangString(LangString { language, .. }) if language == "en"));
    }

    #[test]
    fn unknown_datatype_is_opaque_and_uncoerced() {
        let dt = NamedNode::new("https://example.org/custom-type").unwrap();
        let value = TypedValue::coerce_lexical("abc", dt.as_ref()).unwrap();
        assert!(matches!(value, TypedValue::Opaque { .. }));
    }

    #[test]
    fn comparing_incompatible_datatypes_errors() {
        let s = TypedValue::string("a");
        let i = TypedValue::Integer(Integer::from(1));
        assert!(s.compare(&i).is_err());
    }

    #[test]
    fn round_trip_integer_coercion() {
        let original = TypedValue::Integer(Integer::from(42));
        let serialized = original.lexical_form();
        let xsd_int = oxrdf::NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap();
        let round_tripped = TypedValue::coerce_lexical(&serialized, xsd_int.as_ref()).unwrap();
        assert_eq!(original, round_tripped);
    }

    #[test]
    fn order_by_cmp_buckets_by_datatype_before_value() {
        let boolean = TypedValue::boolean(true);
        let string = TypedValue::string("a");
        assert_eq!(boolean.order_by_cmp(&string), Ordering::Less);
    }
}
