use std::fmt::{Display, Formatter};

/// The closed set of builtin scalar/aggregate function names this engine
/// recognizes, spanning both FQL's named filter functions and SPARQL's
/// builtin function library (spec.md Sec. 4.2, Sec. 4.8).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BuiltinName {
    // Term inspection/construction.
    Str,
    Lang,
    Datatype,
    Iri,
    BNode,
    StrDt,
    StrLang,
    IsIri,
    IsLiteral,
    IsNumeric,
    IsBlank,
    SameTerm,
    Uuid,
    StrUuid,
    // Strings.
    StrLen,
    UCase,
    LCase,
    Contains,
    StrStarts,
    StrEnds,
    StrBefore,
    StrAfter,
    SubStr,
    Regex,
    Replace,
    EncodeForUri,
    Concat,
    LangMatches,
    // Arithmetic.
    Add,
    Sub,
    Mul,
    Div,
    UnaryPlus,
    UnaryMinus,
    Abs,
    Ceil,
    Floor,
    Round,
    Rand,
    // Comparison / logic.
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    And,
    Or,
    Not,
    In,
    NotIn,
    // Functional forms.
    Bound,
    Coalesce,
    If,
    // Hashing.
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    // Dates and times.
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
    Timezone,
    Tz,
    Now,
    // Casts.
    CastString,
    CastBoolean,
    CastInteger,
    CastDecimal,
    CastDouble,
    CastFloat,
    CastDateTime,
}

impl Display for BuiltinName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The closed set of aggregate function names (spec.md Sec. 4.2), kept
/// separate from [`BuiltinName`] since aggregates have their own dispatch
/// path (`aggregate::make_aggregate`) and are only valid inside `bind`/
/// select-expression position, never inside a plain `filter`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AggregateName {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat,
    Median,
    Variance,
    StdDev,
    CountDistinct,
}

impl Display for AggregateName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
