/// Errors raised while parsing and validating an FQL query document (spec.md
/// Sec. 4.5, Sec. 7 "Parse errors"). Every variant carries a stable `:db/...`
/// tag and HTTP-style status (spec.md Sec. 6.5) via [`ParseError::code`] and
/// [`ParseError::status`], mirroring the teacher's `QueryEvaluationError`/
/// `EvaluationError` split: one closed enum per failure cause, raised
/// synchronously, never retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// A `where` tuple was neither a 2-, 3-, nor 4-tuple.
    #[error("invalid where tuple: expected 2, 3, or 4 elements, found {found}")]
    InvalidWhereTupleArity { found: usize },
    /// A map-pattern object had no recognized key (`optional`, `union`, ...).
    #[error("unrecognized where map-pattern key: {0}")]
    UnrecognizedMapPattern(String),
    /// A symbol used in variable position did not start with `?`.
    #[error("not a variable: {0}")]
    NotAVariable(String),
    /// An s-expression referenced a function name outside the builtin set.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// An s-expression referenced an aggregate name outside the builtin set.
    #[error("unknown aggregate: {0}")]
    UnknownAggregate(String),
    /// `limit`/`offset`/`fuel` was not a positive integer (offset may be zero).
    #[error("invalid numeric option '{key}': {value}")]
    InvalidNumericOption { key: &'static str, value: String },
    /// More than one of `select`/`selectOne`/`selectDistinct`/`selectReduced` was present.
    #[error("select, selectOne, selectDistinct, and selectReduced are mutually exclusive")]
    ConflictingSelectModes,
    /// No select mode was present at all.
    #[error("query has no select/selectOne/selectDistinct/selectReduced/delete clause")]
    MissingSelect,
    /// An `orderBy` entry was not a variable or a `(desc ?v)` form.
    #[error("invalid orderBy entry: {0}")]
    InvalidOrderBy(String),
    /// A `groupBy` variable never appears in `where`.
    #[error("groupBy variable {0} is not bound by where")]
    UnboundGroupByVariable(String),
    /// A `bind`/`filter` s-expression string was malformed (unbalanced
    /// parens, empty form, trailing input after the closing paren, ...).
    #[error("malformed expression '{0}': {1}")]
    MalformedExpression(String, String),
    /// A function or aggregate was applied to the wrong number of arguments.
    #[error("wrong arity for {name}: {found} arguments")]
    WrongArity { name: String, found: usize },
    /// The same variable was bound twice by distinct `bind` statements.
    #[error("variable {0} is already bound")]
    Rebinding(String),
    /// A recursive predicate pattern (`p+n`) had a variable predicate or a
    /// non-variable object (spec.md Sec. 4.6).
    #[error("invalid recursive predicate pattern: {0}")]
    InvalidRecursion(String),
    /// A `context` entry's value was not a valid IRI, or a CURIE/`@id`
    /// string referenced an unregistered prefix.
    #[error("invalid IRI '{0}'")]
    InvalidIri(String),
    /// The document was not the expected shape at all (not an object, a
    /// `where` clause that was not an array, ...).
    #[error("invalid query document: {0}")]
    InvalidDocument(String),
}

impl ParseError {
    /// The stable error tag from spec.md Sec. 6.5. Every parse failure is a
    /// `:db/invalid-query`; execution-time errors (handled downstream in
    /// `flake-exec`/`flake-engine`) carry the other tags in that table.
    pub fn code(&self) -> &'static str {
        ":db/invalid-query"
    }

    /// The HTTP-style status from spec.md Sec. 6.5. All parse errors are 400s.
    pub fn status(&self) -> u16 {
        400
    }
}
