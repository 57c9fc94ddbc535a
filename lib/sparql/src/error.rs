//! Translation errors (spec.md Sec. 4.8, Sec. 6.5): every SPARQL construct
//! with no FQL equivalent raises one of these instead of being silently
//! mistranslated.

use std::fmt;

/// Something about the query that FQL's grammar (`flake_parser::ast`) has no
/// way to represent.
#[derive(Debug)]
#[non_exhaustive]
pub enum Unsupported {
    Ask,
    Describe,
    Reduced,
    NamedDataset,
    Service,
    NonBgpGraph,
    VariableGraphName,
    NonPredicatePath,
    NestedExists,
    InsertData,
    InsertClause,
    Load,
    Clear,
    Create,
    Drop,
    NamedUsingDataset,
    UnknownFunction(String),
    UnknownAggregate(String),
    DefaultGraphAggregate,
    MultiVariableValues,
    Subquery,
    Construct,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask => write!(f, "ASK queries have no FQL projection to translate into"),
            Self::Describe => write!(f, "DESCRIBE queries have no FQL projection to translate into"),
            Self::Reduced => write!(f, "REDUCED has no FQL equivalent (only DISTINCT is representable)"),
            Self::NamedDataset => write!(f, "FROM NAMED / GRAPH ?g dataset scoping has no FQL equivalent"),
            Self::Service => write!(f, "SERVICE has no FQL equivalent (no federated-call surface)"),
            Self::NonBgpGraph => write!(f, "GRAPH <iri> {{ .. }} is only translatable when it wraps a plain basic graph pattern"),
            Self::VariableGraphName => write!(f, "GRAPH ?g {{ .. }} has no FQL equivalent (dataset name must be a constant IRI)"),
            Self::NonPredicatePath => write!(f, "only a bare predicate or predicate+ property path is translatable"),
            Self::NestedExists => write!(f, "EXISTS/NOT EXISTS is only translatable as a standalone filter, not nested in a larger expression"),
            Self::InsertData => write!(f, "INSERT DATA has no FQL equivalent (no query-layer insert surface)"),
            Self::InsertClause => write!(f, "the INSERT clause of DELETE/INSERT has no FQL equivalent (no query-layer insert surface)"),
            Self::Load => write!(f, "LOAD is a graph-store management operation with no FQL equivalent"),
            Self::Clear => write!(f, "CLEAR is a graph-store management operation with no FQL equivalent"),
            Self::Create => write!(f, "CREATE is a graph-store management operation with no FQL equivalent"),
            Self::Drop => write!(f, "DROP is a graph-store management operation with no FQL equivalent"),
            Self::NamedUsingDataset => write!(f, "USING NAMED has no FQL equivalent"),
            Self::UnknownFunction(name) => write!(f, "'{name}' has no corresponding FQL builtin"),
            Self::UnknownAggregate(name) => write!(f, "'{name}' has no corresponding FQL aggregate"),
            Self::DefaultGraphAggregate => write!(f, "custom aggregate functions have no FQL equivalent"),
            Self::MultiVariableValues => write!(f, "a multi-variable VALUES block has no FQL equivalent (only single-variable VALUES is representable)"),
            Self::Subquery => write!(f, "nested SPARQL subqueries have no FQL equivalent"),
            Self::Construct => write!(f, "CONSTRUCT has no FQL equivalent (no query-layer template-construction surface)"),
        }
    }
}

/// Failure to translate a parsed SPARQL query into an FQL query document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TranslateError {
    #[error("failed to parse SPARQL: {0}")]
    Parse(#[from] spargebra::SparqlSyntaxError),

    #[error("unsupported SPARQL construct: {0}")]
    Unsupported(Unsupported),

    #[error("malformed query: {0}")]
    Malformed(String),
}

impl From<Unsupported> for TranslateError {
    fn from(value: Unsupported) -> Self {
        Self::Unsupported(value)
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
