//! Top-level query errors (spec.md Sec. 6.5, Sec. 7): wraps every failure
//! mode a sibling crate can raise behind one enum with a stable `:db/...`
//! tag and HTTP-style status, mirroring `flake-parser::ParseError`'s and
//! `flake-exec::QueryError`'s own one-variant-per-cause shape.

use flake_exec::QueryError as ExecError;
use flake_model::StorageError;
use flake_parser::ParseError;
use flake_sparql::TranslateError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// Failed to parse the query document (spec.md Sec. 4.5).
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Failed to translate a SPARQL query into an FQL query document
    /// (spec.md Sec. 4.8). `TranslateError` carries no tag/status of its own,
    /// so every cause is reported here as `:db/invalid-query`/400, matching
    /// `ParseError`'s blanket convention for input the query never got past.
    #[error("failed to translate SPARQL query: {0}")]
    Translate(#[from] TranslateError),
    /// Failed during where-clause execution (spec.md Sec. 4.1, 4.2, 4.6, 4.7).
    #[error(transparent)]
    Exec(#[from] ExecError),
    /// Propagated from the snapshot's storage layer outside of
    /// where-clause execution (select-map expansion's subject crawl, schema
    /// lookups during post-processing).
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// `dataset` named a ledger this engine has no snapshot for.
    #[error("unknown ledger: {0}")]
    UnknownLedger(String),
}

impl QueryError {
    /// The stable `:db/...` tag (spec.md Sec. 6.5).
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Parse(e) => e.code(),
            QueryError::Translate(_) => ":db/invalid-query",
            QueryError::Exec(e) => e.code(),
            QueryError::Storage(_) => ":db/invalid-predicate",
            QueryError::UnknownLedger(_) => ":db/unknown-ledger",
        }
    }

    /// The HTTP-style status from spec.md Sec. 6.5.
    pub fn status(&self) -> u16 {
        match self {
            QueryError::Parse(e) => e.status(),
            QueryError::Translate(_) => 400,
            QueryError::Exec(e) => e.status(),
            QueryError::Storage(_) => 400,
            QueryError::UnknownLedger(_) => 404,
        }
    }
}
