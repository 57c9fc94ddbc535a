//! IRI expansion under a query's `context` (spec.md Sec. 4.5: "`context` is an
//! IRI prefix mapping; applied to expand `@id`/predicate strings at parse
//! time"). Grounded on the teacher's `oxiri::Iri` for IRI validation; the
//! CURIE-splitting itself is new surface syntax with no teacher counterpart.

use crate::ast::Context;
use crate::error::ParseError;
use flake_model::{Iri, NamedNode};

/// The built-in prefixes every query gets for free, regardless of its own
/// `context`: `rdf:` (needed for the reserved `rdf:type` term) and `xsd:`
/// (needed for cast function names and datatype IRIs).
const BUILTIN_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

impl Context {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ParseError> {
        let mut prefixes: Vec<(String, String)> =
            BUILTIN_PREFIXES.iter().map(|(p, ns)| ((*p).to_owned(), (*ns).to_owned())).collect();
        if let Some(map) = value.as_object() {
            for (prefix, target) in map {
                let iri = target
                    .as_str()
                    .ok_or_else(|| ParseError::InvalidIri(target.to_string()))?;
                Iri::parse(iri.to_owned()).map_err(|_| ParseError::InvalidIri(iri.to_owned()))?;
                prefixes.push((prefix.clone(), iri.to_owned()));
            }
        }
        Ok(Context { prefixes })
    }

    /// Expands `compact` (an absolute IRI, or a `prefix:local` CURIE) into a
    /// full [`NamedNode`]. Absolute IRIs (containing `://` or starting with
    /// `urn:`) pass through unchanged.
    pub fn expand(&self, compact: &str) -> Result<NamedNode, ParseError> {
        if compact.contains("://") || compact.starts_with("urn:") {
            return NamedNode::new(compact).map_err(|_| ParseError::InvalidIri(compact.to_owned()));
        }
        if let Some((prefix, local)) = compact.split_once(':') {
            if let Some((_, namespace)) = self.prefixes.iter().rev().find(|(p, _)| p == prefix) {
                return NamedNode::new(format!("{namespace}{local}"))
                    .map_err(|_| ParseError::InvalidIri(compact.to_owned()));
            }
        }
        Err(ParseError::InvalidIri(compact.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_rdf_type_via_the_builtin_prefix() {
        let context = Context::from_json(&serde_json::json!({})).unwrap();
        let expanded = context.expand("rdf:type").unwrap();
        assert_eq!(expanded.as_str(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    }

    #[test]
    fn a_configured_prefix_overrides_nothing_but_is_additive() {
        let context = Context::from_json(&serde_json::json!({"ex": "https://example.org/"})).unwrap();
        assert_eq!(context.expand("ex:Person").unwrap().as_str(), "https://example.org/Person");
        assert_eq!(context.expand("rdf:type").unwrap().as_str(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    }

    #[test]
    fn absolute_iris_pass_through() {
        let context = Context::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(context.expand("https://example.org/x").unwrap().as_str(), "https://example.org/x");
    }

    #[test]
    fn unknown_prefix_is_an_invalid_iri_error() {
        let context = Context::from_json(&serde_json::json!({})).unwrap();
        assert!(context.expand("nope:thing").is_err());
    }
}
