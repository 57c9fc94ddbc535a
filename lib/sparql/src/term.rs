//! Term, predicate, and property-path translation (spec.md Sec. 4.8; Sec. 6.1
//! grammar for `term`, `pred-ref`, `dataset`).
//!
//! FQL's `term` grammar has no blank-node concept at all, so every
//! `spargebra`/`oxrdf` blank node is rewritten to a synthesized variable the
//! first time it's seen. The mapping is translator-local (spec.md Sec. 9's
//! redesign note: "replace the process-wide mutable counter used during
//! SPARQL translation with a translator-local monotonic generator passed
//! through the visitor").

use crate::error::{Result, Unsupported};
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, NamedNode, Variable};
use serde_json::{json, Value};
use spargebra::algebra::PropertyPathExpression;
use spargebra::term::{GroundTerm, Literal, NamedNodePattern, TermPattern, TriplePattern};
use std::collections::HashMap;

/// Allocates a stable `"?_bnode_<n>"` variable name per blank node label,
/// scoped to a single translation.
#[derive(Default)]
pub struct BlankNodeAllocator {
    seen: HashMap<String, String>,
    next: u64,
}

impl BlankNodeAllocator {
    pub fn variable_for(&mut self, bnode: &BlankNode) -> String {
        let label = bnode.as_str();
        if let Some(existing) = self.seen.get(label) {
            return existing.clone();
        }
        let name = format!("?_bnode_{}", self.next);
        self.next += 1;
        self.seen.insert(label.to_owned(), name.clone());
        name
    }
}

/// `rdf:type` is given a reserved pred-ref spelling by the grammar (spec.md
/// Sec. 6.1: `"rdf:type"` as a literal `term`, not a predicate IRI).
pub fn is_rdf_type(node: &NamedNode) -> bool {
    node.as_ref() == rdf::TYPE
}

/// Renders a literal term into the plain-scalar or `{"@value": ...}`
/// object shape `flake_parser::document::parse_term` accepts.
pub fn literal_to_json(literal: &Literal) -> Value {
    let datatype = literal.datatype();
    if let Some(language) = literal.language() {
        return json!({"@value": literal.value(), "@language": language});
    }
    match datatype.as_str() {
        "http://www.w3.org/2001/XMLSchema#string" => Value::String(literal.value().to_owned()),
        "http://www.w3.org/2001/XMLSchema#boolean" => match literal.value() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            other => json!({"@value": other, "@type": datatype.as_str()}),
        },
        "http://www.w3.org/2001/XMLSchema#integer"
        | "http://www.w3.org/2001/XMLSchema#int"
        | "http://www.w3.org/2001/XMLSchema#long" => match literal.value().parse::<i64>() {
            Ok(n) => json!(n),
            Err(_) => json!({"@value": literal.value(), "@type": datatype.as_str()}),
        },
        "http://www.w3.org/2001/XMLSchema#double" | "http://www.w3.org/2001/XMLSchema#float" => {
            match literal.value().parse::<f64>() {
                Ok(n) => json!(n),
                Err(_) => json!({"@value": literal.value(), "@type": datatype.as_str()}),
            }
        }
        _ => json!({"@value": literal.value(), "@type": datatype.as_str()}),
    }
}

/// Translates a subject/object `TermPattern` into the `term` grammar's JSON
/// shape: a variable name string, an IRI string, or a literal value/object.
pub fn term_pattern_to_json(term: &TermPattern, bnodes: &mut BlankNodeAllocator) -> Result<Value> {
    match term {
        TermPattern::NamedNode(n) if is_rdf_type(n) => Ok(json!("rdf:type")),
        TermPattern::NamedNode(n) => Ok(json!(n.as_str())),
        TermPattern::BlankNode(b) => Ok(json!(bnodes.variable_for(b))),
        TermPattern::Literal(l) => Ok(literal_to_json(l)),
        TermPattern::Variable(v) => Ok(json!(format!("?{}", v.as_str()))),
        #[allow(unreachable_patterns)]
        _ => Err(Unsupported::NonPredicatePath.into()),
    }
}

pub fn ground_term_to_json(term: &GroundTerm) -> Result<Value> {
    match term {
        GroundTerm::NamedNode(n) if is_rdf_type(n) => Ok(json!("rdf:type")),
        GroundTerm::NamedNode(n) => Ok(json!(n.as_str())),
        GroundTerm::Literal(l) => Ok(literal_to_json(l)),
        #[allow(unreachable_patterns)]
        _ => Err(Unsupported::NonPredicatePath.into()),
    }
}

pub fn variable_to_json(v: &Variable) -> Value {
    json!(format!("?{}", v.as_str()))
}

/// Translates a triple's predicate slot: a bare `iri` or `var` pred-ref, or a
/// `predicate+`-shaped `OneOrMore` property path. Anything else (inverse,
/// sequence, alternative, `?`, `*`, negated sets) has no FQL equivalent.
pub fn predicate_to_json(path: &PropertyPathExpression) -> Result<Value> {
    match path {
        PropertyPathExpression::NamedNode(n) if is_rdf_type(n) => Ok(json!("rdf:type")),
        PropertyPathExpression::NamedNode(n) => Ok(json!(n.as_str())),
        PropertyPathExpression::OneOrMore(inner) => match inner.as_ref() {
            PropertyPathExpression::NamedNode(n) => Ok(json!(format!("{}+", n.as_str()))),
            _ => Err(Unsupported::NonPredicatePath.into()),
        },
        _ => Err(Unsupported::NonPredicatePath.into()),
    }
}

pub fn named_node_pattern_to_predicate(pred: &NamedNodePattern) -> Result<Value> {
    match pred {
        NamedNodePattern::NamedNode(n) if is_rdf_type(n) => Ok(json!("rdf:type")),
        NamedNodePattern::NamedNode(n) => Ok(json!(n.as_str())),
        NamedNodePattern::Variable(v) => Ok(json!(format!("?{}", v.as_str()))),
    }
}

/// Translates a `GRAPH <name> { .. }` clause's name into the `dataset`
/// grammar's JSON shape (`flake_parser::document::parse_dataset` reads it
/// as a plain string, expanding anything that isn't `$fdb`/`$wd` via the
/// query context). Only a constant IRI name is representable; a
/// variable-named graph has nothing to bind it to in FQL's grammar.
pub fn graph_name_to_dataset_json(name: &NamedNodePattern) -> Result<Value> {
    match name {
        NamedNodePattern::NamedNode(n) => Ok(json!(n.as_str())),
        NamedNodePattern::Variable(_) => Err(Unsupported::VariableGraphName.into()),
    }
}

/// Translates a `Path` pattern's `(subject, path, object)` into a plain
/// 3-tuple `WherePattern::Triple` shape, the only kind the grammar supports.
pub fn path_triple_to_json(triple_subject: &TermPattern, path: &PropertyPathExpression, triple_object: &TermPattern, bnodes: &mut BlankNodeAllocator) -> Result<Value> {
    Ok(json!([term_pattern_to_json(triple_subject, bnodes)?, predicate_to_json(path)?, term_pattern_to_json(triple_object, bnodes)?]))
}

/// Translates a plain `TriplePattern` (a `Bgp` member) into a 3-tuple.
pub fn triple_pattern_to_json(pattern: &TriplePattern, bnodes: &mut BlankNodeAllocator) -> Result<Value> {
    let predicate = named_node_pattern_to_predicate(&pattern.predicate)?;
    Ok(json!([term_pattern_to_json(&pattern.subject, bnodes)?, predicate, term_pattern_to_json(&pattern.object, bnodes)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_blank_node_label_resolves_to_the_same_variable() {
        let mut bnodes = BlankNodeAllocator::default();
        let b = BlankNode::new("x1").unwrap();
        let first = bnodes.variable_for(&b);
        let second = bnodes.variable_for(&b);
        assert_eq!(first, second);
        let other = bnodes.variable_for(&BlankNode::new("x2").unwrap());
        assert_ne!(first, other);
    }

    #[test]
    fn plain_string_literal_is_a_bare_json_string() {
        let literal = Literal::new_simple_literal("hello");
        assert_eq!(literal_to_json(&literal), json!("hello"));
    }

    #[test]
    fn language_tagged_literal_becomes_a_value_object() {
        let literal = Literal::new_language_tagged_literal("bonjour", "fr").unwrap();
        assert_eq!(literal_to_json(&literal), json!({"@value": "bonjour", "@language": "fr"}));
    }

    #[test]
    fn unparseable_integer_falls_back_to_a_typed_value_object() {
        let literal = Literal::new_typed_literal("not-a-number", NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap());
        let json = literal_to_json(&literal);
        assert_eq!(json["@value"], json!("not-a-number"));
    }

    #[test]
    fn rdf_type_predicate_uses_the_reserved_spelling() {
        let path = PropertyPathExpression::NamedNode(rdf::TYPE.into_owned());
        assert_eq!(predicate_to_json(&path).unwrap(), json!("rdf:type"));
    }

    #[test]
    fn one_or_more_of_a_bare_predicate_becomes_a_plus_suffixed_string() {
        let inner = PropertyPathExpression::NamedNode(NamedNode::new("http://ex/follows").unwrap());
        let path = PropertyPathExpression::OneOrMore(Box::new(inner));
        assert_eq!(predicate_to_json(&path).unwrap(), json!("http://ex/follows+"));
    }

    #[test]
    fn inverse_paths_have_no_fql_equivalent() {
        let inner = PropertyPathExpression::NamedNode(NamedNode::new("http://ex/follows").unwrap());
        let path = PropertyPathExpression::Reverse(Box::new(inner));
        assert!(predicate_to_json(&path).is_err());
    }
}
