//! Select-map expansion / subject crawl (spec.md Sec. 4.4 step 8, Sec. 4.7)
//! and IRI compaction (step 9).
//!
//! `flake-exec::crawl::subject_slice` runs the same `spot`-scan-over-one-
//! subject shape for the simple-subject-crawl fast path, but it is
//! `pub(crate)` to that crate; this module rebuilds the scan directly against
//! [`Snapshot::index_range`] rather than depending on an internal helper,
//! using the same [`FlakeRange`]/[`Bound`]/[`IndexOrder`] primitives
//! `flake_exec::range::resolve_flake_range` is built from.

use crate::error::QueryError;
use flake_common::{Bound, Cardinality, FlakeRange, Schema, Snapshot};
use flake_model::{IndexOrder, PredicateId, SubjectId, TypedValue};
use flake_parser::{Context, SelectTree, SelectTreeEntry};
use futures::StreamExt;
use rustc_hash::FxHashMap;
use serde_json::{json, Value};

/// Compacts an IRI against the query's prefix context, falling back to
/// `<iri>` bracket notation when no prefix matches (mirrors
/// `flake_planner::explain::compact`, spec.md Sec. 4.3/4.4 step 9).
pub fn compact(context: &Context, iri: &str) -> String {
    context
        .prefixes
        .iter()
        .rev()
        .filter(|(_, ns)| iri.starts_with(ns.as_str()) && !ns.is_empty())
        .max_by_key(|(_, ns)| ns.len())
        .map(|(prefix, ns)| format!("{prefix}:{}", &iri[ns.len()..]))
        .unwrap_or_else(|| format!("<{iri}>"))
}

fn tree_entry<'a>(tree: &'a SelectTree, iri: &str) -> Option<&'a SelectTreeEntry> {
    tree.predicates.iter().find(|e| e.predicate.as_str() == iri)
}

fn scalar_to_json(value: &TypedValue) -> Value {
    match value {
        TypedValue::String(s) => json!(s),
        TypedValue::LangString(s) => json!({"@value": s.value, "@language": s.language}),
        TypedValue::Boolean(b) => json!(b.as_bool()),
        TypedValue::Integer(i) => json!(i64::from(*i)),
        TypedValue::Decimal(d) => json!(d.to_string()),
        TypedValue::Double(d) => json!(f64::from(*d)),
        TypedValue::Float(f) => json!(f32::from(*f)),
        TypedValue::Date(d) => json!(d.to_string()),
        TypedValue::DateTime(d) => json!(d.to_string()),
        TypedValue::Time(t) => json!(t.to_string()),
        TypedValue::Json(j) => j.clone(),
        TypedValue::HexBinary(s) | TypedValue::Base64Binary(s) => json!(s),
        TypedValue::Vector(v) => json!(v),
        TypedValue::Opaque { value, datatype } => json!({"@value": value, "@type": datatype.as_str()}),
        // Reference values are only ever reached here via a non-expanded
        // fallback; `crawl_subject` renders Id/Iri specially before calling
        // this function for any other variant.
        TypedValue::Id(id) => json!(id.to_string()),
        TypedValue::Iri(iri) => json!(iri.as_str()),
    }
}

async fn subject_flakes(snapshot: &dyn Snapshot, sid: SubjectId, fuel: &flake_exec::FuelCounter) -> Result<FxHashMap<PredicateId, Vec<TypedValue>>, QueryError> {
    let range = FlakeRange {
        index: IndexOrder::Spot,
        subject: Bound::Inclusive(sid),
        predicate: Bound::Unbounded,
        object: Bound::Unbounded,
        object_filter: None,
        exclude_retracted: true,
    };
    let mut stream = snapshot.index_range(range).await?;
    let mut by_predicate: FxHashMap<PredicateId, Vec<TypedValue>> = FxHashMap::default();
    while let Some(flake) = stream.next().await {
        let flake = flake?;
        fuel.spend(1)?;
        by_predicate.entry(flake.predicate).or_default().push(flake.object);
    }
    Ok(by_predicate)
}

/// Renders one value of a predicate: a reference expands into a nested
/// document when the tree explicitly nests that predicate, or (absent an
/// explicit nesting) when `component` auto-expansion is enabled and
/// `depth_budget` still allows a hop; otherwise a reference is a bare
/// `{"@id": ...}` stub and a literal is rendered scalar.
#[allow(clippy::too_many_arguments)]
async fn render_value(
    snapshot: &dyn Snapshot,
    value: &TypedValue,
    nested: Option<&SelectTree>,
    component: bool,
    depth_budget: u32,
    context: &Context,
    fuel: &flake_exec::FuelCounter,
) -> Result<Value, QueryError> {
    let sid = match value {
        TypedValue::Id(sid) => Some(*sid),
        TypedValue::Iri(iri) => snapshot.subject_for_iri(iri.as_str()),
        _ => None,
    };
    let Some(sid) = sid else {
        return Ok(scalar_to_json(value));
    };
    if let Some(subtree) = nested {
        return Box::pin(crawl_subject(snapshot, sid, subtree, component, depth_budget.saturating_sub(1), context, fuel)).await;
    }
    if component && depth_budget > 0 {
        let auto = SelectTree { wildcard: true, predicates: vec![] };
        return Box::pin(crawl_subject(snapshot, sid, &auto, component, depth_budget - 1, context, fuel)).await;
    }
    let id = snapshot.iri_for_subject(sid).unwrap_or_else(|| sid.to_string());
    Ok(json!({"@id": compact(context, &id)}))
}

/// Expands one subject into a JSON-LD-style document: `@id` plus every
/// requested predicate (spec.md Sec. 4.4 step 8).
pub async fn crawl_subject(
    snapshot: &dyn Snapshot,
    sid: SubjectId,
    tree: &SelectTree,
    component: bool,
    depth_budget: u32,
    context: &Context,
    fuel: &flake_exec::FuelCounter,
) -> Result<Value, QueryError> {
    let by_predicate = subject_flakes(snapshot, sid, fuel).await?;
    let schema: &Schema = snapshot.schema();
    let mut doc = serde_json::Map::new();
    let id = snapshot.iri_for_subject(sid).unwrap_or_else(|| sid.to_string());
    doc.insert("@id".to_owned(), json!(compact(context, &id)));

    for (pid, values) in &by_predicate {
        let Some(meta) = schema.predicate_by_id(*pid) else { continue };
        let entry = tree_entry(tree, &meta.iri);
        if !tree.wildcard && entry.is_none() {
            continue;
        }
        let nested = entry.and_then(|e| e.nested.as_ref());
        let mut rendered = Vec::with_capacity(values.len());
        for value in values {
            rendered.push(render_value(snapshot, value, nested, component, depth_budget, context, fuel).await?);
        }
        let key = compact(context, &meta.iri);
        let value = match meta.cardinality {
            Cardinality::Single => rendered.into_iter().next().unwrap_or(Value::Null),
            Cardinality::Multi => Value::Array(rendered),
        };
        doc.insert(key, value);
    }
    Ok(Value::Object(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compacts_a_known_prefix() {
        let context = Context { prefixes: vec![("ex".to_owned(), "http://ex.org/".to_owned())] };
        assert_eq!(compact(&context, "http://ex.org/Person"), "ex:Person");
    }

    #[test]
    fn falls_back_to_bracket_form_without_a_matching_prefix() {
        let context = Context { prefixes: vec![] };
        assert_eq!(compact(&context, "http://ex.org/Person"), "<http://ex.org/Person>");
    }

    #[test]
    fn longest_namespace_match_wins() {
        let context = Context {
            prefixes: vec![("a".to_owned(), "http://ex.org/".to_owned()), ("b".to_owned(), "http://ex.org/sub/".to_owned())],
        };
        assert_eq!(compact(&context, "http://ex.org/sub/Thing"), "b:Thing");
    }
}
