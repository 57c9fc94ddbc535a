//! SPARQL Update translation (spec.md Sec. 4.8, Sec. 1: "DELETE/INSERT are
//! parsed but execution of updates is not specified here"). Only the two
//! update forms that have a `where`-clause-shaped FQL counterpart are
//! translatable; the graph-store management forms (`LOAD`/`CLEAR`/`CREATE`/
//! `DROP`) and `INSERT DATA`/the `INSERT` half of `DELETE`/`INSERT` are
//! rejected outright, since FQL's document grammar has no surface for
//! writing data at all.

use crate::error::{Result, TranslateError, Unsupported};
use crate::graph_pattern::{translate_body, BodyCtx};
use crate::term::{ground_term_to_json, is_rdf_type};
use serde_json::{json, Map, Value};
use spargebra::algebra::GraphUpdateOperation;
use spargebra::term::{GraphName, GraphNamePattern, GroundQuad, GroundSubject, QuadPattern, TermPattern};

/// Translates a single parsed SPARQL Update operation (`lib.rs` rejects an
/// update with more than one operation before calling this). `DELETE DATA`
/// becomes a `delete` document whose `where` clause is the literal quads to
/// remove and whose `select` list is empty (nothing is projected back out of
/// a delete-by-constant); `DELETE ... WHERE` / `DELETE {t} WHERE {p}` (with no
/// `INSERT` half) becomes a `delete` document whose `select` list is the
/// delete template's distinguished variables and whose `where` clause is the
/// translated pattern.
pub fn translate_operation(operation: &GraphUpdateOperation) -> Result<Value> {
    match operation {
        GraphUpdateOperation::InsertData { .. } => Err(Unsupported::InsertData.into()),

        GraphUpdateOperation::DeleteData { data } => {
            let where_clause = data.iter().map(ground_quad_to_json).collect::<Result<Vec<_>>>()?;
            let mut doc = Map::new();
            doc.insert("delete".to_owned(), json!(Vec::<Value>::new()));
            doc.insert("where".to_owned(), json!(where_clause));
            doc.insert("_dialect".to_owned(), json!("sparql"));
            Ok(Value::Object(doc))
        }

        GraphUpdateOperation::DeleteInsert { delete, insert, using, pattern } => {
            if !insert.is_empty() {
                return Err(Unsupported::InsertClause.into());
            }
            if using.as_ref().is_some_and(|ds| ds.named.as_ref().is_some_and(|n| !n.is_empty())) {
                return Err(Unsupported::NamedUsingDataset.into());
            }

            let mut ctx = BodyCtx::default();
            let where_clause = translate_body(pattern, &mut ctx)?;
            let select = distinguished_variables(delete);

            let mut doc = Map::new();
            doc.insert("delete".to_owned(), json!(select));
            doc.insert("where".to_owned(), json!(where_clause));
            doc.insert("_dialect".to_owned(), json!("sparql"));
            Ok(Value::Object(doc))
        }

        GraphUpdateOperation::Load { .. } => Err(Unsupported::Load.into()),
        GraphUpdateOperation::Clear { .. } => Err(Unsupported::Clear.into()),
        GraphUpdateOperation::Create { .. } => Err(Unsupported::Create.into()),
        GraphUpdateOperation::Drop { .. } => Err(Unsupported::Drop.into()),

        #[allow(unreachable_patterns)]
        _ => Err(TranslateError::Malformed("unrecognized SPARQL Update operation".to_owned())),
    }
}

/// `DELETE DATA` quads carry no variables, so each one lowers straight to a
/// ground triple (default-graph case) or the same 4-tuple shape `GRAPH <iri>
/// { .. }` uses in query position (named-graph case).
fn ground_quad_to_json(quad: &GroundQuad) -> Result<Value> {
    let subject = match &quad.subject {
        GroundSubject::NamedNode(n) => json!(n.as_str()),
        #[allow(unreachable_patterns)]
        _ => return Err(Unsupported::NonPredicatePath.into()),
    };
    let predicate = if is_rdf_type(&quad.predicate) { json!("rdf:type") } else { json!(quad.predicate.as_str()) };
    let object = ground_term_to_json(&quad.object)?;
    match &quad.graph_name {
        GraphName::NamedNode(n) => Ok(json!([n.as_str(), subject, predicate, object])),
        GraphName::DefaultGraph => Ok(json!([subject, predicate, object])),
        #[allow(unreachable_patterns)]
        _ => Err(Unsupported::VariableGraphName.into()),
    }
}

/// The delete template's distinguished variables, in first-appearance order,
/// rendered as `"?v"` select-item strings — the simple-case assumption that
/// the template mirrors the `WHERE` pattern's bound variables rather than
/// introducing its own.
fn distinguished_variables(delete: &[QuadPattern]) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for quad in delete {
        if let TermPattern::Variable(v) = &quad.subject {
            push_unique(format!("?{}", v.as_str()), &mut seen, &mut out);
        }
        if let TermPattern::Variable(v) = &quad.object {
            push_unique(format!("?{}", v.as_str()), &mut seen, &mut out);
        }
        if let GraphNamePattern::Variable(v) = &quad.graph_name {
            push_unique(format!("?{}", v.as_str()), &mut seen, &mut out);
        }
    }
    out
}

fn push_unique(name: String, seen: &mut std::collections::HashSet<String>, out: &mut Vec<Value>) {
    if seen.insert(name.clone()) {
        out.push(json!(name));
    }
}
