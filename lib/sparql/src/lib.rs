#![doc(test(attr(deny(warnings))))]

//! SPARQL 1.1 -> FQL translation (spec.md Sec. 4.8): turns a SPARQL query or
//! update string into the JSON query-document shape `flake_parser::document`
//! parses, by walking `spargebra`'s parsed algebra tree.
//!
//! This is a grammar-to-grammar compiler, not an evaluator: it never touches
//! a snapshot or runs a query, it only decides whether a given SPARQL string
//! has an FQL equivalent and, if so, emits it. Constructs with no FQL
//! equivalent (`ASK`/`DESCRIBE`/`CONSTRUCT`, `SERVICE`, non-BGP/variable-named
//! `GRAPH`, property paths other than a bare predicate or `predicate+`,
//! `EXISTS` nested in a larger boolean expression, `REDUCED`, `FROM NAMED`,
//! multi-variable `VALUES`, nested subqueries, and the graph-store management
//! forms of SPARQL Update) are rejected with an explicit [`TranslateError`]
//! rather than silently mistranslated (spec.md Sec. 7 "Error Handling
//! Design").

mod error;
mod expression;
mod graph_pattern;
mod term;
mod update;

pub use error::{TranslateError, Unsupported};
pub use term::BlankNodeAllocator;

use error::Result;
use expression::expression_to_sexpr;
use graph_pattern::{translate_body, BodyCtx};
use serde_json::{json, Map, Value};
use spargebra::algebra::{Expression, GraphPattern, OrderExpression};
use spargebra::Query;

/// Parses `sparql` as a SPARQL 1.1 Query and translates it into an FQL query
/// document (spec.md Sec. 6.1). Only `SELECT` is translatable; `ASK`,
/// `DESCRIBE`, and `CONSTRUCT` are rejected.
pub fn translate_query(sparql: &str, base_iri: Option<&str>) -> Result<Value> {
    let query = Query::parse(sparql, base_iri)?;
    match query {
        Query::Select { pattern, dataset, .. } => {
            reject_named_dataset(dataset.as_ref())?;
            translate_select(&pattern)
        }
        Query::Ask { .. } => Err(Unsupported::Ask.into()),
        Query::Describe { .. } => Err(Unsupported::Describe.into()),
        Query::Construct { .. } => Err(Unsupported::Construct.into()),
    }
}

/// Parses `sparql` as a SPARQL 1.1 Update and translates its single
/// operation into an FQL `delete`-mode document (spec.md Sec. 1: "DELETE/
/// INSERT are parsed but execution of updates is not specified here" — this
/// crate only covers the parse-time translation). An update carrying more
/// than one operation is rejected, since FQL's document grammar has no
/// concept of an operation sequence.
pub fn translate_update(sparql: &str, base_iri: Option<&str>) -> Result<Value> {
    let update = spargebra::Update::parse(sparql, base_iri)?;
    let [operation] = update.operations.as_slice() else {
        return Err(TranslateError::Malformed("only a single SPARQL Update operation is translatable".to_owned()));
    };
    update::translate_operation(operation)
}

fn reject_named_dataset(dataset: Option<&spargebra::algebra::QueryDataset>) -> Result<()> {
    match dataset.and_then(|ds| ds.named.as_ref()) {
        Some(named) if !named.is_empty() => Err(Unsupported::NamedDataset.into()),
        _ => Ok(()),
    }
}

/// Peels a `SELECT` query's solution-modifier wrapper nodes
/// (`Slice`/`Distinct`/`Reduced`/`Project`/`OrderBy`) off the top of the
/// algebra tree, in the order spargebra nests them, and translates what
/// remains as the `where` clause body.
fn translate_select(pattern: &GraphPattern) -> Result<Value> {
    let mut pattern = pattern;

    let mut limit = None;
    let mut offset = 0u64;
    if let GraphPattern::Slice { inner, start, length } = pattern {
        offset = *start as u64;
        limit = length.map(|n| n as u64);
        pattern = inner;
    }

    let mut distinct = false;
    match pattern {
        GraphPattern::Distinct { inner } => {
            distinct = true;
            pattern = inner;
        }
        GraphPattern::Reduced { .. } => return Err(Unsupported::Reduced.into()),
        _ => {}
    }

    let GraphPattern::Project { inner, variables } = pattern else {
        return Err(TranslateError::Malformed("expected a projection at the top of the query".to_owned()));
    };
    pattern = inner;

    let mut order_expressions: &[OrderExpression] = &[];
    if let GraphPattern::OrderBy { inner, expression } = pattern {
        order_expressions = expression;
        pattern = inner;
    }

    let mut having_expr = None;
    let body_pattern = if let GraphPattern::Filter { inner, expr } = pattern {
        if matches!(inner.as_ref(), GraphPattern::Group { .. }) {
            having_expr = Some(expr);
            inner.as_ref()
        } else {
            pattern
        }
    } else {
        pattern
    };

    let mut ctx = BodyCtx::default();
    let mut where_clause = translate_body(body_pattern, &mut ctx)?;

    let having: Vec<String> =
        having_expr.map(|expr| expression_to_sexpr(expr, &mut ctx.bnodes)).transpose()?.into_iter().collect();

    let order_by =
        order_expressions.iter().map(|key| order_expression_to_json(key, &mut ctx)).collect::<Result<Vec<_>>>()?;
    where_clause.extend(std::mem::take(&mut ctx.order_binds));

    let select: Vec<Value> = variables.iter().map(|v| json!(format!("?{}", v.as_str()))).collect();

    let mut doc = Map::new();
    doc.insert(if distinct { "selectDistinct" } else { "select" }.to_owned(), json!(select));
    doc.insert("where".to_owned(), json!(where_clause));
    if !ctx.group_by.is_empty() {
        doc.insert("groupBy".to_owned(), json!(ctx.group_by));
    }
    if !having.is_empty() {
        doc.insert("having".to_owned(), json!(having));
    }
    if !order_by.is_empty() {
        doc.insert("orderBy".to_owned(), json!(order_by));
    }
    if let Some(limit) = limit {
        doc.insert("limit".to_owned(), json!(limit));
    }
    if offset != 0 {
        doc.insert("offset".to_owned(), json!(offset));
    }
    // Tells `flake_parser::document::parse` this document originated from
    // SPARQL translation, not a hand-written FQL document (spec.md Sec. 3:
    // `minus` is only legal via this path).
    doc.insert("_dialect".to_owned(), json!("sparql"));
    Ok(Value::Object(doc))
}

/// Translates one `ORDER BY` key. A bare-variable key lowers to the
/// grammar's plain `"?v"`/`"(desc ?v)"` string; anything more (`ORDER BY
/// (?x + 1)`) has no slot in that grammar for an inline expression, so it's
/// hoisted into a synthesized `bind` tuple the caller appends to the `where`
/// clause and ordered on by name instead.
fn order_expression_to_json(key: &OrderExpression, ctx: &mut BodyCtx) -> Result<Value> {
    let (expr, desc) = match key {
        OrderExpression::Asc(expr) => (expr, false),
        OrderExpression::Desc(expr) => (expr, true),
    };
    let name = match expr {
        Expression::Variable(v) => format!("?{}", v.as_str()),
        other => {
            let sexpr = expression_to_sexpr(other, &mut ctx.bnodes)?;
            let synthesized = format!("?_order_{}", ctx.group_by.len() + ctx.order_binds.len());
            ctx.order_binds.push(json!([synthesized, sexpr]));
            synthesized
        }
    };
    Ok(json!(if desc { format!("(desc {name})") } else { name }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_parser::ast::{SelectClause, WherePattern};

    #[test]
    fn translates_a_plain_select_and_round_trips_through_the_parser() {
        let doc = translate_query("SELECT ?s ?o WHERE { ?s <http://ex/p> ?o }", None).unwrap();
        assert_eq!(doc["select"], json!(["?s", "?o"]));
        let parsed = flake_parser::document::parse(&doc).unwrap();
        assert_eq!(parsed.where_clause.len(), 1);
        assert!(matches!(parsed.where_clause[0], WherePattern::Triple { .. }));
    }

    #[test]
    fn translates_distinct_limit_and_offset() {
        let doc = translate_query("SELECT DISTINCT ?s WHERE { ?s <http://ex/p> ?o } LIMIT 10 OFFSET 5", None).unwrap();
        assert!(doc.get("select").is_none());
        assert_eq!(doc["selectDistinct"], json!(["?s"]));
        assert_eq!(doc["limit"], json!(10));
        assert_eq!(doc["offset"], json!(5));
    }

    #[test]
    fn translates_group_by_aggregate_and_having() {
        let sparql = "SELECT ?c (COUNT(?u) AS ?n) WHERE { ?u <http://ex/country> ?c } GROUP BY ?c HAVING (COUNT(?u) > 1)";
        let doc = translate_query(sparql, None).unwrap();
        assert_eq!(doc["groupBy"], json!(["?c"]));
        assert!(doc["having"].as_array().unwrap()[0].as_str().unwrap().contains("count"));
        let where_clause = doc["where"].as_array().unwrap();
        assert!(where_clause.iter().any(|item| item.get(0) == Some(&json!("?n"))));

        let parsed = flake_parser::document::parse(&doc).unwrap();
        assert_eq!(parsed.group_by.len(), 1);
        match &parsed.select {
            SelectClause::Items(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected an items select clause"),
        }
    }

    #[test]
    fn translates_order_by_a_compound_expression_via_a_synthesized_bind() {
        let sparql = "SELECT ?s ?o WHERE { ?s <http://ex/p> ?o } ORDER BY (?o + 1)";
        let doc = translate_query(sparql, None).unwrap();
        let order_by = doc["orderBy"].as_array().unwrap();
        assert_eq!(order_by.len(), 1);
        let ordered_name = order_by[0].as_str().unwrap();
        assert!(ordered_name.starts_with("?_order_"));
        let where_clause = doc["where"].as_array().unwrap();
        assert!(where_clause.iter().any(|item| item.get(0) == Some(&json!(ordered_name))));
    }

    #[test]
    fn translates_optional_with_a_filter() {
        let sparql =
            "SELECT ?u ?e WHERE { ?u a <http://ex/Person> . OPTIONAL { ?u <http://ex/email> ?e . FILTER(STRSTARTS(?e, \"a\")) } }";
        let doc = translate_query(sparql, None).unwrap();
        let where_clause = doc["where"].as_array().unwrap();
        let optional = where_clause.iter().find_map(|item| item.get("optional")).expect("an optional item");
        assert!(optional.as_array().unwrap().iter().any(|item| item.get("filter").is_some()));
        flake_parser::document::parse(&doc).unwrap();
    }

    #[test]
    fn ask_queries_are_rejected() {
        let err = translate_query("ASK { ?s ?p ?o }", None).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(Unsupported::Ask)));
    }

    #[test]
    fn construct_queries_are_rejected() {
        let err = translate_query("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }", None).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(Unsupported::Construct)));
    }

    #[test]
    fn multi_variable_values_are_rejected() {
        let sparql = "SELECT ?s ?o WHERE { VALUES (?s ?o) { (<http://ex/a> <http://ex/b>) } }";
        let err = translate_query(sparql, None).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(Unsupported::MultiVariableValues)));
    }

    #[test]
    fn variable_named_graphs_are_rejected() {
        let sparql = "SELECT ?g ?s ?o WHERE { GRAPH ?g { ?s <http://ex/p> ?o } }";
        let err = translate_query(sparql, None).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(Unsupported::VariableGraphName)));
    }

    #[test]
    fn reduced_is_rejected() {
        let sparql = "SELECT REDUCED ?s WHERE { ?s <http://ex/p> ?o }";
        let err = translate_query(sparql, None).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(Unsupported::Reduced)));
    }

    #[test]
    fn translates_delete_data() {
        let doc = translate_update("DELETE DATA { <http://ex/a> <http://ex/p> <http://ex/b> }", None).unwrap();
        assert_eq!(doc["delete"], json!([]));
        assert_eq!(doc["where"], json!([["http://ex/a", "http://ex/p", "http://ex/b"]]));
    }

    #[test]
    fn translates_delete_where() {
        let doc = translate_update("DELETE WHERE { ?s <http://ex/p> ?o }", None).unwrap();
        let select = doc["delete"].as_array().unwrap();
        assert!(select.contains(&json!("?s")));
        assert!(select.contains(&json!("?o")));
        flake_parser::document::parse(&doc).unwrap();
    }

    #[test]
    fn insert_data_is_rejected() {
        let err = translate_update("INSERT DATA { <http://ex/a> <http://ex/p> <http://ex/b> }", None).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(Unsupported::InsertData)));
    }
}
