//! `GraphPattern` translation (spec.md Sec. 4.8): turns a `spargebra`
//! algebra tree into the `where` clause's JSON array plus the solution
//! modifiers (`groupBy`, `orderBy`, `limit`, `offset`, select mode) that
//! surround it in the FQL document.
//!
//! The body of the tree (`Bgp`, `Join`, `LeftJoin`, `Union`, `Minus`,
//! `Filter`, `Extend`, `Values`, `Graph`, `Path`, `Group`) is walked by
//! [`translate_body`], which always returns a flat list of where-clause
//! items — `Extend` and `Group`'s aggregate bindings are lowered to plain
//! `[var, expr]`/`[var, #(agg)]` bind tuples appended to that list, so
//! anything downstream (the select list, `having`, `orderBy`) only ever has
//! to reference an already-bound variable name, never re-derive an
//! expression.

use crate::error::{Result, TranslateError, Unsupported};
use crate::expression::{aggregate_to_sexpr, expression_to_sexpr};
use crate::term::{
    ground_term_to_json, graph_name_to_dataset_json, named_node_pattern_to_predicate, predicate_to_json, term_pattern_to_json,
    triple_pattern_to_json, BlankNodeAllocator,
};
use serde_json::{json, Value};
use spargebra::algebra::{Expression, GraphPattern};

/// Threaded through the whole body walk: the blank-node allocator, and the
/// `GROUP BY` variable list accumulated if a `Group` node is encountered.
#[derive(Default)]
pub struct BodyCtx {
    pub bnodes: BlankNodeAllocator,
    pub group_by: Vec<String>,
    /// Bind tuples synthesized for `ORDER BY (<expr>)` keys that aren't a
    /// bare variable reference; appended to the where clause by the caller
    /// once the whole body has been translated.
    pub order_binds: Vec<Value>,
}

fn var_name(v: &spargebra::term::Variable) -> String {
    format!("?{}", v.as_str())
}

/// Flattens spargebra's right-associated binary `Union` chain into FQL's
/// n-ary `{"union": [...]}` list.
fn flatten_union<'a>(left: &'a GraphPattern, right: &'a GraphPattern, out: &mut Vec<&'a GraphPattern>) {
    out.push(left);
    match right {
        GraphPattern::Union { left, right } => flatten_union(left, right, out),
        other => out.push(other),
    }
}

pub fn translate_body(pattern: &GraphPattern, ctx: &mut BodyCtx) -> Result<Vec<Value>> {
    match pattern {
        GraphPattern::Bgp { patterns } => patterns.iter().map(|p| triple_pattern_to_json(p, &mut ctx.bnodes)).collect(),

        GraphPattern::Join { left, right } => {
            let mut items = translate_body(left, ctx)?;
            items.extend(translate_body(right, ctx)?);
            Ok(items)
        }

        GraphPattern::LeftJoin { left, right, expression } => {
            let mut items = translate_body(left, ctx)?;
            let mut inner = translate_body(right, ctx)?;
            if let Some(expr) = expression {
                inner.push(json!({"filter": [expression_to_sexpr(expr, &mut ctx.bnodes)?]}));
            }
            items.push(json!({"optional": inner}));
            Ok(items)
        }

        GraphPattern::Union { left, right } => {
            let mut branches = Vec::new();
            flatten_union(left, right, &mut branches);
            let branches =
                branches.into_iter().map(|branch| translate_body(branch, ctx)).collect::<Result<Vec<_>>>()?;
            Ok(vec![json!({"union": branches})])
        }

        GraphPattern::Minus { left, right } => {
            let mut items = translate_body(left, ctx)?;
            let negated = translate_body(right, ctx)?;
            items.push(json!({"minus": negated}));
            Ok(items)
        }

        GraphPattern::Filter { inner, expr } => {
            let mut items = translate_body(inner, ctx)?;
            match expr {
                Expression::Exists(p) => items.push(json!({"exists": translate_body(p, ctx)?})),
                Expression::Not(not_inner) => match not_inner.as_ref() {
                    Expression::Exists(p) => items.push(json!({"not-exists": translate_body(p, ctx)?})),
                    _ => items.push(json!({"filter": [expression_to_sexpr(expr, &mut ctx.bnodes)?]})),
                },
                _ => items.push(json!({"filter": [expression_to_sexpr(expr, &mut ctx.bnodes)?]})),
            }
            Ok(items)
        }

        GraphPattern::Extend { inner, expression, variable } => {
            let mut items = translate_body(inner, ctx)?;
            let value = expression_to_sexpr(expression, &mut ctx.bnodes)?;
            items.push(json!([var_name(variable), value]));
            Ok(items)
        }

        GraphPattern::Group { inner, variables, aggregates } => {
            let mut items = translate_body(inner, ctx)?;
            ctx.group_by.extend(variables.iter().map(var_name));
            for (variable, aggregate) in aggregates {
                let value = aggregate_to_sexpr(aggregate, &mut ctx.bnodes)?;
                items.push(json!([var_name(variable), value]));
            }
            Ok(items)
        }

        GraphPattern::Values { variables, bindings } => {
            let [variable] = variables.as_slice() else {
                return Err(Unsupported::MultiVariableValues.into());
            };
            let rows = bindings
                .iter()
                .map(|row| match &row[0] {
                    None => Ok(Value::Null),
                    Some(term) => ground_term_to_json(term),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(vec![json!({"values": {var_name(variable): rows}})])
        }

        GraphPattern::Graph { name, inner } => {
            let dataset = graph_name_to_dataset_json(name)?;
            let GraphPattern::Bgp { patterns } = inner.as_ref() else {
                return Err(Unsupported::NonBgpGraph.into());
            };
            patterns
                .iter()
                .map(|p| {
                    let predicate = named_node_pattern_to_predicate(&p.predicate)?;
                    Ok(json!([
                        dataset.clone(),
                        term_pattern_to_json(&p.subject, &mut ctx.bnodes)?,
                        predicate,
                        term_pattern_to_json(&p.object, &mut ctx.bnodes)?
                    ]))
                })
                .collect()
        }

        GraphPattern::Path { subject, path, object } => {
            Ok(vec![json!([
                term_pattern_to_json(subject, &mut ctx.bnodes)?,
                predicate_to_json(path)?,
                term_pattern_to_json(object, &mut ctx.bnodes)?
            ])])
        }

        // Project/Distinct/Reduced/OrderBy/Slice only ever wrap the whole
        // query's top-level pattern (peeled off by `lib::translate_select`
        // before the body walk reaches here); encountering one here means a
        // SPARQL subquery, which has no where-clause equivalent (FQL's
        // grammar has no nested query form).
        GraphPattern::Project { .. } | GraphPattern::Distinct { .. } | GraphPattern::Reduced { .. } | GraphPattern::OrderBy { .. } | GraphPattern::Slice { .. } => {
            Err(Unsupported::Subquery.into())
        }

        #[allow(unreachable_patterns)]
        _ => Err(TranslateError::Malformed("unrecognized graph pattern node".to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern, Variable};

    fn triple(s: &str, p: &str, o: &str) -> GraphPattern {
        GraphPattern::Bgp {
            patterns: vec![TriplePattern {
                subject: TermPattern::Variable(Variable::new(s).unwrap()),
                predicate: NamedNodePattern::NamedNode(spargebra::term::NamedNode::new(p).unwrap()),
                object: TermPattern::Variable(Variable::new(o).unwrap()),
            }],
        }
    }

    #[test]
    fn minus_appends_a_minus_item_after_the_left_side() {
        let mut ctx = BodyCtx::default();
        let pattern = GraphPattern::Minus {
            left: Box::new(triple("s", "http://ex/p", "o")),
            right: Box::new(triple("s", "http://ex/q", "x")),
        };
        let items = translate_body(&pattern, &mut ctx).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[1].get("minus").is_some());
    }

    #[test]
    fn union_flattens_a_right_associated_chain_into_one_list() {
        let mut ctx = BodyCtx::default();
        let pattern = GraphPattern::Union {
            left: Box::new(triple("s", "http://ex/p", "o")),
            right: Box::new(GraphPattern::Union {
                left: Box::new(triple("s", "http://ex/q", "o")),
                right: Box::new(triple("s", "http://ex/r", "o")),
            }),
        };
        let items = translate_body(&pattern, &mut ctx).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["union"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn values_with_more_than_one_variable_is_rejected() {
        let mut ctx = BodyCtx::default();
        let pattern = GraphPattern::Values {
            variables: vec![Variable::new("s").unwrap(), Variable::new("o").unwrap()],
            bindings: vec![],
        };
        assert!(translate_body(&pattern, &mut ctx).is_err());
    }

    #[test]
    fn a_subquery_wrapper_mid_body_is_rejected() {
        let mut ctx = BodyCtx::default();
        let pattern = GraphPattern::Distinct { inner: Box::new(triple("s", "http://ex/p", "o")) };
        assert!(translate_body(&pattern, &mut ctx).is_err());
    }
}

