//! Aggregate-binding resolution (spec.md Sec. 4.4 step 1): fills in the
//! pseudo-column slot of every aggregate `bind` once a group of solutions
//! has been formed.
//!
//! An aggregate's target variable arrives from `flake-exec`'s where executor
//! already present in the solution but always unbound (`apply_bind` only
//! fills `BindValue::Expr` slots, per spec.md Sec. 4.2), so this module's
//! only job is finding where those slots are and filling them in per group.

use flake_exec::EvalContext;
use flake_model::{Solution, VariableId};
use flake_parser::{AggregateCall, BindValue, ParsedQuery, SelectClause, SelectItem, WherePattern};

/// One aggregate pseudo-column: the variable it fills in, and the call that
/// computes its value.
pub struct AggregateBind<'a> {
    pub variable: VariableId,
    pub call: &'a AggregateCall,
}

/// Collects every aggregate bind in the query: both where-clause `bind`s
/// whose value is an aggregate (the shape `flake-sparql` always produces for
/// `GROUP BY` + an aggregate `AS`, spec.md Sec. 4.8) and bare
/// `(aggregate ...)` select-list items (FQL's native select-list shorthand,
/// spec.md Sec. 6.1 `select`/`as` grammar). Aggregates are only ever
/// top-level where-clause entries (`flake-sparql`'s `Group` lowering always
/// appends them to the outermost item list it is assembling), so this scans
/// `where_clause` shallowly rather than recursing into `Optional`/`Union`/
/// `Minus`/`Exists`/`NotExists` branches.
pub fn collect_aggregate_binds(parsed: &ParsedQuery) -> Vec<AggregateBind<'_>> {
    let mut binds = Vec::new();
    for pattern in &parsed.where_clause {
        match pattern {
            WherePattern::Bind { variable, value: BindValue::Aggregate(call) } => {
                binds.push(AggregateBind { variable: *variable, call });
            }
            WherePattern::BindMap(assignments) => {
                for (variable, value) in assignments {
                    if let BindValue::Aggregate(call) = value {
                        binds.push(AggregateBind { variable: *variable, call });
                    }
                }
            }
            _ => {}
        }
    }
    if let SelectClause::Items(items) = &parsed.select {
        for item in items {
            if let SelectItem::As { value: BindValue::Aggregate(call), alias } = item {
                binds.push(AggregateBind { variable: *alias, call });
            }
        }
    }
    binds
}

/// Computes every aggregate bind over `group` and fills them into
/// `representative`. An aggregate that errors (e.g. `min`/`max`/`sample`/
/// `groupconcat` over an empty group) leaves its variable unbound rather
/// than failing the group (spec.md Sec. 7 "function errors within `bind`
/// expressions leave the variable unbound").
pub fn resolve_aggregates(binds: &[AggregateBind<'_>], group: &[Solution], representative: &mut Solution, ctx: &EvalContext) {
    for bind in binds {
        if let Ok(value) = flake_exec::evaluate_aggregate(bind.call, group, ctx) {
            representative.bind(bind.variable, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_functions::AggregateName;
    use flake_parser::{Context, OpType, SelectMode};

    fn empty_parsed_query() -> ParsedQuery {
        ParsedQuery {
            variables: Default::default(),
            op_type: OpType::Select,
            select: SelectClause::Items(vec![]),
            select_mode: SelectMode::Many,
            where_clause: vec![],
            order_by: vec![],
            group_by: vec![],
            having: vec![],
            limit: None,
            offset: 0,
            depth: 0,
            context: Context::default(),
            dialect: Default::default(),
            supplied_vars: vec![],
            max_fuel: None,
            opts: serde_json::Value::Null,
        }
    }

    #[test]
    fn finds_an_aggregate_bind_in_the_where_clause() {
        let mut parsed = empty_parsed_query();
        let call = AggregateCall { name: AggregateName::Count, distinct: false, arg: None, separator: None };
        parsed.where_clause.push(WherePattern::Bind { variable: VariableId(0), value: BindValue::Aggregate(call) });
        let binds = collect_aggregate_binds(&parsed);
        assert_eq!(binds.len(), 1);
        assert_eq!(binds[0].variable, VariableId(0));
    }

    #[test]
    fn finds_a_select_list_aggregate_item() {
        let mut parsed = empty_parsed_query();
        let call = AggregateCall { name: AggregateName::Sum, distinct: false, arg: Some(Box::new(flake_parser::Expr::Var(VariableId(1)))), separator: None };
        parsed.select = SelectClause::Items(vec![SelectItem::As { value: BindValue::Aggregate(call), alias: VariableId(2) }]);
        let binds = collect_aggregate_binds(&parsed);
        assert_eq!(binds.len(), 1);
        assert_eq!(binds[0].variable, VariableId(2));
    }

    #[test]
    fn plain_binds_are_not_collected() {
        let mut parsed = empty_parsed_query();
        parsed.where_clause.push(WherePattern::Bind {
            variable: VariableId(0),
            value: BindValue::Expr(flake_parser::Expr::Const(flake_model::TypedValue::integer(1))),
        });
        assert!(collect_aggregate_binds(&parsed).is_empty());
    }
}
