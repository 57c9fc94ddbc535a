//! The post-processing pipeline (spec.md Sec. 4.4): turns a raw, materialized
//! solution stream (`flake-exec::execute_where`'s output, already collected)
//! into a [`QueryResults`]. Runs the nine steps in the order spec.md lists
//! them: aggregate binding resolution, group-by, having, order-by,
//! distinct/reduced, offset/limit, projection, select-map expansion /
//! subject crawl, and IRI compaction.

mod aggregate;
pub(crate) mod crawl;
mod group;
mod order;

use crate::error::QueryError;
use crate::results::QueryResults;
use flake_common::Snapshot;
use flake_exec::{EvalContext, FuelCounter};
use flake_model::{Datatype, Solution, TypedValue, VariableId};
use flake_parser::{BindValue, ParsedQuery, SelectClause, SelectItem, SelectMode};
use std::collections::HashSet;

/// Fills in the select-list's own lazily-computed `as`-expression aliases
/// (spec.md Sec. 4.4 step 7: "Expression results are computed lazily per
/// solution"). Aggregate aliases are already bound by [`aggregate::resolve_aggregates`]
/// by the time this runs; a bare `Var` item needs no mutation. An expression
/// that fails to evaluate leaves its alias unbound, the same "function
/// errors within `bind` leave the variable unbound" rule a where-clause
/// `bind` follows (spec.md Sec. 7).
fn project_row(select: &SelectClause, mut solution: Solution, ctx: &EvalContext) -> Solution {
    if let SelectClause::Items(items) = select {
        for item in items {
            if let SelectItem::As { value: BindValue::Expr(expr), alias } = item {
                if let Ok(value) = flake_exec::evaluate(expr, &solution, ctx) {
                    solution.bind(*alias, value);
                }
            }
        }
    }
    solution
}

/// The variables that make up one output row, in select-list order: a bare
/// item's own variable, an `as` item's alias, or the crawled subject
/// variable in document mode.
fn output_variables(select: &SelectClause) -> Vec<VariableId> {
    match select {
        SelectClause::Items(items) => items
            .iter()
            .map(|item| match item {
                SelectItem::Var(v) => *v,
                SelectItem::As { alias, .. } => *alias,
            })
            .collect(),
        SelectClause::Crawl { variable, .. } => vec![*variable],
    }
}

/// The distinct/reduced dedup key (spec.md Sec. 4.4 step 5: "Deduplicate by
/// the projected tuple"): one `(datatype, lexical form)` pair per output
/// variable, so values of different datatypes with the same lexical form
/// (`1` the integer vs. `"1"` the string) are never conflated.
fn dedup_key(vars: &[VariableId], solution: &Solution) -> Vec<Option<(Datatype, String)>> {
    vars.iter().map(|v| solution.get(*v).map(|val| (val.datatype(), val.lexical_form()))).collect()
}

/// Runs the whole post-processing pipeline over an already-materialized
/// solution stream.
///
/// `fuel` is the same [`FuelCounter`] instance `flake-exec` used for
/// where-clause execution, so a single `max_fuel` budget covers both phases;
/// grouping charges one unit per representative solution it produces, and
/// select-map expansion charges one unit per flake it reads off the
/// snapshot (spec.md Sec. 5 "every emitted flake and every produced
/// solution").
pub async fn postprocess(
    parsed: &ParsedQuery,
    snapshot: &dyn Snapshot,
    eval_ctx: &EvalContext,
    fuel: &FuelCounter,
    rows: Vec<Solution>,
    component: bool,
) -> Result<QueryResults, QueryError> {
    // Step 1 (discovery) + step 2 (group-by).
    let aggregate_binds = aggregate::collect_aggregate_binds(parsed);
    let groups = group::partition_groups(rows, &parsed.group_by);

    // Step 1 (resolution) + step 3 (having).
    let mut representatives = Vec::with_capacity(groups.len());
    for group in &groups {
        let mut representative = group.first().cloned().unwrap_or_else(|| Solution::empty(parsed.variables.len()));
        aggregate::resolve_aggregates(&aggregate_binds, group, &mut representative, eval_ctx);
        fuel.spend(1)?;
        let keep = parsed.having.iter().all(|expr| flake_exec::evaluate_filter(expr, &representative, eval_ctx));
        if keep {
            representatives.push(representative);
        }
    }

    // Step 4: order-by.
    order::order_by(&mut representatives, &parsed.order_by);

    // Step 7 (expression aliases evaluated early; distinct needs the
    // resulting projected tuple, not just the raw representative).
    let output_vars = output_variables(&parsed.select);
    let mut projected: Vec<Solution> = representatives.into_iter().map(|row| project_row(&parsed.select, row, eval_ctx)).collect();

    // Step 5: distinct/reduced. FQL's native `selectReduced` is treated
    // identically to `selectDistinct` at this layer (spec.md step 5 makes no
    // distinction between them; only SPARQL's own laxer `REDUCED` hint, with
    // no FQL equivalent, is rejected earlier by `flake-sparql`).
    if matches!(parsed.select_mode, SelectMode::Distinct | SelectMode::Reduced) {
        let mut seen = HashSet::new();
        projected.retain(|solution| seen.insert(dedup_key(&output_vars, solution)));
    }

    // Step 6: offset/limit.
    let offset = parsed.offset as usize;
    let mut projected = if offset >= projected.len() { Vec::new() } else { projected.split_off(offset) };
    if let Some(limit) = parsed.limit {
        projected.truncate(limit as usize);
    }

    // Step 8 + 9: select-map expansion / subject crawl, with IRI compaction
    // applied inline as each document is built. Tuple-mode output keeps raw
    // `TypedValue`s uncompacted — compaction is a JSON/string-presentation
    // concern that only applies to the document shape.
    match &parsed.select {
        SelectClause::Items(_) => Ok(QueryResults::Solutions(projected)),
        SelectClause::Crawl { variable, tree } => {
            let mut docs = Vec::with_capacity(projected.len());
            for solution in &projected {
                let Some(TypedValue::Id(sid)) = solution.get(*variable).cloned() else {
                    continue;
                };
                let doc = crawl::crawl_subject(snapshot, sid, tree, component, parsed.depth, &parsed.context, fuel).await?;
                docs.push(doc);
            }
            Ok(QueryResults::Document(docs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_parser::{Context, OpType};
    use oxsdatatypes::DateTime;

    fn eval_ctx() -> EvalContext {
        EvalContext { query_time: DateTime::now() }
    }

    fn base_query() -> ParsedQuery {
        ParsedQuery {
            variables: Default::default(),
            op_type: OpType::Select,
            select: SelectClause::Items(vec![SelectItem::Var(VariableId(0))]),
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

    fn row(v: i64) -> Solution {
        let mut s = Solution::empty(1);
        s.bind(VariableId(0), TypedValue::integer(v));
        s
    }

    #[tokio::test]
    async fn distinct_mode_dedupes_by_the_output_tuple() {
        let mut query = base_query();
        query.select_mode = SelectMode::Distinct;
        let snapshot = flake_storage::test_util::Fixture::default().build();
        let fuel = FuelCounter::unbounded();
        let ctx = eval_ctx();
        let rows = vec![row(1), row(1), row(2)];
        let result = postprocess(&query, snapshot.as_ref(), &ctx, &fuel, rows, false).await.unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn offset_and_limit_apply_after_ordering() {
        let mut query = base_query();
        query.limit = Some(1);
        query.offset = 1;
        let snapshot = flake_storage::test_util::Fixture::default().build();
        let fuel = FuelCounter::unbounded();
        let ctx = eval_ctx();
        let rows = vec![row(3), row(1), row(2)];
        let result = postprocess(&query, snapshot.as_ref(), &ctx, &fuel, rows, false).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn count_over_an_empty_group_yields_one_zero_row() {
        let mut query = base_query();
        let call = flake_parser::AggregateCall { name: flake_functions::AggregateName::Count, distinct: false, arg: None, separator: None };
        query.select = SelectClause::Items(vec![SelectItem::As { value: BindValue::Aggregate(call), alias: VariableId(0) }]);
        let snapshot = flake_storage::test_util::Fixture::default().build();
        let fuel = FuelCounter::unbounded();
        let ctx = eval_ctx();
        let result = postprocess(&query, snapshot.as_ref(), &ctx, &fuel, vec![], false).await.unwrap();
        let QueryResults::Solutions(rows) = result else { panic!("expected tuple-mode output") };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(VariableId(0)).unwrap().lexical_form(), "0");
    }
}
