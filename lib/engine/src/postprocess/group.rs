//! Grouping (spec.md Sec. 4.4 step 2): partitions a materialized solution
//! stream by the tuple of values of the `groupBy` variables.
//!
//! spec.md notes grouping "is streaming (lazy over already-sorted input)
//! only when `order-by` is compatible with `group-by`; otherwise the stream
//! is materialized first" — this pipeline always receives an already fully
//! materialized `Vec<Solution>` (`Engine::query` collects `execute_where`'s
//! stream before post-processing begins), so it always takes the
//! materialized path; no behavior depends on whether a given run could have
//! streamed, only the final grouping is observable.

use flake_model::{Datatype, Solution, VariableId};
use rustc_hash::FxHashMap;

/// A group's key: one `(datatype, lexical form)` pair per `groupBy`
/// variable, `None` for an unbound group variable (`UNDEF` groups with
/// other `UNDEF`s of the same shape, per SPARQL `GROUP BY` semantics).
type GroupKey = Vec<Option<(Datatype, String)>>;

fn group_key(solution: &Solution, group_by: &[VariableId]) -> GroupKey {
    group_by
        .iter()
        .map(|var| solution.get(*var).map(|v| (v.datatype(), v.lexical_form())))
        .collect()
}

/// Splits `rows` into groups by `group_by`. With an empty `group_by`, all
/// rows form a single group — even when `rows` is empty, since an
/// aggregate with no explicit `GROUP BY` still yields one output row
/// (spec.md Sec. 8: "count over empty group = 0"). With a non-empty
/// `group_by`, groups appear in first-encountered order and an empty input
/// yields zero groups.
pub fn partition_groups(rows: Vec<Solution>, group_by: &[VariableId]) -> Vec<Vec<Solution>> {
    if group_by.is_empty() {
        return vec![rows];
    }
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: FxHashMap<GroupKey, Vec<Solution>> = FxHashMap::default();
    for row in rows {
        let key = group_key(&row, group_by);
        groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Vec::new()
        });
        groups.get_mut(&key).expect("just inserted").push(row);
    }
    order.into_iter().map(|key| groups.remove(&key).expect("key from order")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::TypedValue;

    #[test]
    fn no_group_by_yields_one_group_even_when_empty() {
        let groups = partition_groups(vec![], &[]);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_empty());
    }

    #[test]
    fn groups_rows_by_the_group_variable_value() {
        let a = VariableId(0);
        let mut r1 = Solution::empty(1);
        r1.bind(a, TypedValue::integer(1));
        let mut r2 = Solution::empty(1);
        r2.bind(a, TypedValue::integer(2));
        let mut r3 = Solution::empty(1);
        r3.bind(a, TypedValue::integer(1));
        let groups = partition_groups(vec![r1, r2, r3], &[a]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn unbound_group_variables_form_their_own_group() {
        let a = VariableId(0);
        let r1 = Solution::empty(1);
        let mut r2 = Solution::empty(1);
        r2.bind(a, TypedValue::integer(1));
        let groups = partition_groups(vec![r1, r2], &[a]);
        assert_eq!(groups.len(), 2);
    }
}
