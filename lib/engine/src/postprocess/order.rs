//! Order-by (spec.md Sec. 4.4 step 4): a stable sort by a list of
//! `(variable, direction)` pairs, using [`TypedValue::order_by_cmp`]'s
//! datatype-aware comparator (same-datatype scalar compare; across
//! datatypes, compare datatype-id first).

use flake_model::Solution;
use flake_parser::{Direction, OrderKey};
use std::cmp::Ordering;

/// Compares two solutions by `keys` in order, short-circuiting on the first
/// non-equal key. An unbound sort variable sorts before any bound value,
/// consistently in both directions of that key (mirrors SPARQL's treatment
/// of `UNDEF` sorting first in `ORDER BY ASC`).
fn compare_by(keys: &[OrderKey], a: &Solution, b: &Solution) -> Ordering {
    for key in keys {
        let (av, bv) = (a.get(key.variable), b.get(key.variable));
        let cmp = match (av, bv) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.order_by_cmp(b),
        };
        let cmp = match key.direction {
            Direction::Asc => cmp,
            Direction::Desc => cmp.reverse(),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

/// Stably sorts `rows` by `keys`. A no-op when `keys` is empty, leaving
/// whatever order grouping/having produced.
pub fn order_by(rows: &mut [Solution], keys: &[OrderKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| compare_by(keys, a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::{TypedValue, VariableId};

    fn row(value: Option<i64>) -> Solution {
        let mut s = Solution::empty(1);
        if let Some(v) = value {
            s.bind(VariableId(0), TypedValue::integer(v));
        }
        s
    }

    #[test]
    fn sorts_ascending_by_default() {
        let mut rows = vec![row(Some(3)), row(Some(1)), row(Some(2))];
        let keys = vec![OrderKey { variable: VariableId(0), direction: Direction::Asc }];
        order_by(&mut rows, &keys);
        let values: Vec<_> = rows.iter().map(|s| s.get(VariableId(0)).unwrap().lexical_form()).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn descending_reverses_the_comparator() {
        let mut rows = vec![row(Some(1)), row(Some(3)), row(Some(2))];
        let keys = vec![OrderKey { variable: VariableId(0), direction: Direction::Desc }];
        order_by(&mut rows, &keys);
        let values: Vec<_> = rows.iter().map(|s| s.get(VariableId(0)).unwrap().lexical_form()).collect();
        assert_eq!(values, vec!["3", "2", "1"]);
    }

    #[test]
    fn unbound_sort_key_sorts_first() {
        let mut rows = vec![row(Some(1)), row(None)];
        let keys = vec![OrderKey { variable: VariableId(0), direction: Direction::Asc }];
        order_by(&mut rows, &keys);
        assert!(rows[0].get(VariableId(0)).is_none());
    }
}
