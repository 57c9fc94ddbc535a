use crate::{TypedValue, VariableId, VariableTable};

/// A variable-to-typed-value mapping produced by the where executor
/// (spec.md Sec. 3 "Solution").
///
/// Indexed densely by [`VariableId`] rather than keyed by name (the
/// re-architecture directed by spec.md Sec. 9): `None` at a position means the
/// variable is unbound (`UNDEF`) in this solution, which is distinct from the
/// variable never appearing in the query at all (its slot simply never being
/// read).
#[derive(Clone, Debug, Default)]
pub struct Solution {
    bindings: Vec<Option<TypedValue>>,
}

impl Solution {
    /// An empty solution with `width` unbound slots; the seed of every where
    /// execution (spec.md Sec. 4.2: "folds the ordered where-clause over a seed
    /// stream of one empty solution").
    pub fn empty(width: usize) -> Self {
        Self {
            bindings: vec![None; width],
        }
    }

    pub fn get(&self, var: VariableId) -> Option<&TypedValue> {
        self.bindings.get(var.index()).and_then(Option::as_ref)
    }

    pub fn is_bound(&self, var: VariableId) -> bool {
        self.get(var).is_some()
    }

    /// Binds `var` to `value`, overwriting any previous binding. Rebinding
    /// detection (spec.md Sec. 4.2's `rebinding` error) is the caller's
    /// responsibility (`flake_exec::exec::apply_bind` checks
    /// [`Solution::is_bound`] before calling this); matching a pattern
    /// against an already-bound variable instead filters by equality, which
    /// callers implement by checking [`Solution::get`] first.
    pub fn bind(&mut self, var: VariableId, value: TypedValue) {
        if var.index() >= self.bindings.len() {
            self.bindings.resize(var.index() + 1, None);
        }
        self.bindings[var.index()] = Some(value);
    }

    /// Returns a clone extended with `var -> value`.
    pub fn extended(&self, var: VariableId, value: TypedValue) -> Self {
        let mut next = self.clone();
        next.bind(var, value);
        next
    }

    pub fn width(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &TypedValue)> {
        self.bindings
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VariableId(i as u32), v)))
    }

    /// Renders this solution's bound variables by name, for debugging/testing.
    pub fn display(&self, vars: &VariableTable) -> String {
        let parts: Vec<String> = self
            .iter()
            .map(|(id, value)| format!("{}={}", vars.name(id), value))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}
