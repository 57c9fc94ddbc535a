//! Variable-bindings analysis (spec.md Sec. 4.3 "Variable-bindings analysis"):
//! for each pattern type, the set of variables guaranteed bound by it.

use flake_parser::{Term, WherePattern};
use rustc_hash::FxHashSet;

pub type VarSet = FxHashSet<flake_model::VariableId>;

fn term_var(term: &Term) -> Option<flake_model::VariableId> {
    match term {
        Term::Var(v) => Some(*v),
        _ => None,
    }
}

/// Variables guaranteed bound after `pattern` runs, given it is evaluated in
/// isolation (no knowledge of what is already bound upstream).
///
/// - `union`: intersection across branches (spec.md Sec. 4.3: "For union this
///   is the intersection across branches").
/// - `optional`/`exists`/`not-exists`/`minus`: "the outer variables remain" —
///   none of these leak new bindings to the surrounding scope, so they
///   contribute nothing here (the caller already carries forward whatever was
///   bound before the fence).
/// - `values`/`bind`/triples: the obvious single variable(s) they introduce.
pub fn pattern_bound_vars(pattern: &WherePattern) -> VarSet {
    match pattern {
        WherePattern::Triple { subject, object, .. } | WherePattern::NamedTriple { subject, object, .. } => {
            [term_var(subject), term_var(object)].into_iter().flatten().collect()
        }
        WherePattern::Bind { variable, .. } => std::iter::once(*variable).collect(),
        WherePattern::BindMap(assignments) => assignments.iter().map(|(v, _)| *v).collect(),
        WherePattern::Values { variable, .. } => std::iter::once(*variable).collect(),
        WherePattern::Union(branches) => {
            let mut iter = branches.iter().map(|branch| where_clause_bound_vars(branch));
            let Some(first) = iter.next() else { return VarSet::default() };
            iter.fold(first, |acc, next| acc.intersection(&next).copied().collect())
        }
        WherePattern::Optional(_)
        | WherePattern::Minus(_)
        | WherePattern::Exists(_)
        | WherePattern::NotExists(_)
        | WherePattern::Filter(_) => VarSet::default(),
    }
}

/// The union of variables any pattern in `patterns` guarantees bound.
pub fn where_clause_bound_vars(patterns: &[WherePattern]) -> VarSet {
    patterns.iter().fold(VarSet::default(), |mut acc, p| {
        acc.extend(pattern_bound_vars(p));
        acc
    })
}

/// Variables an expression references, in no particular order (used to check
/// "all referenced variables are guaranteed bound", spec.md Sec. 4.3).
pub fn expr_vars(expr: &flake_parser::Expr, out: &mut VarSet) {
    match expr {
        flake_parser::Expr::Var(v) => {
            out.insert(*v);
        }
        flake_parser::Expr::Const(_) => {}
        flake_parser::Expr::Call { args, .. } => args.iter().for_each(|a| expr_vars(a, out)),
    }
}
