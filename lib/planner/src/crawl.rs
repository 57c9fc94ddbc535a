//! Simple-subject-crawl recognition (spec.md Sec. 4.7): decide whether a
//! query qualifies for `flake_exec::simple_subject_crawl`'s fast path, which
//! skips building a general `Solution` stream entirely and instead walks one
//! subject's `spot` slice directly.
//!
//! Grounded on spec.md Sec. 4.7's own eligibility rule; there is no teacher
//! counterpart (the teacher has no comparable "skip the general plan" path —
//! every query goes through a DataFusion logical/physical plan).

use flake_parser::{SelectClause, Term, WherePattern};

/// Eligibility (spec.md Sec. 4.7): the select is a single-variable
/// select-crawl, and every where-clause entry is a plain triple pattern whose
/// subject is that same variable — no optional/union/minus/filter/bind/values
/// fences, no named-graph patterns, no recursive or variable predicates tying
/// the result to anything beyond "this subject's own flakes".
pub fn is_simple_subject_crawl(select: &SelectClause, where_clause: &[WherePattern]) -> bool {
    let SelectClause::Crawl { variable, .. } = select else {
        return false;
    };
    if where_clause.is_empty() {
        return false;
    }
    where_clause.iter().all(|pattern| match pattern {
        WherePattern::Triple { subject: Term::Var(v), predicate, .. } => {
            v == variable && matches!(predicate, flake_parser::PredRef::Iri(_))
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flake_model::{NamedNode, VariableId};
    use flake_parser::{PredRef, SelectTree};

    fn iri(s: &str) -> PredRef {
        PredRef::Iri(NamedNode::new(s).unwrap())
    }

    #[test]
    fn qualifies_when_every_pattern_shares_the_crawl_subject() {
        let v = VariableId(0);
        let select = SelectClause::Crawl { variable: v, tree: SelectTree::default() };
        let where_clause = vec![
            WherePattern::Triple { subject: Term::Var(v), predicate: iri("ex:name"), object: Term::Var(VariableId(1)) },
            WherePattern::Triple { subject: Term::Var(v), predicate: iri("ex:age"), object: Term::Var(VariableId(2)) },
        ];
        assert!(is_simple_subject_crawl(&select, &where_clause));
    }

    #[test]
    fn disqualified_by_a_different_subject() {
        let v = VariableId(0);
        let other = VariableId(9);
        let select = SelectClause::Crawl { variable: v, tree: SelectTree::default() };
        let where_clause = vec![
            WherePattern::Triple { subject: Term::Var(v), predicate: iri("ex:name"), object: Term::Var(VariableId(1)) },
            WherePattern::Triple { subject: Term::Var(other), predicate: iri("ex:age"), object: Term::Var(VariableId(2)) },
        ];
        assert!(!is_simple_subject_crawl(&select, &where_clause));
    }

    #[test]
    fn disqualified_by_a_fence_pattern() {
        let v = VariableId(0);
        let select = SelectClause::Crawl { variable: v, tree: SelectTree::default() };
        let where_clause = vec![
            WherePattern::Triple { subject: Term::Var(v), predicate: iri("ex:name"), object: Term::Var(VariableId(1)) },
            WherePattern::Filter(vec![]),
        ];
        assert!(!is_simple_subject_crawl(&select, &where_clause));
    }

    #[test]
    fn disqualified_for_tuple_mode_select() {
        let v = VariableId(0);
        let select = SelectClause::Items(vec![flake_parser::SelectItem::Var(v)]);
        let where_clause = vec![WherePattern::Triple {
            subject: Term::Var(v),
            predicate: iri("ex:name"),
            object: Term::Var(VariableId(1)),
        }];
        assert!(!is_simple_subject_crawl(&select, &where_clause));
    }
}
