//! `Expression`/`Function`/`AggregateExpression` translation into the s-expr
//! string grammar `flake_parser::sexpr` parses (spec.md Sec. 6.1
//! "Functions": `"(fn-name arg1 arg2 …)"`, `#`-prefixed for aggregates).
//!
//! The grammar has no literal-with-datatype/language term shape of its own
//! (only `flake_parser::document::parse_term`'s `{"@value": ...}` object does,
//! and only in triple-pattern term position) so a datatyped or
//! language-tagged constant in expression position is wrapped with the
//! matching builtin (`xsd:*` cast, `strlang`, `strdt`) rather than emitted
//! bare.

use crate::error::{Result, Unsupported};
use crate::term::{is_rdf_type, BlankNodeAllocator};
use spargebra::algebra::{AggregateExpression, AggregateFunction, Expression, Function};
use spargebra::term::{Literal, NamedNode};

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(s: &str) -> String {
    format!("\"{}\"", escape(s))
}

/// Encodes a literal constant as a standalone s-expr atom/call (spec.md
/// Sec. 6.1; see module docs for the wrapping scheme).
fn literal_to_sexpr(literal: &Literal) -> String {
    if let Some(language) = literal.language() {
        return format!("(strlang {} {})", quote(literal.value()), quote(language));
    }
    match literal.datatype().as_str() {
        "http://www.w3.org/2001/XMLSchema#string" => quote(literal.value()),
        "http://www.w3.org/2001/XMLSchema#boolean" => match literal.value() {
            "true" | "1" => "true".to_owned(),
            _ => "false".to_owned(),
        },
        "http://www.w3.org/2001/XMLSchema#integer" => literal.value().to_owned(),
        dt @ ("http://www.w3.org/2001/XMLSchema#decimal"
        | "http://www.w3.org/2001/XMLSchema#double"
        | "http://www.w3.org/2001/XMLSchema#float"
        | "http://www.w3.org/2001/XMLSchema#dateTime") => {
            format!("(xsd:{} {})", dt.rsplit('#').next().unwrap_or("string"), quote(literal.value()))
        }
        dt => format!("(strdt {} {})", quote(literal.value()), quote(dt)),
    }
}

fn named_node_to_sexpr(node: &NamedNode) -> String {
    format!("(iri {})", quote(node.as_str()))
}

/// The `flake_functions::BuiltinName`-recognized token for a spargebra
/// `Function`. Matches `flake_parser::sexpr::resolve_builtin`'s table
/// one-to-one; anything that table doesn't resolve raises
/// `Unsupported::UnknownFunction`.
fn function_token(function: &Function) -> Result<&'static str> {
    use oxrdf::vocab::xsd;
    Ok(match function {
        Function::Str => "str",
        Function::Lang => "lang",
        Function::LangMatches => "langMatches",
        Function::Datatype => "datatype",
        Function::Iri => "iri",
        Function::BNode => "bnode",
        Function::Uuid => "uuid",
        Function::StrUuid => "struuid",
        Function::StrLen => "strlen",
        Function::SubStr => "substr",
        Function::UCase => "ucase",
        Function::LCase => "lcase",
        Function::StrStarts => "strStarts",
        Function::StrEnds => "strEnds",
        Function::Contains => "contains",
        Function::StrBefore => "strBefore",
        Function::StrAfter => "strAfter",
        Function::EncodeForUri => "encodeForUri",
        Function::Concat => "concat",
        Function::StrDt => "strdt",
        Function::StrLang => "strlang",
        Function::IsIri => "isIri",
        Function::IsBlank => "isBlank",
        Function::IsLiteral => "isLiteral",
        Function::IsNumeric => "isNumeric",
        Function::Regex => "regex",
        Function::Replace => "replace",
        Function::Abs => "abs",
        Function::Round => "round",
        Function::Ceil => "ceil",
        Function::Floor => "floor",
        Function::Rand => "rand",
        Function::Year => "year",
        Function::Month => "month",
        Function::Day => "day",
        Function::Hours => "hours",
        Function::Minutes => "minutes",
        Function::Seconds => "seconds",
        Function::Timezone => "timezone",
        Function::Tz => "tz",
        Function::Now => "now",
        Function::Md5 => "md5",
        Function::Sha1 => "sha1",
        Function::Sha256 => "sha256",
        Function::Sha384 => "sha384",
        Function::Sha512 => "sha512",
        Function::Custom(iri) if iri.as_ref() == xsd::STRING => "xsd:string",
        Function::Custom(iri) if iri.as_ref() == xsd::BOOLEAN => "xsd:boolean",
        Function::Custom(iri) if iri.as_ref() == xsd::INTEGER || iri.as_ref() == xsd::INT => "xsd:integer",
        Function::Custom(iri) if iri.as_ref() == xsd::DOUBLE => "xsd:double",
        Function::Custom(iri) if iri.as_ref() == xsd::FLOAT => "xsd:float",
        Function::Custom(iri) if iri.as_ref() == xsd::DECIMAL => "xsd:decimal",
        Function::Custom(iri) if iri.as_ref() == xsd::DATE_TIME => "xsd:dateTime",
        Function::Custom(iri) => return Err(Unsupported::UnknownFunction(iri.as_str().to_owned()).into()),
        // IsNumeric and friends are listed above; this default only catches
        // any future `Function` variant spargebra adds that this table
        // doesn't yet know about.
        #[allow(unreachable_patterns)]
        other => return Err(Unsupported::UnknownFunction(format!("{other:?}")).into()),
    })
}

/// Translates a boolean/scalar `Expression` into a single s-expr string.
/// `bnodes` is threaded through only so the recursive calls share one
/// signature with `graph_pattern`'s translation functions; expressions
/// themselves never introduce blank nodes.
pub fn expression_to_sexpr(expr: &Expression, bnodes: &mut BlankNodeAllocator) -> Result<String> {
    use Expression::*;
    Ok(match expr {
        NamedNode(n) => named_node_to_sexpr(n),
        Literal(l) => literal_to_sexpr(l),
        Variable(v) => format!("?{}", v.as_str()),
        Or(l, r) => format!("(or {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        And(l, r) => format!("(and {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Equal(l, r) => format!("(= {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        SameTerm(l, r) => format!("(sameTerm {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Greater(l, r) => format!("(> {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        GreaterOrEqual(l, r) => format!("(>= {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Less(l, r) => format!("(< {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        LessOrEqual(l, r) => format!("(<= {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Add(l, r) => format!("(+ {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Subtract(l, r) => format!("(- {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Multiply(l, r) => format!("(* {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        Divide(l, r) => format!("(/ {} {})", expression_to_sexpr(l, bnodes)?, expression_to_sexpr(r, bnodes)?),
        UnaryPlus(inner) => format!("(+ {})", expression_to_sexpr(inner, bnodes)?),
        UnaryMinus(inner) => format!("(- {})", expression_to_sexpr(inner, bnodes)?),
        Not(inner) => format!("(not {})", expression_to_sexpr(inner, bnodes)?),
        Bound(inner) => format!("(bound {})", expression_to_sexpr(inner, bnodes)?),
        If(test, if_true, if_false) => {
            format!("(if {} {} {})", expression_to_sexpr(test, bnodes)?, expression_to_sexpr(if_true, bnodes)?, expression_to_sexpr(if_false, bnodes)?)
        }
        Coalesce(args) => {
            let args = args.iter().map(|a| expression_to_sexpr(a, bnodes)).collect::<Result<Vec<_>>>()?;
            format!("(coalesce {})", args.join(" "))
        }
        In(needle, haystack) => {
            let needle = expression_to_sexpr(needle, bnodes)?;
            let haystack = haystack.iter().map(|a| expression_to_sexpr(a, bnodes)).collect::<Result<Vec<_>>>()?;
            format!("(in {} {})", needle, haystack.join(" "))
        }
        FunctionCall(function, args) => {
            let token = function_token(function)?;
            let args = args.iter().map(|a| expression_to_sexpr(a, bnodes)).collect::<Result<Vec<_>>>()?;
            if args.is_empty() {
                format!("({token})")
            } else {
                format!("({token} {})", args.join(" "))
            }
        }
        Exists(_) => return Err(Unsupported::NestedExists.into()),
        #[allow(unreachable_patterns)]
        _ => return Err(Unsupported::UnknownFunction("unrecognized expression form".to_owned()).into()),
    })
}

fn aggregate_token(function: &AggregateFunction) -> Result<&'static str> {
    Ok(match function {
        AggregateFunction::Count => "count",
        AggregateFunction::Sum => "sum",
        AggregateFunction::Avg => "avg",
        AggregateFunction::Min => "min",
        AggregateFunction::Max => "max",
        AggregateFunction::Sample => "sample",
        AggregateFunction::GroupConcat { .. } => "groupconcat",
        AggregateFunction::Custom(_) => return Err(Unsupported::DefaultGraphAggregate.into()),
    })
}

/// Translates an `AggregateExpression` into its `#(...)` form (spec.md
/// Sec. 6.1 aggregates, Sec. 4.5 "Aggregate binding contract").
pub fn aggregate_to_sexpr(agg: &AggregateExpression, bnodes: &mut BlankNodeAllocator) -> Result<String> {
    match agg {
        AggregateExpression::CountSolutions { distinct } => {
            Ok(if *distinct { "#(count-distinct)".to_owned() } else { "#(count)".to_owned() })
        }
        AggregateExpression::FunctionCall { name, expr, distinct } => {
            let token = aggregate_token(name)?;
            let arg = expression_to_sexpr(expr, bnodes)?;
            let arg = if *distinct { format!("(distinct {arg})") } else { arg };
            if let AggregateFunction::GroupConcat { separator: Some(sep) } = name {
                Ok(format!("#({token} {arg} {})", quote(sep)))
            } else {
                Ok(format!("#({token} {arg})"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::term::Variable;

    fn var(name: &str) -> Expression {
        Expression::Variable(Variable::new(name).unwrap())
    }

    #[test]
    fn string_starts_uses_the_grammars_camel_case_token() {
        let mut bnodes = BlankNodeAllocator::default();
        let expr = Expression::FunctionCall(
            Function::StrStarts,
            vec![var("e"), Expression::Literal(Literal::new_simple_literal("a"))],
        );
        assert_eq!(expression_to_sexpr(&expr, &mut bnodes).unwrap(), r#"(strStarts ?e "a")"#);
    }

    #[test]
    fn nested_exists_is_rejected() {
        let mut bnodes = BlankNodeAllocator::default();
        let inner = spargebra::algebra::GraphPattern::Bgp { patterns: vec![] };
        let expr = Expression::And(Box::new(var("x")), Box::new(Expression::Exists(Box::new(inner))));
        assert!(expression_to_sexpr(&expr, &mut bnodes).is_err());
    }

    #[test]
    fn xsd_integer_cast_wraps_the_constant() {
        let mut bnodes = BlankNodeAllocator::default();
        let iri = NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap();
        let expr = Expression::FunctionCall(Function::Custom(iri), vec![var("x")]);
        assert_eq!(expression_to_sexpr(&expr, &mut bnodes).unwrap(), "(xsd:integer ?x)");
    }

    #[test]
    fn unrecognized_custom_function_is_unsupported() {
        let mut bnodes = BlankNodeAllocator::default();
        let iri = NamedNode::new("http://ex/totallyMadeUp").unwrap();
        let expr = Expression::FunctionCall(Function::Custom(iri), vec![]);
        assert!(expression_to_sexpr(&expr, &mut bnodes).is_err());
    }

    #[test]
    fn count_solutions_distinct_is_a_marked_aggregate() {
        let mut bnodes = BlankNodeAllocator::default();
        let agg = AggregateExpression::CountSolutions { distinct: true };
        assert_eq!(aggregate_to_sexpr(&agg, &mut bnodes).unwrap(), "#(count-distinct)");
    }

    #[test]
    fn group_concat_with_a_separator_appends_a_quoted_third_argument() {
        let mut bnodes = BlankNodeAllocator::default();
        let agg = AggregateExpression::FunctionCall {
            name: AggregateFunction::GroupConcat { separator: Some(", ".to_owned()) },
            expr: Box::new(var("x")),
            distinct: false,
        };
        assert_eq!(aggregate_to_sexpr(&agg, &mut bnodes).unwrap(), r#"#(groupconcat ?x ", ")"#);
    }
}
