//! Parses the top-level FQL query document (spec.md Sec. 4.5, Sec. 6.1) into
//! a [`ParsedQuery`]. No teacher counterpart exists for this surface
//! (`spargebra` parses SPARQL text, not a JSON-like analytical query map);
//! grounded on spec.md's own EBNF-like `where` grammar and validation
//! contracts, applying them directly over `serde_json::Value`.

use crate::ast::{
    BindValue, Context, Dataset, Direction, OpType, OrderKey, PredRef, SelectClause, SelectItem,
    SelectMode, SelectTree, SelectTreeEntry, Term, WherePattern,
};
use crate::error::ParseError;
use crate::sexpr;
use flake_model::{LangString, NamedNode, TypedValue, VariableId, VariableTable};
use serde_json::Value;

/// Parses a complete FQL query document.
pub fn parse(document: &Value) -> Result<crate::ast::ParsedQuery, ParseError> {
    let object = document
        .as_object()
        .ok_or_else(|| ParseError::InvalidDocument("query document must be a JSON object".to_owned()))?;

    let context = Context::from_json(object.get("context").unwrap_or(&Value::Null))?;
    let mut variables = VariableTable::new();

    let normalized_where = normalize_legacy_shape(object)?;
    let where_clause = match normalized_where.as_ref().or_else(|| object.get("where")) {
        Some(value) => parse_where(require_array(value, "where")?, &mut variables, &context)?,
        None => Vec::new(),
    };

    let (op_type, select_mode, select_value) = select_clause_value(object)?;
    let select = parse_select_clause(select_value, &mut variables)?;

    let order_by = match object.get("orderBy") {
        Some(value) => parse_order_by(value, &mut variables)?,
        None => Vec::new(),
    };
    let group_by = match object.get("groupBy") {
        Some(value) => parse_group_by(value, &mut variables, &where_clause)?,
        None => Vec::new(),
    };
    let having = match object.get("having") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| parse_having_entry(v, &mut variables))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => vec![parse_having_entry(other, &mut variables)?],
        None => Vec::new(),
    };

    let limit = match (select_mode, parse_positive_u64_opt(object.get("limit"), "limit")?) {
        (SelectMode::One, _) => Some(1),
        (_, limit) => limit,
    };
    let offset = parse_positive_u64_opt(object.get("offset"), "offset")?.unwrap_or(0);
    let depth = parse_positive_u64_opt(object.get("depth"), "depth")?.unwrap_or(0) as u32;

    let dialect = match object.get("_dialect").and_then(Value::as_str) {
        Some("sparql") => crate::ast::Dialect::Sparql,
        _ => crate::ast::Dialect::Fql,
    };

    let opts = object.get("opts").or_else(|| object.get("options")).cloned().unwrap_or(Value::Null);
    let max_fuel = match &opts {
        Value::Object(map) => parse_positive_u64_opt(map.get("maxFuel").or_else(|| map.get("max-fuel")), "maxFuel")?,
        _ => None,
    };

    let supplied_vars = match object.get("vars") {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| {
                let variable = variables.intern(name.trim_start_matches('?'));
                let typed = TypedValue::infer_from_json(value, None)
                    .map_err(|_| ParseError::InvalidDocument(format!("unsupported value for var {name}")))?;
                Ok((variable, typed))
            })
            .collect::<Result<Vec<_>, ParseError>>()?,
        Some(_) => return Err(ParseError::InvalidDocument("'vars' must be an object".to_owned())),
        None => Vec::new(),
    };

    Ok(crate::ast::ParsedQuery {
        variables,
        op_type,
        select,
        select_mode,
        where_clause,
        order_by,
        group_by,
        having,
        limit,
        offset,
        depth,
        context,
        dialect,
        supplied_vars,
        max_fuel,
        opts,
    })
}

/// Recognizes the legacy `{select, from, where: "..."}` basic-query shape
/// and rewrites `from` into an equivalent `rdf:type` pattern (spec.md Sec.
/// 4.5 "Normalization"). A `where` that is itself a bare string (the legacy
/// predicate-string grammar) is out of scope; only the `from`-only shortcut
/// is transpiled (see DESIGN.md "Open Questions").
fn normalize_legacy_shape(object: &serde_json::Map<String, Value>) -> Result<Option<Value>, ParseError> {
    if let Some(Value::String(_)) = object.get("where") {
        return Err(ParseError::InvalidDocument(
            "legacy string-form 'where' predicates are not supported".to_owned(),
        ));
    }
    match (object.get("from"), object.get("where")) {
        (Some(Value::String(collection)), None) => {
            Ok(Some(Value::Array(vec![Value::Array(vec![
                Value::String("?s".to_owned()),
                Value::String("rdf:type".to_owned()),
                Value::String(collection.clone()),
            ])])))
        }
        _ => Ok(None),
    }
}

fn require_array<'a>(value: &'a Value, key: &'static str) -> Result<&'a [Value], ParseError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ParseError::InvalidDocument(format!("'{key}' must be an array")))
}

fn parse_where(
    patterns: &[Value],
    variables: &mut VariableTable,
    context: &Context,
) -> Result<Vec<WherePattern>, ParseError> {
    patterns.iter().map(|pattern| parse_pattern(pattern, variables, context)).collect()
}

fn parse_pattern(pattern: &Value, variables: &mut VariableTable, context: &Context) -> Result<WherePattern, ParseError> {
    match pattern {
        Value::Array(tuple) => parse_tuple(tuple, variables, context),
        Value::Object(map) => parse_map_pattern(map, variables, context),
        _ => Err(ParseError::InvalidDocument("a where element must be a tuple or a map-pattern".to_owned())),
    }
}

fn parse_tuple(tuple: &[Value], variables: &mut VariableTable, context: &Context) -> Result<WherePattern, ParseError> {
    match tuple.len() {
        2 => {
            let variable = parse_variable(&tuple[0])?;
            let variable = variables.intern(&variable);
            let value = tuple[1]
                .as_str()
                .ok_or_else(|| ParseError::InvalidDocument("bind value must be a string expression".to_owned()))?;
            Ok(WherePattern::Bind { variable, value: sexpr::parse_bind_value(value, variables)? })
        }
        3 => {
            let subject = parse_term(&tuple[0], variables, context)?;
            let predicate = parse_pred_ref(&tuple[1], variables, context)?;
            let object = parse_term(&tuple[2], variables, context)?;
            Ok(WherePattern::Triple { subject, predicate, object })
        }
        4 => {
            let dataset = parse_dataset(&tuple[0], context)?;
            let subject = parse_term(&tuple[1], variables, context)?;
            let predicate = parse_pred_ref(&tuple[2], variables, context)?;
            let object = parse_term(&tuple[3], variables, context)?;
            Ok(WherePattern::NamedTriple { dataset, subject, predicate, object })
        }
        other => Err(ParseError::InvalidWhereTupleArity { found: other }),
    }
}

fn parse_variable(value: &Value) -> Result<String, ParseError> {
    let s = value.as_str().ok_or_else(|| ParseError::NotAVariable(value.to_string()))?;
    s.strip_prefix('?').map(str::to_owned).ok_or_else(|| ParseError::NotAVariable(s.to_owned()))
}

fn looks_like_iri(s: &str) -> bool {
    s.contains("://") || s.starts_with("urn:")
}

fn parse_term(value: &Value, variables: &mut VariableTable, context: &Context) -> Result<Term, ParseError> {
    match value {
        Value::String(s) if s.starts_with('?') => Ok(Term::Var(variables.intern(&s[1..]))),
        Value::String(s) if s == "_id" => Ok(Term::Id),
        Value::String(s) if s == "@id" => Ok(Term::AtId),
        Value::String(s) if s == "rdf:type" => Ok(Term::RdfType),
        Value::String(s) if looks_like_iri(s) || s.contains(':') && context.expand(s).is_ok() => {
            Ok(Term::Iri(context.expand(s)?))
        }
        Value::Object(map) if map.contains_key("@value") => Ok(Term::Literal(parse_literal_object(map, context)?)),
        other => Ok(Term::Literal(
            TypedValue::infer_from_json(other, None)
                .map_err(|_| ParseError::InvalidDocument(format!("unsupported term value: {other}")))?,
        )),
    }
}

/// A JSON-LD-style literal object: `{"@value": ..., "@language": "en"}` or
/// `{"@value": ..., "@type": "xsd:dateTime"}` (spec.md Sec. 4.8: the SPARQL
/// translator must carry "RDF literals with language tag or datatype IRI"
/// through to FQL terms; the plain-scalar `term` grammar on its own has no
/// room for either, so this object shape is the term grammar's literal
/// form for anything beyond bare string/number/boolean inference).
fn parse_literal_object(map: &serde_json::Map<String, Value>, context: &Context) -> Result<TypedValue, ParseError> {
    let value = map.get("@value").expect("caller checked @value is present");
    if let Some(language) = map.get("@language") {
        let language = language
            .as_str()
            .ok_or_else(|| ParseError::InvalidDocument("'@language' must be a string".to_owned()))?;
        let lexical = value
            .as_str()
            .ok_or_else(|| ParseError::InvalidDocument("a '@language'-tagged value must be a string".to_owned()))?;
        return Ok(TypedValue::LangString(LangString { value: lexical.to_owned(), language: language.to_owned() }));
    }
    if let Some(datatype) = map.get("@type") {
        let datatype = datatype
            .as_str()
            .ok_or_else(|| ParseError::InvalidDocument("'@type' must be a string".to_owned()))?;
        let lexical = value
            .as_str()
            .ok_or_else(|| ParseError::InvalidDocument("a '@type'-tagged value must be a string".to_owned()))?;
        let datatype = context.expand(datatype)?;
        return TypedValue::coerce_lexical(lexical, datatype.as_ref())
            .map_err(|_| ParseError::InvalidDocument(format!("value '{lexical}' does not match datatype '{datatype}'")));
    }
    TypedValue::infer_from_json(value, None)
        .map_err(|_| ParseError::InvalidDocument(format!("unsupported '@value': {value}")))
}

fn parse_pred_ref(value: &Value, variables: &mut VariableTable, context: &Context) -> Result<PredRef, ParseError> {
    let s = value
        .as_str()
        .ok_or_else(|| ParseError::InvalidDocument("a predicate must be given as a string".to_owned()))?;
    if let Some(name) = s.strip_prefix('?') {
        return Ok(PredRef::Var(variables.intern(name)));
    }
    if let Some(iri) = s.strip_prefix("fullText:") {
        return Ok(PredRef::FullText(context.expand(iri)?));
    }
    if let Some(plus_pos) = s.find('+') {
        let (base, suffix) = s.split_at(plus_pos);
        let suffix = &suffix[1..];
        let max_hops = if suffix.is_empty() {
            None
        } else {
            Some(suffix.parse::<u32>().map_err(|_| {
                ParseError::InvalidRecursion(format!("'{s}' has a non-integer hop count"))
            })?)
        };
        let predicate = context.expand(base)?;
        return Ok(PredRef::Recursive { predicate, max_hops });
    }
    Ok(PredRef::Iri(context.expand(s)?))
}

fn parse_dataset(value: &Value, context: &Context) -> Result<Dataset, ParseError> {
    let s = value
        .as_str()
        .ok_or_else(|| ParseError::InvalidDocument("a dataset name must be a string".to_owned()))?;
    if let Some(block) = s.strip_prefix("$fdb") {
        return Ok(Dataset::Fdb { block: if block.is_empty() { None } else { Some(block.to_owned()) } });
    }
    if s == "$wd" {
        return Ok(Dataset::Wd);
    }
    Ok(Dataset::Named(context.expand(s)?))
}

fn parse_map_pattern(
    map: &serde_json::Map<String, Value>,
    variables: &mut VariableTable,
    context: &Context,
) -> Result<WherePattern, ParseError> {
    let (key, value) = map
        .iter()
        .next()
        .ok_or_else(|| ParseError::UnrecognizedMapPattern("{}".to_owned()))?;
    match key.as_str() {
        "optional" => Ok(WherePattern::Optional(parse_where(require_array(value, "optional")?, variables, context)?)),
        "union" => {
            let branches = require_array(value, "union")?;
            let parsed = branches
                .iter()
                .map(|branch| parse_where(require_array(branch, "union")?, variables, context))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WherePattern::Union(parsed))
        }
        "bind" => {
            let assignments = value
                .as_object()
                .ok_or_else(|| ParseError::InvalidDocument("'bind' must be a map of variable to expression".to_owned()))?;
            let mut parsed = Vec::with_capacity(assignments.len());
            for (name, expr) in assignments {
                let variable = variables.intern(name.trim_start_matches('?'));
                let expr = expr
                    .as_str()
                    .ok_or_else(|| ParseError::InvalidDocument("bind value must be a string expression".to_owned()))?;
                parsed.push((variable, sexpr::parse_bind_value(expr, variables)?));
            }
            Ok(WherePattern::BindMap(parsed))
        }
        "filter" => {
            let exprs = require_array(value, "filter")?
                .iter()
                .map(|v| {
                    let s = v
                        .as_str()
                        .ok_or_else(|| ParseError::InvalidDocument("a filter entry must be a string".to_owned()))?;
                    sexpr::parse_expr(s, variables)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WherePattern::Filter(exprs))
        }
        "minus" => Ok(WherePattern::Minus(parse_where(require_array(value, "minus")?, variables, context)?)),
        "exists" => Ok(WherePattern::Exists(parse_where(require_array(value, "exists")?, variables, context)?)),
        "not-exists" => {
            Ok(WherePattern::NotExists(parse_where(require_array(value, "not-exists")?, variables, context)?))
        }
        "values" => {
            let map = value
                .as_object()
                .ok_or_else(|| ParseError::InvalidDocument("'values' must be a map of variable to value list".to_owned()))?;
            let (name, rows) = map
                .iter()
                .next()
                .ok_or_else(|| ParseError::InvalidDocument("'values' requires exactly one variable".to_owned()))?;
            let variable = variables.intern(name.trim_start_matches('?'));
            let rows = require_array(rows, "values")?
                .iter()
                .map(|row| match row {
                    Value::Null => Ok(None),
                    Value::String(s) if s == "UNDEF" => Ok(None),
                    Value::Object(map) if map.contains_key("@value") => parse_literal_object(map, context).map(Some),
                    other => TypedValue::infer_from_json(other, None)
                        .map(Some)
                        .map_err(|_| ParseError::InvalidDocument(format!("unsupported values entry: {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WherePattern::Values { variable, rows })
        }
        other => Err(ParseError::UnrecognizedMapPattern(other.to_owned())),
    }
}

fn select_clause_value(
    object: &serde_json::Map<String, Value>,
) -> Result<(OpType, SelectMode, &Value), ParseError> {
    let candidates: [(&str, OpType, SelectMode); 5] = [
        ("select", OpType::Select, SelectMode::Many),
        ("selectOne", OpType::Select, SelectMode::One),
        ("selectDistinct", OpType::Select, SelectMode::Distinct),
        ("selectReduced", OpType::Select, SelectMode::Reduced),
        ("delete", OpType::Delete, SelectMode::Many),
    ];
    let mut found = candidates.iter().filter(|(key, ..)| object.contains_key(*key));
    let first = found.next();
    if found.next().is_some() {
        return Err(ParseError::ConflictingSelectModes);
    }
    match first {
        Some((key, op_type, mode)) => Ok((*op_type, *mode, &object[*key])),
        None => Err(ParseError::MissingSelect),
    }
}

fn parse_select_clause(value: &Value, variables: &mut VariableTable) -> Result<SelectClause, ParseError> {
    match value {
        Value::String(s) if s.starts_with('?') => Ok(SelectClause::Items(vec![SelectItem::Var(variables.intern(&s[1..]))])),
        Value::Array(items) => {
            let parsed = items.iter().map(|item| parse_select_item(item, variables)).collect::<Result<Vec<_>, _>>()?;
            Ok(SelectClause::Items(parsed))
        }
        Value::Object(map) => {
            let (name, tree) = map
                .iter()
                .next()
                .ok_or_else(|| ParseError::InvalidDocument("select-crawl map must have exactly one variable".to_owned()))?;
            let variable = variables.intern(name.trim_start_matches('?'));
            Ok(SelectClause::Crawl { variable, tree: parse_select_tree(tree)? })
        }
        _ => Err(ParseError::InvalidDocument("select must be a variable, a list, or a {var: tree} map".to_owned())),
    }
}

fn parse_select_item(item: &Value, variables: &mut VariableTable) -> Result<SelectItem, ParseError> {
    let s = item
        .as_str()
        .ok_or_else(|| ParseError::InvalidDocument("a select-list entry must be a string".to_owned()))?;
    if let Some(name) = s.strip_prefix('?') {
        return Ok(SelectItem::Var(variables.intern(name)));
    }
    if s.trim_start().starts_with("(as ") {
        let (value, alias) = sexpr::parse_as(s, variables)?;
        return Ok(SelectItem::As { value, alias });
    }
    // A bare aggregate/expression without an explicit alias: synthesize one
    // so the projection step (spec.md Sec. 4.4 step 7) has a column to name.
    let value = sexpr::parse_select_expr(s, variables)?;
    let alias = variables.intern(&format!("_anon_{s}"));
    Ok(SelectItem::As { value, alias })
}

fn parse_select_tree(value: &Value) -> Result<SelectTree, ParseError> {
    let items = require_array(value, "select-crawl tree")?;
    let mut tree = SelectTree::default();
    for item in items {
        match item {
            Value::String(s) if s == "*" => tree.wildcard = true,
            Value::String(s) => {
                let predicate = NamedNode::new(s).map_err(|_| ParseError::InvalidIri(s.clone()))?;
                tree.predicates.push(SelectTreeEntry { predicate, nested: None });
            }
            Value::Object(map) => {
                for (predicate, nested) in map {
                    let predicate = NamedNode::new(predicate).map_err(|_| ParseError::InvalidIri(predicate.clone()))?;
                    tree.predicates.push(SelectTreeEntry { predicate, nested: Some(parse_select_tree(nested)?) });
                }
            }
            _ => return Err(ParseError::InvalidDocument("invalid select-crawl tree entry".to_owned())),
        }
    }
    Ok(tree)
}

fn parse_order_by(value: &Value, variables: &mut VariableTable) -> Result<Vec<OrderKey>, ParseError> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries.into_iter().map(|entry| parse_order_key(entry, variables)).collect()
}

fn parse_order_key(value: &Value, variables: &mut VariableTable) -> Result<OrderKey, ParseError> {
    match value {
        Value::String(s) if s.starts_with('?') => {
            Ok(OrderKey { variable: variables.intern(&s[1..]), direction: Direction::Asc })
        }
        Value::String(s) => {
            // `(desc ?v)`/`(asc ?v)` arrive as a parenthesized string.
            let trimmed = s.trim();
            let (direction, rest) = if let Some(rest) = trimmed.strip_prefix("(desc ") {
                (Direction::Desc, rest)
            } else if let Some(rest) = trimmed.strip_prefix("(asc ") {
                (Direction::Asc, rest)
            } else {
                return Err(ParseError::InvalidOrderBy(s.clone()));
            };
            let variable_name = rest.trim_end_matches(')').trim();
            let name = variable_name
                .strip_prefix('?')
                .ok_or_else(|| ParseError::InvalidOrderBy(s.clone()))?;
            Ok(OrderKey { variable: variables.intern(name), direction })
        }
        _ => Err(ParseError::InvalidOrderBy(value.to_string())),
    }
}

fn parse_group_by(
    value: &Value,
    variables: &mut VariableTable,
    where_clause: &[WherePattern],
) -> Result<Vec<VariableId>, ParseError> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries
        .into_iter()
        .map(|entry| {
            let name = parse_variable(entry)?;
            let variable = variables.intern(&name);
            if !pattern_list_binds(where_clause, variable) {
                return Err(ParseError::UnboundGroupByVariable(format!("?{name}")));
            }
            Ok(variable)
        })
        .collect()
}

/// Whether `variable` is guaranteed (or even possibly) bound somewhere in
/// `patterns`. A coarse, conservative check used only to validate `groupBy`
/// (spec.md Sec. 4.5: "each must appear in `where`"); the precise
/// variable-bindings analysis used by the optimizer lives in `flake-planner`.
fn pattern_list_binds(patterns: &[WherePattern], variable: VariableId) -> bool {
    patterns.iter().any(|p| pattern_binds(p, variable))
}

fn pattern_binds(pattern: &WherePattern, variable: VariableId) -> bool {
    match pattern {
        WherePattern::Triple { subject, object, .. } => term_is(subject, variable) || term_is(object, variable),
        WherePattern::NamedTriple { subject, object, .. } => term_is(subject, variable) || term_is(object, variable),
        WherePattern::Bind { variable: v, .. } => *v == variable,
        WherePattern::BindMap(entries) => entries.iter().any(|(v, _)| *v == variable),
        WherePattern::Optional(inner)
        | WherePattern::Minus(inner)
        | WherePattern::Exists(inner)
        | WherePattern::NotExists(inner) => pattern_list_binds(inner, variable),
        WherePattern::Union(branches) => branches.iter().any(|b| pattern_list_binds(b, variable)),
        WherePattern::Values { variable: v, .. } => *v == variable,
        WherePattern::Filter(_) => false,
    }
}

fn term_is(term: &Term, variable: VariableId) -> bool {
    matches!(term, Term::Var(v) if *v == variable)
}

fn parse_having_entry(value: &Value, variables: &mut VariableTable) -> Result<crate::ast::Expr, ParseError> {
    let s = value
        .as_str()
        .ok_or_else(|| ParseError::InvalidDocument("a having entry must be a string expression".to_owned()))?;
    sexpr::parse_expr(s, variables)
}

fn parse_positive_u64_opt(value: Option<&Value>, key: &'static str) -> Result<Option<u64>, ParseError> {
    match value {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ParseError::InvalidNumericOption { key, value: n.to_string() }),
        Some(other) => Err(ParseError::InvalidNumericOption { key, value: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_s2_optional_with_filter() {
        let doc = serde_json::json!({
            "select": ["?u", "?e"],
            "where": [
                ["?u", "rdf:type", "Person"],
                {"optional": [["?u", "http://ex.org/email", "?e"]]},
                {"filter": ["(strStarts ?e \"a\")"]}
            ]
        });
        let parsed = parse(&doc).unwrap();
        assert_eq!(parsed.where_clause.len(), 3);
        assert!(matches!(parsed.where_clause[0], WherePattern::Triple { .. }));
        assert!(matches!(parsed.where_clause[1], WherePattern::Optional(_)));
        assert!(matches!(parsed.where_clause[2], WherePattern::Filter(_)));
    }

    #[test]
    fn parses_scenario_s4_group_and_aggregate() {
        let doc = serde_json::json!({
            "select": ["?c", "(count ?u)"],
            "where": [["?u", "http://ex.org/country", "?c"]],
            "groupBy": ["?c"]
        });
        let parsed = parse(&doc).unwrap();
        assert_eq!(parsed.group_by.len(), 1);
        match &parsed.select {
            SelectClause::Items(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[1], SelectItem::As { value: BindValue::Aggregate(_), .. }));
            }
            _ => panic!("expected an items select clause"),
        }
    }

    #[test]
    fn parses_scenario_s5_recursive_predicate() {
        let doc = serde_json::json!({"select": ["?x", "?y"], "where": [["?x", "http://ex.org/follows+3", "?y"]]});
        let parsed = parse(&doc).unwrap();
        match &parsed.where_clause[0] {
            WherePattern::Triple { predicate: PredRef::Recursive { max_hops, .. }, .. } => {
                assert_eq!(*max_hops, Some(3));
            }
            other => panic!("expected a recursive predicate pattern, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_language_tagged_literal_object() {
        let doc = serde_json::json!({
            "select": ["?s"],
            "where": [["?s", "http://ex.org/name", {"@value": "Alice", "@language": "en"}]]
        });
        let parsed = parse(&doc).unwrap();
        match &parsed.where_clause[0] {
            WherePattern::Triple { object: Term::Literal(TypedValue::LangString(ls)), .. } => {
                assert_eq!(ls.value, "Alice");
                assert_eq!(ls.language, "en");
            }
            other => panic!("expected a lang-tagged literal, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_datatyped_literal_object() {
        let doc = serde_json::json!({
            "select": ["?s"],
            "where": [["?s", "http://ex.org/age", {"@value": "42", "@type": "http://www.w3.org/2001/XMLSchema#integer"}]]
        });
        let parsed = parse(&doc).unwrap();
        match &parsed.where_clause[0] {
            WherePattern::Triple { object: Term::Literal(TypedValue::Integer(i)), .. } => {
                assert_eq!(i64::from(*i), 42);
            }
            other => panic!("expected a typed integer literal, got {other:?}"),
        }
    }

    #[test]
    fn select_one_forces_limit_one() {
        let doc = serde_json::json!({"selectOne": "?s", "where": [["?s", "rdf:type", "Person"]]});
        let parsed = parse(&doc).unwrap();
        assert_eq!(parsed.limit, Some(1));
    }

    #[test]
    fn conflicting_select_modes_are_rejected() {
        let doc = serde_json::json!({"select": ["?s"], "selectOne": "?s", "where": []});
        assert!(matches!(parse(&doc), Err(ParseError::ConflictingSelectModes)));
    }

    #[test]
    fn unknown_map_pattern_key_is_a_parse_error() {
        let doc = serde_json::json!({"select": ["?s"], "where": [{"nonsense": []}]});
        assert!(matches!(parse(&doc), Err(ParseError::UnrecognizedMapPattern(_))));
    }

    #[test]
    fn invalid_where_tuple_arity_is_rejected() {
        let doc = serde_json::json!({"select": ["?s"], "where": [["?s"]]});
        assert!(matches!(parse(&doc), Err(ParseError::InvalidWhereTupleArity { found: 1 })));
    }

    #[test]
    fn group_by_variable_not_in_where_is_rejected() {
        let doc = serde_json::json!({
            "select": ["?c"],
            "where": [["?u", "http://ex.org/country", "?c"]],
            "groupBy": ["?nope"]
        });
        assert!(matches!(parse(&doc), Err(ParseError::UnboundGroupByVariable(_))));
    }

    #[test]
    fn select_crawl_with_wildcard_tree() {
        let doc = serde_json::json!({"select": {"?u": ["*"]}, "where": [["?u", "rdf:type", "Person"]]});
        let parsed = parse(&doc).unwrap();
        match parsed.select {
            SelectClause::Crawl { tree, .. } => assert!(tree.wildcard),
            _ => panic!("expected a select-crawl clause"),
        }
    }
}
