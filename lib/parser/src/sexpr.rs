//! Parses the s-expression strings used by `filter`/`bind`/`having`
//! (spec.md Sec. 6.1 "Functions": `"(fn-name arg1 arg2 … )"`, aggregates
//! prefixed by `#`, `as` wrapping). There is no teacher counterpart for this
//! surface grammar (spec.md Sec. 9 notes the source's filter/bind expressions
//! arrive pre-parsed); the tokenizer/recursive-descent shape follows the same
//! hand-rolled-parser idiom as `other_examples/`' ad-hoc SPARQL parsers, kept
//! deliberately small since the grammar itself is tiny (parenthesized
//! prefix calls, no operator precedence to resolve).

use crate::ast::{AggregateCall, BindValue, Expr};
use crate::error::ParseError;
use flake_functions::{AggregateName, BuiltinName};
use flake_model::{TypedValue, VariableId, VariableTable};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    LParen,
    RParen,
    Symbol(String),
    Str(String),
    Number(f64),
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((_, c)) = chars.peek().copied() {
        match c {
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => value.push(escaped),
                            None => {
                                return Err(ParseError::MalformedExpression(
                                    input.to_owned(),
                                    "unterminated escape in string literal".to_owned(),
                                ))
                            }
                        },
                        Some((_, other)) => value.push(other),
                        None => {
                            return Err(ParseError::MalformedExpression(
                                input.to_owned(),
                                "unterminated string literal".to_owned(),
                            ))
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            _ => {
                let mut symbol = String::new();
                while let Some((_, c)) = chars.peek().copied() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    symbol.push(c);
                    chars.next();
                }
                if let Ok(number) = symbol.parse::<f64>() {
                    tokens.push(Token::Number(number));
                } else {
                    tokens.push(Token::Symbol(symbol));
                }
            }
        }
    }
    Ok(tokens)
}

/// One parsed element of an s-expression argument list: either a plain
/// expression, or `(distinct <expr>)`, recognized only in aggregate-argument
/// position (spec.md Sec. 4.5 "a variable symbol optionally wrapped in
/// `distinct`").
enum Arg {
    Expr(Expr),
    Distinct(Expr),
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    variables: &'a mut VariableTable,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expect_lparen(&mut self) -> Result<(), ParseError> {
        match self.bump() {
            Some(Token::LParen) => Ok(()),
            _ => Err(ParseError::MalformedExpression(
                self.source.to_owned(),
                "expected '('".to_owned(),
            )),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.bump() {
            Some(Token::RParen) => Ok(()),
            _ => Err(ParseError::MalformedExpression(
                self.source.to_owned(),
                "expected ')'".to_owned(),
            )),
        }
    }

    /// Parses one term: a variable, a literal, or a nested call.
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::LParen) => self.parse_call(),
            Some(Token::Str(_)) => {
                let Some(Token::Str(s)) = self.bump().cloned() else { unreachable!() };
                Ok(Expr::Const(TypedValue::string(s)))
            }
            Some(Token::Number(_)) => {
                let Some(Token::Number(n)) = self.bump().cloned() else { unreachable!() };
                Ok(Expr::Const(if n.fract() == 0.0 {
                    TypedValue::integer(n as i64)
                } else {
                    TypedValue::double(n)
                }))
            }
            Some(Token::Symbol(_)) => {
                let Some(Token::Symbol(s)) = self.bump().cloned() else { unreachable!() };
                self.symbol_to_expr(&s)
            }
            _ => Err(ParseError::MalformedExpression(
                self.source.to_owned(),
                "expected a term".to_owned(),
            )),
        }
    }

    fn symbol_to_expr(&mut self, symbol: &str) -> Result<Expr, ParseError> {
        if let Some(name) = symbol.strip_prefix('?') {
            return Ok(Expr::Var(self.variables.intern(name)));
        }
        match symbol {
            "true" => Ok(Expr::Const(TypedValue::boolean(true))),
            "false" => Ok(Expr::Const(TypedValue::boolean(false))),
            _ => Err(ParseError::NotAVariable(symbol.to_owned())),
        }
    }

    /// Parses `(fn-name arg1 arg2 ...)`, resolving `fn-name` (and overloaded
    /// operators like `+`/`-`, whose arity decides unary vs. binary) against
    /// [`resolve_builtin`].
    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        self.expect_lparen()?;
        let name = match self.bump() {
            Some(Token::Symbol(s)) => s.clone(),
            _ => {
                return Err(ParseError::MalformedExpression(
                    self.source.to_owned(),
                    "expected a function name".to_owned(),
                ))
            }
        };
        let mut args = Vec::new();
        while self.peek() != Some(&Token::RParen) {
            if self.peek().is_none() {
                return Err(ParseError::MalformedExpression(
                    self.source.to_owned(),
                    "unbalanced parentheses".to_owned(),
                ));
            }
            args.push(self.parse_term()?);
        }
        self.expect_rparen()?;
        let builtin = resolve_builtin(&name, args.len())
            .ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
        Ok(Expr::Call { name: builtin, args })
    }

    /// Parses an aggregate argument list element, recognizing the
    /// `(distinct <expr>)` wrapper.
    fn parse_arg(&mut self) -> Result<Arg, ParseError> {
        if self.peek() == Some(&Token::LParen)
            && matches!(self.tokens.get(self.pos + 1), Some(Token::Symbol(s)) if s == "distinct")
        {
            self.expect_lparen()?;
            self.bump(); // `distinct`
            let inner = self.parse_term()?;
            self.expect_rparen()?;
            return Ok(Arg::Distinct(inner));
        }
        Ok(Arg::Expr(self.parse_term()?))
    }

    /// Parses `(name arg...)` as an aggregate call, assuming the leading `#`
    /// has already been consumed (as either a standalone token, since the
    /// tokenizer breaks a symbol at `(`, or by stripping it from the source
    /// string before tokenizing).
    fn parse_aggregate_body(&mut self) -> Result<AggregateCall, ParseError> {
        self.expect_lparen()?;
        let name_token = match self.bump() {
            Some(Token::Symbol(s)) => s.clone(),
            _ => {
                return Err(ParseError::MalformedExpression(
                    self.source.to_owned(),
                    "expected an aggregate name".to_owned(),
                ))
            }
        };
        let name = resolve_aggregate(&name_token)
            .ok_or_else(|| ParseError::UnknownAggregate(name_token.clone()))?;

        let mut arg = None;
        let mut distinct = false;
        let mut separator = None;
        while self.peek() != Some(&Token::RParen) {
            if self.peek().is_none() {
                return Err(ParseError::MalformedExpression(
                    self.source.to_owned(),
                    "unbalanced parentheses".to_owned(),
                ));
            }
            match self.parse_arg()? {
                Arg::Expr(expr) => {
                    if arg.is_none() {
                        arg = Some(Box::new(expr));
                    } else if let Expr::Const(TypedValue::String(s)) = expr {
                        separator = Some(s);
                    } else {
                        return Err(ParseError::WrongArity { name: name_token.clone(), found: 2 });
                    }
                }
                Arg::Distinct(expr) => {
                    distinct = true;
                    arg = Some(Box::new(expr));
                }
            }
        }
        self.expect_rparen()?;
        if name == AggregateName::Sample && arg.is_none() {
            return Err(ParseError::WrongArity { name: name_token, found: 0 });
        }
        Ok(AggregateCall { name, distinct, arg, separator })
    }

    /// Parses `(name ...)`, dispatching to a scalar call or a bare (unmarked)
    /// aggregate call depending on whether `name` resolves against
    /// [`resolve_aggregate`] — the two vocabularies never overlap.
    fn parse_call_or_aggregate(&mut self) -> Result<BindValue, ParseError> {
        let is_aggregate = matches!(self.peek(), Some(Token::LParen))
            && matches!(self.tokens.get(self.pos + 1), Some(Token::Symbol(s)) if resolve_aggregate(s).is_some());
        if is_aggregate {
            Ok(BindValue::Aggregate(self.parse_aggregate_body()?))
        } else {
            Ok(BindValue::Expr(self.parse_term()?))
        }
    }
}

/// Resolves an s-expression function token to a [`BuiltinName`], accounting
/// for the handful of operators that are overloaded by arity (`+`/`-` are
/// unary when given one argument, binary when given two).
fn resolve_builtin(token: &str, arity: usize) -> Option<BuiltinName> {
    use BuiltinName as N;
    Some(match (token, arity) {
        ("str", 1) => N::Str,
        ("lang", 1) => N::Lang,
        ("datatype", 1) => N::Datatype,
        ("iri", 1) | ("uri", 1) => N::Iri,
        ("bnode", 0) | ("bnode", 1) => N::BNode,
        ("strdt", 2) => N::StrDt,
        ("strlang", 2) => N::StrLang,
        ("isIri", 1) | ("isIRI", 1) | ("isUri", 1) => N::IsIri,
        ("isLiteral", 1) => N::IsLiteral,
        ("isNumeric", 1) => N::IsNumeric,
        ("isBlank", 1) => N::IsBlank,
        ("sameTerm", 2) => N::SameTerm,
        ("uuid", 0) => N::Uuid,
        ("struuid", 0) => N::StrUuid,

        ("strlen", 1) => N::StrLen,
        ("ucase", 1) => N::UCase,
        ("lcase", 1) => N::LCase,
        ("contains", 2) => N::Contains,
        ("strStarts", 2) => N::StrStarts,
        ("strEnds", 2) => N::StrEnds,
        ("strBefore", 2) => N::StrBefore,
        ("strAfter", 2) => N::StrAfter,
        ("substr", 2 | 3) => N::SubStr,
        ("regex", 2 | 3) => N::Regex,
        ("replace", 3) => N::Replace,
        ("encodeForUri", 1) => N::EncodeForUri,
        ("concat", _) => N::Concat,
        ("langMatches", 2) => N::LangMatches,

        ("+", 2) => N::Add,
        ("-", 2) => N::Sub,
        ("*", 2) => N::Mul,
        ("/", 2) => N::Div,
        ("+", 1) => N::UnaryPlus,
        ("-", 1) => N::UnaryMinus,
        ("abs", 1) => N::Abs,
        ("ceil", 1) => N::Ceil,
        ("floor", 1) => N::Floor,
        ("round", 1) => N::Round,
        ("rand", 0) => N::Rand,

        ("=", 2) => N::Equal,
        ("!=", 2) => N::NotEqual,
        ("<", 2) => N::LessThan,
        ("<=", 2) => N::LessOrEqual,
        (">", 2) => N::GreaterThan,
        (">=", 2) => N::GreaterOrEqual,
        ("and", 2) => N::And,
        ("or", 2) => N::Or,
        ("not", 1) => N::Not,
        ("in", _) => N::In,
        ("not-in", _) => N::NotIn,

        ("bound", 1) => N::Bound,
        ("coalesce", _) => N::Coalesce,
        ("if", 3) => N::If,

        ("md5", 1) => N::Md5,
        ("sha1", 1) => N::Sha1,
        ("sha256", 1) => N::Sha256,
        ("sha384", 1) => N::Sha384,
        ("sha512", 1) => N::Sha512,

        ("year", 1) => N::Year,
        ("month", 1) => N::Month,
        ("day", 1) => N::Day,
        ("hours", 1) => N::Hours,
        ("minutes", 1) => N::Minutes,
        ("seconds", 1) => N::Seconds,
        ("timezone", 1) => N::Timezone,
        ("tz", 1) => N::Tz,
        ("now", 0) => N::Now,

        ("xsd:string", 1) => N::CastString,
        ("xsd:boolean", 1) => N::CastBoolean,
        ("xsd:integer", 1) => N::CastInteger,
        ("xsd:decimal", 1) => N::CastDecimal,
        ("xsd:double", 1) => N::CastDouble,
        ("xsd:float", 1) => N::CastFloat,
        ("xsd:dateTime", 1) => N::CastDateTime,

        _ => return None,
    })
}

fn resolve_aggregate(token: &str) -> Option<AggregateName> {
    Some(match token {
        "count" => AggregateName::Count,
        "sum" => AggregateName::Sum,
        "avg" => AggregateName::Avg,
        "min" => AggregateName::Min,
        "max" => AggregateName::Max,
        "sample" => AggregateName::Sample,
        "groupconcat" => AggregateName::GroupConcat,
        "median" => AggregateName::Median,
        "variance" => AggregateName::Variance,
        "stddev" => AggregateName::StdDev,
        "count-distinct" => AggregateName::CountDistinct,
        _ => return None,
    })
}

/// Parses a plain filter/bind expression string: `"(fn-name arg1 arg2 …)"`.
pub fn parse_expr(source: &str, variables: &mut VariableTable) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, variables, source };
    let expr = parser.parse_term()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::MalformedExpression(
            source.to_owned(),
            "trailing input after expression".to_owned(),
        ));
    }
    Ok(expr)
}

/// Parses an aggregate form: `"#(name arg?)"`. `distinct` wraps the
/// *argument*, not the aggregate name: `"#(sum (distinct ?x))"`.
pub fn parse_aggregate(source: &str, variables: &mut VariableTable) -> Result<AggregateCall, ParseError> {
    let body = source.strip_prefix('#').ok_or_else(|| {
        ParseError::MalformedExpression(source.to_owned(), "aggregate form must start with '#'".to_owned())
    })?;
    let tokens = tokenize(body)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, variables, source };
    let call = parser.parse_aggregate_body()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::MalformedExpression(source.to_owned(), "trailing input after aggregate".to_owned()));
    }
    Ok(call)
}

/// Parses a `bind` right-hand side, dispatching on the `#`-prefix convention
/// (spec.md Sec. 4.5 "Aggregate binding contract").
pub fn parse_bind_value(source: &str, variables: &mut VariableTable) -> Result<BindValue, ParseError> {
    if source.starts_with('#') {
        Ok(BindValue::Aggregate(parse_aggregate(source, variables)?))
    } else {
        Ok(BindValue::Expr(parse_expr(source, variables)?))
    }
}

/// Parses a select-list or `having` entry that is itself an s-expression:
/// either a scalar expression or a bare (unmarked, no `#`) aggregate call —
/// select-list aggregates drop the `bind`-only `#` marker (spec.md Sec. 8
/// scenario S4: `"select": ["?c", "(count ?u)"]`).
pub fn parse_select_expr(source: &str, variables: &mut VariableTable) -> Result<BindValue, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, variables, source };
    let value = parser.parse_call_or_aggregate()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::MalformedExpression(
            source.to_owned(),
            "trailing input after expression".to_owned(),
        ));
    }
    Ok(value)
}

/// Parses an `(as <expr|aggregate> ?alias)` wrapper used in select-list
/// position (spec.md Sec. 6.1 "Functions": "`as` may wrap an expression",
/// example `(as (sum ?x) ?total)` — the wrapped aggregate is unmarked, same
/// as a bare select-list aggregate).
pub fn parse_as(source: &str, variables: &mut VariableTable) -> Result<(BindValue, VariableId), ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, variables, source };
    parser.expect_lparen()?;
    match parser.bump().cloned() {
        Some(Token::Symbol(s)) if s == "as" => {}
        _ => {
            return Err(ParseError::MalformedExpression(
                source.to_owned(),
                "expected 'as'".to_owned(),
            ))
        }
    }
    let value = parser.parse_call_or_aggregate()?;
    let alias_name = match parser.bump().cloned() {
        Some(Token::Symbol(s)) if s.starts_with('?') => s,
        _ => {
            return Err(ParseError::MalformedExpression(
                source.to_owned(),
                "expected an alias variable".to_owned(),
            ))
        }
    };
    let alias = parser.variables.intern(&alias_name[1..]);
    parser.expect_rparen()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::MalformedExpression(source.to_owned(), "trailing input after 'as'".to_owned()));
    }
    Ok((value, alias))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_unary_string_predicate() {
        let mut variables = VariableTable::new();
        let expr = parse_expr(r#"(strStarts ?e "a")"#, &mut variables).unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, BuiltinName::StrStarts);
                assert_eq!(args.len(), 2);
            }
            _ => panic!("expected a call"),
        }
    }

    #[test]
    fn resolves_plus_to_unary_or_binary_by_arity() {
        let mut variables = VariableTable::new();
        let unary = parse_expr("(+ ?x)", &mut variables).unwrap();
        assert!(matches!(unary, Expr::Call { name: BuiltinName::UnaryPlus, .. }));
        let binary = parse_expr("(+ ?x ?y)", &mut variables).unwrap();
        assert!(matches!(binary, Expr::Call { name: BuiltinName::Add, .. }));
    }

    #[test]
    fn unknown_function_is_a_parse_error() {
        let mut variables = VariableTable::new();
        assert!(parse_expr("(totallyMadeUp ?x)", &mut variables).is_err());
    }

    #[test]
    fn parses_a_distinct_wrapped_aggregate_argument() {
        let mut variables = VariableTable::new();
        let agg = parse_aggregate("#(count (distinct ?x))", &mut variables).unwrap();
        assert_eq!(agg.name, AggregateName::Count);
        assert!(agg.distinct);
    }

    #[test]
    fn sample_requires_an_argument() {
        let mut variables = VariableTable::new();
        assert!(parse_aggregate("#(sample)", &mut variables).is_err());
    }

    #[test]
    fn unbalanced_parens_are_a_malformed_expression_error() {
        let mut variables = VariableTable::new();
        assert!(parse_expr("(strStarts ?e \"a\"", &mut variables).is_err());
    }

    #[test]
    fn select_list_aggregates_are_unmarked() {
        let mut variables = VariableTable::new();
        let value = parse_select_expr("(count ?u)", &mut variables).unwrap();
        assert!(matches!(value, BindValue::Aggregate(AggregateCall { name: AggregateName::Count, .. })));
    }

    #[test]
    fn as_wraps_an_unmarked_aggregate_with_an_alias() {
        let mut variables = VariableTable::new();
        let (value, alias) = parse_as("(as (sum ?x) ?total)", &mut variables).unwrap();
        assert!(matches!(value, BindValue::Aggregate(AggregateCall { name: AggregateName::Sum, .. })));
        assert_eq!(variables.name(alias), "total");
    }
}
