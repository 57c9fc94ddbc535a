//! The parsed-query AST (spec.md Sec. 3 "Parsed query"/"Parsed where pattern",
//! Sec. 6.1's `where` clause grammar). Variables are interned to [`VariableId`]
//! at parse time rather than carried as name strings (spec.md Sec. 9: "the
//! parser interns every `?var` it encounters... this lets a `Solution` be a
//! plain dense tuple indexed by `VariableId`").

use flake_model::{NamedNode, TypedValue, VariableId, VariableTable};

/// A grammar `term`: `iri | literal | var | "_id" | "rdf:type" | "@id"`.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Var(VariableId),
    Iri(NamedNode),
    Literal(TypedValue),
    /// The reserved `_id` term: matches on the subject's internal id column.
    Id,
    /// The reserved `rdf:type` term in object position.
    RdfType,
    /// The reserved `@id` term: matches on the resolved IRI of a node.
    AtId,
}

/// A grammar `pred-ref`: `iri | predicate-iri "+" integer? | "fullText:" iri | var`.
#[derive(Clone, Debug, PartialEq)]
pub enum PredRef {
    Iri(NamedNode),
    /// `predicate+n` or bare `predicate+` (spec.md Sec. 4.6; a missing `n`
    /// falls back to the configurable default bound, spec.md Sec. 9).
    Recursive { predicate: NamedNode, max_hops: Option<u32> },
    FullText(NamedNode),
    Var(VariableId),
}

/// A grammar `dataset`: `"$fdb" [block?] | "$wd" | configured-prefix`.
#[derive(Clone, Debug, PartialEq)]
pub enum Dataset {
    Fdb { block: Option<String> },
    Wd,
    Named(NamedNode),
}

/// One parsed where-clause element (a `tuple` or a `map-pattern`).
#[derive(Clone, Debug, PartialEq)]
pub enum WherePattern {
    /// A 3-tuple: `[term, pred-ref, term]`.
    Triple { subject: Term, predicate: PredRef, object: Term },
    /// A 4-tuple: `[dataset, term, pred-ref, term]`.
    NamedTriple { dataset: Dataset, subject: Term, predicate: PredRef, object: Term },
    /// A 2-tuple binding form: `[var, (expr | aggregate)]`.
    Bind { variable: VariableId, value: BindValue },
    Optional(Vec<WherePattern>),
    Union(Vec<Vec<WherePattern>>),
    /// `{"bind": {var: (expr|aggregate), ...}}`. Kept distinct from the
    /// 2-tuple `Bind` form even though both lower to the same semantics,
    /// since each carries its own declared-order list of assignments.
    BindMap(Vec<(VariableId, BindValue)>),
    Filter(Vec<Expr>),
    Minus(Vec<WherePattern>),
    Exists(Vec<WherePattern>),
    NotExists(Vec<WherePattern>),
    /// `{"values": {var: [value, ...]}}`. A row containing `None` leaves
    /// the variable unbound for that row (the grammar's `UNDEF`).
    Values { variable: VariableId, rows: Vec<Option<TypedValue>> },
}

/// The right-hand side of a `bind`: either a plain expression or an aggregate
/// call (spec.md Sec. 4.5 "Aggregate binding contract": `#(...)`).
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Expr(Expr),
    Aggregate(AggregateCall),
}

/// A parsed filter/bind s-expression (spec.md Sec. 6.1 "Functions").
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Var(VariableId),
    Const(TypedValue),
    Call { name: flake_functions::BuiltinName, args: Vec<Expr> },
}

/// A parsed aggregate form: `#(name arg?)`, optionally `#(name (distinct arg))`.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateCall {
    pub name: flake_functions::AggregateName,
    pub distinct: bool,
    /// The scalar argument, required for `sample` and the `groupconcat`
    /// separator literal, optional (absent means `count(*)`) otherwise.
    pub arg: Option<Box<Expr>>,
    /// `groupconcat`'s separator, when given as a second argument.
    pub separator: Option<String>,
}

/// `desc`/`asc` direction for an `orderBy` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One `orderBy` entry: a variable, or `(desc ?v)`/`(asc ?v)`.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderKey {
    pub variable: VariableId,
    pub direction: Direction,
}

/// A single element of a `select` list: a bare variable, or an `as`-wrapped
/// expression/aggregate bound to an alias.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectItem {
    Var(VariableId),
    As { value: BindValue, alias: VariableId },
}

/// A select-map expansion tree (spec.md Sec. 4.4 step 8): `{"*": true}`-style
/// wildcard, or a list of predicates, each optionally expanding further.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SelectTree {
    pub wildcard: bool,
    pub predicates: Vec<SelectTreeEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectTreeEntry {
    pub predicate: NamedNode,
    /// `Some` when this entry nests further (`{"pred": ["*"]}` or a
    /// reference expansion), `None` for a plain scalar fetch.
    pub nested: Option<SelectTree>,
}

/// The query's select clause: either a tuple-mode list, or a single-variable
/// select-crawl (spec.md Sec. 6.4 "Map / subject-crawl mode").
#[derive(Clone, Debug, PartialEq)]
pub enum SelectClause {
    Items(Vec<SelectItem>),
    Crawl { variable: VariableId, tree: SelectTree },
}

/// `select`/`selectOne`/`selectDistinct`/`selectReduced` (spec.md Sec. 4.5:
/// "mutually exclusive. `selectOne` forces `limit = 1`").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectMode {
    Many,
    One,
    Distinct,
    Reduced,
}

/// An IRI prefix mapping, applied to expand `@id`/predicate/class strings at
/// parse time (spec.md Sec. 4.5 "context").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    pub prefixes: Vec<(String, String)>,
}

/// `op-type ∈ {select, delete}` (spec.md Sec. 3 "Parsed query"). `delete` is
/// parsed but its execution is out of scope (spec.md Sec. 1 Non-goals:
/// "SPARQL Update (DELETE/INSERT are parsed but execution of updates is not
/// specified here)").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpType {
    Select,
    Delete,
}

/// Which surface a query document came from (spec.md Sec. 3: "`minus`... is a
/// hard error at execution time in the FQL dialect but supported via SPARQL
/// translation"). Set from the reserved `_dialect` document key that
/// `flake-sparql::translate_query` stamps onto its translated output;
/// defaults to `Fql` for a document parsed directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Fql,
    Sparql,
}

/// The fully parsed and validated FQL query (spec.md Sec. 3 "Parsed query").
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedQuery {
    pub variables: VariableTable,
    pub op_type: OpType,
    pub select: SelectClause,
    pub select_mode: SelectMode,
    pub where_clause: Vec<WherePattern>,
    pub order_by: Vec<OrderKey>,
    pub group_by: Vec<VariableId>,
    pub having: Vec<Expr>,
    pub limit: Option<u64>,
    pub offset: u64,
    pub depth: u32,
    pub context: Context,
    /// Which surface this query was written in; governs whether `minus` is a
    /// hard execution error (spec.md Sec. 3).
    pub dialect: Dialect,
    /// Externally supplied initial bindings (the `vars` top-level key).
    pub supplied_vars: Vec<(VariableId, TypedValue)>,
    pub max_fuel: Option<u64>,
    /// The remaining `opts`/`options` keys (`meta`, `policy`, `component`,
    /// `output`, ...) that govern post-processing and result shaping rather
    /// than parsing itself; interpreted downstream by `flake-engine`.
    pub opts: serde_json::Value,
}
