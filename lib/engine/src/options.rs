//! Query options (spec.md Sec. 6.1's `opts`/`options` key).
//!
//! Builds from the parsed query's own `opts: serde_json::Value` bag
//! (`flake_parser::ast::ParsedQuery::opts`) rather than duplicating the key
//! lookup flake-parser already did; this struct just gives a typed view over
//! the handful of keys the engine itself reads.

use serde_json::Value;

/// Typed view over a query's `opts`/`options` object (spec.md Sec. 6.1).
///
/// Keys with no engine-level behavior (`reasoner-methods`, `rule-sources`,
/// `from`, `from-named`, `t`) are not modeled here; they belong to the
/// snapshot-selection layer that hands `flake-engine` its `Snapshot` already
/// resolved to the right ledger/time.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// `opts.maxFuel`. `None` means unbounded (spec.md Sec. 5).
    pub max_fuel: Option<u64>,
    /// `opts.meta`: wrap the result in a [`crate::results::MetaEnvelope`].
    pub meta: bool,
    /// `opts.component`: auto-expand referenced subjects during select-map
    /// expansion (spec.md Sec. 4.4 step 8), up to `depth` hops.
    pub component: bool,
    /// `opts.policy`: opaque passthrough. Policy enforcement is out of
    /// scope; only the extension point is kept so a caller-supplied snapshot
    /// wrapper can read it back out of the envelope.
    pub policy: Option<Value>,
    /// `opts.policy-class`.
    pub policy_class: Option<Value>,
    /// `opts.policy-values`.
    pub policy_values: Option<Value>,
    /// `opts.identity`: opaque passthrough, echoed into the meta envelope.
    pub identity: Option<Value>,
    /// `opts.parseJSON`: coerce string-typed literals that look like JSON
    /// into their parsed form during result serialization.
    pub parse_json: bool,
    /// `opts.prettyPrint`.
    pub pretty_print: bool,
}

impl QueryOptions {
    /// Reads the subset of keys this crate acts on out of a parsed query's
    /// `opts` bag. Unrecognized or mistyped keys are ignored rather than
    /// rejected; `flake-parser` already validated the numeric/shape-bearing
    /// keys it itself consumes (`limit`/`offset`/`fuel`).
    pub fn from_opts(opts: &Value) -> Self {
        let bool_key = |key: &str| opts.get(key).and_then(Value::as_bool).unwrap_or(false);
        Self {
            max_fuel: opts.get("maxFuel").and_then(Value::as_u64),
            meta: bool_key("meta"),
            component: bool_key("component"),
            policy: opts.get("policy").cloned(),
            policy_class: opts.get("policy-class").cloned(),
            policy_values: opts.get("policy-values").cloned(),
            identity: opts.get("identity").cloned(),
            parse_json: bool_key("parseJSON"),
            pretty_print: bool_key("prettyPrint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_max_fuel_and_meta_flag() {
        let opts = QueryOptions::from_opts(&json!({"maxFuel": 1000, "meta": true}));
        assert_eq!(opts.max_fuel, Some(1000));
        assert!(opts.meta);
        assert!(!opts.component);
    }

    #[test]
    fn missing_keys_default_to_unset() {
        let opts = QueryOptions::from_opts(&json!({}));
        assert_eq!(opts.max_fuel, None);
        assert!(!opts.meta);
        assert!(opts.policy.is_none());
    }

    #[test]
    fn non_object_opts_is_tolerated_as_all_defaults() {
        let opts = QueryOptions::from_opts(&Value::Null);
        assert_eq!(opts.max_fuel, None);
        assert!(!opts.meta);
    }
}
