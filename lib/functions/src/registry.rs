//! Dispatches a [`BuiltinName`] plus already-evaluated arguments to the
//! matching `scalar::*` op, mirroring the teacher's
//! `DefaultRdfFusionFunctionRegistry` but collapsed to a single match instead
//! of a `HashMap<FunctionName, UdfFactory>` (there is no UDF registration step
//! here: every builtin is fixed at compile time, spec.md Sec. 4.2 being a
//! closed function list rather than an extensible one).

use crate::name::BuiltinName;
use crate::scalar::{comparison, conversion, dates_and_times, functional_forms, hash, numeric, strings, terms};
use crate::{ScalarBinaryOp, ScalarNullaryOp, ScalarTernaryOp, ScalarUnaryOp, ScalarVariadicOp};
use flake_model::{ThinError, ThinResult, TypedValue};
use oxsdatatypes::DateTime;

/// Evaluates `name(args...)`.
///
/// `now` is the one builtin that needs state beyond its arguments (a fixed
/// clock reading for the whole query, spec.md Sec. 4.2); callers pass it via
/// `query_time`.
pub fn dispatch(name: BuiltinName, args: &[TypedValue], query_time: DateTime) -> ThinResult<TypedValue> {
    use BuiltinName as N;
    match (name, args) {
        (N::Str, [a]) => terms::StrOp.evaluate(a),
        (N::Lang, [a]) => terms::LangOp.evaluate(a),
        (N::Datatype, [a]) => terms::DatatypeOp.evaluate(a),
        (N::Iri, [a]) => terms::IriOp.evaluate(a),
        (N::BNode, []) => ScalarNullaryOp::evaluate(&terms::BNodeOp),
        (N::BNode, [a]) => ScalarUnaryOp::evaluate(&terms::BNodeOp, a),
        (N::StrDt, [a, b]) => terms::StrDtOp.evaluate(a, b),
        (N::StrLang, [a, b]) => terms::StrLangOp.evaluate(a, b),
        (N::IsIri, [a]) => terms::IsIriOp.evaluate(a),
        (N::IsLiteral, [a]) => terms::IsLiteralOp.evaluate(a),
        (N::IsNumeric, [a]) => terms::IsNumericOp.evaluate(a),
        (N::IsBlank, [a]) => terms::IsBlankOp.evaluate(a),
        (N::SameTerm, [a, b]) => comparison::SameTermOp.evaluate(a, b),
        (N::Uuid, []) => ScalarNullaryOp::evaluate(&terms::UuidOp),
        (N::StrUuid, []) => ScalarNullaryOp::evaluate(&terms::StrUuidOp),

        (N::StrLen, [a]) => strings::StrLenOp.evaluate(a),
        (N::UCase, [a]) => strings::UCaseOp.evaluate(a),
        (N::LCase, [a]) => strings::LCaseOp.evaluate(a),
        (N::Contains, [a, b]) => strings::ContainsOp.evaluate(a, b),
        (N::StrStarts, [a, b]) => strings::StrStartsOp.evaluate(a, b),
        (N::StrEnds, [a, b]) => strings::StrEndsOp.evaluate(a, b),
        (N::StrBefore, [a, b]) => strings::StrBeforeOp.evaluate(a, b),
        (N::StrAfter, [a, b]) => strings::StrAfterOp.evaluate(a, b),
        (N::SubStr, [s, start]) => strings::SubStrOp.evaluate(s, start, &TypedValue::integer(i64::MAX)),
        (N::SubStr, [s, start, length]) => strings::SubStrOp.evaluate(s, start, length),
        (N::Regex, [text, pattern]) => strings::RegexOp { case_insensitive: false }.evaluate(text, pattern),
        (N::Regex, [text, pattern, flags]) => {
            let case_insensitive = flags.lexical_form().contains('i');
            strings::RegexOp { case_insensitive }.evaluate(text, pattern)
        }
        (N::Replace, [text, pattern, replacement]) => strings::ReplaceOp.evaluate(text, pattern, replacement),
        (N::EncodeForUri, [a]) => strings::EncodeForUriOp.evaluate(a),
        (N::Concat, args) => strings::ConcatOp.evaluate(args),
        (N::LangMatches, [a, b]) => strings::LangMatchesOp.evaluate(a, b),

        (N::Add, [a, b]) => numeric::AddOp.evaluate(a, b),
        (N::Sub, [a, b]) => numeric::SubOp.evaluate(a, b),
        (N::Mul, [a, b]) => numeric::MulOp.evaluate(a, b),
        (N::Div, [a, b]) => numeric::DivOp.evaluate(a, b),
        (N::UnaryPlus, [a]) => numeric::UnaryPlusOp.evaluate(a),
        (N::UnaryMinus, [a]) => numeric::UnaryMinusOp.evaluate(a),
        (N::Abs, [a]) => numeric::AbsOp.evaluate(a),
        (N::Ceil, [a]) => numeric::CeilOp.evaluate(a),
        (N::Floor, [a]) => numeric::FloorOp.evaluate(a),
        (N::Round, [a]) => numeric::RoundOp.evaluate(a),
        (N::Rand, []) => ScalarNullaryOp::evaluate(&numeric::RandOp),

        (N::Equal, [a, b]) => comparison::EqualOp.evaluate(a, b),
        (N::NotEqual, [a, b]) => comparison::NotEqualOp.evaluate(a, b),
        (N::LessThan, [a, b]) => comparison::LessThanOp.evaluate(a, b),
        (N::LessOrEqual, [a, b]) => comparison::LessOrEqualOp.evaluate(a, b),
        (N::GreaterThan, [a, b]) => comparison::GreaterThanOp.evaluate(a, b),
        (N::GreaterOrEqual, [a, b]) => comparison::GreaterOrEqualOp.evaluate(a, b),
        (N::And, [a, b]) => comparison::AndOp.evaluate(a, b),
        (N::Or, [a, b]) => comparison::OrOp.evaluate(a, b),
        (N::Not, [a]) => comparison::NotOp.evaluate(a),
        (N::In, args) => functional_forms::InOp.evaluate(args),
        (N::NotIn, args) => functional_forms::NotInOp.evaluate(args),

        (N::Bound, [a]) => functional_forms::BoundOp.evaluate(a),
        (N::Coalesce, args) => functional_forms::CoalesceOp.evaluate(args),
        (N::If, [cond, then, otherwise]) => functional_forms::IfOp.evaluate(cond, then, otherwise),

        (N::Md5, [a]) => hash::Md5Op.evaluate(a),
        (N::Sha1, [a]) => hash::Sha1Op.evaluate(a),
        (N::Sha256, [a]) => hash::Sha256Op.evaluate(a),
        (N::Sha384, [a]) => hash::Sha384Op.evaluate(a),
        (N::Sha512, [a]) => hash::Sha512Op.evaluate(a),

        (N::Year, [a]) => dates_and_times::YearOp.evaluate(a),
        (N::Month, [a]) => dates_and_times::MonthOp.evaluate(a),
        (N::Day, [a]) => dates_and_times::DayOp.evaluate(a),
        (N::Hours, [a]) => dates_and_times::HoursOp.evaluate(a),
        (N::Minutes, [a]) => dates_and_times::MinutesOp.evaluate(a),
        (N::Seconds, [a]) => dates_and_times::SecondsOp.evaluate(a),
        (N::Timezone, [a]) => dates_and_times::TimezoneOp.evaluate(a),
        (N::Tz, [a]) => dates_and_times::TzOp.evaluate(a),
        (N::Now, []) => ScalarNullaryOp::evaluate(&dates_and_times::NowOp { at: query_time }),

        (N::CastString, [a]) => conversion::CastStringOp.evaluate(a),
        (N::CastBoolean, [a]) => conversion::CastBooleanOp.evaluate(a),
        (N::CastInteger, [a]) => conversion::CastIntegerOp.evaluate(a),
        (N::CastDecimal, [a]) => conversion::CastDecimalOp.evaluate(a),
        (N::CastDouble, [a]) => conversion::CastDoubleOp.evaluate(a),
        (N::CastFloat, [a]) => conversion::CastFloatOp.evaluate(a),
        (N::CastDateTime, [a]) => conversion::CastDateTimeOp.evaluate(a),

        _ => ThinError::expected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> DateTime {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn dispatches_ucase() {
        let result = dispatch(BuiltinName::UCase, &[TypedValue::string("abc")], t()).unwrap();
        assert_eq!(result, TypedValue::string("ABC"));
    }

    #[test]
    fn dispatches_add_integers() {
        let result = dispatch(
            BuiltinName::Add,
            &[TypedValue::integer(2), TypedValue::integer(3)],
            t(),
        )
        .unwrap();
        assert_eq!(result, TypedValue::integer(5));
    }

    #[test]
    fn wrong_arity_is_an_expected_error() {
        let result = dispatch(BuiltinName::UCase, &[], t());
        assert!(result.is_err());
    }

    #[test]
    fn bound_reports_false_on_evaluation_error() {
        assert_eq!(
            functional_forms::BoundOp.evaluate_error().unwrap(),
            TypedValue::boolean(false)
        );
    }

    #[test]
    fn in_short_circuits_on_match_before_seeing_a_later_incomparable_value() {
        let args = vec![
            TypedValue::integer(2),
            TypedValue::integer(2),
            TypedValue::string("unrelated"),
        ];
        let result = dispatch(BuiltinName::In, &args, t()).unwrap();
        assert_eq!(result, TypedValue::boolean(true));
    }
}
