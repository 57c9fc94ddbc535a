//! Aggregate functions: `count`, `sum`, `avg`, `min`, `max`, `sample`,
//! `groupConcat`, `median`, `variance`, `stddev` (spec.md Sec. 4.2), each
//! optionally wrapped in `distinct`.
//!
//! Grounded on the teacher's `SparqlTypedValueSum`/`SparqlAvg`/
//! `SparqlGroupConcat` accumulators: a running `ThinResult<_>` that, once it
//! sees one non-aggregable input, stays an error for the rest of the group
//! (spec.md Sec. 4.2: "an aggregate over a group containing a non-numeric
//! value for a numeric aggregate produces an error for that group, not a
//! partial result"). Collapsed from DataFusion's `Accumulator` trait (which
//! additionally has to serialize/merge partial state across batches) to a
//! plain incremental `push`/`finish`, since aggregation here runs
//! single-threaded over one in-memory group at a time.

use crate::name::AggregateName;
use flake_model::{ThinError, ThinResult, TypedValue};
use itertools::Itertools;
use oxsdatatypes::{Decimal, Double};
use std::collections::HashSet;

/// Builds the accumulator for `name`, wrapping it in [`DistinctAgg`] when
/// `distinct` is set. `separator` is only meaningful for `GroupConcat`
/// (defaulting to `""` per SPARQL, same as the teacher's `group_concat_typed_value`).
pub fn make_aggregate(name: AggregateName, distinct: bool, separator: Option<String>) -> Box<dyn Aggregate> {
    let inner: Box<dyn Aggregate> = match name {
        AggregateName::Count => Box::new(CountAgg::new()),
        AggregateName::Sum => Box::new(SumAgg::new()),
        AggregateName::Avg => Box::new(AvgAgg::new()),
        AggregateName::Min => Box::new(MinMaxAgg::min()),
        AggregateName::Max => Box::new(MinMaxAgg::max()),
        AggregateName::Sample => Box::new(SampleAgg::default()),
        AggregateName::GroupConcat => Box::new(GroupConcatAgg::new(separator.unwrap_or_default())),
        AggregateName::Median => Box::new(MedianAgg::default()),
        AggregateName::Variance => Box::new(VarianceAgg::default()),
        AggregateName::StdDev => Box::new(StdDevAgg::default()),
        AggregateName::CountDistinct => Box::new(CountDistinctAgg::default()),
    };
    if distinct {
        Box::new(DistinctAgg::new(inner))
    } else {
        inner
    }
}

/// An incremental aggregate accumulator.
pub trait Aggregate {
    fn push(&mut self, value: &TypedValue);

    fn finish(self: Box<Self>) -> ThinResult<TypedValue>;
}

fn as_f64(value: &TypedValue) -> ThinResult<f64> {
    match value {
        TypedValue::Integer(i) => Ok(i64::from(*i) as f64),
        TypedValue::Decimal(d) => Ok((*d).into()),
        TypedValue::Double(d) => Ok((*d).into()),
        TypedValue::Float(f) => Ok(f32::from(*f) as f64),
        _ => ThinError::expected(),
    }
}

#[derive(Debug)]
pub struct CountAgg {
    count: i64,
}

impl CountAgg {
    pub fn new() -> Self {
        Self { count: 0 }
    }
}

impl Aggregate for CountAgg {
    fn push(&mut self, _value: &TypedValue) {
        self.count += 1;
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        Ok(TypedValue::integer(self.count))
    }
}

#[derive(Debug, Default)]
pub struct CountDistinctAgg {
    seen: HashSet<String>,
}

impl Aggregate for CountDistinctAgg {
    fn push(&mut self, value: &TypedValue) {
        self.seen.insert(value.lexical_form());
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        Ok(TypedValue::integer(self.seen.len() as i64))
    }
}

#[derive(Debug)]
pub struct SumAgg {
    sum: ThinResult<f64>,
    all_integer: bool,
}

impl SumAgg {
    pub fn new() -> Self {
        Self {
            sum: Ok(0.0),
            all_integer: true,
        }
    }
}

impl Aggregate for SumAgg {
    fn push(&mut self, value: &TypedValue) {
        if self.sum.is_err() {
            return;
        }
        self.all_integer &= matches!(value, TypedValue::Integer(_));
        match as_f64(value) {
            Ok(v) => self.sum = self.sum.map(|sum| sum + v),
            Err(e) => self.sum = Err(e),
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        let sum = self.sum?;
        Ok(if self.all_integer {
            TypedValue::integer(sum as i64)
        } else {
            TypedValue::double(sum)
        })
    }
}

#[derive(Debug)]
pub struct AvgAgg {
    sum: ThinResult<f64>,
    count: u64,
}

impl AvgAgg {
    pub fn new() -> Self {
        Self {
            sum: Ok(0.0),
            count: 0,
        }
    }
}

impl Aggregate for AvgAgg {
    fn push(&mut self, value: &TypedValue) {
        self.count += 1;
        if self.sum.is_err() {
            return;
        }
        match as_f64(value) {
            Ok(v) => self.sum = self.sum.map(|sum| sum + v),
            Err(e) => self.sum = Err(e),
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        if self.count == 0 {
            return ThinError::expected();
        }
        let avg = self.sum? / self.count as f64;
        let decimal: Decimal = avg.to_string().parse().map_err(|_| ThinError::ExpectedError)?;
        Ok(TypedValue::Decimal(decimal))
    }
}

/// `min`/`max` share the "first value sets the datatype, later values compare
/// under SPARQL `compare` order-by-cmp" shape; `cmp_is_better` picks the
/// direction.
#[derive(Debug)]
pub struct MinMaxAgg {
    best: Option<TypedValue>,
    cmp_is_better: fn(std::cmp::Ordering) -> bool,
}

impl MinMaxAgg {
    pub fn min() -> Self {
        Self {
            best: None,
            cmp_is_better: |ord| ord == std::cmp::Ordering::Less,
        }
    }

    pub fn max() -> Self {
        Self {
            best: None,
            cmp_is_better: |ord| ord == std::cmp::Ordering::Greater,
        }
    }
}

impl Aggregate for MinMaxAgg {
    fn push(&mut self, value: &TypedValue) {
        match &self.best {
            None => self.best = Some(value.clone()),
            Some(current) if (self.cmp_is_better)(value.order_by_cmp(current)) => {
                self.best = Some(value.clone());
            }
            Some(_) => {}
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        self.best.ok_or(ThinError::ExpectedError)
    }
}

/// `sample`: an arbitrary member of the group, per SPARQL semantics (any
/// single value satisfies it); this implementation keeps the first.
#[derive(Debug, Default)]
pub struct SampleAgg {
    first: Option<TypedValue>,
}

impl Aggregate for SampleAgg {
    fn push(&mut self, value: &TypedValue) {
        if self.first.is_none() {
            self.first = Some(value.clone());
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        self.first.ok_or(ThinError::ExpectedError)
    }
}

#[derive(Debug)]
pub struct GroupConcatAgg {
    separator: String,
    error: bool,
    parts: Vec<String>,
}

impl GroupConcatAgg {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            error: false,
            parts: Vec::new(),
        }
    }
}

impl Aggregate for GroupConcatAgg {
    fn push(&mut self, value: &TypedValue) {
        if self.error {
            return;
        }
        match value {
            TypedValue::String(_) | TypedValue::LangString(_) | TypedValue::Opaque { .. } => {
                self.parts.push(value.lexical_form());
            }
            _ => self.error = true,
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        if self.error {
            return ThinError::expected();
        }
        Ok(TypedValue::string(self.parts.join(&self.separator)))
    }
}

/// `median`: the middle value of the numeric inputs sorted by value (the
/// lower of the two middle values for an even-sized group).
#[derive(Debug, Default)]
pub struct MedianAgg {
    values: Vec<f64>,
}

impl Aggregate for MedianAgg {
    fn push(&mut self, value: &TypedValue) {
        if let Ok(v) = as_f64(value) {
            self.values.push(v);
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        if self.values.is_empty() {
            return ThinError::expected();
        }
        let sorted = self.values.iter().copied().sorted_by(f64::total_cmp).collect_vec();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Ok(TypedValue::double(median))
    }
}

/// Shared population variance/std-dev accumulation (Welford's online algorithm).
#[derive(Debug, Default)]
struct VarianceAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl VarianceAccumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }
}

#[derive(Debug, Default)]
pub struct VarianceAgg {
    acc: VarianceAccumulator,
}

impl Aggregate for VarianceAgg {
    fn push(&mut self, value: &TypedValue) {
        if let Ok(v) = as_f64(value) {
            self.acc.push(v);
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        let variance = self.acc.variance().ok_or(ThinError::ExpectedError)?;
        Ok(TypedValue::Double(Double::from(variance)))
    }
}

#[derive(Debug, Default)]
pub struct StdDevAgg {
    acc: VarianceAccumulator,
}

impl Aggregate for StdDevAgg {
    fn push(&mut self, value: &TypedValue) {
        if let Ok(v) = as_f64(value) {
            self.acc.push(v);
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        let variance = self.acc.variance().ok_or(ThinError::ExpectedError)?;
        Ok(TypedValue::Double(Double::from(variance.sqrt())))
    }
}

/// Wraps any [`Aggregate`] so repeated equal lexical forms are only counted
/// once, implementing FQL/SPARQL `distinct` aggregate modifiers.
pub struct DistinctAgg {
    inner: Box<dyn Aggregate>,
    seen: HashSet<String>,
}

impl DistinctAgg {
    pub fn new(inner: Box<dyn Aggregate>) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
        }
    }
}

impl Aggregate for DistinctAgg {
    fn push(&mut self, value: &TypedValue) {
        if self.seen.insert(value.lexical_form()) {
            self.inner.push(value);
        }
    }

    fn finish(self: Box<Self>) -> ThinResult<TypedValue> {
        self.inner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mut agg: Box<dyn Aggregate>, values: &[TypedValue]) -> ThinResult<TypedValue> {
        for v in values {
            agg.push(v);
        }
        agg.finish()
    }

    #[test]
    fn sum_stays_integer_when_all_inputs_are_integer() {
        let result = run(
            Box::new(SumAgg::new()),
            &[TypedValue::integer(1), TypedValue::integer(2), TypedValue::integer(3)],
        )
        .unwrap();
        assert_eq!(result, TypedValue::integer(6));
    }

    #[test]
    fn sum_errors_once_a_non_numeric_value_is_seen() {
        let result = run(
            Box::new(SumAgg::new()),
            &[TypedValue::integer(1), TypedValue::string("nope")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn max_picks_the_largest_value() {
        let result = run(
            Box::new(MinMaxAgg::max()),
            &[TypedValue::integer(3), TypedValue::integer(9), TypedValue::integer(5)],
        )
        .unwrap();
        assert_eq!(result, TypedValue::integer(9));
    }

    #[test]
    fn group_concat_joins_with_separator() {
        let result = run(
            Box::new(GroupConcatAgg::new(", ")),
            &[TypedValue::string("a"), TypedValue::string("b")],
        )
        .unwrap();
        assert_eq!(result, TypedValue::string("a, b"));
    }

    #[test]
    fn distinct_drops_repeated_lexical_forms() {
        let result = run(
            Box::new(DistinctAgg::new(Box::new(CountAgg::new()))),
            &[TypedValue::integer(1), TypedValue::integer(1), TypedValue::integer(2)],
        )
        .unwrap();
        assert_eq!(result, TypedValue::integer(2));
    }

    #[test]
    fn median_of_even_count_averages_the_middle_two() {
        let result = run(
            Box::new(MedianAgg::default()),
            &[
                TypedValue::integer(1),
                TypedValue::integer(2),
                TypedValue::integer(3),
                TypedValue::integer(4),
            ],
        )
        .unwrap();
        assert_eq!(result, TypedValue::double(2.5));
    }
}
