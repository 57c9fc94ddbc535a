//! `year`, `month`, `day`, `hours`, `minutes`, `seconds`, `timezone`, `tz`, `now`.

use crate::{ScalarNullaryOp, ScalarUnaryOp};
use flake_model::{ThinError, ThinResult, TypedValue};
use oxsdatatypes::{Decimal, DateTime, Integer};

#[derive(Debug, Default)]
pub struct YearOp;

impl ScalarUnaryOp for YearOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let year: Integer = match arg {
            TypedValue::DateTime(dt) => dt.year().into(),
            TypedValue::Date(d) => d.year().into(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Integer(year))
    }
}

#[derive(Debug, Default)]
pub struct MonthOp;

impl ScalarUnaryOp for MonthOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let month: Integer = match arg {
            TypedValue::DateTime(dt) => dt.month().into(),
            TypedValue::Date(d) => d.month().into(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Integer(month))
    }
}

#[derive(Debug, Default)]
pub struct DayOp;

impl ScalarUnaryOp for DayOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let day: Integer = match arg {
            TypedValue::DateTime(dt) => dt.day().into(),
            TypedValue::Date(d) => d.day().into(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Integer(day))
    }
}

#[derive(Debug, Default)]
pub struct HoursOp;

impl ScalarUnaryOp for HoursOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let hour: Integer = match arg {
            TypedValue::DateTime(dt) => dt.hour().into(),
            TypedValue::Time(t) => t.hour().into(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Integer(hour))
    }
}

#[derive(Debug, Default)]
pub struct MinutesOp;

impl ScalarUnaryOp for MinutesOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let minute: Integer = match arg {
            TypedValue::DateTime(dt) => dt.minute().into(),
            TypedValue::Time(t) => t.minute().into(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Integer(minute))
    }
}

#[derive(Debug, Default)]
pub struct SecondsOp;

impl ScalarUnaryOp for SecondsOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let second: Decimal = match arg {
            TypedValue::DateTime(dt) => dt.second(),
            TypedValue::Time(t) => t.second(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::Decimal(second))
    }
}

#[derive(Debug, Default)]
pub struct TimezoneOp;

impl ScalarUnaryOp for TimezoneOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let offset = match arg {
            TypedValue::DateTime(dt) => dt.timezone(),
            TypedValue::Date(d) => d.timezone(),
            TypedValue::Time(t) => t.timezone(),
            _ => return ThinError::expected(),
        };
        match offset {
            Some(offset) => Ok(TypedValue::string(offset.to_string())),
            None => ThinError::expected(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TzOp;

impl ScalarUnaryOp for TzOp {
    fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
        let offset = match arg {
            TypedValue::DateTime(dt) => dt.timezone(),
            TypedValue::Date(d) => d.timezone(),
            TypedValue::Time(t) => t.timezone(),
            _ => return ThinError::expected(),
        };
        Ok(TypedValue::string(match offset {
            Some(offset) => offset.to_string(),
            None => String::new(),
        }))
    }
}

#[derive(Debug, Default)]
pub struct NowOp {
    /// A fixed clock reading, threaded in by the caller (spec.md Sec. 4.2:
    /// `now()` "returns a single, fixed timestamp for the whole query
    /// evaluation", never wall-clock time read per call).
    pub at: DateTime,
}

impl ScalarNullaryOp for NowOp {
    fn evaluate(&self) -> ThinResult<TypedValue> {
        Ok(TypedValue::DateTime(self.at))
    }
}
