//! `xsd:*` casts (`CAST(? AS xsd:integer)` and friends).

use crate::ScalarUnaryOp;
use flake_model::{Datatype, ThinResult, TypedValue};

macro_rules! cast_op {
    ($name:ident, $target:expr) => {
        #[derive(Debug, Default)]
        pub struct $name;

        impl ScalarUnaryOp for $name {
            fn evaluate(&self, arg: &TypedValue) -> ThinResult<TypedValue> {
                arg.coerce_to($target)
            }
        }
    };
}

cast_op!(CastStringOp, Datatype::String);
cast_op!(CastBooleanOp, Datatype::Boolean);
cast_op!(CastIntegerOp, Datatype::Integer);
cast_op!(CastDecimalOp, Datatype::Decimal);
cast_op!(CastDoubleOp, Datatype::Double);
cast_op!(CastFloatOp, Datatype::Float);
cast_op!(CastDateTimeOp, Datatype::DateTime);
