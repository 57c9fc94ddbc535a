use std::cmp::Ordering;

/// The closed set of datatypes recognized by the engine (spec.md Sec. 3).
///
/// `Datatype` is the tag half of a [`crate::TypedValue`]; it is what "datatype-id"
/// refers to in the cross-datatype comparator used by `order-by` (spec.md Sec.
/// 4.4, step 4) and in `Optimizable` selectivity bucketing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Datatype {
    String,
    LangString,
    Boolean,
    Date,
    DateTime,
    Time,
    Decimal,
    Double,
    Float,
    Integer,
    HexBinary,
    Base64Binary,
    Json,
    Vector,
    Id,
    /// An unrecognized datatype IRI. The literal's lexical form is kept verbatim
    /// and never coerced (spec.md Sec. 3: "Unknown datatypes are accepted as
    /// opaque strings/numbers/booleans but never coerced").
    Opaque,
}

impl Datatype {
    /// Whether values of this datatype participate in numeric comparison/arithmetic.
    pub fn is_numeric(self) -> bool {
        matches!(self, Datatype::Decimal | Datatype::Double | Datatype::Float | Datatype::Integer)
    }

    /// Ordering bucket used when two values of different datatypes are compared
    /// under `order-by` (spec.md Sec. 4.4: "across datatypes compare datatype-id
    /// first. Numeric datatypes are treated as mutually comparable.").
    fn sort_bucket(self) -> u8 {
        if self.is_numeric() {
            return 0;
        }
        match self {
            Datatype::Boolean => 1,
            Datatype::String => 2,
            Datatype::LangString => 3,
            Datatype::Date => 4,
            Datatype::DateTime => 5,
            Datatype::Time => 6,
            Datatype::HexBinary => 7,
            Datatype::Base64Binary => 8,
            Datatype::Json => 9,
            Datatype::Vector => 10,
            Datatype::Id => 11,
            Datatype::Opaque => 12,
            _ => unreachable!("numeric datatypes handled above"),
        }
    }

    pub fn compare_datatype_id(self, other: Self) -> Ordering {
        if self.is_numeric() && other.is_numeric() {
            return Ordering::Equal;
        }
        self.sort_bucket().cmp(&other.sort_bucket())
    }
}
