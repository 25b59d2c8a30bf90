//! Value - the model object stored in a field slot.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A single slot value.
///
/// Each field variant stores exactly one kind of value, or [`Value::Null`].
/// Code-domain fields store the *index* into their label/code arrays, never
/// the code itself; [`crate::field::FieldKind::to_storage`] converts to the
/// persisted representation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    Str(String),
    Int(i64),
    /// Fixed-point number scaled by the field's scale (`12.50` at scale 2 is `1250`).
    Fixed(i64),
    /// Index into a code domain.
    Code(usize),
    Date(NaiveDate),
    /// First day of the month.
    Month(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Image(Vec<u8>),
}

impl Value {
    /// Check whether this is the null value.
    ///
    /// Empty strings and empty images count as null.
    #[inline]
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::Image(bytes) => bytes.is_empty(),
            _ => false,
        }
    }

    /// Fold the empty representations into [`Value::Null`].
    pub fn normalized(self) -> Value {
        if self.is_null() {
            Value::Null
        } else {
            self
        }
    }

    /// Variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Fixed(_) => "fixed",
            Value::Code(_) => "code",
            Value::Date(_) => "date",
            Value::Month(_) => "month",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::Image(_) => "image",
        }
    }

    /// Compare two values of the same variant.
    ///
    /// Returns `None` for mismatched variants or when either side is null.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Fixed(a), Value::Fixed(b)) => Some(a.cmp(b)),
            (Value::Code(a), Value::Code(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Month(a), Value::Month(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Image(a), Value::Image(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Fixed(units) => write!(f, "fixed({})", units),
            Value::Code(idx) => write!(f, "code#{}", idx),
            Value::Date(d) => write!(f, "{}", d),
            Value::Month(m) => write!(f, "{}", m.format("%Y-%m")),
            Value::Time(t) => write!(f, "{}", t),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Image(bytes) => write!(f, "image[{} bytes]", bytes.len()),
        }
    }
}
