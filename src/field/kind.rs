//! FieldKind - the closed set of field variants.
//!
//! Every variant defines the same four behaviours:
//! - null test and value compatibility ([`FieldKind::accepts`])
//! - text <-> model conversion ([`FieldKind::to_text`], [`FieldKind::to_object`])
//! - incremental input check ([`FieldKind::check_text`])
//! - SQL literal and storage mapping ([`FieldKind::sql_literal`], [`FieldKind::to_storage`])
//!
//! `to_object(to_text(v)) == v` holds for every valid non-null `v`, and
//! `to_text(Null)` is the empty string.

use std::fmt::Write;

use chrono::Timelike;

use super::code::CodeDomain;
use super::value::Value;
use super::{datetime, numeric, quote_sql};
use crate::common::config::{
    DEFAULT_FIXED_PRECISION, DEFAULT_FIXED_SCALE, DEFAULT_STRING_WIDTH, MAX_FIXED_PRECISION,
    MAX_INTEGER_DIGITS,
};
use crate::common::messages;
use crate::common::MessageCode;

/// Width of rendered date/time texts, used for incremental checks.
const DATE_WIDTH: usize = 10;
const MONTH_WIDTH: usize = 7;
const TIME_WIDTH: usize = 8;
const TIMESTAMP_WIDTH: usize = 19;

/// Field variant with its type-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String {
        width: usize,
        uppercase: bool,
    },
    Integer {
        digits: usize,
        min: Option<i64>,
        max: Option<i64>,
    },
    Fixed {
        precision: u8,
        scale: u8,
    },
    /// Boolean, integer or string codes behind display labels.
    Code(CodeDomain),
    Date,
    Month,
    Time,
    Timestamp,
    /// Binary content, edited as hex text.
    Image,
    /// A button-like field: no value, no storage, only commands.
    Actor,
}

impl FieldKind {
    pub fn string(width: usize) -> Self {
        FieldKind::String {
            width,
            uppercase: false,
        }
    }

    pub fn integer() -> Self {
        FieldKind::Integer {
            digits: MAX_INTEGER_DIGITS,
            min: None,
            max: None,
        }
    }

    pub fn integer_range(min: i64, max: i64) -> Self {
        FieldKind::Integer {
            digits: MAX_INTEGER_DIGITS,
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn fixed(precision: u8, scale: u8) -> Self {
        FieldKind::Fixed { precision, scale }
    }

    /// Reject configurations whose values could not be rendered or parsed.
    pub fn check_config(&self) -> Result<(), String> {
        match self {
            FieldKind::Integer { digits, .. } if *digits == 0 || *digits > MAX_INTEGER_DIGITS => {
                Err(format!("integer digits {} outside 1..={}", digits, MAX_INTEGER_DIGITS))
            }
            FieldKind::Fixed { precision, .. }
                if *precision == 0 || *precision > MAX_FIXED_PRECISION =>
            {
                Err(format!(
                    "fixed precision {} outside 1..={}",
                    precision, MAX_FIXED_PRECISION
                ))
            }
            FieldKind::Fixed { precision, scale } if scale > precision => Err(format!(
                "fixed scale {} exceeds precision {}",
                scale, precision
            )),
            _ => Ok(()),
        }
    }

    /// Human-readable type name for help output.
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::String { width, .. } => format!("string({})", width),
            FieldKind::Integer { min, max, .. } => match (min, max) {
                (Some(lo), Some(hi)) => format!("integer {}..{}", lo, hi),
                _ => "integer".to_string(),
            },
            FieldKind::Fixed { precision, scale } => format!("fixed({},{})", precision, scale),
            FieldKind::Code(domain) => domain.type_name().to_string(),
            FieldKind::Date => "date".to_string(),
            FieldKind::Month => "month".to_string(),
            FieldKind::Time => "time".to_string(),
            FieldKind::Timestamp => "timestamp".to_string(),
            FieldKind::Image => "image".to_string(),
            FieldKind::Actor => "actor".to_string(),
        }
    }

    /// Whether values of this kind are persisted.
    pub fn has_storage(&self) -> bool {
        !matches!(self, FieldKind::Actor)
    }

    /// Whether increment/decrement can cycle through values.
    pub fn is_enumerable(&self) -> bool {
        matches!(
            self,
            FieldKind::Integer { .. }
                | FieldKind::Code(_)
                | FieldKind::Date
                | FieldKind::Month
                | FieldKind::Time
                | FieldKind::Timestamp
        )
    }

    /// Check that `value` may be stored in a field of this kind.
    ///
    /// Code values must be valid indices into the domain.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::String { width, .. }, Value::Str(s)) => s.chars().count() <= *width,
            (FieldKind::Integer { digits, min, max }, Value::Int(i)) => {
                numeric::digit_count(i.unsigned_abs()) <= *digits
                    && min.map_or(true, |lo| *i >= lo)
                    && max.map_or(true, |hi| *i <= hi)
            }
            (FieldKind::Fixed { precision, .. }, Value::Fixed(units)) => {
                units.unsigned_abs() <= numeric::fixed_limit(*precision).unsigned_abs()
            }
            (FieldKind::Code(domain), Value::Code(idx)) => *idx < domain.len(),
            // texts carry whole seconds, so finer values would not read back
            (FieldKind::Time, Value::Time(t)) => t.nanosecond() == 0,
            (FieldKind::Timestamp, Value::Timestamp(ts)) => ts.nanosecond() == 0,
            (FieldKind::Date, Value::Date(_))
            | (FieldKind::Month, Value::Month(_))
            | (FieldKind::Image, Value::Image(_)) => true,
            _ => false,
        }
    }

    // ========================================================================
    // Text conversion
    // ========================================================================

    /// Render a value for the editing surface.
    pub fn to_text(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (_, Value::Str(s)) => s.clone(),
            (_, Value::Int(i)) => i.to_string(),
            (FieldKind::Fixed { scale, .. }, Value::Fixed(units)) => {
                numeric::format_fixed(*units, *scale)
            }
            (FieldKind::Code(domain), Value::Code(idx)) => {
                domain.label(*idx).unwrap_or_default().to_string()
            }
            (_, Value::Date(d)) => datetime::format_date(d),
            (_, Value::Month(m)) => datetime::format_month(m),
            (_, Value::Time(t)) => datetime::format_time(t),
            (_, Value::Timestamp(ts)) => datetime::format_timestamp(ts),
            (_, Value::Image(bytes)) => hex_encode(bytes),
            _ => String::new(),
        }
    }

    /// Convert edited text back into a value.
    ///
    /// Code fields accept a label (case-insensitive) or a unique prefix of
    /// one; ambiguity is reported as [`messages::NO_MATCHING_VALUE`] here and
    /// resolved interactively by the field's `check_type`.
    pub fn to_object(&self, text: &str) -> Result<Value, MessageCode> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            FieldKind::String { width, uppercase } => {
                if text.chars().count() > *width {
                    return Err(messages::TEXT_TOO_LONG);
                }
                let s = if *uppercase {
                    text.to_uppercase()
                } else {
                    text.to_string()
                };
                Ok(Value::Str(s))
            }
            FieldKind::Integer { digits, min, max } => {
                let i = numeric::parse_integer(text, *digits)?;
                if min.map_or(false, |lo| i < lo) || max.map_or(false, |hi| i > hi) {
                    return Err(messages::VALUE_OUT_OF_RANGE);
                }
                Ok(Value::Int(i))
            }
            FieldKind::Fixed { precision, scale } => {
                numeric::parse_fixed(text, *precision, *scale).map(Value::Fixed)
            }
            FieldKind::Code(domain) => match domain.resolve(text) {
                super::code::CodeMatch::Empty => Ok(Value::Null),
                super::code::CodeMatch::Unique(idx) => Ok(Value::Code(idx)),
                _ => Err(messages::NO_MATCHING_VALUE),
            },
            FieldKind::Date => datetime::parse_date(text).map(Value::Date),
            FieldKind::Month => datetime::parse_month(text).map(Value::Month),
            FieldKind::Time => datetime::parse_time(text).map(Value::Time),
            FieldKind::Timestamp => datetime::parse_timestamp(text).map(Value::Timestamp),
            FieldKind::Image => hex_decode(text.trim())
                .map(|bytes| Value::Image(bytes).normalized())
                .ok_or(messages::INVALID_IMAGE),
            FieldKind::Actor => Ok(Value::Null),
        }
    }

    /// Cheap check run on every keystroke.
    pub fn check_text(&self, candidate: &str) -> bool {
        match self {
            FieldKind::String { width, .. } => candidate.chars().count() <= *width,
            FieldKind::Integer { digits, min, .. } => {
                numeric::check_integer_text(candidate, *digits)
                    && !(min.map_or(false, |lo| lo >= 0) && candidate.trim_start().starts_with('-'))
            }
            FieldKind::Fixed { precision, scale } => {
                numeric::check_fixed_text(candidate, *precision, *scale)
            }
            FieldKind::Code(domain) => domain.accepts_prefix(candidate),
            FieldKind::Date => datetime::check_partial(candidate, DATE_WIDTH),
            FieldKind::Month => datetime::check_partial(candidate, MONTH_WIDTH),
            FieldKind::Time => datetime::check_partial(candidate, TIME_WIDTH),
            FieldKind::Timestamp => datetime::check_partial(candidate, TIMESTAMP_WIDTH),
            FieldKind::Image => candidate.trim().chars().all(|c| c.is_ascii_hexdigit()),
            FieldKind::Actor => false,
        }
    }

    /// Display width in characters.
    pub fn display_width(&self) -> usize {
        match self {
            FieldKind::String { width, .. } => *width,
            FieldKind::Integer { digits, .. } => *digits + 1,
            FieldKind::Fixed { precision, .. } => usize::from(*precision) + 2,
            FieldKind::Code(domain) => domain
                .labels()
                .iter()
                .map(|l| l.chars().count())
                .max()
                .unwrap_or(0),
            FieldKind::Date => DATE_WIDTH,
            FieldKind::Month => MONTH_WIDTH,
            FieldKind::Time => TIME_WIDTH,
            FieldKind::Timestamp => TIMESTAMP_WIDTH,
            FieldKind::Image | FieldKind::Actor => 0,
        }
    }

    // ========================================================================
    // SQL and storage
    // ========================================================================

    /// SQL literal of a value, `NULL` for null.
    pub fn sql_literal(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => "NULL".to_string(),
            (_, Value::Str(s)) => quote_sql(s),
            (_, Value::Int(i)) => i.to_string(),
            (FieldKind::Fixed { scale, .. }, Value::Fixed(units)) => {
                numeric::format_fixed(*units, *scale)
            }
            (FieldKind::Code(domain), Value::Code(idx)) => domain
                .sql_literal(*idx)
                .unwrap_or_else(|| "NULL".to_string()),
            (_, Value::Date(d)) | (_, Value::Month(d)) => datetime::sql_date(d),
            (_, Value::Time(t)) => datetime::sql_time(t),
            (_, Value::Timestamp(ts)) => datetime::sql_timestamp(ts),
            (_, Value::Image(bytes)) => format!("X'{}'", hex_encode(bytes)),
            _ => "NULL".to_string(),
        }
    }

    /// Persisted representation: code indices become their codes.
    pub fn to_storage(&self, value: &Value) -> Value {
        match (self, value) {
            (FieldKind::Code(domain), Value::Code(idx)) => {
                domain.storage_value(*idx).unwrap_or(Value::Null)
            }
            (FieldKind::Actor, _) => Value::Null,
            _ => value.clone(),
        }
    }

    /// Inverse of [`FieldKind::to_storage`].
    pub fn from_storage(&self, stored: Value) -> Result<Value, MessageCode> {
        let stored = stored.normalized();
        if stored.is_null() {
            return Ok(Value::Null);
        }
        let value = match self {
            FieldKind::Code(domain) => domain
                .index_of_storage(&stored)
                .map(Value::Code)
                .ok_or(messages::NO_MATCHING_VALUE)?,
            FieldKind::Time => match stored {
                Value::Time(t) => Value::Time(datetime::whole_seconds(t)),
                other => other,
            },
            FieldKind::Timestamp => match stored {
                Value::Timestamp(ts) => Value::Timestamp(datetime::whole_seconds(ts)),
                other => other,
            },
            _ => stored,
        };
        if self.accepts(&value) {
            Ok(value)
        } else {
            Err(messages::VALUE_OUT_OF_RANGE)
        }
    }

    /// The value a default of "current" resolves to.
    pub fn current_value(&self) -> Option<Value> {
        match self {
            FieldKind::Date => Some(Value::Date(datetime::today())),
            FieldKind::Month => Some(Value::Month(datetime::this_month())),
            FieldKind::Time => Some(Value::Time(datetime::now_time())),
            FieldKind::Timestamp => Some(Value::Timestamp(datetime::now_timestamp())),
            _ => None,
        }
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::string(DEFAULT_STRING_WIDTH)
    }
}

/// Fixed-point kind with the configured default precision and scale.
pub fn default_fixed() -> FieldKind {
    FieldKind::fixed(DEFAULT_FIXED_PRECISION, DEFAULT_FIXED_SCALE)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_null_renders_empty() {
        for kind in [
            FieldKind::string(10),
            FieldKind::integer(),
            default_fixed(),
            FieldKind::Date,
            FieldKind::Image,
        ] {
            assert_eq!(kind.to_text(&Value::Null), "");
            assert_eq!(kind.to_object(""), Ok(Value::Null));
        }
    }

    #[test]
    fn test_string_width_and_uppercase() {
        let kind = FieldKind::String {
            width: 3,
            uppercase: true,
        };
        assert_eq!(kind.to_object("abc"), Ok(Value::Str("ABC".into())));
        assert_eq!(kind.to_object("abcd"), Err(messages::TEXT_TOO_LONG));
        assert!(!kind.check_text("abcd"));
    }

    #[test]
    fn test_integer_range() {
        let kind = FieldKind::integer_range(1, 10);
        assert_eq!(kind.to_object("10"), Ok(Value::Int(10)));
        assert_eq!(kind.to_object("11"), Err(messages::VALUE_OUT_OF_RANGE));
        assert!(!kind.check_text("-"));
        assert!(kind.accepts(&Value::Int(5)));
        assert!(!kind.accepts(&Value::Int(0)));
    }

    #[test]
    fn test_integer_extremes_read_back() {
        let kind = FieldKind::integer();
        for i in [i64::MAX, i64::MIN, 0] {
            assert!(kind.accepts(&Value::Int(i)));
            assert_eq!(kind.to_object(&kind.to_text(&Value::Int(i))), Ok(Value::Int(i)));
        }
        assert_eq!(
            kind.to_object("9223372036854775808"),
            Err(messages::VALUE_OUT_OF_RANGE)
        );

        let narrow = FieldKind::Integer {
            digits: 3,
            min: None,
            max: None,
        };
        assert!(narrow.accepts(&Value::Int(-999)));
        assert!(!narrow.accepts(&Value::Int(1000)));
    }

    #[test]
    fn test_check_config() {
        assert_eq!(FieldKind::fixed(15, 2).check_config(), Ok(()));
        assert_eq!(FieldKind::fixed(2, 2).check_config(), Ok(()));
        assert!(FieldKind::fixed(4, 5).check_config().is_err());
        assert!(FieldKind::fixed(19, 0).check_config().is_err());
        assert!(FieldKind::fixed(0, 0).check_config().is_err());
        assert!(FieldKind::Integer {
            digits: 20,
            min: None,
            max: None
        }
        .check_config()
        .is_err());
    }

    #[test]
    fn test_times_hold_whole_seconds() {
        let exact = NaiveTime::from_hms_opt(13, 45, 10).unwrap();
        let fine = NaiveTime::from_hms_nano_opt(13, 45, 10, 500).unwrap();
        assert!(FieldKind::Time.accepts(&Value::Time(exact)));
        assert!(!FieldKind::Time.accepts(&Value::Time(fine)));

        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert!(!FieldKind::Timestamp.accepts(&Value::Timestamp(day.and_time(fine))));

        // stored values lose the fraction instead of being refused
        assert_eq!(
            FieldKind::Time.from_storage(Value::Time(fine)),
            Ok(Value::Time(exact))
        );
        assert_eq!(
            FieldKind::Timestamp.from_storage(Value::Timestamp(day.and_time(fine))),
            Ok(Value::Timestamp(day.and_time(exact)))
        );
    }

    #[test]
    fn test_fixed_roundtrip_text() {
        let kind = FieldKind::fixed(7, 2);
        let value = kind.to_object("-12.3").unwrap();
        assert_eq!(value, Value::Fixed(-1230));
        assert_eq!(kind.to_text(&value), "-12.30");
        assert_eq!(kind.sql_literal(&value), "-12.30");
    }

    #[test]
    fn test_code_conversion() {
        let kind = FieldKind::Code(CodeDomain::integer(&[("Mon", 1), ("Tue", 2)]));
        assert_eq!(kind.to_object("tue"), Ok(Value::Code(1)));
        assert_eq!(kind.to_text(&Value::Code(1)), "Tue");
        assert_eq!(kind.sql_literal(&Value::Code(0)), "1");
        assert_eq!(kind.to_storage(&Value::Code(1)), Value::Int(2));
        assert_eq!(kind.from_storage(Value::Int(1)), Ok(Value::Code(0)));
        assert_eq!(kind.from_storage(Value::Int(9)), Err(messages::NO_MATCHING_VALUE));
        assert!(!kind.accepts(&Value::Code(2)));
    }

    #[test]
    fn test_date_sql() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(FieldKind::Date.sql_literal(&Value::Date(d)), "DATE '2024-02-29'");
        assert_eq!(FieldKind::Date.to_text(&Value::Date(d)), "29.02.2024");
    }

    #[test]
    fn test_image_hex() {
        let kind = FieldKind::Image;
        let value = kind.to_object("00ff10").unwrap();
        assert_eq!(value, Value::Image(vec![0x00, 0xff, 0x10]));
        assert_eq!(kind.to_text(&value), "00ff10");
        assert_eq!(kind.sql_literal(&value), "X'00ff10'");
        assert_eq!(kind.to_object("0g"), Err(messages::INVALID_IMAGE));
    }

    #[test]
    fn test_actor_has_no_value() {
        let kind = FieldKind::Actor;
        assert!(!kind.has_storage());
        assert!(!kind.check_text("x"));
        assert_eq!(kind.to_object("x"), Ok(Value::Null));
        assert!(!kind.accepts(&Value::Int(1)));
    }

    #[test]
    fn test_mismatched_value_rejected() {
        assert!(!FieldKind::integer().accepts(&Value::Str("1".into())));
        assert!(!FieldKind::Date.accepts(&Value::Month(NaiveDate::MIN)));
    }
}
