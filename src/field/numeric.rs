//! Numeric text handling for integer and fixed-point fields.
//!
//! The `check_*` functions run on every keystroke and accept *partial*
//! input ("-", "12."); the `parse_*` functions run on field exit and
//! require a complete number.

use crate::common::config::DECIMAL_SEPARATOR;
use crate::common::messages;
use crate::common::MessageCode;

/// Scanner state while walking numeric text left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumState {
    Start,
    Sign,
    Integer,
    Separator,
    Fraction,
}

/// Digit counts of a well-formed numeric text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumShape {
    state: NumState,
    leading_zeros: usize,
    int_digits: usize,
    frac_digits: usize,
}

/// Walk `text` through the numeric state machine.
///
/// Returns `None` as soon as a character is illegal in the current state.
fn scan(text: &str, allow_separator: bool) -> Option<NumShape> {
    let mut shape = NumShape {
        state: NumState::Start,
        leading_zeros: 0,
        int_digits: 0,
        frac_digits: 0,
    };

    for c in text.chars() {
        shape.state = match (shape.state, c) {
            (NumState::Start, '-' | '+') => NumState::Sign,
            (NumState::Start | NumState::Sign | NumState::Integer, d) if d.is_ascii_digit() => {
                // leading zeros carry no magnitude
                if d == '0' && shape.int_digits == 0 {
                    shape.leading_zeros += 1;
                } else {
                    shape.int_digits += 1;
                }
                NumState::Integer
            }
            (NumState::Start | NumState::Sign | NumState::Integer, s)
                if s == DECIMAL_SEPARATOR && allow_separator =>
            {
                NumState::Separator
            }
            (NumState::Separator | NumState::Fraction, d) if d.is_ascii_digit() => {
                shape.frac_digits += 1;
                NumState::Fraction
            }
            _ => return None,
        };
    }

    Some(shape)
}

// ============================================================================
// Integers
// ============================================================================

/// Incremental check for integer input.
pub fn check_integer_text(candidate: &str, max_digits: usize) -> bool {
    match scan(candidate.trim(), false) {
        Some(shape) => shape.int_digits <= max_digits,
        None => false,
    }
}

/// Parse complete integer text.
pub fn parse_integer(text: &str, max_digits: usize) -> Result<i64, MessageCode> {
    let text = text.trim();
    let shape = scan(text, false).ok_or(messages::INTEGER_EXPECTED)?;
    if shape.state != NumState::Integer {
        return Err(messages::INTEGER_EXPECTED);
    }
    if shape.int_digits > max_digits {
        return Err(messages::TEXT_TOO_LONG);
    }
    text.parse::<i64>()
        .map_err(|_| messages::VALUE_OUT_OF_RANGE)
}

// ============================================================================
// Fixed-point
// ============================================================================

/// Incremental check for fixed-point input.
pub fn check_fixed_text(candidate: &str, precision: u8, scale: u8) -> bool {
    let max_int = usize::from(precision.saturating_sub(scale));
    match scan(candidate.trim(), scale > 0) {
        Some(shape) => shape.int_digits <= max_int && shape.frac_digits <= usize::from(scale),
        None => false,
    }
}

/// Parse complete fixed-point text into scaled units.
///
/// `"12.5"` at scale 2 becomes `1250`.
pub fn parse_fixed(text: &str, precision: u8, scale: u8) -> Result<i64, MessageCode> {
    let text = text.trim();
    let shape = scan(text, scale > 0).ok_or(messages::FIXED_EXPECTED)?;
    if shape.leading_zeros + shape.int_digits + shape.frac_digits == 0 {
        return Err(messages::FIXED_EXPECTED);
    }
    if shape.int_digits > usize::from(precision.saturating_sub(scale))
        || shape.frac_digits > usize::from(scale)
    {
        return Err(messages::VALUE_OUT_OF_RANGE);
    }

    let negative = text.starts_with('-');
    let unsigned = text.trim_start_matches(['-', '+']);
    let (int_part, frac_part) = match unsigned.split_once(DECIMAL_SEPARATOR) {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    let mut units: i64 = 0;
    for d in int_part.chars().chain(frac_part.chars()) {
        let digit = i64::from(d.to_digit(10).ok_or(messages::FIXED_EXPECTED)?);
        units = units
            .checked_mul(10)
            .and_then(|u| u.checked_add(digit))
            .ok_or(messages::VALUE_OUT_OF_RANGE)?;
    }
    for _ in frac_part.len()..usize::from(scale) {
        units = units.checked_mul(10).ok_or(messages::VALUE_OUT_OF_RANGE)?;
    }

    Ok(if negative { -units } else { units })
}

/// Render scaled units as text (`1250` at scale 2 is `"12.50"`).
pub fn format_fixed(units: i64, scale: u8) -> String {
    if scale == 0 {
        return units.to_string();
    }
    let scale = usize::from(scale);
    let digits = format!("{:0>width$}", units.unsigned_abs(), width = scale + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - scale);
    let sign = if units < 0 { "-" } else { "" };
    format!("{}{}{}{}", sign, int_part, DECIMAL_SEPARATOR, frac_part)
}

/// Digits needed to write `n` in decimal.
pub fn digit_count(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Number of digits in the largest value a fixed field can hold, as units.
pub fn fixed_limit(precision: u8) -> i64 {
    10i64.checked_pow(u32::from(precision)).map_or(i64::MAX, |p| p - 1)
}
