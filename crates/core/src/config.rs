//! Configuration constants for visforms.

/// Number of record slots a block buffers when the builder is not told otherwise.
///
/// Single-record blocks still buffer several rows so that a query result
/// can be browsed record by record without going back to storage.
pub const DEFAULT_BUFFER_SIZE: usize = 16;

/// Number of records visible at once for a single-record block.
pub const DEFAULT_DISPLAY_SIZE: usize = 1;

/// Maximum number of characters a string field accepts by default.
pub const DEFAULT_STRING_WIDTH: usize = 255;

/// Maximum number of digits an integer field accepts.
///
/// Every `i64` renders in at most 19 digits, so any integer a field holds
/// reads back from its own text.
pub const MAX_INTEGER_DIGITS: usize = 19;

/// Largest precision of a fixed-point field; its units must fit in `i64`.
pub const MAX_FIXED_PRECISION: u8 = 18;

/// Default total digits of a fixed-point field.
pub const DEFAULT_FIXED_PRECISION: u8 = 15;

/// Default digits after the decimal separator of a fixed-point field.
pub const DEFAULT_FIXED_SCALE: u8 = 2;

/// Decimal separator used by the text editing surface.
pub const DECIMAL_SEPARATOR: char = '.';

/// Text format of date fields (chrono `strftime` syntax).
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Text format of month fields.
pub const MONTH_FORMAT: &str = "%m.%Y";

/// Text format of time fields.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Text format of timestamp fields.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fits_buffer() {
        assert!(DEFAULT_DISPLAY_SIZE <= DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_fixed_scale_within_precision() {
        assert!(DEFAULT_FIXED_SCALE < DEFAULT_FIXED_PRECISION);
        assert!(DEFAULT_FIXED_PRECISION <= MAX_FIXED_PRECISION);
        assert!(10i64.checked_pow(u32::from(MAX_FIXED_PRECISION)).is_some());
    }
}
