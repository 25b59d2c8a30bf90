//! Stable message codes.
//!
//! The runtime never carries prose. Every validation or execution failure,
//! confirmation prompt and dialog title is a [`MessageCode`]; the
//! presentation layer maps codes to locale-specific strings.

use std::fmt;

/// A stable message identifier such as `VIS-00003`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageCode(pub u16);

impl MessageCode {
    /// Create a new MessageCode.
    #[inline]
    pub const fn new(number: u16) -> Self {
        MessageCode(number)
    }

    /// Numeric part of the code.
    #[inline]
    pub fn number(&self) -> u16 {
        self.0
    }

    /// Short English description, used by help output and logs only.
    pub fn describe(&self) -> &'static str {
        match *self {
            INTEGER_EXPECTED => "integer expected",
            FIXED_EXPECTED => "number expected",
            NO_MATCHING_VALUE => "no matching value",
            INVALID_DATE => "invalid date",
            INVALID_TIME => "invalid time",
            INVALID_MONTH => "invalid month",
            INVALID_TIMESTAMP => "invalid timestamp",
            TEXT_TOO_LONG => "text too long",
            NO_FURTHER_VALUE => "no further value",
            VALUE_REQUIRED => "value required",
            DISCARD_CHANGES => "discard changes?",
            SAVE_UNCHANGED => "record unchanged, save anyway?",
            NOT_ALLOWED_IN_MODE => "not allowed in current mode",
            NOT_ALLOWED_ON_MULTI => "not allowed on multi-record block",
            SELECT_BLOCK => "select block",
            SELECT_VALUE => "select value",
            NO_OTHER_BLOCK => "no other block available",
            NO_VALUE_SELECTED => "no value selected",
            CONFIRM_DELETE => "delete record?",
            NO_RECORDS_FOUND => "no records found",
            BUFFER_FULL => "record buffer full",
            VALUE_OUT_OF_RANGE => "value out of range",
            NOT_ENUMERABLE => "field has no value list",
            SELECT_OPERATOR => "select search operator",
            INVALID_IMAGE => "invalid image data",
            RECORD_EMPTY => "record is empty",
            COMMAND_INACTIVE => "command not available",
            ONLY_ON_MULTI => "only allowed on multi-record block",
            EXEC_INTERRUPTED => "operation failed, please retry",
            _ => "unknown message",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VIS-{:05}", self.0)
    }
}

// ============================================================================
// FIELD VALIDATION
// ============================================================================

pub const INTEGER_EXPECTED: MessageCode = MessageCode::new(1);
pub const FIXED_EXPECTED: MessageCode = MessageCode::new(2);
pub const NO_MATCHING_VALUE: MessageCode = MessageCode::new(3);
pub const INVALID_DATE: MessageCode = MessageCode::new(4);
pub const INVALID_TIME: MessageCode = MessageCode::new(5);
pub const INVALID_MONTH: MessageCode = MessageCode::new(6);
pub const INVALID_TIMESTAMP: MessageCode = MessageCode::new(7);
pub const TEXT_TOO_LONG: MessageCode = MessageCode::new(8);
pub const NO_FURTHER_VALUE: MessageCode = MessageCode::new(9);
pub const VALUE_REQUIRED: MessageCode = MessageCode::new(10);

// ============================================================================
// PROMPTS AND DIALOG TITLES
// ============================================================================

pub const DISCARD_CHANGES: MessageCode = MessageCode::new(11);
pub const SAVE_UNCHANGED: MessageCode = MessageCode::new(12);
pub const SELECT_BLOCK: MessageCode = MessageCode::new(15);
pub const SELECT_VALUE: MessageCode = MessageCode::new(16);
pub const CONFIRM_DELETE: MessageCode = MessageCode::new(19);
pub const SELECT_OPERATOR: MessageCode = MessageCode::new(24);

// ============================================================================
// EXECUTION
// ============================================================================

pub const NOT_ALLOWED_IN_MODE: MessageCode = MessageCode::new(13);
pub const NOT_ALLOWED_ON_MULTI: MessageCode = MessageCode::new(14);
pub const NO_OTHER_BLOCK: MessageCode = MessageCode::new(17);
pub const NO_VALUE_SELECTED: MessageCode = MessageCode::new(18);
pub const NO_RECORDS_FOUND: MessageCode = MessageCode::new(20);
pub const BUFFER_FULL: MessageCode = MessageCode::new(21);
pub const VALUE_OUT_OF_RANGE: MessageCode = MessageCode::new(22);
pub const NOT_ENUMERABLE: MessageCode = MessageCode::new(23);
pub const INVALID_IMAGE: MessageCode = MessageCode::new(25);
pub const RECORD_EMPTY: MessageCode = MessageCode::new(26);
pub const COMMAND_INACTIVE: MessageCode = MessageCode::new(27);
pub const ONLY_ON_MULTI: MessageCode = MessageCode::new(28);

/// Deadlock or interrupted connection. The raw storage message is never shown.
pub const EXEC_INTERRUPTED: MessageCode = MessageCode::new(58);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_code_display() {
        assert_eq!(format!("{}", NO_MATCHING_VALUE), "VIS-00003");
        assert_eq!(format!("{}", EXEC_INTERRUPTED), "VIS-00058");
    }

    #[test]
    fn test_message_code_describe() {
        assert_eq!(VALUE_REQUIRED.describe(), "value required");
        assert_eq!(MessageCode::new(999).describe(), "unknown message");
    }
}
