//! Error types for visforms.
//!
//! Every failure the runtime raises falls into one of three categories:
//! - **Field validation** ([`Error::Field`]): local to one field, the caller
//!   refocuses the field and lets the user correct the input.
//! - **Execution failure** ([`Error::ExecFailed`], [`Error::Aborted`]): the
//!   current command is abandoned; the block stays rollback-capable.
//! - **Internal inconsistency** ([`Error::Internal`]): a bug or a
//!   configuration error. Never recovered automatically.

use thiserror::Error;

use crate::field::Value;
use visforms_core::{FieldId, MessageCode};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A field rejected its input.
///
/// Carries the offending field so the presentation layer can move focus
/// back to it, and optionally the value to restore.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {code} ({})", .code.describe())]
pub struct FieldError {
    /// The field that failed validation.
    pub field: FieldId,
    /// What went wrong.
    pub code: MessageCode,
    /// Message arguments, substituted by the presentation layer.
    pub args: Vec<String>,
    /// Value to put back into the field, if the caller wants to revert.
    pub rollback: Option<Value>,
}

impl FieldError {
    /// Create a new FieldError without arguments or rollback value.
    pub fn new(field: FieldId, code: MessageCode) -> Self {
        Self {
            field,
            code,
            args: Vec::new(),
            rollback: None,
        }
    }

    /// Attach a message argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Attach the value the field should revert to.
    pub fn with_rollback(mut self, value: Value) -> Self {
        self.rollback = Some(value);
        self
    }
}

/// All possible errors in visforms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A field rejected its input.
    #[error("field validation failed: {0}")]
    Field(#[from] FieldError),

    /// The command could not be executed.
    ///
    /// Deadlocks and interruptions carry only a code; SQL failures carry
    /// the storage message.
    #[error("execution failed: {}", describe_exec(.code, .message))]
    ExecFailed {
        code: Option<MessageCode>,
        message: Option<String>,
    },

    /// Silent abort: the user declined a confirmation or cancelled a dialog.
    #[error("aborted")]
    Aborted,

    /// Navigation found no further filled, non-deleted record.
    #[error("no further record")]
    NoData,

    /// A code path that must never be reached in correct operation.
    ///
    /// This indicates a bug or a broken form definition.
    #[error("internal inconsistency: {0}")]
    Internal(String),
}

impl Error {
    /// Execution failure identified by a message code.
    pub fn exec(code: MessageCode) -> Self {
        Error::ExecFailed {
            code: Some(code),
            message: None,
        }
    }

    /// Execution failure carrying a storage message.
    pub fn exec_message(message: impl Into<String>) -> Self {
        Error::ExecFailed {
            code: None,
            message: Some(message.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Field error shortcut.
    pub fn field(field: FieldId, code: MessageCode) -> Self {
        Error::Field(FieldError::new(field, code))
    }

    /// The field to refocus, if this is a field validation failure.
    pub fn field_id(&self) -> Option<FieldId> {
        match self {
            Error::Field(e) => Some(e.field),
            _ => None,
        }
    }

    /// The message code to show, if any.
    pub fn code(&self) -> Option<MessageCode> {
        match self {
            Error::Field(e) => Some(e.code),
            Error::ExecFailed { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exec(code: &Option<MessageCode>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!("{} {}", code, message),
        (Some(code), None) => format!("{} ({})", code, code.describe()),
        (None, Some(message)) => message.clone(),
        (None, None) => "unspecified".to_string(),
    }
}
