//! Common types and utilities shared across visforms.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and identifiers (re-exported from `visforms-core`)
//! - Message codes
//! - Error types

pub mod error;

pub use error::{Error, FieldError, Result};
pub use visforms_core::config;
pub use visforms_core::messages;
pub use visforms_core::{BlockId, FieldId, MessageCode, Mode, ModeSet, SearchOperator, SortOrder};
