//! Core types and constants for visforms.
//!
//! This crate provides the dependency-free primitives shared by every layer
//! of the block runtime:
//!
//! # Types
//! - [`BlockId`] - Index of a block inside its form
//! - [`FieldId`] - A field, addressed by its owning block and position
//! - [`Mode`] / [`ModeSet`] - Block modes and mode predicates for commands
//! - [`SearchOperator`] - Query-by-example comparison operators
//! - [`SortOrder`] - Natural ordering of a field's values
//!
//! # Messages
//! - [`MessageCode`] - Stable identifiers resolved to text by the presentation layer
//!
//! # Constants
//! - [`config`] - Default sizes and text formats
//!
//! # Example
//! ```
//! use visforms_core::{Mode, ModeSet, BlockId, FieldId};
//!
//! let field = FieldId::new(BlockId::new(0), 3);
//! assert_eq!(field.block, BlockId::new(0));
//!
//! let active = ModeSet::QUERY | ModeSet::UPDATE;
//! assert!(active.contains(Mode::Update));
//! assert!(!active.contains(Mode::Insert));
//! ```

// Declare modules
pub mod config;
pub mod messages;
pub mod types;

// Re-export commonly used items at crate root
pub use messages::MessageCode;
pub use types::{BlockId, FieldId, Mode, ModeSet, SearchOperator, SortOrder};
