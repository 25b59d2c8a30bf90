//! visforms - A runtime engine for data-entry blocks bound to database tables.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           visforms                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Dispatch Layer (dispatch/)                  │   │
//! │  │   Window + FIFO action queue → Form::invoke → commands   │   │
//! │  │   TransactionGuard + failure classification + stats      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Mode State Machine (form/)                     │   │
//! │  │      QUERY ⇄ UPDATE → INSERT, validation, triggers       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Blocks (block/)                             │   │
//! │  │      fields + record buffer + cursor + event stream      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │   Fields (field/)            Record Buffer (buffer/)     │   │
//! │  │   value model, text ⇄ value  slot flags, trail/rollback  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Collaborators:  Persistence (persistence/)                     │
//! │                  Presentation (presentation/)                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (BlockId, FieldId, Mode, Error, config)
//! - [`buffer`] - Record slots, trail and rollback
//! - [`field`] - Field kinds, values and conversions
//! - [`block`] - Blocks and their builder
//! - [`form`] - Forms, trigger hooks and the mode state machine
//! - [`dispatch`] - Commands, transactions and the action queue
//! - [`persistence`] - Storage collaborator and an in-memory implementation
//! - [`presentation`] - UI collaborator and a scripted implementation
//! - [`help`] - Help text generation
//!
//! # Quick Start
//! ```
//! use visforms::block::BlockBuilder;
//! use visforms::common::{BlockId, Mode};
//! use visforms::field::{FieldBuilder, FieldKind, Value};
//! use visforms::form::FormBuilder;
//! use visforms::persistence::MemoryPersistence;
//!
//! let db = MemoryPersistence::new();
//! db.insert_row("emp", vec![("name", Value::Str("Ada".into()))]);
//!
//! let mut form = FormBuilder::new("staff")
//!     .block(BlockBuilder::new("emp").table("emp")
//!         .field(FieldBuilder::new("name", FieldKind::string(40)))
//!         .standard_commands())
//!     .persistence(db)
//!     .build()
//!     .unwrap();
//!
//! let emp = BlockId::new(0);
//! form.invoke(emp, "query").unwrap();
//! assert_eq!(form.block(emp).unwrap().mode(), Mode::Update);
//! ```

pub mod block;
pub mod buffer;
pub mod common;
pub mod dispatch;
pub mod field;
pub mod form;
pub mod help;
pub mod persistence;
pub mod presentation;

// Re-export commonly used items at crate root for convenience
pub use common::{BlockId, Error, FieldError, FieldId, MessageCode, Mode, Result};

pub use block::{Block, BlockBuilder, BlockEvent};
pub use dispatch::{Action, Command, CommandOp, DispatchStats, Window};
pub use field::{FieldBuilder, FieldKind, Value};
pub use form::{Form, FormBuilder, FormFlavor, Trigger, Triggers};
pub use persistence::{MemoryPersistence, Persistence, PersistenceError};
pub use presentation::{Presentation, ScriptedPresentation};
