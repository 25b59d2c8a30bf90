//! Command dispatch.
//!
//! ```text
//!   Window::submit ──► action queue (FIFO) ──► Form::invoke(block, "save")
//!                                                 │
//!                        activation predicate ◄───┤
//!                                                 ▼
//!                              commands::save_block(form, block)
//!                                                 │
//!                                  Form::in_transaction ──► Persistence
//!                                                 │
//!                                   classify(failure) ──► Error
//! ```
//!
//! # Components
//! - [`Command`] / [`CommandOp`] - Named, mode-gated operations of a block
//! - [`commands`] - The predefined operations
//! - [`Window`] / [`Action`] - Serialized execution of user actions
//! - [`DispatchStats`] - Counters

mod classify;
mod command;
pub mod commands;
mod queue;
mod stats;
mod txn;

pub(crate) use classify::classify;
pub use command::{Command, CommandBinding, CommandOp};
pub use queue::{Action, ActionOutcome, Cancellation, ExecMode, Window};
pub use stats::{DispatchSnapshot, DispatchStats};

use tracing::{debug, info};

use crate::buffer::Direction;
use crate::common::messages::COMMAND_INACTIVE;
use crate::common::{BlockId, Error, Result};
use crate::form::Form;

impl Form {
    /// Run the command named `command` of block `id`.
    ///
    /// Inactive commands fail with `COMMAND_INACTIVE`. Field operations
    /// work on the bound field or, for block commands, the active field.
    pub fn invoke(&mut self, id: BlockId, command: &str) -> Result<()> {
        let block = self.get(id)?;
        let cmd = block
            .command(command)
            .cloned()
            .ok_or_else(|| Error::internal(format!("{} has no command {}", block.name(), command)))?;
        if !cmd.is_active(block.mode()) {
            debug!(block = %block.name(), command, mode = %block.mode(), "command inactive");
            return Err(Error::exec(COMMAND_INACTIVE));
        }
        let field = match cmd.binding() {
            CommandBinding::Field(index) => Some(index),
            CommandBinding::Block => block.active_field(),
        };

        DispatchStats::bump(&self.stats.commands);
        info!(block = %block.name(), command, op = %cmd.op(), "dispatch");
        let result = execute(self, id, cmd.op(), field);
        if let Err(err) = &result {
            debug!(command, error = %err, "command failed");
        }
        result
    }
}

fn require_field(op: CommandOp, field: Option<usize>) -> Result<usize> {
    field.ok_or_else(|| {
        debug!(%op, "no field to work on");
        Error::exec(COMMAND_INACTIVE)
    })
}

fn execute(form: &mut Form, id: BlockId, op: CommandOp, field: Option<usize>) -> Result<()> {
    match op {
        CommandOp::MenuQuery => commands::menu_query(form, id),
        CommandOp::RecursiveQuery => commands::recursive_query(form, id),
        CommandOp::QueryMove => commands::query_move(form, id),
        CommandOp::SerialQuery => commands::serial_query(form, id),
        CommandOp::InsertMode => form.insert_mode(id),
        CommandOp::SaveBlock => commands::save_block(form, id),
        CommandOp::DeleteBlock => commands::delete_block(form, id),
        CommandOp::InsertLine => commands::insert_line(form, id),
        CommandOp::ChangeBlock => commands::change_block(form, id),
        CommandOp::SetSearchOperator => {
            commands::set_search_operator(form, id, require_field(op, field)?, None)
        }
        CommandOp::Increment => commands::enumerate(form, id, require_field(op, field)?, false),
        CommandOp::Decrement => commands::enumerate(form, id, require_field(op, field)?, true),
        CommandOp::Reset => form.reset_block(id),
        CommandOp::NextRecord => commands::navigate(form, id, Direction::Forward),
        CommandOp::PreviousRecord => commands::navigate(form, id, Direction::Backward),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::common::{messages, Mode};
    use crate::field::{FieldBuilder, FieldKind, Value};
    use crate::form::FormBuilder;
    use crate::persistence::MemoryPersistence;

    const EMP: BlockId = BlockId(0);

    fn form(db: &MemoryPersistence) -> Form {
        FormBuilder::new("staff")
            .block(
                BlockBuilder::new("emp")
                    .table("emp")
                    .field(FieldBuilder::new("name", FieldKind::string(20)))
                    .field(FieldBuilder::new("age", FieldKind::integer()))
                    .command(Command::new("older", CommandOp::Increment).on_field("age"))
                    .standard_commands(),
            )
            .persistence(db.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_invoke_unknown_command() {
        let mut form = form(&MemoryPersistence::new());
        assert!(matches!(form.invoke(EMP, "fly"), Err(Error::Internal(_))));
    }

    #[test]
    fn test_invoke_inactive_command() {
        let mut form = form(&MemoryPersistence::new());
        assert_eq!(form.invoke(EMP, "save"), Err(Error::exec(messages::COMMAND_INACTIVE)));
        assert_eq!(form.stats().snapshot().commands, 0);
    }

    #[test]
    fn test_invoke_query_then_delete() {
        let db = MemoryPersistence::new();
        db.insert_row("emp", vec![("name", Value::Str("Ada".into()))]);
        let mut form = form(&db);

        form.invoke(EMP, "query").unwrap();
        assert_eq!(form.block(EMP).unwrap().mode(), Mode::Update);
        form.invoke(EMP, "delete").unwrap();
        assert_eq!(form.block(EMP).unwrap().mode(), Mode::Query);
        assert_eq!(form.stats().snapshot().commands, 2);
        assert_eq!(form.stats().snapshot().transactions_committed, 2);
    }

    #[test]
    fn test_invoke_field_bound_command() {
        let mut form = form(&MemoryPersistence::new());
        form.invoke(EMP, "insert").unwrap();

        form.invoke(EMP, "older").unwrap();
        assert_eq!(form.block(EMP).unwrap().field(1).unwrap().int(0), Some(0));
    }
}
