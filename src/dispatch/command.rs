//! Command definitions.

use std::fmt;

use crate::common::{Mode, ModeSet};

/// The predefined operation a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandOp {
    MenuQuery,
    RecursiveQuery,
    QueryMove,
    SerialQuery,
    InsertMode,
    SaveBlock,
    DeleteBlock,
    InsertLine,
    ChangeBlock,
    SetSearchOperator,
    Increment,
    Decrement,
    Reset,
    NextRecord,
    PreviousRecord,
}

impl CommandOp {
    /// Modes a command of this kind is active in unless configured otherwise.
    pub fn default_modes(self) -> ModeSet {
        match self {
            CommandOp::MenuQuery
            | CommandOp::RecursiveQuery
            | CommandOp::QueryMove
            | CommandOp::SerialQuery
            | CommandOp::SetSearchOperator => ModeSet::QUERY,
            CommandOp::InsertMode => ModeSet::QUERY | ModeSet::UPDATE,
            CommandOp::SaveBlock | CommandOp::InsertLine => ModeSet::EDIT,
            CommandOp::DeleteBlock => ModeSet::UPDATE,
            CommandOp::NextRecord | CommandOp::PreviousRecord => ModeSet::UPDATE,
            CommandOp::ChangeBlock
            | CommandOp::Increment
            | CommandOp::Decrement
            | CommandOp::Reset => ModeSet::ALL,
        }
    }

    /// Default menu label.
    pub fn label(self) -> &'static str {
        match self {
            CommandOp::MenuQuery => "Query",
            CommandOp::RecursiveQuery => "Query with details",
            CommandOp::QueryMove => "Query and continue",
            CommandOp::SerialQuery => "Query all following",
            CommandOp::InsertMode => "Insert",
            CommandOp::SaveBlock => "Save",
            CommandOp::DeleteBlock => "Delete",
            CommandOp::InsertLine => "Insert line",
            CommandOp::ChangeBlock => "Change block",
            CommandOp::SetSearchOperator => "Search operator",
            CommandOp::Increment => "Next value",
            CommandOp::Decrement => "Previous value",
            CommandOp::Reset => "Reset",
            CommandOp::NextRecord => "Next record",
            CommandOp::PreviousRecord => "Previous record",
        }
    }

    /// Whether the operation works on a single field.
    pub fn targets_field(self) -> bool {
        matches!(
            self,
            CommandOp::SetSearchOperator | CommandOp::Increment | CommandOp::Decrement
        )
    }

    /// Whether the operation opens a persistence transaction.
    pub fn touches_persistence(self) -> bool {
        matches!(
            self,
            CommandOp::MenuQuery
                | CommandOp::RecursiveQuery
                | CommandOp::QueryMove
                | CommandOp::SerialQuery
                | CommandOp::SaveBlock
                | CommandOp::DeleteBlock
        )
    }
}

impl fmt::Display for CommandOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a command is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBinding {
    /// The block; field operations use the active field.
    Block,
    /// A field of the block, by index.
    Field(usize),
}

/// A named, mode-gated operation of a block.
///
/// # Example
/// ```
/// use visforms::common::{Mode, ModeSet};
/// use visforms::dispatch::{Command, CommandOp};
///
/// let save = Command::new("save", CommandOp::SaveBlock);
/// assert!(save.is_active(Mode::Insert));
/// assert!(!save.is_active(Mode::Query));
///
/// let next_day = Command::new("next_day", CommandOp::Increment)
///     .on_field("day")
///     .modes(ModeSet::EDIT);
/// assert_eq!(next_day.target(), Some("day"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    label: String,
    binding: CommandBinding,
    /// Field name, resolved into `binding` when the block is built.
    target: Option<String>,
    modes: ModeSet,
    op: CommandOp,
}

impl Command {
    pub fn new(name: impl Into<String>, op: CommandOp) -> Self {
        Self {
            name: name.into(),
            label: op.label().to_string(),
            binding: CommandBinding::Block,
            target: None,
            modes: op.default_modes(),
            op,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Override the activation predicate.
    pub fn modes(mut self, modes: ModeSet) -> Self {
        self.modes = modes;
        self
    }

    /// Bind the command to a field of its block.
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.target = Some(field.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_label(&self) -> &str {
        &self.label
    }

    pub fn op(&self) -> CommandOp {
        self.op
    }

    pub fn binding(&self) -> CommandBinding {
        self.binding
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn active_modes(&self) -> ModeSet {
        self.modes
    }

    /// Activation predicate over block modes.
    pub fn is_active(&self, mode: Mode) -> bool {
        self.modes.contains(mode)
    }

    pub(crate) fn bind(&mut self, binding: CommandBinding) {
        self.binding = binding;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_modes() {
        let query = Command::new("q", CommandOp::MenuQuery);
        assert!(query.is_active(Mode::Query));
        assert!(!query.is_active(Mode::Update));

        let insert = Command::new("i", CommandOp::InsertMode);
        assert!(insert.is_active(Mode::Update));
        assert!(!insert.is_active(Mode::Insert));
    }

    #[test]
    fn test_modes_override() {
        let cmd = Command::new("r", CommandOp::Reset).modes(ModeSet::QUERY);
        assert!(!cmd.is_active(Mode::Insert));
        assert_eq!(cmd.active_modes(), ModeSet::QUERY);
    }

    #[test]
    fn test_label_defaults_to_op() {
        let cmd = Command::new("s", CommandOp::SaveBlock);
        assert_eq!(cmd.display_label(), "Save");
        assert_eq!(cmd.label("Store").display_label(), "Store");
    }

    #[test]
    fn test_field_ops() {
        assert!(CommandOp::Increment.targets_field());
        assert!(!CommandOp::SaveBlock.targets_field());
        assert!(CommandOp::DeleteBlock.touches_persistence());
        assert!(!CommandOp::InsertLine.touches_persistence());
    }
}
