//! Help text generation.
//!
//! Introspects a form's blocks, fields and commands into a [`HelpDocument`]
//! that the presentation layer can render as it likes; `Display` gives a
//! plain-text rendering.

use std::fmt;

use crate::block::Block;
use crate::common::{Mode, ModeSet};
use crate::field::{Field, FieldKind};
use crate::form::Form;

/// Description of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHelp {
    pub name: String,
    pub label: String,
    pub type_name: String,
    pub mandatory: bool,
    pub enterable: bool,
    pub column: Option<String>,
    /// Labels of a code domain, empty for other kinds.
    pub codes: Vec<String>,
}

/// Description of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHelp {
    pub name: String,
    pub label: String,
    pub modes: ModeSet,
    /// Field the command is bound to, if any.
    pub field: Option<String>,
}

/// Description of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHelp {
    pub name: String,
    pub title: String,
    pub table: Option<String>,
    pub mode: Mode,
    pub multi: bool,
    pub master: Option<String>,
    pub fields: Vec<FieldHelp>,
    pub commands: Vec<CommandHelp>,
}

impl BlockHelp {
    /// Commands usable in the block's current mode.
    pub fn active_commands(&self) -> impl Iterator<Item = &CommandHelp> {
        self.commands.iter().filter(move |c| c.modes.contains(self.mode))
    }
}

/// Help for a whole form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpDocument {
    pub form: String,
    pub blocks: Vec<BlockHelp>,
}

fn describe_field(field: &Field) -> FieldHelp {
    let codes = match field.kind() {
        FieldKind::Code(domain) => domain.labels().to_vec(),
        _ => Vec::new(),
    };
    FieldHelp {
        name: field.name().to_string(),
        label: field.label().to_string(),
        type_name: field.kind().type_name(),
        mandatory: field.is_mandatory(),
        enterable: field.is_enterable(),
        column: field.column().map(str::to_string),
        codes,
    }
}

/// Describe a single block. Master links are left unresolved.
pub fn describe_block(block: &Block) -> BlockHelp {
    let commands = block
        .commands()
        .iter()
        .map(|c| CommandHelp {
            name: c.name().to_string(),
            label: c.display_label().to_string(),
            modes: c.active_modes(),
            field: c.target().map(str::to_string),
        })
        .collect();
    BlockHelp {
        name: block.name().to_string(),
        title: block.title().to_string(),
        table: block.table().map(str::to_string),
        mode: block.mode(),
        multi: block.is_multi(),
        master: None,
        fields: block.fields().iter().map(describe_field).collect(),
        commands,
    }
}

/// Describe every block of a form, in form order.
pub fn describe_form(form: &Form) -> HelpDocument {
    let blocks = form
        .blocks()
        .iter()
        .map(|block| {
            let mut help = describe_block(block);
            help.master = block
                .master()
                .and_then(|link| form.block(link.master))
                .map(|master| master.name().to_string());
            help
        })
        .collect();
    HelpDocument {
        form: form.name().to_string(),
        blocks,
    }
}

impl fmt::Display for HelpDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Form {}", self.form)?;
        for block in &self.blocks {
            write!(f, "\n{}", block)?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockHelp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {} \"{}\"", self.name, self.title)?;
        if let Some(table) = &self.table {
            write!(f, " on {}", table)?;
        }
        if let Some(master) = &self.master {
            write!(f, ", detail of {}", master)?;
        }
        writeln!(
            f,
            " [{}{}]",
            self.mode,
            if self.multi { ", multi-record" } else { "" }
        )?;

        writeln!(f, "  Fields:")?;
        for field in &self.fields {
            write!(f, "    {:<16} {:<20} {}", field.name, field.label, field.type_name)?;
            if field.mandatory {
                f.write_str(", required")?;
            }
            if !field.enterable {
                f.write_str(", read-only")?;
            }
            if !field.codes.is_empty() {
                write!(f, " ({})", field.codes.join(" | "))?;
            }
            writeln!(f)?;
        }

        if !self.commands.is_empty() {
            writeln!(f, "  Commands:")?;
            for cmd in &self.commands {
                write!(f, "    {:<16} {:<20} {}", cmd.name, cmd.label, cmd.modes)?;
                if let Some(field) = &cmd.field {
                    write!(f, " on {}", field)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
