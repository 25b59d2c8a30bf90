//! Lifecycle hooks.
//!
//! The mode state machine fires a [`Trigger`] at each step of a field,
//! record or block lifecycle and around every persistence operation.
//! Applications react through a per-block [`Triggers`] implementation; a
//! hook that returns an error aborts the operation that fired it.

use std::fmt;

use crate::block::Block;
use crate::common::Result;

/// Hook points, named after the classic forms triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Entering a block.
    PreBlock,
    /// Leaving a block.
    PostBlock,
    /// Validating a block before leaving or saving it.
    ValidateBlock,
    /// Entering a record (multi-record blocks).
    PreRecord,
    /// Leaving a record (multi-record blocks).
    PostRecord,
    /// Validating a record before leaving it (multi-record blocks).
    ValidateRecord,
    /// Validating a field after its text was converted.
    ValidateField,
    /// A field value changed through validation or enumeration.
    PostChange,
    PreQuery,
    PostQuery,
    PreInsert,
    PostInsert,
    PreUpdate,
    PostUpdate,
    PreDelete,
    PostDelete,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::PreBlock => "PREBLK",
            Trigger::PostBlock => "POSTBLK",
            Trigger::ValidateBlock => "VALBLK",
            Trigger::PreRecord => "PREREC",
            Trigger::PostRecord => "POSTREC",
            Trigger::ValidateRecord => "VALREC",
            Trigger::ValidateField => "VALFLD",
            Trigger::PostChange => "POSTCHG",
            Trigger::PreQuery => "PREQRY",
            Trigger::PostQuery => "POSTQRY",
            Trigger::PreInsert => "PREINS",
            Trigger::PostInsert => "POSTINS",
            Trigger::PreUpdate => "PREUPD",
            Trigger::PostUpdate => "POSTUPD",
            Trigger::PreDelete => "PREDEL",
            Trigger::PostDelete => "POSTDEL",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a trigger fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSite {
    /// Field index, for field-level triggers.
    pub field: Option<usize>,
    pub record: usize,
}

/// Per-block hook implementation.
///
/// Closures of the matching shape implement it, so simple forms can write
/// `|trigger, block, site| { ... }`.
pub trait Triggers: Send {
    fn fire(&mut self, trigger: Trigger, block: &mut Block, site: TriggerSite) -> Result<()>;
}

impl<F> Triggers for F
where
    F: FnMut(Trigger, &mut Block, TriggerSite) -> Result<()> + Send,
{
    fn fire(&mut self, trigger: Trigger, block: &mut Block, site: TriggerSite) -> Result<()> {
        self(trigger, block, site)
    }
}

/// Hooks that accept everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTriggers;

impl Triggers for NoTriggers {
    fn fire(&mut self, _trigger: Trigger, _block: &mut Block, _site: TriggerSite) -> Result<()> {
        Ok(())
    }
}
