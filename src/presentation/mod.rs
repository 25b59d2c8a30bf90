//! Presentation collaborator.
//!
//! The runtime never renders anything. It talks to the presentation layer
//! through the [`Presentation`] trait: a yes/no confirmation, a blocking
//! selection list, focus transfer and error reporting. All calls are
//! synchronous; the initiating command waits for the answer.
//!
//! [`ScriptedPresentation`] answers from queued responses and is used for
//! tests and headless batch execution.

mod scripted;

pub use scripted::{ScriptedPresentation, ScriptLog};

use crate::common::{BlockId, Error, FieldId, MessageCode};

/// Result of a selection dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The user picked the item at this index.
    Index(usize),
    /// The user asked to create a new entry instead of picking one.
    CreateNew,
    /// The dialog was dismissed.
    Cancelled,
}

/// Where focus should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Block(BlockId),
    Field { field: FieldId, record: usize },
}

/// Services the runtime consumes from the presentation layer.
pub trait Presentation: Send {
    /// Ask a yes/no question. Returns `true` for yes.
    fn ask(&mut self, message: MessageCode, args: &[String]) -> bool;

    /// Show a list and block until the user picks an entry.
    fn select_from_dialog(
        &mut self,
        title: MessageCode,
        items: &[String],
        allow_new: bool,
    ) -> Selection;

    /// Move input focus.
    fn focus(&mut self, target: FocusTarget);

    /// Show a modal error notification.
    fn report(&mut self, error: &Error) {
        let _ = error;
    }
}
