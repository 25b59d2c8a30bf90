//! ScriptedPresentation - answers prompts from a queue.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{FocusTarget, Presentation, Selection};
use crate::common::{Error, MessageCode};

/// Everything the runtime asked of the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptLog {
    /// Confirmation prompts, in order.
    pub asked: Vec<MessageCode>,
    /// Selection dialogs: title and items.
    pub dialogs: Vec<(MessageCode, Vec<String>)>,
    /// Focus transfers.
    pub focus: Vec<FocusTarget>,
    /// Reported errors.
    pub reported: Vec<Error>,
}

#[derive(Debug)]
struct ScriptState {
    answers: VecDeque<bool>,
    selections: VecDeque<Selection>,
    default_answer: bool,
    log: ScriptLog,
}

/// A [`Presentation`] driven by queued answers.
///
/// Clones share state, so a test can keep one handle for scripting and
/// inspection while the form owns another.
///
/// # Example
/// ```
/// use visforms::presentation::{Presentation, ScriptedPresentation, Selection};
/// use visforms::common::messages;
///
/// let script = ScriptedPresentation::new();
/// script.push_answer(false);
/// script.push_selection(Selection::Index(1));
///
/// let mut ui = script.clone();
/// assert!(!ui.ask(messages::DISCARD_CHANGES, &[]));
/// assert!(ui.ask(messages::DISCARD_CHANGES, &[])); // queue empty: default yes
/// assert_eq!(script.log().asked.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedPresentation {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedPresentation {
    /// Create a script that answers "yes" once its queue is empty.
    pub fn new() -> Self {
        Self::answering(true)
    }

    /// Create a script with the given fallback answer.
    pub fn answering(default_answer: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                answers: VecDeque::new(),
                selections: VecDeque::new(),
                default_answer,
                log: ScriptLog::default(),
            })),
        }
    }

    /// Queue the answer to the next confirmation prompt.
    pub fn push_answer(&self, answer: bool) {
        self.state.lock().answers.push_back(answer);
    }

    /// Queue the result of the next selection dialog.
    ///
    /// Dialogs with nothing queued are cancelled.
    pub fn push_selection(&self, selection: Selection) {
        self.state.lock().selections.push_back(selection);
    }

    /// Copy of the interaction log.
    pub fn log(&self) -> ScriptLog {
        self.state.lock().log.clone()
    }

    /// Most recent focus transfer.
    pub fn last_focus(&self) -> Option<FocusTarget> {
        self.state.lock().log.focus.last().copied()
    }

    /// Number of queued answers and selections not yet consumed.
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.answers.len() + state.selections.len()
    }
}

impl Default for ScriptedPresentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Presentation for ScriptedPresentation {
    fn ask(&mut self, message: MessageCode, _args: &[String]) -> bool {
        let mut state = self.state.lock();
        state.log.asked.push(message);
        let fallback = state.default_answer;
        state.answers.pop_front().unwrap_or(fallback)
    }

    fn select_from_dialog(
        &mut self,
        title: MessageCode,
        items: &[String],
        _allow_new: bool,
    ) -> Selection {
        let mut state = self.state.lock();
        state.log.dialogs.push((title, items.to_vec()));
        match state.selections.pop_front() {
            Some(Selection::Index(i)) if i >= items.len() => Selection::Cancelled,
            Some(selection) => selection,
            None => Selection::Cancelled,
        }
    }

    fn focus(&mut self, target: FocusTarget) {
        self.state.lock().log.focus.push(target);
    }

    fn report(&mut self, error: &Error) {
        self.state.lock().log.reported.push(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{messages, BlockId};

    #[test]
    fn test_answers_in_order() {
        let script = ScriptedPresentation::answering(false);
        script.push_answer(true);
        let mut ui = script.clone();

        assert!(ui.ask(messages::DISCARD_CHANGES, &[]));
        assert!(!ui.ask(messages::DISCARD_CHANGES, &[]));
        assert_eq!(script.pending(), 0);
    }

    #[test]
    fn test_selection_out_of_range_cancels() {
        let script = ScriptedPresentation::new();
        script.push_selection(Selection::Index(5));
        let mut ui = script.clone();

        let items = vec!["a".to_string()];
        assert_eq!(
            ui.select_from_dialog(messages::SELECT_BLOCK, &items, false),
            Selection::Cancelled
        );
        assert_eq!(script.log().dialogs[0].1, items);
    }

    #[test]
    fn test_focus_recorded() {
        let script = ScriptedPresentation::new();
        let mut ui = script.clone();
        ui.focus(FocusTarget::Block(BlockId::new(2)));
        assert_eq!(script.last_focus(), Some(FocusTarget::Block(BlockId::new(2))));
    }
}
