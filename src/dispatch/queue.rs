//! Serialized execution of user actions.
//!
//! Every user action on a window goes through one FIFO queue and runs with
//! the window lock held, so at most one action touches the form at a time.
//! Async submissions return immediately and are drained by a background
//! thread; cancellable actions still waiting in the queue can be dropped.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::common::{Error, Result};
use crate::form::Form;

/// Whether a queued action may be dropped before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    Cancellable,
    NonCancellable,
}

/// Whether `submit` waits for the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Run on the calling thread before `submit` returns.
    Sync,
    /// Return at once; a worker thread drains the queue.
    Async,
}

type Job = Box<dyn FnOnce(&mut Form) -> Result<()> + Send>;

/// A unit of user work.
pub struct Action {
    name: String,
    cancellation: Cancellation,
    exec_mode: ExecMode,
    job: Job,
}

impl Action {
    /// A cancellable, synchronous action.
    pub fn new(
        name: impl Into<String>,
        job: impl FnOnce(&mut Form) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            cancellation: Cancellation::Cancellable,
            exec_mode: ExecMode::Sync,
            job: Box::new(job),
        }
    }

    /// Convenience for running a block command.
    pub fn command(block: crate::common::BlockId, command: impl Into<String>) -> Self {
        let command = command.into();
        Self::new(command.clone(), move |form: &mut Form| form.invoke(block, &command))
    }

    pub fn non_cancellable(mut self) -> Self {
        self.cancellation = Cancellation::NonCancellable;
        self
    }

    pub fn run_async(mut self) -> Self {
        self.exec_mode = ExecMode::Async;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancellation(&self) -> Cancellation {
        self.cancellation
    }

    pub fn exec_mode(&self) -> ExecMode {
        self.exec_mode
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("cancellation", &self.cancellation)
            .field("exec_mode", &self.exec_mode)
            .finish()
    }
}

/// How a dequeued action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: String,
    pub result: Result<()>,
}

struct WindowInner {
    form: Mutex<Form>,
    queue: Mutex<VecDeque<Action>>,
    draining: AtomicBool,
    outcomes: Mutex<Vec<ActionOutcome>>,
}

/// A form window: the form plus its action queue.
///
/// Clones share the same window.
///
/// # Example
/// ```
/// use visforms::block::BlockBuilder;
/// use visforms::common::BlockId;
/// use visforms::dispatch::{Action, Window};
/// use visforms::form::FormBuilder;
///
/// let form = FormBuilder::new("f")
///     .block(BlockBuilder::new("b").table("t").standard_commands())
///     .build()
///     .unwrap();
/// let window = Window::new(form);
/// window.submit(Action::command(BlockId::new(0), "insert"));
/// assert!(window.take_outcomes()[0].result.is_ok());
/// ```
#[derive(Clone)]
pub struct Window {
    inner: Arc<WindowInner>,
}

impl Window {
    pub fn new(form: Form) -> Self {
        Self {
            inner: Arc::new(WindowInner {
                form: Mutex::new(form),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                outcomes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue an action.
    ///
    /// A sync action is drained on the calling thread together with
    /// anything queued before it, unless a worker is already draining and
    /// picks it up. An async one returns the handle of the worker thread.
    pub fn submit(&self, action: Action) -> Option<JoinHandle<()>> {
        let exec_mode = action.exec_mode;
        trace!(action = %action.name, ?exec_mode, "action queued");
        self.inner.queue.lock().push_back(action);
        match exec_mode {
            ExecMode::Sync => {
                self.drain();
                None
            }
            ExecMode::Async => {
                let window = self.clone();
                Some(thread::spawn(move || window.drain()))
            }
        }
    }

    /// Run queued actions until the queue is empty.
    ///
    /// Only one thread drains at a time; a thread that finds another one
    /// draining returns immediately and leaves its action to it.
    pub fn drain(&self) {
        loop {
            if self
                .inner
                .draining
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                return;
            }
            while let Some(action) = self.next_action() {
                self.run(action);
            }
            self.inner.draining.store(false, Ordering::Release);

            // An action queued between the last pop and the release would
            // otherwise be stranded.
            if self.inner.queue.lock().is_empty() {
                return;
            }
        }
    }

    fn next_action(&self) -> Option<Action> {
        self.inner.queue.lock().pop_front()
    }

    fn run(&self, action: Action) {
        let Action { name, job, .. } = action;
        let mut form = self.inner.form.lock();
        debug!(action = %name, "action started");
        let result = panic::catch_unwind(AssertUnwindSafe(|| job(&mut *form)))
            .unwrap_or_else(|_| Err(Error::internal(format!("action {} panicked", name))));
        if let Err(err) = &result {
            form.report_failure(err);
        }
        drop(form);
        self.inner.outcomes.lock().push(ActionOutcome {
            action: name,
            result,
        });
    }

    /// Drop every queued cancellable action. Returns how many were dropped.
    pub fn cancel_pending(&self) -> usize {
        let mut queue = self.inner.queue.lock();
        let before = queue.len();
        queue.retain(|a| a.cancellation == Cancellation::NonCancellable);
        let dropped = before - queue.len();
        if dropped > 0 {
            warn!(dropped, "pending actions cancelled");
        }
        dropped
    }

    /// Number of actions waiting to run.
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Run `f` with the window lock held.
    pub fn with_form<T>(&self, f: impl FnOnce(&mut Form) -> T) -> T {
        f(&mut *self.inner.form.lock())
    }

    /// Outcomes of finished actions, oldest first.
    pub fn take_outcomes(&self) -> Vec<ActionOutcome> {
        std::mem::take(&mut *self.inner.outcomes.lock())
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("pending", &self.pending())
            .field("draining", &self.inner.draining.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::common::BlockId;
    use crate::form::FormBuilder;
    use crate::presentation::ScriptedPresentation;

    fn window(script: &ScriptedPresentation) -> Window {
        let form = FormBuilder::new("f")
            .block(BlockBuilder::new("b").table("t").standard_commands())
            .presentation(script.clone())
            .build()
            .unwrap();
        Window::new(form)
    }

    #[test]
    fn test_sync_runs_in_order() {
        let window = window(&ScriptedPresentation::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            window.submit(Action::new(format!("a{}", i), move |_form: &mut Form| {
                order.lock().push(i);
                Ok(())
            }));
        }
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(window.take_outcomes().len(), 3);
    }

    #[test]
    fn test_failure_is_reported() {
        let script = ScriptedPresentation::new();
        let window = window(&script);
        window.submit(Action::command(BlockId::new(0), "save"));

        let outcomes = window.take_outcomes();
        assert!(outcomes[0].result.is_err());
        assert_eq!(script.log().reported.len(), 1);
    }

    #[test]
    fn test_abort_is_silent() {
        let script = ScriptedPresentation::new();
        let window = window(&script);
        window.submit(Action::new("abort", |_form: &mut Form| Err(Error::Aborted)));

        assert_eq!(window.take_outcomes()[0].result, Err(Error::Aborted));
        assert!(script.log().reported.is_empty());
    }

    #[test]
    fn test_panic_becomes_internal() {
        let window = window(&ScriptedPresentation::new());
        window.submit(Action::new("boom", |_form: &mut Form| panic!("boom")));

        let outcomes = window.take_outcomes();
        assert!(matches!(outcomes[0].result, Err(Error::Internal(_))));
        // the lock survived the panic
        window.with_form(|form| assert_eq!(form.name(), "f"));
    }

    #[test]
    fn test_cancel_pending_keeps_non_cancellable() {
        let window = window(&ScriptedPresentation::new());
        // hold the queue by occupying the drain flag
        window.inner.draining.store(true, Ordering::SeqCst);
        window.submit(Action::new("a", |_form: &mut Form| Ok(())));
        window.submit(Action::new("b", |_form: &mut Form| Ok(())).non_cancellable());
        window.submit(Action::new("c", |_form: &mut Form| Ok(())));
        assert_eq!(window.pending(), 3);

        assert_eq!(window.cancel_pending(), 2);
        window.inner.draining.store(false, Ordering::SeqCst);
        window.drain();

        let outcomes = window.take_outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].action, "b");
    }

    #[test]
    fn test_async_submission() {
        let window = window(&ScriptedPresentation::new());
        let handle = window
            .submit(Action::command(BlockId::new(0), "insert").run_async())
            .unwrap();
        handle.join().unwrap();
        window.drain();

        assert_eq!(window.take_outcomes().len(), 1);
    }
}
