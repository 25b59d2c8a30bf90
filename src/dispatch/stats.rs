//! Dispatcher statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the command dispatcher.
///
/// All fields are atomic so a monitoring thread can read them while the
/// window's action queue is draining. `Ordering::Relaxed` is enough: the
/// counters are independent and only need atomic increments.
///
/// # Example
/// ```
/// use visforms::dispatch::DispatchStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = DispatchStats::new();
/// stats.commands.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().commands, 1);
/// ```
#[derive(Debug)]
pub struct DispatchStats {
    /// Commands that passed their activation predicate.
    pub commands: AtomicU64,

    pub transactions_opened: AtomicU64,
    pub transactions_committed: AtomicU64,
    pub transactions_rolled_back: AtomicU64,

    /// Deadlocks and interruptions reported by persistence.
    pub deadlocks: AtomicU64,

    /// Field errors raised inside a transaction.
    pub validation_failures: AtomicU64,

    /// SQL failures.
    pub exec_failures: AtomicU64,

    /// Bugs and panics inside a transaction.
    pub internal_errors: AtomicU64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self {
            commands: AtomicU64::new(0),
            transactions_opened: AtomicU64::new(0),
            transactions_committed: AtomicU64::new(0),
            transactions_rolled_back: AtomicU64::new(0),
            deadlocks: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            exec_failures: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Non-atomic copy for display and assertions.
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            commands: self.commands.load(Ordering::Relaxed),
            transactions_opened: self.transactions_opened.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            transactions_rolled_back: self.transactions_rolled_back.load(Ordering::Relaxed),
            deadlocks: self.deadlocks.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            exec_failures: self.exec_failures.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.commands.store(0, Ordering::Relaxed);
        self.transactions_opened.store(0, Ordering::Relaxed);
        self.transactions_committed.store(0, Ordering::Relaxed);
        self.transactions_rolled_back.store(0, Ordering::Relaxed);
        self.deadlocks.store(0, Ordering::Relaxed);
        self.validation_failures.store(0, Ordering::Relaxed);
        self.exec_failures.store(0, Ordering::Relaxed);
        self.internal_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub commands: u64,
    pub transactions_opened: u64,
    pub transactions_committed: u64,
    pub transactions_rolled_back: u64,
    pub deadlocks: u64,
    pub validation_failures: u64,
    pub exec_failures: u64,
    pub internal_errors: u64,
}

impl fmt::Display for DispatchSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dispatch {{ commands: {}, txn: {}/{} committed, rolled back: {}, deadlocks: {}, errors: {} }}",
            self.commands,
            self.transactions_committed,
            self.transactions_opened,
            self.transactions_rolled_back,
            self.deadlocks,
            self.validation_failures + self.exec_failures + self.internal_errors
        )
    }
}
