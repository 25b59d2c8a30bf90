//! Transaction scoping for persistence work.
//!
//! [`TransactionGuard`] follows the guard pattern: it is created by a
//! successful `begin`, must be consumed by [`TransactionGuard::commit`], and
//! rolls the transaction back when dropped on any other path (an early `?`
//! return or an unwinding panic).

use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::{classify, DispatchStats};
use crate::common::Result;
use crate::form::Form;
use crate::persistence::{Persistence, PersistenceError};

/// An open persistence transaction.
pub(crate) struct TransactionGuard<'a> {
    store: &'a mut dyn Persistence,
    stats: &'a DispatchStats,
    open: bool,
}

impl<'a> TransactionGuard<'a> {
    pub(crate) fn begin(
        store: &'a mut dyn Persistence,
        stats: &'a DispatchStats,
    ) -> std::result::Result<Self, PersistenceError> {
        store.begin()?;
        DispatchStats::bump(&stats.transactions_opened);
        debug!("transaction opened");
        Ok(Self {
            store,
            stats,
            open: true,
        })
    }

    /// Commit. A failed commit still rolls back when the guard drops.
    pub(crate) fn commit(mut self) -> std::result::Result<(), PersistenceError> {
        self.store.commit()?;
        self.open = false;
        DispatchStats::bump(&self.stats.transactions_committed);
        debug!("transaction committed");
        Ok(())
    }
}

impl<'a> Deref for TransactionGuard<'a> {
    type Target = dyn Persistence + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.store
    }
}

impl<'a> DerefMut for TransactionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.store
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        DispatchStats::bump(&self.stats.transactions_rolled_back);
        match self.store.rollback() {
            Ok(()) => debug!("transaction rolled back"),
            Err(err) => warn!(error = %err, "rollback failed"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic in transaction: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic in transaction: {}", s)
    } else {
        "panic in transaction".to_string()
    }
}

impl Form {
    /// Run `work` inside a persistence transaction.
    ///
    /// Commits when `work` succeeds and rolls back otherwise. Panics inside
    /// `work` are caught and reported as internal errors; every failure is
    /// classified into a runtime [`Error`](crate::common::Error).
    pub(crate) fn in_transaction<T>(
        &mut self,
        work: impl FnOnce(&mut dyn Persistence) -> std::result::Result<T, PersistenceError>,
    ) -> Result<T> {
        let Form {
            persistence, stats, ..
        } = self;
        let store: &mut dyn Persistence = persistence.as_mut();
        let stats: &DispatchStats = stats;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut guard = TransactionGuard::begin(store, stats)?;
            let value = work(&mut *guard)?;
            guard.commit()?;
            Ok(value)
        }));

        outcome
            .unwrap_or_else(|payload| Err(PersistenceError::Bug(panic_message(&*payload))))
            .map_err(|err| classify(err, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::common::messages;
    use crate::common::Error;
    use crate::form::FormBuilder;
    use crate::persistence::{MemoryPersistence, QueryFilter};

    fn form(db: &MemoryPersistence) -> Form {
        FormBuilder::new("t")
            .block(BlockBuilder::new("b").table("t"))
            .persistence(db.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_commit_on_success() {
        let db = MemoryPersistence::new();
        let mut form = form(&db);

        let value = form.in_transaction(|_store| Ok(7)).unwrap();
        assert_eq!(value, 7);
        assert_eq!(db.journal(), vec!["begin", "commit"]);
        let snap = form.stats().snapshot();
        assert_eq!(snap.transactions_committed, 1);
        assert_eq!(snap.transactions_rolled_back, 0);
    }

    #[test]
    fn test_rollback_on_error() {
        let db = MemoryPersistence::new();
        let mut form = form(&db);

        let result: Result<()> =
            form.in_transaction(|_store| Err(PersistenceError::Deadlock("victim".into())));
        assert_eq!(result, Err(Error::exec(messages::EXEC_INTERRUPTED)));
        assert_eq!(db.journal(), vec!["begin", "rollback"]);
        assert!(!db.in_transaction());
        assert_eq!(form.stats().snapshot().transactions_rolled_back, 1);
    }

    #[test]
    fn test_panic_becomes_internal() {
        let db = MemoryPersistence::new();
        let mut form = form(&db);

        let result: Result<()> = form.in_transaction(|_store| panic!("boom"));
        assert!(matches!(result, Err(Error::Internal(m)) if m.contains("boom")));
        assert!(!db.in_transaction());
        assert_eq!(form.stats().snapshot().internal_errors, 1);
    }

    #[test]
    fn test_store_failure_is_classified() {
        let db = MemoryPersistence::new();
        db.fail_next(PersistenceError::Sql("no connection".into()));
        let mut form = form(&db);

        let result = form.in_transaction(|store| store.load(&QueryFilter::new("t")));
        assert_eq!(result, Err(Error::exec_message("no connection")));
        assert_eq!(db.journal().last().map(String::as_str), Some("rollback"));
        assert_eq!(form.stats().snapshot().exec_failures, 1);
    }
}
