//! Mapping persistence failures onto runtime errors.

use tracing::{error, warn};

use super::DispatchStats;
use crate::common::messages::EXEC_INTERRUPTED;
use crate::common::Error;
use crate::persistence::PersistenceError;

/// Classify a failure that ended a transaction.
///
/// | failure                  | result                        |
/// |--------------------------|-------------------------------|
/// | validation               | the field error, unchanged    |
/// | deadlock / interruption  | `EXEC_INTERRUPTED`            |
/// | SQL                      | execution failure + message   |
/// | bug / panic              | internal inconsistency        |
pub(crate) fn classify(err: PersistenceError, stats: &DispatchStats) -> Error {
    match err {
        PersistenceError::Validation(inner) => {
            DispatchStats::bump(&stats.validation_failures);
            inner
        }
        PersistenceError::Deadlock(detail) | PersistenceError::Interrupted(detail) => {
            DispatchStats::bump(&stats.deadlocks);
            warn!(%detail, "transaction interrupted");
            Error::exec(EXEC_INTERRUPTED)
        }
        PersistenceError::Sql(message) => {
            DispatchStats::bump(&stats.exec_failures);
            warn!(%message, "sql failure");
            Error::exec_message(message)
        }
        PersistenceError::Bug(message) => {
            DispatchStats::bump(&stats.internal_errors);
            error!(%message, "persistence bug");
            Error::Internal(message)
        }
    }
}
