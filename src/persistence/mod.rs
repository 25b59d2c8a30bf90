//! Persistence collaborator.
//!
//! The runtime does not speak SQL to a database itself. It hands row images
//! and query filters to a [`Persistence`] implementation, always inside a
//! transaction the command dispatcher opened.
//!
//! # Components
//! - [`Persistence`] - The collaborator trait (begin/commit/rollback, load,
//!   fetch, save, delete)
//! - [`PersistenceError`] - The four failure classes the collaborator raises
//! - [`QueryFilter`] / [`Criterion`] - Query-by-example criteria
//! - [`RowData`] / [`Row`] - Row images going out and coming back
//! - [`MemoryPersistence`] - In-memory tables with fault injection

mod memory;

pub use memory::MemoryPersistence;

use std::fmt;

use crate::common::{Error, SearchOperator};
use crate::field::Value;

/// Storage identity of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row({})", self.0)
    }
}

/// A row as returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: RowId,
    /// Column name and persisted value.
    pub columns: Vec<(String, Value)>,
    /// [`row_checksum`] of `columns` at read time.
    pub checksum: u32,
}

impl Row {
    /// Build a row and compute its checksum.
    pub fn new(id: RowId, columns: Vec<(String, Value)>) -> Self {
        let checksum = row_checksum(&columns);
        Self {
            id,
            columns,
            checksum,
        }
    }

    /// Value of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// One column of an outgoing row image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnValue {
    pub column: String,
    /// Persisted representation.
    pub value: Value,
    /// SQL literal of the value.
    pub sql: String,
}

/// A record to insert (`id` is `None`) or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    pub table: String,
    pub id: Option<RowId>,
    /// Checksum seen when the row was fetched.
    pub checksum: Option<u32>,
    pub columns: Vec<ColumnValue>,
}

impl RowData {
    /// `INSERT`/`UPDATE` statement text, for logs and diagnostics.
    pub fn to_sql(&self) -> String {
        match self.id {
            None => format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                self.columns
                    .iter()
                    .map(|c| c.column.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.sql.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Some(id) => format!(
                "UPDATE {} SET {} WHERE id = {}",
                self.table,
                self.columns
                    .iter()
                    .map(|c| format!("{} = {}", c.column, c.sql))
                    .collect::<Vec<_>>()
                    .join(", "),
                id.0
            ),
        }
    }
}

/// Identity and checksum of a row after a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedRow {
    pub id: RowId,
    pub checksum: u32,
}

/// One query-by-example condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub column: String,
    pub op: SearchOperator,
    /// Persisted representation of the criterion value.
    pub value: Value,
    /// SQL literal of the value.
    pub sql: String,
}

/// Everything `load()` needs to select rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub table: String,
    /// Conditions, combined with AND.
    pub criteria: Vec<Criterion>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

impl QueryFilter {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            criteria: Vec::new(),
            limit: None,
        }
    }

    /// `SELECT` statement text, for logs and diagnostics.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.table);
        for (i, c) in self.criteria.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("{} {} {}", c.column, c.op.as_sql(), c.sql));
        }
        sql
    }
}

/// Failures raised by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// A domain rule rejected the data (e.g. a storage-side check).
    #[error("validation failed: {0}")]
    Validation(Error),

    #[error("sql failure: {0}")]
    Sql(String),

    #[error("deadlock: {0}")]
    Deadlock(String),

    /// The connection was interrupted or timed out.
    #[error("interrupted: {0}")]
    Interrupted(String),

    /// A programming error inside the collaborator.
    #[error("bug: {0}")]
    Bug(String),
}

/// The persistence collaborator.
///
/// `load`, `fetch_record`, `save` and `delete` are only called between
/// `begin` and `commit`/`rollback`.
pub trait Persistence: Send {
    fn begin(&mut self) -> Result<(), PersistenceError>;

    fn commit(&mut self) -> Result<(), PersistenceError>;

    fn rollback(&mut self) -> Result<(), PersistenceError>;

    /// Rows matching `filter`, in storage order.
    fn load(&mut self, filter: &QueryFilter) -> Result<Vec<Row>, PersistenceError>;

    /// Re-read a single row.
    fn fetch_record(&mut self, table: &str, id: RowId) -> Result<Option<Row>, PersistenceError>;

    /// Insert or update a row.
    fn save(&mut self, row: &RowData) -> Result<SavedRow, PersistenceError>;

    fn delete(&mut self, row: &RowData) -> Result<(), PersistenceError>;
}

/// CRC32 over column names and values.
///
/// Rows compare equal under this checksum iff every column renders the
/// same; used to detect rows changed behind a fetched record.
pub fn row_checksum(columns: &[(String, Value)]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for (column, value) in columns {
        hasher.update(column.as_bytes());
        hasher.update(&[0]);
        hasher.update(value.to_string().as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}
