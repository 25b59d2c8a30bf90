//! MemoryPersistence - in-memory tables behind the persistence trait.
//!
//! Used for tests and for running forms without a database. Supports:
//! - Transactional staging: `begin` snapshots the tables, `commit`
//!   publishes the snapshot, `rollback` discards it
//! - Optimistic verification: updates and deletes carrying a checksum are
//!   rejected when the stored row no longer matches it
//! - Fault injection: queued errors are raised by the next data operation

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::{Criterion, Persistence, PersistenceError, QueryFilter, Row, RowData, RowId, SavedRow};
use super::row_checksum;
use crate::common::SearchOperator;
use crate::field::Value;

type Columns = Vec<(String, Value)>;
type Tables = BTreeMap<String, BTreeMap<RowId, Columns>>;

#[derive(Debug, Default)]
struct MemoryState {
    tables: Tables,
    /// Working copy of `tables` while a transaction is open.
    staged: Option<Tables>,
    next_id: u64,
    faults: VecDeque<PersistenceError>,
    journal: Vec<String>,
    transactions: usize,
}

impl MemoryState {
    fn staged(&mut self) -> Result<&mut Tables, PersistenceError> {
        self.staged
            .as_mut()
            .ok_or_else(|| PersistenceError::Bug("no open transaction".to_string()))
    }

    /// Raise the next injected fault, if any.
    fn inject(&mut self) -> Result<(), PersistenceError> {
        match self.faults.pop_front() {
            Some(fault) => {
                self.journal.push(format!("fault {}", fault));
                Err(fault)
            }
            None => Ok(()),
        }
    }

    fn allocate_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId(self.next_id)
    }
}

/// In-memory persistence. Clones share the same tables.
///
/// # Example
/// ```
/// use visforms::field::Value;
/// use visforms::persistence::{MemoryPersistence, Persistence, QueryFilter};
///
/// let mut db = MemoryPersistence::new();
/// db.insert_row("emp", vec![("name", Value::Str("Ada".into()))]);
///
/// db.begin().unwrap();
/// let rows = db.load(&QueryFilter::new("emp")).unwrap();
/// db.commit().unwrap();
/// assert_eq!(rows.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, outside any transaction.
    pub fn insert_row(&self, table: &str, columns: Vec<(&str, Value)>) -> RowId {
        let mut state = self.state.lock();
        let id = state.allocate_id();
        let columns = columns
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.normalized()))
            .collect();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(id, columns);
        id
    }

    /// Change a stored column directly, as another session would.
    ///
    /// Returns `false` if the row does not exist.
    pub fn update_row(&self, table: &str, id: RowId, column: &str, value: Value) -> bool {
        let mut state = self.state.lock();
        let Some(row) = state.tables.get_mut(table).and_then(|t| t.get_mut(&id)) else {
            return false;
        };
        merge_column(row, column, value);
        true
    }

    /// Committed rows of a table, in id order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let state = self.state.lock();
        state
            .tables
            .get(table)
            .map(|t| {
                t.iter()
                    .map(|(id, columns)| Row::new(*id, columns.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Make the next data operation fail with `error`.
    pub fn fail_next(&self, error: PersistenceError) {
        self.state.lock().faults.push_back(error);
    }

    /// Operations performed so far, oldest first.
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().journal.clone()
    }

    /// Number of transactions begun.
    pub fn transactions(&self) -> usize {
        self.state.lock().transactions
    }

    pub fn in_transaction(&self) -> bool {
        self.state.lock().staged.is_some()
    }
}

impl Persistence for MemoryPersistence {
    fn begin(&mut self) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        if state.staged.is_some() {
            return Err(PersistenceError::Bug("transaction already open".to_string()));
        }
        state.staged = Some(state.tables.clone());
        state.transactions += 1;
        state.journal.push("begin".to_string());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        let staged = state
            .staged
            .take()
            .ok_or_else(|| PersistenceError::Bug("commit without transaction".to_string()))?;
        state.tables = staged;
        state.journal.push("commit".to_string());
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        state.staged = None;
        state.journal.push("rollback".to_string());
        Ok(())
    }

    fn load(&mut self, filter: &QueryFilter) -> Result<Vec<Row>, PersistenceError> {
        let mut state = self.state.lock();
        state.inject()?;
        let limit = filter.limit.unwrap_or(usize::MAX);
        let rows: Vec<Row> = match state.staged()?.get(&filter.table) {
            Some(table) => table
                .iter()
                .filter(|(_, columns)| filter.criteria.iter().all(|c| matches(columns, c)))
                .take(limit)
                .map(|(id, columns)| Row::new(*id, columns.clone()))
                .collect(),
            None => Vec::new(),
        };
        debug!(sql = %filter.to_sql(), rows = rows.len(), "memory load");
        state.journal.push(format!("load {}", filter.table));
        Ok(rows)
    }

    fn fetch_record(&mut self, table: &str, id: RowId) -> Result<Option<Row>, PersistenceError> {
        let mut state = self.state.lock();
        state.inject()?;
        let row = state
            .staged()?
            .get(table)
            .and_then(|t| t.get(&id))
            .map(|columns| Row::new(id, columns.clone()));
        state.journal.push(format!("fetch {} {}", table, id.0));
        Ok(row)
    }

    fn save(&mut self, data: &RowData) -> Result<SavedRow, PersistenceError> {
        let mut state = self.state.lock();
        state.inject()?;
        let new_id = match data.id {
            None => Some(state.allocate_id()),
            Some(_) => None,
        };
        let table = state.staged()?.entry(data.table.clone()).or_default();

        let (id, columns) = match (data.id, new_id) {
            (Some(id), _) => {
                let row = table
                    .get_mut(&id)
                    .ok_or_else(|| PersistenceError::Sql(format!("{} no longer exists", id)))?;
                verify(row, data.checksum)?;
                for c in &data.columns {
                    merge_column(row, &c.column, c.value.clone());
                }
                (id, row.clone())
            }
            (None, Some(id)) => {
                let columns: Columns = data
                    .columns
                    .iter()
                    .map(|c| (c.column.clone(), c.value.clone()))
                    .collect();
                table.insert(id, columns.clone());
                (id, columns)
            }
            (None, None) => return Err(PersistenceError::Bug("no row id".to_string())),
        };

        debug!(sql = %data.to_sql(), "memory save");
        state.journal.push(format!("save {} {}", data.table, id.0));
        Ok(SavedRow {
            id,
            checksum: row_checksum(&columns),
        })
    }

    fn delete(&mut self, data: &RowData) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        state.inject()?;
        let id = data
            .id
            .ok_or_else(|| PersistenceError::Bug("delete of unsaved row".to_string()))?;
        let table = state
            .staged()?
            .get_mut(&data.table)
            .ok_or_else(|| PersistenceError::Sql(format!("unknown table {}", data.table)))?;
        let row = table
            .get(&id)
            .ok_or_else(|| PersistenceError::Sql(format!("{} no longer exists", id)))?;
        verify(row, data.checksum)?;
        table.remove(&id);
        state.journal.push(format!("delete {} {}", data.table, id.0));
        Ok(())
    }
}

/// Reject the write if the stored row changed since it was fetched.
fn verify(columns: &Columns, expected: Option<u32>) -> Result<(), PersistenceError> {
    match expected {
        Some(checksum) if checksum != row_checksum(columns) => Err(PersistenceError::Sql(
            "row changed by another user".to_string(),
        )),
        _ => Ok(()),
    }
}

fn merge_column(row: &mut Columns, column: &str, value: Value) {
    match row.iter_mut().find(|(name, _)| name == column) {
        Some((_, slot)) => *slot = value,
        None => row.push((column.to_string(), value)),
    }
}

fn matches(columns: &Columns, criterion: &Criterion) -> bool {
    let Some(value) = columns
        .iter()
        .find(|(name, _)| *name == criterion.column)
        .map(|(_, v)| v)
    else {
        return false;
    };

    match criterion.op {
        SearchOperator::Equal => *value == criterion.value,
        SearchOperator::NotEqual => !value.is_null() && *value != criterion.value,
        SearchOperator::Like => like(&plain_text(value), &plain_text(&criterion.value)),
        op => match value.compare(&criterion.value) {
            Some(ord) => match op {
                SearchOperator::Less => ord.is_lt(),
                SearchOperator::LessOrEqual => ord.is_le(),
                SearchOperator::Greater => ord.is_gt(),
                _ => ord.is_ge(),
            },
            None => false,
        },
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

/// SQL `LIKE`: `%` matches any run, `_` any single character.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // Greedy matcher with backtracking to the last `%`.
    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}
