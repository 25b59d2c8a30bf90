//! Blocks - bound groups of fields over a record buffer.
//!
//! A [`Block`] owns its fields, its record buffer and its commands, and
//! carries the current mode and cursor. It knows nothing about other blocks
//! or the form; the mode state machine in [`crate::form`] drives it.
//!
//! # Components
//! - [`Block`] / [`BlockBuilder`] - The block and its configuration
//! - [`BlockEvent`] - Change notifications for the presentation layer
//! - [`PendingEdit`] - Typed text awaiting validation
//! - [`MasterLink`] - Master/detail relation to another block

mod events;

pub use events::BlockEvent;

use std::collections::HashSet;

use tracing::debug;

use crate::buffer::{RecordBuffer, RowRef};
use crate::common::config::{DEFAULT_BUFFER_SIZE, DEFAULT_DISPLAY_SIZE};
use crate::common::{BlockId, Error, FieldId, Mode, Result};
use crate::dispatch::{Command, CommandBinding, CommandOp};
use crate::field::{Field, FieldBuilder, FieldMut, Value};
use crate::persistence::{ColumnValue, Criterion, QueryFilter, Row, RowData};

/// Text typed into a field that has not been validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub field: usize,
    pub record: usize,
    pub text: String,
}

/// A detail block's link to its master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterLink {
    pub master: BlockId,
    /// `(detail field, master field)` index pairs joined by equality.
    pub pairs: Vec<(usize, usize)>,
}

/// Saved state of a block, for undoing a failed transition.
#[derive(Debug, Clone)]
pub(crate) struct BlockCheckpoint {
    fields: Vec<Field>,
    records: RecordBuffer,
    mode: Mode,
    active_field: Option<usize>,
    pending: Vec<PendingEdit>,
    events: usize,
}

/// A data-entry block.
///
/// # Invariants
/// - `records.active() < buffer_size`
/// - `active_field`, if set, indexes `fields`
#[derive(Debug)]
pub struct Block {
    id: BlockId,
    name: String,
    title: String,
    table: Option<String>,
    fields: Vec<Field>,
    commands: Vec<Command>,
    records: RecordBuffer,
    display_size: usize,
    mode: Mode,
    active_field: Option<usize>,
    single_save: bool,
    accessible: bool,
    master: Option<MasterLink>,
    pending: Vec<PendingEdit>,
    events: Vec<BlockEvent>,
}

impl Block {
    // ========================================================================
    // Read-only accessors
    // ========================================================================

    #[inline]
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Bound table, `None` for control blocks.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name() == name)
    }

    pub fn records(&self) -> &RecordBuffer {
        &self.records
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.records.buffer_size()
    }

    #[inline]
    pub fn display_size(&self) -> usize {
        self.display_size
    }

    /// More than one record visible at once.
    #[inline]
    pub fn is_multi(&self) -> bool {
        self.display_size > 1
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn active_record(&self) -> usize {
        self.records.active()
    }

    pub fn active_field(&self) -> Option<usize> {
        self.active_field
    }

    pub fn is_single_save(&self) -> bool {
        self.single_save
    }

    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    pub fn master(&self) -> Option<&MasterLink> {
        self.master.as_ref()
    }

    /// Whether the active record has unsaved modifications or typed text.
    pub fn is_changed(&self) -> bool {
        self.records.is_changed(self.active_record()) || !self.pending.is_empty()
    }

    pub fn is_record_filled(&self, rec: usize) -> bool {
        rec < self.buffer_size() && self.records.is_filled(&self.fields, rec)
    }

    /// First enterable field that is null in `rec`.
    pub fn first_unfilled_field(&self, rec: usize) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.is_enterable() && f.is_null(rec))
    }

    pub fn first_enterable_field(&self) -> Option<usize> {
        self.fields.iter().position(Field::is_enterable)
    }

    // ========================================================================
    // Field access
    // ========================================================================

    /// Mutation handle for a field.
    pub fn field_mut(&mut self, index: usize) -> Result<FieldMut<'_>> {
        if index >= self.fields.len() {
            return Err(Error::internal(format!(
                "block {} has no field {}",
                self.name, index
            )));
        }
        Ok(FieldMut::new(
            &mut self.fields,
            index,
            &mut self.records,
            &mut self.events,
        ))
    }

    pub fn field_mut_by_name(&mut self, name: &str) -> Result<FieldMut<'_>> {
        let index = self
            .field_index(name)
            .ok_or_else(|| Error::internal(format!("block {} has no field {}", self.name, name)))?;
        self.field_mut(index)
    }

    // ========================================================================
    // Typed text
    // ========================================================================

    /// Accept a keystroke-level edit of `field` in the active record.
    ///
    /// Returns `false` (and keeps nothing) if the text fails the incremental
    /// check. Accepted text is validated later by the mode state machine.
    pub fn edit_text(&mut self, field: usize, text: impl Into<String>) -> Result<bool> {
        let text = text.into();
        let target = self
            .fields
            .get(field)
            .ok_or_else(|| Error::internal(format!("block {} has no field {}", self.name, field)))?;
        if !target.check_text(&text) {
            return Ok(false);
        }

        let record = self.active_record();
        self.pending
            .retain(|p| !(p.field == field && p.record == record));
        self.pending.push(PendingEdit {
            field,
            record,
            text,
        });
        self.active_field = Some(field);
        Ok(true)
    }

    pub fn pending_edits(&self) -> &[PendingEdit] {
        &self.pending
    }

    /// `(field, record)` of every pending edit, oldest first.
    pub(crate) fn pending_keys(&self) -> Vec<(usize, usize)> {
        self.pending.iter().map(|p| (p.field, p.record)).collect()
    }

    /// Put back an edit that failed validation so the user can correct it.
    pub(crate) fn restore_pending(&mut self, edit: PendingEdit) {
        self.pending.push(edit);
    }

    pub(crate) fn take_pending_for(&mut self, field: usize, record: usize) -> Option<PendingEdit> {
        let pos = self
            .pending
            .iter()
            .position(|p| p.field == field && p.record == record)?;
        Some(self.pending.remove(pos))
    }

    // ========================================================================
    // State changes (driven by the form)
    // ========================================================================

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(block = %self.name, from = %self.mode, to = %mode, "mode transition");
            self.events.push(BlockEvent::ModeChanged {
                from: self.mode,
                to: mode,
            });
            self.mode = mode;
        }
    }

    pub(crate) fn set_active_record(&mut self, rec: usize) -> Result<()> {
        let from = self.records.active();
        self.records.set_active(rec)?;
        if from != rec {
            self.events.push(BlockEvent::RecordChanged { from, to: rec });
        }
        Ok(())
    }

    pub(crate) fn set_active_field(&mut self, field: Option<usize>) {
        self.active_field = field.filter(|&i| i < self.fields.len());
    }

    pub(crate) fn push_event(&mut self, event: BlockEvent) {
        self.events.push(event);
    }

    /// Drain the queued events.
    pub fn take_events(&mut self) -> Vec<BlockEvent> {
        std::mem::take(&mut self.events)
    }

    /// Null every record, reset flags and cursor, drop typed text.
    pub(crate) fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear_slots();
        }
        self.records.reset();
        self.pending.clear();
        self.events.push(BlockEvent::Cleared);
    }

    pub(crate) fn clear_record(&mut self, rec: usize) {
        self.records.clear_slot(&mut self.fields, rec);
        self.pending.retain(|p| p.record != rec);
    }

    /// Shift records down and leave a blank one at `rec`.
    pub(crate) fn insert_blank(&mut self, rec: usize) {
        self.records.insert_blank(&mut self.fields, rec);
        for p in &mut self.pending {
            if p.record >= rec {
                p.record += 1;
            }
        }
        self.pending.retain(|p| p.record < self.records.buffer_size());
    }

    pub(crate) fn records_mut(&mut self) -> &mut RecordBuffer {
        &mut self.records
    }

    /// Put configured defaults into the null fields of `rec`.
    pub(crate) fn fill_defaults(&mut self, rec: usize) -> Result<()> {
        for index in 0..self.fields.len() {
            let field = &self.fields[index];
            if !field.is_null(rec) {
                continue;
            }
            if let Some(value) = field.resolve_default() {
                self.field_mut(index)?.set_value(rec, value)?;
            }
        }
        Ok(())
    }

    /// Undo the modifications of `rec` since its last commit point.
    pub fn rollback_record(&mut self, rec: usize) -> bool {
        if rec >= self.buffer_size() {
            return false;
        }
        self.pending.retain(|p| p.record != rec);
        self.records.rollback(&mut self.fields, rec)
    }

    /// Establish a commit point for every record.
    pub fn commit_trail(&mut self) {
        self.records.commit_trail();
    }

    // ========================================================================
    // Persistence images
    // ========================================================================

    fn require_table(&self) -> Result<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| Error::internal(format!("block {} is not bound to a table", self.name)))
    }

    /// Replace the buffer with fetched rows. Returns how many were kept.
    pub(crate) fn load_rows(&mut self, rows: &[Row]) -> Result<usize> {
        self.clear();
        let count = rows.len().min(self.buffer_size());
        for (rec, row) in rows.iter().take(count).enumerate() {
            self.apply_row(rec, row)?;
        }
        Ok(count)
    }

    /// Overwrite `rec` with a persisted row and mark it fetched and clean.
    pub(crate) fn apply_row(&mut self, rec: usize, row: &Row) -> Result<()> {
        for field in &mut self.fields {
            let Some(column) = field.column() else {
                continue;
            };
            let stored = row.get(column).cloned().unwrap_or(Value::Null);
            let value = field.kind().from_storage(stored).map_err(|code| {
                Error::internal(format!(
                    "{}.{}: stored value rejected ({})",
                    self.name,
                    field.name(),
                    code
                ))
            })?;
            field.store(rec, value, false);
        }

        let slot = self.records.slot_mut(rec);
        slot.reset();
        slot.set_fetched(true);
        slot.set_row(Some(RowRef {
            id: row.id,
            checksum: row.checksum,
        }));
        Ok(())
    }

    /// Row image of `rec` for save or delete.
    pub fn row_data(&self, rec: usize) -> Result<RowData> {
        let table = self.require_table()?.to_string();
        if rec >= self.buffer_size() {
            return Err(Error::internal(format!(
                "{}: record {} outside buffer",
                self.name, rec
            )));
        }
        let row = self.records.slot(rec).row();
        let columns = self
            .fields
            .iter()
            .filter_map(|f| {
                f.column().map(|column| ColumnValue {
                    column: column.to_string(),
                    value: f.storage_value(rec),
                    sql: f.sql(rec),
                })
            })
            .collect();
        Ok(RowData {
            table,
            id: row.map(|r| r.id),
            checksum: row.map(|r| r.checksum),
            columns,
        })
    }

    /// Query-by-example filter from the criteria in record 0.
    pub fn query_filter(&self) -> Result<QueryFilter> {
        let mut filter = QueryFilter::new(self.require_table()?);
        filter.limit = Some(self.buffer_size());
        for field in &self.fields {
            let Some(column) = field.column() else {
                continue;
            };
            if field.is_null(0) {
                continue;
            }
            filter.criteria.push(Criterion {
                column: column.to_string(),
                op: field.search_operator(),
                value: field.storage_value(0),
                sql: field.sql(0),
            });
        }
        Ok(filter)
    }

    // ========================================================================
    // Transition checkpoints
    // ========================================================================

    pub(crate) fn checkpoint(&self) -> BlockCheckpoint {
        BlockCheckpoint {
            fields: self.fields.clone(),
            records: self.records.clone(),
            mode: self.mode,
            active_field: self.active_field,
            pending: self.pending.clone(),
            events: self.events.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: BlockCheckpoint) {
        self.fields = checkpoint.fields;
        self.records = checkpoint.records;
        self.mode = checkpoint.mode;
        self.active_field = checkpoint.active_field;
        self.pending = checkpoint.pending;
        self.events.truncate(checkpoint.events);
    }

    pub(crate) fn set_master(&mut self, link: MasterLink) {
        self.master = Some(link);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Describes a block before its storage is allocated.
///
/// # Example
/// ```
/// use visforms::block::BlockBuilder;
/// use visforms::field::{FieldBuilder, FieldKind};
///
/// let emp = BlockBuilder::new("emp")
///     .table("emp")
///     .field(FieldBuilder::new("name", FieldKind::string(40)).mandatory())
///     .field(FieldBuilder::new("age", FieldKind::integer()))
///     .standard_commands();
/// assert_eq!(emp.name(), "emp");
/// ```
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    name: String,
    title: Option<String>,
    table: Option<String>,
    fields: Vec<FieldBuilder>,
    commands: Vec<Command>,
    standard_commands: bool,
    buffer_size: usize,
    display_size: usize,
    single_save: bool,
    accessible: bool,
    master: Option<(String, Vec<(String, String)>)>,
}

impl BlockBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            table: None,
            fields: Vec::new(),
            commands: Vec::new(),
            standard_commands: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            display_size: DEFAULT_DISPLAY_SIZE,
            single_save: false,
            accessible: true,
            master: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Add query, insert, save, delete, reset, block change and record
    /// navigation; multi-record blocks also get insert-line.
    pub fn standard_commands(mut self) -> Self {
        self.standard_commands = true;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn display_size(mut self, size: usize) -> Self {
        self.display_size = size;
        self
    }

    /// After saving an insert, stay in INSERT for the next record.
    pub fn single_save(mut self) -> Self {
        self.single_save = true;
        self
    }

    /// Exclude the block from block changes.
    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }

    /// Make this a detail of `master`, joined on `(detail field, master field)`.
    pub fn master(mut self, master: impl Into<String>, pairs: &[(&str, &str)]) -> Self {
        self.master = Some((
            master.into(),
            pairs
                .iter()
                .map(|(d, m)| (d.to_string(), m.to_string()))
                .collect(),
        ));
        self
    }

    pub(crate) fn master_spec(&self) -> Option<&(String, Vec<(String, String)>)> {
        self.master.as_ref()
    }

    fn config_error(&self, what: String) -> Error {
        Error::internal(format!("block {}: {}", self.name, what))
    }

    /// Allocate fields and buffer; resolve command targets.
    pub(crate) fn build(self, id: BlockId) -> Result<Block> {
        if self.buffer_size == 0 {
            return Err(self.config_error("buffer size must be at least 1".into()));
        }
        if self.display_size == 0 || self.display_size > self.buffer_size {
            return Err(self.config_error(format!(
                "display size {} outside 1..={}",
                self.display_size, self.buffer_size
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.fields.iter().find(|f| !seen.insert(f.name().to_string())) {
            return Err(self.config_error(format!("duplicate field {}", dup.name())));
        }
        for field in &self.fields {
            field
                .kind()
                .check_config()
                .map_err(|what| self.config_error(format!("field {}: {}", field.name(), what)))?;
        }

        let mut commands = Vec::new();
        if self.standard_commands {
            commands.extend([
                Command::new("query", CommandOp::MenuQuery),
                Command::new("insert", CommandOp::InsertMode),
                Command::new("save", CommandOp::SaveBlock),
                Command::new("delete", CommandOp::DeleteBlock),
                Command::new("reset", CommandOp::Reset),
                Command::new("block", CommandOp::ChangeBlock),
                Command::new("next", CommandOp::NextRecord),
                Command::new("previous", CommandOp::PreviousRecord),
            ]);
            if self.display_size > 1 {
                commands.push(Command::new("line", CommandOp::InsertLine));
            }
        }
        commands.extend(self.commands.iter().cloned());
        for command in &mut commands {
            if let Some(target) = command.target() {
                let index = self
                    .fields
                    .iter()
                    .position(|f| f.name() == target)
                    .ok_or_else(|| {
                        self.config_error(format!(
                            "command {} targets unknown field {}",
                            command.name(),
                            target
                        ))
                    })?;
                command.bind(CommandBinding::Field(index));
            }
        }

        let buffer_size = self.buffer_size;
        let fields = self
            .fields
            .into_iter()
            .enumerate()
            .map(|(i, f)| f.build(FieldId::new(id, i), buffer_size))
            .collect();

        Ok(Block {
            id,
            title: self.title.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            table: self.table,
            fields,
            commands,
            records: RecordBuffer::new(buffer_size),
            display_size: self.display_size,
            mode: Mode::Query,
            active_field: None,
            single_save: self.single_save,
            accessible: self.accessible,
            master: None,
            pending: Vec::new(),
            events: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SearchOperator;
    use crate::field::FieldKind;
    use crate::persistence::RowId;

    fn emp_block() -> Block {
        BlockBuilder::new("emp")
            .table("emp")
            .buffer_size(4)
            .field(FieldBuilder::new("name", FieldKind::string(20)))
            .field(FieldBuilder::new("age", FieldKind::integer()).default_value(Value::Int(18)))
            .field(FieldBuilder::new("go", FieldKind::Actor))
            .standard_commands()
            .build(BlockId::new(0))
            .unwrap()
    }

    fn row(id: u64, name: &str, age: i64) -> Row {
        Row::new(
            RowId(id),
            vec![
                ("name".to_string(), Value::Str(name.into())),
                ("age".to_string(), Value::Int(age)),
            ],
        )
    }

    #[test]
    fn test_build_defaults() {
        let block = emp_block();
        assert_eq!(block.title(), "emp");
        assert_eq!(block.mode(), Mode::Query);
        assert!(!block.is_multi());
        assert_eq!(block.fields().len(), 3);
        assert!(block.command("save").is_some());
        assert!(block.command("line").is_none());
    }

    #[test]
    fn test_build_rejects_bad_sizes() {
        let err = BlockBuilder::new("b")
            .buffer_size(2)
            .display_size(3)
            .build(BlockId::new(0))
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_build_rejects_unknown_command_target() {
        let err = BlockBuilder::new("b")
            .command(Command::new("inc", CommandOp::Increment).on_field("nope"))
            .build(BlockId::new(0))
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_build_rejects_duplicate_field() {
        let err = BlockBuilder::new("b")
            .field(FieldBuilder::new("x", FieldKind::integer()))
            .field(FieldBuilder::new("x", FieldKind::integer()))
            .build(BlockId::new(0))
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_build_rejects_unrenderable_fixed() {
        for kind in [FieldKind::fixed(4, 5), FieldKind::fixed(30, 25)] {
            let err = BlockBuilder::new("b")
                .field(FieldBuilder::new("amount", kind))
                .build(BlockId::new(0))
                .unwrap_err();
            assert!(matches!(err, Error::Internal(ref m) if m.contains("amount")));
        }
    }

    #[test]
    fn test_edit_text_checks_input() {
        let mut block = emp_block();
        assert_eq!(block.edit_text(1, "4x"), Ok(false));
        assert!(block.pending_edits().is_empty());

        assert_eq!(block.edit_text(1, "4"), Ok(true));
        assert_eq!(block.edit_text(1, "42"), Ok(true));
        assert_eq!(block.pending_edits().len(), 1);
        assert_eq!(block.pending_edits()[0].text, "42");
        assert!(block.is_changed());
    }

    #[test]
    fn test_load_rows_marks_fetched() {
        let mut block = emp_block();
        let rows = vec![row(1, "Ada", 36), row(2, "Alan", 41)];
        assert_eq!(block.load_rows(&rows), Ok(2));

        assert!(block.records().is_fetched(1));
        assert!(!block.records().is_changed(1));
        assert_eq!(block.field(0).unwrap().string(1), Some("Alan"));
        assert!(!block.is_record_filled(2));
        assert_eq!(block.records().slot(0).row().map(|r| r.id), Some(RowId(1)));
    }

    #[test]
    fn test_load_rows_truncates_to_buffer() {
        let mut block = emp_block();
        let rows: Vec<Row> = (0..6).map(|i| row(i, "x", i as i64)).collect();
        assert_eq!(block.load_rows(&rows), Ok(4));
    }

    #[test]
    fn test_row_data_skips_actor() {
        let mut block = emp_block();
        block.load_rows(&[row(7, "Ada", 36)]).unwrap();
        let data = block.row_data(0).unwrap();

        assert_eq!(data.id, Some(RowId(7)));
        assert_eq!(data.columns.len(), 2);
        assert_eq!(data.columns[0].sql, "'Ada'");
    }

    #[test]
    fn test_row_data_outside_buffer() {
        let block = emp_block();
        assert!(matches!(block.row_data(4), Err(Error::Internal(_))));
    }

    #[test]
    fn test_query_filter_from_record_zero() {
        let mut block = emp_block();
        block.field_mut(0).unwrap().set_string(0, "A%").unwrap();
        block
            .field_mut(0)
            .unwrap()
            .set_search_operator(SearchOperator::Like);

        let filter = block.query_filter().unwrap();
        assert_eq!(filter.criteria.len(), 1);
        assert_eq!(filter.to_sql(), "SELECT * FROM emp WHERE name LIKE 'A%'");
        assert_eq!(filter.limit, Some(4));
    }

    #[test]
    fn test_unbound_block_has_no_filter() {
        let mut block = BlockBuilder::new("ctl").build(BlockId::new(0)).unwrap();
        assert!(matches!(block.query_filter(), Err(Error::Internal(_))));
        assert!(block.field_mut(0).is_err());
    }

    #[test]
    fn test_fill_defaults_only_null_fields() {
        let mut block = emp_block();
        block.fill_defaults(0).unwrap();
        assert_eq!(block.field(1).unwrap().int(0), Some(18));
        assert_eq!(block.first_unfilled_field(0), Some(0));
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut block = emp_block();
        let checkpoint = block.checkpoint();

        block.field_mut(0).unwrap().set_string(0, "x").unwrap();
        block.set_mode(Mode::Insert);
        block.restore(checkpoint);

        assert_eq!(block.mode(), Mode::Query);
        assert!(block.field(0).unwrap().is_null(0));
        assert!(!block.records().is_changed(0));
        assert!(block.take_events().is_empty());
    }

    #[test]
    fn test_rollback_record() {
        let mut block = emp_block();
        block.load_rows(&[row(1, "Ada", 36)]).unwrap();
        block.field_mut(1).unwrap().set_int(0, 37).unwrap();

        assert!(block.rollback_record(0));
        assert_eq!(block.field(1).unwrap().int(0), Some(36));
        assert!(!block.records().is_changed(0));
    }

    #[test]
    fn test_insert_blank_moves_pending() {
        let mut block = emp_block();
        block.edit_text(0, "x").unwrap();
        block.insert_blank(0);
        assert_eq!(block.pending_edits()[0].record, 1);
    }
}
