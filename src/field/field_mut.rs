//! FieldMut - mutation handle for one field of a block.
//!
//! Field setters need more than the field: they trail the record before
//! writing, flag it changed, and publish a change event. A [`FieldMut`]
//! borrows exactly those pieces of the owning block for its lifetime.
//!
//! # Example
//! ```ignore
//! let mut day = block.field_mut(2);
//! day.set_int(rec, 4)?;   // trails rec, marks it changed, emits ValueChanged
//! let label = day.text(rec); // Deref to &Field
//! ```

use std::ops::Deref;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{datetime, Field, FieldKind, Value};
use crate::block::BlockEvent;
use crate::buffer::RecordBuffer;
use crate::common::{Error, Result, SearchOperator};
use crate::presentation::Presentation;

/// Exclusive access to one field plus the record state it must keep in sync.
pub struct FieldMut<'a> {
    fields: &'a mut [Field],
    index: usize,
    records: &'a mut RecordBuffer,
    events: &'a mut Vec<BlockEvent>,
}

impl<'a> FieldMut<'a> {
    /// Called by `Block::field_mut()`.
    pub(crate) fn new(
        fields: &'a mut [Field],
        index: usize,
        records: &'a mut RecordBuffer,
        events: &'a mut Vec<BlockEvent>,
    ) -> Self {
        debug_assert!(index < fields.len());
        Self {
            fields,
            index,
            records,
            events,
        }
    }

    fn check_slot(&self, rec: usize) -> Result<()> {
        if rec >= self.records.buffer_size() {
            return Err(Error::internal(format!(
                "{}: record {} outside buffer",
                self.fields[self.index].name(),
                rec
            )));
        }
        Ok(())
    }

    /// Mark `rec` changed and publish the change.
    fn fire_value_changed(&mut self, rec: usize) {
        self.records.set_changed(rec, true);
        self.events.push(BlockEvent::ValueChanged {
            field: self.fields[self.index].id(),
            record: rec,
        });
    }

    /// Write `value` into `rec`.
    ///
    /// The record is trailed first. Storage is only touched when the value
    /// differs, unless `force` is set (the display was edited but produced an
    /// equal value). Returns whether the value changed.
    pub(crate) fn assign(&mut self, rec: usize, value: Value, force: bool) -> Result<bool> {
        self.check_slot(rec)?;
        let value = value.normalized();
        let field = &self.fields[self.index];
        if !field.kind().accepts(&value) {
            return Err(Error::internal(format!(
                "{} ({}) cannot hold {} value {}",
                field.name(),
                field.kind().type_name(),
                value.kind_name(),
                value
            )));
        }

        self.records.trail(self.fields, rec);
        let changed = self.fields[self.index].store(rec, value, force);
        if changed || force {
            self.fire_value_changed(rec);
        }
        Ok(changed)
    }

    // ========================================================================
    // Typed setters
    // ========================================================================

    pub fn set_value(&mut self, rec: usize, value: Value) -> Result<bool> {
        self.assign(rec, value, false)
    }

    pub fn set_null(&mut self, rec: usize) -> Result<bool> {
        self.assign(rec, Value::Null, false)
    }

    pub fn set_string(&mut self, rec: usize, value: impl Into<String>) -> Result<bool> {
        self.assign(rec, Value::Str(value.into()), false)
    }

    pub fn set_int(&mut self, rec: usize, value: i64) -> Result<bool> {
        self.assign(rec, Value::Int(value), false)
    }

    /// Set a fixed-point value from scaled units.
    pub fn set_fixed(&mut self, rec: usize, units: i64) -> Result<bool> {
        self.assign(rec, Value::Fixed(units), false)
    }

    /// Set a code-domain field by index.
    pub fn set_code(&mut self, rec: usize, index: usize) -> Result<bool> {
        self.assign(rec, Value::Code(index), false)
    }

    /// Set a boolean code-domain field by its code.
    pub fn set_bool(&mut self, rec: usize, value: bool) -> Result<bool> {
        let index = match self.kind() {
            FieldKind::Code(domain) => domain.index_of_bool(value),
            _ => None,
        };
        match index {
            Some(idx) => self.set_code(rec, idx),
            None => Err(Error::internal(format!("{} has no boolean code {}", self.name(), value))),
        }
    }

    pub fn set_date(&mut self, rec: usize, value: NaiveDate) -> Result<bool> {
        self.assign(rec, Value::Date(value), false)
    }

    /// Set a month; the day is normalised to the first.
    pub fn set_month(&mut self, rec: usize, value: NaiveDate) -> Result<bool> {
        self.assign(rec, Value::Month(datetime::first_of_month(&value)), false)
    }

    /// Set a time; sub-second precision is dropped.
    pub fn set_time(&mut self, rec: usize, value: NaiveTime) -> Result<bool> {
        self.assign(rec, Value::Time(datetime::whole_seconds(value)), false)
    }

    pub fn set_timestamp(&mut self, rec: usize, value: NaiveDateTime) -> Result<bool> {
        self.assign(rec, Value::Timestamp(datetime::whole_seconds(value)), false)
    }

    pub fn set_image(&mut self, rec: usize, bytes: Vec<u8>) -> Result<bool> {
        self.assign(rec, Value::Image(bytes), false)
    }

    // ========================================================================
    // Editing operations
    // ========================================================================

    /// Authoritative validation of typed text, run on field exit.
    ///
    /// Sets the converted value or fails with a field error. `changed_ui`
    /// forces the write even when the model value is equal.
    pub fn check_type(
        &mut self,
        rec: usize,
        text: &str,
        changed_ui: bool,
        ui: &mut dyn Presentation,
    ) -> Result<bool> {
        self.check_slot(rec)?;
        let value = self.fields[self.index].resolve_text(rec, text, ui)?;
        self.assign(rec, value, changed_ui)
    }

    /// Move to the next (or previous, with `desc`) value of the field's list.
    pub fn enumerate_value(&mut self, rec: usize, desc: bool) -> Result<bool> {
        self.check_slot(rec)?;
        let value = self.fields[self.index].next_value(rec, desc)?;
        self.assign(rec, value, false)
    }

    /// Copy the value of slot `from` into slot `to`.
    ///
    /// Both may address the backup half. A change is published only when the
    /// destination is a live slot and its value actually changed.
    pub fn copy_record(&mut self, from: usize, to: usize) -> Result<bool> {
        let slots = 2 * self.records.buffer_size();
        if from >= slots || to >= slots {
            return Err(Error::internal(format!(
                "{}: copy {} -> {} outside value array",
                self.name(),
                from,
                to
            )));
        }
        let live = to < self.records.buffer_size();
        if live {
            self.records.trail(self.fields, to);
        }
        let changed = self.fields[self.index].copy_slot(from, to);
        if changed && live {
            self.fire_value_changed(to);
        }
        Ok(changed)
    }

    pub fn set_search_operator(&mut self, op: SearchOperator) {
        self.fields[self.index].set_search_operator(op);
    }
}

impl Deref for FieldMut<'_> {
    type Target = Field;

    #[inline]
    fn deref(&self) -> &Field {
        &self.fields[self.index]
    }
}
