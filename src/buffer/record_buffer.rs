//! RecordBuffer - the fixed-capacity record slots of one block.
//!
//! Field content lives in the fields; the buffer holds the per-record flags
//! and the active-record cursor. Operations that need both (filled test,
//! trailing, rollback, navigation) take the block's fields as a slice.

use tracing::trace;

use super::slot::RecordSlot;
use crate::common::{Error, Result};
use crate::field::{Field, Value};

/// Navigation direction for [`RecordBuffer::next_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// `+1` or `-1`.
    pub fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Record slots plus the active-record cursor.
///
/// # Invariant
/// `active < buffer_size` at all times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBuffer {
    slots: Vec<RecordSlot>,
    active: usize,
}

impl RecordBuffer {
    /// Allocate `buffer_size` empty slots.
    ///
    /// # Panics
    /// Panics if `buffer_size` is 0.
    pub fn new(buffer_size: usize) -> Self {
        assert!(buffer_size > 0, "buffer size must be at least 1");
        Self {
            slots: vec![RecordSlot::new(); buffer_size],
            active: 0,
        }
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.slots.len()
    }

    /// The active record (cursor).
    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    pub(crate) fn set_active(&mut self, rec: usize) -> Result<()> {
        if rec >= self.slots.len() {
            return Err(Error::internal(format!(
                "record {} outside buffer of {}",
                rec,
                self.slots.len()
            )));
        }
        self.active = rec;
        Ok(())
    }

    // ========================================================================
    // Slot flags
    // ========================================================================

    /// # Panics
    /// Panics if `rec >= buffer_size`.
    #[inline]
    pub fn slot(&self, rec: usize) -> &RecordSlot {
        &self.slots[rec]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, rec: usize) -> &mut RecordSlot {
        &mut self.slots[rec]
    }

    pub fn is_changed(&self, rec: usize) -> bool {
        self.slots[rec].is_changed()
    }

    pub fn set_changed(&mut self, rec: usize, changed: bool) {
        self.slots[rec].set_changed(changed);
    }

    pub fn is_fetched(&self, rec: usize) -> bool {
        self.slots[rec].is_fetched()
    }

    pub fn set_fetched(&mut self, rec: usize, fetched: bool) {
        self.slots[rec].set_fetched(fetched);
    }

    pub fn is_deleted(&self, rec: usize) -> bool {
        self.slots[rec].is_deleted()
    }

    pub fn set_deleted(&mut self, rec: usize, deleted: bool) {
        self.slots[rec].set_deleted(deleted);
    }

    pub fn is_trailed(&self, rec: usize) -> bool {
        self.slots[rec].is_trailed()
    }

    /// Whether any slot is dirty.
    pub fn any_changed(&self) -> bool {
        self.slots.iter().any(RecordSlot::is_changed)
    }

    // ========================================================================
    // Content-dependent queries
    // ========================================================================

    /// A record is filled if any field holds a non-null value in it.
    pub fn is_filled(&self, fields: &[Field], rec: usize) -> bool {
        fields.iter().any(|f| !f.is_null(rec))
    }

    /// Number of filled slots.
    pub fn filled_count(&self, fields: &[Field]) -> usize {
        (0..self.slots.len())
            .filter(|&rec| self.is_filled(fields, rec))
            .count()
    }

    /// Nearest filled, non-deleted record after `from` in `direction`.
    ///
    /// Fails with [`Error::NoData`] when none exists.
    pub fn next_live(&self, fields: &[Field], from: usize, direction: Direction) -> Result<usize> {
        let mut rec = from;
        loop {
            rec = match rec.checked_add_signed(direction.step()) {
                Some(next) if next < self.slots.len() => next,
                _ => return Err(Error::NoData),
            };
            if !self.slots[rec].is_deleted() && self.is_filled(fields, rec) {
                return Ok(rec);
            }
        }
    }

    // ========================================================================
    // Trailing
    // ========================================================================

    /// Back up `rec` into the upper half of every field's value array.
    ///
    /// Idempotent until the next commit point: returns `false` and keeps the
    /// first backup if the record is already trailed.
    pub fn trail(&mut self, fields: &mut [Field], rec: usize) -> bool {
        if self.slots[rec].is_trailed() {
            return false;
        }
        let backup = self.slots.len() + rec;
        for field in fields.iter_mut() {
            field.copy_slot(rec, backup);
        }
        self.slots[rec].mark_trailed();
        trace!(record = rec, "record trailed");
        true
    }

    /// Restore `rec` from its backup, including its dirty flag.
    ///
    /// Returns `false` if there was nothing to restore.
    pub fn rollback(&mut self, fields: &mut [Field], rec: usize) -> bool {
        if !self.slots[rec].is_trailed() {
            return false;
        }
        let backup = self.slots.len() + rec;
        for field in fields.iter_mut() {
            field.copy_slot(backup, rec);
        }
        let changed = self.slots[rec].release_trail();
        self.slots[rec].set_changed(changed);
        trace!(record = rec, "record rolled back");
        true
    }

    /// Establish a commit point: existing backups are discarded.
    pub fn commit_trail(&mut self) {
        for slot in &mut self.slots {
            slot.release_trail();
        }
    }

    // ========================================================================
    // Structural changes
    // ========================================================================

    /// Null one record (live and backup) and reset its flags.
    pub(crate) fn clear_slot(&mut self, fields: &mut [Field], rec: usize) {
        let backup = self.slots.len() + rec;
        for field in fields.iter_mut() {
            field.store(rec, Value::Null, false);
            field.store(backup, Value::Null, false);
        }
        self.slots[rec].reset();
    }

    /// Shift records `at..` down by one and leave a blank record at `at`.
    ///
    /// The last record falls off; callers check it is empty first.
    pub(crate) fn insert_blank(&mut self, fields: &mut [Field], at: usize) {
        let size = self.slots.len();
        for rec in (at + 1..size).rev() {
            for field in fields.iter_mut() {
                field.copy_slot(rec - 1, rec);
                field.copy_slot(size + rec - 1, size + rec);
            }
            self.slots[rec] = self.slots[rec - 1].clone();
        }
        self.clear_slot(fields, at);
    }

    /// Reset every slot and the cursor. Field content is left alone.
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
        self.active = 0;
    }
}
