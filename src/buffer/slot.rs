//! RecordSlot - per-record bookkeeping in a block's buffer.
//!
//! A [`RecordSlot`] carries no field content. It holds the flags that
//! describe where the record came from and what happened to it since:
//! - Whether it was loaded from storage (fetched)
//! - Whether it was modified (changed) or marked for removal (deleted)
//! - Whether a backup copy exists (trailed)

use crate::persistence::RowId;

/// Identity of a persisted row, as seen when the record was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub id: RowId,
    /// Checksum of the row at fetch time, for lost-update detection.
    pub checksum: u32,
}

/// Flags of one record slot.
///
/// The four flags are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSlot {
    fetched: bool,
    changed: bool,
    deleted: bool,
    trailed: bool,
    /// `changed` as it was when the backup was taken.
    trailed_changed: bool,
    row: Option<RowRef>,
}

impl RecordSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Origin
    // ========================================================================

    #[inline]
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    #[inline]
    pub fn set_fetched(&mut self, fetched: bool) {
        self.fetched = fetched;
        if !fetched {
            self.row = None;
        }
    }

    /// The persisted row this record mirrors, if any.
    #[inline]
    pub fn row(&self) -> Option<RowRef> {
        self.row
    }

    pub fn set_row(&mut self, row: Option<RowRef>) {
        self.row = row;
    }

    // ========================================================================
    // Dirty and deleted flags
    // ========================================================================

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    #[inline]
    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    #[inline]
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    // ========================================================================
    // Trail state
    // ========================================================================

    #[inline]
    pub fn is_trailed(&self) -> bool {
        self.trailed
    }

    /// Record that a backup was taken, remembering the current dirty flag.
    pub(crate) fn mark_trailed(&mut self) {
        self.trailed = true;
        self.trailed_changed = self.changed;
    }

    /// Drop the backup marker. Returns the dirty flag saved with it.
    pub(crate) fn release_trail(&mut self) -> bool {
        self.trailed = false;
        self.trailed_changed
    }

    /// Reset the slot to empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_new() {
        let slot = RecordSlot::new();
        assert!(!slot.is_fetched());
        assert!(!slot.is_changed());
        assert!(!slot.is_deleted());
        assert!(!slot.is_trailed());
        assert_eq!(slot.row(), None);
    }

    #[test]
    fn test_slot_flags_independent() {
        let mut slot = RecordSlot::new();
        slot.set_changed(true);
        slot.set_deleted(true);
        assert!(slot.is_changed());
        assert!(!slot.is_fetched());

        slot.set_changed(false);
        assert!(slot.is_deleted());
    }

    #[test]
    fn test_slot_unfetch_drops_row() {
        let mut slot = RecordSlot::new();
        slot.set_fetched(true);
        slot.set_row(Some(RowRef {
            id: RowId(7),
            checksum: 1,
        }));
        slot.set_fetched(false);
        assert_eq!(slot.row(), None);
    }

    #[test]
    fn test_slot_trail_remembers_changed() {
        let mut slot = RecordSlot::new();
        slot.set_changed(false);
        slot.mark_trailed();
        slot.set_changed(true);

        assert!(slot.is_trailed());
        assert!(!slot.release_trail());
        assert!(!slot.is_trailed());
    }

    #[test]
    fn test_slot_reset() {
        let mut slot = RecordSlot::new();
        slot.set_fetched(true);
        slot.set_changed(true);
        slot.mark_trailed();

        slot.reset();

        assert_eq!(slot, RecordSlot::new());
    }
}
