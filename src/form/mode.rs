//! The block mode state machine.
//!
//! ```text
//!            menu_query (rows)            insert_mode
//!   QUERY ───────────────────────► UPDATE ───────────► INSERT
//!     ▲  ◄────────────────────────   │                   │
//!     │     reset / last delete      │ save: next record │ save: reset form
//!     │                              ▼                   │ (single save: stay)
//!     └───────────────────────── reset ◄─────────────────┘
//! ```
//!
//! Every transition that touches block state runs inside
//! [`Form::transition`], so a failing step leaves the block as it was.

use tracing::{debug, info};

use super::{Form, FormFlavor, Trigger, TriggerSite};
use crate::buffer::Direction;
use crate::common::messages::{DISCARD_CHANGES, NOT_ALLOWED_IN_MODE, NOT_ALLOWED_ON_MULTI, VALUE_REQUIRED};
use crate::common::{BlockId, Error, FieldError, Mode, Result};

fn site(field: Option<usize>, record: usize) -> TriggerSite {
    TriggerSite { field, record }
}

impl Form {
    // ========================================================================
    // Validation cascade
    // ========================================================================

    /// Validate one field of one record.
    ///
    /// Converts pending typed text (forcing the write so triggers see the
    /// edit), then fires VALFLD and, when the value changed, POSTCHG.
    pub fn validate_field(&mut self, id: BlockId, field: usize, rec: usize) -> Result<()> {
        let Form {
            blocks,
            presentation,
            name,
            ..
        } = self;
        let block = blocks
            .get_mut(id.0)
            .ok_or_else(|| Error::internal(format!("form {} has no {}", name, id)))?;

        let changed = match block.take_pending_for(field, rec) {
            Some(edit) => {
                let checked = block
                    .field_mut(field)
                    .and_then(|mut f| f.check_type(rec, &edit.text, true, presentation.as_mut()));
                match checked {
                    Ok(changed) => changed,
                    Err(err) => {
                        block.restore_pending(edit);
                        return Err(err);
                    }
                }
            }
            None => false,
        };

        self.fire(Trigger::ValidateField, id, site(Some(field), rec))?;
        if changed {
            self.fire(Trigger::PostChange, id, site(Some(field), rec))?;
        }
        Ok(())
    }

    /// Validate every pending edit of a block, optionally only one record's.
    pub(crate) fn apply_pending(&mut self, id: BlockId, only_record: Option<usize>) -> Result<()> {
        let keys = self.get(id)?.pending_keys();
        for (field, rec) in keys {
            if only_record.map_or(true, |r| r == rec) {
                self.validate_field(id, field, rec)?;
            }
        }
        Ok(())
    }

    /// Mandatory checks and VALREC for one record.
    ///
    /// QUERY mode and deleted records are exempt from mandatory checks.
    pub fn validate_record(&mut self, id: BlockId, rec: usize) -> Result<()> {
        let block = self.get(id)?;
        if rec >= block.buffer_size() {
            return Err(Error::internal(format!(
                "{}: record {} outside buffer",
                block.name(),
                rec
            )));
        }
        if block.mode() != Mode::Query && !block.records().is_deleted(rec) {
            if let Some(missing) = block
                .fields()
                .iter()
                .find(|f| f.is_mandatory() && f.is_null(rec))
            {
                return Err(FieldError::new(missing.id(), VALUE_REQUIRED)
                    .with_arg(missing.label())
                    .into());
            }
        }
        if block.is_multi() {
            self.fire(Trigger::ValidateRecord, id, site(None, rec))?;
        }
        Ok(())
    }

    /// Full validation before leaving or saving a block.
    pub fn validate_block(&mut self, id: BlockId) -> Result<()> {
        self.apply_pending(id, None)?;
        let block = self.get(id)?;
        if block.mode() != Mode::Query {
            let rec = block.active_record();
            self.validate_record(id, rec)?;
        }
        let rec = self.get(id)?.active_record();
        self.fire(Trigger::ValidateBlock, id, site(None, rec))
    }

    // ========================================================================
    // Record navigation
    // ========================================================================

    /// Move the cursor of block `id` to `rec`.
    ///
    /// Multi-record blocks validate the record being left and fire POSTREC
    /// and PREREC around the move.
    pub fn goto_record(&mut self, id: BlockId, rec: usize) -> Result<()> {
        let block = self.get(id)?;
        if rec >= block.buffer_size() {
            return Err(Error::internal(format!(
                "{}: record {} outside buffer of {}",
                block.name(),
                rec,
                block.buffer_size()
            )));
        }
        let current = block.active_record();
        if rec == current {
            return Ok(());
        }

        let multi = block.is_multi();
        if multi {
            let live = block.is_record_filled(current) || block.records().is_changed(current);
            self.apply_pending(id, Some(current))?;
            if live {
                self.validate_record(id, current)?;
            }
            self.fire(Trigger::PostRecord, id, site(None, current))?;
        }
        self.get_mut(id)?.set_active_record(rec)?;
        if multi {
            self.fire(Trigger::PreRecord, id, site(None, rec))?;
        }
        Ok(())
    }

    /// Move to the nearest filled, non-deleted record in `direction`.
    ///
    /// Fails with [`Error::NoData`] when there is none.
    pub fn fetch_next_record(&mut self, id: BlockId, direction: Direction) -> Result<()> {
        let block = self.get(id)?;
        let next = block
            .records()
            .next_live(block.fields(), block.active_record(), direction)?;
        self.goto_record(id, next)
    }

    // ========================================================================
    // Mode transitions
    // ========================================================================

    /// Switch a single-record block to INSERT mode.
    ///
    /// The active record becomes the template of the new one: its values
    /// are copied into record 0, which is then detached from storage and
    /// completed with defaults. Unsaved UPDATE changes need confirmation
    /// and are rolled back first.
    pub fn insert_mode(&mut self, id: BlockId) -> Result<()> {
        let block = self.get(id)?;
        if block.is_multi() {
            return Err(Error::exec(NOT_ALLOWED_ON_MULTI));
        }
        match block.mode() {
            Mode::Insert => return Err(Error::exec(NOT_ALLOWED_IN_MODE)),
            Mode::Update if block.is_changed() => {
                if !self.ask(DISCARD_CHANGES) {
                    return Err(Error::Aborted);
                }
            }
            Mode::Query => self.apply_pending(id, None)?,
            Mode::Update => {}
        }

        self.transition(id, |form| {
            let block = form.get_mut(id)?;
            let active = block.active_record();
            if block.mode() == Mode::Update {
                block.rollback_record(active);
            }
            let changed = block.records().is_changed(active);

            for index in 0..block.fields().len() {
                block.field_mut(index)?.copy_record(active, 0)?;
            }
            for rec in 1..block.buffer_size() {
                block.clear_record(rec);
            }
            let records = block.records_mut();
            records.set_fetched(0, false);
            records.set_deleted(0, false);
            block.fill_defaults(0)?;
            block.commit_trail();
            block.records_mut().set_changed(0, changed);
            block.set_active_record(0)?;
            block.set_mode(Mode::Insert);

            let target = block.first_unfilled_field(0);
            form.focus_field(id, target, 0);
            Ok(())
        })
    }

    /// Discard the block's contents and return to QUERY.
    ///
    /// Unsaved changes need confirmation. In a dictionary form the whole
    /// form is reset instead.
    pub fn reset_block(&mut self, id: BlockId) -> Result<()> {
        let block = self.get(id)?;
        if block.is_changed() && !self.ask(DISCARD_CHANGES) {
            return Err(Error::Aborted);
        }
        if self.flavor() == FormFlavor::Dictionary {
            self.reset_form();
            return Ok(());
        }
        self.transition(id, |form| {
            let block = form.get_mut(id)?;
            block.clear();
            block.set_mode(Mode::Query);
            form.focus_block(id);
            Ok(())
        })
    }

    /// Clear every block without asking and return them all to QUERY.
    pub fn reset_form(&mut self) {
        for block in &mut self.blocks {
            block.clear();
            block.set_mode(Mode::Query);
            block.set_active_field(None);
        }
        self.active_block = 0;
        info!(form = %self.name(), "form reset");
        self.focus_block(BlockId::new(0));
    }

    /// Follow-up after a successful save of block `id`.
    ///
    /// - INSERT with single save: clear, re-arm defaults, stay in INSERT
    /// - INSERT otherwise: reset the form
    /// - UPDATE: move to the next record, or back to QUERY if none is left
    pub fn save_done(&mut self, id: BlockId, single_save: bool) -> Result<()> {
        match self.get(id)?.mode() {
            Mode::Insert if single_save => {
                let block = self.get_mut(id)?;
                block.clear();
                block.fill_defaults(0)?;
                block.commit_trail();
                block.records_mut().set_changed(0, false);
                let target = block.first_unfilled_field(0);
                self.focus_field(id, target, 0);
                Ok(())
            }
            Mode::Insert => {
                self.reset_form();
                Ok(())
            }
            Mode::Update => match self.fetch_next_record(id, Direction::Forward) {
                Err(Error::NoData) => {
                    debug!(block = %self.get(id)?.name(), "no further record after save");
                    let block = self.get_mut(id)?;
                    block.clear();
                    block.set_mode(Mode::Query);
                    self.focus_block(id);
                    Ok(())
                }
                other => other,
            },
            Mode::Query => Err(Error::internal(format!(
                "{}: save completed in QUERY mode",
                self.get(id)?.name()
            ))),
        }
    }

    // ========================================================================
    // Block navigation
    // ========================================================================

    /// Make `target` the active block.
    ///
    /// The current block is validated first; POSTBLK and PREBLK fire
    /// around the switch.
    pub fn enter_block(&mut self, target: BlockId) -> Result<()> {
        self.get(target)?;
        let current = self.active_block();
        if current != target {
            self.validate_block(current)?;
            let rec = self.get(current)?.active_record();
            self.fire(Trigger::PostBlock, current, site(None, rec))?;
            self.active_block = target.0;
            let rec = self.get(target)?.active_record();
            if let Err(err) = self.fire(Trigger::PreBlock, target, site(None, rec)) {
                self.active_block = current.0;
                return Err(err);
            }
            debug!(from = %current, to = %target, "block entered");
        }
        self.focus_block(target);
        Ok(())
    }
}
