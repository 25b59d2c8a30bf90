//! The predefined commands.
//!
//! Each command follows the same skeleton: check the block's preconditions,
//! validate, run triggers and persistence work, then update the block
//! through an atomic transition. Persistence work always runs inside
//! [`Form::in_transaction`].

use tracing::{debug, warn};

use crate::buffer::Direction;
use crate::common::messages::{
    BUFFER_FULL, CONFIRM_DELETE, DISCARD_CHANGES, NOT_ALLOWED_IN_MODE, NOT_ALLOWED_ON_MULTI,
    NO_OTHER_BLOCK, NO_RECORDS_FOUND, ONLY_ON_MULTI, RECORD_EMPTY, SAVE_UNCHANGED, SELECT_BLOCK,
    SELECT_OPERATOR,
};
use crate::common::{BlockId, Error, Mode, Result, SearchOperator};
use crate::form::{Form, Trigger, TriggerSite};
use crate::persistence::{Criterion, QueryFilter, Row};
use crate::presentation::Selection;

fn site(record: usize) -> TriggerSite {
    TriggerSite {
        field: None,
        record,
    }
}

fn require_mode(form: &Form, id: BlockId, mode: Mode) -> Result<()> {
    if form.get(id)?.mode() == mode {
        Ok(())
    } else {
        Err(Error::exec(NOT_ALLOWED_IN_MODE))
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Query filter of block `id`, restricted to its master's active record.
fn detail_filter(form: &Form, id: BlockId) -> Result<QueryFilter> {
    let block = form.get(id)?;
    let mut filter = block.query_filter()?;
    let Some(link) = block.master() else {
        return Ok(filter);
    };
    let master = form.get(link.master)?;
    let rec = master.active_record();
    if master.mode() == Mode::Query || !master.is_record_filled(rec) {
        return Ok(filter);
    }
    for &(detail, master_field) in &link.pairs {
        let (Some(detail), Some(source)) = (block.field(detail), master.field(master_field)) else {
            return Err(Error::internal(format!("{}: broken master link", block.name())));
        };
        let Some(column) = detail.column() else {
            continue;
        };
        filter.criteria.retain(|c| c.column != column);
        filter.criteria.push(Criterion {
            column: column.to_string(),
            op: SearchOperator::Equal,
            value: source.storage_value(rec),
            sql: source.sql(rec),
        });
    }
    Ok(filter)
}

/// Load rows into block `id`.
///
/// With `require_rows`, an empty result fails with `NO_RECORDS_FOUND` and
/// leaves the block untouched; otherwise an empty result leaves the block
/// cleared in QUERY mode.
fn load_block(form: &mut Form, id: BlockId, require_rows: bool) -> Result<usize> {
    form.fire(Trigger::PreQuery, id, site(0))?;
    let filter = detail_filter(form, id)?;
    debug!(block = %form.get(id)?.name(), sql = %filter.to_sql(), "query");
    let rows = form.in_transaction(|store| store.load(&filter))?;
    if rows.is_empty() && require_rows {
        return Err(Error::exec(NO_RECORDS_FOUND));
    }

    form.transition(id, |form| {
        let block = form.get_mut(id)?;
        let count = block.load_rows(&rows)?;
        block.set_mode(if count > 0 { Mode::Update } else { Mode::Query });
        let multi = block.is_multi();
        let first = block.first_enterable_field();
        form.fire(Trigger::PostQuery, id, site(0))?;
        if multi && count > 0 {
            form.fire(Trigger::PreRecord, id, site(0))?;
        }
        form.focus_field(id, first, 0);
        Ok(count)
    })
}

/// Query block `id` using the criteria typed into its first record.
pub fn menu_query(form: &mut Form, id: BlockId) -> Result<()> {
    require_mode(form, id, Mode::Query)?;
    form.validate_block(id)?;
    let count = load_block(form, id, true)?;
    debug!(block = %form.get(id)?.name(), rows = count, "query loaded");
    Ok(())
}

fn query_details(form: &mut Form, master: BlockId) -> Result<()> {
    let details: Vec<BlockId> = form
        .blocks()
        .iter()
        .filter(|b| b.master().map(|l| l.master) == Some(master))
        .map(|b| b.id())
        .collect();
    for detail in details {
        if form.get(detail)?.is_changed() && !form.ask(DISCARD_CHANGES) {
            return Err(Error::Aborted);
        }
        load_block(form, detail, false)?;
        query_details(form, detail)?;
    }
    Ok(())
}

/// Query block `id`, then every detail below it, depth first.
pub fn recursive_query(form: &mut Form, id: BlockId) -> Result<()> {
    menu_query(form, id)?;
    query_details(form, id)
}

/// Query block `id`, then enter the next block in form order.
pub fn query_move(form: &mut Form, id: BlockId) -> Result<()> {
    menu_query(form, id)?;
    let next = BlockId::new(id.0 + 1);
    if form.block(next).is_none() {
        return Err(Error::internal(format!(
            "{}: no block follows for query and continue",
            form.get(id)?.name()
        )));
    }
    form.enter_block(next)
}

/// Query block `id` and every table-bound block after it.
pub fn serial_query(form: &mut Form, id: BlockId) -> Result<()> {
    menu_query(form, id)?;
    for index in id.0 + 1..form.blocks().len() {
        let next = BlockId::new(index);
        // blocks without a table hold no rows to load
        if form.get(next)?.table().is_some() {
            load_block(form, next, false)?;
        }
    }
    Ok(())
}

// ============================================================================
// Save and delete
// ============================================================================

/// Save the active record of a single-record block.
///
/// Saving an unchanged record asks first; declining ends the command
/// without opening a transaction. Once the transaction commits, the record
/// holds the stored row even if POSTINS or POSTUPD fails afterwards.
pub fn save_block(form: &mut Form, id: BlockId) -> Result<()> {
    let block = form.get(id)?;
    if block.is_multi() {
        return Err(Error::exec(NOT_ALLOWED_ON_MULTI));
    }
    if block.mode() == Mode::Query {
        return Err(Error::exec(NOT_ALLOWED_IN_MODE));
    }
    form.validate_block(id)?;

    let block = form.get(id)?;
    if !block.is_changed() && !form.ask(SAVE_UNCHANGED) {
        debug!(block = %form.get(id)?.name(), "unchanged save declined");
        return Ok(());
    }

    let block = form.get(id)?;
    let inserting = block.mode() == Mode::Insert;
    let rec = block.active_record();
    let (pre, post) = if inserting {
        (Trigger::PreInsert, Trigger::PostInsert)
    } else {
        (Trigger::PreUpdate, Trigger::PostUpdate)
    };

    form.fire(pre, id, site(rec))?;
    let data = form.get(id)?.row_data(rec)?;
    let row = form.in_transaction(|store| {
        let saved = store.save(&data)?;
        let row = store.fetch_record(&data.table, saved.id)?;
        Ok(row.unwrap_or_else(|| {
            Row::new(
                saved.id,
                data.columns
                    .iter()
                    .map(|c| (c.column.clone(), c.value.clone()))
                    .collect(),
            )
        }))
    })?;
    debug!(block = %form.get(id)?.name(), row = %row.id, inserting, "record saved");

    // the row is committed, so the buffer follows it whatever the post
    // trigger does
    let block = form.get_mut(id)?;
    block.apply_row(rec, &row)?;
    block.commit_trail();
    let single_save = block.is_single_save();
    if let Err(err) = form.fire(post, id, site(rec)) {
        warn!(block = %form.get(id)?.name(), row = %row.id, error = %err, "post-save trigger failed");
        if inserting {
            // the new row exists now; saving again must update it
            form.get_mut(id)?.set_mode(Mode::Update);
        }
        return Err(err);
    }
    form.transition(id, |form| form.save_done(id, single_save))
}

/// Delete the active record after confirmation.
///
/// The cursor then moves to the next live record, or the previous one, or
/// the block returns to QUERY when none is left. A failing POSTDEL leaves
/// the committed record marked deleted and the cursor in place.
pub fn delete_block(form: &mut Form, id: BlockId) -> Result<()> {
    require_mode(form, id, Mode::Update)?;
    let block = form.get(id)?;
    let rec = block.active_record();
    if !block.records().is_fetched(rec) || block.records().is_deleted(rec) {
        return Err(Error::exec(RECORD_EMPTY));
    }
    if !form.ask(CONFIRM_DELETE) {
        return Err(Error::Aborted);
    }

    form.fire(Trigger::PreDelete, id, site(rec))?;
    let data = form.get(id)?.row_data(rec)?;
    form.in_transaction(|store| store.delete(&data))?;
    debug!(block = %form.get(id)?.name(), record = rec, "record deleted");

    let block = form.get_mut(id)?;
    block.rollback_record(rec);
    let records = block.records_mut();
    records.set_deleted(rec, true);
    records.set_changed(rec, false);
    if let Err(err) = form.fire(Trigger::PostDelete, id, site(rec)) {
        warn!(block = %form.get(id)?.name(), record = rec, error = %err, "post-delete trigger failed");
        return Err(err);
    }

    form.transition(id, |form| {
        let next = match form.fetch_next_record(id, Direction::Forward) {
            Err(Error::NoData) => form.fetch_next_record(id, Direction::Backward),
            other => other,
        };
        match next {
            Err(Error::NoData) => {
                let block = form.get_mut(id)?;
                block.clear();
                block.set_mode(Mode::Query);
                form.focus_block(id);
                Ok(())
            }
            other => other,
        }
    })
}

// ============================================================================
// Editing helpers
// ============================================================================

/// Open a blank record at the cursor of a multi-record block.
///
/// Records below shift down by one. The cursor stays at (or is restored
/// to) the original position whatever happens.
pub fn insert_line(form: &mut Form, id: BlockId) -> Result<()> {
    if !form.get(id)?.is_multi() {
        return Err(Error::exec(ONLY_ON_MULTI));
    }
    form.validate_block(id)?;
    let cursor = form.get(id)?.active_record();

    let result = form.transition(id, |form| {
        let block = form.get_mut(id)?;
        let last = block.buffer_size() - 1;
        if block.is_record_filled(last) {
            return Err(Error::exec(BUFFER_FULL));
        }
        form.fire(Trigger::PostRecord, id, site(cursor))?;

        let block = form.get_mut(id)?;
        block.insert_blank(cursor);
        block.fill_defaults(cursor)?;
        block.records_mut().set_changed(cursor, false);
        let target = block.first_unfilled_field(cursor);
        form.fire(Trigger::PreRecord, id, site(cursor))?;
        form.focus_field(id, target, cursor);
        Ok(())
    });

    let restored = form.get_mut(id).and_then(|b| b.set_active_record(cursor));
    result.and(restored)
}

/// Leave block `id` for another accessible block.
///
/// With several candidates the user picks one by title; cancelling the
/// choice keeps the current block.
pub fn change_block(form: &mut Form, id: BlockId) -> Result<()> {
    let others: Vec<(BlockId, String)> = form
        .blocks()
        .iter()
        .filter(|b| b.id() != id && b.is_accessible())
        .map(|b| (b.id(), b.title().to_string()))
        .collect();

    match others.as_slice() {
        [] => Err(Error::exec(NO_OTHER_BLOCK)),
        [(only, _)] => form.enter_block(*only),
        _ => {
            let titles: Vec<String> = others.iter().map(|(_, t)| t.clone()).collect();
            match form.presentation.select_from_dialog(SELECT_BLOCK, &titles, false) {
                Selection::Index(i) if i < others.len() => form.enter_block(others[i].0),
                _ => {
                    form.focus_block(id);
                    Ok(())
                }
            }
        }
    }
}

/// Set the comparison a query criterion uses.
///
/// Without an explicit operator the user picks one from a dialog.
pub fn set_search_operator(
    form: &mut Form,
    id: BlockId,
    field: usize,
    op: Option<SearchOperator>,
) -> Result<()> {
    require_mode(form, id, Mode::Query)?;
    let block = form.get(id)?;
    let target = block
        .field(field)
        .ok_or_else(|| Error::internal(format!("{} has no field {}", block.name(), field)))?;
    if target.column().is_none() {
        return Err(Error::internal(format!(
            "{}.{} is not bound to a column",
            block.name(),
            target.name()
        )));
    }

    let op = match op {
        Some(op) => op,
        None => {
            let labels: Vec<String> = SearchOperator::ALL
                .iter()
                .map(|o| o.as_sql().to_string())
                .collect();
            match form
                .presentation
                .select_from_dialog(SELECT_OPERATOR, &labels, false)
            {
                Selection::Index(i) if i < SearchOperator::ALL.len() => SearchOperator::ALL[i],
                _ => return Err(Error::Aborted),
            }
        }
    };
    form.get_mut(id)?.field_mut(field)?.set_search_operator(op);
    let rec = form.get(id)?.active_record();
    form.focus_field(id, Some(field), rec);
    Ok(())
}

/// Step a field to its next (or, with `desc`, previous) value.
pub fn enumerate(form: &mut Form, id: BlockId, field: usize, desc: bool) -> Result<()> {
    let rec = form.get(id)?.active_record();
    form.validate_field(id, field, rec)?;
    let changed = form.get_mut(id)?.field_mut(field)?.enumerate_value(rec, desc)?;
    if changed {
        form.fire(
            Trigger::PostChange,
            id,
            TriggerSite {
                field: Some(field),
                record: rec,
            },
        )?;
    }
    form.focus_field(id, Some(field), rec);
    Ok(())
}

/// Move between fetched records.
///
/// Single-record blocks ask before leaving a changed record and roll it
/// back when the user agrees.
pub fn navigate(form: &mut Form, id: BlockId, direction: Direction) -> Result<()> {
    let block = form.get(id)?;
    if !block.is_multi() && block.is_changed() {
        if !form.ask(DISCARD_CHANGES) {
            return Err(Error::Aborted);
        }
        form.transition(id, |form| {
            let block = form.get_mut(id)?;
            let rec = block.active_record();
            block.rollback_record(rec);
            form.fetch_next_record(id, direction)
        })
    } else {
        form.fetch_next_record(id, direction)
    }
}
