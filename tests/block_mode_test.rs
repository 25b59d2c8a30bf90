//! Integration tests for the block mode state machine.
//!
//! These drive a form end to end through its public commands, with the
//! in-memory persistence and a scripted presentation standing in for the
//! database and the user.

use visforms::block::{Block, BlockBuilder};
use visforms::buffer::Direction;
use visforms::common::{messages, BlockId, Mode};
use visforms::dispatch::commands;
use visforms::field::{CodeDomain, FieldBuilder, FieldKind, Value};
use visforms::form::{Form, FormBuilder, FormFlavor, Trigger, TriggerSite, Triggers};
use visforms::persistence::{MemoryPersistence, PersistenceError};
use visforms::presentation::{ScriptedPresentation, Selection};
use visforms::Error;

const EMP: BlockId = BlockId(0);

// ============================================================================
// Fixtures
// ============================================================================

fn emp_block() -> BlockBuilder {
    BlockBuilder::new("emp")
        .title("Employees")
        .table("emp")
        .buffer_size(8)
        .field(FieldBuilder::new("name", FieldKind::string(30)).mandatory())
        .field(FieldBuilder::new("age", FieldKind::integer()).default_value(Value::Int(18)))
        .field(FieldBuilder::new(
            "day",
            FieldKind::Code(CodeDomain::integer(&[("Mon", 1), ("Tue", 2), ("Thu", 4)])),
        ))
        .standard_commands()
}

fn setup(db: &MemoryPersistence) -> (Form, ScriptedPresentation) {
    let script = ScriptedPresentation::new();
    let form = FormBuilder::new("staff")
        .block(emp_block())
        .presentation(script.clone())
        .persistence(db.clone())
        .build()
        .unwrap();
    (form, script)
}

/// Hooks that refuse `target` the first time it fires.
fn refuse_once(target: Trigger) -> impl Triggers + 'static {
    let mut armed = true;
    move |trigger: Trigger, _block: &mut Block, _site: TriggerSite| {
        if trigger == target && std::mem::take(&mut armed) {
            return Err(Error::exec_message("hook refused"));
        }
        Ok(())
    }
}

fn setup_with_hooks(db: &MemoryPersistence, hooks: impl Triggers + 'static) -> Form {
    FormBuilder::new("staff")
        .block_with_triggers(emp_block(), hooks)
        .presentation(ScriptedPresentation::new())
        .persistence(db.clone())
        .build()
        .unwrap()
}

fn seed(db: &MemoryPersistence, names: &[&str]) {
    for (i, name) in names.iter().enumerate() {
        db.insert_row(
            "emp",
            vec![("name", Value::Str(name.to_string())), ("age", Value::Int(30 + i as i64))],
        );
    }
}

// ============================================================================
// QUERY → INSERT
// ============================================================================

#[test]
fn test_insert_mode_from_query() {
    let db = MemoryPersistence::new();
    let (mut form, script) = setup(&db);

    form.insert_mode(EMP).unwrap();

    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Insert);
    assert_eq!(block.active_record(), 0);
    assert_eq!(block.field(1).unwrap().int(0), Some(18));
    assert!(!block.records().is_fetched(0));
    // focus lands on the first field still empty
    assert_eq!(block.active_field(), Some(0));
    assert!(script.last_focus().is_some());
}

#[test]
fn test_insert_mode_rejected_on_multi_block() {
    let db = MemoryPersistence::new();
    let mut form = FormBuilder::new("lines")
        .block(emp_block().display_size(4))
        .persistence(db.clone())
        .build()
        .unwrap();

    let before = form.block(EMP).unwrap().mode();
    assert_eq!(
        form.insert_mode(EMP),
        Err(Error::exec(messages::NOT_ALLOWED_ON_MULTI))
    );
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), before);
    assert!(block.field(1).unwrap().is_null(0));
}

#[test]
fn test_insert_via_command_then_save() {
    let db = MemoryPersistence::new();
    let (mut form, _script) = setup(&db);

    form.invoke(EMP, "insert").unwrap();
    let block = form.block_mut(EMP).unwrap();
    assert!(block.edit_text(0, "Grace").unwrap());
    assert!(block.edit_text(2, "m").unwrap());
    form.invoke(EMP, "save").unwrap();

    let rows = db.rows("emp");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::Str("Grace".into())));
    assert_eq!(rows[0].get("day"), Some(&Value::Int(1)));
    assert_eq!(rows[0].get("age"), Some(&Value::Int(18)));
    // a plain insert resets the form
    assert_eq!(form.block(EMP).unwrap().mode(), Mode::Query);
}

#[test]
fn test_single_save_stays_in_insert() {
    let db = MemoryPersistence::new();
    let mut form = FormBuilder::new("staff")
        .block(emp_block().single_save())
        .persistence(db.clone())
        .build()
        .unwrap();

    form.invoke(EMP, "insert").unwrap();
    form.block_mut(EMP).unwrap().edit_text(0, "Ada").unwrap();
    form.invoke(EMP, "save").unwrap();
    form.block_mut(EMP).unwrap().edit_text(0, "Alan").unwrap();
    form.invoke(EMP, "save").unwrap();

    assert_eq!(db.rows("emp").len(), 2);
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Insert);
    assert!(block.field(0).unwrap().is_null(0));
}

// ============================================================================
// Code-domain resolution
// ============================================================================

#[test]
fn test_code_unique_prefix_resolves() {
    let db = MemoryPersistence::new();
    let (mut form, _script) = setup(&db);
    form.insert_mode(EMP).unwrap();

    form.block_mut(EMP).unwrap().edit_text(2, "m").unwrap();
    form.validate_field(EMP, 2, 0).unwrap();

    let day = form.block(EMP).unwrap().field(2).unwrap();
    assert_eq!(day.code_index(0), Some(0));
    assert_eq!(day.storage_value(0), Value::Int(1));
}

#[test]
fn test_code_without_matching_label_is_refused() {
    let db = MemoryPersistence::new();
    let (mut form, _script) = setup(&db);
    form.insert_mode(EMP).unwrap();

    let accepted = form.block_mut(EMP).unwrap().edit_text(2, "Mox").unwrap();
    assert!(!accepted);
    assert!(form.block(EMP).unwrap().pending_edits().is_empty());
}

#[test]
fn test_code_ambiguous_prefix_asks_user() {
    let db = MemoryPersistence::new();
    let (mut form, script) = setup(&db);
    form.insert_mode(EMP).unwrap();
    script.push_selection(Selection::Index(1));

    form.block_mut(EMP).unwrap().edit_text(2, "t").unwrap();
    form.validate_field(EMP, 2, 0).unwrap();

    let log = script.log();
    assert_eq!(log.dialogs.len(), 1);
    assert_eq!(log.dialogs[0].0, messages::SELECT_VALUE);
    assert_eq!(log.dialogs[0].1, vec!["Tue".to_string(), "Thu".to_string()]);
    assert_eq!(form.block(EMP).unwrap().field(2).unwrap().code_label(0), Some("Thu"));
}

#[test]
fn test_code_ambiguous_prefix_cancelled() {
    let db = MemoryPersistence::new();
    let (mut form, _script) = setup(&db);
    form.insert_mode(EMP).unwrap();

    form.block_mut(EMP).unwrap().edit_text(2, "t").unwrap();
    let err = form.validate_field(EMP, 2, 0).unwrap_err();
    assert_eq!(err.code(), Some(messages::NO_VALUE_SELECTED));
    assert!(form.block(EMP).unwrap().field(2).unwrap().is_null(0));
}

// ============================================================================
// UPDATE
// ============================================================================

#[test]
fn test_save_unchanged_declined_opens_no_transaction() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let (mut form, script) = setup(&db);
    form.invoke(EMP, "query").unwrap();
    let journal = db.journal();
    script.push_answer(false);

    form.invoke(EMP, "save").unwrap();

    assert_eq!(db.journal(), journal);
    assert_eq!(script.log().asked, vec![messages::SAVE_UNCHANGED]);
    assert_eq!(form.block(EMP).unwrap().mode(), Mode::Update);
    assert_eq!(form.stats().snapshot().transactions_opened, 1);
}

#[test]
fn test_update_save_moves_to_next_record() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada", "Alan"]);
    let (mut form, _script) = setup(&db);
    form.invoke(EMP, "query").unwrap();

    form.block_mut(EMP).unwrap().edit_text(1, "37").unwrap();
    form.invoke(EMP, "save").unwrap();

    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Update);
    assert_eq!(block.active_record(), 1);
    assert!(!block.records().is_changed(0));
    let ada = db.rows("emp").into_iter().find(|r| r.get("name") == Some(&Value::Str("Ada".into())));
    assert_eq!(ada.unwrap().get("age"), Some(&Value::Int(37)));
}

#[test]
fn test_update_save_of_last_record_returns_to_query() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let (mut form, _script) = setup(&db);
    form.invoke(EMP, "query").unwrap();

    form.block_mut(EMP).unwrap().edit_text(1, "40").unwrap();
    form.invoke(EMP, "save").unwrap();

    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Query);
    assert!(!block.is_record_filled(0));
}

#[test]
fn test_save_detects_concurrent_change() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let (mut form, script) = setup(&db);
    form.invoke(EMP, "query").unwrap();
    let id = db.rows("emp")[0].id;
    db.update_row("emp", id, "age", Value::Int(99));

    form.block_mut(EMP).unwrap().edit_text(1, "31").unwrap();
    let err = form.invoke(EMP, "save").unwrap_err();

    assert_eq!(err, Error::exec_message("row changed by another user"));
    assert_eq!(db.rows("emp")[0].get("age"), Some(&Value::Int(99)));
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Update);
    assert_eq!(block.field(1).unwrap().int(0), Some(31));
    form.report_failure(&err);
    assert_eq!(script.log().reported, vec![err]);
}

#[test]
fn test_deadlock_during_save() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let (mut form, _script) = setup(&db);
    form.invoke(EMP, "query").unwrap();

    form.block_mut(EMP).unwrap().edit_text(1, "31").unwrap();
    db.fail_next(PersistenceError::Deadlock("ORA-00060".into()));
    let err = form.invoke(EMP, "save").unwrap_err();

    assert_eq!(err, Error::exec(messages::EXEC_INTERRUPTED));
    assert!(!format!("{}", err).contains("ORA-00060"));
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Update);
    // the edit is still there and can be rolled back
    assert!(block.records().is_trailed(0));
    assert!(form.block_mut(EMP).unwrap().rollback_record(0));
    assert_eq!(form.block(EMP).unwrap().field(1).unwrap().int(0), Some(30));
    assert!(!db.in_transaction());
}

#[test]
fn test_validation_failure_keeps_mode() {
    let db = MemoryPersistence::new();
    let (mut form, _script) = setup(&db);
    form.insert_mode(EMP).unwrap();
    form.block_mut(EMP).unwrap().edit_text(1, "20").unwrap();

    let err = form.invoke(EMP, "save").unwrap_err();
    assert_eq!(err.code(), Some(messages::VALUE_REQUIRED));
    assert_eq!(err.field_id().map(|f| f.index), Some(0));
    assert_eq!(form.block(EMP).unwrap().mode(), Mode::Insert);
    assert!(db.journal().is_empty());
}

// ============================================================================
// DELETE
// ============================================================================

#[test]
fn test_delete_falls_back_then_clears() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada", "Alan"]);
    let (mut form, _script) = setup(&db);
    form.invoke(EMP, "query").unwrap();
    form.invoke(EMP, "next").unwrap();
    assert_eq!(form.block(EMP).unwrap().active_record(), 1);

    // nothing after record 1: fall back to record 0
    form.invoke(EMP, "delete").unwrap();
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Update);
    assert_eq!(block.active_record(), 0);
    assert!(block.records().is_deleted(1));

    // nothing either way: back to QUERY
    form.invoke(EMP, "delete").unwrap();
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Query);
    assert!(!block.is_record_filled(0));
    assert!(db.rows("emp").is_empty());
}

#[test]
fn test_navigation_skips_deleted_records() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada", "Alan", "Grace"]);
    let (mut form, _script) = setup(&db);
    form.invoke(EMP, "query").unwrap();
    form.invoke(EMP, "next").unwrap();
    form.invoke(EMP, "delete").unwrap();
    assert_eq!(form.block(EMP).unwrap().active_record(), 2);

    form.fetch_next_record(EMP, Direction::Backward).unwrap();
    assert_eq!(form.block(EMP).unwrap().active_record(), 0);
}

// ============================================================================
// Post triggers after commit
// ============================================================================

#[test]
fn test_failed_post_insert_keeps_stored_row() {
    let db = MemoryPersistence::new();
    let mut form = setup_with_hooks(&db, refuse_once(Trigger::PostInsert));
    form.invoke(EMP, "insert").unwrap();
    form.block_mut(EMP).unwrap().edit_text(0, "Grace").unwrap();

    let err = form.invoke(EMP, "save").unwrap_err();
    assert_eq!(err, Error::exec_message("hook refused"));
    assert_eq!(db.rows("emp").len(), 1);
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Update);
    assert!(block.records().is_fetched(0));
    assert!(!block.records().is_changed(0));

    // saving again updates the stored row rather than adding a second one
    form.block_mut(EMP).unwrap().edit_text(1, "44").unwrap();
    form.invoke(EMP, "save").unwrap();
    let rows = db.rows("emp");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::Str("Grace".into())));
    assert_eq!(rows[0].get("age"), Some(&Value::Int(44)));
}

#[test]
fn test_failed_post_update_keeps_fresh_checksum() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let mut form = setup_with_hooks(&db, refuse_once(Trigger::PostUpdate));
    form.invoke(EMP, "query").unwrap();
    form.block_mut(EMP).unwrap().edit_text(1, "37").unwrap();

    let err = form.invoke(EMP, "save").unwrap_err();
    assert_eq!(err, Error::exec_message("hook refused"));
    assert_eq!(db.rows("emp")[0].get("age"), Some(&Value::Int(37)));
    let block = form.block(EMP).unwrap();
    assert_eq!(block.mode(), Mode::Update);
    assert_eq!(block.field(1).unwrap().int(0), Some(37));
    assert!(!block.records().is_changed(0));

    // the buffer matches the stored row, so the next save is no conflict
    form.block_mut(EMP).unwrap().edit_text(1, "38").unwrap();
    form.invoke(EMP, "save").unwrap();
    assert_eq!(db.rows("emp")[0].get("age"), Some(&Value::Int(38)));
}

#[test]
fn test_failed_post_delete_keeps_record_deleted() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada", "Alan"]);
    let mut form = setup_with_hooks(&db, refuse_once(Trigger::PostDelete));
    form.invoke(EMP, "query").unwrap();

    let err = form.invoke(EMP, "delete").unwrap_err();
    assert_eq!(err, Error::exec_message("hook refused"));
    assert_eq!(db.rows("emp").len(), 1);
    let block = form.block(EMP).unwrap();
    assert_eq!(block.active_record(), 0);
    assert!(block.records().is_deleted(0));

    // the row is gone, so a second delete has nothing to remove
    let journal = db.journal();
    assert_eq!(form.invoke(EMP, "delete"), Err(Error::exec(messages::RECORD_EMPTY)));
    assert_eq!(db.journal(), journal);

    form.invoke(EMP, "next").unwrap();
    assert_eq!(form.block(EMP).unwrap().active_record(), 1);
}

// ============================================================================
// RESET
// ============================================================================

#[test]
fn test_reset_needs_confirmation_when_changed() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let (mut form, script) = setup(&db);
    form.invoke(EMP, "query").unwrap();
    form.block_mut(EMP).unwrap().edit_text(0, "Ida").unwrap();
    script.push_answer(false);

    assert_eq!(form.invoke(EMP, "reset"), Err(Error::Aborted));
    assert_eq!(form.block(EMP).unwrap().mode(), Mode::Update);

    form.invoke(EMP, "reset").unwrap();
    assert_eq!(form.block(EMP).unwrap().mode(), Mode::Query);
    assert_eq!(script.log().asked.len(), 2);
}

#[test]
fn test_dictionary_reset_clears_every_block() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada"]);
    let mut form = FormBuilder::new("dict")
        .flavor(FormFlavor::Dictionary)
        .block(emp_block())
        .block(
            BlockBuilder::new("note")
                .field(FieldBuilder::new("text", FieldKind::string(10)).unbound()),
        )
        .persistence(db.clone())
        .build()
        .unwrap();
    form.invoke(EMP, "query").unwrap();
    form.block_mut(BlockId::new(1))
        .unwrap()
        .field_mut(0)
        .unwrap()
        .set_string(0, "hi")
        .unwrap();

    form.reset_block(EMP).unwrap();
    assert!(form.blocks().iter().all(|b| b.mode() == Mode::Query));
    assert!(form.block(BlockId::new(1)).unwrap().field(0).unwrap().is_null(0));
    assert_eq!(form.active_block(), EMP);
}

#[test]
fn test_query_by_example_operator() {
    let db = MemoryPersistence::new();
    seed(&db, &["Ada", "Alan", "Grace"]);
    let (mut form, _script) = setup(&db);

    form.block_mut(EMP).unwrap().edit_text(0, "A%").unwrap();
    commands::set_search_operator(&mut form, EMP, 0, Some(visforms::common::SearchOperator::Like))
        .unwrap();
    form.invoke(EMP, "query").unwrap();

    let block = form.block(EMP).unwrap();
    assert_eq!(block.records().filled_count(block.fields()), 2);
}
