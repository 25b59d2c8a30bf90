//! Fields - one column's logic across all record slots of a block.
//!
//! A [`Field`] owns a value array of `2 × buffer_size` slots: the lower half
//! holds the live records, the upper half the trailed (backup) copies used
//! for rollback. Its behaviour is selected by a closed [`FieldKind`].
//!
//! # Components
//! - [`Field`] / [`FieldBuilder`] - Per-column storage and configuration
//! - [`FieldKind`] - Variant-specific conversion, validation and SQL rendering
//! - [`FieldMut`] - Mutation handle that trails and flags the record buffer
//! - [`CodeDomain`] - Label/code tables for code-domain fields
//! - [`Value`] - The model object stored in a slot

mod code;
mod datetime;
mod field_mut;
mod kind;
mod numeric;
mod value;

pub use code::{CodeDomain, CodeMatch, CodeValues};
pub use field_mut::FieldMut;
pub use kind::{default_fixed, FieldKind};
pub use value::Value;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::common::{messages, Error, FieldError, FieldId, MessageCode, Result};
use crate::common::{SearchOperator, SortOrder};
use crate::presentation::{Presentation, Selection};

/// Quote a string as an SQL literal.
pub(crate) fn quote_sql(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Default filled into a fresh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// A fixed value.
    Value(Value),
    /// Today / this month / now, depending on the field kind.
    Current,
}

/// One column of a block.
#[derive(Debug, Clone)]
pub struct Field {
    id: FieldId,
    name: String,
    label: String,
    column: Option<String>,
    kind: FieldKind,
    mandatory: bool,
    enterable: bool,
    default: Option<DefaultValue>,
    sort_order: SortOrder,
    search_operator: SearchOperator,
    buffer_size: usize,
    /// Live slots `0..buffer_size`, trailed copies `buffer_size..2*buffer_size`.
    values: Vec<Value>,
}

impl Field {
    // ========================================================================
    // Configuration accessors
    // ========================================================================

    #[inline]
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bound database column, `None` for unbound fields.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_enterable(&self) -> bool {
        self.enterable && !matches!(self.kind, FieldKind::Actor)
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn search_operator(&self) -> SearchOperator {
        self.search_operator
    }

    pub(crate) fn set_search_operator(&mut self, op: SearchOperator) {
        self.search_operator = op;
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    // ========================================================================
    // Slot reads
    // ========================================================================

    /// Value of a live or trailed slot.
    ///
    /// # Panics
    /// Panics if `slot >= 2 * buffer_size`.
    #[inline]
    pub fn value(&self, slot: usize) -> &Value {
        &self.values[slot]
    }

    /// Backup copy of a live slot.
    #[inline]
    pub fn trailed_value(&self, rec: usize) -> &Value {
        &self.values[self.buffer_size + rec]
    }

    #[inline]
    pub fn is_null(&self, rec: usize) -> bool {
        self.values[rec].is_null()
    }

    /// Text shown by the editing surface.
    pub fn text(&self, rec: usize) -> String {
        self.kind.to_text(&self.values[rec])
    }

    /// SQL literal of the slot's value.
    pub fn sql(&self, rec: usize) -> String {
        self.kind.sql_literal(&self.values[rec])
    }

    /// Persisted representation of the slot's value.
    pub fn storage_value(&self, rec: usize) -> Value {
        self.kind.to_storage(&self.values[rec])
    }

    pub fn string(&self, rec: usize) -> Option<&str> {
        match &self.values[rec] {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, rec: usize) -> Option<i64> {
        match self.values[rec] {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Scaled units of a fixed-point slot.
    pub fn fixed(&self, rec: usize) -> Option<i64> {
        match self.values[rec] {
            Value::Fixed(units) => Some(units),
            _ => None,
        }
    }

    pub fn code_index(&self, rec: usize) -> Option<usize> {
        match self.values[rec] {
            Value::Code(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn code_label(&self, rec: usize) -> Option<&str> {
        match (&self.kind, &self.values[rec]) {
            (FieldKind::Code(domain), Value::Code(idx)) => domain.label(*idx),
            _ => None,
        }
    }

    pub fn date(&self, rec: usize) -> Option<NaiveDate> {
        match self.values[rec] {
            Value::Date(d) | Value::Month(d) => Some(d),
            _ => None,
        }
    }

    pub fn time(&self, rec: usize) -> Option<NaiveTime> {
        match self.values[rec] {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn timestamp(&self, rec: usize) -> Option<NaiveDateTime> {
        match self.values[rec] {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Incremental validity check while the user types.
    pub fn check_text(&self, candidate: &str) -> bool {
        self.is_enterable() && self.kind.check_text(candidate)
    }

    /// Build the error for a rejected input on `rec`, carrying the current
    /// value as rollback.
    pub(crate) fn reject(&self, rec: usize, code: MessageCode, text: &str) -> Error {
        FieldError::new(self.id, code)
            .with_arg(text)
            .with_rollback(self.values[rec].clone())
            .into()
    }

    /// Authoritative conversion of typed text into a value.
    ///
    /// Code-domain fields resolve a unique case-insensitive prefix directly
    /// and ask the user to choose when several labels fit.
    pub fn resolve_text(
        &self,
        rec: usize,
        text: &str,
        ui: &mut dyn Presentation,
    ) -> Result<Value> {
        let FieldKind::Code(domain) = &self.kind else {
            return self
                .kind
                .to_object(text)
                .map_err(|code| self.reject(rec, code, text));
        };

        match domain.resolve(text) {
            CodeMatch::Empty => Ok(Value::Null),
            CodeMatch::Unique(idx) => Ok(Value::Code(idx)),
            CodeMatch::NoMatch => Err(self.reject(rec, messages::NO_MATCHING_VALUE, text)),
            CodeMatch::Ambiguous(candidates) => {
                let items: Vec<String> = candidates
                    .iter()
                    .filter_map(|&i| domain.label(i).map(str::to_string))
                    .collect();
                match ui.select_from_dialog(messages::SELECT_VALUE, &items, false) {
                    Selection::Index(i) if i < candidates.len() => Ok(Value::Code(candidates[i])),
                    _ => Err(self.reject(rec, messages::NO_VALUE_SELECTED, text)),
                }
            }
        }
    }

    /// The value `enumerate` moves to from the slot's current value.
    ///
    /// `desc` asks for the previous value; a descending sort order flips
    /// the direction. Code and integer fields stop at their ends, date and
    /// time fields start from the current date/time when null.
    pub fn next_value(&self, rec: usize, desc: bool) -> Result<Value> {
        let backward = desc != (self.sort_order == SortOrder::Descending);
        let fail = |code: MessageCode| Error::field(self.id, code);

        match (&self.kind, &self.values[rec]) {
            (FieldKind::Code(domain), Value::Null) => {
                if domain.is_empty() {
                    Err(fail(messages::NO_FURTHER_VALUE))
                } else if backward {
                    Ok(Value::Code(domain.len() - 1))
                } else {
                    Ok(Value::Code(0))
                }
            }
            (FieldKind::Code(domain), Value::Code(idx)) => {
                let next = if backward {
                    idx.checked_sub(1)
                } else {
                    Some(idx + 1).filter(|n| *n < domain.len())
                };
                next.map(Value::Code)
                    .ok_or_else(|| fail(messages::NO_FURTHER_VALUE))
            }
            (FieldKind::Integer { min, max, .. }, Value::Null) => {
                let start = if backward { *max } else { *min };
                Ok(Value::Int(start.unwrap_or(0)))
            }
            (FieldKind::Integer { min, max, .. }, Value::Int(i)) => {
                let next = if backward { i.checked_sub(1) } else { i.checked_add(1) };
                next.filter(|n| min.map_or(true, |lo| *n >= lo) && max.map_or(true, |hi| *n <= hi))
                    .map(Value::Int)
                    .ok_or_else(|| fail(messages::NO_FURTHER_VALUE))
            }
            (FieldKind::Date, Value::Date(d)) => datetime::step_date(d, backward)
                .map(Value::Date)
                .map_err(fail),
            (FieldKind::Month, Value::Month(m)) => datetime::step_month(m, backward)
                .map(Value::Month)
                .map_err(fail),
            (FieldKind::Time, Value::Time(t)) => Ok(Value::Time(datetime::step_time(t, backward))),
            (FieldKind::Timestamp, Value::Timestamp(ts)) => datetime::step_timestamp(ts, backward)
                .map(Value::Timestamp)
                .map_err(fail),
            (FieldKind::Date | FieldKind::Month | FieldKind::Time | FieldKind::Timestamp, _) => {
                self.kind
                    .current_value()
                    .ok_or_else(|| fail(messages::NOT_ENUMERABLE))
            }
            _ => Err(fail(messages::NOT_ENUMERABLE)),
        }
    }

    /// Resolve the configured default into a value.
    pub fn resolve_default(&self) -> Option<Value> {
        match self.default.as_ref()? {
            DefaultValue::Value(v) => Some(v.clone()),
            DefaultValue::Current => self.kind.current_value(),
        }
    }

    // ========================================================================
    // Raw slot writes (crate-internal; trailing and flags live in FieldMut)
    // ========================================================================

    /// Write a slot. Returns whether the value differs from the old one.
    ///
    /// With `force`, the slot is rewritten even if equal.
    pub(crate) fn store(&mut self, slot: usize, value: Value, force: bool) -> bool {
        let changed = self.values[slot] != value;
        if changed || force {
            self.values[slot] = value;
        }
        changed
    }

    /// Copy one slot over another. Returns whether the destination changed.
    pub(crate) fn copy_slot(&mut self, from: usize, to: usize) -> bool {
        if self.values[from] == self.values[to] {
            return false;
        }
        self.values[to] = self.values[from].clone();
        true
    }

    /// Null out every slot, live and trailed.
    pub(crate) fn clear_slots(&mut self) {
        self.values.fill(Value::Null);
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Describes a field before its block allocates storage for it.
///
/// # Example
/// ```
/// use visforms::field::{CodeDomain, FieldBuilder, FieldKind};
///
/// let day = FieldBuilder::new("day", FieldKind::Code(CodeDomain::integer(&[("Mon", 1)])))
///     .label("Weekday")
///     .mandatory();
/// assert_eq!(day.name(), "day");
/// ```
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    label: Option<String>,
    column: Option<String>,
    kind: FieldKind,
    mandatory: bool,
    enterable: bool,
    default: Option<DefaultValue>,
    sort_order: SortOrder,
}

impl FieldBuilder {
    /// A field bound to a column of the same name (actors stay unbound).
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let column = kind.has_storage().then(|| name.clone());
        Self {
            name,
            label: None,
            column,
            kind,
            mandatory: false,
            enterable: true,
            default: None,
            sort_order: SortOrder::Ascending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Not bound to any column; never persisted or queried.
    pub fn unbound(mut self) -> Self {
        self.column = None;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.enterable = false;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    /// Default to today / this month / now.
    pub fn default_current(mut self) -> Self {
        self.default = Some(DefaultValue::Current);
        self
    }

    pub fn descending(mut self) -> Self {
        self.sort_order = SortOrder::Descending;
        self
    }

    /// Allocate the field for a block with `buffer_size` slots.
    pub(crate) fn build(self, id: FieldId, buffer_size: usize) -> Field {
        let label = self.label.unwrap_or_else(|| self.name.clone());
        Field {
            id,
            name: self.name,
            label,
            column: self.column.filter(|_| self.kind.has_storage()),
            kind: self.kind,
            mandatory: self.mandatory,
            enterable: self.enterable,
            default: self.default,
            sort_order: self.sort_order,
            search_operator: SearchOperator::default(),
            buffer_size,
            values: vec![Value::Null; 2 * buffer_size],
        }
    }
}
