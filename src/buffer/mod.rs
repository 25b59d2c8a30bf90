//! Record buffer management.
//!
//! Every block buffers a fixed number of records. The buffer tracks, per
//! record slot, where the content came from and what happened to it, and
//! keeps the active-record cursor. Field values themselves live in the
//! block's fields; the buffer only coordinates them.
//!
//! # Components
//! - [`RecordBuffer`] - Slots, cursor, trailing and navigation
//! - [`RecordSlot`] - Flags of one record (fetched, changed, deleted, trailed)
//! - [`RowRef`] - Identity of the persisted row behind a fetched record

mod record_buffer;
mod slot;

pub use record_buffer::{Direction, RecordBuffer};
pub use slot::{RecordSlot, RowRef};
