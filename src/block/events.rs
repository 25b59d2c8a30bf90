//! Events a block publishes for the presentation layer.

use crate::common::{FieldId, Mode};
use crate::presentation::FocusTarget;

/// Something visible changed in a block.
///
/// Blocks queue events as they happen; the presentation layer drains them
/// with `Block::take_events` after each action and repaints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEvent {
    /// A field value changed in a live record.
    ValueChanged { field: FieldId, record: usize },
    ModeChanged { from: Mode, to: Mode },
    /// The active record moved.
    RecordChanged { from: usize, to: usize },
    /// Every record was cleared.
    Cleared,
    Focus(FocusTarget),
}
