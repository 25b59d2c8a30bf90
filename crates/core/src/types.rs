//! Core type definitions for visforms.

use std::fmt;
use std::ops::BitOr;

// ============================================================================
// BLOCK IDENTIFIERS
// ============================================================================

/// Identifies a block inside its form.
///
/// Blocks are stored in a `Vec<Block>` owned by the form, so the id is the
/// position in that vector: `blocks[block_id.0]`.
///
/// # Example
/// ```
/// use visforms_core::BlockId;
///
/// let block_id = BlockId::new(2);
/// assert_eq!(block_id.0, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl BlockId {
    /// Create a new BlockId.
    #[inline]
    pub fn new(id: usize) -> Self {
        BlockId(id)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

// ============================================================================
// FIELD IDENTIFIERS
// ============================================================================

/// Identifies a field: the owning block plus the field's position in it.
///
/// A field never holds a reference to its block. The block id inside a
/// `FieldId` is a lookup key only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    /// Owning block.
    pub block: BlockId,
    /// Position in the block's field list.
    pub index: usize,
}

impl FieldId {
    /// Create a new FieldId.
    #[inline]
    pub fn new(block: BlockId, index: usize) -> Self {
        FieldId { block, index }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}.{})", self.block.0, self.index)
    }
}

// ============================================================================
// MODES
// ============================================================================

/// Mode of a block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Entering query criteria or browsing fetched records read-only.
    #[default]
    Query,
    /// Entering a new record.
    Insert,
    /// Editing a fetched record.
    Update,
}

impl Mode {
    /// Stable upper-case name, as shown in help output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Query => "QUERY",
            Mode::Insert => "INSERT",
            Mode::Update => "UPDATE",
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        match self {
            Mode::Query => 0b001,
            Mode::Insert => 0b010,
            Mode::Update => 0b100,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of modes, used as a command's activation predicate.
///
/// # Example
/// ```
/// use visforms_core::{Mode, ModeSet};
///
/// let set = ModeSet::EDIT;
/// assert!(set.contains(Mode::Insert));
/// assert!(!set.contains(Mode::Query));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeSet(u8);

impl ModeSet {
    /// No mode at all; a command with this set is never active.
    pub const NONE: ModeSet = ModeSet(0);
    pub const QUERY: ModeSet = ModeSet(0b001);
    pub const INSERT: ModeSet = ModeSet(0b010);
    pub const UPDATE: ModeSet = ModeSet(0b100);
    /// INSERT and UPDATE.
    pub const EDIT: ModeSet = ModeSet(0b110);
    pub const ALL: ModeSet = ModeSet(0b111);

    /// Check whether `mode` is part of the set.
    #[inline]
    pub fn contains(&self, mode: Mode) -> bool {
        self.0 & mode.bit() != 0
    }

    /// Modes in the set, in QUERY, INSERT, UPDATE order.
    pub fn modes(&self) -> Vec<Mode> {
        [Mode::Query, Mode::Insert, Mode::Update]
            .into_iter()
            .filter(|m| self.contains(*m))
            .collect()
    }
}

impl From<Mode> for ModeSet {
    fn from(mode: Mode) -> Self {
        ModeSet(mode.bit())
    }
}

impl BitOr for ModeSet {
    type Output = ModeSet;

    fn bitor(self, rhs: ModeSet) -> ModeSet {
        ModeSet(self.0 | rhs.0)
    }
}

impl fmt::Display for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.modes().iter().map(|m| m.as_str()).collect();
        if names.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&names.join("+"))
        }
    }
}

// ============================================================================
// QUERY OPERATORS
// ============================================================================

/// Comparison used when a field's query-mode value becomes a criterion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOperator {
    #[default]
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    /// Prefix/wildcard match on the text form (`%` and `_`).
    Like,
}

impl SearchOperator {
    /// All operators, in the order offered to the user.
    pub const ALL: [SearchOperator; 7] = [
        SearchOperator::Equal,
        SearchOperator::NotEqual,
        SearchOperator::Less,
        SearchOperator::LessOrEqual,
        SearchOperator::Greater,
        SearchOperator::GreaterOrEqual,
        SearchOperator::Like,
    ];

    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SearchOperator::Equal => "=",
            SearchOperator::NotEqual => "<>",
            SearchOperator::Less => "<",
            SearchOperator::LessOrEqual => "<=",
            SearchOperator::Greater => ">",
            SearchOperator::GreaterOrEqual => ">=",
            SearchOperator::Like => "LIKE",
        }
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Natural ordering of a field's values; flips enumeration direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}
