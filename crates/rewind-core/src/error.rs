//! Error types for replay construction.
//!
//! A [`ConsistencyError`] means the reconstructed model has drifted from
//! the recorded execution; continuing would write misleading history, so it
//! is always fatal. [`ReplayError`] is what the driver returns, with the
//! offending log line attached.

use rewind_db::DbError;
use rewind_log::FormatError;
use rewind_types::{FrameId, SlotId};

/// A model invariant failed while applying an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    /// `POP_FRAME` named a frame other than the top one.
    #[error("pop of frame `{requested}` but the top frame is `{top}`")]
    FrameMismatch {
        /// Name given by the pop event.
        requested: String,
        /// Name of the actual top frame.
        top: String,
    },

    /// An operation needed a current frame but the stack is empty.
    #[error("{operation} with an empty call stack")]
    EmptyStack {
        /// The operation attempted.
        operation: &'static str,
    },

    /// `STORE_FAST` used an index beyond the frame's local names.
    #[error("local index {index} out of range for frame {frame} with {len} locals")]
    LocalIndex {
        /// The current frame.
        frame: FrameId,
        /// Requested local index.
        index: usize,
        /// Number of local names.
        len: usize,
    },

    /// A slot was read before anything was written to it.
    #[error("slot {slot} has never been written")]
    UnknownSlot {
        /// The slot.
        slot: SlotId,
    },

    /// A mutation targeted a slot holding a different kind of object.
    #[error("slot {slot} holds a {found}, expected a {expected}")]
    WrongKind {
        /// The slot.
        slot: SlotId,
        /// Container the mutation operates on.
        expected: &'static str,
        /// Container actually held.
        found: &'static str,
    },

    /// A sequence index did not address a member.
    #[error("index {index} out of range for slot {slot} of length {len}")]
    IndexOutOfRange {
        /// The slot.
        slot: SlotId,
        /// Requested index.
        index: i64,
        /// Sequence length.
        len: usize,
    },

    /// A member to remove was not present.
    #[error("slot {slot} has no member {member}")]
    AbsentMember {
        /// The slot.
        slot: SlotId,
        /// The member, in log notation.
        member: String,
    },

    /// A mapping key to remove was not present.
    #[error("slot {slot} has no key {key}")]
    AbsentKey {
        /// The slot.
        slot: SlotId,
        /// The key, in log notation.
        key: String,
    },

    /// Pop from an empty sequence or mapping.
    #[error("pop from empty container at slot {slot}")]
    EmptyPop {
        /// The slot.
        slot: SlotId,
    },

    /// Extended slice assignment with a mismatched number of members.
    #[error("slice of slot {slot} has {expected} positions but {found} members were assigned")]
    SliceLength {
        /// The slot.
        slot: SlotId,
        /// Positions addressed by the slice.
        expected: usize,
        /// Members supplied.
        found: usize,
    },

    /// A slice with step zero.
    #[error("slice step cannot be zero (slot {slot})")]
    ZeroStep {
        /// The slot.
        slot: SlotId,
    },

    /// The logical clock would pass `u64::MAX`.
    #[error("logical clock overflow")]
    ClockOverflow,

    /// An id counter would pass `u64::MAX`.
    #[error("{what} id overflow")]
    IdOverflow {
        /// Which id space ran out.
        what: &'static str,
    },
}

/// Errors returned by the replay driver.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// A line or argument could not be parsed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The model diverged from the recorded execution.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// The history database rejected a write.
    #[error("persistence error: {0}")]
    Persistence(#[from] DbError),

    /// The log could not be read.
    #[error("failed to read event log: {0}")]
    Io(#[from] std::io::Error),

    /// A fatal error, with the log line that triggered it.
    #[error("line {line_no}: {source}\n    {line}")]
    AtLine {
        /// 1-based line number.
        line_no: usize,
        /// The line text.
        line: String,
        /// The underlying error.
        source: Box<ReplayError>,
    },
}

impl ReplayError {
    /// Attach the offending line to an error.
    pub fn at_line(line_no: usize, line: &str, source: impl Into<Self>) -> Self {
        Self::AtLine {
            line_no,
            line: line.to_owned(),
            source: Box::new(source.into()),
        }
    }

    /// The innermost error, skipping line context.
    pub fn root(&self) -> &Self {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}
