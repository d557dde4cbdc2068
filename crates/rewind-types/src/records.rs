//! Row structs for every persisted relation.
//!
//! These are produced by the replay state, buffered, and flushed to the
//! history database in batches. All relations are append-only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{Clock, CodeFileId, ErrorId, FrameId, ObjectId, SlotId, SnapshotId};

/// One row of the `objects` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRow {
    /// Object id.
    pub id: ObjectId,
    /// Codec text form of the object.
    pub data: String,
}

/// One row of the `heap_versions` relation, keyed on `(slot, clock)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapVersionRow {
    /// The heap slot that changed.
    pub slot: SlotId,
    /// The logical clock tick consumed by the change.
    pub clock: Clock,
    /// The object the slot holds from this tick on.
    pub object: ObjectId,
}

/// One row of the `fun_calls` relation: a frame activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunCallRow {
    /// Frame id.
    pub id: FrameId,
    /// Function (or module) name.
    pub name: String,
    /// Slot of the local-variable mapping.
    pub locals_slot: SlotId,
    /// Slot of the global-variable mapping.
    pub globals_slot: SlotId,
    /// Cell variable name to cell slot.
    pub cell_vars: BTreeMap<String, SlotId>,
    /// Free variable name to cell slot.
    pub free_vars: BTreeMap<String, SlotId>,
    /// The calling frame, `None` for the outermost frame.
    pub parent: Option<FrameId>,
    /// Source file the frame's code lives in.
    pub code_file: CodeFileId,
}

/// One row of the `code_files` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFileRow {
    /// File id.
    pub id: CodeFileId,
    /// Path as written in the log.
    pub path: String,
    /// Source text, empty when the file could not be read.
    pub source: String,
}

/// One row of the `snapshots` relation: the program state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Snapshot id.
    pub id: SnapshotId,
    /// The frame executing at this instant.
    pub frame: FrameId,
    /// The last committed logical clock at this instant.
    pub clock: Clock,
    /// Source line number.
    pub line_no: u32,
    /// The error raised at this instant, if any.
    pub error: Option<ErrorId>,
}

/// One row of the `errors` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRow {
    /// Error id.
    pub id: ErrorId,
    /// Error message as recorded.
    pub message: String,
}
