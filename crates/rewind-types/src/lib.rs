//! Shared type definitions for the rewind replay-history builder.
//!
//! This crate is the single source of truth for the identifiers, values and
//! persisted rows used across the workspace. It has no I/O.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrappers for slots, objects, frames, files,
//!   snapshots, errors, and the logical clock
//! - [`value`] -- The [`Value`] scalar/reference union and the immutable
//!   [`Object`] snapshot model
//! - [`records`] -- Row structs for every persisted relation

pub mod ids;
pub mod records;
pub mod value;

// Re-export all public types at crate root for convenience.
pub use ids::{Clock, CodeFileId, ErrorId, FrameId, ObjectId, SlotId, SnapshotId};
pub use records::{CodeFileRow, ErrorRow, FunCallRow, HeapVersionRow, ObjectRow, SnapshotRow};
pub use value::{ContainerKind, Object, Value};
