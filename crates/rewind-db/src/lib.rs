//! History store for the rewind replay-history builder (`SQLite`).
//!
//! The replay engine produces append-only rows for six relations and hands
//! them to this crate in periodic batches. Debugger sessions later open the
//! finished file and issue point-in-time reads.
//!
//! # Architecture
//!
//! ```text
//! Replay
//!     |
//!     +-- every N lines --> HistoryBatch::flush (one transaction)
//!         |-- ObjectStore     (objects)
//!         |-- FrameStore      (code_files, fun_calls)
//!         |-- HeapStore       (heap_versions)
//!         +-- SnapshotStore   (errors, snapshots)
//!
//! Debugger
//!     |
//!     +-- HistoryReader --> read_as_of, call_stack, snapshots, ...
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool, configuration, and migrations
//! - [`batch`] -- Buffered rows and the transactional flush
//! - [`object_store`] -- Immutable object snapshots
//! - [`heap_store`] -- Heap version rows and `read_as_of`
//! - [`frame_store`] -- Frame activations and source files
//! - [`snapshot_store`] -- Snapshots and errors
//! - [`run_store`] -- Completed replay metadata
//! - [`reader`] -- Read-side facade
//! - [`error`] -- Shared error types

pub mod batch;
pub mod error;
pub mod frame_store;
pub mod heap_store;
pub mod object_store;
pub mod reader;
pub mod run_store;
pub mod snapshot_store;
pub mod sqlite;

// Re-export primary types for convenience.
pub use batch::{FlushReport, HistoryBatch};
pub use error::DbError;
pub use frame_store::FrameStore;
pub use heap_store::HeapStore;
pub use object_store::ObjectStore;
pub use reader::HistoryReader;
pub use run_store::{ReplayRun, RunStore};
pub use snapshot_store::SnapshotStore;
pub use sqlite::{HistoryDb, SqliteConfig};
