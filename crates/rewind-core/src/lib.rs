//! Replay construction for the rewind time-travel debugger.
//!
//! Turns a flat event log recorded from a running program into a queryable
//! history: every heap mutation becomes an immutable object version under a
//! single global logical clock, call frames become a parent-linked forest,
//! and every visited line becomes an addressable snapshot.
//!
//! # Architecture
//!
//! ```text
//! driver::replay
//!     |
//!     +-- rewind_log::parse_line / Event::decode
//!     |
//!     +-- ReplayState::apply
//!     |     |-- frames     (push, pop, variable stores)
//!     |     |-- dispatch   (heap mutations)
//!     |     +-- recorder   (snapshots)
//!     |           |
//!     |           +-- HeapTable::update --> ObjectStore::save
//!     |
//!     +-- every N lines: HistoryBatch::flush
//! ```
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- Consistency and replay errors
//! - [`objects`] -- Object id allocation and canonical empty objects
//! - [`heap`] -- The heap version table and global clock
//! - [`frames`] -- The call frame registry
//! - [`dispatch`] -- Heap mutation handlers
//! - [`recorder`] -- Snapshot recording
//! - [`state`] -- The [`ReplayState`] aggregate
//! - [`driver`] -- Line-by-line ingestion with batched commits

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod frames;
pub mod heap;
pub mod objects;
pub mod recorder;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ConfigError, ReplayConfig};
pub use driver::{ReplaySummary, replay, replay_file};
pub use error::{ConsistencyError, ReplayError};
pub use state::ReplayState;
