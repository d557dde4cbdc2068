//! Buffered rows awaiting a periodic commit.
//!
//! The replay produces rows for every relation as it goes. They are held in
//! a [`HistoryBatch`] and written together, in dependency order, inside one
//! transaction: either the whole batch lands or none of it does. Batches
//! committed earlier stay valid if a later one fails.
//!
//! ```text
//! HistoryBatch::flush
//!   |
//!   +-- objects        (referenced by heap_versions)
//!   +-- code_files     (referenced by fun_calls)
//!   +-- fun_calls      (referenced by snapshots)
//!   +-- heap_versions
//!   +-- errors         (referenced by snapshots)
//!   +-- snapshots
//! ```

use rewind_types::{CodeFileRow, ErrorRow, FunCallRow, HeapVersionRow, ObjectRow, SnapshotRow};

use crate::error::DbError;
use crate::frame_store::FrameStore;
use crate::heap_store::HeapStore;
use crate::object_store::ObjectStore;
use crate::snapshot_store::SnapshotStore;
use crate::sqlite::HistoryDb;

/// Rows produced since the last commit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HistoryBatch {
    /// Pending `objects` rows.
    pub objects: Vec<ObjectRow>,
    /// Pending `heap_versions` rows.
    pub heap_versions: Vec<HeapVersionRow>,
    /// Pending `code_files` rows.
    pub code_files: Vec<CodeFileRow>,
    /// Pending `fun_calls` rows.
    pub fun_calls: Vec<FunCallRow>,
    /// Pending `errors` rows.
    pub errors: Vec<ErrorRow>,
    /// Pending `snapshots` rows.
    pub snapshots: Vec<SnapshotRow>,
}

/// Row counts written by one [`HistoryBatch::flush`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Objects written.
    pub objects: usize,
    /// Heap versions written.
    pub heap_versions: usize,
    /// Frames written.
    pub fun_calls: usize,
    /// Snapshots written.
    pub snapshots: usize,
}

impl HistoryBatch {
    /// Whether no rows are pending.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
            && self.heap_versions.is_empty()
            && self.code_files.is_empty()
            && self.fun_calls.is_empty()
            && self.errors.is_empty()
            && self.snapshots.is_empty()
    }

    /// Write all pending rows in one transaction and clear the batch.
    ///
    /// The batch is cleared even when the write fails; a failed flush is
    /// fatal to the replay.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any insert or the commit fails. Nothing from
    /// this batch is persisted in that case.
    pub async fn flush(&mut self, db: &HistoryDb) -> Result<FlushReport, DbError> {
        let batch = std::mem::take(self);
        if batch.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut tx = db.pool().begin().await?;
        ObjectStore::insert_all(&mut *tx, &batch.objects).await?;
        FrameStore::insert_code_files(&mut *tx, &batch.code_files).await?;
        FrameStore::insert_fun_calls(&mut *tx, &batch.fun_calls).await?;
        HeapStore::insert_all(&mut *tx, &batch.heap_versions).await?;
        SnapshotStore::insert_errors(&mut *tx, &batch.errors).await?;
        SnapshotStore::insert_snapshots(&mut *tx, &batch.snapshots).await?;
        tx.commit().await?;

        let report = FlushReport {
            objects: batch.objects.len(),
            heap_versions: batch.heap_versions.len(),
            fun_calls: batch.fun_calls.len(),
            snapshots: batch.snapshots.len(),
        };

        tracing::debug!(
            objects = report.objects,
            heap_versions = report.heap_versions,
            fun_calls = report.fun_calls,
            snapshots = report.snapshots,
            "Committed history batch"
        );

        Ok(report)
    }
}
