//! Read-side facade over a finished history database.
//!
//! A debugger reconstructs "state at snapshot S" by taking the snapshot's
//! frame, walking [`HistoryReader::call_stack`], and reading each slot of
//! interest with [`HistoryReader::read_as_of`] at the snapshot's clock.

use rewind_types::{
    Clock, CodeFileId, CodeFileRow, ErrorId, ErrorRow, FrameId, FunCallRow, HeapVersionRow,
    ObjectId, SlotId, SnapshotId, SnapshotRow,
};

use crate::error::DbError;
use crate::frame_store::FrameStore;
use crate::heap_store::HeapStore;
use crate::object_store::ObjectStore;
use crate::run_store::{ReplayRun, RunStore};
use crate::snapshot_store::SnapshotStore;
use crate::sqlite::HistoryDb;

/// Point-in-time queries against a history database.
#[derive(Debug, Clone, Copy)]
pub struct HistoryReader<'a> {
    db: &'a HistoryDb,
}

impl<'a> HistoryReader<'a> {
    /// Create a reader over an open database.
    pub const fn new(db: &'a HistoryDb) -> Self {
        Self { db }
    }

    /// The object `slot` held as of `clock`, or `None` if it was unwritten.
    pub async fn read_as_of(&self, slot: SlotId, clock: Clock) -> Result<Option<ObjectId>, DbError> {
        HeapStore::new(self.db.pool()).read_as_of(slot, clock).await
    }

    /// The codec text of the object `slot` held as of `clock`.
    pub async fn read_data_as_of(
        &self,
        slot: SlotId,
        clock: Clock,
    ) -> Result<Option<String>, DbError> {
        match self.read_as_of(slot, clock).await? {
            Some(id) => self.object_data(id).await,
            None => Ok(None),
        }
    }

    /// The codec text of one object.
    pub async fn object_data(&self, id: ObjectId) -> Result<Option<String>, DbError> {
        ObjectStore::new(self.db.pool()).data(id).await
    }

    /// Number of stored objects.
    pub async fn object_count(&self) -> Result<u64, DbError> {
        ObjectStore::new(self.db.pool()).count().await
    }

    /// One snapshot by id.
    pub async fn snapshot(&self, id: SnapshotId) -> Result<Option<SnapshotRow>, DbError> {
        SnapshotStore::new(self.db.pool()).snapshot(id).await
    }

    /// Every snapshot in timeline order.
    pub async fn snapshots(&self) -> Result<Vec<SnapshotRow>, DbError> {
        SnapshotStore::new(self.db.pool()).all().await
    }

    /// One error message by id.
    pub async fn error(&self, id: ErrorId) -> Result<Option<ErrorRow>, DbError> {
        SnapshotStore::new(self.db.pool()).error(id).await
    }

    /// One frame activation by id.
    pub async fn fun_call(&self, id: FrameId) -> Result<Option<FunCallRow>, DbError> {
        FrameStore::new(self.db.pool()).fun_call(id).await
    }

    /// Activations from `frame` to the outermost, innermost first.
    pub async fn call_stack(&self, frame: FrameId) -> Result<Vec<FunCallRow>, DbError> {
        FrameStore::new(self.db.pool()).call_stack(frame).await
    }

    /// One recorded source file.
    pub async fn code_file(&self, id: CodeFileId) -> Result<Option<CodeFileRow>, DbError> {
        FrameStore::new(self.db.pool()).code_file(id).await
    }

    /// The version history of one slot, oldest first.
    pub async fn heap_versions(&self, slot: SlotId) -> Result<Vec<HeapVersionRow>, DbError> {
        HeapStore::new(self.db.pool()).history(slot).await
    }

    /// Every heap version in clock order.
    pub async fn all_heap_versions(&self) -> Result<Vec<HeapVersionRow>, DbError> {
        HeapStore::new(self.db.pool()).all().await
    }

    /// The most recent completed replay.
    pub async fn latest_run(&self) -> Result<Option<ReplayRun>, DbError> {
        RunStore::new(self.db.pool()).latest().await
    }
}
