//! The snapshot recorder.
//!
//! A snapshot pins (frame, clock, line) so a debugger can jump to it.
//! Nothing is recorded until the module frame is first pushed; events
//! before that are interpreter bootstrap.

use rewind_types::{ErrorId, ErrorRow, SnapshotId, SnapshotRow, Value};

use crate::error::ConsistencyError;
use crate::state::{ReplayState, bump};

impl ReplayState {
    /// Record a snapshot at `line_no` in the current frame.
    pub fn record(&mut self, line_no: u32) -> Result<(), ConsistencyError> {
        self.snapshot(line_no, None)
    }

    /// Store `value` under the reserved return-value name, then record.
    pub fn record_return(&mut self, value: Value, line_no: u32) -> Result<(), ConsistencyError> {
        self.store_result(value)?;
        self.record(line_no)?;
        self.finish_top();
        Ok(())
    }

    /// Like [`ReplayState::record_return`], but the frame stays on the
    /// stack and is suspended: the next push of the same generator
    /// resumes it under the same id.
    pub fn record_yield(&mut self, value: Value, line_no: u32) -> Result<(), ConsistencyError> {
        self.store_result(value)?;
        self.record(line_no)?;
        self.suspend_top();
        Ok(())
    }

    /// Record an error message and a snapshot that points at it.
    pub fn record_exception(&mut self, message: String, line_no: u32) -> Result<(), ConsistencyError> {
        if !self.recording {
            return Ok(());
        }
        let id = ErrorId(bump(self.last_error.0, "error")?);
        self.last_error = id;
        self.pending.errors.push(ErrorRow { id, message });
        self.snapshot(line_no, Some(id))
    }

    fn store_result(&mut self, value: Value) -> Result<(), ConsistencyError> {
        if self.top.is_none() && !self.recording {
            return Ok(());
        }
        let name = self.settings.return_value_name.clone();
        self.store_name(&name, value)
    }

    fn snapshot(&mut self, line_no: u32, error: Option<ErrorId>) -> Result<(), ConsistencyError> {
        if !self.recording {
            return Ok(());
        }
        let frame = self.current_frame("snapshot")?.id;
        let id = SnapshotId(bump(self.last_snapshot.0, "snapshot")?);
        self.last_snapshot = id;
        self.pending.snapshots.push(SnapshotRow {
            id,
            frame,
            clock: self.heap.clock(),
            line_no,
            error,
        });
        Ok(())
    }
}
