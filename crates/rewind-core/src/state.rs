//! The replay state aggregate.
//!
//! [`ReplayState`] owns everything the replay mutates: the clock and heap,
//! the object id allocator, the frame arena with its `top` pointer, the
//! snapshot counters, and the rows not yet committed. The driver holds the
//! only instance and feeds it one decoded event at a time.

use rewind_db::HistoryBatch;
use rewind_log::Event;
use rewind_types::{Clock, ErrorId, FrameId, Object, ObjectId, SlotId, SnapshotId};

use crate::config::ReplaySettings;
use crate::error::ConsistencyError;
use crate::frames::{Frame, FrameArena};
use crate::heap::HeapTable;
use crate::objects::ObjectStore;

/// All mutable state of one replay.
#[derive(Debug)]
pub struct ReplayState {
    pub(crate) settings: ReplaySettings,
    pub(crate) objects: ObjectStore,
    pub(crate) heap: HeapTable,
    pub(crate) frames: FrameArena,
    pub(crate) top: Option<FrameId>,
    pub(crate) recording: bool,
    pub(crate) last_snapshot: SnapshotId,
    pub(crate) last_error: ErrorId,
    pub(crate) pending: HistoryBatch,
}

impl ReplayState {
    /// A fresh replay: clock zero, empty stack, canonical objects queued.
    pub fn new(settings: ReplaySettings) -> Self {
        let mut pending = HistoryBatch::default();
        let objects = ObjectStore::new(&mut pending);
        Self {
            settings,
            objects,
            heap: HeapTable::new(),
            frames: FrameArena::default(),
            top: None,
            recording: false,
            last_snapshot: SnapshotId(0),
            last_error: ErrorId(0),
            pending,
        }
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: Event) -> Result<(), ConsistencyError> {
        match event {
            Event::PushFrame(push) => self.push_frame(push).map(|_| ()),
            Event::PopFrame { name, .. } => self.pop_frame(&name).map(|_| ()),
            Event::Visit { line_no } => self.record(line_no),
            Event::StoreName { name, value } => self.store_name(&name, value),
            Event::StoreGlobal { slot, name, value } => self.store_global(slot, &name, value),
            Event::StoreFast { index, value } => self.store_local(index, value),
            Event::StoreDeref { slot, value } => self.store_closure_cell(slot, value),
            Event::ReturnValue { value, line_no } => self.record_return(value, line_no),
            Event::YieldValue { value, line_no } => self.record_yield(value, line_no),
            Event::Exception { line_no, message } => self.record_exception(message, line_no),
            Event::Mutation(mutation) => self.apply_mutation(mutation),
        }
    }

    /// Commit a new version of `slot`.
    pub(crate) fn commit(&mut self, slot: SlotId, object: Object) -> Result<Clock, ConsistencyError> {
        self.heap
            .update(slot, object, &mut self.objects, &mut self.pending)
    }

    /// The last clock value consumed.
    pub const fn clock(&self) -> Clock {
        self.heap.clock()
    }

    /// The executing frame, if any.
    pub const fn top(&self) -> Option<FrameId> {
        self.top
    }

    /// Look up a frame by id.
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    /// Number of frames pushed so far.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The latest committed object of `slot`.
    pub fn read_current(&self, slot: SlotId) -> Option<&Object> {
        self.heap.read_current(slot)
    }

    /// The object `slot` held as of `clock`.
    pub fn read_as_of(&self, slot: SlotId, clock: Clock) -> Option<ObjectId> {
        self.heap.read_as_of(slot, clock)
    }

    /// Number of snapshots recorded so far.
    pub const fn snapshot_count(&self) -> u64 {
        self.last_snapshot.0
    }

    /// Whether snapshots are being recorded (the module frame was entered).
    pub const fn is_recording(&self) -> bool {
        self.recording
    }

    /// Rows produced since the last call; the state starts a new batch.
    pub fn take_pending(&mut self) -> HistoryBatch {
        std::mem::take(&mut self.pending)
    }
}

/// The id following `last`, or an overflow error naming `what`.
pub(crate) fn bump(last: u64, what: &'static str) -> Result<u64, ConsistencyError> {
    last.checked_add(1)
        .ok_or(ConsistencyError::IdOverflow { what })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rewind_log::{Mutation, PushFrame};
    use rewind_types::Value;

    use super::*;

    #[test]
    fn new_state_is_at_rest() {
        let mut st = ReplayState::new(ReplaySettings::default());
        assert_eq!(st.clock(), Clock::ZERO);
        assert_eq!(st.top(), None);
        assert!(!st.is_recording());
        assert_eq!(st.take_pending().objects.len(), 3);
        assert!(st.take_pending().is_empty());
    }

    #[test]
    fn apply_routes_events() {
        let mut st = ReplayState::new(ReplaySettings {
            read_sources: false,
            ..ReplaySettings::default()
        });
        st.apply(Event::PushFrame(PushFrame {
            file: "prog.py".to_owned(),
            name: "<module>".to_owned(),
            globals: SlotId(1),
            locals: SlotId(1),
            local_names: Vec::new(),
            local_values: Vec::new(),
            cell_vars: Vec::new(),
            free_vars: Vec::new(),
        }))
        .unwrap();
        st.apply(Event::Mutation(Mutation::NewList {
            slot: SlotId(10),
            items: vec![Value::Integer(1)],
        }))
        .unwrap();
        st.apply(Event::StoreName {
            name: "xs".to_owned(),
            value: Value::HeapRef(SlotId(10)),
        })
        .unwrap();
        st.apply(Event::Visit { line_no: 3 }).unwrap();

        assert!(st.is_recording());
        assert_eq!(st.clock(), Clock(3));
        assert_eq!(st.snapshot_count(), 1);
    }

    #[test]
    fn bump_detects_overflow() {
        assert_eq!(bump(4, "object"), Ok(5));
        assert_eq!(
            bump(u64::MAX, "object"),
            Err(ConsistencyError::IdOverflow { what: "object" })
        );
    }
}
