//! The heap version table: per-slot history under one global clock.
//!
//! Every committed mutation, on any slot, consumes exactly one clock tick
//! and appends one `(slot, clock, object)` row. The table also keeps the
//! latest object of each slot in memory; handlers read the "old value"
//! from there instead of going back to the database.

use std::collections::HashMap;

use rewind_db::HistoryBatch;
use rewind_types::{Clock, HeapVersionRow, Object, ObjectId, SlotId};

use crate::error::ConsistencyError;
use crate::objects::ObjectStore;

/// Live heap contents plus the version history of every slot.
#[derive(Debug, Default)]
pub struct HeapTable {
    clock: Clock,
    current: HashMap<SlotId, Object>,
    history: HashMap<SlotId, Vec<(Clock, ObjectId)>>,
}

impl HeapTable {
    /// An empty heap at clock zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `object` as the new value of `slot`.
    ///
    /// Advances the clock, saves the object, and appends the version row.
    /// Returns the clock tick consumed.
    pub fn update(
        &mut self,
        slot: SlotId,
        object: Object,
        objects: &mut ObjectStore,
        batch: &mut HistoryBatch,
    ) -> Result<Clock, ConsistencyError> {
        let clock = self.clock.next().ok_or(ConsistencyError::ClockOverflow)?;
        let id = objects.save(&object, batch)?;
        batch.heap_versions.push(HeapVersionRow {
            slot,
            clock,
            object: id,
        });
        self.history.entry(slot).or_default().push((clock, id));
        self.current.insert(slot, object);
        self.clock = clock;
        Ok(clock)
    }

    /// The latest committed object of `slot`.
    pub fn read_current(&self, slot: SlotId) -> Option<&Object> {
        self.current.get(&slot)
    }

    /// The object `slot` held as of `clock`, or `None` if the slot had not
    /// been written by then.
    pub fn read_as_of(&self, slot: SlotId, clock: Clock) -> Option<ObjectId> {
        let versions = self.history.get(&slot)?;
        let after = versions.partition_point(|(c, _)| *c <= clock);
        after
            .checked_sub(1)
            .and_then(|i| versions.get(i))
            .map(|(_, id)| *id)
    }

    /// The last clock value consumed; zero before any mutation.
    pub const fn clock(&self) -> Clock {
        self.clock
    }
}
