//! The object store: assigns ids to immutable object snapshots.
//!
//! Every save gets a fresh id except structurally empty sequences, mappings
//! and sets, which resolve to one of three canonical objects created when
//! the store is initialised. There is no other deduplication: identical
//! non-empty objects saved twice are stored twice.

use std::convert::Infallible;

use rewind_db::HistoryBatch;
use rewind_log::serialize;
use rewind_types::{ContainerKind, Object, ObjectId, ObjectRow};

use crate::error::ConsistencyError;

/// Id of the canonical empty sequence (list or tuple).
pub const EMPTY_SEQUENCE: ObjectId = ObjectId(1);
/// Id of the canonical empty mapping.
pub const EMPTY_MAPPING: ObjectId = ObjectId(2);
/// Id of the canonical empty set.
pub const EMPTY_SET: ObjectId = ObjectId(3);

/// Allocates object ids and buffers serialized rows.
#[derive(Debug)]
pub struct ObjectStore {
    last_id: ObjectId,
}

impl ObjectStore {
    /// Create the store and queue the three canonical empty objects.
    pub fn new(batch: &mut HistoryBatch) -> Self {
        let canonical = [
            (EMPTY_SEQUENCE, Object::List(Vec::new())),
            (EMPTY_MAPPING, Object::Dict(Vec::new())),
            (EMPTY_SET, Object::Set(Vec::new())),
        ];
        for (id, object) in &canonical {
            let Ok(data) = serialize(object, &mut |_: &Object| Ok::<_, Infallible>(*id));
            batch.objects.push(ObjectRow { id: *id, data });
        }
        Self {
            last_id: EMPTY_SET,
        }
    }

    /// Persist `object` and return its id.
    ///
    /// Nested objects (an instance's attribute bag) are saved first, within
    /// the same call, and referenced from the outer object's text.
    pub fn save(
        &mut self,
        object: &Object,
        batch: &mut HistoryBatch,
    ) -> Result<ObjectId, ConsistencyError> {
        if let Some(id) = object.canonical_empty_kind().and_then(canonical_id) {
            return Ok(id);
        }
        let data = serialize(object, &mut |nested: &Object| self.save(nested, batch))?;
        let id = self.allocate()?;
        batch.objects.push(ObjectRow { id, data });
        Ok(id)
    }

    fn allocate(&mut self) -> Result<ObjectId, ConsistencyError> {
        let next = self
            .last_id
            .0
            .checked_add(1)
            .ok_or(ConsistencyError::IdOverflow { what: "object" })?;
        self.last_id = ObjectId(next);
        Ok(self.last_id)
    }
}

/// Text and instances never share a canonical object.
const fn canonical_id(kind: ContainerKind) -> Option<ObjectId> {
    match kind {
        ContainerKind::Sequence => Some(EMPTY_SEQUENCE),
        ContainerKind::Mapping => Some(EMPTY_MAPPING),
        ContainerKind::Set => Some(EMPTY_SET),
        ContainerKind::Text | ContainerKind::Instance => None,
    }
}
