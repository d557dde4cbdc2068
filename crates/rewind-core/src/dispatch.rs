//! The mutation dispatcher.
//!
//! Each heap mutation is a pure function from the slot's current object to
//! its next one: copy, modify the copy, commit. A handler writes exactly one
//! slot, though `LIST_EXTEND` also reads a second. Index and slice
//! arguments follow Python semantics.
//!
//! A slot that has never been written reads as the empty container of the
//! handler's family, so a store into a fresh mapping needs no constructor
//! event. `STORE_ATTR` is the exception: on a slot that was never
//! constructed it does nothing.
//!
//! Membership tests (remove, key lookup, set uniqueness) use
//! [`Value::same_member`], so `1`, `1.0`, and `True` name one member.

use rewind_log::{Mutation, SliceBounds, render_value};
use rewind_types::{Object, SlotId, Value, value::upsert_pair};

use crate::error::ConsistencyError;
use crate::heap::HeapTable;
use crate::state::ReplayState;

impl ReplayState {
    /// Apply one heap mutation, committing at most one new version.
    pub fn apply_mutation(&mut self, mutation: Mutation) -> Result<(), ConsistencyError> {
        let slot = mutation.slot();
        let name = mutation.name();
        match next_object(&self.heap, mutation)? {
            Some(object) => self.commit(slot, object).map(|_| ()),
            None => {
                tracing::warn!(
                    slot = %slot,
                    event = name,
                    "STORE_ATTR on a slot never constructed; ignored"
                );
                Ok(())
            }
        }
    }
}

/// Compute the object a mutation leaves in its slot.
///
/// Returns `Ok(None)` only for `STORE_ATTR` on an unconstructed slot.
pub fn next_object(heap: &HeapTable, mutation: Mutation) -> Result<Option<Object>, ConsistencyError> {
    let object = match mutation {
        // Sequence family
        Mutation::NewList { items, .. } => Object::List(items),
        Mutation::NewTuple { items, .. } => Object::Tuple(items),
        Mutation::ListAppend { slot, value } => {
            let mut items = list(heap, slot)?;
            items.push(value);
            Object::List(items)
        }
        Mutation::ListExtend { slot, source } => {
            let mut items = list(heap, slot)?;
            items.extend(members(heap, source)?);
            Object::List(items)
        }
        Mutation::ListStoreSubscript { slot, index, value } => {
            let mut items = list(heap, slot)?;
            let i = resolve_index(slot, index, items.len())?;
            if let Some(member) = items.get_mut(i) {
                *member = value;
            }
            Object::List(items)
        }
        Mutation::ListStoreSubscriptSlice { slot, bounds, items: new } => {
            let mut items = list(heap, slot)?;
            assign_slice(slot, &mut items, bounds, new)?;
            Object::List(items)
        }
        Mutation::ListDeleteSubscript { slot, index } => {
            let mut items = list(heap, slot)?;
            let i = resolve_index(slot, index, items.len())?;
            items.remove(i);
            Object::List(items)
        }
        Mutation::ListDeleteSubscriptSlice { slot, bounds } => {
            let mut items = list(heap, slot)?;
            delete_slice(slot, &mut items, bounds)?;
            Object::List(items)
        }
        Mutation::ListInsert { slot, index, value } => {
            let mut items = list(heap, slot)?;
            let i = clamp_insert(index, items.len());
            items.insert(i, value);
            Object::List(items)
        }
        Mutation::ListRemove { slot, value } => {
            let mut items = list(heap, slot)?;
            let i = items
                .iter()
                .position(|m| m.same_member(&value))
                .ok_or_else(|| ConsistencyError::AbsentMember {
                    slot,
                    member: render_value(&value),
                })?;
            items.remove(i);
            Object::List(items)
        }
        Mutation::ListPop { slot, index } => {
            let mut items = list(heap, slot)?;
            if items.is_empty() {
                return Err(ConsistencyError::EmptyPop { slot });
            }
            let i = resolve_index(slot, index.unwrap_or(-1), items.len())?;
            items.remove(i);
            Object::List(items)
        }
        Mutation::ListClear { slot } => {
            list(heap, slot)?;
            Object::List(Vec::new())
        }
        Mutation::ListReverse { slot } => {
            let mut items = list(heap, slot)?;
            items.reverse();
            Object::List(items)
        }
        Mutation::ListSort { slot, items } => {
            list(heap, slot)?;
            Object::List(items)
        }

        // Text family
        Mutation::NewString { text, .. } | Mutation::StringInplaceAddResult { text, .. } => {
            Object::Str(text)
        }

        // Mapping family
        Mutation::NewDict { pairs, .. } => {
            let mut built = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                upsert_pair(&mut built, key, value);
            }
            Object::Dict(built)
        }
        Mutation::DictStoreSubscript { slot, key, value } => {
            let mut pairs = dict(heap, slot)?;
            upsert_pair(&mut pairs, key, value);
            Object::Dict(pairs)
        }
        Mutation::DictDeleteSubscript { slot, key } | Mutation::DictPop { slot, key } => {
            let mut pairs = dict(heap, slot)?;
            let i = pairs
                .iter()
                .position(|(k, _)| k.same_member(&key))
                .ok_or_else(|| ConsistencyError::AbsentKey {
                    slot,
                    key: render_value(&key),
                })?;
            pairs.remove(i);
            Object::Dict(pairs)
        }
        Mutation::DictClear { slot } => {
            dict(heap, slot)?;
            Object::Dict(Vec::new())
        }
        Mutation::DictPopItem { slot } => {
            let mut pairs = dict(heap, slot)?;
            pairs.pop().ok_or(ConsistencyError::EmptyPop { slot })?;
            Object::Dict(pairs)
        }
        Mutation::DictSetDefault { slot, key, value } => {
            let mut pairs = dict(heap, slot)?;
            if !pairs.iter().any(|(k, _)| k.same_member(&key)) {
                pairs.push((key, value));
            }
            Object::Dict(pairs)
        }

        // Set family
        Mutation::NewSet { items, .. } | Mutation::SetUpdate { items, .. } => {
            let mut built = Vec::with_capacity(items.len());
            for item in items {
                add_member(&mut built, item);
            }
            Object::Set(built)
        }
        Mutation::SetAdd { slot, value } => {
            let mut items = set(heap, slot)?;
            add_member(&mut items, value);
            Object::Set(items)
        }
        Mutation::SetDiscard { slot, value } => {
            let mut items = set(heap, slot)?;
            items.retain(|m| !m.same_member(&value));
            Object::Set(items)
        }
        Mutation::SetClear { slot } => {
            set(heap, slot)?;
            Object::Set(Vec::new())
        }

        // Opaque objects
        Mutation::NewObject { type_ref, .. } => Object::Instance {
            type_ref,
            attrs: Vec::new(),
        },
        Mutation::StoreAttr { slot, name, value } => match heap.read_current(slot) {
            None => return Ok(None),
            Some(Object::Instance { type_ref, attrs }) => {
                let mut attrs = attrs.clone();
                upsert_pair(&mut attrs, name, value);
                Object::Instance {
                    type_ref: type_ref.clone(),
                    attrs,
                }
            }
            Some(other) => return Err(wrong_kind(slot, "object", other)),
        },
    };
    Ok(Some(object))
}

// =========================================================================
// Family readers
// =========================================================================

fn wrong_kind(slot: SlotId, expected: &'static str, found: &Object) -> ConsistencyError {
    ConsistencyError::WrongKind {
        slot,
        expected,
        found: found.type_name(),
    }
}

/// A copy of the list at `slot`; empty if unwritten.
fn list(heap: &HeapTable, slot: SlotId) -> Result<Vec<Value>, ConsistencyError> {
    match heap.read_current(slot) {
        None => Ok(Vec::new()),
        Some(Object::List(items)) => Ok(items.clone()),
        Some(other) => Err(wrong_kind(slot, "list", other)),
    }
}

/// A copy of the mapping at `slot`; empty if unwritten.
fn dict(heap: &HeapTable, slot: SlotId) -> Result<Vec<(Value, Value)>, ConsistencyError> {
    match heap.read_current(slot) {
        None => Ok(Vec::new()),
        Some(Object::Dict(pairs)) => Ok(pairs.clone()),
        Some(other) => Err(wrong_kind(slot, "dict", other)),
    }
}

/// A copy of the set at `slot`; empty if unwritten.
fn set(heap: &HeapTable, slot: SlotId) -> Result<Vec<Value>, ConsistencyError> {
    match heap.read_current(slot) {
        None => Ok(Vec::new()),
        Some(Object::Set(items)) => Ok(items.clone()),
        Some(other) => Err(wrong_kind(slot, "set", other)),
    }
}

/// The members of any iterable container at `slot`, which must exist.
///
/// Iterating a mapping yields its keys, as in the recorded language.
fn members(heap: &HeapTable, slot: SlotId) -> Result<Vec<Value>, ConsistencyError> {
    match heap.read_current(slot) {
        None => Err(ConsistencyError::UnknownSlot { slot }),
        Some(Object::List(items) | Object::Tuple(items) | Object::Set(items)) => Ok(items.clone()),
        Some(Object::Dict(pairs)) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
        Some(Object::Str(s)) => Ok(s.chars().map(|c| Value::Text(c.to_string())).collect()),
        Some(other) => Err(wrong_kind(slot, "iterable", other)),
    }
}

fn add_member(items: &mut Vec<Value>, value: Value) {
    if !items.iter().any(|m| m.same_member(&value)) {
        items.push(value);
    }
}

// =========================================================================
// Python index arithmetic
// =========================================================================

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Resolve a possibly negative index against `len`.
fn resolve_index(slot: SlotId, index: i64, len: usize) -> Result<usize, ConsistencyError> {
    let resolved = if index < 0 {
        index.checked_add(len_i64(len))
    } else {
        Some(index)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < len)
        .ok_or(ConsistencyError::IndexOutOfRange { slot, index, len })
}

/// Insertion position for `list.insert(index, _)`, clamped to `0..=len`.
fn clamp_insert(index: i64, len: usize) -> usize {
    let n = len_i64(len);
    let i = if index < 0 {
        index.saturating_add(n).max(0)
    } else {
        index.min(n)
    };
    usize::try_from(i).unwrap_or(0)
}

/// Normalised `(start, stop, step)` for a slice over `len` members.
fn slice_indices(
    slot: SlotId,
    bounds: SliceBounds,
    len: usize,
) -> Result<(i64, i64, i64), ConsistencyError> {
    let step = bounds.step.unwrap_or(1);
    if step == 0 {
        return Err(ConsistencyError::ZeroStep { slot });
    }
    let n = len_i64(len);
    let (lower, upper) = if step < 0 { (-1, n.saturating_sub(1)) } else { (0, n) };
    let clamp = |bound: i64| {
        if bound < 0 {
            bound.saturating_add(n).max(lower)
        } else {
            bound.min(upper)
        }
    };
    let start = bounds
        .start
        .map_or(if step < 0 { upper } else { lower }, clamp);
    let stop = bounds
        .stop
        .map_or(if step < 0 { lower } else { upper }, clamp);
    Ok((start, stop, step))
}

/// The member positions a slice addresses, in slice order.
fn slice_positions(start: i64, stop: i64, step: i64) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(p) = usize::try_from(i) {
            positions.push(p);
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    positions
}

fn contiguous_range(start: i64, stop: i64) -> std::ops::Range<usize> {
    let from = usize::try_from(start).unwrap_or(0);
    let to = usize::try_from(stop).unwrap_or(0).max(from);
    from..to
}

/// `items[bounds] = new`.
fn assign_slice(
    slot: SlotId,
    items: &mut Vec<Value>,
    bounds: SliceBounds,
    new: Vec<Value>,
) -> Result<(), ConsistencyError> {
    let (start, stop, step) = slice_indices(slot, bounds, items.len())?;
    if step == 1 {
        items.splice(contiguous_range(start, stop), new).for_each(drop);
        return Ok(());
    }
    let positions = slice_positions(start, stop, step);
    if positions.len() != new.len() {
        return Err(ConsistencyError::SliceLength {
            slot,
            expected: positions.len(),
            found: new.len(),
        });
    }
    for (p, value) in positions.into_iter().zip(new) {
        if let Some(member) = items.get_mut(p) {
            *member = value;
        }
    }
    Ok(())
}

/// `del items[bounds]`.
fn delete_slice(
    slot: SlotId,
    items: &mut Vec<Value>,
    bounds: SliceBounds,
) -> Result<(), ConsistencyError> {
    let (start, stop, step) = slice_indices(slot, bounds, items.len())?;
    if step == 1 {
        items.drain(contiguous_range(start, stop));
        return Ok(());
    }
    let doomed = slice_positions(start, stop, step);
    let mut position = 0_usize;
    items.retain(|_| {
        let keep = !doomed.contains(&position);
        position = position.saturating_add(1);
        keep
    });
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use rewind_db::HistoryBatch;

    use super::*;
    use crate::objects::ObjectStore;

    fn ints(items: &[i64]) -> Vec<Value> {
        items.iter().copied().map(Value::Integer).collect()
    }

    /// A heap holding `object` at slot 1.
    fn heap_with(object: Object) -> HeapTable {
        let mut batch = HistoryBatch::default();
        let mut objects = ObjectStore::new(&mut batch);
        let mut heap = HeapTable::new();
        heap.update(SlotId(1), object, &mut objects, &mut batch).unwrap();
        heap
    }

    fn apply_to(object: Object, mutation: Mutation) -> Result<Option<Object>, ConsistencyError> {
        next_object(&heap_with(object), mutation)
    }

    fn list_after(start: &[i64], mutation: Mutation) -> Vec<Value> {
        match apply_to(Object::List(ints(start)), mutation).unwrap() {
            Some(Object::List(items)) => items,
            other => panic!("expected list, got {other:?}"),
        }
    }

    fn bounds(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> SliceBounds {
        SliceBounds { start, stop, step }
    }

    const S: SlotId = SlotId(1);

    #[test]
    fn negative_indices_count_from_end() {
        let items = list_after(
            &[1, 2, 3],
            Mutation::ListStoreSubscript {
                slot: S,
                index: -1,
                value: Value::Integer(9),
            },
        );
        assert_eq!(items, ints(&[1, 2, 9]));
        let err = apply_to(
            Object::List(ints(&[1])),
            Mutation::ListDeleteSubscript { slot: S, index: -2 },
        )
        .unwrap_err();
        assert!(matches!(err, ConsistencyError::IndexOutOfRange { index: -2, len: 1, .. }));
    }

    #[test]
    fn insert_clamps_like_python() {
        let at = |index| {
            list_after(
                &[1, 2],
                Mutation::ListInsert {
                    slot: S,
                    index,
                    value: Value::Integer(0),
                },
            )
        };
        assert_eq!(at(100), ints(&[1, 2, 0]));
        assert_eq!(at(-100), ints(&[0, 1, 2]));
        assert_eq!(at(-1), ints(&[1, 0, 2]));
    }

    #[test]
    fn pop_defaults_to_last_and_rejects_empty() {
        assert_eq!(
            list_after(&[1, 2, 3], Mutation::ListPop { slot: S, index: None }),
            ints(&[1, 2])
        );
        assert_eq!(
            list_after(&[1, 2, 3], Mutation::ListPop { slot: S, index: Some(0) }),
            ints(&[2, 3])
        );
        assert_eq!(
            apply_to(Object::List(vec![]), Mutation::ListPop { slot: S, index: None }),
            Err(ConsistencyError::EmptyPop { slot: S })
        );
    }

    #[test]
    fn slice_assignment_replaces_and_resizes() {
        let items = list_after(
            &[0, 1, 2, 3, 4],
            Mutation::ListStoreSubscriptSlice {
                slot: S,
                bounds: bounds(Some(1), Some(3), None),
                items: ints(&[7]),
            },
        );
        assert_eq!(items, ints(&[0, 7, 3, 4]));

        // Start past stop inserts at start.
        let items = list_after(
            &[0, 1, 2],
            Mutation::ListStoreSubscriptSlice {
                slot: S,
                bounds: bounds(Some(2), Some(0), None),
                items: ints(&[9]),
            },
        );
        assert_eq!(items, ints(&[0, 1, 9, 2]));
    }

    #[test]
    fn extended_slice_assignment_requires_equal_length() {
        let items = list_after(
            &[0, 1, 2, 3],
            Mutation::ListStoreSubscriptSlice {
                slot: S,
                bounds: bounds(None, None, Some(2)),
                items: ints(&[8, 9]),
            },
        );
        assert_eq!(items, ints(&[8, 1, 9, 3]));

        let err = apply_to(
            Object::List(ints(&[0, 1, 2, 3])),
            Mutation::ListStoreSubscriptSlice {
                slot: S,
                bounds: bounds(None, None, Some(2)),
                items: ints(&[1]),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::SliceLength {
                slot: S,
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn slice_deletion_handles_negative_steps() {
        assert_eq!(
            list_after(
                &[0, 1, 2, 3, 4],
                Mutation::ListDeleteSubscriptSlice {
                    slot: S,
                    bounds: bounds(Some(-2), None, None),
                },
            ),
            ints(&[0, 1, 2])
        );
        assert_eq!(
            list_after(
                &[0, 1, 2, 3, 4],
                Mutation::ListDeleteSubscriptSlice {
                    slot: S,
                    bounds: bounds(None, None, Some(-2)),
                },
            ),
            ints(&[1, 3])
        );
        assert_eq!(
            apply_to(
                Object::List(ints(&[1])),
                Mutation::ListDeleteSubscriptSlice {
                    slot: S,
                    bounds: bounds(None, None, Some(0)),
                },
            ),
            Err(ConsistencyError::ZeroStep { slot: S })
        );
    }

    #[test]
    fn remove_requires_member() {
        assert_eq!(
            list_after(
                &[1, 2, 1],
                Mutation::ListRemove {
                    slot: S,
                    value: Value::Integer(1),
                },
            ),
            ints(&[2, 1])
        );
        let err = apply_to(
            Object::List(ints(&[1])),
            Mutation::ListRemove {
                slot: S,
                value: Value::from("x"),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::AbsentMember {
                slot: S,
                member: "\"x\"".to_owned(),
            }
        );
    }

    #[test]
    fn extend_reads_second_slot() {
        let mut batch = HistoryBatch::default();
        let mut objects = ObjectStore::new(&mut batch);
        let mut heap = HeapTable::new();
        heap.update(S, Object::List(ints(&[1])), &mut objects, &mut batch).unwrap();
        heap.update(SlotId(2), Object::Tuple(ints(&[2, 3])), &mut objects, &mut batch)
            .unwrap();
        let next = next_object(&heap, Mutation::ListExtend { slot: S, source: SlotId(2) })
            .unwrap()
            .unwrap();
        assert_eq!(next, Object::List(ints(&[1, 2, 3])));

        let err = next_object(&heap, Mutation::ListExtend { slot: S, source: SlotId(3) });
        assert_eq!(err, Err(ConsistencyError::UnknownSlot { slot: SlotId(3) }));
    }

    #[test]
    fn dict_operations() {
        let start = Object::Dict(vec![
            (Value::from("a"), Value::Integer(1)),
            (Value::from("b"), Value::Integer(2)),
        ]);
        assert_eq!(
            apply_to(start.clone(), Mutation::DictPopItem { slot: S }).unwrap(),
            Some(Object::Dict(vec![(Value::from("a"), Value::Integer(1))]))
        );
        assert_eq!(
            apply_to(
                start.clone(),
                Mutation::DictSetDefault {
                    slot: S,
                    key: Value::from("a"),
                    value: Value::Integer(5),
                },
            )
            .unwrap(),
            Some(start.clone())
        );
        assert!(matches!(
            apply_to(
                start,
                Mutation::DictDeleteSubscript {
                    slot: S,
                    key: Value::from("z"),
                },
            ),
            Err(ConsistencyError::AbsentKey { .. })
        ));
        assert_eq!(
            apply_to(Object::Dict(vec![]), Mutation::DictPopItem { slot: S }),
            Err(ConsistencyError::EmptyPop { slot: S })
        );
    }

    #[test]
    fn new_dict_keeps_first_position_of_repeated_key() {
        let heap = HeapTable::new();
        let next = next_object(
            &heap,
            Mutation::NewDict {
                slot: S,
                pairs: vec![
                    (Value::from("a"), Value::Integer(1)),
                    (Value::from("b"), Value::Integer(2)),
                    (Value::from("a"), Value::Integer(3)),
                ],
            },
        )
        .unwrap();
        assert_eq!(
            next,
            Some(Object::Dict(vec![
                (Value::from("a"), Value::Integer(3)),
                (Value::from("b"), Value::Integer(2)),
            ]))
        );
    }

    #[test]
    fn set_members_are_unique() {
        let heap = HeapTable::new();
        let next = next_object(
            &heap,
            Mutation::SetUpdate {
                slot: S,
                items: ints(&[3, 1, 3]),
            },
        )
        .unwrap();
        assert_eq!(next, Some(Object::Set(ints(&[3, 1]))));

        assert_eq!(
            apply_to(
                Object::Set(ints(&[1])),
                Mutation::SetAdd {
                    slot: S,
                    value: Value::Integer(1),
                },
            )
            .unwrap(),
            Some(Object::Set(ints(&[1])))
        );
        assert_eq!(
            apply_to(
                Object::Set(ints(&[1])),
                Mutation::SetDiscard {
                    slot: S,
                    value: Value::Integer(2),
                },
            )
            .unwrap(),
            Some(Object::Set(ints(&[1])))
        );
    }

    #[test]
    fn wrong_kind_is_fatal() {
        let err = apply_to(
            Object::Set(vec![]),
            Mutation::ListAppend {
                slot: S,
                value: Value::Null,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConsistencyError::WrongKind {
                slot: S,
                expected: "list",
                found: "set",
            }
        );
    }

    #[test]
    fn store_attr_on_unconstructed_slot_is_ignored() {
        let heap = HeapTable::new();
        let next = next_object(
            &heap,
            Mutation::StoreAttr {
                slot: S,
                name: Value::from("x"),
                value: Value::Integer(1),
            },
        )
        .unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn store_attr_updates_instance_copy() {
        let start = Object::Instance {
            type_ref: Value::HeapRef(SlotId(50)),
            attrs: vec![],
        };
        let next = apply_to(
            start,
            Mutation::StoreAttr {
                slot: S,
                name: Value::from("x"),
                value: Value::Integer(1),
            },
        )
        .unwrap();
        assert_eq!(
            next,
            Some(Object::Instance {
                type_ref: Value::HeapRef(SlotId(50)),
                attrs: vec![(Value::from("x"), Value::Integer(1))],
            })
        );
    }

    #[test]
    fn remove_matches_numerically_equal_member() {
        assert_eq!(
            list_after(
                &[1],
                Mutation::ListRemove {
                    slot: S,
                    value: Value::Boolean(true),
                },
            ),
            ints(&[])
        );
        assert_eq!(
            list_after(
                &[1, 2],
                Mutation::ListRemove {
                    slot: S,
                    value: Value::Float(2.0),
                },
            ),
            ints(&[1])
        );
        let nan = apply_to(
            Object::List(vec![Value::Integer(0), Value::Float(f64::NAN)]),
            Mutation::ListRemove {
                slot: S,
                value: Value::Float(f64::NAN),
            },
        )
        .unwrap();
        assert_eq!(nan, Some(Object::List(ints(&[0]))));
    }

    #[test]
    fn equal_numbers_share_one_dict_key() {
        let heap = HeapTable::new();
        let built = next_object(
            &heap,
            Mutation::NewDict {
                slot: S,
                pairs: vec![
                    (Value::Integer(1), Value::from("int")),
                    (Value::Float(1.0), Value::from("float")),
                ],
            },
        )
        .unwrap();
        let one = Object::Dict(vec![(Value::Integer(1), Value::from("float"))]);
        assert_eq!(built, Some(one.clone()));

        assert_eq!(
            apply_to(
                one.clone(),
                Mutation::DictSetDefault {
                    slot: S,
                    key: Value::Boolean(true),
                    value: Value::from("bool"),
                },
            )
            .unwrap(),
            Some(one.clone())
        );
        assert_eq!(
            apply_to(
                one,
                Mutation::DictPop {
                    slot: S,
                    key: Value::Float(1.0),
                },
            )
            .unwrap(),
            Some(Object::Dict(vec![]))
        );
    }

    #[test]
    fn set_treats_true_and_one_as_one_member() {
        let heap = HeapTable::new();
        let built = next_object(
            &heap,
            Mutation::NewSet {
                slot: S,
                items: vec![Value::Integer(1), Value::Boolean(true), Value::Float(1.0)],
            },
        )
        .unwrap();
        assert_eq!(built, Some(Object::Set(ints(&[1]))));
        assert_eq!(
            apply_to(
                Object::Set(ints(&[1, 2])),
                Mutation::SetDiscard {
                    slot: S,
                    value: Value::Boolean(true),
                },
            )
            .unwrap(),
            Some(Object::Set(ints(&[2])))
        );
    }
}
