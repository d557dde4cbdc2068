//! Values carried by the event log and the immutable objects built from them.
//!
//! A [`Value`] is what appears as an event argument: a scalar literal or a
//! reference to a heap slot. An [`Object`] is a fully-resolved snapshot of
//! one heap slot at one logical time. Objects are never mutated after they
//! are saved; every change produces a new object (copy-on-write).

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ids::SlotId;

/// A scalar literal or a heap reference, as written in the event log.
///
/// `HeapRef` names a slot instead of embedding its contents, which models
/// pointer identity in the recorded program: two containers holding the
/// same `HeapRef` share one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A signed integer literal.
    Integer(i64),
    /// A floating point literal.
    Float(f64),
    /// A quoted text literal.
    Text(String),
    /// `True` or `False`.
    Boolean(bool),
    /// `None`.
    Null,
    /// A reference to a heap slot (`*id`).
    HeapRef(SlotId),
}

impl Value {
    /// Return the integer payload, if this is an `Integer`.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Return the referenced slot.
    ///
    /// Slots are written either as `*id` or as a bare non-negative integer
    /// in the leading slot position of mutation events.
    pub fn as_slot(&self) -> Option<SlotId> {
        match self {
            Self::HeapRef(slot) => Some(*slot),
            Self::Integer(n) => u64::try_from(*n).ok().map(SlotId),
            _ => None,
        }
    }

    /// Membership equality as the recorded program sees it.
    ///
    /// Booleans, integers, and floats compare by numeric value, so `1`,
    /// `1.0`, and `True` are the same member. A NaN matches only a NaN with
    /// the same bit pattern. Everything else compares structurally.
    pub fn same_member(&self, other: &Self) -> bool {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.same_number(b),
            _ => self == other,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            Self::Integer(n) => Some(Numeric::Int(*n)),
            Self::Boolean(b) => Some(Numeric::Int(i64::from(*b))),
            Self::Float(f) => Some(Numeric::Float(*f)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn same_number(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    a.to_bits() == b.to_bits()
                } else {
                    a.partial_cmp(&b) == Some(Ordering::Equal)
                }
            }
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => {
                float_equals_int(f, i)
            }
        }
    }
}

/// Exact comparison of a float against an integer, without rounding the
/// integer into float precision.
fn float_equals_int(f: f64, i: i64) -> bool {
    // i64::MIN is exactly representable; i64::MAX + 1 is the first float out of range.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if !f.is_finite() || f.trunc().partial_cmp(&f) != Some(Ordering::Equal) {
        return false;
    }
    if f < LOWER || f >= UPPER {
        return false;
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = f as i64;
    whole == i
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<SlotId> for Value {
    fn from(slot: SlotId) -> Self {
        Self::HeapRef(slot)
    }
}

/// The structural family of an object, used to pick a canonical empty id
/// and to report kind mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Ordered sequence (list or fixed-arity tuple).
    Sequence,
    /// Ordered key/value mapping.
    Mapping,
    /// Unordered collection of unique members (insertion order kept).
    Set,
    /// Immutable text.
    Text,
    /// Attribute bag of a user-defined object.
    Instance,
}

impl core::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Set => "set",
            Self::Text => "text",
            Self::Instance => "instance",
        };
        f.write_str(name)
    }
}

/// An immutable snapshot of one heap slot's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    /// A mutable sequence.
    List(Vec<Value>),
    /// A fixed-arity sequence. Also used for closure cells (arity one).
    Tuple(Vec<Value>),
    /// A set, members kept in first-insertion order.
    Set(Vec<Value>),
    /// A mapping, pairs kept in insertion order. Keys are plain values, so
    /// a composite key is unrepresentable.
    Dict(Vec<(Value, Value)>),
    /// A text value stored on the heap.
    Str(String),
    /// A user-defined object: its type reference and attribute bag.
    Instance {
        /// The value naming the object's type (usually a heap reference).
        type_ref: Value,
        /// Attribute name/value pairs in assignment order.
        attrs: Vec<(Value, Value)>,
    },
}

impl Object {
    /// Return the structural family of this object.
    pub const fn kind(&self) -> ContainerKind {
        match self {
            Self::List(_) | Self::Tuple(_) => ContainerKind::Sequence,
            Self::Set(_) => ContainerKind::Set,
            Self::Dict(_) => ContainerKind::Mapping,
            Self::Str(_) => ContainerKind::Text,
            Self::Instance { .. } => ContainerKind::Instance,
        }
    }

    /// Short name of the concrete container, used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
            Self::Str(_) => "str",
            Self::Instance { .. } => "object",
        }
    }

    /// The canonical-empty family this object belongs to, if it is a
    /// structurally empty sequence, mapping, or set.
    pub fn canonical_empty_kind(&self) -> Option<ContainerKind> {
        match self {
            Self::List(items) | Self::Tuple(items) if items.is_empty() => {
                Some(ContainerKind::Sequence)
            }
            Self::Set(items) if items.is_empty() => Some(ContainerKind::Set),
            Self::Dict(pairs) if pairs.is_empty() => Some(ContainerKind::Mapping),
            _ => None,
        }
    }
}

/// Insert or replace `key` in an ordered pair list, keeping the original
/// position and spelling of an existing key.
pub fn upsert_pair(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    if let Some(slot) = pairs.iter_mut().find(|(k, _)| k.same_member(&key)) {
        slot.1 = value;
    } else {
        pairs.push((key, value));
    }
}
