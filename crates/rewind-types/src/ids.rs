//! Type-safe identifier wrappers around `u64`.
//!
//! Every persisted entity has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. Ids are allocated sequentially
//! starting at 1 by the replay state, so two runs over the same log produce
//! identical ids.
//!
//! [`SlotId`] is different: it is not allocated here but copied from the
//! event log, where it stands in for a memory address of the recorded
//! process.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Return the value as a signed integer for database binding.
            ///
            /// SQLite integers are signed 64-bit; ids beyond `i64::MAX` are
            /// clamped, which cannot happen with sequential allocation.
            pub fn to_db(self) -> i64 {
                i64::try_from(self.0).unwrap_or(i64::MAX)
            }

            /// Build an identifier from a database integer.
            ///
            /// Negative values are clamped to zero.
            pub fn from_db(raw: i64) -> Self {
                Self(u64::try_from(raw).unwrap_or(0))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// A heap slot: the recorded program's address-like identity for a
    /// container or variable mapping. Unit of independent version history.
    SlotId
}

define_id! {
    /// Identifier of a persisted immutable object snapshot.
    ObjectId
}

define_id! {
    /// Identifier of one function/module/generator activation.
    FrameId
}

define_id! {
    /// Identifier of a recorded source file.
    CodeFileId
}

define_id! {
    /// Identifier of an addressable (frame, clock, line) snapshot.
    SnapshotId
}

define_id! {
    /// Identifier of a recorded error message.
    ErrorId
}

define_id! {
    /// The global logical clock.
    ///
    /// Incremented exactly once per committed heap mutation on any slot.
    /// Clock 0 means "before any mutation".
    Clock
}

impl Clock {
    /// The clock value before any mutation has been committed.
    pub const ZERO: Self = Self(0);

    /// Return the following tick, or `None` on overflow.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl FrameId {
    /// Position of this frame in a zero-based arena.
    ///
    /// Frame ids start at 1; id 0 has no arena position.
    pub fn arena_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()?.checked_sub(1)
    }
}
