//! Index newtypes for the constant pool families.
//!
//! Families with no NULL value (strings, arrays, tables, serializables,
//! floats) are addressed 0-based. Families that must be able to encode NULL
//! in a bytecode operand (handles, negatives, auxiliary values) are 1-based
//! and reserve raw `0` for NULL, which is why they wrap `NonZeroU32` and
//! decode through `from_raw(u32) -> Option<Self>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Convert a sequence offset into the pool's `u32` index space.
///
/// # Panics
/// Panics if a single family grows past `u32::MAX` entries.
pub(crate) fn to_u32(index: usize) -> u32 {
    assert!(
        index <= u32::MAX as usize,
        "constant pool family exceeds u32 index space"
    );
    index as u32
}

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(to_u32(index))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

macro_rules! nullable_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Decode an operand; raw `0` is NULL.
            #[inline]
            pub const fn from_raw(raw: u32) -> Option<Self> {
                match NonZeroU32::new(raw) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0.get()
            }

            /// Offset into the backing sequence (`raw - 1`).
            #[inline]
            pub const fn index(self) -> usize {
                (self.0.get() - 1) as usize
            }

            /// Encode an optional id as an operand, NULL as `0`.
            #[inline]
            pub fn raw_or_null(id: Option<Self>) -> u32 {
                id.map_or(0, Self::raw)
            }

            /// Id of the entry that was just pushed, given the new length.
            pub(crate) fn from_len(len: usize) -> Self {
                match NonZeroU32::new(to_u32(len)) {
                    Some(raw) => Self(raw),
                    None => unreachable!("id allocated from an empty sequence"),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

dense_id!(
    /// Index into the string family.
    StringId
);
dense_id!(
    /// Index into the integer-array family.
    ArrayId
);
dense_id!(
    /// Index into the symbol table family.
    TableId
);
dense_id!(
    /// Index into the serializable value family.
    SerializableId
);
dense_id!(
    /// Index into the float family.
    FloatId
);

nullable_id!(
    /// Resolution slot for a raw handle. Never deduplicated.
    HandleId
);
nullable_id!(
    /// Index into the negative number family.
    NegativeId
);
nullable_id!(
    /// Index into the runtime-only auxiliary value table.
    OtherId
);
