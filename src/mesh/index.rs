//! Index types for mesh elements.
//!
//! Vertices, edges, and faces are addressed through small `u32` newtypes so a
//! vertex index can never be mixed up with an edge index, and so per-element
//! arrays (cells, visited sets, displacement values) can be indexed directly.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

/// Sentinel raw value for an invalid index.
const INVALID: u32 = u32::MAX;

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            ///
            /// # Panics
            /// Panics in debug builds if the value does not fit in 32 bits.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(EdgeId, "E");
impl_index_type!(FaceId, "F");
