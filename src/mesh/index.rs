//! Index types for mesh elements.
//!
//! Vertices and faces are addressed by position in their blocks. These
//! wrappers keep the two index spaces from being mixed up in algorithm code
//! such as the face-adjacency graph and the flattened point map.

use std::fmt::{self, Debug};

/// A type-safe vertex index (zero-based position in the vertex block).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(usize);

/// A type-safe face index (zero-based position in the face block).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(usize);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
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
impl_index_type!(FaceId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(VertexId::from(42), v);
    }

    #[test]
    fn test_ordering_follows_raw_index() {
        let mut faces = vec![FaceId::new(3), FaceId::new(0), FaceId::new(2)];
        faces.sort();
        assert_eq!(faces, vec![FaceId::new(0), FaceId::new(2), FaceId::new(3)]);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(42)), "V(42)");
        assert_eq!(format!("{:?}", FaceId::new(7)), "F(7)");
        assert_eq!(format!("{}", FaceId::new(7)), "7");
    }
}
