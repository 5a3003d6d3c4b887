//! # Handles
//!
//! Handle types for mesh entities (Vertex, Halfedge, Edge, Face).
//! Handles are lightweight references to mesh elements using integer indices.

use std::fmt;

/// Base handle type for all mesh entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaseHandle {
    idx: u32,
}

impl BaseHandle {
    /// Create a new handle with the given index (u32::MAX = invalid)
    #[inline]
    pub fn new(idx: u32) -> Self {
        Self { idx }
    }

    /// Create from usize
    #[inline]
    pub fn from_usize(idx: usize) -> Self {
        Self { idx: idx as u32 }
    }

    /// Get the underlying index
    #[inline]
    pub fn idx(&self) -> u32 {
        self.idx
    }

    /// Get as usize (for indexing)
    #[inline]
    pub fn idx_usize(&self) -> usize {
        self.idx as usize
    }

    /// Check if the handle is valid (index != MAX)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.idx != u32::MAX
    }

    /// Invalidate the handle
    #[inline]
    pub fn invalidate(&mut self) {
        self.idx = u32::MAX;
    }
}

impl Default for BaseHandle {
    #[inline]
    fn default() -> Self {
        Self::new(u32::MAX)
    }
}

impl fmt::Display for BaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.idx)
    }
}

macro_rules! entity_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(BaseHandle);

        impl $name {
            /// Create a new handle
            #[inline]
            pub fn new(idx: u32) -> Self {
                Self(BaseHandle::new(idx))
            }

            /// Create from usize
            #[inline]
            pub fn from_usize(idx: usize) -> Self {
                Self(BaseHandle::from_usize(idx))
            }

            /// Get an invalid handle
            #[inline]
            pub fn invalid() -> Self {
                Self::new(u32::MAX)
            }

            /// Get the underlying index
            #[inline]
            pub fn idx(&self) -> u32 {
                self.0.idx()
            }

            /// Get as usize (for indexing)
            #[inline]
            pub fn idx_usize(&self) -> usize {
                self.0.idx_usize()
            }

            /// Check if valid
            #[inline]
            pub fn is_valid(&self) -> bool {
                self.0.is_valid()
            }

            /// Invalidate the handle
            #[inline]
            pub fn invalidate(&mut self) {
                self.0.invalidate();
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(idx: u32) -> Self {
                Self::new(idx)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_handle!(
    /// Handle referencing a vertex entity
    VertexHandle
);
entity_handle!(
    /// Handle referencing a halfedge entity
    HalfedgeHandle
);
entity_handle!(
    /// Handle referencing an edge entity
    EdgeHandle
);
entity_handle!(
    /// Handle referencing a face entity
    FaceHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_validity() {
        let vh = VertexHandle::new(3);
        assert!(vh.is_valid());
        assert_eq!(vh.idx(), 3);
        assert_eq!(vh.idx_usize(), 3);

        let invalid = VertexHandle::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(VertexHandle::default(), invalid);
    }

    #[test]
    fn test_handle_invalidate() {
        let mut heh = HalfedgeHandle::new(7);
        assert!(heh.is_valid());
        heh.invalidate();
        assert!(!heh.is_valid());
    }

    #[test]
    fn test_handle_types_distinct() {
        // Same index, different entity kinds
        let vh = VertexHandle::new(0);
        let fh = FaceHandle::new(0);
        assert_eq!(vh.idx(), fh.idx());
    }
}
