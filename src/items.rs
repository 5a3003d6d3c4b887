//! # Mesh Items
//!
//! Core mesh data structures: Vertex, Halfedge, Face.
//! These represent the fundamental elements stored in the mesh.
//!
//! Halfedges are stored in opposite-pairs: the two halfedges of edge `e`
//! occupy indices `2e` and `2e + 1`, so the opposite of halfedge `h` is
//! `h ^ 1` and no explicit opposite link is stored.

use crate::handles::{FaceHandle, HalfedgeHandle, VertexHandle};
use glam::DVec3;

/// A vertex in the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position of the vertex in 3D space
    pub point: DVec3,
    /// Handle to one of the outgoing halfedges
    pub halfedge: Option<HalfedgeHandle>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            point: DVec3::ZERO,
            halfedge: None,
        }
    }
}

impl Vertex {
    /// Create a new vertex at the given position
    pub fn new(point: DVec3) -> Self {
        Self {
            point,
            halfedge: None,
        }
    }

    /// Check if the vertex is isolated (no connected edges)
    pub fn is_isolated(&self) -> bool {
        self.halfedge.is_none()
    }
}

/// A halfedge in the mesh (directional edge)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Halfedge {
    /// The vertex this halfedge points to
    pub vertex: VertexHandle,
    /// The face this halfedge borders (None if boundary)
    pub face: Option<FaceHandle>,
    /// The next halfedge in the face (or boundary) cycle
    pub next: Option<HalfedgeHandle>,
    /// The previous halfedge in the face (or boundary) cycle
    pub prev: Option<HalfedgeHandle>,
}

impl Halfedge {
    /// Check if this is a boundary halfedge
    pub fn is_boundary(&self) -> bool {
        self.face.is_none()
    }
}

/// A face in the mesh (polygon)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Face {
    /// Handle to one of the halfedges bordering this face
    pub halfedge: Option<HalfedgeHandle>,
}

impl Face {
    /// Create a new face with the given halfedge handle
    pub fn new(halfedge: Option<HalfedgeHandle>) -> Self {
        Self { halfedge }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_creation() {
        let v = Vertex::new(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(v.point, DVec3::new(1.0, 2.0, 3.0));
        assert!(v.is_isolated());
    }

    #[test]
    fn test_halfedge_boundary() {
        let mut h = Halfedge::default();
        assert!(h.is_boundary());
        h.face = Some(FaceHandle::new(0));
        assert!(!h.is_boundary());
    }
}
