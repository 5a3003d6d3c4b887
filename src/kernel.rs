//! # ArrayKernel
//!
//! Core mesh storage using arrays (Vec) for mesh items.
//! This is the underlying storage layer for the mesh data structure.

use crate::handles::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle};
use crate::items::{Face, Halfedge, Vertex};
use crate::status::StatusFlags;
use glam::DVec3;

/// The ArrayKernel - core mesh storage using Vec containers
#[derive(Debug, Clone, Default)]
pub struct ArrayKernel {
    vertices: Vec<Vertex>,
    halfedges: Vec<Halfedge>,
    faces: Vec<Face>,

    vertex_status: Vec<StatusFlags>,
    edge_status: Vec<StatusFlags>,
    face_status: Vec<StatusFlags>,
}

impl ArrayKernel {
    /// Create a new empty kernel
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.halfedges.clear();
        self.faces.clear();
        self.vertex_status.clear();
        self.edge_status.clear();
        self.face_status.clear();
    }

    // --- Counts ---

    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn n_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    #[inline]
    pub fn n_edges(&self) -> usize {
        self.halfedges.len() / 2
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    // --- Item creation ---

    /// Add a new vertex and return its handle
    #[inline]
    pub fn new_vertex(&mut self, point: DVec3) -> VertexHandle {
        self.vertices.push(Vertex::new(point));
        self.vertex_status.push(StatusFlags::new());
        VertexHandle::from_usize(self.vertices.len() - 1)
    }

    /// Add a new edge (a pair of opposite halfedges) between two vertices.
    /// Returns the halfedge pointing to `to`.
    pub fn new_edge(&mut self, from: VertexHandle, to: VertexHandle) -> HalfedgeHandle {
        let heh0 = HalfedgeHandle::from_usize(self.halfedges.len());
        self.halfedges.push(Halfedge {
            vertex: to,
            ..Halfedge::default()
        });
        self.halfedges.push(Halfedge {
            vertex: from,
            ..Halfedge::default()
        });
        self.edge_status.push(StatusFlags::new());
        heh0
    }

    /// Add a new face and return its handle
    #[inline]
    pub fn new_face(&mut self, halfedge: Option<HalfedgeHandle>) -> FaceHandle {
        self.faces.push(Face::new(halfedge));
        self.face_status.push(StatusFlags::new());
        FaceHandle::from_usize(self.faces.len() - 1)
    }

    // --- Topology queries ---

    #[inline]
    pub fn point(&self, vh: VertexHandle) -> DVec3 {
        self.vertices[vh.idx_usize()].point
    }

    #[inline]
    pub fn set_point(&mut self, vh: VertexHandle, point: DVec3) {
        self.vertices[vh.idx_usize()].point = point;
    }

    #[inline]
    pub fn halfedge_handle(&self, vh: VertexHandle) -> Option<HalfedgeHandle> {
        self.vertices[vh.idx_usize()].halfedge
    }

    #[inline]
    pub fn set_halfedge_handle(&mut self, vh: VertexHandle, heh: Option<HalfedgeHandle>) {
        self.vertices[vh.idx_usize()].halfedge = heh;
    }

    #[inline]
    pub fn face_halfedge_handle(&self, fh: FaceHandle) -> Option<HalfedgeHandle> {
        self.faces[fh.idx_usize()].halfedge
    }

    #[inline]
    pub fn set_face_halfedge_handle(&mut self, fh: FaceHandle, heh: HalfedgeHandle) {
        self.faces[fh.idx_usize()].halfedge = Some(heh);
    }

    #[inline]
    pub fn to_vertex_handle(&self, heh: HalfedgeHandle) -> VertexHandle {
        self.halfedges[heh.idx_usize()].vertex
    }

    #[inline]
    pub fn set_to_vertex_handle(&mut self, heh: HalfedgeHandle, vh: VertexHandle) {
        self.halfedges[heh.idx_usize()].vertex = vh;
    }

    /// The opposite halfedge shares the edge, so it lives at the paired index
    #[inline]
    pub fn opposite_halfedge_handle(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        HalfedgeHandle::new(heh.idx() ^ 1)
    }

    #[inline]
    pub fn next_halfedge_handle(&self, heh: HalfedgeHandle) -> Option<HalfedgeHandle> {
        self.halfedges[heh.idx_usize()].next
    }

    #[inline]
    pub fn prev_halfedge_handle(&self, heh: HalfedgeHandle) -> Option<HalfedgeHandle> {
        self.halfedges[heh.idx_usize()].prev
    }

    /// Link `heh` to `next` in the face (or boundary) cycle, maintaining
    /// the reciprocal prev link
    #[inline]
    pub fn set_next_halfedge_handle(&mut self, heh: HalfedgeHandle, next: HalfedgeHandle) {
        self.halfedges[heh.idx_usize()].next = Some(next);
        self.halfedges[next.idx_usize()].prev = Some(heh);
    }

    #[inline]
    pub fn face_handle(&self, heh: HalfedgeHandle) -> Option<FaceHandle> {
        self.halfedges[heh.idx_usize()].face
    }

    #[inline]
    pub fn set_face_handle(&mut self, heh: HalfedgeHandle, fh: Option<FaceHandle>) {
        self.halfedges[heh.idx_usize()].face = fh;
    }

    #[inline]
    pub fn edge_handle(&self, heh: HalfedgeHandle) -> EdgeHandle {
        EdgeHandle::new(heh.idx() >> 1)
    }

    /// Get a halfedge of an edge (idx 0 or 1)
    #[inline]
    pub fn edge_halfedge_handle(&self, eh: EdgeHandle, idx: u32) -> HalfedgeHandle {
        debug_assert!(idx < 2);
        HalfedgeHandle::new((eh.idx() << 1) | idx)
    }

    #[inline]
    pub fn is_boundary_halfedge(&self, heh: HalfedgeHandle) -> bool {
        self.halfedges[heh.idx_usize()].face.is_none()
    }

    // --- Statuses ---

    #[inline]
    pub fn vertex_status(&self, vh: VertexHandle) -> StatusFlags {
        self.vertex_status[vh.idx_usize()]
    }

    #[inline]
    pub fn vertex_status_mut(&mut self, vh: VertexHandle) -> &mut StatusFlags {
        &mut self.vertex_status[vh.idx_usize()]
    }

    #[inline]
    pub fn edge_status(&self, eh: EdgeHandle) -> StatusFlags {
        self.edge_status[eh.idx_usize()]
    }

    #[inline]
    pub fn edge_status_mut(&mut self, eh: EdgeHandle) -> &mut StatusFlags {
        &mut self.edge_status[eh.idx_usize()]
    }

    #[inline]
    pub fn face_status(&self, fh: FaceHandle) -> StatusFlags {
        self.face_status[fh.idx_usize()]
    }

    #[inline]
    pub fn face_status_mut(&mut self, fh: FaceHandle) -> &mut StatusFlags {
        &mut self.face_status[fh.idx_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_edge_pairing() {
        let mut kernel = ArrayKernel::new();
        let v0 = kernel.new_vertex(DVec3::ZERO);
        let v1 = kernel.new_vertex(DVec3::X);

        let heh0 = kernel.new_edge(v0, v1);
        let heh1 = kernel.opposite_halfedge_handle(heh0);

        assert_eq!(kernel.to_vertex_handle(heh0), v1);
        assert_eq!(kernel.to_vertex_handle(heh1), v0);
        assert_eq!(kernel.opposite_halfedge_handle(heh1), heh0);
        assert_eq!(kernel.edge_handle(heh0), kernel.edge_handle(heh1));
        assert_eq!(kernel.n_edges(), 1);
        assert_eq!(kernel.n_halfedges(), 2);
    }

    #[test]
    fn test_kernel_next_prev_link() {
        let mut kernel = ArrayKernel::new();
        let v0 = kernel.new_vertex(DVec3::ZERO);
        let v1 = kernel.new_vertex(DVec3::X);
        let v2 = kernel.new_vertex(DVec3::Y);

        let a = kernel.new_edge(v0, v1);
        let b = kernel.new_edge(v1, v2);

        kernel.set_next_halfedge_handle(a, b);
        assert_eq!(kernel.next_halfedge_handle(a), Some(b));
        assert_eq!(kernel.prev_halfedge_handle(b), Some(a));
    }
}
