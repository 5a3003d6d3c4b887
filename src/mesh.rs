//! # PolyMesh
//!
//! Polygonal halfedge mesh connectivity.
//! Provides iteration and circulation over mesh elements, face insertion
//! with boundary relinking, and halfedge collapse.

use crate::handles::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle};
use crate::kernel::ArrayKernel;
use crate::status::StatusFlags;
use glam::DVec3;

/// A polygonal halfedge mesh.
///
/// Vertices, halfedges and faces are addressed by handles; deleted elements
/// are flagged in their status and skipped by the iterators, never
/// compacted, so handles stay stable for the lifetime of the mesh.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    kernel: ArrayKernel,
}

impl PolyMesh {
    /// Create a new empty mesh
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.kernel.clear();
    }

    // --- Counts ---

    /// Number of vertices, including deleted ones
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.kernel.n_vertices()
    }

    /// Number of edges, including deleted ones
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.kernel.n_edges()
    }

    /// Number of halfedges, including those of deleted edges
    #[inline]
    pub fn n_halfedges(&self) -> usize {
        self.kernel.n_halfedges()
    }

    /// Number of faces, including deleted ones
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.kernel.n_faces()
    }

    // --- Vertex operations ---

    /// Add a vertex at the given position
    #[inline]
    pub fn add_vertex(&mut self, point: DVec3) -> VertexHandle {
        self.kernel.new_vertex(point)
    }

    /// Get vertex position
    #[inline]
    pub fn point(&self, vh: VertexHandle) -> DVec3 {
        self.kernel.point(vh)
    }

    /// Set vertex position
    #[inline]
    pub fn set_point(&mut self, vh: VertexHandle, point: DVec3) {
        self.kernel.set_point(vh, point);
    }

    /// Get an outgoing halfedge of a vertex
    #[inline]
    pub fn halfedge_handle(&self, vh: VertexHandle) -> Option<HalfedgeHandle> {
        self.kernel.halfedge_handle(vh)
    }

    /// Set the outgoing halfedge of a vertex
    #[inline]
    pub fn set_halfedge_handle(&mut self, vh: VertexHandle, heh: Option<HalfedgeHandle>) {
        self.kernel.set_halfedge_handle(vh, heh);
    }

    // --- Connectivity queries ---

    /// Get the to-vertex of a halfedge
    #[inline]
    pub fn to_vertex_handle(&self, heh: HalfedgeHandle) -> VertexHandle {
        self.kernel.to_vertex_handle(heh)
    }

    /// Get the from-vertex of a halfedge
    #[inline]
    pub fn from_vertex_handle(&self, heh: HalfedgeHandle) -> VertexHandle {
        self.kernel
            .to_vertex_handle(self.kernel.opposite_halfedge_handle(heh))
    }

    /// Get the opposite halfedge (across the edge)
    #[inline]
    pub fn opposite_halfedge_handle(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        self.kernel.opposite_halfedge_handle(heh)
    }

    /// Get the next halfedge in the cycle
    #[inline]
    pub fn next_halfedge_handle(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        self.kernel.next_halfedge_handle(heh).unwrap_or(heh)
    }

    /// Get the previous halfedge in the cycle
    #[inline]
    pub fn prev_halfedge_handle(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        self.kernel.prev_halfedge_handle(heh).unwrap_or(heh)
    }

    /// Next halfedge, or None when not yet linked
    #[inline]
    pub fn next_halfedge_opt(&self, heh: HalfedgeHandle) -> Option<HalfedgeHandle> {
        self.kernel.next_halfedge_handle(heh)
    }

    /// Previous halfedge, or None when not yet linked
    #[inline]
    pub fn prev_halfedge_opt(&self, heh: HalfedgeHandle) -> Option<HalfedgeHandle> {
        self.kernel.prev_halfedge_handle(heh)
    }

    /// Link `heh` to `next`, maintaining the reciprocal prev link
    #[inline]
    pub fn set_next_halfedge_handle(&mut self, heh: HalfedgeHandle, next: HalfedgeHandle) {
        self.kernel.set_next_halfedge_handle(heh, next);
    }

    /// Get the face of a halfedge (None on boundary)
    #[inline]
    pub fn face_handle(&self, heh: HalfedgeHandle) -> Option<FaceHandle> {
        self.kernel.face_handle(heh)
    }

    /// Set the face of a halfedge
    #[inline]
    pub fn set_face_handle(&mut self, heh: HalfedgeHandle, fh: Option<FaceHandle>) {
        self.kernel.set_face_handle(heh, fh);
    }

    /// Get the edge of a halfedge
    #[inline]
    pub fn edge_handle(&self, heh: HalfedgeHandle) -> EdgeHandle {
        self.kernel.edge_handle(heh)
    }

    /// Get a halfedge of an edge (idx 0 or 1)
    #[inline]
    pub fn edge_halfedge_handle(&self, eh: EdgeHandle, idx: u32) -> HalfedgeHandle {
        self.kernel.edge_halfedge_handle(eh, idx)
    }

    /// Get the halfedge associated with a face
    #[inline]
    pub fn face_halfedge_handle(&self, fh: FaceHandle) -> Option<HalfedgeHandle> {
        self.kernel.face_halfedge_handle(fh)
    }

    /// Set the halfedge associated with a face
    #[inline]
    pub fn set_face_halfedge_handle(&mut self, fh: FaceHandle, heh: HalfedgeHandle) {
        self.kernel.set_face_halfedge_handle(fh, heh);
    }

    // --- Boundary queries ---

    /// A halfedge is a boundary when it borders no face
    #[inline]
    pub fn is_boundary(&self, heh: HalfedgeHandle) -> bool {
        self.kernel.is_boundary_halfedge(heh)
    }

    /// An edge is a boundary when either of its halfedges is
    #[inline]
    pub fn is_boundary_edge(&self, eh: EdgeHandle) -> bool {
        self.is_boundary(self.edge_halfedge_handle(eh, 0))
            || self.is_boundary(self.edge_halfedge_handle(eh, 1))
    }

    /// A vertex is a boundary when its outgoing halfedge is, or when it is
    /// isolated. Relies on the outgoing-halfedge invariant maintained by
    /// `adjust_outgoing_halfedge`.
    #[inline]
    pub fn is_boundary_vertex(&self, vh: VertexHandle) -> bool {
        match self.kernel.halfedge_handle(vh) {
            Some(heh) => self.is_boundary(heh),
            None => true,
        }
    }

    /// Make the vertex's stored halfedge a boundary one if any exists,
    /// so `is_boundary_vertex` stays O(1)
    pub fn adjust_outgoing_halfedge(&mut self, vh: VertexHandle) {
        let boundary = self
            .outgoing_halfedges(vh)
            .find(|&heh| self.is_boundary(heh));
        if let Some(heh) = boundary {
            self.kernel.set_halfedge_handle(vh, Some(heh));
        }
    }

    // --- Statuses ---

    #[inline]
    pub fn vertex_status(&self, vh: VertexHandle) -> StatusFlags {
        self.kernel.vertex_status(vh)
    }

    #[inline]
    pub fn vertex_status_mut(&mut self, vh: VertexHandle) -> &mut StatusFlags {
        self.kernel.vertex_status_mut(vh)
    }

    #[inline]
    pub fn edge_status(&self, eh: EdgeHandle) -> StatusFlags {
        self.kernel.edge_status(eh)
    }

    #[inline]
    pub fn edge_status_mut(&mut self, eh: EdgeHandle) -> &mut StatusFlags {
        self.kernel.edge_status_mut(eh)
    }

    #[inline]
    pub fn face_status(&self, fh: FaceHandle) -> StatusFlags {
        self.kernel.face_status(fh)
    }

    #[inline]
    pub fn face_status_mut(&mut self, fh: FaceHandle) -> &mut StatusFlags {
        self.kernel.face_status_mut(fh)
    }

    // --- Iteration (skips deleted elements) ---

    /// Iterate over all live vertex handles
    pub fn vertices(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        (0..self.n_vertices())
            .map(VertexHandle::from_usize)
            .filter(move |&vh| !self.vertex_status(vh).is_deleted())
    }

    /// Iterate over all live edge handles
    pub fn edges(&self) -> impl Iterator<Item = EdgeHandle> + '_ {
        (0..self.n_edges())
            .map(EdgeHandle::from_usize)
            .filter(move |&eh| !self.edge_status(eh).is_deleted())
    }

    /// Iterate over all halfedges of live edges
    pub fn halfedges(&self) -> impl Iterator<Item = HalfedgeHandle> + '_ {
        (0..self.n_halfedges())
            .map(HalfedgeHandle::from_usize)
            .filter(move |&heh| !self.edge_status(self.edge_handle(heh)).is_deleted())
    }

    /// Iterate over all live face handles
    pub fn faces(&self) -> impl Iterator<Item = FaceHandle> + '_ {
        (0..self.n_faces())
            .map(FaceHandle::from_usize)
            .filter(move |&fh| !self.face_status(fh).is_deleted())
    }

    // --- Circulators ---

    /// Incoming halfedges around a vertex, rotating clockwise
    /// (the OpenMesh `vih_iter` ++ order the extraction passes rely on)
    pub fn incoming_halfedges_cw(&self, vh: VertexHandle) -> IncomingHalfedgeIter<'_> {
        IncomingHalfedgeIter::new(self, vh, Rotation::Cw)
    }

    /// Incoming halfedges around a vertex, rotating counterclockwise
    pub fn incoming_halfedges_ccw(&self, vh: VertexHandle) -> IncomingHalfedgeIter<'_> {
        IncomingHalfedgeIter::new(self, vh, Rotation::Ccw)
    }

    /// Outgoing halfedges around a vertex, rotating clockwise
    pub fn outgoing_halfedges(&self, vh: VertexHandle) -> OutgoingHalfedgeIter<'_> {
        OutgoingHalfedgeIter::new(self, vh)
    }

    /// Halfedges of a face, in next order
    pub fn face_halfedges(&self, fh: FaceHandle) -> FaceHalfedgeIter<'_> {
        FaceHalfedgeIter::new(self, fh)
    }

    /// Number of edges incident to a vertex
    pub fn valence(&self, vh: VertexHandle) -> usize {
        self.outgoing_halfedges(vh).count()
    }

    /// Number of halfedges bounding a face
    pub fn face_valence(&self, fh: FaceHandle) -> usize {
        self.face_halfedges(fh).count()
    }

    /// Find the halfedge from `from` to `to`, if the edge exists
    pub fn find_halfedge(&self, from: VertexHandle, to: VertexHandle) -> Option<HalfedgeHandle> {
        self.outgoing_halfedges(from)
            .find(|&heh| self.to_vertex_handle(heh) == to)
    }

    // --- Low-level construction ---

    /// Add a bare edge (two opposite halfedges); no next/prev/face links
    #[inline]
    pub fn new_edge(&mut self, from: VertexHandle, to: VertexHandle) -> HalfedgeHandle {
        self.kernel.new_edge(from, to)
    }

    /// Add a bare face record
    #[inline]
    pub fn new_face(&mut self) -> FaceHandle {
        self.kernel.new_face(None)
    }

    /// Add a face over existing vertices, reusing boundary edges and
    /// relinking boundary loops as needed. Returns None when the face
    /// would produce a complex (non-manifold) vertex or edge.
    pub fn add_face(&mut self, vhs: &[VertexHandle]) -> Option<FaceHandle> {
        let n = vhs.len();
        if n < 3 {
            return None;
        }

        let mut halfedges = vec![HalfedgeHandle::invalid(); n];
        let mut is_new = vec![false; n];
        let mut needs_adjust = vec![false; n];
        let mut next_cache: Vec<(HalfedgeHandle, HalfedgeHandle)> = Vec::with_capacity(6 * n);

        // check for topological errors
        for i in 0..n {
            if !self.is_boundary_vertex(vhs[i]) {
                return None; // complex vertex
            }
            match self.find_halfedge(vhs[i], vhs[(i + 1) % n]) {
                Some(heh) => {
                    if !self.is_boundary(heh) {
                        return None; // complex edge
                    }
                    halfedges[i] = heh;
                }
                None => is_new[i] = true,
            }
        }

        // re-link patches when two old edges are not yet consecutive
        for i in 0..n {
            let ii = (i + 1) % n;
            if is_new[i] || is_new[ii] {
                continue;
            }
            let inner_prev = halfedges[i];
            let inner_next = halfedges[ii];
            if self.next_halfedge_opt(inner_prev) == Some(inner_next) {
                continue;
            }

            // search a free gap, which must exist
            let outer_prev = self.opposite_halfedge_handle(inner_next);
            let mut boundary_prev = outer_prev;
            loop {
                boundary_prev =
                    self.opposite_halfedge_handle(self.next_halfedge_handle(boundary_prev));
                if self.is_boundary(boundary_prev) {
                    break;
                }
            }
            let boundary_next = self.next_halfedge_handle(boundary_prev);
            if boundary_prev == inner_prev {
                return None; // relink would be impossible
            }
            debug_assert!(self.is_boundary(boundary_prev));
            debug_assert!(self.is_boundary(boundary_next));

            let patch_start = self.next_halfedge_handle(inner_prev);
            let patch_end = self.prev_halfedge_handle(inner_next);
            next_cache.push((boundary_prev, patch_start));
            next_cache.push((patch_end, boundary_next));
            next_cache.push((inner_prev, inner_next));
        }

        // create missing edges
        for i in 0..n {
            if is_new[i] {
                halfedges[i] = self.new_edge(vhs[i], vhs[(i + 1) % n]);
            }
        }

        // create the face
        let fh = self.kernel.new_face(Some(halfedges[n - 1]));

        // setup halfedges
        for i in 0..n {
            let ii = (i + 1) % n;
            let vh = vhs[ii];
            let inner_prev = halfedges[i];
            let inner_next = halfedges[ii];

            let id = u8::from(is_new[i]) | (u8::from(is_new[ii]) << 1);
            if id > 0 {
                let outer_prev = self.opposite_halfedge_handle(inner_next);
                let outer_next = self.opposite_halfedge_handle(inner_prev);
                match id {
                    1 => {
                        // inner_prev is new, inner_next is old
                        let boundary_prev = self.prev_halfedge_handle(inner_next);
                        next_cache.push((boundary_prev, outer_next));
                        self.kernel.set_halfedge_handle(vh, Some(outer_next));
                    }
                    2 => {
                        // inner_next is new, inner_prev is old
                        let boundary_next = self.next_halfedge_handle(inner_prev);
                        next_cache.push((outer_prev, boundary_next));
                        self.kernel.set_halfedge_handle(vh, Some(boundary_next));
                    }
                    _ => {
                        // both are new
                        match self.kernel.halfedge_handle(vh) {
                            None => {
                                self.kernel.set_halfedge_handle(vh, Some(outer_next));
                                next_cache.push((outer_prev, outer_next));
                            }
                            Some(boundary_next) => {
                                let boundary_prev = self.prev_halfedge_handle(boundary_next);
                                next_cache.push((boundary_prev, outer_next));
                                next_cache.push((outer_prev, boundary_next));
                            }
                        }
                    }
                }
                next_cache.push((inner_prev, inner_next));
            } else {
                needs_adjust[ii] = self.kernel.halfedge_handle(vh) == Some(inner_next);
            }

            self.kernel.set_face_handle(halfedges[i], Some(fh));
        }

        for (a, b) in next_cache {
            self.kernel.set_next_halfedge_handle(a, b);
        }

        for i in 0..n {
            if needs_adjust[i] {
                self.adjust_outgoing_halfedge(vhs[i]);
            }
        }

        Some(fh)
    }

    // --- Deletion ---

    /// Mark a vertex deleted. Only safe for isolated vertices; connectivity
    /// of incident elements is not touched.
    pub fn delete_vertex(&mut self, vh: VertexHandle) {
        self.vertex_status_mut(vh).set_deleted(true);
    }

    // --- Halfedge collapse ---

    /// Check whether collapsing `v0v1` (removing its from-vertex) keeps the
    /// mesh manifold
    pub fn is_collapse_ok(&self, v0v1: HalfedgeHandle) -> bool {
        if self.edge_status(self.edge_handle(v0v1)).is_deleted() {
            return false;
        }

        let v1v0 = self.opposite_halfedge_handle(v0v1);
        let v0 = self.to_vertex_handle(v1v0);
        let v1 = self.to_vertex_handle(v0v1);

        if self.vertex_status(v0).is_deleted() || self.vertex_status(v1).is_deleted() {
            return false;
        }

        // opposing vertices of the incident triangles
        let v01n = (!self.is_boundary(v0v1) && self.face_valence_is_3(v0v1))
            .then(|| self.to_vertex_handle(self.next_halfedge_handle(v0v1)));
        let v10n = (!self.is_boundary(v1v0) && self.face_valence_is_3(v1v0))
            .then(|| self.to_vertex_handle(self.next_halfedge_handle(v1v0)));

        // the one-rings of v0 and v1 may only intersect in the opposing vertices
        for heh in self.outgoing_halfedges(v0) {
            let vv = self.to_vertex_handle(heh);
            if Some(vv) != v01n && Some(vv) != v10n && self.find_halfedge(vv, v1).is_some() {
                return false;
            }
        }

        // folding two triangles onto each other
        if v01n.is_some() && v01n == v10n {
            return false;
        }

        // an edge between two boundary vertices must itself be a boundary edge
        if self.is_boundary_vertex(v0)
            && self.is_boundary_vertex(v1)
            && !self.is_boundary(v0v1)
            && !self.is_boundary(v1v0)
        {
            return false;
        }

        true
    }

    #[inline]
    fn face_valence_is_3(&self, heh: HalfedgeHandle) -> bool {
        self.next_halfedge_handle(self.next_halfedge_handle(self.next_halfedge_handle(heh))) == heh
    }

    /// Collapse halfedge `heh`: its from-vertex is removed, incident
    /// degenerate faces become loops and are removed as well.
    /// Caller must have verified `is_collapse_ok`.
    pub fn collapse(&mut self, heh: HalfedgeHandle) {
        let h0 = heh;
        let h1 = self.next_halfedge_handle(h0);
        let o0 = self.opposite_halfedge_handle(h0);
        let o1 = self.next_halfedge_handle(o0);

        self.collapse_edge(h0);

        if self.next_halfedge_handle(self.next_halfedge_handle(h1)) == h1 {
            self.collapse_loop(self.next_halfedge_handle(h1));
        }
        if self.next_halfedge_handle(self.next_halfedge_handle(o1)) == o1 {
            self.collapse_loop(o1);
        }
    }

    fn collapse_edge(&mut self, h: HalfedgeHandle) {
        let hn = self.next_halfedge_handle(h);
        let hp = self.prev_halfedge_handle(h);

        let o = self.opposite_halfedge_handle(h);
        let on = self.next_halfedge_handle(o);
        let op = self.prev_halfedge_handle(o);

        let fh = self.face_handle(h);
        let fo = self.face_handle(o);

        let vh = self.to_vertex_handle(h);
        let vo = self.to_vertex_handle(o);

        // halfedge -> vertex: incoming halfedges of the removed vertex
        // now point at the kept one
        let incoming: Vec<HalfedgeHandle> = self.incoming_halfedges_cw(vo).collect();
        for ih in incoming {
            self.kernel.set_to_vertex_handle(ih, vh);
        }

        // halfedge -> halfedge
        self.set_next_halfedge_handle(hp, hn);
        self.set_next_halfedge_handle(op, on);

        // face -> halfedge
        if let Some(fh) = fh {
            self.set_face_halfedge_handle(fh, hn);
        }
        if let Some(fo) = fo {
            self.set_face_halfedge_handle(fo, on);
        }

        // vertex -> halfedge
        if self.kernel.halfedge_handle(vh) == Some(o) {
            self.kernel.set_halfedge_handle(vh, Some(hn));
        }
        self.adjust_outgoing_halfedge(vh);
        self.kernel.set_halfedge_handle(vo, None);

        let eh = self.edge_handle(h);
        self.edge_status_mut(eh).set_deleted(true);
        self.vertex_status_mut(vo).set_deleted(true);
    }

    fn collapse_loop(&mut self, h: HalfedgeHandle) {
        let h0 = h;
        let h1 = self.next_halfedge_handle(h0);

        let o0 = self.opposite_halfedge_handle(h0);
        let o1 = self.opposite_halfedge_handle(h1);

        let fh = self.face_handle(h0);
        let fo = self.face_handle(o0);

        let v0 = self.to_vertex_handle(h0);
        let v1 = self.to_vertex_handle(h1);

        debug_assert!(self.next_halfedge_handle(h1) == h0 && h1 != o0);

        // halfedge -> halfedge
        let o0n = self.next_halfedge_handle(o0);
        let o0p = self.prev_halfedge_handle(o0);
        self.set_next_halfedge_handle(h1, o0n);
        self.set_next_halfedge_handle(o0p, h1);

        // halfedge -> face
        self.set_face_handle(h1, fo);

        // vertex -> halfedge
        self.kernel.set_halfedge_handle(v0, Some(h1));
        self.adjust_outgoing_halfedge(v0);
        self.kernel.set_halfedge_handle(v1, Some(o1));
        self.adjust_outgoing_halfedge(v1);

        // face -> halfedge
        if let Some(fo) = fo {
            if self.kernel.face_halfedge_handle(fo) == Some(o0) {
                self.set_face_halfedge_handle(fo, h1);
            }
        }

        if let Some(fh) = fh {
            self.face_status_mut(fh).set_deleted(true);
        }
        let eh = self.edge_handle(h0);
        self.edge_status_mut(eh).set_deleted(true);
    }

    /// Validate halfedge structure integrity.
    /// Returns Ok if valid, Err with a message if issues were found.
    pub fn validate(&self) -> Result<(), String> {
        for fh in self.faces() {
            let Some(start) = self.face_halfedge_handle(fh) else {
                return Err(format!("face {} has no halfedge", fh));
            };
            let mut count = 0;
            let mut current = start;
            loop {
                count += 1;
                if count > 64 {
                    return Err(format!("face {} has >64 halfedges - cycle broken", fh));
                }
                if self.face_handle(current) != Some(fh) {
                    return Err(format!("face {} cycle strays into another face", fh));
                }
                current = self.next_halfedge_handle(current);
                if current == start {
                    break;
                }
            }
            if count < 3 {
                return Err(format!("face {} has only {} halfedges", fh, count));
            }
        }

        for vh in self.vertices() {
            let mut count = 0;
            for heh in self.outgoing_halfedges(vh) {
                count += 1;
                if count > 64 {
                    return Err(format!("vertex {} ring has >64 halfedges", vh));
                }
                if self.from_vertex_handle(heh) != vh {
                    return Err(format!("vertex {} has a foreign outgoing halfedge", vh));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Cw,
    Ccw,
}

/// Circulator over the incoming halfedges of a vertex
pub struct IncomingHalfedgeIter<'a> {
    mesh: &'a PolyMesh,
    start: Option<HalfedgeHandle>,
    current: Option<HalfedgeHandle>,
    rotation: Rotation,
    started: bool,
}

impl<'a> IncomingHalfedgeIter<'a> {
    fn new(mesh: &'a PolyMesh, vh: VertexHandle, rotation: Rotation) -> Self {
        let start = mesh
            .halfedge_handle(vh)
            .map(|heh| mesh.opposite_halfedge_handle(heh));
        Self {
            mesh,
            start,
            current: start,
            rotation,
            started: false,
        }
    }
}

impl Iterator for IncomingHalfedgeIter<'_> {
    type Item = HalfedgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let heh = self.current?;
        if self.started && self.current == self.start {
            return None;
        }
        self.started = true;
        self.current = match self.rotation {
            Rotation::Cw => {
                // across the face of the incoming halfedge
                Some(
                    self.mesh
                        .opposite_halfedge_handle(self.mesh.next_halfedge_handle(heh)),
                )
            }
            Rotation::Ccw => Some(
                self.mesh
                    .prev_halfedge_handle(self.mesh.opposite_halfedge_handle(heh)),
            ),
        };
        Some(heh)
    }
}

/// Circulator over the outgoing halfedges of a vertex
pub struct OutgoingHalfedgeIter<'a> {
    mesh: &'a PolyMesh,
    start: Option<HalfedgeHandle>,
    current: Option<HalfedgeHandle>,
    started: bool,
}

impl<'a> OutgoingHalfedgeIter<'a> {
    fn new(mesh: &'a PolyMesh, vh: VertexHandle) -> Self {
        let start = mesh.halfedge_handle(vh);
        Self {
            mesh,
            start,
            current: start,
            started: false,
        }
    }
}

impl Iterator for OutgoingHalfedgeIter<'_> {
    type Item = HalfedgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let heh = self.current?;
        if self.started && self.current == self.start {
            return None;
        }
        self.started = true;
        self.current = Some(
            self.mesh
                .next_halfedge_handle(self.mesh.opposite_halfedge_handle(heh)),
        );
        Some(heh)
    }
}

/// Iterator over the halfedges of a face, following next links
pub struct FaceHalfedgeIter<'a> {
    mesh: &'a PolyMesh,
    start: Option<HalfedgeHandle>,
    current: Option<HalfedgeHandle>,
    started: bool,
}

impl<'a> FaceHalfedgeIter<'a> {
    fn new(mesh: &'a PolyMesh, fh: FaceHandle) -> Self {
        let start = mesh.face_halfedge_handle(fh);
        Self {
            mesh,
            start,
            current: start,
            started: false,
        }
    }
}

impl Iterator for FaceHalfedgeIter<'_> {
    type Item = HalfedgeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let heh = self.current?;
        if self.started && self.current == self.start {
            return None;
        }
        self.started = true;
        self.current = Some(self.mesh.next_halfedge_handle(heh));
        Some(heh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> (PolyMesh, [VertexHandle; 4]) {
        // two triangles over the unit square
        let mut mesh = PolyMesh::new();
        let v0 = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
        assert!(mesh.add_face(&[v0, v1, v3]).is_some());
        assert!(mesh.add_face(&[v1, v2, v3]).is_some());
        (mesh, [v0, v1, v2, v3])
    }

    #[test]
    fn test_add_face_counts() {
        let (mesh, _) = quad_mesh();
        assert_eq!(mesh.n_vertices(), 4);
        assert_eq!(mesh.n_edges(), 5);
        assert_eq!(mesh.n_faces(), 2);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_shared_edge_is_interior() {
        let (mesh, [_, v1, _, v3]) = quad_mesh();
        let heh = mesh.find_halfedge(v1, v3).unwrap();
        assert!(!mesh.is_boundary(heh));
        assert!(!mesh.is_boundary(mesh.opposite_halfedge_handle(heh)));
        assert!(!mesh.is_boundary_edge(mesh.edge_handle(heh)));
    }

    #[test]
    fn test_boundary_loop_linked() {
        let (mesh, [v0, ..]) = quad_mesh();
        // walk the outer boundary loop; it has 4 halfedges
        let start = mesh
            .outgoing_halfedges(v0)
            .find(|&h| mesh.is_boundary(h))
            .unwrap();
        let mut current = start;
        let mut count = 0;
        loop {
            count += 1;
            assert!(mesh.is_boundary(current));
            current = mesh.next_halfedge_handle(current);
            if current == start {
                break;
            }
            assert!(count <= 4);
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn test_circulator_valence() {
        let (mesh, [v0, v1, _, v3]) = quad_mesh();
        assert_eq!(mesh.valence(v0), 2);
        assert_eq!(mesh.valence(v1), 3);
        assert_eq!(mesh.valence(v3), 3);
    }

    #[test]
    fn test_incoming_cw_ccw_agree() {
        let (mesh, [_, v1, _, _]) = quad_mesh();
        let mut cw: Vec<_> = mesh.incoming_halfedges_cw(v1).collect();
        let ccw: Vec<_> = mesh.incoming_halfedges_ccw(v1).collect();
        assert_eq!(cw.len(), ccw.len());
        // same starting element, opposite rotation
        assert_eq!(cw[0], ccw[0]);
        cw[1..].reverse();
        assert_eq!(cw, ccw);
    }

    #[test]
    fn test_outgoing_halfedge_boundary_invariant() {
        let (mesh, vhs) = quad_mesh();
        for vh in vhs {
            let heh = mesh.halfedge_handle(vh).unwrap();
            assert!(mesh.is_boundary(heh), "vertex {} outgoing not boundary", vh);
        }
    }

    #[test]
    fn test_collapse_interior_edge() {
        // 4 triangles around a center vertex inside a square
        let mut mesh = PolyMesh::new();
        let c = mesh.add_vertex(DVec3::new(0.5, 0.5, 0.0));
        let v0 = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[v0, v1, c]).unwrap();
        mesh.add_face(&[v1, v2, c]).unwrap();
        mesh.add_face(&[v2, v3, c]).unwrap();
        mesh.add_face(&[v3, v0, c]).unwrap();

        let heh = mesh.find_halfedge(c, v0).unwrap();
        assert!(mesh.is_collapse_ok(heh));
        mesh.collapse(heh);

        assert!(mesh.vertex_status(c).is_deleted());
        assert_eq!(mesh.vertices().count(), 4);
        assert_eq!(mesh.faces().count(), 2);
        assert_eq!(mesh.edges().count(), 5);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_collapse_legality() {
        let (mesh, [v0, v1, _, v3]) = quad_mesh();
        // boundary edge between boundary vertices: legal
        let heh = mesh.find_halfedge(v0, v1).unwrap();
        assert!(mesh.is_collapse_ok(heh));
        // interior edge between two boundary vertices: illegal
        let shared = mesh.find_halfedge(v1, v3).unwrap();
        assert!(!mesh.is_collapse_ok(shared));
    }
}
