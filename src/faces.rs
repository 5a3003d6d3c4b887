//! # Polygon face traversal
//!
//! Walks the connected stubs in rotational order to assemble the output
//! faces, builds the quad halfedge graph at the lowest level (the stub
//! graph can be non-manifold, so face insertion pre-checks every halfedge),
//! and transfers per-corner integer UVs through the accumulated face
//! transitions.

use crate::extractor::{ExtractOptions, MeshExtractor, QuadExtraction};
use crate::handles::{FaceHandle, HalfedgeHandle, VertexHandle};
use crate::mesh::PolyMesh;
use crate::transition::TransitionFunction;
use glam::IVec2;
use log::{debug, error, warn};
use std::collections::HashSet;

/// Cap on output face size, a safeguard against runaway cycles
const MAX_FACE_VALENCE: usize = 100;

/// Cap on boundary loop length in the hole census
const MAX_BOUNDARY_LENGTH: usize = 100_000;

impl MeshExtractor {
    /// Assemble output faces from the connected stub graph
    pub(crate) fn generate_faces(&mut self, options: &ExtractOptions<'_>) -> QuadExtraction {
        let mut qmesh = PolyMesh::new();
        let mut halfedge_uvs: Vec<IVec2> = Vec::new();

        // output vertices correspond 1:1 to grid vertices
        for gv in &self.gvertices {
            let vh = qmesh.add_vertex(gv.position_3d);
            qmesh.vertex_status_mut(vh).set_tagged(gv.is_boundary);
        }

        for i in 0..self.gvertices.len() {
            for j in 0..self.gvertices[i].n_edges() {
                if self.gvertices[i].local_edges[j].face_constructed {
                    continue;
                }
                self.walk_face_cycle(i, j, options, &mut qmesh, &mut halfedge_uvs);
            }
        }

        let (desired_holes, undesired_holes) = Self::census_and_cleanup(&mut qmesh);
        Self::log_quad_mesh_metrics(&qmesh);

        halfedge_uvs.resize(qmesh.n_halfedges(), IVec2::ZERO);
        QuadExtraction {
            mesh: qmesh,
            halfedge_uvs,
            desired_holes,
            undesired_holes,
        }
    }

    /// Walk one closed stub cycle starting at stub (i, j) and emit a face
    /// when the cycle closes with at least three vertices
    fn walk_face_cycle(
        &mut self,
        i: usize,
        j: usize,
        options: &ExtractOptions<'_>,
        qmesh: &mut PolyMesh,
        halfedge_uvs: &mut Vec<IVec2>,
    ) {
        let mut face_vhs: Vec<VertexHandle> = Vec::new();
        let mut outgoing: Vec<(usize, usize)> = Vec::new();

        let mut cur = (i, j);
        for _ in 0..MAX_FACE_VALENCE {
            let (g, o) = cur;

            // returned to start?
            if g == i && !face_vhs.is_empty() {
                if face_vhs.len() > 2 {
                    self.emit_face(&face_vhs, &outgoing, options, qmesh, halfedge_uvs);
                }
                return;
            }

            // already consumed by another face?
            if self.gvertices[g].local_edges[o].face_constructed {
                return;
            }

            let new_vh = VertexHandle::from_usize(g);
            if options.discard_double_faces && face_vhs.contains(&new_vh) {
                warn!("face cycle visits grid vertex {g} twice, discarding");
                return;
            }
            face_vhs.push(new_vh);
            self.gvertices[g].local_edges[o].face_constructed = true;

            let Some((ng, no)) = self.gvertices[g].local_edges[o].connection.connected() else {
                return; // unconnected stub ends the cycle without a face
            };
            outgoing.push((g, o));

            // next outgoing stub is the cyclic predecessor of the incoming
            // one
            cur = (ng, self.gvertices[ng].cyclic_index(no as isize - 1));
        }
    }

    fn emit_face(
        &mut self,
        face_vhs: &[VertexHandle],
        outgoing: &[(usize, usize)],
        options: &ExtractOptions<'_>,
        qmesh: &mut PolyMesh,
        halfedge_uvs: &mut Vec<IVec2>,
    ) {
        let corner_uvs = self.face_corner_uvs(outgoing);

        // a cycle of boundary grid vertices with non-positive winding is
        // the back side of the mesh boundary, not a face
        if Self::uv_signed_area(&corner_uvs) <= 0
            && outgoing.iter().all(|&(g, _)| self.gvertices[g].is_boundary)
        {
            debug!(
                "skipping reversed cycle of {} boundary grid vertices",
                outgoing.len()
            );
            return;
        }

        let fh = if options.discard_double_faces {
            qmesh.add_face(face_vhs)
        } else {
            self.add_quad_face(qmesh, outgoing)
        };
        match fh {
            Some(fh) => {
                self.assign_halfedge_uvs(qmesh, fh, face_vhs, &corner_uvs, halfedge_uvs);
            }
            None => {
                warn!("skipping non-manifold face, this may leave a hole");
            }
        }
    }

    /// Search from stub `start_o` of grid vertex `g` in `direction` for the
    /// next stub that is connected and already carries an output halfedge
    fn next_connected_lei_with_he(
        &self,
        g: usize,
        start_o: usize,
        direction: isize,
    ) -> Option<(usize, usize)> {
        let len = self.gvertices[g].local_edges.len();
        let mut o = start_o as isize;
        for _ in 0..len {
            o += direction;
            let idx = self.gvertices[g].cyclic_index(o);
            if idx == start_o {
                return None;
            }
            let lei = &self.gvertices[g].local_edges[idx];
            if lei.connection.is_connected() && lei.halfedge.is_some() {
                return Some((g, idx));
            }
        }
        None
    }

    /// Around the origin vertex of stub (g, o): the output halfedge of the
    /// clockwise-next stub that already has one. It follows the new
    /// opposite halfedge in the boundary ring.
    fn opposite_next_halfedge(&self, g: usize, o: usize) -> Option<HalfedgeHandle> {
        self.next_connected_lei_with_he(g, o, -1)
            .and_then(|(a, b)| self.gvertices[a].local_edges[b].halfedge)
    }

    /// Around the destination vertex of stub (g, o) with peer (og, oo): the
    /// halfedge of the peer of the counterclockwise-next stub carrying one.
    /// It precedes the new opposite halfedge in the boundary ring.
    fn opposite_prev_halfedge(&self, og: usize, oo: usize) -> Option<HalfedgeHandle> {
        let (pg, po) = self.next_connected_lei_with_he(og, oo, 1)?;
        let (qg, qo) = self.gvertices[pg].local_edges[po].connection.connected()?;
        self.gvertices[qg].local_edges[qo].halfedge
    }

    /// Build a face from a closed list of connected stubs, creating output
    /// halfedges on demand. Returns None when attaching the face would make
    /// any participating halfedge two-sided.
    fn add_quad_face(
        &mut self,
        qmesh: &mut PolyMesh,
        leis: &[(usize, usize)],
    ) -> Option<FaceHandle> {
        debug_assert!(!leis.is_empty());

        let has_face = |qmesh: &PolyMesh, heh: Option<HalfedgeHandle>| {
            heh.is_some_and(|heh| qmesh.face_handle(heh).is_some())
        };

        // manifoldness pre-check
        for &(g, o) in leis {
            let lei = &self.gvertices[g].local_edges[o];
            if let Some(heh) = lei.halfedge {
                if qmesh.face_handle(heh).is_some() {
                    return None;
                }
            } else {
                let (og, oo) = lei.connection.connected()?;
                if has_face(qmesh, self.opposite_next_halfedge(g, o)) {
                    return None;
                }
                if has_face(qmesh, self.opposite_prev_halfedge(og, oo)) {
                    return None;
                }
            }
        }

        let new_fh = qmesh.new_face();

        for (idx, &(g, o)) in leis.iter().enumerate() {
            let heh0 = match self.gvertices[g].local_edges[o].halfedge {
                Some(heh) => heh,
                None => {
                    let (og, oo) = self.gvertices[g].local_edges[o]
                        .connection
                        .connected()
                        .expect("face cycle contains an unconnected stub");

                    let from_vh = VertexHandle::from_usize(g);
                    let to_vh = VertexHandle::from_usize(og);
                    let heh0 = qmesh.new_edge(from_vh, to_vh);
                    let heh1 = qmesh.opposite_halfedge_handle(heh0);

                    if qmesh.halfedge_handle(from_vh).is_none() {
                        qmesh.set_halfedge_handle(from_vh, Some(heh0));
                    }
                    if qmesh.halfedge_handle(to_vh).is_none() {
                        qmesh.set_halfedge_handle(to_vh, Some(heh1));
                    }

                    self.gvertices[g].local_edges[o].halfedge = Some(heh0);
                    self.gvertices[og].local_edges[oo].halfedge = Some(heh1);

                    // link the opposite halfedge into the boundary rings of
                    // its endpoints where neighbors already exist
                    if let Some(next_heh) = self.opposite_next_halfedge(g, o) {
                        qmesh.set_next_halfedge_handle(heh1, next_heh);
                    }
                    if let Some(prev_heh) = self.opposite_prev_halfedge(og, oo) {
                        qmesh.set_next_halfedge_handle(prev_heh, heh1);
                    }

                    heh0
                }
            };

            if idx == 0 {
                qmesh.set_face_halfedge_handle(new_fh, heh0);
            }
            qmesh.set_face_handle(heh0, Some(new_fh));
        }

        // close the inner ring
        let ring: Vec<HalfedgeHandle> = leis
            .iter()
            .map(|&(g, o)| {
                self.gvertices[g].local_edges[o]
                    .halfedge
                    .expect("face halfedge missing after creation")
            })
            .collect();
        for w in 0..ring.len() {
            let next = ring[(w + 1) % ring.len()];
            qmesh.set_next_halfedge_handle(ring[w], next);
            qmesh.set_face_handle(next, Some(new_fh));
        }

        for &(g, o) in leis {
            if let Some((og, _)) = self.gvertices[g].local_edges[o].connection.connected() {
                qmesh.adjust_outgoing_halfedge(VertexHandle::from_usize(og));
            }
        }

        Some(new_fh)
    }

    /// Per-corner integer UVs of a face cycle, in the chart the cycle
    /// starts in: each stub's endpoint pulled back through the transition
    /// accumulated around the face so far
    fn face_corner_uvs(&self, outgoing: &[(usize, usize)]) -> Vec<IVec2> {
        let mut corner_uvs = Vec::with_capacity(outgoing.len());
        let mut accumulated_face_tf = TransitionFunction::IDENTITY;
        let mut last: Option<(usize, usize)> = None;

        for &(g, o) in outgoing {
            // transition over the pivot shared by the previous stub's
            // destination and this stub's origin chart
            let mut intra_vertex_tf = TransitionFunction::IDENTITY;
            if let Some((lg, lo)) = last {
                if let Some((pg, po)) = self.gvertices[lg].local_edges[lo].connection.connected() {
                    debug_assert_eq!(pg, g);
                    let last_opp_fh = self.gvertices[pg].local_edges[po].fh_from;
                    let cur_fh = self.gvertices[g].local_edges[o].fh_from;
                    let opp_is_cur = (pg, po) == (g, o);
                    intra_vertex_tf = self
                        .intra_gv_transition(last_opp_fh, cur_fh, &self.gvertices[pg], !opp_is_cur)
                        .compose(
                            self.intra_gv_transition(
                                last_opp_fh,
                                self.anchor_face(pg),
                                &self.gvertices[pg],
                                true,
                            )
                            .inverse(),
                        );
                }
            }
            accumulated_face_tf = intra_vertex_tf.compose(accumulated_face_tf);

            let uv = accumulated_face_tf
                .inverse()
                .transform_point(self.gvertices[g].local_edges[o].uv_to);
            corner_uvs.push(IVec2::new(uv.x.round() as i32, uv.y.round() as i32));

            accumulated_face_tf = self.gvertices[g].local_edges[o]
                .accumulated_tf
                .compose(accumulated_face_tf);
            last = Some((g, o));
        }

        corner_uvs
    }

    /// Twice the signed area of the corner polygon; positive means
    /// counterclockwise
    fn uv_signed_area(corner_uvs: &[IVec2]) -> i64 {
        let mut doubled = 0i64;
        for (k, a) in corner_uvs.iter().enumerate() {
            let b = corner_uvs[(k + 1) % corner_uvs.len()];
            doubled += i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y);
        }
        doubled
    }

    /// Write the corner UVs onto the face's halfedges, aligned so that the
    /// halfedge leaving the cycle's first vertex gets the first corner
    fn assign_halfedge_uvs(
        &self,
        qmesh: &PolyMesh,
        fh: FaceHandle,
        face_vhs: &[VertexHandle],
        corner_uvs: &[IVec2],
        halfedge_uvs: &mut Vec<IVec2>,
    ) {
        let ring: Vec<HalfedgeHandle> = qmesh.face_halfedges(fh).collect();
        let Some(start) = ring
            .iter()
            .position(|&heh| qmesh.from_vertex_handle(heh) == face_vhs[0])
        else {
            error!("expected vertex not found in output face {fh}");
            return;
        };
        if ring.len() != corner_uvs.len() {
            error!("output face {fh} has {} halfedges for {} corners", ring.len(), corner_uvs.len());
            return;
        }

        halfedge_uvs.resize(qmesh.n_halfedges(), IVec2::ZERO);
        for (step, &uv) in corner_uvs.iter().enumerate() {
            let heh = ring[(start + step) % ring.len()];
            halfedge_uvs[heh.idx_usize()] = uv;
        }
    }

    /// Count boundary loops and flag isolated vertices deleted. A loop
    /// touching a tagged (parametric boundary) vertex is a desired hole;
    /// any other is the footprint of a skipped face.
    fn census_and_cleanup(qmesh: &mut PolyMesh) -> (usize, usize) {
        let mut desired_holes = 0usize;
        let mut undesired_holes = 0usize;
        let mut isolated_removed = 0usize;
        let mut visited: HashSet<u32> = HashSet::new();

        for idx in 0..qmesh.n_vertices() {
            let vh = VertexHandle::from_usize(idx);
            if qmesh.vertex_status(vh).is_deleted() {
                continue;
            }

            if qmesh.is_boundary_vertex(vh) && !visited.contains(&vh.idx()) {
                if let Some(heh_start) = qmesh.halfedge_handle(vh) {
                    if qmesh.is_boundary(heh_start) {
                        let mut heh = heh_start;
                        let mut loop_vertices: Vec<VertexHandle> = Vec::new();
                        let mut found_tagged = false;

                        // the boundary loop is closed; the cap only guards
                        // against broken linkage
                        for _ in 0..MAX_BOUNDARY_LENGTH {
                            let cur_vh = qmesh.to_vertex_handle(heh);
                            visited.insert(cur_vh.idx());
                            loop_vertices.push(cur_vh);
                            if qmesh.vertex_status(cur_vh).is_tagged() {
                                found_tagged = true;
                            }
                            heh = qmesh.next_halfedge_handle(heh);
                            if heh == heh_start {
                                break;
                            }
                        }

                        if found_tagged {
                            desired_holes += 1;
                            for v in loop_vertices {
                                qmesh.vertex_status_mut(v).set_tagged(true);
                            }
                        } else {
                            undesired_holes += 1;
                        }
                    }
                }
            }

            if qmesh.valence(vh) == 0 {
                qmesh.delete_vertex(vh);
                isolated_removed += 1;
            }
        }

        debug!(
            "boundary census: {desired_holes} desired holes, {undesired_holes} undesired holes, \
             {isolated_removed} isolated vertices removed"
        );
        (desired_holes, undesired_holes)
    }
}
