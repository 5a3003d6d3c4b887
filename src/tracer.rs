//! # Path tracing and stub connection
//!
//! For every unconnected stub, walks across triangles in the direction of
//! the stub's axis, transporting the ray through the per-edge transitions,
//! until it lands on a matching stub of another grid vertex. Successful
//! traces install reciprocal connections; boundary and degeneracy hits are
//! recorded as signals on the stub.

use crate::exact::{is_collinear, orient2d, Boundedness, Orientation, Segment2, Triangle2};
use crate::extractor::{uv_at, MeshExtractor};
use crate::grid::{
    orientation_to_idx, orientation_to_idx_inverse, Connection, GridVertexKind, LocalEdgeInfo,
};
use crate::handles::{FaceHandle, HalfedgeHandle};
use crate::transition::TransitionFunction;
use glam::DVec2;
use log::{error, warn};

/// Maximum triangles a single trace may cross
const MAX_WALK_ITERATIONS: usize = 100_000;

/// Maximum steps of a face-cycle walk during grid-vertex repair
const MAX_REPAIR_ITERATIONS: usize = 10_000;

/// Outcome of tracing one stub
pub(crate) enum PathResult {
    /// Landed on stub `orient` of grid vertex `gv`; `uv_to` is the endpoint
    /// expressed in the origin chart and `tf` maps origin chart to
    /// destination chart
    Connected {
        gv: usize,
        orient: usize,
        uv_to: DVec2,
        tf: TransitionFunction,
    },
    /// Trace failed or hit a boundary/degeneracy
    Signal(Connection),
}

impl PathResult {
    #[inline]
    fn error() -> Self {
        PathResult::Signal(Connection::NoConnection)
    }
}

impl MeshExtractor {
    /// Trace every unconnected stub and install reciprocal connections
    pub(crate) fn generate_connections(&mut self, uv: &[f64]) {
        for i in 0..self.gvertices.len() {
            for j in 0..self.gvertices[i].local_edges.len() {
                let lei = &self.gvertices[i].local_edges[j];
                if !lei.connection.is_unconnected() || !lei.fh_from.is_valid() {
                    continue;
                }

                match self.find_path(i, j, uv) {
                    PathResult::Signal(signal) => {
                        self.gvertices[i].local_edges[j].connection = signal;
                        if signal == Connection::TracedIntoBoundary {
                            self.gvertices[i].is_boundary = true;
                        }
                    }
                    PathResult::Connected {
                        gv: target,
                        orient,
                        uv_to,
                        tf,
                    } => {
                        debug_assert!(target < self.gvertices.len());
                        debug_assert!(orient < self.gvertices[target].local_edges.len());

                        self.gvertices[i].local_edges[j].complete(target, orient, uv_to, tf);

                        if self.gvertices[target].local_edges[orient]
                            .connection
                            .is_unconnected_or_signal()
                        {
                            // reverse transition: origin gv chart -> stub
                            // chart -> peer stub chart
                            let reverse_tf = self
                                .intra_gv_transition(
                                    self.gvertices[target].local_edges[orient].fh_from,
                                    self.anchor_face(target),
                                    &self.gvertices[target],
                                    true,
                                )
                                .inverse()
                                .compose(tf)
                                .compose(
                                    self.intra_gv_transition(
                                        self.gvertices[i].local_edges[j].fh_from,
                                        self.anchor_face(i),
                                        &self.gvertices[i],
                                        true,
                                    )
                                    .inverse(),
                                );

                            let opposite_to = reverse_tf.transform_point(self.gvertices[i].position_uv);
                            let reverse_tf = reverse_tf.inverse();
                            self.gvertices[target].local_edges[orient].complete(
                                i,
                                j,
                                opposite_to,
                                reverse_tf,
                            );
                        } else {
                            warn!(
                                "tracing from grid vertex {i} stub {j} hit grid vertex {target} \
                                 stub {orient}, which is already connected"
                            );
                            self.gvertices[i].local_edges[j].connection = Connection::NoConnection;
                        }
                    }
                }
            }
        }
    }

    /// Chart of a grid vertex's host halfedge
    #[inline]
    pub(crate) fn anchor_face(&self, gv_idx: usize) -> FaceHandle {
        self.tri_mesh
            .face_handle(self.gvertices[gv_idx].heh)
            .unwrap_or_else(FaceHandle::invalid)
    }

    /// Walk from a stub along its axis until a matching stub is found
    fn find_path(&self, gv_idx: usize, lei_idx: usize, uv: &[f64]) -> PathResult {
        let gv_kind = self.gvertices[gv_idx].kind;
        let gv_heh = self.gvertices[gv_idx].heh;
        let lei = &self.gvertices[gv_idx].local_edges[lei_idx];

        let cur_fh = lei.fh_from;
        let mut uv_from = lei.uv_from;
        let mut uv_to = lei.uv_intended_to;

        let Some((tri, [heh0, heh1, heh2])) = self.face_uv_triangle(cur_fh, uv) else {
            return PathResult::error();
        };

        let mut inverted = tri.orientation() == Orientation::Negative;
        let mut accumulated_tf = TransitionFunction::IDENTITY;

        // start and endpoint in the same face?
        let bs = tri.bounded_side(uv_to);
        if bs != Boundedness::Outside {
            return self.find_local_connection(
                uv_from,
                uv_to,
                &tri,
                [heh0, heh1, heh2],
                bs,
                accumulated_tf,
                uv,
            );
        }

        // determine the exit halfedge of the first step
        let path = Segment2::new(uv_from, uv_to);
        let mut cur_heh = match gv_kind {
            GridVertexKind::OnFace => {
                if path.intersects(&Segment2::new(tri.c, tri.a)) {
                    heh0
                } else if path.intersects(&Segment2::new(tri.a, tri.b)) {
                    heh1
                } else if path.intersects(&Segment2::new(tri.b, tri.c)) {
                    heh2
                } else {
                    warn!("stub ray from a face grid vertex exits no triangle side");
                    return PathResult::error();
                }
            }
            GridVertexKind::OnEdge => {
                let mut heh = gv_heh;
                if self.tri_mesh.is_boundary(heh) || self.tri_mesh.face_handle(heh) != Some(cur_fh)
                {
                    heh = self.tri_mesh.opposite_halfedge_handle(heh);
                }
                debug_assert_eq!(self.tri_mesh.face_handle(heh), Some(cur_fh));

                let prev_heh = self.tri_mesh.prev_halfedge_handle(heh);
                let next_heh = self.tri_mesh.next_halfedge_handle(heh);
                let uv1 = uv_at(uv, heh);
                let uv2 = uv_at(uv, next_heh);

                if path.intersects(&Segment2::new(uv1, uv2)) {
                    next_heh
                } else {
                    // the other side must intersect
                    prev_heh
                }
            }
            GridVertexKind::OnVertex => {
                // leave through the side opposite the pivot
                let vh = self.tri_mesh.to_vertex_handle(gv_heh);
                if self.tri_mesh.to_vertex_handle(heh0) == vh {
                    heh2
                } else if self.tri_mesh.to_vertex_handle(heh1) == vh {
                    heh0
                } else if self.tri_mesh.to_vertex_handle(heh2) == vh {
                    heh1
                } else {
                    error!(
                        "triangle {} does not contain the pivot vertex {} of its grid vertex",
                        cur_fh, vh
                    );
                    return PathResult::error();
                }
            }
        };

        if !cur_heh.is_valid() {
            warn!("invalid halfedge after trace initialization");
            return PathResult::error();
        }

        // step into the next face
        if !self.edge_valid[self.tri_mesh.edge_handle(cur_heh).idx_usize()] {
            return PathResult::Signal(Connection::TracedIntoDegeneracy);
        }
        let tf = self.transition(cur_heh);
        uv_from = tf.transform_point(uv_from);
        uv_to = tf.transform_point(uv_to);
        accumulated_tf = tf.compose(accumulated_tf);
        cur_heh = self.tri_mesh.opposite_halfedge_handle(cur_heh);

        for walk_iterations in 0..MAX_WALK_ITERATIONS {
            if self.tri_mesh.is_boundary(cur_heh) {
                return PathResult::Signal(Connection::TracedIntoBoundary);
            }

            let heh0 = cur_heh;
            let heh1 = self.tri_mesh.next_halfedge_handle(heh0);
            let heh2 = self.tri_mesh.next_halfedge_handle(heh1);

            let uv0 = uv_at(uv, heh0);
            let uv1 = uv_at(uv, heh1);
            let uv2 = uv_at(uv, heh2);

            let tri = Triangle2::new(uv0, uv1, uv2);
            let tri_ori = tri.orientation();

            if tri_ori == Orientation::Zero {
                if uv0 != uv1 && uv1 != uv2 && uv2 != uv0 {
                    // a cap; the decimator cannot remove it, keep walking
                    error!("traced into a degenerate cap triangle");
                } else {
                    error!("edge degenerated to a point survived preprocessing");
                    return PathResult::Signal(Connection::TracedIntoDegeneracy);
                }
            }

            // when the chart orientation flips, "towards the target" flips
            // with it
            let currently_inverted = tri_ori == Orientation::Negative;
            if currently_inverted != inverted {
                inverted = currently_inverted;
                std::mem::swap(&mut uv_from, &mut uv_to);
            }

            // found the endpoint?
            let bs = tri.bounded_side(uv_to);
            if bs != Boundedness::Outside {
                return self.find_local_connection(
                    uv_from,
                    uv_to,
                    &tri,
                    [heh0, heh1, heh2],
                    bs,
                    accumulated_tf,
                    uv,
                );
            }

            // move forward: the ray entered through heh0, so it leaves
            // through heh1 or heh2
            let path = Segment2::new(uv_from, uv_to);
            let s1 = Segment2::new(uv0, uv1);
            let s2 = Segment2::new(uv2, uv1);

            let is1 = path.intersects(&s1);
            let is2 = path.intersects(&s2);

            let heh_upd = if is1 && !is2 {
                heh1
            } else if !is1 && is2 {
                heh2
            } else if is1 && is2 {
                let vis0 = path.has_on(uv0);
                let vis1 = path.has_on(uv1);
                let vis2 = path.has_on(uv2);

                if !vis0 && !vis1 && vis2 {
                    heh1
                } else if vis0 && vis2 {
                    // entered along heh0's edge; decide by which side of
                    // the path uv1 lies on
                    if orient2d(path.a, path.b, uv1) == tri_ori {
                        heh1
                    } else {
                        heh2
                    }
                } else {
                    heh2
                }
            } else {
                warn!(
                    "trace lost in triangle strip at step {walk_iterations}: ray ({}, {}) -> \
                     ({}, {}) exits no side of its triangle",
                    uv_from.x, uv_from.y, uv_to.x, uv_to.y
                );
                return PathResult::error();
            };

            if !self.edge_valid[self.tri_mesh.edge_handle(heh_upd).idx_usize()] {
                return PathResult::Signal(Connection::TracedIntoDegeneracy);
            }

            let tf = self.transition(heh_upd);
            uv_from = tf.transform_point(uv_from);
            uv_to = tf.transform_point(uv_to);
            accumulated_tf = tf.compose(accumulated_tf);
            cur_heh = self.tri_mesh.opposite_halfedge_handle(heh_upd);
        }

        warn!(
            "maximum number of iterations exceeded while tracing from grid vertex {gv_idx} \
             stub {lei_idx}"
        );
        PathResult::error()
    }

    /// The target lies inside or on the boundary of the current triangle;
    /// find the stub it belongs to
    #[allow(clippy::too_many_arguments)]
    fn find_local_connection(
        &self,
        uv_from: DVec2,
        uv_to: DVec2,
        tri: &Triangle2,
        hehs: [HalfedgeHandle; 3],
        bs: Boundedness,
        accumulated_tf: TransitionFunction,
        uv: &[f64],
    ) -> PathResult {
        if tri.is_degenerate() {
            return PathResult::Signal(Connection::TracedIntoDegeneracy);
        }

        debug_assert!(bs != Boundedness::Outside);
        let [heh0, heh1, heh2] = hehs;

        if bs == Boundedness::Inside {
            let Some(fh) = self.tri_mesh.face_handle(heh0) else {
                return PathResult::error();
            };
            let face_ori = self.triangle_uv_orientation(fh, uv);

            // the peer stub points back towards us
            let dir = uv_from - uv_to;
            let ori_idx = if face_ori == Orientation::Negative {
                orientation_to_idx_inverse(dir)
            } else {
                orientation_to_idx(dir)
            };

            for &gvidx in &self.face_gvertices[fh.idx_usize()] {
                debug_assert!(self.gvertices[gvidx].local_edges.len() > ori_idx);
                let candidate = &self.gvertices[gvidx].local_edges[ori_idx];
                if candidate.uv_intended_to == uv_from && candidate.uv_from == uv_to {
                    let to = accumulated_tf.inverse().transform_point(uv_to);
                    return PathResult::Connected {
                        gv: gvidx,
                        orient: ori_idx,
                        uv_to: to,
                        tf: accumulated_tf,
                    };
                }
            }
        } else if uv_to == tri.a {
            return self.find_local_connection_at_vertex(
                uv_from,
                uv_to,
                heh0,
                &Triangle2::new(tri.a, tri.b, tri.c),
                accumulated_tf,
            );
        } else if uv_to == tri.b {
            return self.find_local_connection_at_vertex(
                uv_from,
                uv_to,
                heh1,
                &Triangle2::new(tri.b, tri.c, tri.a),
                accumulated_tf,
            );
        } else if uv_to == tri.c {
            return self.find_local_connection_at_vertex(
                uv_from,
                uv_to,
                heh2,
                &Triangle2::new(tri.c, tri.a, tri.b),
                accumulated_tf,
            );
        } else if Segment2::new(tri.c, tri.a).has_on(uv_to) {
            return self.find_local_connection_at_edge(uv_from, uv_to, heh0, accumulated_tf);
        } else if Segment2::new(tri.a, tri.b).has_on(uv_to) {
            return self.find_local_connection_at_edge(uv_from, uv_to, heh1, accumulated_tf);
        } else if Segment2::new(tri.b, tri.c).has_on(uv_to) {
            return self.find_local_connection_at_edge(uv_from, uv_to, heh2, accumulated_tf);
        }

        warn!("local connection did not succeed");
        PathResult::error()
    }

    /// The target lies on the interior of a triangle edge; scan that
    /// mesh edge's grid vertices, trying both face sides
    fn find_local_connection_at_edge(
        &self,
        uv_from: DVec2,
        uv_to: DVec2,
        heh: HalfedgeHandle,
        accumulated_tf: TransitionFunction,
    ) -> PathResult {
        let eh = self.tri_mesh.edge_handle(heh);
        let fh = self.tri_mesh.face_handle(heh);

        let heh_opp = self.tri_mesh.opposite_halfedge_handle(heh);
        let fh_opp = if self.tri_mesh.is_boundary(heh_opp) {
            None
        } else {
            self.tri_mesh.face_handle(heh_opp)
        };

        let cross_edge_tf = self.transition(heh);
        let uv_from_opp = cross_edge_tf.transform_point(uv_from);
        let uv_to_opp = cross_edge_tf.transform_point(uv_to);

        for &vidx in &self.edge_gvertices[eh.idx_usize()] {
            for j in 0..self.gvertices[vidx].local_edges.len() {
                let lei = &self.gvertices[vidx].local_edges[j];

                let on_this_side = Some(lei.fh_from) == fh
                    && lei.uv_from == uv_to
                    && lei.uv_intended_to == uv_from;
                let on_opp_side = fh_opp.is_some()
                    && Some(lei.fh_from) == fh_opp
                    && lei.uv_from == uv_to_opp
                    && lei.uv_intended_to == uv_from_opp;

                if on_this_side || on_opp_side {
                    // express the endpoint in the chart of the peer's
                    // canonical face
                    let (to, tf) =
                        if self.tri_mesh.face_handle(self.gvertices[vidx].heh) == fh {
                            (uv_to, accumulated_tf)
                        } else {
                            debug_assert_eq!(
                                self.tri_mesh.face_handle(self.gvertices[vidx].heh),
                                fh_opp
                            );
                            (uv_to_opp, cross_edge_tf.compose(accumulated_tf))
                        };
                    let to = tf.inverse().transform_point(to);
                    return PathResult::Connected {
                        gv: vidx,
                        orient: j,
                        uv_to: to,
                        tf,
                    };
                }
            }
        }

        PathResult::error()
    }

    /// The target coincides with a triangle corner; gather the candidate
    /// faces (following collinear rays into the neighboring fans) and scan
    /// the mesh vertex's grid vertices
    fn find_local_connection_at_vertex(
        &self,
        uv_from: DVec2,
        uv_to: DVec2,
        heh: HalfedgeHandle,
        tri: &Triangle2,
        accumulated_tf: TransitionFunction,
    ) -> PathResult {
        // heh points to the pivot; tri is in local order with
        // tri.a == uv(to_vertex(heh))
        let vh = self.tri_mesh.to_vertex_handle(heh);

        struct Candidate {
            fh: FaceHandle,
            uv_from: DVec2,
            uv_to: DVec2,
            tf: TransitionFunction,
        }
        let mut candidates: Vec<Candidate> = Vec::with_capacity(3);

        if let Some(fh) = self.tri_mesh.face_handle(heh) {
            candidates.push(Candidate {
                fh,
                uv_from,
                uv_to,
                tf: TransitionFunction::IDENTITY,
            });
        }

        // ray collinear with the left edge: the CCW neighbor also hosts it
        if is_collinear(uv_from, uv_to, tri.c) {
            let opp_heh = self.tri_mesh.opposite_halfedge_handle(heh);
            if !self.tri_mesh.is_boundary(opp_heh) {
                if let Some(fh) = self.tri_mesh.face_handle(opp_heh) {
                    let tf = self.transition(heh);
                    candidates.push(Candidate {
                        fh,
                        uv_from: tf.transform_point(uv_from),
                        uv_to: tf.transform_point(uv_to),
                        tf,
                    });
                }
            }
        }

        // ray collinear with the right edge: the CW neighbor also hosts it
        if is_collinear(uv_from, uv_to, tri.b) {
            let nheh = self.tri_mesh.next_halfedge_handle(heh);
            let opp_nheh = self.tri_mesh.opposite_halfedge_handle(nheh);
            if !self.tri_mesh.is_boundary(opp_nheh) {
                if let Some(fh) = self.tri_mesh.face_handle(opp_nheh) {
                    let tf = self.transition(nheh);
                    candidates.push(Candidate {
                        fh,
                        uv_from: tf.transform_point(uv_from),
                        uv_to: tf.transform_point(uv_to),
                        tf,
                    });
                }
            }
        }

        for &vidx in &self.vertex_gvertices[vh.idx_usize()] {
            for j in 0..self.gvertices[vidx].local_edges.len() {
                for cand in &candidates {
                    let lei = &self.gvertices[vidx].local_edges[j];
                    if lei.fh_from == cand.fh
                        && lei.uv_intended_to == cand.uv_from
                        && lei.uv_from == cand.uv_to
                    {
                        let intra = self.intra_gv_transition(
                            cand.fh,
                            self.anchor_face(vidx),
                            &self.gvertices[vidx],
                            true,
                        );
                        let tf = intra.compose(cand.tf).compose(accumulated_tf);
                        let to = intra.transform_point(cand.uv_to);
                        let to = tf.inverse().transform_point(to);
                        return PathResult::Connected {
                            gv: vidx,
                            orient: j,
                            uv_to: to,
                            tf,
                        };
                    }
                }
            }
        }

        PathResult::error()
    }

    /// True when no stub of `gv1` connects to `gv2`
    fn not_connected(&self, gv1: usize, gv2: usize) -> bool {
        !self.gvertices[gv1]
            .local_edges
            .iter()
            .any(|lei| matches!(lei.connection, Connection::Connected { gv, .. } if gv == gv2))
    }

    /// Bump the back-references of every connected stub of `gv_idx` at
    /// position `from_pos` or later; called right before an insertion at
    /// `from_pos` shifts them
    fn increment_peer_orientation(&mut self, gv_idx: usize, from_pos: usize) {
        for k in from_pos..self.gvertices[gv_idx].local_edges.len() {
            if let Connection::Connected { gv: peer, orient } =
                self.gvertices[gv_idx].local_edges[k].connection
            {
                if let Connection::Connected { gv: pg, orient: po } =
                    self.gvertices[peer].local_edges[orient].connection
                {
                    self.gvertices[peer].local_edges[orient].connection = Connection::Connected {
                        gv: pg,
                        orient: po + 1,
                    };
                }
            }
        }
    }

    /// After the main tracing pass, walk the face cycles around each grid
    /// vertex that expects more stubs than it realized; whenever the
    /// accumulated frame returns to the pivot's UV at a distinct,
    /// not-yet-connected grid vertex, insert a reciprocal stub pair at the
    /// correct angular position on both sides.
    pub(crate) fn try_connect_incomplete_gvertices(&mut self) {
        for start_idx in 0..self.gvertices.len() {
            if self.gvertices[start_idx].missing_leis == 0 {
                continue;
            }

            // the stub list grows during the loop; re-read the length
            let mut j = 0usize;
            while j < self.gvertices[start_idx].local_edges.len() {
                // cyclic successor of the start stub, snapshot before any
                // insertion
                let insert_before = j + 1;
                let final_idx = self.gvertices[start_idx].cyclic_index(j as isize + 1);
                let final_fh = self.gvertices[start_idx].local_edges[final_idx].fh_from;
                let final_is_start = final_idx == j;

                let mut cur_gv = start_idx;
                let mut cur_lei = j;
                let mut accumulated_tf = TransitionFunction::IDENTITY;
                let pivot_uv = self.gvertices[start_idx].local_edges[j].uv_from;
                let mut edge_created = false;

                for _ in 0..MAX_REPAIR_ITERATIONS {
                    let out_connection = self.gvertices[cur_gv].local_edges[cur_lei].connection;
                    let out_tf = self.gvertices[cur_gv].local_edges[cur_lei].accumulated_tf;
                    let Some((next_gv, in_idx)) = out_connection.connected() else {
                        break;
                    };
                    let out_idx = self.gvertices[next_gv].cyclic_index(in_idx as isize - 1);

                    // edge portion; the intra-face portion follows after a
                    // possible insertion
                    accumulated_tf = out_tf.compose(accumulated_tf);

                    let in_fh = self.gvertices[next_gv].local_edges[in_idx].fh_from;
                    let out_fh = self.gvertices[next_gv].local_edges[out_idx].fh_from;
                    let intra_face_tf = self
                        .intra_gv_transition(
                            in_fh,
                            out_fh,
                            &self.gvertices[next_gv],
                            in_idx != out_idx,
                        )
                        .compose(
                            self.intra_gv_transition(
                                in_fh,
                                self.anchor_face(next_gv),
                                &self.gvertices[next_gv],
                                true,
                            )
                            .inverse(),
                        );

                    // next grid vertex's UV in the pivot's coordinate system
                    let next_uv = intra_face_tf
                        .compose(accumulated_tf)
                        .inverse()
                        .transform_point(self.gvertices[next_gv].local_edges[out_idx].uv_from);

                    if !edge_created
                        && next_uv == pivot_uv
                        && next_gv != start_idx
                        && self.not_connected(next_gv, start_idx)
                    {
                        let start_lei = self.gvertices[start_idx].local_edges[j].clone();
                        let next_in = self.gvertices[next_gv].local_edges[in_idx].clone();

                        let new_incoming_tf = self
                            .intra_gv_transition(
                                final_fh,
                                start_lei.fh_from,
                                &self.gvertices[start_idx],
                                true,
                            )
                            .compose(
                                self.intra_gv_transition(
                                    final_fh,
                                    start_lei.fh_from,
                                    &self.gvertices[start_idx],
                                    !final_is_start,
                                )
                                .inverse(),
                            )
                            .compose(accumulated_tf.inverse())
                            .inverse();

                        let new_outgoing_tf = self
                            .intra_gv_transition(
                                next_in.fh_from,
                                self.anchor_face(next_gv),
                                &self.gvertices[next_gv],
                                true,
                            )
                            .inverse()
                            .compose(accumulated_tf)
                            .compose(
                                self.intra_gv_transition(
                                    start_lei.fh_from,
                                    self.anchor_face(start_idx),
                                    &self.gvertices[start_idx],
                                    true,
                                )
                                .inverse(),
                            )
                            .inverse();

                        // the insertions shift every later stub; their
                        // peers' back-references move in lockstep first
                        self.increment_peer_orientation(start_idx, insert_before);
                        self.increment_peer_orientation(next_gv, in_idx);

                        self.gvertices[start_idx].local_edges.insert(
                            insert_before,
                            LocalEdgeInfo::new(start_lei.fh_from, start_lei.uv_from, start_lei.uv_from),
                        );
                        self.gvertices[next_gv].local_edges.insert(
                            in_idx,
                            LocalEdgeInfo::new(next_in.fh_from, next_in.uv_from, next_in.uv_from),
                        );

                        let new_in_pos = insert_before;
                        let new_out_pos = in_idx;
                        self.gvertices[start_idx].local_edges[new_in_pos].complete(
                            next_gv,
                            new_out_pos,
                            start_lei.uv_from,
                            new_incoming_tf,
                        );
                        self.gvertices[next_gv].local_edges[new_out_pos].complete(
                            start_idx,
                            new_in_pos,
                            next_in.uv_from,
                            new_outgoing_tf,
                        );

                        edge_created = true;

                        // the walk continues through the newly created stub
                        accumulated_tf = intra_face_tf.compose(accumulated_tf);
                        cur_gv = next_gv;
                        cur_lei = new_out_pos;
                    } else {
                        accumulated_tf = intra_face_tf.compose(accumulated_tf);
                        cur_gv = next_gv;
                        cur_lei = out_idx;
                    }

                    if cur_gv == start_idx {
                        break;
                    }
                }

                j += 1;
            }
        }
    }
}
