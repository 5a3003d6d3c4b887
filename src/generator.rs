//! # Grid-vertex generation
//!
//! Three passes over the truncated parameterization emit every integer
//! lattice point that lies strictly inside a face, on the interior of an
//! edge, or at a mesh vertex, each seeded with its local edge stubs in
//! counterclockwise order.

use crate::exact::{orient2d_vec, Orientation, Segment2, Triangle2};
use crate::extractor::{ninety_jump, uv_at, Embedding, MeshExtractor};
use crate::grid::{GridVertex, GridVertexKind, LocalEdgeInfo, CARTESIAN_ORIENTATIONS};
use crate::handles::HalfedgeHandle;
use glam::DVec2;
use log::{debug, warn};
use std::f64::consts::PI;

impl MeshExtractor {
    /// Enumerate all grid vertices with their stubs
    pub(crate) fn generate_vertices(
        &mut self,
        uv: &[f64],
        external_valences: Option<&[u32]>,
        embedding: &Embedding<'_>,
    ) {
        // canonical halfedge per vertex and edge
        self.vertex_to_halfedge =
            vec![HalfedgeHandle::invalid(); self.tri_mesh.n_vertices()];
        self.edge_to_halfedge = vec![HalfedgeHandle::invalid(); self.tri_mesh.n_edges()];

        for vh in self.tri_mesh.vertices() {
            if let Some(heh) = self.tri_mesh.incoming_halfedges_cw(vh).next() {
                self.vertex_to_halfedge[vh.idx_usize()] = heh;
            }
        }
        for eh in self.tri_mesh.edges() {
            let heh0 = self.tri_mesh.edge_halfedge_handle(eh, 0);
            let heh1 = self.tri_mesh.edge_halfedge_handle(eh, 1);
            self.edge_to_halfedge[eh.idx_usize()] = if !self.tri_mesh.is_boundary(heh0) {
                heh0
            } else {
                heh1
            };
        }

        self.gvertices.clear();
        self.gvertices.reserve(1024);

        self.generate_face_vertices(uv, embedding);
        self.generate_edge_vertices(uv, embedding);
        self.generate_vertex_vertices(uv, external_valences, embedding);

        debug!("generated {} grid vertices", self.gvertices.len());
    }

    /// Lattice points strictly inside the UV triangle of each face
    fn generate_face_vertices(&mut self, uv: &[f64], embedding: &Embedding<'_>) {
        self.face_gvertices.clear();
        self.face_gvertices
            .resize(self.tri_mesh.n_faces(), Vec::new());

        for fh in self.tri_mesh.faces() {
            let Some((tri, [heh0, heh1, heh2])) = self.face_uv_triangle(fh, uv) else {
                continue;
            };
            if tri.orientation() == Orientation::Zero {
                continue;
            }

            let m = Self::mapping_from_triangle(
                &tri,
                self.embed(embedding, heh0),
                self.embed(embedding, heh1),
                self.embed(embedding, heh2),
            );

            let bb = tri.bbox();
            let x_min = bb.min.x.ceil() as i64;
            let x_max = bb.max.x.floor() as i64;
            let y_min = bb.min.y.ceil() as i64;
            let y_max = bb.max.y.floor() as i64;

            for x in x_min..=x_max {
                for y in y_min..=y_max {
                    let p = DVec2::new(x as f64, y as f64);
                    if !tri.has_on_bounded_side(p) {
                        continue;
                    }
                    let p3d = Self::apply_mapping(&m, p.x, p.y);

                    let mut gv = GridVertex::new(GridVertexKind::OnFace, heh0, p, p3d, false);
                    self.seed_face_stubs(&mut gv, uv);
                    self.face_gvertices[fh.idx_usize()].push(self.gvertices.len());
                    self.gvertices.push(gv);
                }
            }
        }
    }

    /// Lattice points on the interior of each edge's UV segment
    fn generate_edge_vertices(&mut self, uv: &[f64], embedding: &Embedding<'_>) {
        self.edge_valid = vec![false; self.tri_mesh.n_edges()];
        self.edge_gvertices.clear();
        self.edge_gvertices
            .resize(self.tri_mesh.n_edges(), Vec::new());

        let edges: Vec<_> = self.tri_mesh.edges().collect();
        for eh in edges {
            let heh0 = self.edge_to_halfedge[eh.idx_usize()];
            if !heh0.is_valid() {
                warn!("edge {} does not have a valid halfedge", eh);
                continue;
            }
            let heh1 = self.tri_mesh.prev_halfedge_handle(heh0);

            let p0 = uv_at(uv, heh0);
            let p1 = uv_at(uv, heh1);
            let seg = Segment2::new(p0, p1);

            if seg.is_degenerate() {
                continue;
            }
            self.edge_valid[eh.idx_usize()] = true;

            let m = Self::mapping_from_segment(
                &seg,
                self.embed(embedding, heh0),
                self.embed(embedding, heh1),
            );

            let bb = seg.bbox();
            let mut x_min = bb.min.x.ceil() as i64;
            let mut x_max = bb.max.x.floor() as i64;
            let mut y_min = bb.min.y.ceil() as i64;
            let mut y_max = bb.max.y.floor() as i64;

            // iterate the axis the segment spans more of, skipping its
            // endpoint lattice coordinates
            if bb.max.x - bb.min.x >= bb.max.y - bb.min.y {
                if x_min as f64 == bb.min.x {
                    x_min += 1;
                }
                if x_max as f64 == bb.max.x {
                    x_max -= 1;
                }

                for x in x_min..=x_max {
                    let alpha = (x as f64 - p0.x) / (p1.x - p0.x);
                    let y = (p0.y + alpha * (p1.y - p0.y)).round() as i64;
                    if y < y_min || y > y_max {
                        continue;
                    }
                    self.try_emit_edge_vertex(eh, heh0, &seg, &m, x, y, uv);
                }
            } else {
                if y_min as f64 == bb.min.y {
                    y_min += 1;
                }
                if y_max as f64 == bb.max.y {
                    y_max -= 1;
                }

                for y in y_min..=y_max {
                    let alpha = (y as f64 - p0.y) / (p1.y - p0.y);
                    let x = (p0.x + alpha * (p1.x - p0.x)).round() as i64;
                    if x < x_min || x > x_max {
                        continue;
                    }
                    self.try_emit_edge_vertex(eh, heh0, &seg, &m, x, y, uv);
                }
            }
        }
    }

    fn try_emit_edge_vertex(
        &mut self,
        eh: crate::handles::EdgeHandle,
        heh0: HalfedgeHandle,
        seg: &Segment2,
        m: &glam::DMat3,
        x: i64,
        y: i64,
        uv: &[f64],
    ) {
        let p = DVec2::new(x as f64, y as f64);
        if !seg.has_on(p) {
            return;
        }
        let p3d = Self::apply_mapping(m, p.x, p.y);

        let mut gv = GridVertex::new(GridVertexKind::OnEdge, heh0, p, p3d, false);
        self.seed_edge_stubs(&mut gv, uv);
        self.edge_gvertices[eh.idx_usize()].push(self.gvertices.len());
        self.gvertices.push(gv);
    }

    /// Mesh vertices whose canonical UV is integral in both coordinates
    fn generate_vertex_vertices(
        &mut self,
        uv: &[f64],
        external_valences: Option<&[u32]>,
        embedding: &Embedding<'_>,
    ) {
        self.vertex_gvertices.clear();
        self.vertex_gvertices
            .resize(self.tri_mesh.n_vertices(), Vec::new());

        for vh in self.tri_mesh.vertices() {
            let heh = self.vertex_to_halfedge[vh.idx_usize()];
            if !heh.is_valid() {
                continue;
            }

            let p = uv_at(uv, heh);
            if p.x != p.x.round() || p.y != p.y.round() {
                continue;
            }

            let Some(out) = self.tri_mesh.halfedge_handle(vh) else {
                continue;
            };
            let p3d = self.embed(embedding, self.tri_mesh.opposite_halfedge_handle(out));

            let mut gv = GridVertex::new(GridVertexKind::OnVertex, heh, p, p3d, false);
            self.seed_vertex_stubs(&mut gv, uv, external_valences);
            self.vertex_gvertices[vh.idx_usize()].push(self.gvertices.len());
            self.gvertices.push(gv);
        }
    }

    // --- Stub seeding ---

    /// A face grid vertex gets all four cardinal stubs, reversed when the
    /// chart is negatively oriented so the cyclic order stays CCW
    fn seed_face_stubs(&self, gv: &mut GridVertex, uv: &[f64]) {
        gv.local_edges.clear();
        gv.local_edges.reserve(4);

        if !gv.heh.is_valid() || self.tri_mesh.is_boundary(gv.heh) {
            return;
        }
        let Some(fh) = self.tri_mesh.face_handle(gv.heh) else {
            return;
        };

        let uv_p = gv.position_uv;
        for dir in CARTESIAN_ORIENTATIONS {
            gv.local_edges
                .push(LocalEdgeInfo::new(fh, uv_p, uv_p + dir));
        }

        if self.triangle_uv_orientation(fh, uv) == Orientation::Negative {
            gv.local_edges.reverse();
        }
    }

    /// An edge grid vertex distributes the four cardinal directions over
    /// the two incident charts: directions along the edge belong to the
    /// face whose orientation matches, directions into a face to that face
    fn seed_edge_stubs(&self, gv: &mut GridVertex, uv: &[f64]) {
        gv.local_edges.clear();
        gv.local_edges.reserve(4);

        if !gv.heh.is_valid() || self.tri_mesh.is_boundary(gv.heh) {
            return;
        }
        let heh = gv.heh;
        let heh_opp = self.tri_mesh.opposite_halfedge_handle(heh);

        if self.tri_mesh.is_boundary_edge(self.tri_mesh.edge_handle(heh)) {
            gv.is_boundary = true;
        }

        let Some(fh) = self.tri_mesh.face_handle(heh) else {
            return;
        };
        let ori = self.triangle_uv_orientation(fh, uv);

        let (fh_opp, ori_opp) = if self.tri_mesh.is_boundary(heh_opp) {
            (None, Orientation::Zero)
        } else {
            let f = self.tri_mesh.face_handle(heh_opp);
            (f, f.map_or(Orientation::Zero, |f| self.triangle_uv_orientation(f, uv)))
        };

        let uv_p = gv.position_uv;
        let tf = self.transition(heh);
        let uv_opp = tf.transform_point(uv_p);

        // directions of face one
        {
            let heh_prev = self.tri_mesh.prev_halfedge_handle(heh);
            let p1 = uv_at(uv, heh);
            let p0 = uv_at(uv, heh_prev);

            let mut middle = 0usize;
            for dir in CARTESIAN_ORIENTATIONS {
                let to_uv = uv_p + dir;
                let path_ori = Triangle2::new(p0, p1, to_uv).orientation();

                if path_ori == ori {
                    gv.local_edges.push(LocalEdgeInfo::new(fh, uv_p, to_uv));
                } else if path_ori == Orientation::Zero {
                    if dir.dot(p1 - p0) > 0.0 || fh_opp.is_none() {
                        gv.local_edges.push(LocalEdgeInfo::new(fh, uv_p, to_uv));
                    } else {
                        middle = gv.local_edges.len();
                    }
                } else {
                    middle = gv.local_edges.len();
                }
            }

            // keep the accepted run contiguous
            if middle > 0 && middle < gv.local_edges.len() {
                gv.local_edges.rotate_left(middle);
            }
            if ori == Orientation::Negative {
                gv.local_edges.reverse();
            }
        }

        // directions of face two
        if let Some(fh_opp) = fh_opp {
            let heh_prev = self.tri_mesh.prev_halfedge_handle(heh_opp);
            let p1 = uv_at(uv, heh_opp);
            let p0 = uv_at(uv, heh_prev);

            let le_ofs = gv.local_edges.len();
            let mut middle = le_ofs;
            for dir in CARTESIAN_ORIENTATIONS {
                let to_uv = tf.transform_point(uv_p + dir);
                let trans_direction = to_uv - uv_opp;
                let path_ori = Triangle2::new(p0, p1, to_uv).orientation();

                if path_ori == ori_opp
                    || (path_ori == Orientation::Zero && trans_direction.dot(p1 - p0) > 0.0)
                {
                    gv.local_edges
                        .push(LocalEdgeInfo::new(fh_opp, uv_opp, to_uv));
                } else {
                    middle = gv.local_edges.len();
                }
            }

            if middle > le_ofs && middle < gv.local_edges.len() {
                gv.local_edges[le_ofs..].rotate_left(middle - le_ofs);
            }
            if ori_opp == Orientation::Negative {
                gv.local_edges[le_ofs..].reverse();
            }
        }
    }

    /// A mesh-vertex grid vertex tests every cardinal direction against
    /// each sector of the one-ring, accumulating the signed sector angles
    /// to estimate the expected valence
    fn seed_vertex_stubs(
        &self,
        gv: &mut GridVertex,
        uv: &[f64],
        external_valences: Option<&[u32]>,
    ) {
        gv.local_edges.clear();
        gv.local_edges.reserve(4);

        if !gv.heh.is_valid() || self.tri_mesh.is_boundary(gv.heh) {
            return;
        }
        let vh = self.tri_mesh.to_vertex_handle(gv.heh);

        if self.tri_mesh.is_boundary_vertex(vh) {
            gv.is_boundary = true;
        }

        let mut initial_neg_angle_sum = 0.0f64;
        let mut pos_angle_sum = 0.0f64;
        let mut neg_angle_sum = 0.0f64;

        // traverse incoming halfedges in CCW order
        for heh in self.tri_mesh.incoming_halfedges_ccw(vh) {
            if self.tri_mesh.is_boundary(heh) {
                continue;
            }

            let heh1 = self.tri_mesh.next_halfedge_handle(heh);
            let heh2 = self.tri_mesh.next_halfedge_handle(heh1);
            let uv0 = uv_at(uv, heh);
            let uv1 = uv_at(uv, heh1);
            let uv2 = uv_at(uv, heh2);

            let sector_left = uv2 - uv0;
            let sector_right = uv1 - uv0;
            let orientation = Triangle2::new(uv0, uv1, uv2).orientation();

            match orientation {
                Orientation::Positive => {
                    if neg_angle_sum > 0.0 {
                        // a negative fan ended; it contributes its
                        // complement to a full turn
                        pos_angle_sum += 2.0 * PI - neg_angle_sum;
                        neg_angle_sum = 0.0;
                    }
                    let angle = (sector_left.dot(sector_right)
                        / (sector_left.length() * sector_right.length()))
                    .acos();
                    pos_angle_sum += angle;
                }
                Orientation::Negative => {
                    let angle = (sector_left.dot(sector_right)
                        / (sector_left.length() * sector_right.length()))
                    .acos();
                    if pos_angle_sum == 0.0 {
                        initial_neg_angle_sum += angle;
                    } else {
                        neg_angle_sum += angle;
                    }
                }
                Orientation::Zero => {}
            }

            let is_left_opp_boundary = self
                .tri_mesh
                .is_boundary(self.tri_mesh.opposite_halfedge_handle(heh));
            let Some(fh) = self.tri_mesh.face_handle(heh) else {
                continue;
            };

            let mut leis_per_face: Vec<LocalEdgeInfo> = Vec::new();
            let mut middle = 0usize;
            for dir in CARTESIAN_ORIENTATIONS {
                let ori1 = orient2d_vec(sector_right, dir);
                let ori2 = orient2d_vec(dir, sector_left);

                if is_left_opp_boundary
                    && ori2 == Orientation::Zero
                    && dir.dot(uv2 - uv0) > 0.0
                {
                    // on the left edge and no face to the left
                    leis_per_face.push(LocalEdgeInfo::new(fh, uv0, uv0 + dir));
                } else if ori1 == Orientation::Zero && (uv1 - uv0).dot(dir) > 0.0 {
                    // on the right edge
                    leis_per_face.push(LocalEdgeInfo::new(fh, uv0, uv0 + dir));
                } else if ori1 == orientation && ori2 == orientation {
                    // strictly inside the sector
                    leis_per_face.push(LocalEdgeInfo::new(fh, uv0, uv0 + dir));
                } else {
                    middle = leis_per_face.len();
                }
            }

            if middle > 0 && middle < leis_per_face.len() {
                leis_per_face.rotate_left(middle);
            }
            if orientation == Orientation::Negative {
                leis_per_face.reverse();
            }
            gv.local_edges.extend(leis_per_face);
        }

        if initial_neg_angle_sum > 0.0 || neg_angle_sum > 0.0 {
            neg_angle_sum += initial_neg_angle_sum;
            pos_angle_sum += 2.0 * PI - neg_angle_sum;
        }

        let expected = match external_valences {
            Some(valences) => valences[vh.idx_usize()] as i32,
            None => ninety_jump(pos_angle_sum),
        };
        gv.missing_leis = expected - gv.local_edges.len() as i32;

        // the angle heuristic is unreliable on boundaries
        if gv.is_boundary {
            gv.missing_leis = 0;
        }
    }
}
