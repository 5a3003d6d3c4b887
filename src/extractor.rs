//! # MeshExtractor
//!
//! Orchestrates quad extraction: transition functions, consistent UV
//! truncation, grid-vertex generation, stub tracing and face assembly.
//!
//! The extractor owns the input triangle mesh (the decimator rewrites its
//! topology) and a per-edge table of transition functions. All UV work
//! happens on an internal copy of the caller's coordinate array.

use crate::decimator;
use crate::exact::{Orientation, Triangle2};
use crate::grid::GridVertex;
use crate::handles::{FaceHandle, HalfedgeHandle, VertexHandle};
use crate::mesh::PolyMesh;
use crate::transition::TransitionFunction;
use glam::{DMat3, DVec2, DVec3, IVec2};
use log::{debug, error, info};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Write as _;
use thiserror::Error;

/// Caller-visible contract violations. Everything else is handled locally
/// (logged, signalled on the affected stub, or skipped).
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("uv array has {found} entries, expected {expected} (two per halfedge)")]
    UvArraySize { expected: usize, found: usize },
    #[error("external valence array has {found} entries, expected {expected} (one per vertex)")]
    ValenceArraySize { expected: usize, found: usize },
    #[error("input face {0} is not a triangle")]
    NonTriangularFace(u32),
}

/// Extraction options
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions<'a> {
    /// Authoritative per-vertex valences, overriding the angle heuristic
    pub external_valences: Option<&'a [u32]>,
    /// Reject output faces that visit a vertex twice
    pub discard_double_faces: bool,
}

/// The extracted quad mesh.
///
/// Output vertex indices coincide with grid-vertex indices; vertices that
/// ended up isolated are flagged deleted rather than removed, so the
/// correspondence survives.
#[derive(Debug)]
pub struct QuadExtraction {
    pub mesh: PolyMesh,
    /// Integer UV per output halfedge, indexed by halfedge id
    pub halfedge_uvs: Vec<IVec2>,
    /// Boundary loops that touch a parametric boundary
    pub desired_holes: usize,
    /// Boundary loops that do not; usually the footprint of a skipped face
    pub undesired_holes: usize,
}

/// Per-halfedge 3D source positions for lifting grid vertices.
///
/// Decimation migrates vertex handles, so when it changed anything the
/// positions stashed beforehand are used instead of the live mesh.
pub(crate) enum Embedding<'a> {
    Original,
    Stashed(&'a [DVec3]),
}

/// UV coordinate stored at a halfedge (at its to-vertex, in the chart of
/// its face)
#[inline]
pub(crate) fn uv_at(uv: &[f64], heh: HalfedgeHandle) -> DVec2 {
    let i = 2 * heh.idx_usize();
    DVec2::new(uv[i], uv[i + 1])
}

/// Quad mesh extractor over a triangle mesh with per-halfedge UVs
pub struct MeshExtractor {
    pub(crate) tri_mesh: PolyMesh,
    /// Transition function per edge, halfedge-0 direction
    pub(crate) tf: Vec<TransitionFunction>,
    /// Edges whose UV segment is non-degenerate
    pub(crate) edge_valid: Vec<bool>,
    /// Canonical incoming halfedge per vertex
    pub(crate) vertex_to_halfedge: Vec<HalfedgeHandle>,
    /// Canonical (non-boundary where possible) halfedge per edge
    pub(crate) edge_to_halfedge: Vec<HalfedgeHandle>,
    /// All grid vertices, append-only; indices are stable
    pub(crate) gvertices: Vec<GridVertex>,
    pub(crate) face_gvertices: Vec<Vec<usize>>,
    pub(crate) edge_gvertices: Vec<Vec<usize>>,
    pub(crate) vertex_gvertices: Vec<Vec<usize>>,
}

impl MeshExtractor {
    /// Create an extractor over the given triangle mesh
    pub fn new(tri_mesh: PolyMesh) -> Self {
        Self {
            tri_mesh,
            tf: Vec::new(),
            edge_valid: Vec::new(),
            vertex_to_halfedge: Vec::new(),
            edge_to_halfedge: Vec::new(),
            gvertices: Vec::new(),
            face_gvertices: Vec::new(),
            edge_gvertices: Vec::new(),
            vertex_gvertices: Vec::new(),
        }
    }

    /// Access the (possibly decimated) input mesh
    pub fn tri_mesh(&self) -> &PolyMesh {
        &self.tri_mesh
    }

    /// Access the grid vertices produced by the last extraction
    pub fn grid_vertices(&self) -> &[GridVertex] {
        &self.gvertices
    }

    /// Per-edge transition functions from the last extraction, indexed by
    /// edge id (halfedge-0 direction)
    pub fn edge_transitions(&self) -> &[TransitionFunction] {
        &self.tf
    }

    /// Run the full extraction pipeline
    pub fn extract(
        &mut self,
        uv_coords: &[f64],
        options: &ExtractOptions<'_>,
    ) -> Result<QuadExtraction, ExtractError> {
        let expected = 2 * self.tri_mesh.n_halfedges();
        if uv_coords.len() != expected {
            return Err(ExtractError::UvArraySize {
                expected,
                found: uv_coords.len(),
            });
        }
        if let Some(valences) = options.external_valences {
            if valences.len() != self.tri_mesh.n_vertices() {
                return Err(ExtractError::ValenceArraySize {
                    expected: self.tri_mesh.n_vertices(),
                    found: valences.len(),
                });
            }
        }
        for fh in self.tri_mesh.faces() {
            if self.tri_mesh.face_valence(fh) != 3 {
                return Err(ExtractError::NonTriangularFace(fh.idx()));
            }
        }

        let mut uv = uv_coords.to_vec();

        // stash the embedding; vertex handles may migrate during decimation
        let he_points: Vec<DVec3> = (0..self.tri_mesh.n_halfedges())
            .map(|i| {
                let heh = HalfedgeHandle::from_usize(i);
                self.tri_mesh.point(self.tri_mesh.to_vertex_handle(heh))
            })
            .collect();

        // collapse degenerate edges prior to truncation
        let mut decimated = decimator::decimate(&mut self.tri_mesh, &mut uv);

        self.extract_transition_functions(&uv);
        self.consistent_truncation(&mut uv);

        // collapse degenerate edges again after truncation
        decimated |= decimator::decimate(&mut self.tri_mesh, &mut uv);

        let embedding = if decimated {
            Embedding::Stashed(&he_points)
        } else {
            Embedding::Original
        };

        self.generate_vertices(&uv, options.external_valences, &embedding);
        self.generate_connections(&uv);
        self.try_connect_incomplete_gvertices();

        Ok(self.generate_faces(options))
    }

    pub(crate) fn embed(&self, embedding: &Embedding<'_>, heh: HalfedgeHandle) -> DVec3 {
        match embedding {
            Embedding::Original => self.tri_mesh.point(self.tri_mesh.to_vertex_handle(heh)),
            Embedding::Stashed(points) => points[heh.idx_usize()],
        }
    }

    // --- Transition functions ---

    /// Derive the transition function of every interior edge from the UVs
    /// of its two incident charts. Boundary edges carry identity.
    pub(crate) fn extract_transition_functions(&mut self, uv: &[f64]) {
        self.tf = vec![TransitionFunction::IDENTITY; self.tri_mesh.n_edges()];

        for eh in self.tri_mesh.edges() {
            if self.tri_mesh.is_boundary_edge(eh) {
                continue;
            }
            let heh0 = self.tri_mesh.edge_halfedge_handle(eh, 0);
            let heh1 = self.tri_mesh.edge_halfedge_handle(eh, 1);
            let heh0p = self.tri_mesh.prev_halfedge_handle(heh0);
            let heh1p = self.tri_mesh.prev_halfedge_handle(heh1);

            // edge endpoints in the left and right chart
            let l0 = uv_at(uv, heh0);
            let l1 = uv_at(uv, heh0p);
            let r0 = uv_at(uv, heh1p);
            let r1 = uv_at(uv, heh1);

            // rotational part: the angle between the edge directions,
            // snapped to a quarter turn
            let dl = l0 - l1;
            let dr = r0 - r1;
            let angle = dl.perp_dot(dr).atan2(dl.dot(dr));
            let r = ((2.0 * angle / PI).round() as i32).rem_euclid(4);

            // translational part
            let t = r0 - TransitionFunction::new(r, 0, 0).transform_point(l0);
            self.tf[eh.idx_usize()] =
                TransitionFunction::new(r, t.x.round() as i32, t.y.round() as i32);
        }
    }

    /// The transition across `heh`, mapping the chart of `face(heh)` into
    /// the chart of `face(opposite(heh))`
    #[inline]
    pub(crate) fn transition(&self, heh: HalfedgeHandle) -> TransitionFunction {
        let eh = self.tri_mesh.edge_handle(heh);
        let tf = self.tf[eh.idx_usize()];
        if self.tri_mesh.edge_halfedge_handle(eh, 0) == heh {
            tf
        } else {
            tf.inverse()
        }
    }

    /// Composition of the edge transitions around a vertex, in one-ring
    /// order. Non-identity marks a singular (cone) vertex.
    pub(crate) fn transition_around_vertex(&self, vh: VertexHandle) -> TransitionFunction {
        if self.tri_mesh.is_boundary_vertex(vh) {
            return TransitionFunction::IDENTITY;
        }

        let mut ring = self.tri_mesh.incoming_halfedges_cw(vh);
        let Some(first) = ring.next() else {
            return TransitionFunction::IDENTITY;
        };

        // the transition of the first halfedge closes the cycle, so it is
        // composed last
        let tf_first = self.transition(self.tri_mesh.opposite_halfedge_handle(first));
        let mut tf = TransitionFunction::IDENTITY;
        for heh in ring {
            tf = self
                .transition(self.tri_mesh.opposite_halfedge_handle(heh))
                .compose(tf);
        }
        tf_first.compose(tf)
    }

    // --- Consistent truncation ---

    /// Snap all UVs to exactly representable values so that the integer
    /// comparisons of grid enumeration are exact, without flipping
    /// triangle orientations.
    pub(crate) fn consistent_truncation(&self, uv: &mut [f64]) {
        // correct integer values at selected/feature boundaries
        for eh in self.tri_mesh.edges() {
            if !self.tri_mesh.is_boundary_edge(eh) {
                continue;
            }
            let status = self.tri_mesh.edge_status(eh);
            if !(status.is_selected() || status.is_feature()) {
                continue;
            }
            let h0 = self.tri_mesh.edge_halfedge_handle(eh, 0).idx_usize();
            let h1 = self.tri_mesh.edge_halfedge_handle(eh, 1).idx_usize();
            for i in 0..2 {
                let a = uv[2 * h0 + i];
                let b = uv[2 * h1 + i];
                if (a - a.round()).abs() < 1e-4 && (b - b.round()).abs() < 1e-4 {
                    uv[2 * h0 + i] = a.round();
                    uv[2 * h1 + i] = b.round();
                }
            }
        }

        for vh in self.tri_mesh.vertices() {
            // magnitude scale of the one-ring
            let mut max_u_abs = 0.0f64;
            let mut max_trans_abs = 0.0f64;
            for heh in self.tri_mesh.incoming_halfedges_cw(vh) {
                if self.tri_mesh.is_boundary(heh) {
                    continue;
                }
                let h = heh.idx_usize();
                max_u_abs = max_u_abs.max(uv[2 * h].abs()).max(uv[2 * h + 1].abs());

                if !self
                    .tri_mesh
                    .is_boundary(self.tri_mesh.opposite_halfedge_handle(heh))
                {
                    let tf = self.tf[self.tri_mesh.edge_handle(heh).idx_usize()];
                    max_trans_abs = max_trans_abs
                        .max(f64::from(tf.tu.abs()))
                        .max(f64::from(tf.tv.abs()));
                }
            }

            let max_v = max_u_abs + max_trans_abs + 1.0;
            let max_v = 2.0f64.powf((max_v.ln() / 2.0f64.ln()).ceil() + 1.0);

            let mut ring = self.tri_mesh.incoming_halfedges_cw(vh);
            let Some(heh) = ring.next() else {
                continue;
            };

            // clear the bits below the magnitude scale on the start halfedge
            let h = heh.idx_usize();
            uv[2 * h] += max_v;
            uv[2 * h] -= max_v;
            uv[2 * h + 1] += max_v;
            uv[2 * h + 1] -= max_v;

            // a singular vertex must sit exactly on the fixed point of its
            // ring rotation
            let vtrans = self.transition_around_vertex(vh);
            if !self.tri_mesh.is_boundary_vertex(vh) && !vtrans.is_identity() {
                match vtrans.r {
                    1 => {
                        uv[2 * h] = f64::from(vtrans.tu - vtrans.tv) / 2.0;
                        uv[2 * h + 1] = f64::from(vtrans.tu + vtrans.tv) / 2.0;
                    }
                    2 => {
                        uv[2 * h] = f64::from(vtrans.tu) / 2.0;
                        uv[2 * h + 1] = f64::from(vtrans.tv) / 2.0;
                    }
                    3 => {
                        uv[2 * h] = f64::from(vtrans.tu + vtrans.tv) / 2.0;
                        uv[2 * h + 1] = f64::from(vtrans.tv - vtrans.tu) / 2.0;
                    }
                    _ => {
                        if vtrans.tu.abs() + vtrans.tv.abs() > 1 {
                            error!(
                                "non-identity ring transition without rotation at vertex {}: {}",
                                vh, vtrans
                            );
                        }
                    }
                }
            }

            // propagate through the one-ring
            let mut cur = DVec2::new(uv[2 * h], uv[2 * h + 1]);
            let mut n_boundaries = 0usize;
            for heh_cur in ring {
                if self.tri_mesh.is_boundary(heh_cur) {
                    n_boundaries += 1;
                    continue;
                }
                let heh_opp = self.tri_mesh.opposite_halfedge_handle(heh_cur);
                cur = self.transition(heh_opp).transform_point(cur);
                let c = heh_cur.idx_usize();
                uv[2 * c] = cur.x;
                uv[2 * c + 1] = cur.y;
            }

            if n_boundaries > 1 {
                error!(
                    "input mesh has a non-manifold vertex {} adjacent to more than one boundary",
                    vh
                );
            }
        }
    }

    // --- Parametrization statistics ---

    /// Face orientation histogram of the parameterization, after transition
    /// extraction and truncation. Informational only.
    pub fn parametrization_stats(&mut self, uv_coords: &[f64]) -> String {
        let mut uv = uv_coords.to_vec();
        self.extract_transition_functions(&uv);
        self.consistent_truncation(&mut uv);

        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut needles = 0usize;
        let mut caps = 0usize;
        let mut points = 0usize;

        for fh in self.tri_mesh.faces() {
            let Some((tri, _)) = self.face_uv_triangle(fh, &uv) else {
                continue;
            };
            match tri.orientation() {
                Orientation::Positive => positive += 1,
                Orientation::Negative => negative += 1,
                Orientation::Zero => {
                    if tri.a == tri.b && tri.b == tri.c {
                        points += 1;
                    } else if tri.a == tri.b || tri.b == tri.c || tri.c == tri.a {
                        needles += 1;
                    } else {
                        caps += 1;
                    }
                }
            }
        }

        let mut stats = String::new();
        let _ = writeln!(stats, "Parametrization stats:");
        let _ = writeln!(stats, "  # positive: {positive}");
        let _ = writeln!(stats, "  # negative: {negative}");
        let _ = writeln!(stats, "  # needles: {needles}");
        let _ = writeln!(stats, "  # caps: {caps}");
        let _ = writeln!(stats, "  # points: {points}");
        info!("{stats}");
        stats
    }

    // --- UV triangles ---

    /// The UV triangle of a face with its three halfedges, corner `i`
    /// carrying the UV of halfedge `i`'s to-vertex
    pub(crate) fn face_uv_triangle(
        &self,
        fh: FaceHandle,
        uv: &[f64],
    ) -> Option<(Triangle2, [HalfedgeHandle; 3])> {
        let heh0 = self.tri_mesh.face_halfedge_handle(fh)?;
        let heh1 = self.tri_mesh.next_halfedge_handle(heh0);
        let heh2 = self.tri_mesh.next_halfedge_handle(heh1);
        let tri = Triangle2::new(uv_at(uv, heh0), uv_at(uv, heh1), uv_at(uv, heh2));
        Some((tri, [heh0, heh1, heh2]))
    }

    /// UV orientation of a face's chart triangle
    pub(crate) fn triangle_uv_orientation(&self, fh: FaceHandle, uv: &[f64]) -> Orientation {
        match self.face_uv_triangle(fh, uv) {
            Some((tri, _)) => tri.orientation(),
            None => Orientation::Zero,
        }
    }

    // --- Intra grid-vertex transitions ---

    /// The transition from chart `from_fh` to chart `to_fh` walking through
    /// the mesh edges that pass through grid vertex `gv`.
    ///
    /// Panics when the grid vertex does not sit between the requested
    /// faces; that is an implementation bug, not an input error.
    pub(crate) fn intra_gv_transition(
        &self,
        from_fh: FaceHandle,
        to_fh: FaceHandle,
        gv: &GridVertex,
        identity_if_same_fh: bool,
    ) -> TransitionFunction {
        use crate::grid::GridVertexKind;

        if identity_if_same_fh && from_fh == to_fh {
            return TransitionFunction::IDENTITY;
        }

        match gv.kind {
            GridVertexKind::OnFace => TransitionFunction::IDENTITY,
            GridVertexKind::OnEdge => {
                let heh = gv.heh;
                let opp = self.tri_mesh.opposite_halfedge_handle(heh);
                if self.tri_mesh.face_handle(heh) == Some(from_fh) {
                    let base = self.transition(heh);
                    if from_fh == to_fh {
                        self.transition(opp).compose(base)
                    } else {
                        base
                    }
                } else if self.tri_mesh.face_handle(opp) == Some(from_fh) {
                    let base = self.transition(opp);
                    if from_fh == to_fh {
                        self.transition(heh).compose(base)
                    } else {
                        base
                    }
                } else {
                    panic!("grid vertex halfedge is not the one between the requested faces");
                }
            }
            GridVertexKind::OnVertex => {
                let pivot = self.tri_mesh.to_vertex_handle(gv.heh);
                let ring: Vec<HalfedgeHandle> = self.tri_mesh.incoming_halfedges_cw(pivot).collect();
                let start = ring
                    .iter()
                    .position(|&heh| self.tri_mesh.face_handle(heh) == Some(from_fh))
                    .expect("from-face is not incident to the grid vertex pivot");

                let mut result = TransitionFunction::IDENTITY;
                let mut k = start;
                for _ in 0..=ring.len() {
                    result = self
                        .transition(self.tri_mesh.next_halfedge_handle(ring[k]))
                        .compose(result);
                    k = (k + 1) % ring.len();
                    if self.tri_mesh.face_handle(ring[k]) == Some(to_fh) {
                        return result;
                    }
                }
                panic!("to-face is not incident to the grid vertex pivot");
            }
        }
    }

    // --- 2D to 3D mappings ---

    /// Affine map lifting chart coordinates of a non-degenerate UV triangle
    /// onto the embedded triangle (a, b, c)
    pub(crate) fn mapping_from_triangle(
        tri: &Triangle2,
        a: DVec3,
        b: DVec3,
        c: DVec3,
    ) -> DMat3 {
        debug_assert!(!tri.is_degenerate());
        let p = DMat3::from_cols(
            DVec3::new(tri.a.x, tri.a.y, 1.0),
            DVec3::new(tri.b.x, tri.b.y, 1.0),
            DVec3::new(tri.c.x, tri.c.y, 1.0),
        );
        let positions = DMat3::from_cols(a, b, c);
        positions * p.inverse()
    }

    /// Least-squares affine map lifting chart coordinates of a UV segment
    /// onto the embedded segment (a, b)
    pub(crate) fn mapping_from_segment(
        seg: &crate::exact::Segment2,
        a: DVec3,
        b: DVec3,
    ) -> DMat3 {
        debug_assert!(!seg.is_degenerate());
        // alpha = c . x + d parameterizes the segment
        let dir = seg.b - seg.a;
        let c = dir / dir.dot(dir);
        let d = -c.dot(seg.a);
        let ab = b - a;
        DMat3::from_cols(ab * c.x, ab * c.y, a + d * ab)
    }

    #[inline]
    pub(crate) fn apply_mapping(m: &DMat3, x: f64, y: f64) -> DVec3 {
        *m * DVec3::new(x, y, 1.0)
    }

    /// Log the output face valence histogram; a pure quad mesh has a single
    /// bucket at valence 4
    pub(crate) fn log_quad_mesh_metrics(quad_mesh: &PolyMesh) {
        use std::collections::BTreeMap;
        let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
        for fh in quad_mesh.faces() {
            *histogram.entry(quad_mesh.face_valence(fh)).or_default() += 1;
        }
        debug!("face valence histogram: {histogram:?}");
        if histogram.len() > 1 || !histogram.contains_key(&4) {
            debug!("output is not a pure quad mesh");
        }
    }
}

/// Expected stub count at a vertex from the accumulated positive sector
/// angle, in quarter turns
#[inline]
pub(crate) fn ninety_jump(pos_angle_sum: f64) -> i32 {
    (pos_angle_sum / FRAC_PI_2).round() as i32
}
