//! # Grid vertices and local edges
//!
//! A grid vertex is an integer lattice point of the parameterization,
//! lifted back to 3D; it becomes a vertex of the output mesh. Each grid
//! vertex carries up to four directional stubs (local edges), one per
//! cardinal axis of its host chart, which the tracer later connects into
//! the quad halfedge graph.

use crate::handles::{FaceHandle, HalfedgeHandle};
use crate::transition::TransitionFunction;
use glam::DVec2;

/// The four cardinal directions in counterclockwise order: +u, +v, -u, -v
pub const CARTESIAN_ORIENTATIONS: [DVec2; 4] = [
    DVec2::new(1.0, 0.0),
    DVec2::new(0.0, 1.0),
    DVec2::new(-1.0, 0.0),
    DVec2::new(0.0, -1.0),
];

/// Index of a unit cardinal direction in `CARTESIAN_ORIENTATIONS`
pub fn orientation_to_idx(dir: DVec2) -> usize {
    match (dir.x as i32, dir.y as i32) {
        (1, 0) => 0,
        (0, 1) => 1,
        (-1, 0) => 2,
        (0, -1) => 3,
        _ => {
            debug_assert!(false, "not a cardinal direction: {dir:?}");
            0
        }
    }
}

/// Same lookup for negatively oriented charts, where the stub order is
/// reversed
#[inline]
pub fn orientation_to_idx_inverse(dir: DVec2) -> usize {
    3 - orientation_to_idx(dir)
}

/// Where a grid vertex sits on the carrier triangle mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridVertexKind {
    OnFace,
    OnEdge,
    OnVertex,
}

/// Connection state of a local edge stub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// Not yet traced
    Unconnected,
    /// Traced, but no partner stub was found
    NoConnection,
    /// The trace ran into a parametric boundary
    TracedIntoBoundary,
    /// The trace ran into a degenerate edge or triangle
    TracedIntoDegeneracy,
    /// Connected to stub `orient` of grid vertex `gv`
    Connected { gv: usize, orient: usize },
}

impl Connection {
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Connection::Connected { .. })
    }

    #[inline]
    pub fn is_unconnected(&self) -> bool {
        matches!(self, Connection::Unconnected)
    }

    /// Anything but a concrete partner: fresh or signalled
    #[inline]
    pub fn is_unconnected_or_signal(&self) -> bool {
        !self.is_connected()
    }

    /// The partner (grid vertex index, stub index), when connected
    #[inline]
    pub fn connected(&self) -> Option<(usize, usize)> {
        match *self {
            Connection::Connected { gv, orient } => Some((gv, orient)),
            _ => None,
        }
    }
}

/// A directional stub at a grid vertex
#[derive(Debug, Clone)]
pub struct LocalEdgeInfo {
    /// Face whose chart the stub is embedded in
    pub fh_from: FaceHandle,
    /// Stub origin in that chart
    pub uv_from: DVec2,
    /// One lattice step along the stub's axis
    pub uv_intended_to: DVec2,
    /// Actual endpoint once connected, in the origin chart
    pub uv_to: DVec2,
    /// Maps the origin chart into the destination chart once connected
    pub accumulated_tf: TransitionFunction,
    /// Connection state
    pub connection: Connection,
    /// Consumed by face traversal
    pub face_constructed: bool,
    /// Halfedge in the output mesh, once built
    pub halfedge: Option<HalfedgeHandle>,
}

impl LocalEdgeInfo {
    pub fn new(fh_from: FaceHandle, uv_from: DVec2, uv_intended_to: DVec2) -> Self {
        Self {
            fh_from,
            uv_from,
            uv_intended_to,
            uv_to: uv_intended_to,
            accumulated_tf: TransitionFunction::IDENTITY,
            connection: Connection::Unconnected,
            face_constructed: false,
            halfedge: None,
        }
    }

    /// Fill in the result of a successful connection
    pub fn complete(
        &mut self,
        gv: usize,
        orient: usize,
        uv_to: DVec2,
        accumulated_tf: TransitionFunction,
    ) {
        self.connection = Connection::Connected { gv, orient };
        self.uv_to = uv_to;
        self.accumulated_tf = accumulated_tf;
    }
}

/// An integer lattice point of the parameterization
#[derive(Debug, Clone)]
pub struct GridVertex {
    pub kind: GridVertexKind,
    /// Host halfedge: identifies the chart, and for OnEdge the edge,
    /// for OnVertex the pivot vertex
    pub heh: HalfedgeHandle,
    /// Integer position in the host chart
    pub position_uv: DVec2,
    /// Back-projected 3D position
    pub position_3d: glam::DVec3,
    /// Touches a parametric boundary, or was traced into one
    pub is_boundary: bool,
    /// Expected but unrealized stubs at irregular vertices
    pub missing_leis: i32,
    /// Stubs in cyclic counterclockwise order
    pub local_edges: Vec<LocalEdgeInfo>,
}

impl GridVertex {
    pub fn new(
        kind: GridVertexKind,
        heh: HalfedgeHandle,
        position_uv: DVec2,
        position_3d: glam::DVec3,
        is_boundary: bool,
    ) -> Self {
        Self {
            kind,
            heh,
            position_uv,
            position_3d,
            is_boundary,
            missing_leis: 0,
            local_edges: Vec::new(),
        }
    }

    #[inline]
    pub fn n_edges(&self) -> usize {
        self.local_edges.len()
    }

    /// Cyclic stub index: any integer maps into `0..len`
    #[inline]
    pub fn cyclic_index(&self, idx: isize) -> usize {
        let len = self.local_edges.len() as isize;
        debug_assert!(len > 0);
        (((idx % len) + len) % len) as usize
    }

    /// Cyclic stub access
    #[inline]
    pub fn local_edge(&self, idx: isize) -> &LocalEdgeInfo {
        &self.local_edges[self.cyclic_index(idx)]
    }

    /// Cyclic stub access, mutable
    #[inline]
    pub fn local_edge_mut(&mut self, idx: isize) -> &mut LocalEdgeInfo {
        let i = self.cyclic_index(idx);
        &mut self.local_edges[i]
    }
}
