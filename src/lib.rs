//! # quadex - Quad Mesh Extraction
//!
//! Extracts a quad-dominant polygon mesh from a triangle mesh equipped with
//! a per-halfedge UV parameterization whose isolines form an integer grid.
//!
//! ## Quick Start
//!
//! ```rust
//! use quadex::{ExtractOptions, HalfedgeHandle, MeshExtractor, PolyMesh};
//! use glam::DVec3;
//!
//! // two triangles over the unit square, UV equal to position
//! let mut mesh = PolyMesh::new();
//! let v0 = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
//! let v1 = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
//! let v2 = mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
//! let v3 = mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
//! mesh.add_face(&[v0, v1, v3]).unwrap();
//! mesh.add_face(&[v1, v2, v3]).unwrap();
//!
//! let mut uv = vec![0.0; 2 * mesh.n_halfedges()];
//! for i in 0..mesh.n_halfedges() {
//!     let to = mesh.to_vertex_handle(HalfedgeHandle::from_usize(i));
//!     let p = mesh.point(to);
//!     uv[2 * i] = p.x;
//!     uv[2 * i + 1] = p.y;
//! }
//!
//! let mut extractor = MeshExtractor::new(mesh);
//! let out = extractor.extract(&uv, &ExtractOptions::default()).unwrap();
//! assert_eq!(out.mesh.faces().count(), 1);
//! ```

// Re-export types
pub use decimator::decimate;
pub use exact::{orient2d, Bbox2, Boundedness, Orientation, Segment2, Triangle2};
pub use extractor::{ExtractError, ExtractOptions, MeshExtractor, QuadExtraction};
pub use grid::{Connection, GridVertex, GridVertexKind, LocalEdgeInfo};
pub use handles::{BaseHandle, EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle};
pub use mesh::PolyMesh;
pub use status::StatusFlags;
pub use transition::TransitionFunction;

// Core modules only
mod decimator;
mod exact;
mod extractor;
mod faces;
mod generator;
mod grid;
mod handles;
mod items;
mod kernel;
mod mesh;
mod status;
mod tracer;
mod transition;
