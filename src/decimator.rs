//! # Degenerate-edge decimator
//!
//! Collapses edges whose two endpoints coincide in parameter space, so the
//! edge maps to a single point of the UV grid. Such edges would otherwise
//! derail grid enumeration and ray tracing. The extractor runs this before
//! and after UV truncation.

use crate::extractor::uv_at;
use crate::handles::{EdgeHandle, HalfedgeHandle};
use crate::mesh::PolyMesh;
use log::debug;

/// Whether the edge parameterizes to a point: its endpoint UVs coincide in
/// every chart the edge borders
fn is_uv_degenerate(mesh: &PolyMesh, uv: &[f64], eh: EdgeHandle) -> bool {
    let mut any_side = false;
    for i in 0..2 {
        let heh = mesh.edge_halfedge_handle(eh, i);
        if mesh.is_boundary(heh) {
            continue;
        }
        any_side = true;
        let prev = mesh.prev_halfedge_handle(heh);
        if uv_at(uv, heh) != uv_at(uv, prev) {
            return false;
        }
    }
    any_side
}

/// Collapse `heh` on the mesh, keeping the UV array consistent: a halfedge
/// that survives a loop removal inherits the chart coordinates of the
/// halfedge it replaces.
fn collapse_with_uvs(mesh: &mut PolyMesh, uv: &mut [f64], heh: HalfedgeHandle) {
    let h0 = heh;
    let o0 = mesh.opposite_halfedge_handle(h0);

    let hn = mesh.next_halfedge_handle(h0);
    let hp = mesh.prev_halfedge_handle(h0);
    let on = mesh.next_halfedge_handle(o0);
    let op = mesh.prev_halfedge_handle(o0);

    // a triangle beside the edge degenerates into a loop that collapse
    // removes; its surviving halfedge switches charts
    let is_triangle = |h: HalfedgeHandle| {
        mesh.next_halfedge_handle(mesh.next_halfedge_handle(mesh.next_halfedge_handle(h))) == h
    };
    let h_side_loop = !mesh.is_boundary(h0) && is_triangle(h0);
    let o_side_loop = !mesh.is_boundary(o0) && is_triangle(o0);

    mesh.collapse(h0);

    if h_side_loop {
        let dying = mesh.opposite_halfedge_handle(hp);
        copy_uv(uv, dying, hn);
    }
    if o_side_loop {
        let dying = mesh.opposite_halfedge_handle(on);
        copy_uv(uv, dying, op);
    }
}

fn copy_uv(uv: &mut [f64], from: HalfedgeHandle, to: HalfedgeHandle) {
    let f = 2 * from.idx_usize();
    let t = 2 * to.idx_usize();
    uv[t] = uv[f];
    uv[t + 1] = uv[f + 1];
}

/// Collapse all UV-degenerate edges. Returns whether anything changed; in
/// that case vertex handles may have migrated and callers must lift 3D
/// positions through a stashed per-halfedge embedding.
pub fn decimate(mesh: &mut PolyMesh, uv: &mut [f64]) -> bool {
    let mut changed_any = false;
    loop {
        let mut changed = false;
        for idx in 0..mesh.n_edges() {
            let eh = EdgeHandle::from_usize(idx);
            if mesh.edge_status(eh).is_deleted() {
                continue;
            }
            if !is_uv_degenerate(mesh, uv, eh) {
                continue;
            }

            let heh = mesh.edge_halfedge_handle(eh, 0);
            let opp = mesh.edge_halfedge_handle(eh, 1);
            if mesh.is_collapse_ok(heh) {
                collapse_with_uvs(mesh, uv, heh);
                changed = true;
            } else if mesh.is_collapse_ok(opp) {
                collapse_with_uvs(mesh, uv, opp);
                changed = true;
            } else {
                debug!("degenerate edge {} is not collapsible", eh);
            }
        }
        if !changed {
            break;
        }
        changed_any = true;
    }
    if changed_any {
        debug!(
            "decimation left {} vertices, {} edges, {} faces",
            mesh.vertices().count(),
            mesh.edges().count(),
            mesh.faces().count()
        );
    }
    changed_any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::VertexHandle;
    use glam::DVec3;

    /// Square split into 4 triangles around a center vertex; the center
    /// carries the same UV as corner 0 in every chart, so every spoke
    /// touching both is degenerate only if its two endpoint UVs agree.
    fn fan_mesh_with_degenerate_spoke() -> (PolyMesh, Vec<f64>) {
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

        // identity-ish UVs, except the center collapses onto v0
        let uvs = [
            (c, 0.0, 0.0), // same parameter as v0
            (v0, 0.0, 0.0),
            (v1, 1.0, 0.0),
            (v2, 1.0, 1.0),
            (v3, 0.0, 1.0),
        ];
        let mut uv = vec![0.0; 2 * mesh.n_halfedges()];
        for i in 0..mesh.n_halfedges() {
            let heh = HalfedgeHandle::from_usize(i);
            let to = mesh.to_vertex_handle(heh);
            let (_, u, v) = uvs.iter().find(|(vh, _, _)| *vh == to).unwrap();
            uv[2 * i] = *u;
            uv[2 * i + 1] = *v;
        }
        (mesh, uv)
    }

    #[test]
    fn test_degeneracy_detection() {
        let (mesh, uv) = fan_mesh_with_degenerate_spoke();
        let degenerate: Vec<_> = mesh
            .edges()
            .filter(|&eh| is_uv_degenerate(&mesh, &uv, eh))
            .collect();
        // exactly the spoke c-v0 parameterizes to a point
        assert_eq!(degenerate.len(), 1);
        let eh = degenerate[0];
        let heh = mesh.edge_halfedge_handle(eh, 0);
        let vs = [mesh.to_vertex_handle(heh), mesh.from_vertex_handle(heh)];
        assert!(vs.contains(&VertexHandle::new(0)));
        assert!(vs.contains(&VertexHandle::new(1)));
    }

    #[test]
    fn test_decimate_collapses_spoke() {
        let (mut mesh, mut uv) = fan_mesh_with_degenerate_spoke();
        assert!(decimate(&mut mesh, &mut uv));
        assert_eq!(mesh.vertices().count(), 4);
        assert_eq!(mesh.faces().count(), 2);
        assert_eq!(mesh.edges().count(), 5);
        mesh.validate().unwrap();

        // second run is a no-op
        assert!(!decimate(&mut mesh, &mut uv));

        // surviving halfedges still carry the UVs of their to-vertices
        for heh in mesh.halfedges() {
            if mesh.is_boundary(heh) {
                continue;
            }
            let p = uv_at(&uv, heh);
            assert!(p.x.fract() == 0.0 && p.y.fract() == 0.0);
        }
    }

    #[test]
    fn test_decimate_ignores_regular_mesh() {
        let mut mesh = PolyMesh::new();
        let v0 = mesh.add_vertex(DVec3::ZERO);
        let v1 = mesh.add_vertex(DVec3::X);
        let v2 = mesh.add_vertex(DVec3::Y);
        mesh.add_face(&[v0, v1, v2]).unwrap();
        let mut uv = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        assert!(!decimate(&mut mesh, &mut uv));
        assert_eq!(mesh.faces().count(), 1);
    }
}
