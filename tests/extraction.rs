//! End-to-end extraction scenarios: planar grids, rotational seams, a cone
//! singularity, boundary tagging and degenerate input.

use glam::{DVec2, DVec3, IVec2};
use quadex::{
    ExtractOptions, HalfedgeHandle, MeshExtractor, PolyMesh, TransitionFunction, VertexHandle,
};
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// UV equal to the vertex position, per halfedge
fn identity_uvs(mesh: &PolyMesh) -> Vec<f64> {
    let mut uv = vec![0.0; 2 * mesh.n_halfedges()];
    for i in 0..mesh.n_halfedges() {
        let heh = HalfedgeHandle::from_usize(i);
        let p = mesh.point(mesh.to_vertex_handle(heh));
        uv[2 * i] = p.x;
        uv[2 * i + 1] = p.y;
    }
    uv
}

/// n x n planar grid of unit cells, each split into two triangles
fn grid_mesh(n: usize) -> PolyMesh {
    let mut mesh = PolyMesh::new();
    let mut vhs = Vec::new();
    for y in 0..=n {
        for x in 0..=n {
            vhs.push(mesh.add_vertex(DVec3::new(x as f64, y as f64, 0.0)));
        }
    }
    let at = |x: usize, y: usize| vhs[y * (n + 1) + x];
    for y in 0..n {
        for x in 0..n {
            mesh.add_face(&[at(x, y), at(x + 1, y), at(x, y + 1)]).unwrap();
            mesh.add_face(&[at(x + 1, y), at(x + 1, y + 1), at(x, y + 1)])
                .unwrap();
        }
    }
    mesh
}

/// Consecutive corners of a quad must be one axis-aligned lattice step apart
fn assert_unit_quad(corners: &[IVec2]) {
    assert_eq!(corners.len(), 4);
    for k in 0..4 {
        let d = corners[(k + 1) % 4] - corners[k];
        assert_eq!(d.x.abs() + d.y.abs(), 1, "corner step {d:?} is not a unit step");
    }
}

fn face_corner_uvs(out: &quadex::QuadExtraction, fh: quadex::FaceHandle) -> Vec<IVec2> {
    out.mesh
        .face_halfedges(fh)
        .map(|heh| out.halfedge_uvs[heh.idx_usize()])
        .collect()
}

#[test]
fn unit_square_identity_uv() {
    init_logging();

    let mut mesh = PolyMesh::new();
    let v0 = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
    let v1 = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
    let v2 = mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
    let v3 = mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
    mesh.add_face(&[v0, v1, v3]).unwrap();
    mesh.add_face(&[v1, v2, v3]).unwrap();

    let uv = identity_uvs(&mesh);
    let mut extractor = MeshExtractor::new(mesh);
    let out = extractor.extract(&uv, &ExtractOptions::default()).unwrap();

    assert_eq!(out.mesh.vertices().count(), 4);
    assert_eq!(out.mesh.faces().count(), 1);

    let fh = out.mesh.faces().next().unwrap();
    assert_eq!(out.mesh.face_valence(fh), 4);

    let corners = face_corner_uvs(&out, fh);
    assert_unit_quad(&corners);
    for expected in [
        IVec2::new(0, 0),
        IVec2::new(1, 0),
        IVec2::new(1, 1),
        IVec2::new(0, 1),
    ] {
        assert!(corners.contains(&expected), "missing corner {expected:?}");
    }
}

#[test]
fn planar_grid_4x4_identity_uv() {
    init_logging();

    let mesh = grid_mesh(4);
    let uv = identity_uvs(&mesh);
    let mut extractor = MeshExtractor::new(mesh);
    let out = extractor.extract(&uv, &ExtractOptions::default()).unwrap();

    assert_eq!(out.mesh.vertices().count(), 25);
    assert_eq!(out.mesh.faces().count(), 16);
    for fh in out.mesh.faces() {
        assert_eq!(out.mesh.face_valence(fh), 4);
        assert_unit_quad(&face_corner_uvs(&out, fh));
    }

    // every interior vertex of the quad grid has valence 4
    let mut interior = 0;
    for vh in out.mesh.vertices() {
        if !out.mesh.is_boundary_vertex(vh) {
            assert_eq!(out.mesh.valence(vh), 4);
            interior += 1;
        }
    }
    assert_eq!(interior, 9);

    // connected stubs always point back at each other
    let gvs = extractor.grid_vertices();
    for (i, gv) in gvs.iter().enumerate() {
        for (j, lei) in gv.local_edges.iter().enumerate() {
            if let Some((pg, po)) = lei.connection.connected() {
                assert_eq!(
                    gvs[pg].local_edges[po].connection.connected(),
                    Some((i, j)),
                    "stub ({i}, {j}) has an asymmetric peer"
                );
            }
        }
    }
}

/// 4-sided cylinder whose charts rotate by 90 degrees per column, so every
/// column seam carries a quarter-turn transition
fn cylinder_mesh() -> (PolyMesh, Vec<f64>, HashMap<u32, usize>) {
    let mut mesh = PolyMesh::new();
    let mut vhs = [[VertexHandle::invalid(); 2]; 4];
    for (c, column) in vhs.iter_mut().enumerate() {
        let angle = c as f64 * FRAC_PI_2;
        for (r, vh) in column.iter_mut().enumerate() {
            *vh = mesh.add_vertex(DVec3::new(angle.cos(), angle.sin(), r as f64));
        }
    }

    let mut uv_map: HashMap<(u32, u32), DVec2> = HashMap::new();
    let mut sector_of_face: HashMap<u32, usize> = HashMap::new();

    for c in 0..4 {
        let rot = TransitionFunction::new(c as i32, 0, 0);
        let a = vhs[c][0];
        let b = vhs[(c + 1) % 4][0];
        let cc = vhs[(c + 1) % 4][1];
        let d = vhs[c][1];
        let ua = rot.transform_point(DVec2::new(c as f64, 0.0));
        let ub = rot.transform_point(DVec2::new(c as f64 + 1.0, 0.0));
        let uc = rot.transform_point(DVec2::new(c as f64 + 1.0, 1.0));
        let ud = rot.transform_point(DVec2::new(c as f64, 1.0));

        for (tri, uvs) in [([a, b, d], [ua, ub, ud]), ([b, cc, d], [ub, uc, ud])] {
            let fh = mesh.add_face(&tri).unwrap();
            sector_of_face.insert(fh.idx(), c);
            for (vh, p) in tri.iter().zip(uvs) {
                uv_map.insert((fh.idx(), vh.idx()), p);
            }
        }
    }

    let mut uv = vec![0.0; 2 * mesh.n_halfedges()];
    for i in 0..mesh.n_halfedges() {
        let heh = HalfedgeHandle::from_usize(i);
        if let Some(fh) = mesh.face_handle(heh) {
            let p = uv_map[&(fh.idx(), mesh.to_vertex_handle(heh).idx())];
            uv[2 * i] = p.x;
            uv[2 * i + 1] = p.y;
        }
    }
    (mesh, uv, sector_of_face)
}

#[test]
fn cylinder_with_rotational_seams() {
    init_logging();

    let (mesh, uv, sector_of_face) = cylinder_mesh();
    let mut extractor = MeshExtractor::new(mesh);
    let out = extractor.extract(&uv, &ExtractOptions::default()).unwrap();

    // seam edges carry quarter-turn transitions
    let tri_mesh = extractor.tri_mesh();
    let transitions = extractor.edge_transitions();
    let mut seams = 0;
    let mut pure_rotations = 0;
    for eh in tri_mesh.edges() {
        if tri_mesh.is_boundary_edge(eh) {
            continue;
        }
        let h0 = tri_mesh.edge_halfedge_handle(eh, 0);
        let h1 = tri_mesh.opposite_halfedge_handle(h0);
        let f0 = tri_mesh.face_handle(h0).unwrap();
        let f1 = tri_mesh.face_handle(h1).unwrap();
        let tf = transitions[eh.idx_usize()];

        if sector_of_face[&f0.idx()] == sector_of_face[&f1.idx()] {
            assert!(tf.is_identity(), "intra-sector edge {eh} has {tf}");
        } else {
            seams += 1;
            assert!(tf.r == 1 || tf.r == 3, "seam edge {eh} has rotation {}", tf.r);
            if tf.tu == 0 && tf.tv == 0 {
                pure_rotations += 1;
            }
        }
    }
    assert_eq!(seams, 4);
    // all seams except the one closing the period are pure rotations
    assert_eq!(pure_rotations, 3);

    // quads stitch across the seams with no duplicate vertices
    assert_eq!(out.mesh.vertices().count(), 8);
    assert_eq!(out.mesh.faces().count(), 4);
    for fh in out.mesh.faces() {
        assert_eq!(out.mesh.face_valence(fh), 4);
        assert_unit_quad(&face_corner_uvs(&out, fh));
    }

    let interior_edges = out
        .mesh
        .edges()
        .filter(|&eh| !out.mesh.is_boundary_edge(eh))
        .count();
    assert_eq!(interior_edges, 4);

    let mut positions: Vec<[u64; 3]> = out
        .mesh
        .vertices()
        .map(|vh| {
            let p = out.mesh.point(vh);
            [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
        })
        .collect();
    positions.sort_unstable();
    positions.dedup();
    assert_eq!(positions.len(), 8, "output contains duplicate vertices");
}

/// Three unit quads folded around a common corner: a parametric cone point
/// of valence 3
fn cone_mesh() -> (PolyMesh, Vec<f64>, Vec<u32>) {
    let mut mesh = PolyMesh::new();
    let center = mesh.add_vertex(DVec3::ZERO);
    let mut axis = [VertexHandle::invalid(); 3];
    let mut diag = [VertexHandle::invalid(); 3];
    for s in 0..3 {
        let angle = s as f64 * 2.0 * PI / 3.0;
        axis[s] = mesh.add_vertex(DVec3::new(angle.cos(), angle.sin(), 0.5));
    }
    for s in 0..3 {
        let angle = s as f64 * 2.0 * PI / 3.0 + PI / 3.0;
        diag[s] = mesh.add_vertex(DVec3::new(1.4 * angle.cos(), 1.4 * angle.sin(), 0.8));
    }

    let mut uv_map: HashMap<(u32, u32), DVec2> = HashMap::new();
    for s in 0..3 {
        let sn = (s + 1) % 3;
        // sector chart: center (0,0), axis_s (1,0), diag_s (1,1), axis_{s+1} (0,1)
        let quads = [
            (
                [center, axis[s], diag[s]],
                [DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0), DVec2::new(1.0, 1.0)],
            ),
            (
                [center, diag[s], axis[sn]],
                [DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0), DVec2::new(0.0, 1.0)],
            ),
        ];
        for (tri, uvs) in quads {
            let fh = mesh.add_face(&tri).unwrap();
            for (vh, p) in tri.iter().zip(uvs) {
                uv_map.insert((fh.idx(), vh.idx()), p);
            }
        }
    }

    let mut uv = vec![0.0; 2 * mesh.n_halfedges()];
    for i in 0..mesh.n_halfedges() {
        let heh = HalfedgeHandle::from_usize(i);
        if let Some(fh) = mesh.face_handle(heh) {
            let p = uv_map[&(fh.idx(), mesh.to_vertex_handle(heh).idx())];
            uv[2 * i] = p.x;
            uv[2 * i + 1] = p.y;
        }
    }

    // center 3, rim axis vertices 3, rim diagonal vertices 2
    let valences = vec![3, 3, 3, 3, 2, 2, 2];
    (mesh, uv, valences)
}

#[test]
fn cone_singularity_valence_3() {
    init_logging();

    let (mesh, uv, valences) = cone_mesh();
    let mut extractor = MeshExtractor::new(mesh);
    let out = extractor
        .extract(
            &uv,
            &ExtractOptions {
                external_valences: Some(&valences),
                ..Default::default()
            },
        )
        .unwrap();

    // one grid vertex per mesh vertex, the cone point first
    assert_eq!(extractor.grid_vertices().len(), 7);
    let cone = &extractor.grid_vertices()[0];
    assert_eq!(cone.local_edges.len(), 3);
    assert_eq!(cone.missing_leis, 0);
    assert!(!cone.is_boundary);

    assert_eq!(out.mesh.faces().count(), 3);
    for fh in out.mesh.faces() {
        assert_eq!(out.mesh.face_valence(fh), 4);
        assert_unit_quad(&face_corner_uvs(&out, fh));
    }

    // the cone point has degree 3 in the output
    let cone_vh = VertexHandle::new(0);
    assert_eq!(out.mesh.valence(cone_vh), 3);
    assert!(!out.mesh.vertex_status(cone_vh).is_tagged());
}

#[test]
fn boundary_disk_tagging() {
    init_logging();

    let mut mesh = grid_mesh(2);
    // boundary isolines are intentional: mark the boundary edges selected
    let boundary: Vec<_> = mesh.edges().filter(|&eh| mesh.is_boundary_edge(eh)).collect();
    for eh in boundary {
        mesh.edge_status_mut(eh).set_selected(true);
    }

    let uv = identity_uvs(&mesh);
    let mut extractor = MeshExtractor::new(mesh);
    let out = extractor.extract(&uv, &ExtractOptions::default()).unwrap();

    assert_eq!(out.mesh.vertices().count(), 9);
    assert_eq!(out.mesh.faces().count(), 4);

    // the disk boundary is the single desired hole
    assert_eq!(out.desired_holes, 1);
    assert_eq!(out.undesired_holes, 0);

    // every boundary grid vertex is tagged, the center is not
    let mut tagged = 0;
    for vh in out.mesh.vertices() {
        let on_boundary = out.mesh.is_boundary_vertex(vh);
        assert_eq!(out.mesh.vertex_status(vh).is_tagged(), on_boundary);
        if on_boundary {
            tagged += 1;
        }
    }
    assert_eq!(tagged, 8);
}

#[test]
fn degenerate_triangle_is_collapsed() {
    init_logging();

    // unit square plus a sliver triangle whose chart collapses to a point
    let mut mesh = PolyMesh::new();
    let v0 = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
    let v1 = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
    let v2 = mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
    let v3 = mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
    let x = mesh.add_vertex(DVec3::new(1.05, 0.5, 0.0));
    let f0 = mesh.add_face(&[v0, v1, v3]).unwrap();
    let f1 = mesh.add_face(&[v1, v2, v3]).unwrap();
    let f2 = mesh.add_face(&[v1, x, v2]).unwrap();

    let mut uv = vec![0.0; 2 * mesh.n_halfedges()];
    let charts = [
        (f0, [(v0, (0.0, 0.0)), (v1, (1.0, 0.0)), (v3, (0.0, 1.0))]),
        (f1, [(v1, (1.0, 0.0)), (v2, (1.0, 1.0)), (v3, (0.0, 1.0))]),
        // the sliver parameterizes to a single point
        (f2, [(v1, (1.0, 0.0)), (x, (1.0, 0.0)), (v2, (1.0, 0.0))]),
    ];
    for i in 0..mesh.n_halfedges() {
        let heh = HalfedgeHandle::from_usize(i);
        let Some(fh) = mesh.face_handle(heh) else { continue };
        let to = mesh.to_vertex_handle(heh);
        let (_, corners) = charts.iter().find(|(f, _)| *f == fh).unwrap();
        let (_, (u, v)) = corners.iter().find(|(vh, _)| *vh == to).unwrap();
        uv[2 * i] = *u;
        uv[2 * i + 1] = *v;
    }

    let mut extractor = MeshExtractor::new(mesh);
    let out = extractor.extract(&uv, &ExtractOptions::default()).unwrap();

    // the sliver is gone; the result is the plain unit square quad
    assert_eq!(out.mesh.vertices().count(), 4);
    assert_eq!(out.mesh.faces().count(), 1);
    let fh = out.mesh.faces().next().unwrap();
    assert_eq!(out.mesh.face_valence(fh), 4);
    assert_unit_quad(&face_corner_uvs(&out, fh));

    // grid vertices lift through the stashed embedding, not the collapsed
    // sliver vertex
    let positions: Vec<DVec3> = out.mesh.vertices().map(|vh| out.mesh.point(vh)).collect();
    assert!(positions.contains(&DVec3::new(1.0, 0.0, 0.0)));
    assert!(!positions.contains(&DVec3::new(1.05, 0.5, 0.0)));
}
