use criterion::{criterion_group, criterion_main, Criterion};
use glam::DVec3;
use quadex::{ExtractOptions, HalfedgeHandle, MeshExtractor, PolyMesh};

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

fn bench_extract(c: &mut Criterion) {
    let mesh = grid_mesh(16);
    let uv = identity_uvs(&mesh);

    c.bench_function("extract_16x16_grid", |b| {
        b.iter(|| {
            let mut extractor = MeshExtractor::new(mesh.clone());
            extractor
                .extract(&uv, &ExtractOptions::default())
                .expect("extraction failed")
        })
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
