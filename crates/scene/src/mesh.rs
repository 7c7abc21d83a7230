use std::f32::consts::{PI, TAU};

/// Indexed triangle mesh with per-vertex normals and texture coordinates.
///
/// Texture coordinates put `v = 0` at the north pole so they line up with
/// rasters stored top row first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Indexed line list (two indices per segment).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl LineMesh {
    pub fn segment_count(&self) -> usize {
        self.indices.len() / 2
    }
}

/// Latitude/longitude sphere. Seam vertices are duplicated so the texture
/// wraps cleanly at `u = 0 / 1`.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut mesh = Mesh::default();

    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let (sin_t, cos_t) = (v * PI).sin_cos();
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let (sin_p, cos_p) = (u * TAU).sin_cos();
            let n = [-cos_p * sin_t, cos_t, sin_p * sin_t];
            mesh.positions.push([n[0] * radius, n[1] * radius, n[2] * radius]);
            mesh.normals.push(n);
            mesh.uvs.push([u, v]);
        }
    }

    let row = ws + 1;
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // Degenerate triangles at the poles are skipped.
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

/// Edges of a `segments x segments` latitude/longitude sphere.
pub fn wire_sphere(radius: f32, segments: u32) -> LineMesh {
    let src = uv_sphere(radius, segments, segments);
    let mut edges = std::collections::BTreeSet::new();
    for tri in src.indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            edges.insert((a.min(b), a.max(b)));
        }
    }
    LineMesh {
        positions: src.positions,
        indices: edges.into_iter().flat_map(|(a, b)| [a, b]).collect(),
    }
}

/// Flat annulus in the XY plane, facing +Z.
pub fn ring(inner: f32, outer: f32, segments: u32) -> Mesh {
    let segs = segments.max(3);
    let mut mesh = Mesh::default();
    for i in 0..=segs {
        let t = i as f32 / segs as f32;
        let (s, c) = (t * TAU).sin_cos();
        for (r, v) in [(inner, 0.0), (outer, 1.0)] {
            mesh.positions.push([c * r, s * r, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
            mesh.uvs.push([t, v]);
        }
    }
    for i in 0..segs {
        let a = i * 2;
        let (b, c, d) = (a + 1, a + 2, a + 3);
        mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
    }
    mesh
}

/// Open cylinder centered on the origin with its axis along +Y.
pub fn cylinder(radius: f32, length: f32, radial_segments: u32) -> Mesh {
    let segs = radial_segments.max(3);
    let half = length * 0.5;
    let mut mesh = Mesh::default();
    for i in 0..=segs {
        let t = i as f32 / segs as f32;
        let (s, c) = (t * TAU).sin_cos();
        for (y, v) in [(half, 0.0), (-half, 1.0)] {
            mesh.positions.push([s * radius, y, c * radius]);
            mesh.normals.push([s, 0.0, c]);
            mesh.uvs.push([t, v]);
        }
    }
    for i in 0..segs {
        let a = i * 2;
        let (b, c, d) = (a + 1, a + 2, a + 3);
        mesh.indices.extend_from_slice(&[a, b, c, b, d, c]);
    }
    mesh
}
