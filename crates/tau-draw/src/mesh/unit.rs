use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Tessellation settings for the unit primitives.
#[derive(Debug, Clone)]
pub struct UnitMeshConfig {
    pub cone_segments: u32,
    pub cylinder_segments: u32,
    pub sphere_stacks: u32,
    pub sphere_slices: u32,
    /// Segments per great circle of the wireframe sphere.
    pub wire_segments: u32,
}

impl Default for UnitMeshConfig {
    fn default() -> Self {
        Self {
            cone_segments: 24,
            cylinder_segments: 24,
            sphere_stacks: 12,
            sphere_slices: 24,
            wire_segments: 32,
        }
    }
}

/// Unit-space vertex (no color; color is applied at push time).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshVertex {
    pub p: Vec3,
    pub normal: Vec3,
}

/// Indexed triangle mesh, CCW front faces.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    fn push(&mut self, p: Vec3, normal: Vec3) -> u32 {
        let i = self.vertices.len() as u32;
        self.vertices.push(MeshVertex { p, normal });
        i
    }

    fn tri(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// Indexed line mesh (pairs of indices).
#[derive(Debug, Clone, Default)]
pub struct WireMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Unit primitives shared by every push of the same shape.
///
/// Built once; push operations transform copies of these vertices and never
/// modify the meshes themselves.
///
/// Conventions:
/// - cone: base circle of radius 1 at y = 0, apex at y = 1
/// - cylinder: radius 1, y in [0, 1]
/// - sphere / wireframe sphere: radius 1, centered
/// - quad: XY plane, [-0.5, 0.5], normal +Z
/// - cube: [-0.5, 0.5]^3
#[derive(Debug)]
pub struct UnitMeshes {
    pub quad: TriMesh,
    pub cube: TriMesh,
    pub cone: TriMesh,
    pub cylinder: TriMesh,
    pub sphere: TriMesh,
    pub sphere_wireframe: WireMesh,
    rings: HashMap<u32, Vec<Vec3>>,
}

impl UnitMeshes {
    pub fn new(config: &UnitMeshConfig) -> Self {
        let meshes = Self {
            quad: build_quad(),
            cube: build_cube(),
            cone: build_cone(config.cone_segments.max(3)),
            cylinder: build_cylinder(config.cylinder_segments.max(3)),
            sphere: build_sphere(config.sphere_stacks.max(2), config.sphere_slices.max(3)),
            sphere_wireframe: build_sphere_wireframe(config.wire_segments.max(3)),
            rings: HashMap::new(),
        };

        log::debug!(
            "unit meshes built: cone {} / cylinder {} / sphere {} vertices",
            meshes.cone.vertices.len(),
            meshes.cylinder.vertices.len(),
            meshes.sphere.vertices.len(),
        );

        meshes
    }

    /// Unit circle in the XY plane with `n` vertices; the last vertex coincides
    /// with the first so `n - 1` segments close the loop.
    ///
    /// Built on first request for a given `n` and reused afterwards.
    pub fn ring(&mut self, n: u32) -> &[Vec3] {
        self.rings.entry(n).or_insert_with(|| {
            let denom = n.saturating_sub(1).max(1) as f32;
            (0..n)
                .map(|i| {
                    let theta = i as f32 * TAU / denom;
                    Vec3::new(theta.cos(), theta.sin(), 0.0)
                })
                .collect()
        })
    }
}

fn build_quad() -> TriMesh {
    let mut m = TriMesh::default();
    for (x, y) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
        m.push(Vec3::new(x, y, 0.0), Vec3::Z);
    }
    m.tri(0, 1, 2);
    m.tri(0, 2, 3);
    m
}

fn build_cube() -> TriMesh {
    // (normal, u, v) with u × v = normal so the corner order below is CCW.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut m = TriMesh::default();
    for (n, u, v) in FACES {
        let c = n * 0.5;
        let a = m.push(c - u * 0.5 - v * 0.5, n);
        let b = m.push(c + u * 0.5 - v * 0.5, n);
        let d = m.push(c + u * 0.5 + v * 0.5, n);
        let e = m.push(c - u * 0.5 + v * 0.5, n);
        m.tri(a, b, d);
        m.tri(a, d, e);
    }
    m
}

#[inline]
fn circle_point(i: u32, segments: u32) -> (f32, f32) {
    let theta = i as f32 * TAU / segments as f32;
    (theta.cos(), theta.sin())
}

fn build_cone(segments: u32) -> TriMesh {
    let mut m = TriMesh::default();
    let apex = Vec3::Y;

    for i in 0..segments {
        let (c0, s0) = circle_point(i, segments);
        let (c1, s1) = circle_point(i + 1, segments);
        let (cm, sm) = {
            let t = (i as f32 + 0.5) * TAU / segments as f32;
            (t.cos(), t.sin())
        };

        // Side normal of a cone with height 1 and radius 1.
        let n0 = Vec3::new(c0, 1.0, s0).normalize();
        let n1 = Vec3::new(c1, 1.0, s1).normalize();
        let nm = Vec3::new(cm, 1.0, sm).normalize();

        let a = m.push(Vec3::new(c0, 0.0, s0), n0);
        let b = m.push(apex, nm);
        let c = m.push(Vec3::new(c1, 0.0, s1), n1);
        m.tri(a, b, c);
    }

    let center = m.push(Vec3::ZERO, Vec3::NEG_Y);
    let first = m.vertices.len() as u32;
    for i in 0..=segments {
        let (c, s) = circle_point(i, segments);
        m.push(Vec3::new(c, 0.0, s), Vec3::NEG_Y);
    }
    for i in 0..segments {
        m.tri(center, first + i, first + i + 1);
    }
    m
}

fn build_cylinder(segments: u32) -> TriMesh {
    let mut m = TriMesh::default();

    // Side: one bottom/top pair per ring vertex, seam duplicated.
    let side = m.vertices.len() as u32;
    for i in 0..=segments {
        let (c, s) = circle_point(i, segments);
        let n = Vec3::new(c, 0.0, s);
        m.push(Vec3::new(c, 0.0, s), n);
        m.push(Vec3::new(c, 1.0, s), n);
    }
    for i in 0..segments {
        let b0 = side + 2 * i;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        m.tri(b0, t0, b1);
        m.tri(t0, t1, b1);
    }

    // Caps.
    let bottom_center = m.push(Vec3::ZERO, Vec3::NEG_Y);
    let bottom = m.vertices.len() as u32;
    for i in 0..=segments {
        let (c, s) = circle_point(i, segments);
        m.push(Vec3::new(c, 0.0, s), Vec3::NEG_Y);
    }
    for i in 0..segments {
        m.tri(bottom_center, bottom + i, bottom + i + 1);
    }

    let top_center = m.push(Vec3::Y, Vec3::Y);
    let top = m.vertices.len() as u32;
    for i in 0..=segments {
        let (c, s) = circle_point(i, segments);
        m.push(Vec3::new(c, 1.0, s), Vec3::Y);
    }
    for i in 0..segments {
        m.tri(top_center, top + i + 1, top + i);
    }

    m
}

fn build_sphere(stacks: u32, slices: u32) -> TriMesh {
    let mut m = TriMesh::default();

    for i in 0..=stacks {
        let phi = PI * i as f32 / stacks as f32;
        let (sp, cp) = phi.sin_cos();
        for j in 0..=slices {
            let (c, s) = circle_point(j, slices);
            let p = Vec3::new(sp * c, cp, sp * s);
            m.push(p, p);
        }
    }

    let row = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            m.tri(a, a + 1, b);
            m.tri(a + 1, b + 1, b);
        }
    }
    m
}

fn build_sphere_wireframe(segments: u32) -> WireMesh {
    let mut w = WireMesh::default();

    // Three great circles: XY, XZ, YZ.
    let planes: [fn(f32, f32) -> Vec3; 3] = [
        |c, s| Vec3::new(c, s, 0.0),
        |c, s| Vec3::new(c, 0.0, s),
        |c, s| Vec3::new(0.0, c, s),
    ];

    for plane in planes {
        let first = w.positions.len() as u32;
        for i in 0..segments {
            let (c, s) = circle_point(i, segments);
            w.positions.push(plane(c, s));
        }
        for i in 0..segments {
            w.indices.push(first + i);
            w.indices.push(first + (i + 1) % segments);
        }
    }
    w
}
