use glam::{Mat4, Vec3};

use crate::batch::{PolyVertex, Topology};
use crate::mesh::MeshVertex;
use crate::paint::Color4u;

use super::{append_tri_mesh, segment_frame, ArrowDescriptor, Ray, ShapeRenderer};

impl ShapeRenderer {
    /// Quad from four corners (CCW around `normal`).
    pub fn push_quad_points(&mut self, points: &[Vec3; 4], normal: Vec3) {
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        let n = super::normal_matrix(transform) * normal;
        let n = n.normalize_or_zero();

        self.polygons.append(key, |w| {
            for p in points {
                w.vertex(PolyVertex::new(transform.transform_point3(*p), n, color));
            }
            w.triangle(0, 1, 2);
            w.triangle(0, 2, 3);
        });
    }

    /// Unit quad in the XY plane ([-0.5, 0.5]), facing +Z.
    pub fn push_quad(&mut self) {
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        append_tri_mesh(&mut self.polygons, key, &self.meshes.quad, transform, color, false);
    }

    /// Unit cube ([-0.5, 0.5]^3).
    pub fn push_cube(&mut self) {
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        append_tri_mesh(&mut self.polygons, key, &self.meshes.cube, transform, color, false);
    }

    /// Cone of height `h` along +Y with base radius `r` at the origin.
    pub fn push_cone(&mut self, h: f32, r: f32, flip_normals: bool) {
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        let model = transform * Mat4::from_scale(Vec3::new(r, h, r));
        append_tri_mesh(&mut self.polygons, key, &self.meshes.cone, model, color, flip_normals);
    }

    /// Cone with its base centered at `from` and its apex at `to`.
    pub fn push_cone_between(&mut self, from: Vec3, to: Vec3, r: f32) {
        let Some((frame, len)) = segment_frame(from, to) else { return };
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        let model = transform * frame * Mat4::from_scale(Vec3::new(r, len, r));
        append_tri_mesh(&mut self.polygons, key, &self.meshes.cone, model, color, false);
    }

    /// Capped cylinder of `height` along +Y starting at the origin.
    pub fn push_cylinder(&mut self, height: f32, radius: f32, ray: Option<&Ray>) {
        let _ = ray;
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        let model = transform * Mat4::from_scale(Vec3::new(radius, height, radius));
        append_tri_mesh(&mut self.polygons, key, &self.meshes.cylinder, model, color, false);
    }

    /// Ellipsoid with vertical semi-axis `h` and horizontal radius `r`, centered.
    pub fn push_sphere(&mut self, h: f32, r: f32) {
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);
        let model = transform * Mat4::from_scale(Vec3::new(r, h, r));
        append_tri_mesh(&mut self.polygons, key, &self.meshes.sphere, model, color, false);
    }

    /// Arrow from `from` to `to`: cylinder shaft plus cone head.
    pub fn push_arrow(&mut self, from: Vec3, to: Vec3, desc: ArrowDescriptor, ray: Option<&Ray>) {
        let _ = ray;
        let Some((frame, len)) = segment_frame(from, to) else { return };
        let (transform, color, key) = self.polygon_state(Topology::TriangleList);

        let cone_len = len * desc.cone_fraction.clamp(0.0, 1.0);
        let shaft_len = len - cone_len;
        let base = transform * frame;

        if shaft_len > 0.0 {
            let shaft = base
                * Mat4::from_scale(Vec3::new(desc.cylinder_radius, shaft_len, desc.cylinder_radius));
            append_tri_mesh(&mut self.polygons, key, &self.meshes.cylinder, shaft, color, false);
        }
        if cone_len > 0.0 {
            let head = base
                * Mat4::from_translation(Vec3::new(0.0, shaft_len, 0.0))
                * Mat4::from_scale(Vec3::new(desc.cone_radius, cone_len, desc.cone_radius));
            append_tri_mesh(&mut self.polygons, key, &self.meshes.cone, head, color, false);
        }
    }

    /// Arrows along the X/Y/Z columns of `basis` (red/lime/blue), from its translation.
    pub fn push_basis(
        &mut self,
        basis: &Mat4,
        arrow_len: f32,
        desc: &ArrowDescriptor,
        ray: Option<&Ray>,
    ) {
        let origin = basis.w_axis.truncate();
        let axes = [
            (basis.x_axis.truncate(), Color4u::RED),
            (basis.y_axis.truncate(), Color4u::LIME),
            (basis.z_axis.truncate(), Color4u::BLUE),
        ];

        for (axis, color) in axes {
            self.push_states(color);
            self.push_arrow(origin, origin + axis.normalize_or_zero() * arrow_len, *desc, ray);
            self.pop_states::<Color4u>();
        }
    }

    /// Arbitrary mesh under a caller-chosen topology.
    ///
    /// Indices are local to `vertices`. Strip topologies are drawn as submitted, one
    /// draw call per push. Triangles naming a vertex outside `vertices` are
    /// skipped; a strip ends at its first such index.
    pub fn push_mesh(&mut self, vertices: &[MeshVertex], indices: &[u32], topology: Topology) {
        let n = vertices.len() as u32;
        debug_assert!(indices.iter().all(|&i| i < n), "mesh index out of range");

        let (transform, color, key) = self.polygon_state(topology);
        let nm = super::normal_matrix(transform);
        let indices = super::checked_indices(indices, n, topology);

        self.polygons.append(key, |w| {
            for v in vertices {
                let p = transform.transform_point3(v.p);
                w.vertex(PolyVertex::new(p, (nm * v.normal).normalize_or_zero(), color));
            }
            for &i in &indices {
                w.index(i);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::batch::DrawKey;
    use crate::render::RecordingBackend;
    use crate::state::BackfaceCull;

    #[test]
    fn arrow_pushes_shaft_and_head_as_separate_ranges() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();
        r.push_arrow(Vec3::ZERO, Vec3::X, ArrowDescriptor::default(), None);
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 2);
    }

    #[test]
    fn degenerate_arrow_pushes_nothing() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();
        r.push_arrow(Vec3::ONE, Vec3::ONE, ArrowDescriptor::default(), None);
        r.push_cone_between(Vec3::ZERO, Vec3::ZERO, 1.0);
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 0);
    }

    #[test]
    fn basis_restores_color_state() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();
        r.push_states(Color4u::GOLD);
        r.push_basis(&Mat4::IDENTITY, 1.0, &ArrowDescriptor::default(), None);
        assert_eq!(r.get_states::<Color4u>(), Color4u::GOLD);
        r.pop_states::<Color4u>();

        // Three arrows, two ranges each.
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 6);
    }

    #[test]
    fn cone_apex_is_scaled_by_height() {
        let mut r = ShapeRenderer::new();
        r.push_cone(3.0, 0.5, false);
        let top = r
            .polygons
            .vertices()
            .iter()
            .map(|v| v.p[1])
            .fold(f32::MIN, f32::max);
        assert_relative_eq!(top, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn flipped_cone_normals_point_inward() {
        let mut r = ShapeRenderer::new();
        r.push_cone(1.0, 1.0, true);
        // Base cap normals face -Y normally; flipped they face +Y.
        let cap = r.polygons.vertices().last().unwrap();
        assert_relative_eq!(cap.normal[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn mesh_keeps_requested_topology_and_cull_state() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();
        let verts = [
            MeshVertex { p: Vec3::ZERO, normal: Vec3::Z },
            MeshVertex { p: Vec3::X, normal: Vec3::Z },
            MeshVertex { p: Vec3::Y, normal: Vec3::Z },
            MeshVertex { p: Vec3::ONE, normal: Vec3::Z },
        ];

        r.push_states(BackfaceCull::False);
        r.push_mesh(&verts, &[0, 1, 2, 3], Topology::TriangleStrip);
        r.pop_states::<BackfaceCull>();

        r.render(&mut backend, Mat4::IDENTITY);
        let DrawKey::Polygon(key) = backend.calls[0].key else { panic!("expected polygon") };
        assert_eq!(key.topology, Topology::TriangleStrip);
        assert_eq!(key.cull_face, BackfaceCull::False);
        assert_eq!(backend.calls[0].range, 0..4);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "mesh index out of range"))]
    fn mesh_indices_never_reach_past_their_vertices() {
        let mut r = ShapeRenderer::new();
        r.push_cube();
        let before = r.polygons.indices().len();

        let v = MeshVertex { p: Vec3::ZERO, normal: Vec3::Y };
        r.push_mesh(&[v, v, v], &[0, 1, 2, 0, 0, 3], Topology::TriangleList);

        let cube_vertices = r.polygons.vertices().len() as u32 - 3;
        assert_eq!(
            &r.polygons.indices()[before..],
            &[cube_vertices, cube_vertices + 1, cube_vertices + 2]
        );
        let n = r.polygons.vertices().len() as u32;
        assert!(r.polygons.indices().iter().all(|&i| i < n));
    }

    #[test]
    fn quad_points_use_given_corners() {
        let mut r = ShapeRenderer::new();
        let corners = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        r.push_quad_points(&corners, Vec3::Z);
        assert_eq!(r.polygons.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(r.polygons.vertices()[2].p, [1.0, 1.0, 0.0]);
    }
}
