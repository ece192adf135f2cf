//! Immediate-mode shape renderer (the batching core).
//!
//! Usage per frame:
//! 1. scope overrides with `push_states(..)` / `pop_states::<..>()`
//! 2. call any number of `push_*` operations
//! 3. `render(backend, view_projection)` to submit every batch
//! 4. `post_render()` to drop the frame's geometry
//!
//! Every push reads the current transform/color/depth-test/cull tops, bakes the
//! transform and color into the vertices, and appends them to the batch selected
//! by the render-state key. Nothing is retained across frames except unit meshes
//! and client-side array capacity.
//!
//! Extending:
//! - polygon shapes go in `polygon.rs`, line shapes in `line.rs`, points in `point.rs`
//! - each file adds `push_*` methods to `ShapeRenderer`

mod line;
mod point;
mod polygon;

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::batch::{
    FrameAssembler, LineBatches, LineKey, LineVertex, PointBatches, PointVertex, PolyVertex,
    PolygonBatches, PolygonKey, Topology,
};
use crate::mesh::{TriMesh, UnitMeshConfig, UnitMeshes, WireMesh};
use crate::paint::Color4u;
use crate::render::DrawBackend;
use crate::state::{BackfaceCull, DepthTest, StateGroup, StateStack};

/// Opaque picking hint accepted by some push operations. Currently unused by batching.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Arrow proportions.
///
/// `cone_fraction` is relative to the arrow length; radii are absolute.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArrowDescriptor {
    pub cone_fraction: f32,
    pub cone_radius: f32,
    pub cylinder_radius: f32,
}

impl Default for ArrowDescriptor {
    fn default() -> Self {
        Self {
            cone_fraction: 0.25,
            cone_radius: 0.15,
            cylinder_radius: 0.025,
        }
    }
}

/// Point-ingestion contract used by point producers such as `ParticleBuffer`.
pub trait PointSink {
    /// Appends `points` (position + color) as points of diameter `size` pixels.
    fn push_points(&mut self, points: &[PointVertex], size: u32);
}

/// Batching renderer for debug geometry.
pub struct ShapeRenderer {
    states: StateStack,
    meshes: UnitMeshes,

    lines: LineBatches,
    polygons: PolygonBatches,
    points: PointBatches,

    assembler: FrameAssembler,
}

impl ShapeRenderer {
    pub fn new() -> Self {
        Self::with_config(&UnitMeshConfig::default())
    }

    pub fn with_config(config: &UnitMeshConfig) -> Self {
        Self {
            states: StateStack::new(),
            meshes: UnitMeshes::new(config),
            lines: LineBatches::default(),
            polygons: PolygonBatches::default(),
            points: PointBatches::default(),
            assembler: FrameAssembler::default(),
        }
    }

    // ── state scoping ─────────────────────────────────────────────────────

    /// Pushes render-state overrides (a single value or a tuple).
    #[inline]
    pub fn push_states<G: StateGroup>(&mut self, values: G) {
        self.states.push(values);
    }

    /// Pops the overrides for each type in `G`.
    ///
    /// # Panics
    /// Panics if a stack would lose its default entry.
    #[inline]
    pub fn pop_states<G: StateGroup>(&mut self) {
        self.states.pop::<G>();
    }

    /// Current values for each type in `G`.
    #[inline]
    pub fn get_states<G: StateGroup>(&self) -> G::Tops {
        self.states.top::<G>()
    }

    #[inline]
    pub fn states(&self) -> &StateStack {
        &self.states
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    /// Submits every populated batch to `backend` and returns the number of draw calls.
    ///
    /// One call per line key, one per polygon range, one per point key. Order across
    /// keys follows table iteration and is unspecified. With nothing pushed, the
    /// backend is not invoked and 0 is returned.
    pub fn render<B>(&mut self, backend: &mut B, view_projection: Mat4) -> usize
    where
        B: DrawBackend + ?Sized,
    {
        let frame =
            self.assembler
                .assemble(view_projection, &self.lines, &self.polygons, &self.points);

        let draw_calls = frame.draw_calls.len();
        if draw_calls > 0 {
            backend.submit(&frame);
        }

        log::trace!(
            "{} draw calls ({} line / {} polygon / {} point vertices)",
            draw_calls,
            frame.line_vertices.len(),
            frame.polygon_vertices.len(),
            frame.point_vertices.len(),
        );

        draw_calls
    }

    /// Drops all geometry pushed this frame. Unit meshes and capacities are kept.
    pub fn post_render(&mut self) {
        self.lines.clear();
        self.polygons.clear();
        self.points.clear();
    }

    // ── shared helpers ────────────────────────────────────────────────────

    fn line_state(&self) -> (Mat4, Color4u, LineKey) {
        let (transform, color, depth_test) = self.states.top::<(Mat4, Color4u, DepthTest)>();
        (transform, color, LineKey::lines(depth_test))
    }

    fn polygon_state(&self, topology: Topology) -> (Mat4, Color4u, PolygonKey) {
        let (transform, color, depth_test, cull_face) =
            self.states
                .top::<(Mat4, Color4u, DepthTest, BackfaceCull)>();
        (transform, color, PolygonKey { topology, depth_test, cull_face })
    }
}

impl Default for ShapeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PointSink for ShapeRenderer {
    #[inline]
    fn push_points(&mut self, points: &[PointVertex], size: u32) {
        ShapeRenderer::push_points(self, points, size);
    }
}

/// Inverse-transpose of the upper 3x3, falling back to the plain 3x3 when singular.
fn normal_matrix(model: Mat4) -> Mat3 {
    let m = Mat3::from_mat4(model);
    if m.determinant().abs() > f32::EPSILON {
        m.inverse().transpose()
    } else {
        m
    }
}

/// Rotation + translation taking +Y at the origin onto the segment `from → to`.
///
/// Returns `None` for a zero-length segment.
fn segment_frame(from: Vec3, to: Vec3) -> Option<(Mat4, f32)> {
    let d = to - from;
    let len = d.length();
    if len <= f32::EPSILON {
        return None;
    }
    let rotation = Quat::from_rotation_arc(Vec3::Y, d / len);
    Some((Mat4::from_rotation_translation(rotation, from), len))
}

/// Appends a transformed copy of `mesh` as one polygon range.
fn append_tri_mesh(
    polygons: &mut PolygonBatches,
    key: PolygonKey,
    mesh: &TriMesh,
    model: Mat4,
    color: Color4u,
    flip_normals: bool,
) {
    let nm = normal_matrix(model);
    let sign = if flip_normals { -1.0 } else { 1.0 };

    polygons.append(key, |w| {
        for v in &mesh.vertices {
            let p = model.transform_point3(v.p);
            let n = (nm * v.normal).normalize_or_zero() * sign;
            w.vertex(PolyVertex::new(p, n, color));
        }
        for &i in &mesh.indices {
            w.index(i);
        }
    });
}

/// Caller-supplied indices that stay inside a vertex list of length `n`.
///
/// List topologies drop any primitive naming an out-of-range vertex, plus a
/// trailing partial primitive. Strips are cut at the first bad index, since
/// every later triangle depends on it.
fn checked_indices(indices: &[u32], n: u32, topology: Topology) -> Vec<u32> {
    let arity = match topology {
        Topology::LineList => 2,
        Topology::TriangleList => 3,
        Topology::TriangleStrip => {
            return indices.iter().copied().take_while(|&i| i < n).collect();
        }
    };
    indices
        .chunks_exact(arity)
        .filter(|prim| prim.iter().all(|&i| i < n))
        .flatten()
        .copied()
        .collect()
}

/// Appends a transformed copy of a wire mesh into a line bucket.
fn append_wire_mesh(
    lines: &mut LineBatches,
    key: LineKey,
    mesh: &WireMesh,
    model: Mat4,
    color: Color4u,
) {
    lines.append(key, |w| {
        let mut first = None;
        for p in &mesh.positions {
            let i = w.vertex(LineVertex::new(model.transform_point3(*p), color));
            first.get_or_insert(i);
        }
        let Some(base) = first else { return };
        for pair in mesh.indices.chunks_exact(2) {
            w.segment(base + pair[0], base + pair[1]);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::DrawKey;
    use crate::render::RecordingBackend;

    // ── index checking ────────────────────────────────────────────────────

    #[test]
    fn checked_indices_drops_bad_pairs() {
        assert_eq!(checked_indices(&[0, 1, 0, 5, 1, 0], 2, Topology::LineList), vec![0, 1, 1, 0]);
    }

    #[test]
    fn checked_indices_drops_bad_and_partial_triangles() {
        let idx = [0, 1, 2, 0, 0, 3, 2, 1, 0, 1];
        assert_eq!(checked_indices(&idx, 3, Topology::TriangleList), vec![0, 1, 2, 2, 1, 0]);
    }

    #[test]
    fn checked_indices_cuts_strip_at_first_bad_index() {
        assert_eq!(checked_indices(&[0, 1, 2, 9, 3], 4, Topology::TriangleStrip), vec![0, 1, 2]);
    }

    // ── render / post_render ──────────────────────────────────────────────

    #[test]
    fn one_draw_per_line_key() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();

        r.push_line(Vec3::ZERO, Vec3::X);
        r.push_line(Vec3::ZERO, Vec3::Y);
        r.push_cube_wireframe();
        r.push_states(DepthTest::False);
        r.push_line(Vec3::ZERO, Vec3::Z);
        r.pop_states::<DepthTest>();

        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 2);
        assert_eq!(backend.calls.len(), 2);
        assert!(backend.calls.iter().all(|c| matches!(c.key, DrawKey::Line(_))));
    }

    #[test]
    fn one_draw_per_polygon_range_even_with_shared_key() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();

        r.push_cube();
        r.push_quad();
        r.push_sphere(1.0, 1.0);

        // Three ranges, one key.
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 3);
        let keys: Vec<_> = backend.calls.iter().map(|c| c.key).collect();
        assert!(keys.iter().all(|k| *k == keys[0]));
    }

    #[test]
    fn one_draw_per_point_key() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();

        r.push_point(Vec3::ZERO, 4);
        r.push_point(Vec3::X, 4);
        r.push_point(Vec3::Y, 8);

        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 2);
        assert_eq!(backend.point_vertices.len(), 3);
    }

    #[test]
    fn post_render_then_render_issues_nothing() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();

        r.push_cube();
        r.push_line(Vec3::ZERO, Vec3::X);
        r.push_point(Vec3::ZERO, 2);
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 3);

        r.post_render();
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 0);
        assert_eq!(backend.submits, 1);
    }

    #[test]
    fn mixed_classes_sum_their_draws() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();

        r.push_cube(); // polygon range 1
        r.push_states(BackfaceCull::False);
        r.push_cube(); // polygon range 2 (different key)
        r.pop_states::<BackfaceCull>();
        r.push_line(Vec3::ZERO, Vec3::X); // line key
        r.push_point(Vec3::ZERO, 4); // point key

        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 4);
    }

    // ── state baking ──────────────────────────────────────────────────────

    #[test]
    fn transform_and_color_are_baked_at_push_time() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();

        r.push_states((Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)), Color4u::RED));
        r.push_point(Vec3::ZERO, 4);
        r.pop_states::<(Mat4, Color4u)>();
        // Later state changes do not affect geometry already pushed.
        r.push_states(Color4u::BLUE);

        r.render(&mut backend, Mat4::IDENTITY);
        let p = backend.point_vertices[0];
        assert_eq!(p.p, [5.0, 0.0, 0.0]);
        assert_eq!(p.color, Color4u::RED.0);
        r.pop_states::<Color4u>();
    }

    #[test]
    fn scoped_overrides_leave_defaults_intact() {
        let mut r = ShapeRenderer::new();
        r.push_states((DepthTest::False, BackfaceCull::False));
        r.push_cube();
        r.pop_states::<(DepthTest, BackfaceCull)>();
        assert_eq!(
            r.get_states::<(DepthTest, BackfaceCull)>(),
            (DepthTest::True, BackfaceCull::True)
        );
    }

    #[test]
    fn point_sink_forwards_to_point_batches() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();
        let pts = [
            PointVertex::new(Vec3::ZERO, Color4u::RED),
            PointVertex::new(Vec3::ONE, Color4u::LIME),
        ];

        PointSink::push_points(&mut r, &pts, 4);

        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 1);
        assert_eq!(backend.point_vertices, pts.to_vec());
    }

    #[test]
    fn segment_frame_maps_y_onto_segment() {
        let (m, len) = segment_frame(Vec3::ONE, Vec3::new(1.0, 1.0, 4.0)).unwrap();
        assert!((len - 3.0).abs() < 1e-6);
        let tip = m.transform_point3(Vec3::Y * len);
        assert!(tip.distance(Vec3::new(1.0, 1.0, 4.0)) < 1e-5);
        assert!(segment_frame(Vec3::ONE, Vec3::ONE).is_none());
    }
}
