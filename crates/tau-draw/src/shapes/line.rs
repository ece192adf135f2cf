use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

use crate::batch::{LineVertex, Topology};
use crate::paint::Color4u;

use super::{append_wire_mesh, checked_indices, segment_frame, ShapeRenderer};

/// Cube corners indexed by bit pattern (bit 0 = x, bit 1 = y, bit 2 = z).
fn cube_corner(i: u32) -> Vec3 {
    Vec3::new(
        if i & 1 != 0 { 0.5 } else { -0.5 },
        if i & 2 != 0 { 0.5 } else { -0.5 },
        if i & 4 != 0 { 0.5 } else { -0.5 },
    )
}

impl ShapeRenderer {
    /// Outline of the unit quad.
    pub fn push_quad_wireframe(&mut self) {
        let (transform, color, key) = self.line_state();
        let corners = [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ];

        self.lines.append(key, |w| {
            let first = w.vertex(LineVertex::new(transform.transform_point3(corners[0]), color));
            for c in &corners[1..] {
                w.vertex(LineVertex::new(transform.transform_point3(*c), color));
            }
            for i in 0..4 {
                w.segment(first + i, first + (i + 1) % 4);
            }
        });
    }

    /// The 12 edges of the unit cube.
    pub fn push_cube_wireframe(&mut self) {
        let (transform, color, key) = self.line_state();

        self.lines.append(key, |w| {
            let mut first = 0;
            for i in 0..8 {
                let idx = w.vertex(LineVertex::new(transform.transform_point3(cube_corner(i)), color));
                if i == 0 {
                    first = idx;
                }
            }
            // Edges join corners that differ in exactly one axis bit.
            for i in 0..8u32 {
                for bit in [1u32, 2, 4] {
                    if i & bit == 0 {
                        w.segment(first + i, first + (i | bit));
                    }
                }
            }
        });
    }

    /// Three great circles of an ellipsoid with vertical semi-axis `h` and radius `r`.
    pub fn push_sphere_wireframe(&mut self, h: f32, r: f32) {
        let (transform, color, key) = self.line_state();
        let model = transform * Mat4::from_scale(Vec3::new(r, h, r));
        append_wire_mesh(&mut self.lines, key, &self.meshes.sphere_wireframe, model, color);
    }

    /// Unit circle in the XY plane through `n` vertices (`n - 1` segments).
    pub fn push_circle_ring(&mut self, n: u32) {
        if n < 2 {
            return;
        }
        let (transform, color, key) = self.line_state();
        let ring = self.meshes.ring(n);

        self.lines.append(key, |w| {
            let mut prev = None;
            for p in ring {
                let i = w.vertex(LineVertex::new(transform.transform_point3(*p), color));
                if let Some(j) = prev {
                    w.segment(j, i);
                }
                prev = Some(i);
            }
        });
    }

    pub fn push_line(&mut self, p0: Vec3, p1: Vec3) {
        let (transform, color, key) = self.line_state();
        self.lines.append(key, |w| {
            w.line(
                LineVertex::new(transform.transform_point3(p0), color),
                LineVertex::new(transform.transform_point3(p1), color),
            );
        });
    }

    /// Segments between consecutive pairs: `(v0, v1)`, `(v2, v3)`, ...
    ///
    /// A trailing unpaired vertex is ignored.
    pub fn push_lines(&mut self, vertices: &[Vec3]) {
        let (transform, color, key) = self.line_state();
        self.lines.append(key, |w| {
            for pair in vertices.chunks_exact(2) {
                w.line(
                    LineVertex::new(transform.transform_point3(pair[0]), color),
                    LineVertex::new(transform.transform_point3(pair[1]), color),
                );
            }
        });
    }

    /// Indexed segments; `indices` are pairs of positions in `vertices`.
    ///
    /// A pair naming a vertex outside `vertices` is skipped.
    pub fn push_lines_indexed(&mut self, vertices: &[Vec3], indices: &[u32]) {
        let n = vertices.len() as u32;
        debug_assert!(indices.iter().all(|&i| i < n), "line index out of range");

        let (transform, color, key) = self.line_state();
        self.lines.append(key, |w| {
            let mut base = None;
            for p in vertices {
                let i = w.vertex(LineVertex::new(transform.transform_point3(*p), color));
                base.get_or_insert(i);
            }
            let Some(base) = base else { return };
            for pair in checked_indices(indices, n, Topology::LineList).chunks_exact(2) {
                w.segment(base + pair[0], base + pair[1]);
            }
        });
    }

    /// Connected segments through `nbr_vertices` consecutive entries of a ring buffer.
    ///
    /// Reads `vertices[(start_index + i) % max_vertices]` for `i in 0..nbr_vertices`, so a
    /// wrapped trail history can be drawn without linearizing it. Emits
    /// `nbr_vertices - 1` segments. Vertex colors come from the source; the current
    /// transform is applied to positions.
    ///
    /// # Panics
    /// Panics if `vertices` is shorter than `max_vertices`. `nbr_vertices` is
    /// clamped to `max_vertices`, so no source vertex is drawn twice.
    pub fn push_lines_from_cyclic_source(
        &mut self,
        vertices: &[LineVertex],
        start_index: usize,
        nbr_vertices: usize,
        max_vertices: usize,
    ) {
        assert!(
            vertices.len() >= max_vertices,
            "cyclic source holds {} vertices, ring size is {max_vertices}",
            vertices.len()
        );
        let nbr_vertices = nbr_vertices.min(max_vertices);
        if nbr_vertices < 2 {
            return;
        }

        let (transform, _, key) = self.line_state();
        self.lines.append(key, |w| {
            let mut prev = None;
            for i in 0..nbr_vertices {
                let src = vertices[(start_index + i) % max_vertices];
                let p = transform.transform_point3(src.position());
                let idx = w.vertex(LineVertex { p: p.to_array(), color: src.color });
                if let Some(j) = prev {
                    w.segment(j, idx);
                }
                prev = Some(idx);
            }
        });
    }

    /// Square grid in the XZ plane centered at `pos`, `size` units across with
    /// `resolution` cells per side.
    pub fn push_grid(&mut self, pos: Vec3, size: u32, resolution: u32) {
        let (transform, color, key) = self.line_state();
        let cells = resolution.max(1);
        let half = size as f32 * 0.5;
        let step = size as f32 / cells as f32;

        self.lines.append(key, |w| {
            for i in 0..=cells {
                let t = -half + i as f32 * step;
                let segs = [
                    (Vec3::new(t, 0.0, -half), Vec3::new(t, 0.0, half)),
                    (Vec3::new(-half, 0.0, t), Vec3::new(half, 0.0, t)),
                ];
                for (a, b) in segs {
                    w.line(
                        LineVertex::new(transform.transform_point3(pos + a), color),
                        LineVertex::new(transform.transform_point3(pos + b), color),
                    );
                }
            }
        });
    }

    /// Coil along +Y of the given `length`: an outer spiral of radius `r_outer` and an
    /// inner spiral of radius `r_inner`, both turning `revs` times.
    pub fn push_helix(&mut self, length: f32, r_outer: f32, r_inner: f32, revs: f32) {
        const SEGMENTS_PER_REV: f32 = 32.0;

        let (transform, color, key) = self.line_state();
        let segments = (revs.abs() * SEGMENTS_PER_REV).ceil().max(2.0) as u32;

        self.lines.append(key, |w| {
            for radius in [r_outer, r_inner] {
                let mut prev = None;
                for i in 0..=segments {
                    let t = i as f32 / segments as f32;
                    let theta = t * revs * TAU;
                    let p = Vec3::new(radius * theta.cos(), t * length, radius * theta.sin());
                    let idx = w.vertex(LineVertex::new(transform.transform_point3(p), color));
                    if let Some(j) = prev {
                        w.segment(j, idx);
                    }
                    prev = Some(idx);
                }
            }
        });
    }

    /// Helix whose axis runs from `from` to `to`.
    pub fn push_helix_between(
        &mut self,
        from: Vec3,
        to: Vec3,
        r_outer: f32,
        r_inner: f32,
        revs: f32,
    ) {
        let Some((frame, len)) = segment_frame(from, to) else { return };
        let transform = self.get_states::<Mat4>();

        self.push_states(transform * frame);
        self.push_helix(len, r_outer, r_inner, revs);
        self.pop_states::<Mat4>();
    }

    /// Edges of the view volume described by `inv_proj_view` (NDC depth in [0, 1]).
    pub fn push_frustum(&mut self, inv_proj_view: &Mat4) {
        let (transform, color, key) = self.line_state();

        self.lines.append(key, |w| {
            let mut first = 0;
            for i in 0..8u32 {
                let ndc = Vec3::new(
                    if i & 1 != 0 { 1.0 } else { -1.0 },
                    if i & 2 != 0 { 1.0 } else { -1.0 },
                    if i & 4 != 0 { 1.0 } else { 0.0 },
                );
                let world = transform.transform_point3(inv_proj_view.project_point3(ndc));
                let idx = w.vertex(LineVertex::new(world, color));
                if i == 0 {
                    first = idx;
                }
            }
            for i in 0..8u32 {
                for bit in [1u32, 2, 4] {
                    if i & bit == 0 {
                        w.segment(first + i, first + (i | bit));
                    }
                }
            }
        });
    }

    /// X/Y/Z axes of `basis` as red/lime/blue lines of length `arrow_len`.
    pub fn push_basis_basic(&mut self, basis: &Mat4, arrow_len: f32) {
        self.push_basis_lines(basis, arrow_len, 3);
    }

    /// X/Y axes of `basis` only.
    pub fn push_basis_basic_2d(&mut self, basis: &Mat4, arrow_len: f32) {
        self.push_basis_lines(basis, arrow_len, 2);
    }

    fn push_basis_lines(&mut self, basis: &Mat4, arrow_len: f32, nbr_axes: usize) {
        let (transform, _, key) = self.line_state();
        let origin = basis.w_axis.truncate();
        let axes = [
            (basis.x_axis.truncate(), Color4u::RED),
            (basis.y_axis.truncate(), Color4u::LIME),
            (basis.z_axis.truncate(), Color4u::BLUE),
        ];

        self.lines.append(key, |w| {
            for (axis, color) in axes.into_iter().take(nbr_axes) {
                let tip = origin + axis.normalize_or_zero() * arrow_len;
                w.line(
                    LineVertex::new(transform.transform_point3(origin), color),
                    LineVertex::new(transform.transform_point3(tip), color),
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::batch::LineKey;
    use crate::render::RecordingBackend;
    use crate::state::DepthTest;

    fn bucket(r: &ShapeRenderer) -> Vec<u32> {
        r.lines
            .buckets()
            .find(|(k, _)| **k == LineKey::lines(DepthTest::True))
            .map(|(_, b)| b.to_vec())
            .unwrap_or_default()
    }

    fn trail(n: usize) -> Vec<LineVertex> {
        (0..n)
            .map(|i| LineVertex::new(Vec3::new(i as f32, 0.0, 0.0), Color4u::from_rgba8(i as u8, 0, 0, 255)))
            .collect()
    }

    // ── cyclic source ─────────────────────────────────────────────────────

    #[test]
    fn cyclic_source_wraps_read_index() {
        let mut r = ShapeRenderer::new();
        let ring = trail(8);

        // Start near the end so the read wraps: 6, 7, 0, 1, 2.
        r.push_lines_from_cyclic_source(&ring, 6, 5, 8);

        let xs: Vec<f32> = r.lines.vertices().iter().map(|v| v.p[0]).collect();
        assert_eq!(xs, vec![6.0, 7.0, 0.0, 1.0, 2.0]);
        assert_eq!(bucket(&r), vec![0, 1, 1, 2, 2, 3, 3, 4]);
    }

    #[test]
    fn cyclic_source_emits_n_minus_one_segments_with_source_colors() {
        let mut r = ShapeRenderer::new();
        let ring = trail(16);
        r.push_states(Color4u::BLUE);
        r.push_lines_from_cyclic_source(&ring, 3, 10, 16);
        r.pop_states::<Color4u>();

        assert_eq!(bucket(&r).len(), 2 * 9);
        assert_eq!(r.lines.vertices()[0].color, ring[3].color);
    }

    #[test]
    fn cyclic_source_with_fewer_than_two_vertices_is_noop() {
        let mut r = ShapeRenderer::new();
        let mut backend = RecordingBackend::default();
        let ring = trail(4);
        r.push_lines_from_cyclic_source(&ring, 2, 1, 4);
        r.push_lines_from_cyclic_source(&ring, 0, 0, 4);
        assert_eq!(r.render(&mut backend, Mat4::IDENTITY), 0);
    }

    // ── shapes ────────────────────────────────────────────────────────────

    #[test]
    fn cube_wireframe_has_twelve_edges() {
        let mut r = ShapeRenderer::new();
        r.push_cube_wireframe();
        assert_eq!(bucket(&r).len(), 24);
        assert_eq!(r.lines.vertices().len(), 8);
    }

    #[test]
    fn circle_ring_emits_n_minus_one_segments() {
        let mut r = ShapeRenderer::new();
        r.push_circle_ring(33);
        assert_eq!(bucket(&r).len(), 2 * 32);
    }

    #[test]
    fn grid_line_count() {
        let mut r = ShapeRenderer::new();
        r.push_grid(Vec3::ZERO, 10, 5);
        // 6 lines per axis, 2 indices each.
        assert_eq!(bucket(&r).len(), 2 * 2 * 6);
    }

    #[test]
    fn lines_ignore_trailing_vertex() {
        let mut r = ShapeRenderer::new();
        r.push_lines(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(bucket(&r), vec![0, 1]);
    }

    #[test]
    fn indexed_lines_are_rebased() {
        let mut r = ShapeRenderer::new();
        r.push_line(Vec3::ZERO, Vec3::X);
        r.push_lines_indexed(&[Vec3::ZERO, Vec3::Y, Vec3::Z], &[0, 2, 2, 1]);
        assert_eq!(bucket(&r), vec![0, 1, 2, 4, 4, 3]);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "line index out of range"))]
    fn indexed_lines_skip_pairs_past_the_vertex_list() {
        let mut r = ShapeRenderer::new();
        r.push_lines_indexed(&[Vec3::ZERO, Vec3::X], &[0, 1]);
        r.push_lines_indexed(&[Vec3::Y, Vec3::Z], &[0, 5, 1, 0]);

        assert_eq!(bucket(&r), vec![0, 1, 3, 2]);
        assert!(bucket(&r).iter().all(|&i| (i as usize) < r.lines.vertices().len()));
    }

    #[test]
    fn cyclic_source_clamps_count_to_ring_size() {
        let mut r = ShapeRenderer::new();
        let ring = trail(4);

        r.push_lines_from_cyclic_source(&ring, 1, 9, 4);

        let xs: Vec<f32> = r.lines.vertices().iter().map(|v| v.p[0]).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0, 0.0]);
        assert_eq!(bucket(&r).len(), 6);
    }

    #[test]
    #[should_panic(expected = "ring size is 8")]
    fn cyclic_source_shorter_than_ring_panics() {
        let mut r = ShapeRenderer::new();
        r.push_lines_from_cyclic_source(&trail(4), 0, 2, 8);
    }

    #[test]
    fn frustum_of_identity_is_ndc_box() {
        let mut r = ShapeRenderer::new();
        r.push_frustum(&Mat4::IDENTITY);
        let v = r.lines.vertices();
        assert_eq!(v.len(), 8);
        assert_eq!(v[7].p, [1.0, 1.0, 1.0]);
        assert_eq!(v[0].p, [-1.0, -1.0, 0.0]);
        assert_eq!(bucket(&r).len(), 24);
    }

    #[test]
    fn helix_between_spans_segment_and_restores_transform() {
        let mut r = ShapeRenderer::new();
        r.push_helix_between(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 0.5, 0.25, 2.0);
        assert_eq!(r.get_states::<Mat4>(), Mat4::IDENTITY);

        let last_outer = r.lines.vertices()[64];
        assert_relative_eq!(last_outer.p[2], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn basis_basic_2d_draws_two_axes() {
        let mut r = ShapeRenderer::new();
        r.push_basis_basic_2d(&Mat4::IDENTITY, 2.0);
        let v = r.lines.vertices();
        assert_eq!(v.len(), 4);
        assert_eq!(v[1].p, [2.0, 0.0, 0.0]);
        assert_eq!(v[3].color, Color4u::LIME.0);
    }
}
