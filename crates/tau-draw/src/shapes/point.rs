use glam::{Mat4, Vec3};

use crate::batch::{PointKey, PointVertex};
use crate::paint::Color4u;
use crate::state::DepthTest;

use super::ShapeRenderer;

impl ShapeRenderer {
    /// Single point of diameter `size` pixels in the current color.
    pub fn push_point(&mut self, p: Vec3, size: u32) {
        let (transform, color, depth_test) = self.states.top::<(Mat4, Color4u, DepthTest)>();
        self.points
            .bucket(PointKey { size, depth_test })
            .push(PointVertex::new(transform.transform_point3(p), color));
    }

    /// Points with their own colors; the current transform is applied to positions.
    pub fn push_points(&mut self, points: &[PointVertex], size: u32) {
        if points.is_empty() {
            return;
        }
        let (transform, depth_test) = self.states.top::<(Mat4, DepthTest)>();
        let bucket = self.points.bucket(PointKey { size, depth_test });

        if transform == Mat4::IDENTITY {
            bucket.extend_from_slice(points);
            return;
        }
        bucket.extend(points.iter().map(|v| PointVertex {
            p: transform.transform_point3(v.position()).to_array(),
            color: v.color,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_split_by_size_and_depth_test() {
        let mut r = ShapeRenderer::new();
        r.push_point(Vec3::ZERO, 4);
        r.push_states(DepthTest::False);
        r.push_point(Vec3::ZERO, 4);
        r.pop_states::<DepthTest>();
        r.push_point(Vec3::ZERO, 6);

        assert_eq!(r.points.buckets().count(), 3);
    }

    #[test]
    fn push_points_applies_transform_and_keeps_colors() {
        let mut r = ShapeRenderer::new();
        let pts = [PointVertex::new(Vec3::X, Color4u::ORANGE)];

        r.push_states((Mat4::from_translation(Vec3::Y), Color4u::WHITE));
        r.push_points(&pts, 4);
        r.pop_states::<(Mat4, Color4u)>();

        let (_, bucket) = r.points.buckets().next().unwrap();
        assert_eq!(bucket[0].p, [1.0, 1.0, 0.0]);
        assert_eq!(bucket[0].color, Color4u::ORANGE.0);
    }

    #[test]
    fn empty_push_points_creates_no_bucket() {
        let mut r = ShapeRenderer::new();
        r.push_points(&[], 4);
        assert!(r.points.is_empty());
        assert_eq!(r.points.buckets().count(), 0);
    }
}
