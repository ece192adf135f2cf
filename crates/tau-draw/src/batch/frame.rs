use std::ops::Range;

use glam::Mat4;

use super::{
    DrawKey, LineBatches, LineVertex, PointBatches, PointVertex, PolyVertex, PolygonBatches,
};

/// One draw call.
///
/// `range` addresses:
/// - `DrawKey::Line`: [`FrameBatches::line_indices`]
/// - `DrawKey::Polygon`: [`FrameBatches::polygon_indices`]
/// - `DrawKey::Point`: [`FrameBatches::point_vertices`] (one instance per point)
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub key: DrawKey,
    pub range: Range<u32>,
}

/// Everything a backend needs for one frame: contiguous upload data plus the
/// ordered list of draw calls into it.
#[derive(Debug, Clone, Copy)]
pub struct FrameBatches<'a> {
    pub view_projection: Mat4,
    pub line_vertices: &'a [LineVertex],
    pub line_indices: &'a [u32],
    pub polygon_vertices: &'a [PolyVertex],
    pub polygon_indices: &'a [u32],
    pub point_vertices: &'a [PointVertex],
    pub draw_calls: &'a [DrawCall],
}

impl FrameBatches<'_> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draw_calls.is_empty()
    }
}

/// Reusable client-side arrays used to flatten per-key buckets for upload.
///
/// Capacity grows with the largest frame seen and is never released.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    line_indices: Vec<u32>,
    point_vertices: Vec<PointVertex>,
    draw_calls: Vec<DrawCall>,
}

impl FrameAssembler {
    /// Flattens the three tables into one [`FrameBatches`].
    ///
    /// Emits one call per non-empty line bucket, one per polygon range and one per
    /// non-empty point bucket, in table order.
    pub fn assemble<'a>(
        &'a mut self,
        view_projection: Mat4,
        lines: &'a LineBatches,
        polygons: &'a PolygonBatches,
        points: &'a PointBatches,
    ) -> FrameBatches<'a> {
        self.line_indices.clear();
        self.point_vertices.clear();
        self.draw_calls.clear();

        for (key, indices) in lines.buckets() {
            if indices.is_empty() {
                continue;
            }
            let start = self.line_indices.len() as u32;
            self.line_indices.extend_from_slice(indices);
            self.draw_calls.push(DrawCall {
                key: DrawKey::Line(*key),
                range: start..self.line_indices.len() as u32,
            });
        }

        for (key, ranges) in polygons.ranges() {
            for r in ranges {
                self.draw_calls.push(DrawCall {
                    key: DrawKey::Polygon(*key),
                    range: r.start..r.start + r.count,
                });
            }
        }

        for (key, vertices) in points.buckets() {
            if vertices.is_empty() {
                continue;
            }
            let start = self.point_vertices.len() as u32;
            self.point_vertices.extend_from_slice(vertices);
            self.draw_calls.push(DrawCall {
                key: DrawKey::Point(*key),
                range: start..self.point_vertices.len() as u32,
            });
        }

        FrameBatches {
            view_projection,
            line_vertices: lines.vertices(),
            line_indices: &self.line_indices,
            polygon_vertices: polygons.vertices(),
            polygon_indices: polygons.indices(),
            point_vertices: &self.point_vertices,
            draw_calls: &self.draw_calls,
        }
    }
}
