//! Per-class batch tables.
//!
//! All three tables accumulate geometry for a single frame and are emptied by
//! `clear()`. Shared vertex/index arrays keep their capacity across frames.

use std::collections::HashMap;

use super::{LineKey, LineVertex, PointKey, PointVertex, PolyVertex, PolygonKey};

// ── lines ─────────────────────────────────────────────────────────────────

/// Line geometry: one shared vertex list, one index list per key.
#[derive(Debug, Default)]
pub struct LineBatches {
    vertices: Vec<LineVertex>,
    buckets: HashMap<LineKey, Vec<u32>>,
}

impl LineBatches {
    /// Appends geometry to the bucket for `key`, creating the bucket on first use.
    pub fn append<F>(&mut self, key: LineKey, f: F)
    where
        F: FnOnce(&mut LineWriter<'_>),
    {
        let mut writer = LineWriter {
            vertices: &mut self.vertices,
            indices: self.buckets.entry(key).or_default(),
        };
        f(&mut writer);
    }

    #[inline]
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    /// Buckets in table order (unspecified).
    pub fn buckets(&self) -> impl Iterator<Item = (&LineKey, &[u32])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.buckets.clear();
    }
}

/// Appends vertices and segment indices into one line bucket.
pub struct LineWriter<'a> {
    vertices: &'a mut Vec<LineVertex>,
    indices: &'a mut Vec<u32>,
}

impl LineWriter<'_> {
    /// Adds a vertex and returns its index in the shared vertex list.
    #[inline]
    pub fn vertex(&mut self, v: LineVertex) -> u32 {
        let i = self.vertices.len() as u32;
        self.vertices.push(v);
        i
    }

    /// Adds a segment between two previously added vertices.
    #[inline]
    pub fn segment(&mut self, a: u32, b: u32) {
        self.indices.push(a);
        self.indices.push(b);
    }

    /// Adds two vertices and the segment joining them.
    #[inline]
    pub fn line(&mut self, v0: LineVertex, v1: LineVertex) {
        let a = self.vertex(v0);
        let b = self.vertex(v1);
        self.segment(a, b);
    }
}

// ── polygons ──────────────────────────────────────────────────────────────

/// Contiguous slice of the shared polygon index list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IndexRange {
    pub start: u32,
    pub count: u32,
}

/// Polygon geometry: one shared vertex/index array, ranges grouped by key.
///
/// Every `append` produces its own range. Ranges sharing a key are kept separate
/// and drawn with one call each.
#[derive(Debug, Default)]
pub struct PolygonBatches {
    vertices: Vec<PolyVertex>,
    indices: Vec<u32>,
    ranges: HashMap<PolygonKey, Vec<IndexRange>>,
}

impl PolygonBatches {
    /// Appends one range under `key`. Empty appends record nothing.
    pub fn append<F>(&mut self, key: PolygonKey, f: F)
    where
        F: FnOnce(&mut PolygonWriter<'_>),
    {
        let start = self.indices.len() as u32;
        let base = self.vertices.len() as u32;

        let mut writer = PolygonWriter {
            vertices: &mut self.vertices,
            indices: &mut self.indices,
            base,
        };
        f(&mut writer);

        let count = self.indices.len() as u32 - start;
        if count > 0 {
            self.ranges
                .entry(key)
                .or_default()
                .push(IndexRange { start, count });
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[PolyVertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Ranges per key in table order (unspecified); ranges of one key keep push order.
    pub fn ranges(&self) -> impl Iterator<Item = (&PolygonKey, &[IndexRange])> {
        self.ranges.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.ranges.clear();
    }
}

/// Appends one polygon range.
///
/// Indices passed to [`PolygonWriter::index`] are local to the range (0 is the
/// first vertex added through this writer).
pub struct PolygonWriter<'a> {
    vertices: &'a mut Vec<PolyVertex>,
    indices: &'a mut Vec<u32>,
    base: u32,
}

impl PolygonWriter<'_> {
    #[inline]
    pub fn vertex(&mut self, v: PolyVertex) -> u32 {
        let local = self.vertices.len() as u32 - self.base;
        self.vertices.push(v);
        local
    }

    #[inline]
    pub fn index(&mut self, local: u32) {
        self.indices.push(self.base + local);
    }

    #[inline]
    pub fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.index(a);
        self.index(b);
        self.index(c);
    }
}

// ── points ────────────────────────────────────────────────────────────────

/// Point geometry: a flat vertex list per key.
#[derive(Debug, Default)]
pub struct PointBatches {
    buckets: HashMap<PointKey, Vec<PointVertex>>,
}

impl PointBatches {
    /// Bucket for `key`, created on first use.
    #[inline]
    pub fn bucket(&mut self, key: PointKey) -> &mut Vec<PointVertex> {
        self.buckets.entry(key).or_default()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&PointKey, &[PointVertex])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::paint::Color4u;
    use crate::state::{BackfaceCull, DepthTest};

    fn lv(x: f32) -> LineVertex {
        LineVertex::new(Vec3::new(x, 0.0, 0.0), Color4u::WHITE)
    }

    fn pv(x: f32) -> PolyVertex {
        PolyVertex::new(Vec3::new(x, 0.0, 0.0), Vec3::Z, Color4u::WHITE)
    }

    // ── lines ─────────────────────────────────────────────────────────────

    #[test]
    fn same_line_key_appends_to_one_bucket() {
        let mut t = LineBatches::default();
        let key = LineKey::lines(DepthTest::True);
        t.append(key, |w| w.line(lv(0.0), lv(1.0)));
        t.append(key, |w| w.line(lv(2.0), lv(3.0)));

        let buckets: Vec<_> = t.buckets().collect();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].1, &[0, 1, 2, 3]);
        assert_eq!(t.vertices().len(), 4);
    }

    #[test]
    fn line_keys_split_by_depth_test() {
        let mut t = LineBatches::default();
        t.append(LineKey::lines(DepthTest::True), |w| w.line(lv(0.0), lv(1.0)));
        t.append(LineKey::lines(DepthTest::False), |w| w.line(lv(2.0), lv(3.0)));
        assert_eq!(t.buckets().count(), 2);
    }

    // ── polygons ──────────────────────────────────────────────────────────

    #[test]
    fn polygon_ranges_with_same_key_are_not_merged() {
        let mut t = PolygonBatches::default();
        let key = PolygonKey::triangles(DepthTest::True, BackfaceCull::True);
        for _ in 0..3 {
            t.append(key, |w| {
                let a = w.vertex(pv(0.0));
                let b = w.vertex(pv(1.0));
                let c = w.vertex(pv(2.0));
                w.triangle(a, b, c);
            });
        }

        let (_, ranges) = t.ranges().next().unwrap();
        assert_eq!(
            ranges,
            &[
                IndexRange { start: 0, count: 3 },
                IndexRange { start: 3, count: 3 },
                IndexRange { start: 6, count: 3 },
            ]
        );
        // Local indices are rebased onto the shared vertex array.
        assert_eq!(&t.indices()[3..6], &[3, 4, 5]);
    }

    #[test]
    fn empty_polygon_append_records_no_range() {
        let mut t = PolygonBatches::default();
        t.append(PolygonKey::triangles(DepthTest::True, BackfaceCull::False), |_| {});
        assert!(t.is_empty());
    }

    // ── points / clear ────────────────────────────────────────────────────

    #[test]
    fn clear_empties_every_table() {
        let mut lines = LineBatches::default();
        let mut points = PointBatches::default();
        lines.append(LineKey::lines(DepthTest::True), |w| w.line(lv(0.0), lv(1.0)));
        points
            .bucket(PointKey { size: 4, depth_test: DepthTest::True })
            .push(PointVertex::new(Vec3::ZERO, Color4u::RED));

        lines.clear();
        points.clear();

        assert!(lines.is_empty());
        assert!(lines.vertices().is_empty());
        assert!(points.is_empty());
    }
}
