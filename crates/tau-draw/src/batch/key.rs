use crate::state::{BackfaceCull, DepthTest};

/// Primitive topology of a batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    LineList,
    TriangleList,
    TriangleStrip,
}

impl Topology {
    #[inline]
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::LineList => wgpu::PrimitiveTopology::LineList,
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    #[inline]
    pub fn is_strip(self) -> bool {
        matches!(self, Topology::TriangleStrip)
    }
}

/// Line batch key. One bucket (index list) per key; same-key geometry is appended.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineKey {
    pub topology: Topology,
    pub depth_test: DepthTest,
}

impl LineKey {
    #[inline]
    pub const fn lines(depth_test: DepthTest) -> Self {
        Self { topology: Topology::LineList, depth_test }
    }
}

/// Polygon batch key. Many index ranges may share one key; they are never merged.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PolygonKey {
    pub topology: Topology,
    pub depth_test: DepthTest,
    pub cull_face: BackfaceCull,
}

impl PolygonKey {
    #[inline]
    pub const fn triangles(depth_test: DepthTest, cull_face: BackfaceCull) -> Self {
        Self { topology: Topology::TriangleList, depth_test, cull_face }
    }
}

/// Point batch key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PointKey {
    /// Point diameter in physical pixels.
    pub size: u32,
    pub depth_test: DepthTest,
}

/// Key of a single draw call, tagged with its primitive class.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawKey {
    Line(LineKey),
    Polygon(PolygonKey),
    Point(PointKey),
}

impl DrawKey {
    #[inline]
    pub fn depth_test(&self) -> DepthTest {
        match self {
            DrawKey::Line(k) => k.depth_test,
            DrawKey::Polygon(k) => k.depth_test,
            DrawKey::Point(k) => k.depth_test,
        }
    }
}
