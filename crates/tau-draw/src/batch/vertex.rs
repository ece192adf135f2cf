//! Vertex formats accumulated by the batch tables and uploaded as-is.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::paint::Color4u;

/// Lit polygon vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PolyVertex {
    pub p: [f32; 3],
    pub normal: [f32; 3],
    pub color: u32,
}

impl PolyVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Unorm8x4   // packed color
    ];

    #[inline]
    pub fn new(p: Vec3, normal: Vec3, color: Color4u) -> Self {
        Self { p: p.to_array(), normal: normal.to_array(), color: color.0 }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PolyVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Unlit line vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub p: [f32; 3],
    pub color: u32,
}

impl LineVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Unorm8x4   // packed color
    ];

    #[inline]
    pub fn new(p: Vec3, color: Color4u) -> Self {
        Self { p: p.to_array(), color: color.0 }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.p)
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Point vertex (position + packed color).
///
/// Also the particle record layout: `ParticleBuffer` stores its live points in
/// this format so they can be forwarded without conversion.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub p: [f32; 3],
    pub color: u32,
}

impl PointVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // center
        1 => Unorm8x4   // packed color
    ];

    #[inline]
    pub fn new(p: Vec3, color: Color4u) -> Self {
        Self { p: p.to_array(), color: color.0 }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.p)
    }

    /// Points are expanded to screen-space quads, one instance per point.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}
