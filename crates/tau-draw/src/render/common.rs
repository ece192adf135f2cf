//! Shared GPU types and utilities used by the batch pipelines.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── camera uniform ────────────────────────────────────────────────────────

/// Group 0, binding 0 of every batch pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
    /// (width, height, 1 / width, 1 / height) in physical pixels.
    pub viewport: [f32; 4],
}

impl CameraUniform {
    pub(super) fn new(view_projection: Mat4, viewport: [f32; 2]) -> Self {
        let [w, h] = viewport;
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            viewport: [w, h, 1.0 / w, 1.0 / h],
        }
    }
}

// ── point uniform ─────────────────────────────────────────────────────────

/// Group 1, binding 0 of the point pipeline; one slot per point draw call,
/// selected with a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct PointUniform {
    pub size: f32,
    pub _pad: [f32; 3], // 16-byte alignment
}

/// Byte stride between point uniform slots.
pub(super) fn point_uniform_stride(device: &wgpu::Device) -> u64 {
    let align = u64::from(device.limits().min_uniform_buffer_offset_alignment).max(1);
    let size = std::mem::size_of::<PointUniform>() as u64;
    size.div_ceil(align) * align
}

// ── binding sizes ─────────────────────────────────────────────────────────

/// `min_binding_size` for a uniform of type `T`.
///
/// `None` for zero-sized types, which wgpu reads as "no minimum".
pub(super) fn uniform_binding_size<T: Pod>() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<T>() as u64)
}
