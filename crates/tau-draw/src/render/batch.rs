use bytemuck::Pod;

use crate::batch::{DrawKey, FrameBatches};

use super::backend::DrawBackend;
use super::common::{point_uniform_stride, CameraUniform, PointUniform};
use super::pipelines::{PipelineKey, Pipelines};
use super::{RenderCtx, RenderTarget};

/// wgpu backend for `ShapeRenderer` frames.
///
/// Owns every persistent GPU resource of the batching path:
/// - one vertex buffer per primitive class plus index buffers for lines/polygons
/// - the camera uniform and a per-draw point-size uniform (dynamic offsets)
/// - pipelines, built lazily per render-state key
///
/// Buffers grow to the next power of two and are never shrunk.
pub struct BatchRenderer {
    pipelines: Option<Pipelines>,

    camera_ubo: Option<wgpu::Buffer>,
    camera_bind_group: Option<wgpu::BindGroup>,

    point_ubo: GrowBuffer,
    point_bind_group: Option<wgpu::BindGroup>,
    point_stride: u64,
    point_staging: Vec<u8>,

    line_vbo: GrowBuffer,
    line_ibo: GrowBuffer,
    polygon_vbo: GrowBuffer,
    polygon_ibo: GrowBuffer,
    point_vbo: GrowBuffer,
}

impl BatchRenderer {
    pub fn new() -> Self {
        let vertex = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST;
        let index = wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST;
        let uniform = wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST;

        Self {
            pipelines: None,
            camera_ubo: None,
            camera_bind_group: None,
            point_ubo: GrowBuffer::new("tau point size ubo", uniform),
            point_bind_group: None,
            point_stride: 0,
            point_staging: Vec::new(),
            line_vbo: GrowBuffer::new("tau line vbo", vertex),
            line_ibo: GrowBuffer::new("tau line ibo", index),
            polygon_vbo: GrowBuffer::new("tau polygon vbo", vertex),
            polygon_ibo: GrowBuffer::new("tau polygon ibo", index),
            point_vbo: GrowBuffer::new("tau point vbo", vertex),
        }
    }

    /// Adapter that lets `ShapeRenderer::render` submit straight into `target`.
    pub fn backend<'r, 'c, 't>(
        &'r mut self,
        ctx: &'r RenderCtx<'c>,
        target: &'r mut RenderTarget<'t>,
    ) -> GpuSubmit<'r, 'c, 't> {
        GpuSubmit { renderer: self, ctx, target }
    }

    /// Uploads `frame` and records its draw calls into one render pass on `target`.
    ///
    /// The pass loads the existing color and depth contents.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        frame: &FrameBatches<'_>,
    ) {
        if frame.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_camera(ctx);
        self.write_camera(ctx, frame);

        self.line_vbo.upload(ctx, frame.line_vertices);
        self.line_ibo.upload(ctx, frame.line_indices);
        self.polygon_vbo.upload(ctx, frame.polygon_vertices);
        self.polygon_ibo.upload(ctx, frame.polygon_indices);
        self.point_vbo.upload(ctx, frame.point_vertices);
        self.write_point_sizes(ctx, frame);

        if let Some(pipelines) = self.pipelines.as_mut() {
            for call in frame.draw_calls {
                pipelines.ensure(ctx.device, PipelineKey::from(call.key));
            }
        }

        let Some(pipelines) = self.pipelines.as_ref() else { return };
        let Some(camera_bind_group) = self.camera_bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tau batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, camera_bind_group, &[]);

        let mut point_slot = 0u64;
        for call in frame.draw_calls {
            let point_offset = point_slot * self.point_stride;
            if matches!(call.key, DrawKey::Point(_)) {
                point_slot += 1;
            }

            let Some(pipeline) = pipelines.get(&PipelineKey::from(call.key)) else { continue };
            rpass.set_pipeline(pipeline);

            match call.key {
                DrawKey::Line(_) => {
                    let (Some(vbo), Some(ibo)) = (self.line_vbo.get(), self.line_ibo.get()) else {
                        continue;
                    };
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(call.range.clone(), 0, 0..1);
                }
                DrawKey::Polygon(_) => {
                    let (Some(vbo), Some(ibo)) = (self.polygon_vbo.get(), self.polygon_ibo.get())
                    else {
                        continue;
                    };
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(call.range.clone(), 0, 0..1);
                }
                DrawKey::Point(_) => {
                    let (Some(vbo), Some(bind_group)) =
                        (self.point_vbo.get(), self.point_bind_group.as_ref())
                    else {
                        continue;
                    };
                    rpass.set_bind_group(1, bind_group, &[point_offset as u32]);
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    // Six quad corners per point instance.
                    rpass.draw(0..6, call.range.clone());
                }
            }
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self
            .pipelines
            .as_ref()
            .is_some_and(|p| p.matches(ctx.surface_format, ctx.depth_format))
        {
            return;
        }

        self.pipelines = Some(Pipelines::new(ctx.device, ctx.surface_format, ctx.depth_format));
        // Bind groups reference the old layouts.
        self.camera_bind_group = None;
        self.point_bind_group = None;
    }

    fn ensure_camera(&mut self, ctx: &RenderCtx<'_>) {
        if self.camera_bind_group.is_some() {
            return;
        }
        let Some(pipelines) = self.pipelines.as_ref() else { return };

        let ubo = self.camera_ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tau camera ubo"),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        self.camera_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tau camera bind group"),
            layout: pipelines.camera_bgl(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        }));
    }

    fn write_camera(&self, ctx: &RenderCtx<'_>, frame: &FrameBatches<'_>) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        let uniform = CameraUniform::new(frame.view_projection, ctx.viewport());
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
    }

    /// Writes one point-size slot per point draw call, in draw order.
    fn write_point_sizes(&mut self, ctx: &RenderCtx<'_>, frame: &FrameBatches<'_>) {
        let sizes = frame.draw_calls.iter().filter_map(|c| match c.key {
            DrawKey::Point(k) => Some(k.size),
            _ => None,
        });

        if self.point_stride == 0 {
            self.point_stride = point_uniform_stride(ctx.device);
        }
        let stride = self.point_stride as usize;

        self.point_staging.clear();
        for size in sizes {
            let start = self.point_staging.len();
            self.point_staging.resize(start + stride, 0);
            let uniform = PointUniform { size: size as f32, _pad: [0.0; 3] };
            let bytes = bytemuck::bytes_of(&uniform);
            self.point_staging[start..start + bytes.len()].copy_from_slice(bytes);
        }
        if self.point_staging.is_empty() {
            return;
        }

        let grown = self.point_ubo.upload(ctx, &self.point_staging);
        if grown {
            self.point_bind_group = None;
        }
        if self.point_bind_group.is_some() {
            return;
        }

        let (Some(pipelines), Some(ubo)) = (self.pipelines.as_ref(), self.point_ubo.get()) else {
            return;
        };
        self.point_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tau point size bind group"),
            layout: pipelines.point_bgl(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: ubo,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<PointUniform>() as u64),
                }),
            }],
        }));
    }
}

impl Default for BatchRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// [`DrawBackend`] that forwards each frame to a [`BatchRenderer`] and one target.
pub struct GpuSubmit<'r, 'c, 't> {
    renderer: &'r mut BatchRenderer,
    ctx: &'r RenderCtx<'c>,
    target: &'r mut RenderTarget<'t>,
}

impl DrawBackend for GpuSubmit<'_, '_, '_> {
    fn submit(&mut self, frame: &FrameBatches<'_>) {
        self.renderer.render(self.ctx, self.target, frame);
    }
}

// ── growable GPU buffer ───────────────────────────────────────────────────

/// GPU buffer reallocated to the next power of two (min 64 elements) on overflow.
struct GrowBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity: u64, // bytes
}

impl GrowBuffer {
    const fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self { label, usage, buffer: None, capacity: 0 }
    }

    #[inline]
    fn get(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Writes `data` at offset 0, growing first if needed. Returns `true` on reallocation.
    fn upload<T: Pod>(&mut self, ctx: &RenderCtx<'_>, data: &[T]) -> bool {
        if data.is_empty() {
            return false;
        }
        let grown = self.ensure_capacity(ctx, data.len(), std::mem::size_of::<T>());
        if let Some(buffer) = self.buffer.as_ref() {
            ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(data));
        }
        grown
    }

    fn ensure_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize, elem_size: usize) -> bool {
        let required_bytes = (required * elem_size) as u64;
        if required_bytes <= self.capacity && self.buffer.is_some() {
            return false;
        }
        let new_cap = required.next_power_of_two().max(64);
        // COPY_BUFFER_ALIGNMENT
        let new_size = ((new_cap * elem_size) as u64).next_multiple_of(4);

        self.buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: new_size,
            usage: self.usage,
            mapped_at_creation: false,
        }));
        self.capacity = new_size;

        log::debug!("{} grown to {new_size} bytes", self.label);
        true
    }
}
