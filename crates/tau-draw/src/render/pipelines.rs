use std::collections::HashMap;

use crate::batch::{DrawKey, LineVertex, PointVertex, PolyVertex, Topology};

use super::common::{premul_alpha_blend, uniform_binding_size, CameraUniform, PointUniform};

/// Which vertex format / shader a pipeline draws with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) enum PrimitiveClass {
    Line,
    Polygon,
    Point,
}

/// Fixed-function state selected by a draw key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub class: PrimitiveClass,
    pub topology: Topology,
    pub depth_test: bool,
    pub cull: bool,
}

impl From<DrawKey> for PipelineKey {
    fn from(key: DrawKey) -> Self {
        match key {
            DrawKey::Line(k) => Self {
                class: PrimitiveClass::Line,
                topology: k.topology,
                depth_test: k.depth_test.enabled(),
                cull: false,
            },
            DrawKey::Polygon(k) => Self {
                class: PrimitiveClass::Polygon,
                topology: k.topology,
                depth_test: k.depth_test.enabled(),
                cull: k.cull_face.enabled(),
            },
            // Point quads are expanded in the vertex shader.
            DrawKey::Point(k) => Self {
                class: PrimitiveClass::Point,
                topology: Topology::TriangleList,
                depth_test: k.depth_test.enabled(),
                cull: false,
            },
        }
    }
}

/// Shader modules, layouts and the pipelines built from them so far.
///
/// Tied to one (surface format, depth format) pair; rebuilt when either changes.
pub(super) struct Pipelines {
    surface_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,

    lambert: wgpu::ShaderModule,
    line: wgpu::ShaderModule,
    point: wgpu::ShaderModule,

    camera_bgl: wgpu::BindGroupLayout,
    point_bgl: wgpu::BindGroupLayout,
    camera_layout: wgpu::PipelineLayout,
    point_layout: wgpu::PipelineLayout,

    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Pipelines {
    pub(super) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let lambert = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tau lambert shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lambert.wgsl").into()),
        });
        let line = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tau line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });
        let point = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tau point shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/point.wgsl").into()),
        });

        let camera_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tau camera bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: uniform_binding_size::<CameraUniform>(),
                },
                count: None,
            }],
        });

        let point_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tau point size bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: uniform_binding_size::<PointUniform>(),
                },
                count: None,
            }],
        });

        let camera_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tau camera pipeline layout"),
            bind_group_layouts: &[&camera_bgl],
            immediate_size: 0,
        });
        let point_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tau point pipeline layout"),
            bind_group_layouts: &[&camera_bgl, &point_bgl],
            immediate_size: 0,
        });

        log::debug!("batch pipelines reset for {surface_format:?} / {depth_format:?}");

        Self {
            surface_format,
            depth_format,
            lambert,
            line,
            point,
            camera_bgl,
            point_bgl,
            camera_layout,
            point_layout,
            cache: HashMap::new(),
        }
    }

    #[inline]
    pub(super) fn matches(
        &self,
        surface_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> bool {
        self.surface_format == surface_format && self.depth_format == depth_format
    }

    #[inline]
    pub(super) fn camera_bgl(&self) -> &wgpu::BindGroupLayout {
        &self.camera_bgl
    }

    #[inline]
    pub(super) fn point_bgl(&self) -> &wgpu::BindGroupLayout {
        &self.point_bgl
    }

    #[inline]
    pub(super) fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(key)
    }

    /// Builds the pipeline for `key` on first use.
    pub(super) fn ensure(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.cache.contains_key(&key) {
            return;
        }
        let pipeline = self.build(device, key);
        log::debug!("built batch pipeline {key:?}");
        self.cache.insert(key, pipeline);
    }

    fn build(&self, device: &wgpu::Device, key: PipelineKey) -> wgpu::RenderPipeline {
        let (module, layout, buffers) = match key.class {
            PrimitiveClass::Line => (&self.line, &self.camera_layout, [LineVertex::layout()]),
            PrimitiveClass::Polygon => {
                (&self.lambert, &self.camera_layout, [PolyVertex::layout()])
            }
            PrimitiveClass::Point => (&self.point, &self.point_layout, [PointVertex::layout()]),
        };

        let strip_index_format = key.topology.is_strip().then_some(wgpu::IndexFormat::Uint32);

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tau batch pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: key.topology.to_wgpu(),
                strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull.then_some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.depth_format,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{LineKey, PointKey, PolygonKey};
    use crate::state::{BackfaceCull, DepthTest};

    #[test]
    fn cull_only_applies_to_polygons() {
        let poly: PipelineKey =
            DrawKey::Polygon(PolygonKey::triangles(DepthTest::True, BackfaceCull::True)).into();
        let line: PipelineKey = DrawKey::Line(LineKey::lines(DepthTest::True)).into();
        assert!(poly.cull);
        assert!(!line.cull);
    }

    #[test]
    fn point_sizes_share_one_pipeline() {
        let a: PipelineKey =
            DrawKey::Point(PointKey { size: 2, depth_test: DepthTest::False }).into();
        let b: PipelineKey =
            DrawKey::Point(PointKey { size: 9, depth_test: DepthTest::False }).into();
        assert_eq!(a, b);
        assert_eq!(a.topology, Topology::TriangleList);
        assert!(!a.depth_test);
    }
}
