//! Immediate-mode debug drawing on wgpu.
//!
//! Geometry is pushed through a [`shapes::ShapeRenderer`] under a stack of
//! render states, grouped into per-state batches, and handed to a
//! [`render::DrawBackend`] once per frame. [`particles::ParticleBuffer`] is a
//! bounded point pool that renders through the same batches.
//!
//! [`window::Runtime`] drives a winit event loop and a per-window [`device::Gpu`]
//! for binaries that want a ready-made window.

pub mod batch;
pub mod core;
pub mod device;
pub mod logging;
pub mod mesh;
pub mod paint;
pub mod particles;
pub mod render;
pub mod shapes;
pub mod state;
pub mod time;
pub mod window;
