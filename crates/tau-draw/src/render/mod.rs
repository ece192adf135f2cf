//! Rendering: the `DrawBackend` seam and its wgpu implementation.
//!
//! `ShapeRenderer::render` assembles one `FrameBatches` per frame and hands it
//! to a `DrawBackend`. `BatchRenderer` is the GPU backend:
//! - uploads the frame's arrays into buffers that grow but never shrink
//! - issues the draw calls in order, one pipeline per render-state key
//!
//! Conventions:
//! - world space is right-handed; the caller supplies the view-projection
//! - NDC depth is [0, 1] (wgpu)
//! - vertex colors are straight alpha; shaders output premultiplied alpha

mod backend;
mod batch;
mod common;
mod ctx;
mod pipelines;

pub use backend::DrawBackend;
pub use batch::{BatchRenderer, GpuSubmit};
pub use ctx::{RenderCtx, RenderTarget};

#[cfg(test)]
pub(crate) use backend::RecordingBackend;
