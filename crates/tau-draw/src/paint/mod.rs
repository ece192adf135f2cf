//! Color model shared between the batching core and the particle buffer.
//!
//! Scope:
//! - packed 8-bit RGBA (`Color4u`), the per-vertex color format
//! - palette functions mapping a scalar in `[0, 1]` to RGB

pub mod color;
pub mod palette;

pub use color::Color4u;
pub use palette::{color_heatmap, color_spark};
