//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and a single window wired to its own `Gpu`.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
