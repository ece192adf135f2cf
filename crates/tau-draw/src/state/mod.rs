//! Render-state attributes and the scoped state stack.
//!
//! The batching core reads the current top of each stack when geometry is pushed;
//! the attributes become part of the batch key (depth test, culling) or are baked
//! into the vertices (transform, color).

mod attrs;
mod stack;

pub use attrs::{BackfaceCull, DepthTest};
pub use stack::{StackedState, StateGroup, StateStack};
