//! Bounded particle simulation feeding the point batches.

mod buffer;

pub use buffer::{EXPLOSION_MAX_AGE, PARTICLE_POINT_SIZE, ParticleBuffer, TRAIL_MAX_AGE};
