use std::f32::consts::PI;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::batch::PointVertex;
use crate::paint::Color4u;
use crate::shapes::PointSink;

/// Lifetime of particles simulated by [`ParticleBuffer::update`], in seconds.
pub const TRAIL_MAX_AGE: f32 = 0.5;
/// Lifetime of particles simulated by [`ParticleBuffer::update_explosion`], in seconds.
pub const EXPLOSION_MAX_AGE: f32 = 0.75;

const DEG: f32 = PI / 180.0;

const TRAIL_DAMPING: f32 = 2.5;
const EXPLOSION_DAMPING: f32 = 5.0;

const TRAIL_BOUNDS_X: (f32, f32) = (-5.0, 10.0);
const TRAIL_BOUNDS_Y: (f32, f32) = (-5.0, 5.0);

/// Speed at which trail spread reaches its minimum.
const TRAIL_SATURATION_SPEED: f32 = 10.0;
const TRAIL_SPREAD: (f32, f32) = (20.0 * DEG, 0.0);

/// Speed at which explosion spread reaches its minimum.
const EXPLOSION_SATURATION_SPEED: f32 = 5.0;
const EXPLOSION_SPREAD: (f32, f32) = (PI, 20.0 * DEG);
const EXPLOSION_SPEED: (f32, f32) = (1.0, 12.0);
const EXPLOSION_JITTER: f32 = 0.1;

/// Point size used by [`ParticleBuffer::render`].
pub const PARTICLE_POINT_SIZE: u32 = 4;

/// Below this speed the spawn direction falls back to +X.
const MIN_DIRECTION_SPEED: f32 = 0.001;

/// Per-step simulation parameters.
#[derive(Debug, Copy, Clone)]
struct Integration {
    max_age: f32,
    damping: f32,
    clamp: bool,
}

/// Fixed-capacity particle pool.
///
/// Particles live in parallel arrays indexed `0..size()`; slots past the live
/// count hold stale data. The point array is kept in [`PointVertex`] layout so
/// [`render`](Self::render) forwards it without conversion.
///
/// Expired particles are removed by moving the last live particle into their
/// slot; the slot is then re-examined in the same pass.
#[derive(Debug)]
pub struct ParticleBuffer {
    points: Vec<PointVertex>,
    velocities: Vec<Vec3>,
    ages: Vec<f32>,
    len: usize,
    rng: StdRng,
}

impl ParticleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Deterministic spawn jitter.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            points: vec![PointVertex::new(Vec3::ZERO, Color4u::BLACK); capacity],
            velocities: vec![Vec3::ZERO; capacity],
            ages: vec![0.0; capacity],
            len: 0,
            rng,
        }
    }

    /// Live particle count.
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live particles, position + color.
    #[inline]
    pub fn points(&self) -> &[PointVertex] {
        &self.points[..self.len]
    }

    #[inline]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities[..self.len]
    }

    #[inline]
    pub fn ages(&self) -> &[f32] {
        &self.ages[..self.len]
    }

    // ── spawning ──────────────────────────────────────────────────────────

    /// Spawns one particle with age 0. Dropped silently when the pool is full.
    pub fn push_point(&mut self, p: Vec3, v: Vec3, color: Color4u) {
        if self.len >= self.capacity() {
            return;
        }
        let i = self.len;
        self.points[i] = PointVertex::new(p, color);
        self.velocities[i] = v;
        self.ages[i] = 0.0;
        self.len += 1;
    }

    /// Spawns `n` particles in a cone around `v` that narrows as `|v|` rises.
    ///
    /// Speeds are uniform in `[0, |v|]`. Directions are rotated within the XY plane.
    pub fn push_trail(&mut self, p: Vec3, v: Vec3, n: usize, color: Color4u) {
        let speed_max = v.length();
        let spread = spread_for(speed_max, TRAIL_SATURATION_SPEED, TRAIL_SPREAD);
        let dir = planar_direction(v, speed_max);

        for _ in 0..n {
            let theta = rnd(&mut self.rng, -spread, spread);
            let speed = rnd(&mut self.rng, 0.0, speed_max);
            self.push_point(p, rotate_xy(dir, theta) * speed, color);
        }
    }

    /// Spawns `n` particles in a burst around `v`, nearly omnidirectional when `v` is small.
    ///
    /// Speeds are uniform in `[1, 12]`; spawn positions are jittered by up to
    /// ±0.1 in X and Y.
    pub fn push_explosion(&mut self, p: Vec3, v: Vec3, n: usize, color: Color4u) {
        let speed = v.length();
        let spread = spread_for(speed, EXPLOSION_SATURATION_SPEED, EXPLOSION_SPREAD);
        let dir = planar_direction(v, speed);

        for _ in 0..n {
            let theta = rnd(&mut self.rng, -spread, spread);
            let speed = rnd(&mut self.rng, EXPLOSION_SPEED.0, EXPLOSION_SPEED.1);
            let jitter = Vec3::new(
                rnd(&mut self.rng, -EXPLOSION_JITTER, EXPLOSION_JITTER),
                rnd(&mut self.rng, -EXPLOSION_JITTER, EXPLOSION_JITTER),
                0.0,
            );
            self.push_point(p + jitter, rotate_xy(dir, theta) * speed, color);
        }
    }

    // ── simulation ────────────────────────────────────────────────────────

    /// Trail step: damping 2.5, position clamped to x ∈ [-5, 10], y ∈ [-5, 5],
    /// lifetime [`TRAIL_MAX_AGE`].
    pub fn update(&mut self, dt: f32) {
        self.step(
            dt,
            Integration { max_age: TRAIL_MAX_AGE, damping: TRAIL_DAMPING, clamp: true },
        );
    }

    /// Explosion step: damping 5.0, no clamp, lifetime [`EXPLOSION_MAX_AGE`].
    pub fn update_explosion(&mut self, dt: f32) {
        self.step(
            dt,
            Integration { max_age: EXPLOSION_MAX_AGE, damping: EXPLOSION_DAMPING, clamp: false },
        );
    }

    fn step(&mut self, dt: f32, params: Integration) {
        let mut i = 0;
        while i < self.len {
            let v = self.velocities[i] - self.velocities[i] * params.damping * dt;
            self.velocities[i] = v;

            let mut p = self.points[i].position() + v * dt;
            if params.clamp {
                p.x = p.x.clamp(TRAIL_BOUNDS_X.0, TRAIL_BOUNDS_X.1);
                p.y = p.y.clamp(TRAIL_BOUNDS_Y.0, TRAIL_BOUNDS_Y.1);
            }
            self.points[i].p = p.to_array();

            self.ages[i] += dt;
            let age = self.ages[i];

            if age > params.max_age {
                // Slot `i` now holds the former last particle; examine it next.
                self.swap_remove(i);
                continue;
            }

            let alpha = ((1.0 - age / params.max_age) * 255.0).round().clamp(0.0, 255.0) as u8;
            let color = Color4u(self.points[i].color).with_alpha(alpha);
            self.points[i].color = color.0;
            i += 1;
        }
    }

    /// Removes live particle `i` by moving the last live particle into its slot.
    ///
    /// # Panics
    /// Panics if `i >= size()`.
    pub fn swap_remove(&mut self, i: usize) {
        assert!(i < self.len, "ParticleBuffer: swap_remove index {i} out of {} live", self.len);
        let last = self.len - 1;
        self.points.swap(i, last);
        self.velocities.swap(i, last);
        self.ages.swap(i, last);
        self.len = last;
    }

    /// Removes every live particle.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    // ── output ────────────────────────────────────────────────────────────

    /// Forwards the live particles to `sink` as points of size 4.
    pub fn render<S: PointSink + ?Sized>(&self, sink: &mut S) {
        if self.len > 0 {
            sink.push_points(self.points(), PARTICLE_POINT_SIZE);
        }
    }
}

/// Spread half-angle, interpolated from `range.0` at rest to `range.1` at `saturation`.
fn spread_for(speed: f32, saturation: f32, range: (f32, f32)) -> f32 {
    let t = (speed / saturation).clamp(0.0, 1.0);
    range.0 + (range.1 - range.0) * t
}

/// `v` projected onto XY and normalized, or +X when `v` is too slow to have a direction.
fn planar_direction(v: Vec3, speed: f32) -> Vec3 {
    if speed < MIN_DIRECTION_SPEED {
        Vec3::X
    } else {
        Vec3::new(v.x / speed, v.y / speed, 0.0)
    }
}

#[inline]
fn rotate_xy(d: Vec3, theta: f32) -> Vec3 {
    let (s, c) = theta.sin_cos();
    Vec3::new(d.x * c - d.y * s, d.x * s + d.y * c, 0.0)
}

/// Uniform in `[lo, hi)`; `lo` when the range is empty.
#[inline]
fn rnd(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi <= lo { lo } else { rng.gen_range(lo..hi) }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[derive(Default)]
    struct CollectingSink {
        calls: Vec<(Vec<PointVertex>, u32)>,
    }

    impl PointSink for CollectingSink {
        fn push_points(&mut self, points: &[PointVertex], size: u32) {
            self.calls.push((points.to_vec(), size));
        }
    }

    fn buffer(capacity: usize) -> ParticleBuffer {
        ParticleBuffer::with_seed(capacity, 7)
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn size_tracks_pushes_then_saturates() {
        let mut b = buffer(8);
        for k in 1..=8 {
            b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::WHITE);
            assert_eq!(b.size(), k);
        }
        b.push_point(Vec3::ONE, Vec3::ONE, Color4u::RED);
        b.push_trail(Vec3::ZERO, Vec3::X, 10, Color4u::RED);
        assert_eq!(b.size(), 8);
        assert_eq!(b.capacity(), 8);
        // The overflow spawns did not touch existing data.
        assert!(b.points().iter().all(|p| p.color == Color4u::WHITE.0));
    }

    #[test]
    fn zero_capacity_accepts_nothing() {
        let mut b = buffer(0);
        b.push_explosion(Vec3::ZERO, Vec3::ZERO, 5, Color4u::RED);
        b.update(0.1);
        assert_eq!(b.size(), 0);
    }

    // ── expiry ────────────────────────────────────────────────────────────

    #[test]
    fn update_expires_everything_after_max_age() {
        let mut b = buffer(64);
        b.push_trail(Vec3::ZERO, Vec3::new(3.0, 1.0, 0.0), 40, Color4u::ORANGE);
        b.push_explosion(Vec3::ZERO, Vec3::ZERO, 20, Color4u::ORANGE);

        let mut t = 0.0;
        while t <= TRAIL_MAX_AGE {
            b.update(1.0 / 60.0);
            t += 1.0 / 60.0;
        }
        assert_eq!(b.size(), 0);
    }

    #[test]
    fn update_explosion_uses_longer_lifetime() {
        let mut b = buffer(16);
        b.push_explosion(Vec3::ZERO, Vec3::Y, 16, Color4u::WHITE);

        b.update_explosion(0.6);
        assert_eq!(b.size(), 16);
        b.update_explosion(0.2);
        assert_eq!(b.size(), 0);
    }

    #[test]
    fn single_particle_expires_after_point_six() {
        let mut b = buffer(4);
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::WHITE);
        b.update(0.6);
        assert_eq!(b.size(), 0);
    }

    #[test]
    fn single_particle_fades_to_51_at_point_four() {
        let mut b = buffer(4);
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::WHITE);
        b.update(0.4);
        assert_eq!(b.size(), 1);
        assert_eq!(Color4u(b.points()[0].color).a(), 51);
    }

    #[test]
    fn expiry_mid_array_re_examines_moved_particle() {
        let mut b = buffer(4);
        // Two old particles followed by two young ones.
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::RED);
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::RED);
        b.update(0.45);
        b.push_point(Vec3::X, Vec3::ZERO, Color4u::BLUE);
        b.push_point(Vec3::Y, Vec3::ZERO, Color4u::BLUE);

        b.update(0.1);

        assert_eq!(b.size(), 2);
        for (p, age) in b.points().iter().zip(b.ages()) {
            assert_eq!(Color4u(p.color).b(), 255);
            assert_relative_eq!(*age, 0.1, epsilon = 1e-6);
        }
    }

    // ── swap-remove ───────────────────────────────────────────────────────

    #[test]
    fn swap_remove_moves_last_record_and_leaves_others() {
        let mut b = buffer(5);
        for i in 0..5 {
            let f = i as f32;
            b.push_point(Vec3::splat(f), Vec3::new(f, -f, 0.0), Color4u::from_rgba8(i as u8, 0, 0, 255));
        }
        b.update(0.01);
        let before_points = b.points().to_vec();
        let before_vels = b.velocities().to_vec();
        let before_ages = b.ages().to_vec();

        b.swap_remove(1);

        assert_eq!(b.size(), 4);
        assert_eq!(b.points()[1], before_points[4]);
        assert_eq!(b.velocities()[1], before_vels[4]);
        assert_eq!(b.ages()[1], before_ages[4]);
        for i in [0, 2, 3] {
            assert_eq!(b.points()[i], before_points[i]);
            assert_eq!(b.velocities()[i], before_vels[i]);
            assert_eq!(b.ages()[i], before_ages[i]);
        }
    }

    #[test]
    fn swap_remove_last_just_shrinks() {
        let mut b = buffer(3);
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::RED);
        b.push_point(Vec3::X, Vec3::ZERO, Color4u::LIME);
        b.swap_remove(1);
        assert_eq!(b.size(), 1);
        assert_eq!(b.points()[0].color, Color4u::RED.0);
    }

    #[test]
    #[should_panic(expected = "swap_remove index")]
    fn swap_remove_out_of_range_panics() {
        let mut b = buffer(3);
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::RED);
        b.swap_remove(1);
    }

    // ── fading ────────────────────────────────────────────────────────────

    #[test]
    fn alpha_fades_monotonically_and_rgb_is_untouched() {
        let mut b = buffer(1);
        let color = Color4u::from_rgba8(12, 34, 56, 255);
        b.push_point(Vec3::ZERO, Vec3::ZERO, color);

        let mut last = 255;
        for _ in 0..9 {
            b.update(0.05);
            let c = Color4u(b.points()[0].color);
            assert!(c.a() <= last);
            assert_eq!((c.r(), c.g(), c.b()), (12, 34, 56));
            last = c.a();
        }
        assert!(last < 40);
    }

    #[test]
    fn zero_dt_keeps_full_alpha() {
        let mut b = buffer(1);
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::WHITE.with_alpha(10));
        b.update(0.0);
        assert_eq!(Color4u(b.points()[0].color).a(), 255);
    }

    // ── integration ───────────────────────────────────────────────────────

    #[test]
    fn update_damps_integrates_and_clamps() {
        let mut b = buffer(2);
        b.push_point(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Color4u::WHITE);
        b.push_point(Vec3::new(9.9, -4.9, 0.0), Vec3::new(100.0, -100.0, 0.0), Color4u::WHITE);

        b.update(0.1);

        // v = 10 * (1 - 0.25) = 7.5, p = 0.75
        assert_relative_eq!(b.velocities()[0].x, 7.5, epsilon = 1e-5);
        assert_relative_eq!(b.points()[0].p[0], 0.75, epsilon = 1e-5);
        assert_eq!(b.points()[1].p[0], 10.0);
        assert_eq!(b.points()[1].p[1], -5.0);
    }

    #[test]
    fn update_explosion_does_not_clamp() {
        let mut b = buffer(1);
        b.push_point(Vec3::new(50.0, 50.0, 0.0), Vec3::ZERO, Color4u::WHITE);
        b.update_explosion(0.1);
        assert_eq!(b.points()[0].p, [50.0, 50.0, 0.0]);
    }

    // ── spawn patterns ────────────────────────────────────────────────────

    #[test]
    fn zero_velocity_spawns_are_finite() {
        let mut b = buffer(100);
        b.push_trail(Vec3::ZERO, Vec3::ZERO, 50, Color4u::WHITE);
        b.push_explosion(Vec3::ZERO, Vec3::ZERO, 50, Color4u::WHITE);

        assert_eq!(b.size(), 100);
        for (p, v) in b.points().iter().zip(b.velocities()) {
            assert!(v.is_finite());
            assert!(Vec3::from_array(p.p).is_finite());
        }
        // Trail speed is drawn from [0, 0].
        assert!(b.velocities()[..50].iter().all(|v| *v == Vec3::ZERO));
    }

    #[test]
    fn saturated_trail_points_along_velocity() {
        let mut b = buffer(50);
        b.push_trail(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 50, Color4u::WHITE);

        assert_eq!(b.size(), 50);
        for v in b.velocities() {
            assert!(v.x >= 0.0);
            assert_relative_eq!(v.y, 0.0, epsilon = 1e-5);
            assert!(v.length() <= 10.0);
        }
    }

    #[test]
    fn slow_trail_stays_within_twenty_degrees() {
        let mut b = buffer(200);
        b.push_trail(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), 200, Color4u::WHITE);

        // spread = 20° * (1 - 0.2) = 16°
        let limit = 16.0_f32.to_radians() + 1e-4;
        for v in b.velocities().iter().filter(|v| v.length() > 1e-3) {
            assert!(v.angle_between(Vec3::Y) <= limit);
        }
    }

    #[test]
    fn fast_explosion_narrows_to_twenty_degrees() {
        let mut b = buffer(300);
        b.push_explosion(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), 300, Color4u::WHITE);

        // At the saturation speed the spread bottoms out at 20°.
        let limit = 20.0_f32.to_radians() + 1e-4;
        let widest = b.velocities().iter().map(|v| v.angle_between(Vec3::X)).fold(0.0, f32::max);
        assert!(widest <= limit);
        // Wider than the trail's 0° at saturation: the cone is really open.
        assert!(widest > 10.0_f32.to_radians());
    }

    #[test]
    fn explosion_jitter_and_speed_bounds() {
        let mut b = buffer(200);
        let origin = Vec3::new(1.0, 2.0, 3.0);
        b.push_explosion(origin, Vec3::ZERO, 200, Color4u::WHITE);

        for (p, v) in b.points().iter().zip(b.velocities()) {
            let d = Vec3::from_array(p.p) - origin;
            assert!(d.x.abs() <= EXPLOSION_JITTER + 1e-5 && d.y.abs() <= EXPLOSION_JITTER + 1e-5);
            assert_eq!(d.z, 0.0);
            assert!((1.0 - 1e-5..=12.0 + 1e-5).contains(&v.length()));
            assert_eq!(v.z, 0.0);
        }
    }

    #[test]
    fn same_seed_spawns_identically() {
        let mut a = ParticleBuffer::with_seed(16, 99);
        let mut b = ParticleBuffer::with_seed(16, 99);
        a.push_explosion(Vec3::ZERO, Vec3::X, 16, Color4u::RED);
        b.push_explosion(Vec3::ZERO, Vec3::X, 16, Color4u::RED);
        assert_eq!(a.velocities(), b.velocities());
    }

    // ── render ────────────────────────────────────────────────────────────

    #[test]
    fn render_forwards_live_points_with_size_four() {
        let mut b = buffer(8);
        let mut sink = CollectingSink::default();
        b.push_point(Vec3::ZERO, Vec3::ZERO, Color4u::RED);
        b.push_point(Vec3::X, Vec3::ZERO, Color4u::LIME);

        b.render(&mut sink);

        assert_eq!(sink.calls.len(), 1);
        assert_eq!(sink.calls[0].0, b.points().to_vec());
        assert_eq!(sink.calls[0].1, PARTICLE_POINT_SIZE);
    }

    #[test]
    fn render_with_no_live_particles_is_silent() {
        let b = buffer(8);
        let mut sink = CollectingSink::default();
        b.render(&mut sink);
        assert!(sink.calls.is_empty());
    }
}
