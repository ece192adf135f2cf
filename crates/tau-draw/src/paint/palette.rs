//! Scalar-to-color palettes.
//!
//! Each palette splits `[0, 1]` into equal strata. The color at each stratum
//! boundary is described by step functions of the boundary index, and values
//! in between are interpolated linearly.

use glam::Vec3;

/// `1` below `n`, `0` from `n` on.
#[inline]
fn step_down(n: f32, x: f32) -> f32 {
    if x < n { 1.0 } else { 0.0 }
}

/// `0` below `n`, `1` from `n` on.
#[inline]
fn step_up(n: f32, x: f32) -> f32 {
    if x >= n { 1.0 } else { 0.0 }
}

/// `1` inside `[a, b)`, `0` elsewhere.
#[inline]
fn step_updown(a: f32, b: f32, x: f32) -> f32 {
    if x >= a && x < b { 1.0 } else { 0.0 }
}

/// Splits `x` in `[0, 1]` into `(stratum index, fraction within stratum)`.
#[inline]
fn strata(x: f32, nbr_strata: u32) -> (f32, f32) {
    let xs = x.clamp(0.0, 1.0) * nbr_strata as f32;
    let x0 = xs.floor();
    (x0, xs - x0)
}

/// Spark palette: white → yellow → orange → black.
///
/// Boundary colors:
///
/// | # | R | G   | B |
/// |---|---|-----|---|
/// | 0 | 1 | 1   | 1 |
/// | 1 | 1 | 1   | 0 |
/// | 2 | 1 | 0.5 | 0 |
/// | 3 | 0 | 0   | 0 |
pub fn color_spark(x: f32) -> Vec3 {
    let boundary = |s: f32| {
        Vec3::new(
            step_down(3.0, s),
            step_down(2.0, s) + 0.5 * step_updown(2.0, 3.0, s),
            step_down(1.0, s),
        )
    };

    let (x0, xf) = strata(x, 3);
    boundary(x0).lerp(boundary(x0 + 1.0), xf)
}

/// Heatmap palette: blue → green → red over four strata.
pub fn color_heatmap(x: f32) -> Vec3 {
    let boundary = |s: f32| {
        Vec3::new(
            step_up(3.0, s),
            step_updown(1.0, 3.0, s),
            step_down(1.0, s),
        )
    };

    let (x0, xf) = strata(x, 4);
    boundary(x0).lerp(boundary(x0 + 1.0), xf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec3(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    // ── spark ─────────────────────────────────────────────────────────────

    #[test]
    fn spark_endpoints() {
        assert_vec3(color_spark(0.0), Vec3::ONE);
        assert_vec3(color_spark(1.0), Vec3::ZERO);
    }

    #[test]
    fn spark_hits_boundary_colors() {
        assert_vec3(color_spark(1.0 / 3.0 + 1e-6), Vec3::new(1.0, 1.0, 0.0));
        assert_vec3(color_spark(2.0 / 3.0 + 1e-6), Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn spark_interpolates_within_stratum() {
        // Halfway between white and yellow.
        assert_vec3(color_spark(1.0 / 6.0), Vec3::new(1.0, 1.0, 0.5));
    }

    // ── heatmap ───────────────────────────────────────────────────────────

    #[test]
    fn heatmap_endpoints() {
        assert_vec3(color_heatmap(0.0), Vec3::new(0.0, 0.0, 1.0));
        assert_vec3(color_heatmap(1.0), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn palettes_clamp_input() {
        assert_vec3(color_heatmap(-3.0), color_heatmap(0.0));
        assert_vec3(color_spark(5.0), color_spark(1.0));
    }
}
