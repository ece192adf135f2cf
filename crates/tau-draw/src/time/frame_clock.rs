use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped time since the previous tick, in seconds.
    pub dt: f32,

    /// Sum of every clamped `dt` so far, in seconds. Drives time-based animation.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    pub frame_index: u64,
}

/// Per-window frame clock.
///
/// `dt` is clamped so that debugger pauses, minimized windows or stalls do not
/// hand a huge step to the particle simulation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: Duration,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Clock with `dt` clamped to [0.1 ms, 250 ms].
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: Duration::ZERO,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the `dt` baseline (not `elapsed`), e.g. after a suspend.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        self.advance(now)
    }

    fn advance(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;
        self.elapsed += dt;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn dt_is_clamped_on_both_ends() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(50));
        let start = clock.last;

        let ft = clock.advance(start);
        assert_relative_eq!(ft.dt, 0.001, epsilon = 1e-7);

        let ft = clock.advance(start + Duration::from_secs(3));
        assert_relative_eq!(ft.dt, 0.05, epsilon = 1e-7);
    }

    #[test]
    fn elapsed_accumulates_clamped_dt() {
        let mut clock = FrameClock::with_clamps(Duration::ZERO, Duration::from_millis(100));
        let start = clock.last;

        clock.advance(start + Duration::from_millis(20));
        clock.advance(start + Duration::from_millis(40));
        let ft = clock.advance(start + Duration::from_secs(10));

        assert_eq!(ft.frame_index, 2);
        assert_relative_eq!(ft.elapsed, 0.14, epsilon = 1e-6);
    }
}
