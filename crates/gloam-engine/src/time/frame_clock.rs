use std::time::{Duration, Instant};

/// Timing for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    /// Seconds since the clock started, summed from clamped deltas so that
    /// animations do not jump after a stall.
    pub elapsed: f32,
    pub frame_index: u64,
}

/// Produces [`FrameTime`]s. The delta is clamped so a debugger pause or a
/// minimized window does not produce a huge step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f64,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts delta measurement from now. `elapsed` keeps its value.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(raw)
    }

    fn advance(&mut self, raw: Duration) -> FrameTime {
        let dt = raw.clamp(self.dt_min, self.dt_max);
        self.elapsed += dt.as_secs_f64();

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed as f32,
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
    use super::*;

    #[test]
    fn stall_is_clamped_and_elapsed_sums_clamped_steps() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        let a = clock.advance(Duration::from_millis(16));
        let b = clock.advance(Duration::from_secs(5));
        let c = clock.advance(Duration::ZERO);

        assert_eq!((a.frame_index, b.frame_index, c.frame_index), (0, 1, 2));
        assert!((b.dt - 0.1).abs() < 1e-6);
        assert!((c.dt - 0.001).abs() < 1e-6);
        assert!((c.elapsed - 0.117).abs() < 1e-5);
    }
}
