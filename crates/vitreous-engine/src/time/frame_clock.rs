use std::time::{Duration, Instant};

/// Timing snapshot for one composition tick.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Timestamp the tick was taken at.
    pub now: Instant,

    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots from externally supplied timestamps.
///
/// Timestamps come from a [`Clock`](super::Clock), so the same runtime code
/// runs against the wall clock or a manual one.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
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
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Forgets the previous timestamp; the next tick reports `dt_min`.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Advances to `now` and returns the snapshot for this tick.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };
        self.last = Some(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
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
    use super::*;

    #[test]
    fn first_tick_uses_minimum_delta() {
        let mut clock = FrameClock::new();
        let ft = clock.tick_at(Instant::now());
        assert_eq!(ft.frame_index, 0);
        assert!((ft.dt - 0.0001).abs() < 1e-6);
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        clock.tick_at(t0);
        let ft = clock.tick_at(t0 + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn regular_delta_passes_through() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        clock.tick_at(t0);
        let ft = clock.tick_at(t0 + Duration::from_millis(16));
        assert!((ft.dt - 0.016).abs() < 1e-5);
    }
}
