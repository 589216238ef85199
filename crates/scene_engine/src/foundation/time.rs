//! Frame clock and stopwatch

use std::time::{Duration, Instant};

/// Where a frame's delta comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockMode {
    /// Every tick advances by the same amount
    Fixed(f32),
    /// Each tick measures wall-clock time since the previous one
    Wall,
}

/// Produces the per-frame delta fed to the scheduler
///
/// Wall-clock deltas are clamped to `max_delta` so a stall does not feed
/// one enormous step into the integrator. Fixed deltas are used as given.
#[derive(Debug)]
pub struct FrameClock {
    mode: ClockMode,
    max_delta: f32,
    last_tick: Instant,
    simulated: f64,
    ticks: u64,
    started: Instant,
}

impl FrameClock {
    /// Clock whose mode follows the engine config
    pub fn new(fixed_delta: Option<f32>, max_delta: f32) -> Self {
        let mode = fixed_delta.map_or(ClockMode::Wall, ClockMode::Fixed);
        let now = Instant::now();
        Self {
            mode,
            max_delta: max_delta.max(0.0),
            last_tick: now,
            simulated: 0.0,
            ticks: 0,
            started: now,
        }
    }

    /// Fixed or wall-clock stepping
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Advance one frame and return its delta in seconds
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = match self.mode {
            ClockMode::Fixed(step) => step,
            ClockMode::Wall => now
                .duration_since(self.last_tick)
                .as_secs_f32()
                .min(self.max_delta),
        };
        self.last_tick = now;
        self.simulated += f64::from(delta);
        self.ticks += 1;
        delta
    }

    /// Simulated seconds handed out so far
    pub fn simulated_time(&self) -> f64 {
        self.simulated
    }

    /// Frames ticked so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Frames per wall-clock second since the clock was created
    pub fn wall_rate(&self) -> f32 {
        let wall = self.started.elapsed().as_secs_f32();
        if wall > 0.0 {
            self.ticks as f32 / wall
        } else {
            0.0
        }
    }
}

/// Wall-clock stopwatch with lap support
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    origin: Instant,
    lap_mark: Instant,
}

impl Stopwatch {
    /// Start timing now
    pub fn start_new() -> Self {
        let now = Instant::now();
        Self { origin: now, lap_mark: now }
    }

    /// Time since the stopwatch started
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Time since the stopwatch started, in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Time since the previous lap (or the start), then begin a new lap
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now.duration_since(self.lap_mark);
        self.lap_mark = now;
        lap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_ignores_wall_time() {
        let mut clock = FrameClock::new(Some(0.5), 0.1);
        assert_eq!(clock.mode(), ClockMode::Fixed(0.5));
        assert_eq!(clock.tick(), 0.5);
        assert_eq!(clock.tick(), 0.5);
        assert_eq!(clock.ticks(), 2);
        assert!((clock.simulated_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wall_clock_is_clamped() {
        let mut clock = FrameClock::new(None, 0.0);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(clock.tick(), 0.0);
    }

    #[test]
    fn test_laps_never_exceed_total() {
        let mut stopwatch = Stopwatch::start_new();
        let lap = stopwatch.lap();
        assert!(lap <= stopwatch.elapsed());
    }
}
