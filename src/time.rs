//! Frame timing for hosts that drive the swarm from a render loop.
//!
//! The engine itself never reads a clock: [`Swarm::step`](crate::Swarm::step)
//! takes an explicit `now` and derives `dt` from the previous call. A
//! [`FrameClock`] is a convenient source for that `now`.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // In the redraw handler:
//! let now = clock.tick();
//! swarm.frame(now, &mut canvas);
//! ```

use std::time::{Duration, Instant};

/// Default ceiling on one frame's contribution to elapsed time.
pub const DEFAULT_MAX_DELTA: f64 = 0.1;

/// Pausable, scalable simulation clock.
///
/// Elapsed time only advances by the clamped frame delta, so a stalled window
/// (dragged, minimized, debugger break) resumes where it left off instead of
/// jumping ahead.
#[derive(Debug)]
pub struct FrameClock {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Simulation time in seconds.
    elapsed_secs: f64,
    /// Simulation time added by the last tick.
    delta_secs: f64,
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f64,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    max_delta: f64,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f64,
}

impl FrameClock {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            max_delta: DEFAULT_MAX_DELTA,
            time_scale: 1.0,
        }
    }

    /// Clamp each frame's delta to at most `max_delta` seconds.
    pub fn with_max_delta(mut self, max_delta: f64) -> Self {
        self.max_delta = max_delta.max(0.0);
        self
    }

    /// Sample the wall clock and advance. Returns the new elapsed time.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count + 1 - self.fps_frame_count;
            self.fps = frames_since as f64 / fps_elapsed.as_secs_f64();
            self.fps_frame_count = self.frame_count + 1;
            self.fps_update_time = now;
        }

        self.advance(raw)
    }

    /// Advance by an explicit wall-clock delta. Returns the new elapsed time.
    pub fn advance(&mut self, raw_delta: f64) -> f64 {
        self.frame_count += 1;
        self.delta_secs = if self.paused {
            0.0
        } else {
            raw_delta.clamp(0.0, self.max_delta) * self.time_scale
        };
        self.elapsed_secs += self.delta_secs;
        self.elapsed_secs
    }

    /// Simulation time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed_secs
    }

    /// Simulation time added by the last tick.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// While paused, ticks add nothing to elapsed time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set time scale multiplier. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
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
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_tick_advances() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let now = clock.tick();

        assert!(now > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut clock = FrameClock::new().with_max_delta(0.05);
        assert_eq!(clock.advance(3.0), 0.05);
        assert_eq!(clock.delta(), 0.05);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut clock = FrameClock::new();
        clock.advance(0.02);
        clock.pause();
        let before = clock.elapsed();
        clock.advance(0.02);

        assert_eq!(clock.elapsed(), before);
        assert_eq!(clock.delta(), 0.0);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(0.5);
        clock.advance(0.04);
        assert!((clock.elapsed() - 0.02).abs() < 1e-12);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }
}
