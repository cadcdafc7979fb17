//! Frame clock for the viewer loop.
//!
//! Elapsed time is the sum of the deltas handed out, not wall time, so a
//! stall, a pause or a change of time scale never makes the tree jump.
//!
//! ```ignore
//! let mut time = Time::new();
//!
//! // Once per frame:
//! let (elapsed, delta) = time.update();
//! scene.update(&FrameInput { mode, photos, elapsed, delta });
//! ```

use std::time::{Duration, Instant};

/// Default cap on a single frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Frames counted over a short window.
#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self, now: Instant) {
        self.frames += 1;
        let window = now.duration_since(self.window_start);
        if window >= FPS_WINDOW {
            self.fps = self.frames as f32 / window.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }
    }
}

/// Elapsed scene time, clamped frame delta, frame count and FPS.
#[derive(Debug)]
pub struct Time {
    last_tick: Instant,
    elapsed: f32,
    delta: f32,
    frame: u64,
    fps: FpsCounter,
    paused: bool,
    /// Longest delta handed out, so a stalled frame can't fling particles.
    max_delta: f32,
    scale: f32,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_tick: now,
            elapsed: 0.0,
            delta: 0.0,
            frame: 0,
            fps: FpsCounter::new(now),
            paused: false,
            max_delta: DEFAULT_MAX_DELTA,
            scale: 1.0,
        }
    }

    /// Read the wall clock and advance. Call once per frame.
    ///
    /// Returns `(elapsed, delta)`.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let wall = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.fps.tick(now);
        self.advance_by(wall)
    }

    /// Advance by a given wall-clock interval instead of reading the clock.
    ///
    /// The same clamping, scaling and pausing rules apply as for
    /// [`update`](Self::update).
    pub fn advance_by(&mut self, wall_seconds: f32) -> (f32, f32) {
        self.delta = if self.paused || !wall_seconds.is_finite() {
            0.0
        } else {
            wall_seconds.clamp(0.0, self.max_delta) * self.scale
        };
        self.elapsed += self.delta;
        self.frame += 1;
        (self.elapsed, self.delta)
    }

    /// Scene seconds since start, excluding pauses.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds handed out by the last update, after clamping and scaling.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Updates so far, paused ones included.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.scale
    }

    /// Freeze the scene: `delta()` is 0 until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Cap the delta returned by [`update`](Self::update).
    pub fn set_max_delta(&mut self, seconds: f32) {
        self.max_delta = seconds.max(0.0);
    }

    /// `1.0` is normal speed, `0.5` slow motion. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.scale = scale.max(0.0);
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert!(!time.is_paused());
        assert_eq!(time.max_delta(), DEFAULT_MAX_DELTA);
    }

    #[test]
    fn test_time_update() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(elapsed, delta);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut time = Time::new();
        time.set_max_delta(0.005);
        thread::sleep(Duration::from_millis(30));
        let (_, delta) = time.update();
        assert!(delta <= 0.005 + 1e-6);

        let (_, delta) = time.advance_by(f32::INFINITY);
        assert_eq!(delta, 0.0);
    }

    #[test]
    fn test_time_pause() {
        let mut time = Time::new();
        time.advance_by(0.016);

        time.pause();
        let elapsed_before = time.elapsed();
        time.advance_by(0.05);
        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);

        // No jump on resume.
        time.toggle_pause();
        let (elapsed, _) = time.advance_by(0.016);
        assert!((elapsed - 0.032).abs() < 1e-6);
    }

    #[test]
    fn test_time_scale() {
        let mut time = Time::new();
        time.set_time_scale(0.5);
        let (_, delta) = time.advance_by(0.02);
        assert!((delta - 0.01).abs() < 1e-6);

        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }
}
