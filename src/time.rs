//! Frame timing.
//!
//! [`Time`] counts frames and tracks elapsed and delta time. The particle
//! integrator deliberately ignores it (motion is per frame, not per second);
//! the overlay pulse and the fps readout use it.
//!
//! # Example
//!
//! ```ignore
//! use particle_field::time::Time;
//!
//! let mut time = Time::new();
//!
//! // Once per frame:
//! time.update();
//!
//! println!("Elapsed: {:.2}s", time.elapsed());
//! println!("Frame: {}", time.frame());
//! println!("FPS: {:.1}", time.fps());
//! ```

use std::time::{Duration, Instant};

/// Time tracking for a running field.
#[derive(Debug)]
pub struct Time {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Total elapsed time in seconds.
    elapsed_secs: f32,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update the FPS calculation.
    fps_update_interval: Duration,
    /// Fixed delta for reproducible runs (headless rendering, tests).
    fixed_delta: Option<f32>,
}

impl Time {
    /// Create a new time tracker starting from now.
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
            fixed_delta: None,
        }
    }

    /// A tracker that advances by exactly `delta` seconds per frame.
    pub fn fixed(delta: f32) -> Self {
        let mut time = Self::new();
        time.set_fixed_delta(Some(delta));
        time
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta);
        self.last_frame = now;
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        // Update FPS periodically
        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Measured frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Use a fixed delta instead of wall-clock time. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
