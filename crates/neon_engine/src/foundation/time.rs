//! Time management utilities
//!
//! Timers in the engine run on a session clock measured as a [`Duration`]
//! since the session started. [`SystemClock`] follows wall time;
//! [`ManualClock`] only moves when told to, which keeps timer tests exact.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of session time
pub trait Clock {
    /// Time elapsed since the session started
    fn now(&self) -> Duration;
}

/// Wall clock anchored at creation
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand
///
/// Clones share the same time, so a test can keep one handle while the
/// engine owns another.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute session time; never moves backwards
    pub fn set(&self, to: Duration) {
        if to > self.now.get() {
            self.now.set(to);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Frame timer for render-loop statistics
pub struct FrameTimer {
    last_frame: Option<Duration>,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: None,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Record a frame at session time `now` (call once per frame)
    pub fn tick(&mut self, now: Duration) {
        if let Some(last) = self.last_frame {
            self.delta_time = now.saturating_sub(last).as_secs_f32();
            self.total_time += self.delta_time;
        }
        self.last_frame = Some(now);
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since the first frame
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count.saturating_sub(1) as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let engine_side = clock.clone();

        clock.advance(Duration::from_millis(250));
        assert_eq!(engine_side.now(), Duration::from_millis(250));

        // Never goes backwards
        clock.set(Duration::from_millis(100));
        assert_eq!(engine_side.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_frame_timer_average() {
        let mut timer = FrameTimer::new();
        for frame in 0..=60u64 {
            timer.tick(Duration::from_millis(frame * 16));
        }
        assert_eq!(timer.frame_count(), 61);
        assert!((timer.delta_time() - 0.016).abs() < 1e-6);
        assert!((timer.average_fps() - 62.5).abs() < 0.1);
    }
}
