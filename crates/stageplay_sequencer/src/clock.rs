// SPDX-License-Identifier: MIT OR Apache-2.0
//! Master timeline and wall clock abstractions.
//!
//! The media player owns the authoritative playback position; the engine only
//! samples it once per frame through [`TimeSource`]. A separate free-running
//! [`WallClock`] supplies real elapsed time for work that must continue while
//! playback is paused (camera auto-rotation, physics settling).

use std::time::Instant;

/// External playback element acting as the master timeline
pub trait TimeSource {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Total track duration in seconds
    fn duration(&self) -> f64;

    /// Pause playback
    fn pause(&mut self);

    /// Seek to an absolute position in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Whether playback is paused
    fn is_paused(&self) -> bool;

    /// Whether the player reports being exactly on its end boundary
    #[allow(clippy::float_cmp)]
    fn is_at_end(&self) -> bool {
        self.current_time() == self.duration()
    }
}

/// One reading of the time source, taken fresh every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSample {
    /// Motion time in seconds (player position plus motion offset, never negative)
    pub time: f64,
    /// Raw player position equals the track duration
    pub is_at_end: bool,
}

impl ClockSample {
    /// Read `source`, shifting the position by `motion_offset_ms`
    pub fn read<S: TimeSource + ?Sized>(source: &S, motion_offset_ms: f64) -> Self {
        let time = (source.current_time() + motion_offset_ms * 0.001).max(0.0);
        Self {
            time,
            is_at_end: source.is_at_end(),
        }
    }
}

/// Free-running clock independent of media time
pub trait WallClock {
    /// Seconds elapsed since the previous call
    fn delta(&mut self) -> f64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone)]
pub struct SystemWallClock {
    last: Instant,
}

impl SystemWallClock {
    /// Start a clock at the current instant
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for SystemWallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemWallClock {
    fn delta(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        dt
    }
}

/// Wall clock that advances by a fixed step per call (headless hosts, tests)
#[derive(Debug, Clone, Copy)]
pub struct SteppedWallClock {
    /// Seconds reported per call
    pub step: f64,
}

impl SteppedWallClock {
    /// Create a stepped clock for the given refresh rate
    pub fn from_fps(fps: f64) -> Self {
        Self {
            step: 1.0 / fps.max(1.0),
        }
    }
}

impl WallClock for SteppedWallClock {
    fn delta(&mut self) -> f64 {
        self.step
    }
}
