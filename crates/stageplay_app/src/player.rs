// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulated media player acting as the master timeline.

use stageplay_sequencer::TimeSource;

/// Transport state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Not advancing
    #[default]
    Paused,
    /// Advancing with host time
    Playing,
}

/// Audio-track stand-in driven by host frame time
#[derive(Debug, Clone)]
pub struct MediaPlayer {
    position: f64,
    duration: f64,
    transport: Transport,
    /// Playback rate (1.0 = normal speed)
    pub rate: f64,
}

impl MediaPlayer {
    /// Create a paused player at the start of a track
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            duration: duration.max(0.0),
            transport: Transport::Paused,
            rate: 1.0,
        }
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        if self.transport == Transport::Playing {
            return;
        }
        self.transport = Transport::Playing;
        tracing::debug!("Player: play at {:.3}s", self.position);
    }

    /// Advance by host frame time; stops on the end of the track
    pub fn advance(&mut self, dt: f64) {
        if self.transport != Transport::Playing || !dt.is_finite() {
            return;
        }
        self.position += dt.max(0.0) * self.rate;
        if self.position >= self.duration {
            self.position = self.duration;
            self.transport = Transport::Paused;
            tracing::debug!("Player: reached end of track ({:.3}s)", self.duration);
        }
    }
}

impl TimeSource for MediaPlayer {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn pause(&mut self) {
        if self.transport == Transport::Playing {
            tracing::debug!("Player: pause at {:.3}s", self.position);
        }
        self.transport = Transport::Paused;
    }

    fn set_current_time(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.position = seconds.clamp(0.0, self.duration);
        }
    }

    fn is_paused(&self) -> bool {
        self.transport == Transport::Paused
    }
}
