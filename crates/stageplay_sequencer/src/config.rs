// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback configuration.
//!
//! This module holds the operator-facing settings the engine reads:
//! - Physics and camera-mode toggles
//! - Motion offset against the audio track
//! - Orbit auto-rotation and composition smoothing
//! - Timing thresholds (seek detection, settle tick, idle tick clamp)

use crate::camera::CameraMode;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Frame delta magnitude above which a frame counts as a seek (seconds)
pub const DEFAULT_SEEK_THRESHOLD: f64 = 0.1;

/// Physics step applied after a loop stop to let constraints settle (seconds)
pub const DEFAULT_SETTLE_TICK: f64 = 0.1;

/// Upper clamp for the wall-clock physics tick on idle frames (seconds)
pub const DEFAULT_MAX_IDLE_TICK: f64 = 0.1;

/// Timing thresholds used by the frame scheduler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seek detection threshold
    pub seek_threshold: f64,
    /// Loop settle tick
    pub settle_tick: f64,
    /// Idle wall-clock tick clamp
    pub max_idle_tick: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            seek_threshold: DEFAULT_SEEK_THRESHOLD,
            settle_tick: DEFAULT_SETTLE_TICK,
            max_idle_tick: DEFAULT_MAX_IDLE_TICK,
        }
    }
}

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Config format version
    pub version: u32,
    /// Rigid-body physics enabled for the character
    pub physics: bool,
    /// Active camera control mode
    pub camera_mode: CameraMode,
    /// Shift applied to the player position before posing (milliseconds)
    pub motion_offset_ms: f64,
    /// Orbit camera rotates on its own while playback is paused
    pub auto_rotate: bool,
    /// Orbit auto-rotation speed (2.0 is one turn every 30 seconds)
    pub auto_rotate_speed: f32,
    /// Composition camera follow factor per 60 Hz frame, 0..=1
    pub follow_smooth: f32,
    /// Timing thresholds
    pub timing: TimingConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            physics: true,
            camera_mode: CameraMode::MotionFile,
            motion_offset_ms: 0.0,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            follow_smooth: 0.15,
            timing: TimingConfig::default(),
        }
    }
}

impl PlaybackConfig {
    /// Parse a config from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: PlaybackConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&content)?;
        tracing::info!("Loaded playback config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::Invalid {
                field: "version",
                value: f64::from(self.version),
            });
        }

        let checks = [
            ("timing.seek_threshold", self.timing.seek_threshold),
            ("timing.settle_tick", self.timing.settle_tick),
            ("timing.max_idle_tick", self.timing.max_idle_tick),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid { field, value });
            }
        }

        if !self.motion_offset_ms.is_finite() {
            return Err(ConfigError::Invalid {
                field: "motion_offset_ms",
                value: self.motion_offset_ms,
            });
        }
        if !(0.0..=1.0).contains(&self.follow_smooth) {
            return Err(ConfigError::Invalid {
                field: "follow_smooth",
                value: f64::from(self.follow_smooth),
            });
        }
        Ok(())
    }
}
