// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorded motion tracks: camera work and root transforms.

use crate::keyframe::{Keyframe, KeyframeValue};
use serde::{Deserialize, Serialize};

/// Default vertical field of view (degrees) when a camera track has no FOV keys
pub const DEFAULT_FOV_DEG: f32 = 45.0;

/// Default distance between camera and its target when a track has no distance keys
pub const DEFAULT_DISTANCE: f32 = 30.0;

/// Camera pose values sampled from a [`CameraTrack`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    /// Look-at target in world space
    pub target: [f32; 3],
    /// Euler rotation (x = pitch, y = yaw, z = roll), radians
    pub rotation: [f32; 3],
    /// Distance from target along the rotated view axis
    pub distance: f32,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
}

/// Recorded camera motion, as exported from a dance/camera-work file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraTrack {
    /// Track name
    pub name: String,
    /// Target position keyframes (Vec3)
    #[serde(default)]
    pub target: Vec<Keyframe>,
    /// Rotation keyframes (Vec3 euler, radians)
    #[serde(default)]
    pub rotation: Vec<Keyframe>,
    /// Distance keyframes (Float)
    #[serde(default)]
    pub distance: Vec<Keyframe>,
    /// Field of view keyframes (Float, degrees)
    #[serde(default)]
    pub fov: Vec<Keyframe>,
}

impl CameraTrack {
    /// Create a new, empty camera track
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: Vec::new(),
            rotation: Vec::new(),
            distance: Vec::new(),
            fov: Vec::new(),
        }
    }

    /// Add a target keyframe
    pub fn add_target(&mut self, keyframe: Keyframe) {
        insert_sorted(&mut self.target, keyframe);
    }

    /// Add a rotation keyframe
    pub fn add_rotation(&mut self, keyframe: Keyframe) {
        insert_sorted(&mut self.rotation, keyframe);
    }

    /// Add a distance keyframe
    pub fn add_distance(&mut self, keyframe: Keyframe) {
        insert_sorted(&mut self.distance, keyframe);
    }

    /// Add a FOV keyframe
    pub fn add_fov(&mut self, keyframe: Keyframe) {
        insert_sorted(&mut self.fov, keyframe);
    }

    /// Sort every channel by time (after deserializing hand-written data)
    pub fn normalize(&mut self) {
        for channel in [
            &mut self.target,
            &mut self.rotation,
            &mut self.distance,
            &mut self.fov,
        ] {
            channel.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
    }

    /// Time of the last keyframe across all channels
    pub fn duration(&self) -> f32 {
        [&self.target, &self.rotation, &self.distance, &self.fov]
            .into_iter()
            .map(|c| channel_end(c))
            .fold(0.0, f32::max)
    }

    /// Sample every channel at `time`
    pub fn sample(&self, time: f32) -> CameraSample {
        CameraSample {
            target: evaluate_channel(&self.target, time)
                .and_then(|v| v.vec3())
                .unwrap_or([0.0, 10.0, 0.0]),
            rotation: evaluate_channel(&self.rotation, time)
                .and_then(|v| v.vec3())
                .unwrap_or([0.0; 3]),
            distance: evaluate_channel(&self.distance, time)
                .and_then(|v| v.scalar())
                .unwrap_or(DEFAULT_DISTANCE),
            fov_deg: evaluate_channel(&self.fov, time)
                .and_then(|v| v.scalar())
                .unwrap_or(DEFAULT_FOV_DEG),
        }
    }
}

/// Character root motion: where the actor stands and which way it faces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformTrack {
    /// Track name
    pub name: String,
    /// Root position keys (Vec3, world units)
    #[serde(default)]
    pub position: Vec<Keyframe>,
    /// Rotation channel keyframes (Vec3 euler, radians)
    #[serde(default)]
    pub rotation: Vec<Keyframe>,
}

impl TransformTrack {
    /// Empty track
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec::new(),
            rotation: Vec::new(),
        }
    }

    /// Key the root position (linear)
    pub fn add_position(&mut self, time: f32, value: [f32; 3]) {
        insert_sorted(&mut self.position, Keyframe::new(time, KeyframeValue::Vec3(value)));
    }

    /// Key the root euler rotation (linear)
    pub fn add_rotation(&mut self, time: f32, value: [f32; 3]) {
        insert_sorted(&mut self.rotation, Keyframe::new(time, KeyframeValue::Vec3(value)));
    }

    /// Sort both channels by time
    pub fn normalize(&mut self) {
        for channel in [&mut self.position, &mut self.rotation] {
            channel.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
    }

    /// Time of the last key on either channel
    pub fn duration(&self) -> f32 {
        channel_end(&self.position).max(channel_end(&self.rotation))
    }

    /// Root position at `time`, `None` without position keys
    pub fn position_at(&self, time: f32) -> Option<[f32; 3]> {
        evaluate_channel(&self.position, time)?.vec3()
    }

    /// Root euler rotation at `time`, `None` without rotation keys
    pub fn rotation_at(&self, time: f32) -> Option<[f32; 3]> {
        evaluate_channel(&self.rotation, time)?.vec3()
    }
}

fn channel_end(keyframes: &[Keyframe]) -> f32 {
    keyframes.last().map_or(0.0, |k| k.time)
}

fn insert_sorted(keyframes: &mut Vec<Keyframe>, keyframe: Keyframe) {
    let idx = keyframes.partition_point(|k| k.time <= keyframe.time);
    keyframes.insert(idx, keyframe);
}

/// Evaluate a sorted keyframe channel at `time`, holding the end values outside its range.
pub fn evaluate_channel(keyframes: &[Keyframe], time: f32) -> Option<KeyframeValue> {
    let next_idx = keyframes.partition_point(|k| k.time <= time);

    match next_idx {
        0 => keyframes.first().map(|k| k.value),
        idx if idx == keyframes.len() => keyframes.last().map(|k| k.value),
        idx => {
            let (from, to) = (&keyframes[idx - 1], &keyframes[idx]);
            let span = to.time - from.time;
            if span <= f32::EPSILON {
                return Some(to.value);
            }
            let progress = from.ease((time - from.time) / span);
            from.value.interpolate(&to.value, progress)
        }
    }
}
