// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo assets so the host runs without any files.

use crate::actor::{AnchorSpec, ChainSpec, RigSpec};
use glam::Vec3;
use stageplay_sequencer::{CameraTrack, InterpolationMode, Keyframe, KeyframeValue, TransformTrack};
use std::f32::consts::PI;

/// Length of the demo dance
pub const DEMO_MOTION_SECONDS: f32 = 12.0;

/// A short looping sway across the stage
pub fn demo_motion() -> TransformTrack {
    let mut track = TransformTrack::new("demo_dance");
    let steps = (DEMO_MOTION_SECONDS * 2.0) as u32;
    for i in 0..=steps {
        let t = i as f32 * 0.5;
        let phase = t / DEMO_MOTION_SECONDS * 2.0 * PI;
        track.add_position(
            t,
            [4.0 * phase.sin(), 1.5 * (t * PI).sin().abs(), 2.0 * (phase.cos() - 1.0)],
        );
        track.add_rotation(t, [0.0, 0.6 * (phase * 2.0).sin(), 0.0]);
    }
    track
}

/// A recorded camera: slow push in, a hard cut to a tilted close-up, then a pull back
pub fn demo_camera() -> CameraTrack {
    let mut track = CameraTrack::new("demo_camera");
    let eased = |time: f32, value: KeyframeValue| {
        Keyframe::new(time, value).with_easing([0.4, 0.0], [0.6, 1.0])
    };

    track.add_target(Keyframe::new(0.0, KeyframeValue::Vec3([0.0, 12.0, 0.0])));
    track.add_target(eased(5.0, KeyframeValue::Vec3([2.0, 13.0, -1.0])));
    track.add_target(
        Keyframe::new(6.0, KeyframeValue::Vec3([0.0, 15.0, -2.0]))
            .with_interpolation(InterpolationMode::Constant),
    );
    track.add_target(Keyframe::new(9.0, KeyframeValue::Vec3([0.0, 15.0, -2.0])));
    track.add_target(eased(DEMO_MOTION_SECONDS, KeyframeValue::Vec3([0.0, 11.0, 0.0])));

    track.add_rotation(Keyframe::new(0.0, KeyframeValue::Vec3([-0.1, 0.0, 0.0])));
    track.add_rotation(eased(5.0, KeyframeValue::Vec3([-0.2, 0.5, 0.0])));
    track.add_rotation(
        Keyframe::new(6.0, KeyframeValue::Vec3([0.05, -0.3, 0.25]))
            .with_interpolation(InterpolationMode::Constant),
    );
    track.add_rotation(Keyframe::new(9.0, KeyframeValue::Vec3([0.05, -0.3, 0.25])));
    track.add_rotation(eased(DEMO_MOTION_SECONDS, KeyframeValue::Vec3([-0.1, 0.0, 0.0])));

    track.add_distance(Keyframe::new(0.0, KeyframeValue::Float(45.0)));
    track.add_distance(eased(5.0, KeyframeValue::Float(30.0)));
    track.add_distance(Keyframe::new(6.0, KeyframeValue::Float(12.0)));
    track.add_distance(eased(DEMO_MOTION_SECONDS, KeyframeValue::Float(40.0)));

    track.add_fov(Keyframe::new(0.0, KeyframeValue::Float(30.0)));
    track.add_fov(Keyframe::new(6.0, KeyframeValue::Float(24.0)));
    track.add_fov(Keyframe::new(DEMO_MOTION_SECONDS, KeyframeValue::Float(30.0)));
    track
}

/// Head, shoulders and waist with hair, ribbons and a skirt
pub fn figure_rig() -> RigSpec {
    let anchor = |name: &str, offset: Vec3| AnchorSpec {
        name: name.to_string(),
        offset,
    };
    RigSpec {
        anchors: vec![
            anchor("head", Vec3::new(0.0, 16.0, 0.0)),
            anchor("shoulder_l", Vec3::new(-2.0, 13.5, 0.0)),
            anchor("shoulder_r", Vec3::new(2.0, 13.5, 0.0)),
            anchor("waist", Vec3::new(0.0, 10.0, 0.0)),
        ],
        chains: vec![
            ChainSpec {
                anchor: 0,
                links: 4,
                segment: Vec3::new(0.0, -1.5, -0.4),
                mass: 0.5,
                stiffness: 300.0,
            },
            ChainSpec {
                anchor: 1,
                links: 2,
                segment: Vec3::new(0.0, -1.2, -0.2),
                mass: 0.3,
                stiffness: 200.0,
            },
            ChainSpec {
                anchor: 2,
                links: 2,
                segment: Vec3::new(0.0, -1.2, -0.2),
                mass: 0.3,
                stiffness: 200.0,
            },
            ChainSpec {
                anchor: 3,
                links: 2,
                segment: Vec3::new(0.0, -1.5, 0.3),
                mass: 1.0,
                stiffness: 500.0,
            },
        ],
        focus: Some(0),
    }
}
