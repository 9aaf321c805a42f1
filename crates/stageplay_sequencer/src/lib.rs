// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback synchronization for StagePlay.
//!
//! This crate keeps a character and a camera in step with an externally owned
//! media clock:
//! - Frame scheduling with seek detection and stop-at-start looping
//! - Camera track driving with exclusive camera modes
//! - Keyframed camera and transform tracks
//! - Actor bindings with per-capability enable flags
//!
//! ## Architecture
//!
//! The engine is built on:
//! - [`TimeSource`] for the master timeline and [`WallClock`] for idle ticks
//! - [`ActorRuntime`] as the narrow contract to animation, IK and physics
//! - A [`Session`] holding the bound character and the [`CameraTrackDriver`]
//! - [`FrameScheduler::step_frame`] as the single per-refresh entry point

pub mod binding;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod keyframe;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod track;

pub use binding::{ActorBinding, BindingId, BindingRole, BindingSlot, Capabilities, Capability};
pub use camera::{
    Camera, CameraBinding, CameraMode, CameraPose, CameraTrackDriver, CompositionRig, ModeSwitch,
    OrbitController, OrbitInput, Perspective, StagedPose, CANONICAL_UP,
};
pub use clock::{ClockSample, SteppedWallClock, SystemWallClock, TimeSource, WallClock};
pub use config::{PlaybackConfig, TimingConfig};
pub use error::{ConfigError, Result, RuntimeError, RuntimeOp, SyncError};
pub use keyframe::{InterpolationMode, Keyframe, KeyframeValue};
pub use runtime::{ActorRuntime, RuntimeResult};
pub use scheduler::{FrameClass, FrameOutcome, FrameReport, FrameScheduler, FrameStats, SkipReason};
pub use session::Session;
pub use track::{CameraSample, CameraTrack, TransformTrack};
