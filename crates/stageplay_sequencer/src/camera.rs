// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera track driver.
//!
//! Exactly one [`CameraMode`] owns the camera pose at any time:
//! - `MotionFile`: the bound recorded [`CameraTrack`] overwrites the whole pose
//!   (including the up vector) for the current media time
//! - `Orbit`: user-driven orbit around a target, with optional auto-rotation
//!   on paused frames
//! - `Composition`: user-adjustable framing offset around a subject point
//!   reported by the character runtime, followed with smoothing

use crate::binding::{ActorBinding, BindingId, BindingSlot, Capability};
use crate::track::CameraTrack;
use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::fmt;

/// Up direction interactive modes expect
pub const CANONICAL_UP: Vec3 = Vec3::Y;

/// Pitch limit for interactive modes, just short of the poles
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Closest an interactive camera may get to its target
const MIN_DISTANCE: f32 = 1.0;

/// Source of the camera pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraMode {
    /// Recorded camera track
    #[default]
    MotionFile,
    /// Free orbit around a target
    Orbit,
    /// Framing that follows the character
    Composition,
}

impl CameraMode {
    /// All modes
    pub const ALL: [CameraMode; 3] = [
        CameraMode::MotionFile,
        CameraMode::Orbit,
        CameraMode::Composition,
    ];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MotionFile => "Motion File",
            Self::Orbit => "Orbit",
            Self::Composition => "Composition",
        }
    }

    /// Whether the pose is driven by live user controls
    pub fn is_interactive(&self) -> bool {
        match self {
            Self::MotionFile => false,
            Self::Orbit | Self::Composition => true,
        }
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Vertical FOV in degrees
    pub fovy_deg: f32,
    /// Width / height
    pub aspect: f32,
    /// Near plane
    pub near: f32,
    /// Far plane
    pub far: f32,
}

impl Perspective {
    /// Projection matrix (right-handed)
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy_deg.to_radians(),
            self.aspect.max(1e-6),
            self.near.max(1e-6),
            self.far.max(self.near + 1e-3),
        )
    }
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fovy_deg: 45.0,
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 2000.0,
        }
    }
}

/// The scene camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position
    pub position: Vec3,
    /// Look-at target
    pub target: Vec3,
    /// Local up direction
    pub up: Vec3,
    /// Projection parameters
    pub projection: Perspective,
    projection_matrix: Mat4,
}

impl Camera {
    /// Create a camera looking at `target` from `position`
    pub fn new(position: Vec3, target: Vec3, projection: Perspective) -> Self {
        Self {
            position,
            target,
            up: CANONICAL_UP,
            projection,
            projection_matrix: projection.matrix(),
        }
    }

    /// Recompute the cached projection matrix after changing `projection`
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = self.projection.matrix();
    }

    /// Cached projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    /// World to view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Update the aspect ratio for a new viewport size
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.projection.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.update_projection_matrix();
    }

    fn apply(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.target = pose.target;
        self.up = pose.up;
        if let Some(fov) = pose.fov_deg {
            self.projection.fovy_deg = fov;
            self.update_projection_matrix();
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.0, 20.0, 30.0),
            Vec3::new(0.0, 10.0, 0.0),
            Perspective::default(),
        )
    }
}

/// A complete camera pose produced by one mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Eye position
    pub position: Vec3,
    /// Look-at target
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Field of view override, degrees
    pub fov_deg: Option<f32>,
}

impl CameraPose {
    /// Pose described by a recorded track at `time`
    pub fn from_track(track: &CameraTrack, time: f32) -> Self {
        let sample = track.sample(time);
        let [rx, ry, rz] = sample.rotation;
        let rotation = Quat::from_euler(EulerRot::YXZ, ry, rx, rz);
        let target = Vec3::from_array(sample.target);

        Self {
            position: target + rotation * Vec3::new(0.0, 0.0, sample.distance),
            target,
            up: rotation * Vec3::Y,
            fov_deg: Some(sample.fov_deg),
        }
    }
}

/// A pose computed for a frame but not yet applied to the camera
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[must_use = "a staged pose does nothing until committed"]
pub struct StagedPose(Option<CameraPose>);

impl StagedPose {
    /// The staged pose, if the active mode produced one
    pub fn pose(&self) -> Option<&CameraPose> {
        self.0.as_ref()
    }
}

/// User input for the interactive modes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitInput {
    /// Horizontal rotation, radians
    #[serde(default)]
    pub yaw: f32,
    /// Vertical rotation, radians
    #[serde(default)]
    pub pitch: f32,
    /// Distance change, world units (negative moves closer)
    #[serde(default)]
    pub zoom: f32,
}

/// Spherical offset around a target, shared by the interactive modes
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    yaw: f32,
    pitch: f32,
    distance: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let distance = offset.length().max(MIN_DISTANCE);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance,
        }
    }

    fn offset(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    fn apply_input(&mut self, input: OrbitInput) {
        if input.yaw.is_finite() {
            self.yaw = (self.yaw + input.yaw).rem_euclid(TAU);
        }
        if input.pitch.is_finite() {
            self.pitch = (self.pitch + input.pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        if input.zoom.is_finite() {
            self.distance = (self.distance + input.zoom).max(MIN_DISTANCE);
        }
    }
}

/// Orbit controls with optional auto-rotation
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    /// Orbit center
    pub target: Vec3,
    orbit: Spherical,
    /// Rotate on idle frames
    pub auto_rotate: bool,
    /// Auto-rotation speed; 2.0 is one turn every 30 seconds
    pub auto_rotate_speed: f32,
}

impl OrbitController {
    fn new(camera: &Camera) -> Self {
        Self {
            target: camera.target,
            orbit: Spherical::from_offset(camera.position - camera.target),
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }

    /// Re-derive the orbit from wherever the camera currently is
    pub fn sync_from(&mut self, camera: &Camera) {
        self.target = camera.target;
        self.orbit = Spherical::from_offset(camera.position - camera.target);
    }

    /// Radians turned by auto-rotation over `dt` seconds
    pub fn auto_rotate_angle(&self, dt: f32) -> f32 {
        TAU / 60.0 * self.auto_rotate_speed * dt
    }

    /// Horizontal orbit angle, radians
    pub fn yaw(&self) -> f32 {
        self.orbit.yaw
    }

    fn advance(&mut self, dt: f32) {
        if self.auto_rotate && dt > 0.0 {
            let angle = self.auto_rotate_angle(dt);
            self.orbit.apply_input(OrbitInput {
                yaw: -angle,
                ..OrbitInput::default()
            });
        }
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.target + self.orbit.offset(),
            target: self.target,
            up: CANONICAL_UP,
            fov_deg: None,
        }
    }
}

/// Composition framing: a fixed, user-adjustable offset around a smoothed subject point.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRig {
    /// Current (smoothed) look-at target
    pub target: Vec3,
    subject: Option<Vec3>,
    framing: Spherical,
    /// Fraction of the remaining distance covered per 60 Hz frame, 0..=1
    pub follow_smooth: f32,
}

impl CompositionRig {
    fn new(camera: &Camera) -> Self {
        Self {
            target: camera.target,
            subject: None,
            framing: Spherical::from_offset(camera.position - camera.target),
            follow_smooth: 0.15,
        }
    }

    fn sync_from(&mut self, camera: &Camera) {
        self.target = camera.target;
        self.framing = Spherical::from_offset(camera.position - camera.target);
    }

    /// Last subject point reported by the runtime
    pub fn subject(&self) -> Option<Vec3> {
        self.subject
    }

    fn follow(&mut self, dt: f32) {
        let Some(subject) = self.subject else {
            return;
        };
        let smooth = self.follow_smooth.clamp(0.0, 1.0);
        let k = 1.0 - (1.0 - smooth).powf(dt.max(0.0) * 60.0);
        self.target += (subject - self.target) * k;
    }

    fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.target + self.framing.offset(),
            target: self.target,
            up: CANONICAL_UP,
            fov_deg: None,
        }
    }
}

/// A recorded camera track bound to the driver
#[derive(Debug, Clone)]
pub struct CameraBinding {
    /// Binding and its capability flags
    pub binding: ActorBinding,
    /// The recorded motion
    pub track: CameraTrack,
}

/// Result of a mode switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    /// Outgoing mode
    pub from: CameraMode,
    /// Incoming mode
    pub to: CameraMode,
}

/// Produces the camera pose for the active mode
#[derive(Debug, Clone)]
pub struct CameraTrackDriver {
    mode: CameraMode,
    camera: Camera,
    track: BindingSlot<CameraBinding>,
    orbit: OrbitController,
    composition: CompositionRig,
}

impl CameraTrackDriver {
    /// Create a driver starting in `mode`
    pub fn new(mode: CameraMode, camera: Camera) -> Self {
        let orbit = OrbitController::new(&camera);
        let composition = CompositionRig::new(&camera);
        Self {
            mode,
            camera,
            track: BindingSlot::Empty,
            orbit,
            composition,
        }
    }

    /// Active mode
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// The camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Update the aspect ratio for a new viewport size
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    /// Orbit controls
    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    /// Orbit controls, for changing auto-rotation settings
    pub fn orbit_mut(&mut self) -> &mut OrbitController {
        &mut self.orbit
    }

    /// Composition rig
    pub fn composition(&self) -> &CompositionRig {
        &self.composition
    }

    /// Composition rig, for changing smoothing
    pub fn composition_mut(&mut self) -> &mut CompositionRig {
        &mut self.composition
    }

    /// Bound camera track, if ready
    pub fn track_binding(&self) -> Option<&CameraBinding> {
        self.track.ready()
    }

    /// Whether a recorded track is installed
    pub fn is_track_ready(&self) -> bool {
        self.track.ready().is_some()
    }

    /// Whether a track was torn down and its replacement is not installed yet
    pub fn is_track_swapping(&self) -> bool {
        self.track.is_swapping()
    }

    /// Whether the recorded track currently owns the pose
    pub fn has_track_authority(&self) -> bool {
        self.mode == CameraMode::MotionFile
            && self
                .track
                .ready()
                .is_some_and(|b| b.binding.capabilities.camera_animation)
    }

    /// Install a recorded track, replacing any previous one
    pub fn bind_track(&mut self, track: CameraTrack) -> BindingId {
        let binding = ActorBinding::camera(BindingId::new(), self.mode == CameraMode::MotionFile);
        let id = binding.id;
        tracing::info!(
            "Camera track '{}' bound as {} ({:.2}s)",
            track.name,
            id,
            track.duration()
        );
        self.track = BindingSlot::Ready(CameraBinding { binding, track });
        id
    }

    /// Tear down the bound track; the driver holds the last pose until a new one is bound
    pub fn unbind_track(&mut self, id: BindingId) -> bool {
        if self.track.ready().map(|b| b.binding.id) != Some(id) {
            return false;
        }
        self.track = BindingSlot::Swapping { previous: id };
        tracing::debug!("Camera track {} unbound", id);
        true
    }

    /// Compute the pose for `time` without touching the camera
    pub fn stage(&self, time: f64) -> StagedPose {
        match self.mode {
            CameraMode::MotionFile => {
                if !self.has_track_authority() {
                    return StagedPose(None);
                }
                let pose = self
                    .track
                    .ready()
                    .map(|b| CameraPose::from_track(&b.track, time as f32));
                StagedPose(pose)
            }
            CameraMode::Orbit | CameraMode::Composition => StagedPose(None),
        }
    }

    /// Apply a staged pose
    pub fn commit(&mut self, staged: StagedPose) {
        if let Some(pose) = staged.0 {
            self.camera.apply(&pose);
        }
    }

    /// Pose the camera for an absolute media time
    pub fn set_time(&mut self, time: f64) {
        let staged = self.stage(time);
        self.commit(staged);
    }

    /// Advance time-based interactive motion by a wall-clock delta
    pub fn tick(&mut self, wall_delta: f64) {
        match self.mode {
            CameraMode::MotionFile | CameraMode::Composition => {}
            CameraMode::Orbit => {
                if self.orbit.auto_rotate {
                    self.orbit.advance(wall_delta as f32);
                    let pose = self.orbit.pose();
                    self.camera.apply(&pose);
                }
            }
        }
    }

    /// Record the subject point and, in composition mode, follow it
    pub fn follow_subject(&mut self, subject: Option<Vec3>, wall_delta: f64) {
        if subject.is_some() {
            self.composition.subject = subject;
        }
        match self.mode {
            CameraMode::MotionFile | CameraMode::Orbit => {}
            CameraMode::Composition => {
                self.composition.follow(wall_delta as f32);
                let pose = self.composition.pose();
                self.camera.apply(&pose);
            }
        }
    }

    /// Apply user input; ignored while the recorded track owns the camera
    pub fn input(&mut self, input: OrbitInput) -> bool {
        let pose = match self.mode {
            CameraMode::MotionFile => return false,
            CameraMode::Orbit => {
                self.orbit.orbit.apply_input(input);
                self.orbit.pose()
            }
            CameraMode::Composition => {
                self.composition.framing.apply_input(input);
                self.composition.pose()
            }
        };
        self.camera.apply(&pose);
        true
    }

    /// Switch the pose authority to `to`.
    ///
    /// The outgoing mode is disabled first; leaving `MotionFile` restores the
    /// canonical up vector and recomputes the projection before the incoming
    /// mode takes over. Returns `None` when `to` is already active.
    pub fn switch_mode(&mut self, to: CameraMode) -> Option<ModeSwitch> {
        let from = self.mode;
        if from == to {
            return None;
        }

        match from {
            CameraMode::MotionFile => {
                if let Some(bound) = self.track.ready_mut() {
                    bound.binding.capabilities.set(Capability::CameraAnimation, false);
                }
                self.camera.up = CANONICAL_UP;
                self.camera.update_projection_matrix();
            }
            CameraMode::Orbit | CameraMode::Composition => {}
        }

        self.mode = to;

        match to {
            CameraMode::MotionFile => {
                if let Some(bound) = self.track.ready_mut() {
                    bound.binding.capabilities.set(Capability::CameraAnimation, true);
                }
            }
            CameraMode::Orbit => {
                self.orbit.sync_from(&self.camera);
                let pose = self.orbit.pose();
                self.camera.apply(&pose);
            }
            CameraMode::Composition => {
                self.composition.sync_from(&self.camera);
                let pose = self.composition.pose();
                self.camera.apply(&pose);
            }
        }

        tracing::info!("Camera mode: {} -> {}", from, to);
        Some(ModeSwitch { from, to })
    }
}
