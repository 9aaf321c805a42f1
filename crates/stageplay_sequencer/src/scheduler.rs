// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame scheduler.
//!
//! Once per display refresh [`FrameScheduler::step_frame`] samples the time
//! source, classifies the frame against the last committed time and drives the
//! actor runtime and camera driver:
//! - Idle (`delta == 0`): wall-clock camera tick and physics step only
//! - Continuous (`|delta| <= seek_threshold`): one coupled `advance_by`
//! - Discontinuous (`|delta| > seek_threshold`): physics off, `advance_to`,
//!   physics reset, physics back on if configured
//!
//! `previous_time` is committed only after the whole frame succeeded.

use crate::binding::{ActorBinding, BindingId, Capabilities, Capability};
use crate::camera::{Camera, CameraMode, CameraTrackDriver, OrbitInput};
use crate::clock::{ClockSample, SystemWallClock, TimeSource, WallClock};
use crate::config::PlaybackConfig;
use crate::error::{Result, RuntimeOp, SyncError};
use crate::runtime::{ActorRuntime, RuntimeResult};
use crate::session::Session;
use crate::track::CameraTrack;

/// How a frame relates to the last committed time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameClass {
    /// No time change
    Idle,
    /// Normal forward (or small backward) playback
    Continuous,
    /// Time jump larger than the seek threshold
    Discontinuous,
}

impl FrameClass {
    /// Classify a frame delta
    #[allow(clippy::float_cmp)]
    pub fn classify(delta: f64, seek_threshold: f64) -> Self {
        if delta == 0.0 {
            Self::Idle
        } else if delta.abs() > seek_threshold {
            Self::Discontinuous
        } else {
            Self::Continuous
        }
    }
}

/// Why a frame was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The player reported its position exactly on the duration
    AtEnd,
}

/// Summary of one processed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Classification
    pub class: FrameClass,
    /// Committed motion time
    pub time: f64,
    /// Delta against the previous committed time
    pub delta: f64,
    /// The loop flag was observed and playback stopped at the start
    pub looped: bool,
    /// A character binding received this frame's work
    pub character_driven: bool,
}

/// Result of [`FrameScheduler::step_frame`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Nothing changed
    Skipped(SkipReason),
    /// The frame was fully applied and committed
    Processed(FrameReport),
}

/// Running frame counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames fully processed
    pub processed: u64,
    /// Frames skipped at the end boundary
    pub skipped: u64,
    /// Idle frames
    pub idle: u64,
    /// Continuous frames
    pub continuous: u64,
    /// Discontinuous frames (seeks)
    pub seeks: u64,
    /// Loop stops
    pub loops: u64,
    /// Frames abandoned because a runtime call failed
    pub failures: u64,
}

impl FrameStats {
    fn record(&mut self, class: FrameClass) {
        self.processed += 1;
        match class {
            FrameClass::Idle => self.idle += 1,
            FrameClass::Continuous => self.continuous += 1,
            FrameClass::Discontinuous => self.seeks += 1,
        }
    }
}

fn checked(op: RuntimeOp, id: BindingId, result: RuntimeResult) -> Result<()> {
    result.map_err(|source| SyncError::runtime(op, id, source))
}

/// Per-frame synchronization of character, physics and camera to a media clock
pub struct FrameScheduler<S, R, W = SystemWallClock> {
    source: S,
    runtime: R,
    wall_clock: W,
    session: Session,
    config: PlaybackConfig,
    previous_time: f64,
    stats: FrameStats,
}

impl<S, R, W> FrameScheduler<S, R, W>
where
    S: TimeSource,
    R: ActorRuntime,
    W: WallClock,
{
    /// Create a scheduler with an empty session
    pub fn new(source: S, runtime: R, wall_clock: W, config: PlaybackConfig) -> Self {
        let mut camera = CameraTrackDriver::new(config.camera_mode, Camera::default());
        camera.orbit_mut().auto_rotate = config.auto_rotate;
        camera.orbit_mut().auto_rotate_speed = config.auto_rotate_speed;
        camera.composition_mut().follow_smooth = config.follow_smooth;

        Self {
            source,
            runtime,
            wall_clock,
            session: Session::new(camera),
            config,
            previous_time: 0.0,
            stats: FrameStats::default(),
        }
    }

    /// Last committed motion time
    pub fn previous_time(&self) -> f64 {
        self.previous_time
    }

    /// Frame counters
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Camera track driver
    pub fn camera(&self) -> &CameraTrackDriver {
        self.session.camera()
    }

    /// Update the viewport size used for the camera projection
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.session.camera_mut().set_viewport(width, height);
    }

    /// Time source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable time source, for host transport controls
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Actor runtime
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Mutable actor runtime, for asset loading
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// Whether an asset swap is in progress
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    /// Process one display refresh
    pub fn step_frame(&mut self) -> Result<FrameOutcome> {
        let raw_tick = self.wall_clock.delta();
        let wall_delta = if raw_tick.is_finite() {
            raw_tick.clamp(0.0, self.config.timing.max_idle_tick)
        } else {
            0.0
        };

        let sample = ClockSample::read(&self.source, self.config.motion_offset_ms);
        if sample.is_at_end {
            self.stats.skipped += 1;
            tracing::trace!("Frame skipped at end boundary ({:.3}s)", sample.time);
            return Ok(FrameOutcome::Skipped(SkipReason::AtEnd));
        }

        let delta = sample.time - self.previous_time;
        let class = FrameClass::classify(delta, self.config.timing.seek_threshold);
        tracing::trace!("Frame {:?}: time={:.4} delta={:.4}", class, sample.time, delta);

        match self.process(class, sample.time, delta, wall_delta) {
            Ok(report) => {
                self.stats.record(class);
                if report.looped {
                    self.stats.loops += 1;
                }
                Ok(FrameOutcome::Processed(report))
            }
            Err(err) => {
                self.stats.failures += 1;
                tracing::warn!("Frame abandoned at {:.3}s: {}", sample.time, err);
                Err(err)
            }
        }
    }

    fn process(
        &mut self,
        class: FrameClass,
        time: f64,
        delta: f64,
        wall_delta: f64,
    ) -> Result<FrameReport> {
        let character = self.session.character().cloned();

        match class {
            FrameClass::Idle => {
                if let Some(binding) = &character {
                    if binding.capabilities.physics {
                        checked(
                            RuntimeOp::StepPhysics,
                            binding.id,
                            self.runtime.step_physics(binding.id, wall_delta),
                        )?;
                    }
                }
                // camera moves only once the runtime accepted the frame
                if self.session.camera().mode().is_interactive() {
                    self.session.camera_mut().tick(wall_delta);
                }
            }
            FrameClass::Discontinuous => {
                let staged = self.session.camera().stage(time);
                if let Some(binding) = &character {
                    self.resync(binding, time)?;
                }
                self.session.camera_mut().commit(staged);
                tracing::info!("Time seeked to {:.3}s, physics reset", time);
            }
            FrameClass::Continuous => {
                let staged = self.session.camera().stage(time);
                if let Some(binding) = &character {
                    checked(
                        RuntimeOp::AdvanceBy,
                        binding.id,
                        self.runtime.advance_by(binding.id, delta),
                    )?;
                }
                self.session.camera_mut().commit(staged);
            }
        }

        let subject = character
            .as_ref()
            .and_then(|binding| self.runtime.focus_point(binding.id));
        self.session.camera_mut().follow_subject(subject, wall_delta);

        self.previous_time = time;

        let looped = match &character {
            Some(binding) => self.handle_loop(binding.id)?,
            None => false,
        };

        Ok(FrameReport {
            class,
            time,
            delta,
            looped,
            character_driven: character.is_some(),
        })
    }

    /// Jump the character to `time` and rebuild its rigid bodies from the new pose
    fn resync(&mut self, binding: &ActorBinding, time: f64) -> Result<()> {
        let id = binding.id;
        checked(
            RuntimeOp::SetEnabled(Capability::Physics),
            id,
            self.runtime.set_enabled(id, Capability::Physics, false),
        )?;
        let reposed = checked(RuntimeOp::AdvanceTo, id, self.runtime.advance_to(id, time))
            .and_then(|()| {
                checked(RuntimeOp::ResetPhysics, id, self.runtime.reset_physics(id))
            });
        if !binding.capabilities.physics {
            return reposed;
        }

        // physics comes back on even when the re-pose failed
        let restored = checked(
            RuntimeOp::SetEnabled(Capability::Physics),
            id,
            self.runtime.set_enabled(id, Capability::Physics, true),
        );
        reposed.and(restored)
    }

    /// Stop at the start once the animation wrapped
    fn handle_loop(&mut self, id: BindingId) -> Result<bool> {
        if !self.runtime.consume_loop_flag(id) {
            return Ok(false);
        }

        self.source.pause();
        self.source.set_current_time(0.0);
        checked(RuntimeOp::ResetPhysics, id, self.runtime.reset_physics(id))?;
        checked(
            RuntimeOp::StepPhysics,
            id,
            self.runtime.step_physics(id, self.config.timing.settle_tick),
        )?;
        tracing::info!("Motion looped, playback stopped at start");
        Ok(true)
    }

    /// Install the primary character.
    ///
    /// Any other installed character is torn down first. The new actor is posed
    /// at the last committed time, its capabilities applied and its physics
    /// reset; it only receives per-frame work once all of that succeeded.
    pub fn bind_character(&mut self, id: BindingId, capabilities: Capabilities) -> Result<()> {
        if let Some(current) = self.session.character().map(|b| b.id) {
            if current != id {
                self.unbind(current)?;
            }
        }

        let mut capabilities = capabilities;
        capabilities.set(
            Capability::CameraAnimation,
            self.session.camera().mode() == CameraMode::MotionFile,
        );

        checked(
            RuntimeOp::AdvanceTo,
            id,
            self.runtime.advance_to(id, self.previous_time),
        )?;
        for capability in Capability::ALL {
            checked(
                RuntimeOp::SetEnabled(capability),
                id,
                self.runtime.set_enabled(id, capability, capabilities.get(capability)),
            )?;
        }
        checked(RuntimeOp::ResetPhysics, id, self.runtime.reset_physics(id))?;

        self.session
            .install_character(ActorBinding::character(id, capabilities));
        tracing::info!("Character {} bound at {:.3}s", id, self.previous_time);
        Ok(())
    }

    /// Install a recorded camera track
    pub fn bind_camera(&mut self, track: CameraTrack) -> BindingId {
        let previous_time = self.previous_time;
        let camera = self.session.camera_mut();
        let id = camera.bind_track(track);
        camera.set_time(previous_time);
        id
    }

    /// Tear down a binding ahead of an asset swap.
    ///
    /// Until a replacement is bound the scheduler skips all per-frame work for
    /// it. Returns `false` for bindings that are not installed.
    pub fn unbind(&mut self, id: BindingId) -> Result<bool> {
        if let Some(binding) = self.session.begin_character_swap(id) {
            tracing::info!("Character {} unbound, waiting for replacement", id);
            for capability in Capability::ALL {
                if binding.capabilities.get(capability) {
                    checked(
                        RuntimeOp::SetEnabled(capability),
                        id,
                        self.runtime.set_enabled(id, capability, false),
                    )?;
                }
            }
            return Ok(true);
        }

        Ok(self.session.camera_mut().unbind_track(id))
    }

    /// Switch the camera mode.
    ///
    /// The character's `camera_animation` capability follows the mode. Entering
    /// `MotionFile` poses the camera at the last committed time right away.
    pub fn on_mode_change(&mut self, mode: CameraMode) -> Result<()> {
        if self.session.camera().mode() == mode {
            return Ok(());
        }

        // The runtime is told first; on failure the driver and binding keep the old mode
        let motion_file = mode == CameraMode::MotionFile;
        if let Some(binding) = self.session.character() {
            if binding.capabilities.camera_animation != motion_file {
                let id = binding.id;
                checked(
                    RuntimeOp::SetEnabled(Capability::CameraAnimation),
                    id,
                    self.runtime
                        .set_enabled(id, Capability::CameraAnimation, motion_file),
                )?;
            }
        }
        if let Some(binding) = self.session.character_mut() {
            binding.capabilities.camera_animation = motion_file;
        }

        self.session.camera_mut().switch_mode(mode);
        self.config.camera_mode = mode;

        if motion_file {
            let previous_time = self.previous_time;
            self.session.camera_mut().set_time(previous_time);
        }
        Ok(())
    }

    /// Toggle rigid-body physics for the primary character
    pub fn set_physics(&mut self, on: bool) -> Result<()> {
        self.config.physics = on;
        let Some(binding) = self.session.character_mut() else {
            return Ok(());
        };
        binding.capabilities.physics = on;
        let id = binding.id;
        checked(
            RuntimeOp::SetEnabled(Capability::Physics),
            id,
            self.runtime.set_enabled(id, Capability::Physics, on),
        )?;
        tracing::debug!("Physics {}", if on { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Toggle orbit auto-rotation
    pub fn set_auto_rotate(&mut self, on: bool) {
        self.config.auto_rotate = on;
        self.session.camera_mut().orbit_mut().auto_rotate = on;
    }

    /// Change the motion offset (milliseconds)
    pub fn set_motion_offset(&mut self, offset_ms: f64) {
        if offset_ms.is_finite() {
            self.config.motion_offset_ms = offset_ms;
        }
    }

    /// Forward user camera input; ignored in `MotionFile` mode
    pub fn camera_input(&mut self, input: OrbitInput) -> bool {
        self.session.camera_mut().input(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppedWallClock;
    use crate::error::RuntimeError;
    use crate::keyframe::{Keyframe, KeyframeValue};
    use glam::Vec3;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetEnabled(BindingId, Capability, bool),
        AdvanceTo(BindingId, f64),
        AdvanceBy(BindingId, f64),
        ResetPhysics(BindingId),
        StepPhysics(BindingId, f64),
    }

    #[derive(Default)]
    struct RecordingRuntime {
        calls: Vec<Call>,
        loop_flag: bool,
        fail: Option<RuntimeOp>,
        focus: Option<Vec3>,
    }

    impl RecordingRuntime {
        fn record(&mut self, op: RuntimeOp, call: Call) -> RuntimeResult {
            if self.fail == Some(op) {
                return Err(RuntimeError::Pose(format!("injected {op}")));
            }
            self.calls.push(call);
            Ok(())
        }
    }

    impl ActorRuntime for RecordingRuntime {
        fn set_enabled(
            &mut self,
            id: BindingId,
            capability: Capability,
            on: bool,
        ) -> RuntimeResult {
            self.record(
                RuntimeOp::SetEnabled(capability),
                Call::SetEnabled(id, capability, on),
            )
        }
        fn advance_to(&mut self, id: BindingId, time: f64) -> RuntimeResult {
            self.record(RuntimeOp::AdvanceTo, Call::AdvanceTo(id, time))
        }
        fn advance_by(&mut self, id: BindingId, delta: f64) -> RuntimeResult {
            self.record(RuntimeOp::AdvanceBy, Call::AdvanceBy(id, delta))
        }
        fn reset_physics(&mut self, id: BindingId) -> RuntimeResult {
            self.record(RuntimeOp::ResetPhysics, Call::ResetPhysics(id))
        }
        fn step_physics(&mut self, id: BindingId, delta: f64) -> RuntimeResult {
            self.record(RuntimeOp::StepPhysics, Call::StepPhysics(id, delta))
        }
        fn consume_loop_flag(&mut self, _id: BindingId) -> bool {
            std::mem::take(&mut self.loop_flag)
        }
        fn focus_point(&self, _id: BindingId) -> Option<Vec3> {
            self.focus
        }
    }

    struct ScriptedSource {
        time: f64,
        duration: f64,
        paused: bool,
    }

    impl TimeSource for ScriptedSource {
        fn current_time(&self) -> f64 {
            self.time
        }
        fn duration(&self) -> f64 {
            self.duration
        }
        fn pause(&mut self) {
            self.paused = true;
        }
        fn set_current_time(&mut self, seconds: f64) {
            self.time = seconds;
        }
        fn is_paused(&self) -> bool {
            self.paused
        }
    }

    type TestScheduler = FrameScheduler<ScriptedSource, RecordingRuntime, SteppedWallClock>;

    fn scheduler(config: PlaybackConfig) -> TestScheduler {
        let source = ScriptedSource {
            time: 0.0,
            duration: 60.0,
            paused: false,
        };
        FrameScheduler::new(
            source,
            RecordingRuntime::default(),
            SteppedWallClock::from_fps(60.0),
            config,
        )
    }

    /// Scheduler with a bound character and `previous_time` committed at `time`
    fn scheduler_at(time: f64, physics: bool) -> (TestScheduler, BindingId) {
        let mut config = PlaybackConfig::default();
        config.physics = physics;
        let mut sched = scheduler(config);
        let id = BindingId::new();
        sched
            .bind_character(id, Capabilities::default().with(Capability::Physics, physics))
            .unwrap();
        sched.source_mut().time = time;
        sched.step_frame().unwrap();
        assert_eq!(sched.previous_time(), time);
        sched.runtime_mut().calls.clear();
        (sched, id)
    }

    fn demo_track() -> CameraTrack {
        let mut track = CameraTrack::new("sweep");
        track.add_target(Keyframe::new(0.0, KeyframeValue::Vec3([0.0, 10.0, 0.0])));
        track.add_target(Keyframe::new(60.0, KeyframeValue::Vec3([60.0, 10.0, 0.0])));
        track.add_distance(Keyframe::new(0.0, KeyframeValue::Float(25.0)));
        track
    }

    fn advance_by_calls(calls: &[Call]) -> Vec<f64> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::AdvanceBy(_, d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(FrameClass::classify(0.0, 0.1), FrameClass::Idle);
        assert_eq!(FrameClass::classify(0.03, 0.1), FrameClass::Continuous);
        assert_eq!(FrameClass::classify(0.1, 0.1), FrameClass::Continuous);
        assert_eq!(FrameClass::classify(-0.1, 0.1), FrameClass::Continuous);
        assert_eq!(FrameClass::classify(0.1001, 0.1), FrameClass::Discontinuous);
        assert_eq!(FrameClass::classify(-35.0, 0.1), FrameClass::Discontinuous);
    }

    #[test]
    fn test_continuous_frame_advances_once() {
        let (mut sched, id) = scheduler_at(2.0, true);
        sched.source_mut().time = 2.03;

        let outcome = sched.step_frame().unwrap();
        let FrameOutcome::Processed(report) = outcome else {
            panic!("expected a processed frame, got {outcome:?}");
        };
        assert_eq!(report.class, FrameClass::Continuous);

        let calls = &sched.runtime().calls;
        assert_eq!(calls.len(), 1);
        match calls[0] {
            Call::AdvanceBy(bound, delta) => {
                assert_eq!(bound, id);
                assert!((delta - 0.03).abs() < 1e-9);
            }
            ref other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(sched.previous_time(), 2.03);
    }

    #[test]
    fn test_small_deltas_never_touch_physics() {
        for delta in [0.001, 0.016, 0.05, 0.099, -0.02, -0.099] {
            let (mut sched, _) = scheduler_at(5.0, true);
            sched.source_mut().time = 5.0 + delta;
            sched.step_frame().unwrap();

            let calls = &sched.runtime().calls;
            let advances = advance_by_calls(calls);
            assert_eq!(advances.len(), 1, "delta {delta}");
            assert!((advances[0] - delta).abs() < 1e-9);
            assert!(
                calls.iter().all(|c| matches!(c, Call::AdvanceBy(..))),
                "delta {delta}: {calls:?}"
            );
        }
    }

    #[test]
    fn test_seek_resyncs_physics() {
        let (mut sched, id) = scheduler_at(5.0, true);
        sched.source_mut().time = 40.0;

        let outcome = sched.step_frame().unwrap();
        assert!(matches!(
            outcome,
            FrameOutcome::Processed(FrameReport { class: FrameClass::Discontinuous, .. })
        ));
        assert_eq!(
            sched.runtime().calls,
            vec![
                Call::SetEnabled(id, Capability::Physics, false),
                Call::AdvanceTo(id, 40.0),
                Call::ResetPhysics(id),
                Call::SetEnabled(id, Capability::Physics, true),
            ]
        );
        assert_eq!(sched.previous_time(), 40.0);
        assert_eq!(sched.stats().seeks, 2);
    }

    #[test]
    fn test_seek_sequence_for_any_large_delta() {
        let cases = [
            (0.11, true),
            (1.0, false),
            (-0.5, true),
            (-5.0, false),
            (30.0, true),
        ];
        for (delta, physics) in cases {
            let (mut sched, id) = scheduler_at(10.0, physics);
            let time = 10.0 + delta;
            sched.source_mut().time = time;
            sched.step_frame().unwrap();

            let mut expected = vec![
                Call::SetEnabled(id, Capability::Physics, false),
                Call::AdvanceTo(id, time),
                Call::ResetPhysics(id),
            ];
            if physics {
                expected.push(Call::SetEnabled(id, Capability::Physics, true));
            }
            assert_eq!(sched.runtime().calls, expected, "delta {delta}");
        }
    }

    #[test]
    fn test_at_end_frame_is_skipped() {
        let (mut sched, _) = scheduler_at(59.95, true);
        sched.source_mut().time = 60.0;

        let outcome = sched.step_frame().unwrap();
        assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::AtEnd));
        assert_eq!(sched.previous_time(), 59.95);
        assert!(sched.runtime().calls.is_empty());
        assert_eq!(sched.stats().skipped, 1);
    }

    #[test]
    fn test_loop_stops_at_start() {
        let (mut sched, id) = scheduler_at(59.95, true);
        sched.source_mut().time = 59.98;
        sched.runtime_mut().loop_flag = true;

        let outcome = sched.step_frame().unwrap();
        let FrameOutcome::Processed(report) = outcome else {
            panic!("expected a processed frame, got {outcome:?}");
        };
        assert!(report.looped);
        assert!(sched.source().paused);
        assert_eq!(sched.source().time, 0.0);
        assert!(!sched.runtime().loop_flag);

        let calls = &sched.runtime().calls;
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Call::AdvanceBy(..)));
        assert_eq!(calls[1], Call::ResetPhysics(id));
        assert_eq!(calls[2], Call::StepPhysics(id, 0.1));
        assert_eq!(sched.stats().loops, 1);

        // next frame jumps the pose back to the start
        sched.runtime_mut().calls.clear();
        sched.step_frame().unwrap();
        assert_eq!(sched.previous_time(), 0.0);
        assert!(sched.runtime().calls.contains(&Call::AdvanceTo(id, 0.0)));
    }

    #[test]
    fn test_idle_frames_are_idempotent() {
        let (mut sched, id) = scheduler_at(12.0, true);
        for _ in 0..5 {
            let outcome = sched.step_frame().unwrap();
            assert!(matches!(
                outcome,
                FrameOutcome::Processed(FrameReport { class: FrameClass::Idle, .. })
            ));
            assert_eq!(sched.previous_time(), 12.0);
        }

        let calls = &sched.runtime().calls;
        assert_eq!(calls.len(), 5);
        for call in calls {
            match call {
                Call::StepPhysics(bound, dt) => {
                    assert_eq!(*bound, id);
                    assert!((dt - 1.0 / 60.0).abs() < 1e-9);
                }
                other => panic!("unexpected call {other:?}"),
            }
        }
    }

    #[test]
    fn test_idle_without_physics_does_nothing() {
        let (mut sched, _) = scheduler_at(12.0, false);
        sched.step_frame().unwrap();
        sched.step_frame().unwrap();
        assert!(sched.runtime().calls.is_empty());
    }

    #[test]
    fn test_idle_tick_is_clamped() {
        let (mut sched, id) = scheduler_at(3.0, true);
        sched.wall_clock.step = 0.75;
        sched.step_frame().unwrap();
        assert_eq!(sched.runtime().calls, vec![Call::StepPhysics(id, 0.1)]);
    }

    #[test]
    fn test_failed_seek_is_not_committed() {
        let (mut sched, id) = scheduler_at(2.0, true);
        sched.bind_camera(demo_track());
        let target_before = sched.camera().camera().target;

        sched.runtime_mut().fail = Some(RuntimeOp::AdvanceTo);
        sched.source_mut().time = 40.0;
        let err = sched.step_frame().unwrap_err();
        match err {
            SyncError::Runtime { op, binding, .. } => {
                assert_eq!(op, RuntimeOp::AdvanceTo);
                assert_eq!(binding, id);
            }
        }
        assert_eq!(sched.previous_time(), 2.0);
        assert_eq!(sched.camera().camera().target, target_before);
        assert_eq!(sched.stats().failures, 1);

        // next frame retries from the last good time
        sched.runtime_mut().fail = None;
        sched.runtime_mut().calls.clear();
        sched.step_frame().unwrap();
        assert!(sched.runtime().calls.contains(&Call::AdvanceTo(id, 40.0)));
        assert_eq!(sched.previous_time(), 40.0);
        assert!((sched.camera().camera().target.x - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_failed_advance_by_keeps_previous_time() {
        let (mut sched, _) = scheduler_at(2.0, true);
        sched.runtime_mut().fail = Some(RuntimeOp::AdvanceBy);
        sched.source_mut().time = 2.02;
        assert!(sched.step_frame().is_err());
        assert_eq!(sched.previous_time(), 2.0);
    }

    #[test]
    fn test_failed_seek_restores_physics() {
        let (mut sched, id) = scheduler_at(5.0, true);
        sched.runtime_mut().fail = Some(RuntimeOp::AdvanceTo);
        sched.source_mut().time = 40.0;
        assert!(sched.step_frame().is_err());
        assert_eq!(
            sched.runtime().calls,
            vec![
                Call::SetEnabled(id, Capability::Physics, false),
                Call::SetEnabled(id, Capability::Physics, true),
            ]
        );

        // the player settles back near the last good time
        sched.runtime_mut().fail = None;
        sched.runtime_mut().calls.clear();
        for time in [5.02, 5.04] {
            sched.source_mut().time = time;
            sched.step_frame().unwrap();
        }
        assert_eq!(advance_by_calls(&sched.runtime().calls).len(), 2);
        assert!(sched.session().character().unwrap().capabilities.physics);
    }

    #[test]
    fn test_failed_seek_without_physics_stays_disabled() {
        let (mut sched, id) = scheduler_at(5.0, false);
        sched.runtime_mut().fail = Some(RuntimeOp::ResetPhysics);
        sched.source_mut().time = 40.0;
        assert!(sched.step_frame().is_err());
        assert_eq!(
            sched.runtime().calls,
            vec![
                Call::SetEnabled(id, Capability::Physics, false),
                Call::AdvanceTo(id, 40.0),
            ]
        );
    }

    #[test]
    fn test_failed_idle_step_leaves_camera_still() {
        let mut config = PlaybackConfig::default();
        config.camera_mode = CameraMode::Orbit;
        config.auto_rotate = true;
        let mut sched = scheduler(config);
        sched
            .bind_character(BindingId::new(), Capabilities::default())
            .unwrap();
        sched.source_mut().time = 1.0;
        sched.step_frame().unwrap();

        let before = sched.camera().camera().clone();
        let yaw = sched.camera().orbit().yaw();
        sched.runtime_mut().fail = Some(RuntimeOp::StepPhysics);
        assert!(sched.step_frame().is_err());
        assert_eq!(sched.camera().camera(), &before);
        assert_eq!(sched.camera().orbit().yaw(), yaw);

        sched.runtime_mut().fail = None;
        sched.step_frame().unwrap();
        assert_ne!(sched.camera().orbit().yaw(), yaw);
    }

    #[test]
    fn test_failed_mode_change_keeps_previous_mode() {
        let (mut sched, id) = scheduler_at(6.0, true);
        sched.bind_camera(demo_track());
        sched.runtime_mut().fail = Some(RuntimeOp::SetEnabled(Capability::CameraAnimation));

        assert!(sched.on_mode_change(CameraMode::Orbit).is_err());
        assert_eq!(sched.camera().mode(), CameraMode::MotionFile);
        assert!(sched.camera().has_track_authority());
        assert_eq!(sched.config().camera_mode, CameraMode::MotionFile);
        assert!(sched.session().character().unwrap().capabilities.camera_animation);

        // retrying reaches the runtime again
        sched.runtime_mut().fail = None;
        sched.on_mode_change(CameraMode::Orbit).unwrap();
        assert_eq!(
            sched.runtime().calls,
            vec![Call::SetEnabled(id, Capability::CameraAnimation, false)]
        );
        assert_eq!(sched.camera().mode(), CameraMode::Orbit);
        assert!(!sched.session().character().unwrap().capabilities.camera_animation);
    }

    #[test]
    fn test_unbound_character_receives_no_work() {
        let (mut sched, id) = scheduler_at(4.0, true);
        assert!(sched.unbind(id).unwrap());
        assert!(sched.is_loading());
        assert_eq!(
            sched.runtime().calls,
            vec![
                Call::SetEnabled(id, Capability::Animation, false),
                Call::SetEnabled(id, Capability::Physics, false),
                Call::SetEnabled(id, Capability::CameraAnimation, false),
            ]
        );
        sched.runtime_mut().calls.clear();

        // mid-swap calls are no-ops
        assert!(!sched.unbind(id).unwrap());
        sched.set_physics(false).unwrap();

        for time in [4.02, 9.0, 9.0] {
            sched.source_mut().time = time;
            let outcome = sched.step_frame().unwrap();
            assert!(matches!(
                outcome,
                FrameOutcome::Processed(FrameReport { character_driven: false, .. })
            ));
        }
        assert!(sched.runtime().calls.is_empty());
        assert_eq!(sched.previous_time(), 9.0);

        let replacement = BindingId::new();
        sched.bind_character(replacement, Capabilities::default()).unwrap();
        assert!(!sched.is_loading());
        assert_eq!(sched.runtime().calls[0], Call::AdvanceTo(replacement, 9.0));
        assert_eq!(
            sched.runtime().calls.last(),
            Some(&Call::ResetPhysics(replacement))
        );
    }

    #[test]
    fn test_bind_replaces_previous_character() {
        let (mut sched, old) = scheduler_at(1.0, true);
        let new = BindingId::new();
        sched.bind_character(new, Capabilities::default()).unwrap();

        let calls = &sched.runtime().calls;
        assert_eq!(calls[0], Call::SetEnabled(old, Capability::Animation, false));
        assert!(calls.contains(&Call::AdvanceTo(new, 1.0)));
        assert_eq!(sched.session().character().unwrap().id, new);
    }

    #[test]
    fn test_mode_change_mirrors_camera_animation() {
        let (mut sched, id) = scheduler_at(6.0, true);
        sched.bind_camera(demo_track());
        assert!(sched.session().character().unwrap().capabilities.camera_animation);

        sched.on_mode_change(CameraMode::Orbit).unwrap();
        assert_eq!(
            sched.runtime().calls,
            vec![Call::SetEnabled(id, Capability::CameraAnimation, false)]
        );
        assert_eq!(sched.config().camera_mode, CameraMode::Orbit);
        assert_eq!(sched.camera().camera().up, crate::camera::CANONICAL_UP);

        // playback in orbit mode leaves the camera alone
        sched.source_mut().time = 20.0;
        let before = sched.camera().camera().clone();
        sched.step_frame().unwrap();
        assert_eq!(sched.camera().camera(), &before);

        sched.runtime_mut().calls.clear();
        sched.on_mode_change(CameraMode::MotionFile).unwrap();
        assert_eq!(
            sched.runtime().calls,
            vec![Call::SetEnabled(id, Capability::CameraAnimation, true)]
        );
        assert!((sched.camera().camera().target.x - 20.0).abs() < 1e-3);

        sched.runtime_mut().calls.clear();
        sched.on_mode_change(CameraMode::MotionFile).unwrap();
        assert!(sched.runtime().calls.is_empty());
    }

    #[test]
    fn test_set_physics_updates_binding() {
        let (mut sched, id) = scheduler_at(1.0, true);
        sched.set_physics(false).unwrap();
        assert_eq!(
            sched.runtime().calls,
            vec![Call::SetEnabled(id, Capability::Physics, false)]
        );
        assert!(!sched.config().physics);

        // seeks no longer re-enable physics
        sched.runtime_mut().calls.clear();
        sched.source_mut().time = 30.0;
        sched.step_frame().unwrap();
        assert!(!sched
            .runtime()
            .calls
            .contains(&Call::SetEnabled(id, Capability::Physics, true)));
    }

    #[test]
    fn test_auto_rotate_runs_on_idle_frames_only() {
        let mut config = PlaybackConfig::default();
        config.camera_mode = CameraMode::Orbit;
        config.auto_rotate = true;
        let mut sched = scheduler(config);
        sched.source_mut().time = 1.0;
        sched.step_frame().unwrap();

        let yaw = sched.camera().orbit().yaw();
        sched.step_frame().unwrap();
        assert_ne!(sched.camera().orbit().yaw(), yaw);

        let yaw = sched.camera().orbit().yaw();
        sched.source_mut().time = 1.016;
        sched.step_frame().unwrap();
        assert_eq!(sched.camera().orbit().yaw(), yaw);
    }

    #[test]
    fn test_composition_follows_focus_point() {
        let mut config = PlaybackConfig::default();
        config.camera_mode = CameraMode::Composition;
        config.follow_smooth = 1.0;
        let mut sched = scheduler(config);
        sched.bind_character(BindingId::new(), Capabilities::default()).unwrap();
        sched.runtime_mut().focus = Some(Vec3::new(3.0, 14.0, -2.0));

        sched.source_mut().time = 0.5;
        sched.step_frame().unwrap();
        assert_eq!(sched.camera().camera().target, Vec3::new(3.0, 14.0, -2.0));
        assert!(!sched.session().character().unwrap().capabilities.camera_animation);
    }

    #[test]
    fn test_motion_offset_shifts_time() {
        let mut config = PlaybackConfig::default();
        config.motion_offset_ms = 500.0;
        let mut sched = scheduler(config);
        sched.source_mut().time = 1.0;
        sched.step_frame().unwrap();
        assert!((sched.previous_time() - 1.5).abs() < 1e-9);

        sched.set_motion_offset(f64::NAN);
        assert_eq!(sched.config().motion_offset_ms, 500.0);
    }

    #[test]
    fn test_camera_input_ignored_in_motion_file() {
        let mut sched = scheduler(PlaybackConfig::default());
        assert!(!sched.camera_input(OrbitInput { yaw: 0.5, ..OrbitInput::default() }));
        sched.on_mode_change(CameraMode::Orbit).unwrap();
        assert!(sched.camera_input(OrbitInput { yaw: 0.5, ..OrbitInput::default() }));
    }
}
