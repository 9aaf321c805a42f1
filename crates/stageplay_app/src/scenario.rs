// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted playback sessions.
//!
//! A scenario is a RON file of frame-indexed cues (transport, seeks, camera
//! mode switches, physics toggles, character swaps). The runner plays them
//! against a [`MediaPlayer`] and a [`PreviewRuntime`], stepping the frame
//! scheduler once per simulated display refresh.

use crate::actor::{PreviewActor, PreviewRuntime, RigSpec};
use crate::player::MediaPlayer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stageplay_sequencer::{
    BindingId, CameraMode, CameraTrack, Capabilities, Capability, ConfigError, FrameOutcome,
    FrameScheduler, FrameStats, OrbitInput, PlaybackConfig, SteppedWallClock, SyncError, TimeSource,
    TransformTrack,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extra audio after the last motion keyframe
const AUDIO_TAIL_SECONDS: f64 = 1.0;

/// Scenario loading and playback errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// IO error
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Parse error
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying RON error
        #[source]
        source: ron::error::SpannedError,
    },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The scheduler rejected a setup call
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cue {
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Scrub to an absolute position (seconds)
    Seek(f64),
    /// Change the playback rate
    Rate(f64),
    /// Switch the camera mode
    SwitchMode(CameraMode),
    /// Toggle character physics
    SetPhysics(bool),
    /// Toggle orbit auto-rotation
    SetAutoRotate(bool),
    /// Replace the character; the new one is ready after `load_frames` frames
    SwapCharacter {
        /// Frames spent loading
        load_frames: u32,
    },
    /// Drag the interactive camera
    Orbit {
        /// Horizontal rotation, radians
        yaw: f32,
        /// Vertical rotation, radians
        pitch: f32,
    },
}

/// A cue scheduled on a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedCue {
    /// Frame index the cue fires on
    pub frame: u64,
    /// Action
    pub cue: Cue,
}

/// Scripted playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Cues in any order
    #[serde(default)]
    pub cues: Vec<TimedCue>,
}

impl Scenario {
    /// Parse a scenario from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = read(path)?;
        let scenario = Self::from_ron_str(&content).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded scenario '{}' ({} cues)", scenario.name, scenario.cues.len());
        Ok(scenario)
    }

    /// Play, scrub around, loop, swap the character and tour the camera modes
    pub fn demo() -> Self {
        let at = |frame: u64, cue: Cue| TimedCue { frame, cue };
        Self {
            name: "demo".to_string(),
            cues: vec![
                at(0, Cue::Play),
                at(120, Cue::Seek(6.5)),
                at(180, Cue::Seek(2.0)),
                at(240, Cue::SwitchMode(CameraMode::Composition)),
                at(300, Cue::Pause),
                at(300, Cue::SwitchMode(CameraMode::Orbit)),
                at(301, Cue::SetAutoRotate(true)),
                at(330, Cue::Orbit { yaw: 0.3, pitch: 0.1 }),
                at(360, Cue::SwitchMode(CameraMode::MotionFile)),
                at(360, Cue::Play),
                at(420, Cue::SwapCharacter { load_frames: 20 }),
                at(460, Cue::SetPhysics(false)),
                at(480, Cue::SetPhysics(true)),
                at(480, Cue::Seek(11.0)),
            ],
        }
    }
}

fn read(path: &Path) -> Result<String, ScenarioError> {
    std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load any RON asset (camera or motion track)
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, ScenarioError> {
    let content = read(path)?;
    ron::from_str(&content).map_err(|source| ScenarioError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// What a run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Frames stepped
    pub frames: u64,
    /// Scheduler counters
    pub stats: FrameStats,
    /// Last committed motion time
    pub final_time: f64,
    /// Camera mode at the end
    pub camera_mode: CameraMode,
}

/// Drives a scheduler from a scenario
pub struct ScenarioRunner {
    scheduler: FrameScheduler<MediaPlayer, PreviewRuntime, SteppedWallClock>,
    motion: TransformTrack,
    rig: RigSpec,
    frame_dt: f64,
    character: Option<BindingId>,
    pending_swap: Option<u32>,
    swaps: u32,
}

impl ScenarioRunner {
    /// Set up a session with one character and a recorded camera
    pub fn new(
        config: PlaybackConfig,
        motion: TransformTrack,
        camera: CameraTrack,
        rig: RigSpec,
        fps: f64,
    ) -> Result<Self, ScenarioError> {
        config.validate()?;
        let duration = f64::from(motion.duration().max(camera.duration())) + AUDIO_TAIL_SECONDS;
        let wall_clock = SteppedWallClock::from_fps(fps);
        let frame_dt = wall_clock.step;

        let mut scheduler = FrameScheduler::new(
            MediaPlayer::new(duration),
            PreviewRuntime::new(),
            wall_clock,
            config,
        );
        scheduler.set_viewport(1920, 1080);

        let mut runner = Self {
            scheduler,
            motion,
            rig,
            frame_dt,
            character: None,
            pending_swap: None,
            swaps: 0,
        };
        runner.install_character()?;
        runner.scheduler.bind_camera(camera);
        Ok(runner)
    }

    fn install_character(&mut self) -> Result<(), ScenarioError> {
        let name = format!("performer_{}", self.swaps);
        let actor = PreviewActor::new(name, self.motion.clone(), &self.rig);
        let id = self.scheduler.runtime_mut().spawn(actor);
        let physics = self.scheduler.config().physics;
        self.scheduler
            .bind_character(id, Capabilities::default().with(Capability::Physics, physics))?;
        self.character = Some(id);
        Ok(())
    }

    fn apply(&mut self, cue: &Cue) -> Result<(), ScenarioError> {
        tracing::debug!("Cue: {:?}", cue);
        match cue {
            Cue::Play => self.scheduler.source_mut().play(),
            Cue::Pause => self.scheduler.source_mut().pause(),
            Cue::Seek(time) => self.scheduler.source_mut().set_current_time(*time),
            Cue::Rate(rate) => {
                if rate.is_finite() && *rate > 0.0 {
                    self.scheduler.source_mut().rate = *rate;
                }
            }
            Cue::SwitchMode(mode) => self.scheduler.on_mode_change(*mode)?,
            Cue::SetPhysics(on) => self.scheduler.set_physics(*on)?,
            Cue::SetAutoRotate(on) => self.scheduler.set_auto_rotate(*on),
            Cue::SwapCharacter { load_frames } => {
                if let Some(old) = self.character.take() {
                    self.scheduler.unbind(old)?;
                    self.scheduler.runtime_mut().despawn(old);
                }
                self.swaps += 1;
                self.pending_swap = Some(*load_frames);
            }
            Cue::Orbit { yaw, pitch } => {
                let input = OrbitInput {
                    yaw: *yaw,
                    pitch: *pitch,
                    zoom: 0.0,
                };
                if !self.scheduler.camera_input(input) {
                    let mode = self.scheduler.camera().mode();
                    tracing::debug!("Orbit input ignored in {} mode", mode);
                }
            }
        }
        Ok(())
    }

    /// Run `frames` display refreshes
    pub fn run(&mut self, scenario: &Scenario, frames: u64) -> Result<RunSummary, ScenarioError> {
        tracing::info!("Running scenario '{}' for {} frames", scenario.name, frames);
        let mut ordered: Vec<&TimedCue> = scenario.cues.iter().collect();
        ordered.sort_by_key(|c| c.frame);
        let mut cues = ordered.into_iter().peekable();

        for frame in 0..frames {
            while let Some(timed) = cues.next_if(|c| c.frame <= frame) {
                self.apply(&timed.cue)?;
            }

            if let Some(remaining) = self.pending_swap {
                if remaining == 0 {
                    self.pending_swap = None;
                    self.install_character()?;
                } else {
                    self.pending_swap = Some(remaining - 1);
                }
            }

            self.scheduler.source_mut().advance(self.frame_dt);

            match self.scheduler.step_frame() {
                Ok(FrameOutcome::Processed(report)) if report.looped => {
                    tracing::info!("Frame {}: loop stop", frame);
                }
                Ok(FrameOutcome::Processed(report)) => {
                    tracing::trace!("Frame {}: {:?} at {:.3}s", frame, report.class, report.time);
                }
                Ok(FrameOutcome::Skipped(reason)) => {
                    tracing::trace!("Frame {}: skipped ({:?})", frame, reason);
                }
                // The next frame retries from the last committed time
                Err(err) => tracing::warn!("Frame {}: {}", frame, err),
            }
        }

        let summary = RunSummary {
            frames,
            stats: self.scheduler.stats(),
            final_time: self.scheduler.previous_time(),
            camera_mode: self.scheduler.camera().mode(),
        };
        self.log_summary(&summary);
        Ok(summary)
    }

    fn log_summary(&self, summary: &RunSummary) {
        let stats = &summary.stats;
        tracing::info!(
            "Done: {} frames, {} processed, {} skipped, {} loops, {} failed",
            summary.frames,
            stats.processed,
            stats.skipped,
            stats.loops,
            stats.failures
        );
        tracing::info!(
            "Frame classes: {} idle, {} continuous, {} seeks",
            stats.idle,
            stats.continuous,
            stats.seeks
        );

        let camera = self.scheduler.camera().camera();
        tracing::info!(
            "Camera ({}): position {:?}, target {:?}, fov {:.1}",
            summary.camera_mode,
            camera.position,
            camera.target,
            camera.projection.fovy_deg
        );

        let runtime = self.scheduler.runtime();
        if let Some(actor) = self.character.and_then(|id| runtime.actor(id)) {
            tracing::info!(
                "Actor '{}': motion {:.3}s, root {:?}, physics {}, energy {:.3}",
                actor.name(),
                actor.motion_time(),
                actor.root_position(),
                if actor.enabled().physics { "on" } else { "off" },
                actor.physics().kinetic_energy()
            );
        }
        tracing::debug!("{} actor(s) registered", runtime.actor_count());
    }
}
