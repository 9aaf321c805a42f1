// SPDX-License-Identifier: MIT OR Apache-2.0
//! `StagePlay` - headless playback host
//!
//! Drives the playback engine the way a viewer's refresh loop would:
//! - Simulated media player as the master timeline
//! - Preview actors with spring-chain physics
//! - Recorded camera track with live mode switching
//! - Scripted transport and camera cues from a RON scenario
//!
//! ## Architecture
//!
//! All synchronization logic lives in `stageplay_sequencer`; this binary only
//! supplies the collaborators and a fixed-rate frame loop.

mod actor;
mod demo;
mod physics;
mod player;
mod scenario;

use clap::Parser;
use scenario::{load_ron, Scenario, ScenarioError, ScenarioRunner};
use stageplay_sequencer::{CameraTrack, PlaybackConfig, TransformTrack};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stageplay")]
#[command(about = "Play a character and camera track against a simulated media clock")]
#[command(long_about = None)]
#[command(version)]
struct Cli {
    /// Playback config (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario of timed cues (RON); runs the built-in demo when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Character motion track (RON)
    #[arg(long)]
    motion: Option<PathBuf>,

    /// Recorded camera track (RON)
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Simulated display refresh rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Number of frames to run
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "stageplay_app=debug,stageplay_sequencer=info",
        1 => "stageplay_app=debug,stageplay_sequencer=debug",
        _ => "stageplay_app=trace,stageplay_sequencer=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(cli: &Cli) -> Result<(), ScenarioError> {
    let config = match &cli.config {
        Some(path) => PlaybackConfig::load(path)?,
        None => PlaybackConfig::default(),
    };
    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo(),
    };
    let mut motion: TransformTrack = match &cli.motion {
        Some(path) => load_ron(path)?,
        None => demo::demo_motion(),
    };
    let mut camera: CameraTrack = match &cli.camera {
        Some(path) => load_ron(path)?,
        None => demo::demo_camera(),
    };
    motion.normalize();
    camera.normalize();

    tracing::info!(
        "Motion '{}' ({:.2}s), camera '{}' ({:.2}s), mode {}",
        motion.name,
        motion.duration(),
        camera.name,
        camera.duration(),
        config.camera_mode
    );

    let mut runner = ScenarioRunner::new(config, motion, camera, demo::figure_rig(), cli.fps)?;
    runner.run(&scenario, cli.frames)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::info!("Starting StagePlay v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        tracing::error!("Playback failed: {e}");
        std::process::exit(1);
    }
}
