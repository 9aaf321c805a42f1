// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the playback engine.

use crate::binding::{BindingId, Capability};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by the animation/physics collaborator
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime has no actor registered under this ID
    #[error("Unknown binding: {0}")]
    UnknownBinding(BindingId),

    /// Applying a pose failed (missing clip, bad bone data, ...)
    #[error("Pose application failed: {0}")]
    Pose(String),

    /// The physics simulation rejected the step
    #[error("Physics failure: {0}")]
    Physics(String),
}

/// Collaborator operation issued by the frame scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeOp {
    /// `set_enabled`
    SetEnabled(Capability),
    /// `advance_to`
    AdvanceTo,
    /// `advance_by`
    AdvanceBy,
    /// `reset_physics`
    ResetPhysics,
    /// `step_physics`
    StepPhysics,
}

impl fmt::Display for RuntimeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetEnabled(cap) => write!(f, "set_enabled({cap})"),
            Self::AdvanceTo => f.write_str("advance_to"),
            Self::AdvanceBy => f.write_str("advance_by"),
            Self::ResetPhysics => f.write_str("reset_physics"),
            Self::StepPhysics => f.write_str("step_physics"),
        }
    }
}

/// Errors surfaced by the frame scheduler
#[derive(Debug, Error)]
pub enum SyncError {
    /// A collaborator call failed; the frame was abandoned
    #[error("{op} failed for binding {binding}: {source}")]
    Runtime {
        /// Operation that failed
        op: RuntimeOp,
        /// Binding the operation targeted
        binding: BindingId,
        /// Underlying collaborator error
        #[source]
        source: RuntimeError,
    },
}

impl SyncError {
    /// Wrap a collaborator error with the operation and binding it came from
    pub fn runtime(op: RuntimeOp, binding: BindingId, source: RuntimeError) -> Self {
        Self::Runtime { op, binding, source }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
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
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// A value is out of its valid range
    #[error("Invalid value for {field}: {value}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SyncError>;
