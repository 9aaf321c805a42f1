// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract consumed from the animation/physics subsystem.

use crate::binding::{BindingId, Capability};
use crate::error::RuntimeError;
use glam::Vec3;

/// Result type for collaborator calls
pub type RuntimeResult<T = ()> = std::result::Result<T, RuntimeError>;

/// Animation, IK and rigid-body runtime for registered actors.
///
/// The scheduler only ever goes through this trait; each actor's physics world
/// and IK solver stay private to the implementation.
pub trait ActorRuntime {
    /// Toggle one capability of an actor
    fn set_enabled(&mut self, id: BindingId, capability: Capability, on: bool) -> RuntimeResult;

    /// Pose skeleton and IK at an absolute time
    fn advance_to(&mut self, id: BindingId, time: f64) -> RuntimeResult;

    /// Integrate animation and physics together by a relative delta
    fn advance_by(&mut self, id: BindingId, delta: f64) -> RuntimeResult;

    /// Re-derive rigid bodies from the current pose and zero their velocities
    fn reset_physics(&mut self, id: BindingId) -> RuntimeResult;

    /// Integrate physics only
    fn step_physics(&mut self, id: BindingId, delta: f64) -> RuntimeResult;

    /// Read and clear the loop flag
    fn consume_loop_flag(&mut self, id: BindingId) -> bool;

    /// World-space point the composition camera should frame, if the actor has one
    fn focus_point(&self, _id: BindingId) -> Option<Vec3> {
        None
    }
}
