// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine session: what is currently bound to the scheduler.

use crate::binding::{ActorBinding, BindingId, BindingSlot};
use crate::camera::CameraTrackDriver;

/// Bound character and camera for one playback session
#[derive(Debug, Clone)]
pub struct Session {
    character: BindingSlot<ActorBinding>,
    camera: CameraTrackDriver,
}

impl Session {
    /// Start a session with no character bound
    pub fn new(camera: CameraTrackDriver) -> Self {
        Self {
            character: BindingSlot::Empty,
            camera,
        }
    }

    /// Primary character binding, if installed
    pub fn character(&self) -> Option<&ActorBinding> {
        self.character.ready()
    }

    /// Mutable access to the primary character binding
    pub fn character_mut(&mut self) -> Option<&mut ActorBinding> {
        self.character.ready_mut()
    }

    /// Character slot, including the swap window
    pub fn character_slot(&self) -> &BindingSlot<ActorBinding> {
        &self.character
    }

    /// Camera track driver
    pub fn camera(&self) -> &CameraTrackDriver {
        &self.camera
    }

    /// Mutable camera track driver
    pub fn camera_mut(&mut self) -> &mut CameraTrackDriver {
        &mut self.camera
    }

    /// Whether an asset swap is in progress
    pub fn is_loading(&self) -> bool {
        self.character.is_swapping() || self.camera.is_track_swapping()
    }

    /// Install the character binding, returning the ID it replaced
    pub fn install_character(&mut self, binding: ActorBinding) -> Option<BindingId> {
        let previous = match &self.character {
            BindingSlot::Ready(old) => Some(old.id),
            BindingSlot::Swapping { previous } => Some(*previous),
            BindingSlot::Empty => None,
        };
        self.character = BindingSlot::Ready(binding);
        previous
    }

    /// Begin tearing down the character binding `id`.
    ///
    /// Returns the binding as it was configured, or `None` if `id` is not the
    /// installed character.
    pub fn begin_character_swap(&mut self, id: BindingId) -> Option<ActorBinding> {
        match &self.character {
            BindingSlot::Ready(binding) if binding.id == id => {
                let binding = binding.clone();
                self.character = BindingSlot::Swapping { previous: id };
                Some(binding)
            }
            _ => None,
        }
    }
}
