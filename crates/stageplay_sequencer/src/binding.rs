// SPDX-License-Identifier: MIT OR Apache-2.0
//! Actor bindings and their capability flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a posable object (character or camera) registered with the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingId(pub Uuid);

impl BindingId {
    /// Create a new random binding ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell bindings apart in logs
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// A single toggleable capability of an actor binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Skeletal animation and IK
    Animation,
    /// Rigid-body simulation
    Physics,
    /// Recorded camera motion
    CameraAnimation,
}

impl Capability {
    /// All capabilities, in the order they are applied on install
    pub const ALL: [Capability; 3] = [
        Capability::Animation,
        Capability::Physics,
        Capability::CameraAnimation,
    ];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Animation => "animation",
            Self::Physics => "physics",
            Self::CameraAnimation => "cameraAnimation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configured capability flags of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Skeletal animation and IK enabled
    pub animation: bool,
    /// Rigid-body simulation enabled
    pub physics: bool,
    /// Recorded camera motion enabled
    pub camera_animation: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            animation: true,
            physics: true,
            camera_animation: true,
        }
    }
}

impl Capabilities {
    /// Capabilities with every flag off
    pub const NONE: Capabilities = Capabilities {
        animation: false,
        physics: false,
        camera_animation: false,
    };

    /// Read a single flag
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::Animation => self.animation,
            Capability::Physics => self.physics,
            Capability::CameraAnimation => self.camera_animation,
        }
    }

    /// Write a single flag
    pub fn set(&mut self, capability: Capability, on: bool) {
        match capability {
            Capability::Animation => self.animation = on,
            Capability::Physics => self.physics = on,
            Capability::CameraAnimation => self.camera_animation = on,
        }
    }

    /// Builder-style variant of [`Capabilities::set`]
    pub fn with(mut self, capability: Capability, on: bool) -> Self {
        self.set(capability, on);
        self
    }
}

/// What a binding drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingRole {
    /// The primary character (mesh, IK, physics)
    Character,
    /// The camera motion track
    Camera,
}

/// Association of a posable object with its configured capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorBinding {
    /// Runtime binding ID
    pub id: BindingId,
    /// What this binding drives
    pub role: BindingRole,
    /// Configured (desired) capability flags
    pub capabilities: Capabilities,
}

impl ActorBinding {
    /// Create a character binding
    pub fn character(id: BindingId, capabilities: Capabilities) -> Self {
        Self {
            id,
            role: BindingRole::Character,
            capabilities,
        }
    }

    /// Create a camera binding
    pub fn camera(id: BindingId, camera_animation: bool) -> Self {
        Self {
            id,
            role: BindingRole::Camera,
            capabilities: Capabilities::NONE.with(Capability::CameraAnimation, camera_animation),
        }
    }
}

/// Slot holding the binding for one role, including the swap window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BindingSlot<T> {
    /// Nothing bound yet
    #[default]
    Empty,
    /// Previous binding torn down, replacement not installed yet
    Swapping {
        /// Binding that was torn down
        previous: BindingId,
    },
    /// Bound and receiving per-frame updates
    Ready(T),
}

impl<T> BindingSlot<T> {
    /// The bound value, if ready
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Empty | Self::Swapping { .. } => None,
        }
    }

    /// Mutable access to the bound value, if ready
    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Empty | Self::Swapping { .. } => None,
        }
    }

    /// Check if the slot is in the swap window
    pub fn is_swapping(&self) -> bool {
        matches!(self, Self::Swapping { .. })
    }
}
