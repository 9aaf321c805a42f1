// SPDX-License-Identifier: MIT OR Apache-2.0
//! Secondary-motion physics for preview actors.
//!
//! This module provides a small spring-chain simulation:
//! - Kinematic anchors that follow the posed skeleton
//! - Dynamic bodies (hair, ribbons) hanging from anchors on damped springs
//! - Gravity, drag and semi-implicit Euler integration
//! - Fixed sub-stepping with a cap per call

use glam::{Quat, Vec3};

/// Sub-steps allowed per [`PhysicsWorld::step`] call
const MAX_SUBSTEPS: u32 = 8;

/// Body type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moved by the pose, never by the simulation
    Kinematic,
    /// Simulated
    Dynamic,
}

/// Physics body state during simulation
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    /// Body name
    pub name: String,
    /// Body type
    pub kind: BodyKind,
    /// Current position
    pub position: Vec3,
    /// Linear velocity
    pub velocity: Vec3,
    /// Inverse mass (0 for kinematic)
    pub inv_mass: f32,
    /// Linear drag
    pub drag: f32,
    /// Body this one hangs from
    pub parent: Option<usize>,
    /// Rest position relative to the parent, in the rig's unrotated frame
    pub rest_offset: Vec3,
}

impl PhysicsBody {
    /// Check if this body can move
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic)
    }
}

/// Damped spring between two bodies
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    /// Parent body
    pub a: usize,
    /// Child body
    pub b: usize,
    /// Rest length
    pub rest_length: f32,
    /// Stiffness (N/m)
    pub stiffness: f32,
    /// Damping along the spring axis
    pub damping: f32,
}

/// Physics world managing the simulation
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Gravity vector
    pub gravity: Vec3,
    /// Fixed timestep for physics
    pub fixed_timestep: f32,
    bodies: Vec<PhysicsBody>,
    springs: Vec<Spring>,
    accumulated_time: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            gravity: Vec3::new(0.0, -98.0, 0.0),
            fixed_timestep: 1.0 / 120.0,
            bodies: Vec::new(),
            springs: Vec::new(),
            accumulated_time: 0.0,
        }
    }

    /// All bodies, in creation order
    pub fn bodies(&self) -> &[PhysicsBody] {
        &self.bodies
    }

    /// Add a kinematic anchor
    pub fn add_kinematic(&mut self, name: impl Into<String>, position: Vec3) -> usize {
        self.bodies.push(PhysicsBody {
            name: name.into(),
            kind: BodyKind::Kinematic,
            position,
            velocity: Vec3::ZERO,
            inv_mass: 0.0,
            drag: 0.0,
            parent: None,
            rest_offset: Vec3::ZERO,
        });
        self.bodies.len() - 1
    }

    /// Hang a dynamic body from `parent` at `offset`.
    ///
    /// Parents must be added before their children.
    pub fn add_dynamic(
        &mut self,
        name: impl Into<String>,
        parent: usize,
        offset: Vec3,
        mass: f32,
        stiffness: f32,
    ) -> Option<usize> {
        let origin = self.bodies.get(parent)?.position;
        self.bodies.push(PhysicsBody {
            name: name.into(),
            kind: BodyKind::Dynamic,
            position: origin + offset,
            velocity: Vec3::ZERO,
            inv_mass: 1.0 / mass.max(0.001),
            drag: 2.0,
            parent: Some(parent),
            rest_offset: offset,
        });
        let child = self.bodies.len() - 1;
        self.springs.push(Spring {
            a: parent,
            b: child,
            rest_length: offset.length(),
            stiffness,
            damping: 4.0,
        });
        Some(child)
    }

    /// Move a kinematic anchor to its posed position
    pub fn set_kinematic_position(&mut self, index: usize, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(index) {
            if !body.is_dynamic() {
                body.position = position;
            }
        }
    }

    /// Re-derive every dynamic body from its anchor chain and zero all velocities.
    ///
    /// Rest offsets are turned by `orientation`, the current facing of the rig.
    pub fn reset(&mut self, orientation: Quat) {
        for i in 0..self.bodies.len() {
            let parent_position = self.bodies[i]
                .parent
                .and_then(|p| self.bodies.get(p))
                .map(|p| p.position);
            let body = &mut self.bodies[i];
            if let (BodyKind::Dynamic, Some(origin)) = (body.kind, parent_position) {
                body.position = origin + orientation * body.rest_offset;
            }
            body.velocity = Vec3::ZERO;
        }
        self.accumulated_time = 0.0;
    }

    /// Advance the simulation by `dt` seconds, returning the sub-steps taken
    pub fn step(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.accumulated_time += dt;
        let mut steps = 0;
        while self.accumulated_time >= self.fixed_timestep {
            self.accumulated_time -= self.fixed_timestep;
            self.substep(self.fixed_timestep);
            steps += 1;

            // Limit max steps per call to prevent spiral of death
            if steps >= MAX_SUBSTEPS {
                self.accumulated_time = 0.0;
                break;
            }
        }
        steps
    }

    fn substep(&mut self, dt: f32) {
        let mut forces = vec![Vec3::ZERO; self.bodies.len()];

        for (force, body) in forces.iter_mut().zip(&self.bodies) {
            if body.is_dynamic() {
                *force += self.gravity / body.inv_mass;
            }
        }

        for spring in &self.springs {
            let (a, b) = (&self.bodies[spring.a], &self.bodies[spring.b]);
            let axis = b.position - a.position;
            let length = axis.length();
            if length < 1e-6 {
                continue;
            }
            let dir = axis / length;
            let stretch = length - spring.rest_length;
            let closing = (b.velocity - a.velocity).dot(dir);
            let f = dir * (spring.stiffness * stretch + spring.damping * closing);
            forces[spring.a] += f;
            forces[spring.b] -= f;
        }

        for (body, force) in self.bodies.iter_mut().zip(forces) {
            if !body.is_dynamic() {
                continue;
            }
            body.velocity += force * body.inv_mass * dt;
            body.velocity *= (1.0 - body.drag * dt).max(0.0);
            body.position += body.velocity * dt;
        }
    }

    /// Kinetic energy of the dynamic bodies
    pub fn kinetic_energy(&self) -> f32 {
        self.bodies
            .iter()
            .filter(|b| b.is_dynamic())
            .map(|b| 0.5 * b.velocity.length_squared() / b.inv_mass)
            .sum()
    }

    /// Whether every body still has finite state
    pub fn is_finite(&self) -> bool {
        self.bodies
            .iter()
            .all(|b| b.position.is_finite() && b.velocity.is_finite())
    }
}
