// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview actors and the in-process actor runtime.
//!
//! A preview actor is a root transform driven by a [`TransformTrack`] with a
//! few skeleton anchors. Spring chains hang from the anchors and stand in for
//! hair, ribbons and skirts. The runtime owns every actor's physics world; the
//! scheduler only reaches it through [`ActorRuntime`].

use crate::physics::PhysicsWorld;
use glam::{EulerRot, Quat, Vec3};
use indexmap::IndexMap;
use stageplay_sequencer::{
    ActorRuntime, BindingId, Capabilities, Capability, RuntimeError, RuntimeResult, TransformTrack,
};

/// Skeleton point in the actor's local space
#[derive(Debug, Clone)]
pub struct AnchorSpec {
    /// Anchor name
    pub name: String,
    /// Offset from the root
    pub offset: Vec3,
}

/// Chain of dynamic bodies hanging from an anchor
#[derive(Debug, Clone)]
pub struct ChainSpec {
    /// Index into [`RigSpec::anchors`]
    pub anchor: usize,
    /// Number of links
    pub links: u32,
    /// Rest offset of each link from the previous one
    pub segment: Vec3,
    /// Mass per link
    pub mass: f32,
    /// Spring stiffness
    pub stiffness: f32,
}

/// Anchors and chains of a preview actor
#[derive(Debug, Clone, Default)]
pub struct RigSpec {
    /// Skeleton anchors
    pub anchors: Vec<AnchorSpec>,
    /// Physics chains
    pub chains: Vec<ChainSpec>,
    /// Anchor the composition camera frames
    pub focus: Option<usize>,
}

#[derive(Debug, Clone)]
struct Anchor {
    local: Vec3,
    body: usize,
}

/// A posable character with secondary-motion physics
#[derive(Debug, Clone)]
pub struct PreviewActor {
    name: String,
    motion: TransformTrack,
    enabled: Capabilities,
    motion_time: f64,
    root: Vec3,
    root_rotation: Quat,
    anchors: Vec<Anchor>,
    focus: Option<usize>,
    physics: PhysicsWorld,
    looped: bool,
}

impl PreviewActor {
    /// Build an actor posed at the start of its motion
    pub fn new(name: impl Into<String>, motion: TransformTrack, rig: &RigSpec) -> Self {
        let name = name.into();
        let mut physics = PhysicsWorld::new();

        let anchors: Vec<Anchor> = rig
            .anchors
            .iter()
            .map(|spec| Anchor {
                local: spec.offset,
                body: physics.add_kinematic(spec.name.clone(), spec.offset),
            })
            .collect();

        for chain in &rig.chains {
            let Some(anchor) = anchors.get(chain.anchor) else {
                tracing::warn!("{}: chain references missing anchor {}", name, chain.anchor);
                continue;
            };
            let anchor_name = &rig.anchors[chain.anchor].name;
            let mut parent = anchor.body;
            for link in 0..chain.links {
                match physics.add_dynamic(
                    format!("{anchor_name}_{link}"),
                    parent,
                    chain.segment,
                    chain.mass,
                    chain.stiffness,
                ) {
                    Some(child) => parent = child,
                    None => break,
                }
            }
        }

        let mut actor = Self {
            name,
            motion,
            enabled: Capabilities::default(),
            motion_time: 0.0,
            root: Vec3::ZERO,
            root_rotation: Quat::IDENTITY,
            anchors,
            focus: rig.focus,
            physics,
            looped: false,
        };
        actor.pose(0.0);
        actor.physics.reset(actor.root_rotation);

        let chains: Vec<&str> = actor
            .physics
            .bodies()
            .iter()
            .filter(|b| b.is_dynamic())
            .map(|b| b.name.as_str())
            .collect();
        tracing::debug!(
            "Actor '{}' built: {} anchors, bodies [{}]",
            actor.name,
            actor.anchors.len(),
            chains.join(", ")
        );
        actor
    }

    /// Actor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current motion time, wrapped into the motion's duration
    pub fn motion_time(&self) -> f64 {
        self.motion_time
    }

    /// Current enable flags
    pub fn enabled(&self) -> Capabilities {
        self.enabled
    }

    /// Root position of the current pose
    pub fn root_position(&self) -> Vec3 {
        self.root
    }

    /// Physics world
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// World position of the focus anchor
    pub fn focus_point(&self) -> Option<Vec3> {
        let anchor = self.anchors.get(self.focus?)?;
        Some(self.root + self.root_rotation * anchor.local)
    }

    fn wrap(&self, time: f64) -> (f64, bool) {
        let duration = f64::from(self.motion.duration());
        if duration <= 0.0 {
            return (time.max(0.0), false);
        }
        (time.rem_euclid(duration), time >= duration)
    }

    fn pose(&mut self, time: f64) {
        let t = time as f32;
        if let Some(position) = self.motion.position_at(t) {
            self.root = Vec3::from_array(position);
        }
        if let Some([x, y, z]) = self.motion.rotation_at(t) {
            self.root_rotation = Quat::from_euler(EulerRot::YXZ, y, x, z);
        }
        for anchor in &self.anchors {
            let world = self.root + self.root_rotation * anchor.local;
            self.physics.set_kinematic_position(anchor.body, world);
        }
    }

    fn step_physics(&mut self, delta: f64) -> RuntimeResult {
        if !self.enabled.physics {
            return Ok(());
        }
        self.physics.step(delta.max(0.0) as f32);
        if self.physics.is_finite() {
            Ok(())
        } else {
            Err(RuntimeError::Physics(format!("{}: simulation diverged", self.name)))
        }
    }

    fn check_time(&self, time: f64) -> RuntimeResult {
        if time.is_finite() {
            Ok(())
        } else {
            Err(RuntimeError::Pose(format!("{}: non-finite time {time}", self.name)))
        }
    }
}

/// In-process runtime holding every preview actor
#[derive(Debug, Default)]
pub struct PreviewRuntime {
    actors: IndexMap<BindingId, PreviewActor>,
}

impl PreviewRuntime {
    /// Create an empty runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor and return its binding ID
    pub fn spawn(&mut self, actor: PreviewActor) -> BindingId {
        let id = BindingId::new();
        tracing::info!("Spawned actor '{}' as {}", actor.name, id);
        self.actors.insert(id, actor);
        id
    }

    /// Remove an actor
    pub fn despawn(&mut self, id: BindingId) -> Option<PreviewActor> {
        let actor = self.actors.shift_remove(&id)?;
        tracing::info!("Despawned actor '{}' ({})", actor.name, id);
        Some(actor)
    }

    /// Look up an actor
    pub fn actor(&self, id: BindingId) -> Option<&PreviewActor> {
        self.actors.get(&id)
    }

    /// Number of registered actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    fn actor_mut(&mut self, id: BindingId) -> RuntimeResult<&mut PreviewActor> {
        self.actors
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownBinding(id))
    }
}

impl ActorRuntime for PreviewRuntime {
    fn set_enabled(&mut self, id: BindingId, capability: Capability, on: bool) -> RuntimeResult {
        let actor = self.actor_mut(id)?;
        actor.enabled.set(capability, on);
        tracing::trace!("{}: {} = {}", actor.name, capability, on);
        Ok(())
    }

    fn advance_to(&mut self, id: BindingId, time: f64) -> RuntimeResult {
        let actor = self.actor_mut(id)?;
        actor.check_time(time)?;
        if actor.enabled.animation {
            let (time, _) = actor.wrap(time);
            actor.motion_time = time;
            actor.pose(time);
        }
        Ok(())
    }

    fn advance_by(&mut self, id: BindingId, delta: f64) -> RuntimeResult {
        let actor = self.actor_mut(id)?;
        actor.check_time(delta)?;
        if actor.enabled.animation {
            let (time, looped) = actor.wrap(actor.motion_time + delta);
            if looped {
                actor.looped = true;
                tracing::debug!("{}: motion wrapped", actor.name);
            }
            actor.motion_time = time;
            actor.pose(time);
        }
        actor.step_physics(delta)
    }

    fn reset_physics(&mut self, id: BindingId) -> RuntimeResult {
        let actor = self.actor_mut(id)?;
        actor.physics.reset(actor.root_rotation);
        Ok(())
    }

    fn step_physics(&mut self, id: BindingId, delta: f64) -> RuntimeResult {
        self.actor_mut(id)?.step_physics(delta)
    }

    fn consume_loop_flag(&mut self, id: BindingId) -> bool {
        self.actors
            .get_mut(&id)
            .is_some_and(|actor| std::mem::take(&mut actor.looped))
    }

    fn focus_point(&self, id: BindingId) -> Option<Vec3> {
        self.actors.get(&id)?.focus_point()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> RigSpec {
        RigSpec {
            anchors: vec![AnchorSpec {
                name: "head".to_string(),
                offset: Vec3::new(0.0, 16.0, 0.0),
            }],
            chains: vec![ChainSpec {
                anchor: 0,
                links: 3,
                segment: Vec3::new(0.0, -1.0, -0.5),
                mass: 1.0,
                stiffness: 400.0,
            }],
            focus: Some(0),
        }
    }

    fn walk() -> TransformTrack {
        let mut track = TransformTrack::new("walk");
        track.add_position(0.0, [0.0, 0.0, 0.0]);
        track.add_position(4.0, [8.0, 0.0, 0.0]);
        track
    }

    fn runtime() -> (PreviewRuntime, BindingId) {
        let mut runtime = PreviewRuntime::new();
        let id = runtime.spawn(PreviewActor::new("tester", walk(), &rig()));
        (runtime, id)
    }

    #[test]
    fn test_rig_builds_chain() {
        let (runtime, id) = runtime();
        let actor = runtime.actor(id).unwrap();
        assert_eq!(actor.physics().bodies().len(), 4);
        assert_eq!(actor.physics().bodies()[3].name, "head_2");
        assert_eq!(actor.focus_point(), Some(Vec3::new(0.0, 16.0, 0.0)));
    }

    #[test]
    fn test_advance_to_poses_root() {
        let (mut runtime, id) = runtime();
        runtime.advance_to(id, 2.0).unwrap();
        let actor = runtime.actor(id).unwrap();
        assert_eq!(actor.root_position(), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(runtime.focus_point(id), Some(Vec3::new(4.0, 16.0, 0.0)));
        assert!(!runtime.consume_loop_flag(id));
    }

    #[test]
    fn test_advance_by_wraps_and_flags_loop() {
        let (mut runtime, id) = runtime();
        runtime.advance_to(id, 3.95).unwrap();
        runtime.advance_by(id, 0.1).unwrap();

        let actor = runtime.actor(id).unwrap();
        assert!((actor.motion_time() - 0.05).abs() < 1e-9);
        assert!(runtime.consume_loop_flag(id));
        assert!(!runtime.consume_loop_flag(id));
    }

    #[test]
    fn test_disabled_animation_holds_pose() {
        let (mut runtime, id) = runtime();
        runtime.set_enabled(id, Capability::Animation, false).unwrap();
        runtime.advance_to(id, 2.0).unwrap();
        assert_eq!(runtime.actor(id).unwrap().root_position(), Vec3::ZERO);
        assert!(!runtime.actor(id).unwrap().enabled().animation);
    }

    #[test]
    fn test_reset_after_jump_zeroes_motion() {
        let (mut runtime, id) = runtime();
        runtime.advance_by(id, 0.05).unwrap();
        runtime.step_physics(id, 0.5).unwrap();
        assert!(runtime.actor(id).unwrap().physics().kinetic_energy() > 0.0);

        runtime.advance_to(id, 2.0).unwrap();
        runtime.reset_physics(id).unwrap();
        let actor = runtime.actor(id).unwrap();
        assert_eq!(actor.physics().kinetic_energy(), 0.0);
        let tip = &actor.physics().bodies()[3];
        assert!((tip.position - Vec3::new(4.0, 13.0, -1.5)).length() < 1e-4);
    }

    #[test]
    fn test_reset_after_turn_rebuilds_chain_facing() {
        let mut track = walk();
        track.add_rotation(0.0, [0.0, 0.0, 0.0]);
        track.add_rotation(4.0, [0.0, std::f32::consts::TAU, 0.0]);
        let mut runtime = PreviewRuntime::new();
        let id = runtime.spawn(PreviewActor::new("turner", track, &rig()));

        runtime.advance_to(id, 2.0).unwrap();
        runtime.reset_physics(id).unwrap();
        let actor = runtime.actor(id).unwrap();
        // half a turn: the chain hangs along +z behind the root at (4, 0, 0)
        let tip = &actor.physics().bodies()[3];
        assert!((tip.position - Vec3::new(4.0, 13.0, 1.5)).length() < 1e-3);
    }

    #[test]
    fn test_physics_disabled_skips_step() {
        let (mut runtime, id) = runtime();
        runtime.set_enabled(id, Capability::Physics, false).unwrap();
        runtime.step_physics(id, 0.5).unwrap();
        assert_eq!(runtime.actor(id).unwrap().physics().kinetic_energy(), 0.0);
    }

    #[test]
    fn test_unknown_binding() {
        let (mut runtime, id) = runtime();
        let stranger = BindingId::new();
        assert!(matches!(
            runtime.advance_by(stranger, 0.1),
            Err(RuntimeError::UnknownBinding(b)) if b == stranger
        ));
        assert!(!runtime.consume_loop_flag(stranger));

        assert!(runtime.despawn(id).is_some());
        assert_eq!(runtime.actor_count(), 0);
        assert!(runtime.reset_physics(id).is_err());
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let (mut runtime, id) = runtime();
        assert!(matches!(
            runtime.advance_to(id, f64::NAN),
            Err(RuntimeError::Pose(_))
        ));
    }
}
