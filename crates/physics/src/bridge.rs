//! Keeps a [`PhysicsEngine`] consistent with the scene's entities.

use cellops_ecs::components::{BodyType, Collider, RigidBody, TriggerVolume};
use cellops_ecs::{EntityArena, EntityHandle};
use glam::Vec3;
use slotmap::SecondaryMap;

use crate::engine::{BodyDesc, BodyHandle, Motion, PhysicsEngine, Sphere, VolumeHandle};

/// A trigger volume owned by `volume_owner` began overlapping a body owned
/// by `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEnter {
    pub volume_owner: EntityHandle,
    pub other: EntityHandle,
}

/// An engine body and the description it was created from, kept so edits
/// to the component can be detected.
#[derive(Debug)]
struct BodyLink {
    body: BodyHandle,
    desc: BodyDesc,
}

#[derive(Debug)]
struct VolumeLink {
    volume: VolumeHandle,
    shapes: Vec<Sphere>,
}

/// Owns the engine and the entity-to-engine handle associations. Entities
/// never hold engine handles themselves.
#[derive(Debug)]
pub struct PhysicsBridge {
    engine: Box<dyn PhysicsEngine>,
    bodies: SecondaryMap<EntityHandle, BodyLink>,
    volumes: SecondaryMap<EntityHandle, VolumeLink>,
    body_owners: SecondaryMap<BodyHandle, EntityHandle>,
    volume_owners: SecondaryMap<VolumeHandle, EntityHandle>,
    max_sub_steps: u32,
}

fn spheres(colliders: &[Collider]) -> Vec<Sphere> {
    colliders
        .iter()
        .map(|c| Sphere {
            offset: c.offset(),
            radius: c.bounding_radius(),
        })
        .collect()
}

fn motion(body_type: BodyType) -> Motion {
    match body_type {
        BodyType::Static => Motion::Static,
        BodyType::Kinematic => Motion::Kinematic,
        BodyType::Dynamic => Motion::Dynamic,
    }
}

impl PhysicsBridge {
    pub fn new(mut engine: Box<dyn PhysicsEngine>, gravity: Vec3, max_sub_steps: u32) -> Self {
        engine.set_gravity(gravity);
        Self {
            engine,
            bodies: SecondaryMap::new(),
            volumes: SecondaryMap::new(),
            body_owners: SecondaryMap::new(),
            volume_owners: SecondaryMap::new(),
            max_sub_steps,
        }
    }

    pub fn engine(&self) -> &dyn PhysicsEngine {
        self.engine.as_ref()
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.engine.set_gravity(gravity);
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    pub fn body_of(&self, entity: EntityHandle) -> Option<BodyHandle> {
        self.bodies.get(entity).map(|l| l.body)
    }

    pub fn volume_of(&self, entity: EntityHandle) -> Option<VolumeHandle> {
        self.volumes.get(entity).map(|l| l.volume)
    }

    /// Create engine objects for new physics components, drop those whose
    /// entity or component is gone, and rebuild those whose component no
    /// longer matches what the engine was given.
    pub fn sync(&mut self, arena: &EntityArena) {
        let stale_bodies: Vec<EntityHandle> = self
            .bodies
            .keys()
            .filter(|e| {
                arena
                    .get(*e)
                    .is_none_or(|ent| ent.get_component::<RigidBody>().is_none())
            })
            .collect();
        for entity in stale_bodies {
            self.unregister_body(entity);
        }
        let stale_volumes: Vec<EntityHandle> = self
            .volumes
            .keys()
            .filter(|e| {
                arena
                    .get(*e)
                    .is_none_or(|ent| ent.get_component::<TriggerVolume>().is_none())
            })
            .collect();
        for entity in stale_volumes {
            self.unregister_volume(entity);
        }

        for entity in arena.iter() {
            let handle = entity.handle();
            let Some(world) = arena.world_transform(handle) else {
                continue;
            };
            if let Some(rb) = entity.get_component::<RigidBody>() {
                let desc = BodyDesc {
                    motion: motion(rb.body_type),
                    mass: rb.mass,
                    shapes: spheres(&rb.colliders),
                };
                let current = self.bodies.get(handle).map(|l| &l.desc);
                if current != Some(&desc) {
                    if current.is_some() {
                        self.unregister_body(handle);
                        tracing::debug!(entity = %entity.name(), "rigid body changed; rebuilding");
                    }
                    let body = self.engine.create_body(desc.clone(), world);
                    self.body_owners.insert(body, handle);
                    self.bodies.insert(handle, BodyLink { body, desc });
                    tracing::debug!(entity = %entity.name(), "rigid body registered");
                }
            }
            if let Some(tv) = entity.get_component::<TriggerVolume>() {
                let shapes = spheres(&tv.colliders);
                let current = self.volumes.get(handle).map(|l| &l.shapes);
                if current != Some(&shapes) {
                    if current.is_some() {
                        self.unregister_volume(handle);
                        tracing::debug!(entity = %entity.name(), "trigger volume changed; rebuilding");
                    }
                    let volume = self.engine.create_volume(shapes.clone(), world);
                    self.volume_owners.insert(volume, handle);
                    self.volumes.insert(handle, VolumeLink { volume, shapes });
                    tracing::debug!(entity = %entity.name(), "trigger volume registered");
                }
            }
        }
    }

    fn unregister_body(&mut self, entity: EntityHandle) {
        if let Some(link) = self.bodies.remove(entity) {
            self.body_owners.remove(link.body);
            self.engine.destroy_body(link.body);
        }
    }

    fn unregister_volume(&mut self, entity: EntityHandle) {
        if let Some(link) = self.volumes.remove(entity) {
            self.volume_owners.remove(link.volume);
            self.engine.destroy_volume(link.volume);
        }
    }

    /// Push every tracked entity's world transform into the engine.
    pub fn pre_step(&mut self, arena: &EntityArena) {
        for (entity, link) in &self.bodies {
            if let Some(world) = arena.world_transform(entity) {
                self.engine.set_body_transform(link.body, world);
            }
        }
        for (entity, link) in &self.volumes {
            if let Some(world) = arena.world_transform(entity) {
                self.engine.set_volume_transform(link.volume, world);
            }
        }
    }

    /// Advance the engine when `playing`. Returns the sub-steps taken.
    pub fn step_if_playing(&mut self, dt: f32, playing: bool) -> u32 {
        if !playing {
            return 0;
        }
        let _span = tracing::debug_span!("physics_step", dt).entered();
        self.engine.step(dt, self.max_sub_steps)
    }

    /// Pull simulated transforms back into dynamic bodies' entities and
    /// collect trigger enters, resolved to entities.
    pub fn post_step(&mut self, arena: &mut EntityArena) -> Vec<TriggerEnter> {
        for (entity, link) in &self.bodies {
            if link.desc.motion != Motion::Dynamic {
                continue;
            }
            if let Some(world) = self.engine.body_transform(link.body) {
                arena.set_world_matrix(entity, &world.to_matrix());
            }
        }

        self.engine
            .drain_trigger_enters()
            .into_iter()
            .filter_map(|(volume, body)| {
                let volume_owner = self.volume_owners.get(volume).copied()?;
                let other = self.body_owners.get(body).copied()?;
                Some(TriggerEnter {
                    volume_owner,
                    other,
                })
            })
            .collect()
    }

    /// Drop every engine object, e.g. before loading another scene.
    pub fn clear(&mut self) {
        let bodies: Vec<EntityHandle> = self.bodies.keys().collect();
        for entity in bodies {
            self.unregister_body(entity);
        }
        let volumes: Vec<EntityHandle> = self.volumes.keys().collect();
        for entity in volumes {
            self.unregister_volume(entity);
        }
    }
}

impl Drop for PhysicsBridge {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimplePhysics;
    use cellops_common::{Guid, Transform};

    fn bridge() -> PhysicsBridge {
        PhysicsBridge::new(
            Box::new(SimplePhysics::new(0.1)),
            Vec3::new(0.0, 0.0, -10.0),
            15,
        )
    }

    #[test]
    fn sync_registers_and_unregisters() {
        let mut arena = EntityArena::new();
        let e = arena.insert("Ball", Guid::new(), Transform::default());
        arena
            .get_mut(e)
            .unwrap()
            .add_component(RigidBody::new(BodyType::Dynamic).with_collider(Collider::sphere(1.0)))
            .unwrap();

        let mut bridge = bridge();
        bridge.sync(&arena);
        assert_eq!(bridge.body_count(), 1);
        assert_eq!(bridge.engine().body_count(), 1);

        arena.remove(e);
        bridge.sync(&arena);
        assert_eq!(bridge.body_count(), 0);
        assert_eq!(bridge.engine().body_count(), 0);
    }

    #[test]
    fn paused_world_does_not_move_but_edits_sync() {
        let mut arena = EntityArena::new();
        let e = arena.insert("Ball", Guid::new(), Transform::default());
        arena
            .get_mut(e)
            .unwrap()
            .add_component(RigidBody::new(BodyType::Dynamic).with_collider(Collider::sphere(1.0)))
            .unwrap();
        let mut bridge = bridge();
        bridge.sync(&arena);

        arena
            .get_mut(e)
            .unwrap()
            .set_position(Vec3::new(3.0, 0.0, 0.0));
        bridge.pre_step(&arena);
        assert_eq!(bridge.step_if_playing(1.0, false), 0);
        bridge.post_step(&mut arena);
        assert_eq!(arena.get(e).unwrap().position(), Vec3::new(3.0, 0.0, 0.0));

        let body = bridge.body_of(e).unwrap();
        assert_eq!(
            bridge.engine().body_transform(body).unwrap().position,
            Vec3::new(3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn playing_world_pulls_dynamic_transforms_back() {
        let mut arena = EntityArena::new();
        let e = arena.insert("Ball", Guid::new(), Transform::default());
        arena
            .get_mut(e)
            .unwrap()
            .add_component(RigidBody::new(BodyType::Dynamic).with_collider(Collider::sphere(1.0)))
            .unwrap();
        let mut bridge = bridge();
        bridge.sync(&arena);
        bridge.pre_step(&arena);
        assert_eq!(bridge.step_if_playing(0.2, true), 2);
        bridge.post_step(&mut arena);
        assert!(arena.get(e).unwrap().position().z < 0.0);
    }

    #[test]
    fn component_edits_rebuild_engine_objects() {
        let mut arena = EntityArena::new();
        let e = arena.insert("Ball", Guid::new(), Transform::default());
        {
            let entity = arena.get_mut(e).unwrap();
            entity
                .add_component(RigidBody::new(BodyType::Kinematic).with_collider(Collider::sphere(1.0)))
                .unwrap();
            entity
                .add_component(TriggerVolume::default().with_collider(Collider::sphere(1.0)))
                .unwrap();
        }
        let mut bridge = bridge();
        bridge.sync(&arena);
        let body = bridge.body_of(e).unwrap();
        let volume = bridge.volume_of(e).unwrap();

        // Nothing changed: same engine objects.
        bridge.sync(&arena);
        assert_eq!(bridge.body_of(e), Some(body));
        assert_eq!(bridge.volume_of(e), Some(volume));

        {
            let entity = arena.get_mut(e).unwrap();
            entity.get_component_mut::<RigidBody>().unwrap().body_type = BodyType::Dynamic;
            entity.get_component_mut::<TriggerVolume>().unwrap().colliders = vec![Collider::sphere(4.0)];
        }
        bridge.sync(&arena);
        assert_ne!(bridge.body_of(e), Some(body));
        assert_ne!(bridge.volume_of(e), Some(volume));
        assert_eq!(bridge.engine().body_count(), 1);
        assert_eq!(bridge.engine().volume_count(), 1);

        // The rebuilt body is dynamic, so gravity now moves it.
        bridge.pre_step(&arena);
        bridge.step_if_playing(0.2, true);
        bridge.post_step(&mut arena);
        assert!(arena.get(e).unwrap().position().z < 0.0);
    }

    #[test]
    fn trigger_enters_resolve_to_entities() {
        let mut arena = EntityArena::new();
        let target = arena.insert("Heart", Guid::new(), Transform::default());
        arena
            .get_mut(target)
            .unwrap()
            .add_component(TriggerVolume::default().with_collider(Collider::sphere(2.0)))
            .unwrap();
        let enemy = arena.insert(
            "Fast Enemy",
            Guid::new(),
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
        );
        arena
            .get_mut(enemy)
            .unwrap()
            .add_component(RigidBody::new(BodyType::Kinematic).with_collider(Collider::sphere(0.5)))
            .unwrap();

        let mut bridge = bridge();
        bridge.sync(&arena);
        bridge.pre_step(&arena);
        bridge.step_if_playing(0.1, true);
        let enters = bridge.post_step(&mut arena);
        assert_eq!(
            enters,
            vec![TriggerEnter {
                volume_owner: target,
                other: enemy
            }]
        );
    }
}
