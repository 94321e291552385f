use cellops_common::Transform;
use glam::Vec3;
use slotmap::SlotMap;
use std::collections::BTreeSet;

use crate::engine::{BodyDesc, BodyHandle, Motion, PhysicsEngine, Sphere, VolumeHandle};

#[derive(Debug)]
struct Body {
    desc: BodyDesc,
    transform: Transform,
    velocity: Vec3,
}

#[derive(Debug)]
struct Volume {
    shapes: Vec<Sphere>,
    transform: Transform,
    overlapping: BTreeSet<BodyHandle>,
}

/// Fixed-step engine with gravity for dynamic bodies and bounding-sphere
/// trigger detection. No contact response.
///
/// Time left over after `max_sub_steps` is dropped rather than carried, so a
/// long frame cannot snowball into ever longer catch-up steps.
#[derive(Debug)]
pub struct SimplePhysics {
    bodies: SlotMap<BodyHandle, Body>,
    volumes: SlotMap<VolumeHandle, Volume>,
    gravity: Vec3,
    fixed_time_step: f32,
    accumulator: f32,
    enters: Vec<(VolumeHandle, BodyHandle)>,
}

impl SimplePhysics {
    pub fn new(fixed_time_step: f32) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            volumes: SlotMap::with_key(),
            gravity: Vec3::new(0.0, 0.0, -9.81),
            fixed_time_step: fixed_time_step.max(f32::EPSILON),
            accumulator: 0.0,
            enters: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|b| b.velocity)
    }

    fn integrate(&mut self, h: f32) {
        for body in self.bodies.values_mut() {
            if body.desc.motion == Motion::Dynamic {
                body.velocity += self.gravity * h;
                body.transform.position += body.velocity * h;
            }
        }
    }

    fn detect_triggers(&mut self) {
        for (volume_handle, volume) in &mut self.volumes {
            let mut now = BTreeSet::new();
            for (body_handle, body) in &self.bodies {
                let hit = volume.shapes.iter().any(|vs| {
                    body.desc
                        .shapes
                        .iter()
                        .any(|bs| vs.overlaps(&volume.transform, bs, &body.transform))
                });
                if hit {
                    now.insert(body_handle);
                }
            }
            for body in now.difference(&volume.overlapping) {
                self.enters.push((volume_handle, *body));
            }
            volume.overlapping = now;
        }
    }
}

impl Default for SimplePhysics {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl PhysicsEngine for SimplePhysics {
    fn create_body(&mut self, desc: BodyDesc, transform: Transform) -> BodyHandle {
        self.bodies.insert(Body {
            desc,
            transform,
            velocity: Vec3::ZERO,
        })
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        if self.bodies.remove(body).is_none() {
            return false;
        }
        for volume in self.volumes.values_mut() {
            volume.overlapping.remove(&body);
        }
        self.enters.retain(|(_, b)| *b != body);
        true
    }

    fn create_volume(&mut self, shapes: Vec<Sphere>, transform: Transform) -> VolumeHandle {
        self.volumes.insert(Volume {
            shapes,
            transform,
            overlapping: BTreeSet::new(),
        })
    }

    fn destroy_volume(&mut self, volume: VolumeHandle) -> bool {
        self.enters.retain(|(v, _)| *v != volume);
        self.volumes.remove(volume).is_some()
    }

    fn set_body_transform(&mut self, body: BodyHandle, transform: Transform) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.transform = transform;
        }
    }

    fn body_transform(&self, body: BodyHandle) -> Option<Transform> {
        self.bodies.get(body).map(|b| b.transform)
    }

    fn set_volume_transform(&mut self, volume: VolumeHandle, transform: Transform) {
        if let Some(v) = self.volumes.get_mut(volume) {
            v.transform = transform;
        }
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn step(&mut self, dt: f32, max_sub_steps: u32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut taken = 0;
        while self.accumulator >= self.fixed_time_step && taken < max_sub_steps {
            self.integrate(self.fixed_time_step);
            self.accumulator -= self.fixed_time_step;
            taken += 1;
        }
        if self.accumulator >= self.fixed_time_step {
            tracing::debug!(
                dropped = self.accumulator,
                max_sub_steps,
                "physics fell behind; dropping time"
            );
            self.accumulator = 0.0;
        }
        self.detect_triggers();
        taken
    }

    fn drain_trigger_enters(&mut self) -> Vec<(VolumeHandle, BodyHandle)> {
        std::mem::take(&mut self.enters)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn volume_count(&self) -> usize {
        self.volumes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(motion: Motion) -> BodyDesc {
        BodyDesc {
            motion,
            mass: 1.0,
            shapes: vec![Sphere {
                offset: Vec3::ZERO,
                radius: 0.5,
            }],
        }
    }

    #[test]
    fn dynamic_body_falls_static_does_not() {
        let mut physics = SimplePhysics::new(0.1);
        let falling = physics.create_body(ball(Motion::Dynamic), Transform::default());
        let fixed = physics.create_body(ball(Motion::Static), Transform::default());

        assert_eq!(physics.step(0.25, 15), 2);
        assert!(physics.body_transform(falling).unwrap().position.z < 0.0);
        assert_eq!(physics.body_transform(fixed).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn sub_steps_are_capped() {
        let mut physics = SimplePhysics::new(0.01);
        assert_eq!(physics.step(1.0, 15), 15);
        // The backlog was dropped, so a tiny step takes nothing.
        assert_eq!(physics.step(0.001, 15), 0);
    }

    #[test]
    fn trigger_reports_enter_once() {
        let mut physics = SimplePhysics::default();
        let volume = physics.create_volume(
            vec![Sphere {
                offset: Vec3::ZERO,
                radius: 1.0,
            }],
            Transform::default(),
        );
        let body = physics.create_body(
            ball(Motion::Kinematic),
            Transform::from_position(Vec3::new(5.0, 0.0, 0.0)),
        );

        physics.step(1.0 / 60.0, 15);
        assert!(physics.drain_trigger_enters().is_empty());

        physics.set_body_transform(body, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        physics.step(1.0 / 60.0, 15);
        assert_eq!(physics.drain_trigger_enters(), vec![(volume, body)]);

        // Still inside: no new enter.
        physics.step(1.0 / 60.0, 15);
        assert!(physics.drain_trigger_enters().is_empty());

        // Leave and come back.
        physics.set_body_transform(body, Transform::from_position(Vec3::new(9.0, 0.0, 0.0)));
        physics.step(1.0 / 60.0, 15);
        physics.set_body_transform(body, Transform::default());
        physics.step(1.0 / 60.0, 15);
        assert_eq!(physics.drain_trigger_enters().len(), 1);
    }

    #[test]
    fn destroyed_body_drops_pending_enters() {
        let mut physics = SimplePhysics::default();
        physics.create_volume(
            vec![Sphere {
                offset: Vec3::ZERO,
                radius: 1.0,
            }],
            Transform::default(),
        );
        let body = physics.create_body(ball(Motion::Kinematic), Transform::default());
        physics.step(0.0, 15);
        assert!(physics.destroy_body(body));
        assert!(physics.drain_trigger_enters().is_empty());
        assert!(!physics.destroy_body(body));
    }
}
