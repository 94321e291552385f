use cellops_common::Transform;
use glam::Vec3;
use std::fmt;

slotmap::new_key_type! {
    /// Engine-side rigid body.
    pub struct BodyHandle;
    /// Engine-side trigger volume.
    pub struct VolumeHandle;
}

/// How the engine moves a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Static,
    Kinematic,
    Dynamic,
}

/// Collision sphere in body space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub offset: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Center and radius in world space. Non-uniform scale uses the largest
    /// axis so the sphere stays conservative.
    pub fn to_world(&self, transform: &Transform) -> (Vec3, f32) {
        let center = transform.to_matrix().transform_point3(self.offset);
        (center, self.radius * transform.scale.abs().max_element())
    }

    pub fn overlaps(&self, at: &Transform, other: &Sphere, other_at: &Transform) -> bool {
        let (a, ra) = self.to_world(at);
        let (b, rb) = other.to_world(other_at);
        let reach = ra + rb;
        a.distance_squared(b) <= reach * reach
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub motion: Motion,
    pub mass: f32,
    pub shapes: Vec<Sphere>,
}

/// What the scene needs from a rigid-body engine.
pub trait PhysicsEngine: fmt::Debug {
    fn create_body(&mut self, desc: BodyDesc, transform: Transform) -> BodyHandle;

    fn destroy_body(&mut self, body: BodyHandle) -> bool;

    fn create_volume(&mut self, shapes: Vec<Sphere>, transform: Transform) -> VolumeHandle;

    fn destroy_volume(&mut self, volume: VolumeHandle) -> bool;

    fn set_body_transform(&mut self, body: BodyHandle, transform: Transform);

    fn body_transform(&self, body: BodyHandle) -> Option<Transform>;

    fn set_volume_transform(&mut self, volume: VolumeHandle, transform: Transform);

    fn set_gravity(&mut self, gravity: Vec3);

    /// Advance by `dt`, taking at most `max_sub_steps` fixed sub-steps.
    /// Returns the number of sub-steps taken.
    fn step(&mut self, dt: f32, max_sub_steps: u32) -> u32;

    /// Volume/body pairs that started overlapping since the last drain.
    fn drain_trigger_enters(&mut self) -> Vec<(VolumeHandle, BodyHandle)>;

    fn body_count(&self) -> usize;

    fn volume_count(&self) -> usize;
}
