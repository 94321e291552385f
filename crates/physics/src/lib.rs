//! Physics integration.
//!
//! [`PhysicsEngine`] is the contract an external rigid-body engine must meet.
//! [`SimplePhysics`] is a small bounding-sphere implementation of it used by
//! the headless runtime and tests. [`PhysicsBridge`] keeps an engine in step
//! with the scene's entities.
//!
//! # Invariants
//! - Only the bridge talks to the engine.
//! - Bodies advance only when the caller says the scene is playing.

pub mod bridge;
pub mod engine;
pub mod simple;

pub use bridge::{PhysicsBridge, TriggerEnter};
pub use engine::{BodyDesc, BodyHandle, Motion, PhysicsEngine, Sphere, VolumeHandle};
pub use simple::SimplePhysics;

pub fn crate_info() -> &'static str {
    "cellops-physics v0.1.0"
}
