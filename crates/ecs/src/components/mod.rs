//! The closed set of concrete components.

mod ability;
mod camera;
mod enemy;
mod physics;
mod render;
mod spawner;
mod target;
mod target_controller;

pub use ability::{Ability, AbilityBehaviour};
pub use camera::Camera;
pub use enemy::{EnemyBehaviour, EnemyKind};
pub use physics::{BodyType, Collider, RigidBody, TriggerVolume};
pub use render::RenderComponent;
pub use spawner::{EnemyPrototype, EnemySpawnerBehaviour, WaveComposition};
pub use target::TargetBehaviour;
pub use target_controller::{TargetController, TargetSpec};
