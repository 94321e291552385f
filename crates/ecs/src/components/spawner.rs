use cellops_common::AssetId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BodyType, Collider, EnemyBehaviour, EnemyKind, RenderComponent, RigidBody};
use crate::component::{encode, Component, ComponentError};
use crate::context::EntityBlueprint;
use crate::debug_ui::DebugUi;
use crate::rng::SceneRng;

/// Enemy counts for one wave. "Slow" enemies are the large kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveComposition {
    pub slow: u32,
    pub normal: u32,
    pub fast: u32,
}

impl WaveComposition {
    pub const fn new(slow: u32, normal: u32, fast: u32) -> Self {
        Self { slow, normal, fast }
    }

    pub fn total(&self) -> u32 {
        self.slow + self.normal + self.fast
    }
}

/// How to build one enemy of a given kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyPrototype {
    pub health: f32,
    pub speed: f32,
    pub radius: f32,
    #[serde(default)]
    pub mesh: Option<AssetId>,
    #[serde(default)]
    pub material: Option<AssetId>,
}

impl EnemyPrototype {
    fn new(health: f32, speed: f32, radius: f32) -> Self {
        Self {
            health,
            speed,
            radius,
            mesh: None,
            material: None,
        }
    }
}

/// Builds enemy waves. Each round the scene bumps the speed multiplier
/// before asking for the next wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawnerBehaviour {
    pub large: EnemyPrototype,
    pub normal: EnemyPrototype,
    pub fast: EnemyPrototype,
    pub speed_multiplier: f32,
    pub speed_step: f32,
    /// Spawn positions are integral coordinates in `[-extent, extent)` on
    /// every axis.
    pub spawn_extent: i32,
}

impl Default for EnemySpawnerBehaviour {
    fn default() -> Self {
        Self {
            large: EnemyPrototype::new(5.0, 0.5, 2.0),
            normal: EnemyPrototype::new(3.0, 1.0, 1.0),
            fast: EnemyPrototype::new(1.0, 2.0, 0.5),
            speed_multiplier: 1.0,
            speed_step: 0.1,
            spawn_extent: 50,
        }
    }
}

impl EnemySpawnerBehaviour {
    pub fn prototype(&self, kind: EnemyKind) -> &EnemyPrototype {
        match kind {
            EnemyKind::Large => &self.large,
            EnemyKind::Normal => &self.normal,
            EnemyKind::Fast => &self.fast,
        }
    }

    pub fn increase_enemy_speed(&mut self) {
        self.speed_multiplier += self.speed_step;
    }

    /// Blueprints for every enemy in `wave`, large first.
    pub fn spawn_wave(&self, wave: WaveComposition, rng: &mut SceneRng) -> Vec<EntityBlueprint> {
        let groups = [
            (EnemyKind::Large, wave.slow),
            (EnemyKind::Normal, wave.normal),
            (EnemyKind::Fast, wave.fast),
        ];
        let mut blueprints = Vec::with_capacity(wave.total() as usize);
        for (kind, count) in groups {
            for _ in 0..count {
                blueprints.push(self.enemy_blueprint(kind, rng));
            }
        }
        tracing::debug!(?wave, multiplier = self.speed_multiplier, "wave built");
        blueprints
    }

    fn enemy_blueprint(&self, kind: EnemyKind, rng: &mut SceneRng) -> EntityBlueprint {
        let proto = self.prototype(kind);
        let extent = self.spawn_extent;
        let position = Vec3::new(
            rng.symmetric(extent),
            rng.symmetric(extent),
            rng.symmetric(extent),
        );
        EntityBlueprint::new(kind.label())
            .at(position)
            .with(RenderComponent {
                mesh: proto.mesh,
                material: proto.material,
            })
            .with(RigidBody::new(BodyType::Kinematic).with_collider(Collider::sphere(proto.radius)))
            .with(EnemyBehaviour::new(
                kind,
                proto.health,
                proto.speed * self.speed_multiplier,
            ))
    }
}

impl Component for EnemySpawnerBehaviour {
    crate::component_kind!(EnemySpawnerBehaviour);

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.drag_float("Speed Multiplier", &mut self.speed_multiplier);
        ui.drag_float("Speed Step", &mut self.speed_step);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.spawn_extent <= 0 {
            return Err(format!("spawn_extent must be positive, got {}", self.spawn_extent));
        }
        for proto in [&self.large, &self.normal, &self.fast] {
            if proto.health <= 0.0 || proto.radius <= 0.0 {
                return Err("enemy prototypes need positive health and radius".to_owned());
            }
        }
        Ok(())
    }
}
