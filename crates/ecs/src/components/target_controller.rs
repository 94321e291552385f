use cellops_common::AssetId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Collider, RenderComponent, TargetBehaviour, TriggerVolume};
use crate::component::{encode, Component, ComponentError};
use crate::context::EntityBlueprint;
use crate::debug_ui::DebugUi;
use crate::entity::EntityHandle;
use crate::rng::SceneRng;

const PLACEMENT_ATTEMPTS: usize = 64;

/// One target the controller creates when the game starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default)]
    pub mesh: Option<AssetId>,
    #[serde(default)]
    pub material: Option<AssetId>,
}

impl TargetSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: None,
            material: None,
        }
    }
}

/// Places the game's targets at random, well-separated positions and parents
/// them under a holder entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetController {
    pub targets: Vec<TargetSpec>,
    pub max_health: f32,
    pub trigger_radius: f32,
    pub spawn_extent: i32,
    pub min_separation: f32,
    pub holder_name: String,
}

impl Default for TargetController {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            max_health: 100.0,
            trigger_radius: 3.0,
            spawn_extent: 50,
            min_separation: 10.0,
            holder_name: "List Of Targets".to_owned(),
        }
    }
}

impl TargetController {
    /// Blueprints for every configured target. Placement retries a bounded
    /// number of times to keep targets `min_separation` apart and settles for
    /// the last candidate when the volume is too crowded.
    pub fn spawn_targets(&self, rng: &mut SceneRng, holder: Option<EntityHandle>) -> Vec<EntityBlueprint> {
        let mut occupied: Vec<Vec3> = Vec::with_capacity(self.targets.len());
        let mut blueprints = Vec::with_capacity(self.targets.len());

        for spec in &self.targets {
            let position = self.place(rng, &occupied);
            occupied.push(position);

            let mut blueprint = EntityBlueprint::new(spec.name.clone())
                .at(position)
                .with(RenderComponent {
                    mesh: spec.mesh,
                    material: spec.material,
                })
                .with(TriggerVolume::default().with_collider(Collider::sphere(self.trigger_radius)))
                .with(TargetBehaviour::new(self.max_health));
            if let Some(holder) = holder {
                blueprint = blueprint.child_of(holder);
            }
            blueprints.push(blueprint);
        }
        blueprints
    }

    fn place(&self, rng: &mut SceneRng, occupied: &[Vec3]) -> Vec3 {
        let extent = self.spawn_extent;
        let mut candidate = Vec3::ZERO;
        for _ in 0..PLACEMENT_ATTEMPTS {
            candidate = Vec3::new(
                rng.symmetric(extent),
                rng.symmetric(extent),
                rng.symmetric(extent),
            );
            if occupied
                .iter()
                .all(|p| p.distance(candidate) >= self.min_separation)
            {
                return candidate;
            }
        }
        tracing::warn!(extent, "no free target position found; placing anyway");
        candidate
    }
}

impl Component for TargetController {
    crate::component_kind!(TargetController);

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.int("Targets", self.targets.len() as i64);
        ui.drag_float("Max Health", &mut self.max_health);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_health <= 0.0 {
            return Err(format!("max_health must be positive, got {}", self.max_health));
        }
        if self.spawn_extent <= 0 {
            return Err(format!("spawn_extent must be positive, got {}", self.spawn_extent));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(names: &[&str]) -> TargetController {
        TargetController {
            targets: names.iter().map(|n| TargetSpec::named(*n)).collect(),
            ..TargetController::default()
        }
    }

    #[test]
    fn targets_are_separated() {
        let ctl = controller(&["Lung", "Heart", "Brain", "Liver"]);
        let mut rng = SceneRng::with_seed(21);
        let blueprints = ctl.spawn_targets(&mut rng, None);
        assert_eq!(blueprints.len(), 4);
        for (i, a) in blueprints.iter().enumerate() {
            for b in &blueprints[i + 1..] {
                assert!(a.transform.position.distance(b.transform.position) >= ctl.min_separation);
            }
        }
    }

    #[test]
    fn blueprints_carry_full_health_targets() {
        let ctl = controller(&["Lung"]);
        let mut rng = SceneRng::with_seed(2);
        let blueprints = ctl.spawn_targets(&mut rng, None);
        assert_eq!(blueprints[0].name, "Lung");
        let target = blueprints[0]
            .components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<TargetBehaviour>())
            .unwrap();
        assert_eq!(target.health, 100.0);
        assert!(blueprints[0].parent.is_none());
    }

    #[test]
    fn crowded_volume_still_places_every_target() {
        let ctl = TargetController {
            spawn_extent: 1,
            min_separation: 100.0,
            ..controller(&["a", "b", "c"])
        };
        let mut rng = SceneRng::with_seed(4);
        assert_eq!(ctl.spawn_targets(&mut rng, None).len(), 3);
    }
}
