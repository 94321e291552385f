//! The demo level used by `simulate` and `save`.

use anyhow::Context;
use cellops_common::{AssetId, Guid, Transform};
use cellops_ecs::components::{
    Ability, AbilityBehaviour, EnemySpawnerBehaviour, TargetController, TargetSpec,
};
use cellops_ecs::EntityHandle;
use cellops_kernel::{GameConfig, Scene};
use glam::Vec3;

pub const TARGET_NAMES: [&str; 4] = ["Lung", "Heart", "Brain", "Liver"];

pub fn build(config: GameConfig) -> anyhow::Result<Scene> {
    let mut scene = Scene::new(config);
    scene.set_default_material(Some(AssetId::new()));

    if let Some(camera) = scene.main_camera() {
        if let Some(entity) = scene.entity_mut(camera) {
            entity.set_position(Vec3::new(0.0, -120.0, 60.0));
            let mut transform = *entity.transform();
            transform.look_at(Vec3::ZERO, Vec3::Z);
            entity.set_transform(transform);
        }
    }

    let player = scene.create_entity_with("Player", Guid::new(), Transform::default());
    entity(&mut scene, player)?
        .add_component(AbilityBehaviour::new(Ability::Moderna, 5.0))
        .context("player ability")?;

    let controller = scene.create_entity("Target Spawner");
    entity(&mut scene, controller)?
        .add_component(TargetController {
            targets: TARGET_NAMES.iter().map(|n| TargetSpec::named(*n)).collect(),
            ..TargetController::default()
        })
        .context("target controller")?;

    let spawner = scene.create_entity("Enemy Spawner");
    entity(&mut scene, spawner)?
        .add_component(EnemySpawnerBehaviour::default())
        .context("enemy spawner")?;

    Ok(scene)
}

fn entity(scene: &mut Scene, handle: EntityHandle) -> anyhow::Result<&mut cellops_ecs::Entity> {
    scene
        .entity_mut(handle)
        .context("entity vanished while building the demo scene")
}
