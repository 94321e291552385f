//! What a component sees of the scene while one of its callbacks runs.

use cellops_common::Transform;
use glam::Vec3;

use crate::arena::EntityArena;
use crate::component::Component;
use crate::components::TargetBehaviour;
use crate::entity::EntityHandle;
use crate::rng::SceneRng;

/// A structural change requested from inside a component callback. The scene
/// applies queued commands at its flush points, never mid-iteration.
#[derive(Debug)]
pub enum Command {
    Destroy(EntityHandle),
    Spawn(EntityBlueprint),
    /// An enemy's health reached zero; counts toward the round.
    EnemyKilled(EntityHandle),
    /// A target's health fell below zero.
    TargetDestroyed(EntityHandle),
    /// A target lookup found nothing alive.
    TargetsExhausted,
}

/// Everything needed to create one entity at a flush point.
#[derive(Debug)]
pub struct EntityBlueprint {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<EntityHandle>,
    pub components: Vec<Box<dyn Component>>,
}

impl EntityBlueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            parent: None,
            components: Vec::new(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn child_of(mut self, parent: EntityHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with<C: Component>(mut self, component: C) -> Self {
        self.components.push(Box::new(component));
        self
    }
}

/// Per-call view handed to component callbacks.
///
/// The owning entity's components are moved out of the arena for the
/// duration of the call, so the rest of the arena can be read freely. The
/// entity's local transform is lent separately and written back afterwards.
pub struct ComponentContext<'a> {
    entity: EntityHandle,
    transform: &'a mut Transform,
    arena: &'a EntityArena,
    pending: &'a [EntityHandle],
    rng: &'a mut SceneRng,
    commands: &'a mut Vec<Command>,
}

impl<'a> ComponentContext<'a> {
    pub fn new(
        entity: EntityHandle,
        transform: &'a mut Transform,
        arena: &'a EntityArena,
        pending: &'a [EntityHandle],
        rng: &'a mut SceneRng,
        commands: &'a mut Vec<Command>,
    ) -> Self {
        Self {
            entity,
            transform,
            arena,
            pending,
            rng,
            commands,
        }
    }

    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    pub fn name(&self) -> &str {
        self.arena.get(self.entity).map_or("", |e| e.name())
    }

    pub fn transform(&self) -> &Transform {
        self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    /// World position of the owning entity, using the in-flight local
    /// transform.
    pub fn world_position(&self) -> Vec3 {
        self.arena
            .parent_world_matrix(self.entity)
            .transform_point3(self.transform.position)
    }

    /// Live and not queued for deletion.
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.arena.contains(handle) && !self.pending.contains(&handle)
    }

    pub fn entity_world_position(&self, handle: EntityHandle) -> Option<Vec3> {
        if handle == self.entity {
            return Some(self.world_position());
        }
        self.arena.world_position(handle)
    }

    /// A component on another entity. The calling entity's own components
    /// are not visible here.
    pub fn component<C: Component>(&self, handle: EntityHandle) -> Option<&C> {
        self.arena.get(handle)?.get_component::<C>()
    }

    /// Pick a random live target. An empty result is reported to the scene,
    /// which treats it as the loss condition.
    pub fn find_random_target(&mut self) -> Option<EntityHandle> {
        let targets: Vec<EntityHandle> = self
            .arena
            .iter()
            .filter(|e| e.get_component::<TargetBehaviour>().is_some())
            .map(|e| e.handle())
            .filter(|h| !self.pending.contains(h))
            .collect();
        if targets.is_empty() {
            self.commands.push(Command::TargetsExhausted);
            return None;
        }
        Some(targets[self.rng.index(targets.len())])
    }

    pub fn request_destroy(&mut self, handle: EntityHandle) {
        self.commands.push(Command::Destroy(handle));
    }

    pub fn spawn(&mut self, blueprint: EntityBlueprint) {
        self.commands.push(Command::Spawn(blueprint));
    }

    pub fn report_enemy_killed(&mut self) {
        self.commands.push(Command::EnemyKilled(self.entity));
    }

    pub fn destroy_target(&mut self) {
        self.commands.push(Command::TargetDestroyed(self.entity));
    }

    pub fn rng(&mut self) -> &mut SceneRng {
        self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellops_common::Guid;

    #[test]
    fn random_target_skips_pending_and_reports_exhaustion() {
        let mut arena = EntityArena::new();
        let target = arena.insert("Lung", Guid::new(), Transform::default());
        arena
            .get_mut(target)
            .unwrap()
            .add_component(TargetBehaviour::new(100.0))
            .unwrap();
        let enemy = arena.insert("Enemy", Guid::new(), Transform::default());

        let mut transform = Transform::default();
        let mut rng = SceneRng::with_seed(1);
        let mut commands = Vec::new();

        {
            let mut ctx =
                ComponentContext::new(enemy, &mut transform, &arena, &[], &mut rng, &mut commands);
            assert_eq!(ctx.find_random_target(), Some(target));
        }
        assert!(commands.is_empty());

        let pending = [target];
        let mut ctx =
            ComponentContext::new(enemy, &mut transform, &arena, &pending, &mut rng, &mut commands);
        assert_eq!(ctx.find_random_target(), None);
        assert!(!ctx.is_alive(target));
        assert!(matches!(commands.as_slice(), [Command::TargetsExhausted]));
    }

    #[test]
    fn world_position_uses_parent_and_local_copy() {
        let mut arena = EntityArena::new();
        let parent = arena.insert(
            "holder",
            Guid::new(),
            Transform::from_position(Vec3::new(0.0, 0.0, 10.0)),
        );
        let child = arena.insert("child", Guid::new(), Transform::default());
        arena.add_child(parent, child).unwrap();

        let mut transform = Transform::default();
        let mut rng = SceneRng::with_seed(1);
        let mut commands = Vec::new();
        let mut ctx =
            ComponentContext::new(child, &mut transform, &arena, &[], &mut rng, &mut commands);
        ctx.set_position(Vec3::new(1.0, 0.0, 0.0));
        assert!(ctx
            .world_position()
            .abs_diff_eq(Vec3::new(1.0, 0.0, 10.0), 1e-5));
    }

    #[test]
    fn commands_are_queued_not_applied() {
        let mut arena = EntityArena::new();
        let a = arena.insert("a", Guid::new(), Transform::default());
        let mut transform = Transform::default();
        let mut rng = SceneRng::with_seed(1);
        let mut commands = Vec::new();
        {
            let mut ctx =
                ComponentContext::new(a, &mut transform, &arena, &[], &mut rng, &mut commands);
            ctx.request_destroy(a);
            ctx.spawn(EntityBlueprint::new("spawned").at(Vec3::X));
            ctx.report_enemy_killed();
        }
        assert!(arena.contains(a));
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], Command::EnemyKilled(h) if h == a));
    }
}
