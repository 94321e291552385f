use cellops_common::Guid;
use cellops_ecs::{ComponentKind, DebugUi, EntityHandle};
use cellops_kernel::{PlayState, Scene};
use glam::Vec3;
use std::fmt;

/// Read-only queries against a scene for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        SceneSummary {
            state: scene.state(),
            round: scene.round(),
            kills: scene.kills(),
            entity_count: scene.entity_count(),
            targets: scene.targets().len(),
            enemies: scene.enemies().len(),
            lights: scene.lights().len(),
            pending_events: scene.events().len(),
        }
    }

    pub fn inspect_entity(scene: &Scene, handle: EntityHandle) -> Option<EntityInfo> {
        let entity = scene.entity(handle)?;
        let parent = entity
            .parent()
            .and_then(|p| scene.entity(p))
            .map(|p| p.name().to_owned());
        Some(EntityInfo {
            guid: entity.guid(),
            name: entity.name().to_owned(),
            parent,
            children: entity.children().len(),
            components: entity.components().kinds(),
            world_position: scene.arena().world_position(handle).unwrap_or(Vec3::ZERO),
            pending: scene.is_pending(handle),
        })
    }

    /// Every entity in creation order.
    pub fn list_entities(scene: &Scene) -> Vec<EntityInfo> {
        scene
            .arena()
            .handles()
            .into_iter()
            .filter_map(|h| Self::inspect_entity(scene, h))
            .collect()
    }

    /// Draw the scene's debug panels into a fresh [`DebugUi`] and format
    /// them one field per line, grouped by section.
    pub fn debug_panels(scene: &mut Scene) -> String {
        let mut ui = DebugUi::new();
        scene.render_debug_ui(&mut ui);

        let mut out = String::new();
        let mut section: Option<&str> = None;
        for field in ui.fields() {
            let current = field.section.as_deref();
            if current != section {
                out.push_str(&format!("[{}]\n", current.unwrap_or("-")));
                section = current;
            }
            out.push_str(&format!("  {}: {}\n", field.label, field.value));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub state: PlayState,
    pub round: u32,
    pub kills: u32,
    pub entity_count: usize,
    pub targets: usize,
    pub enemies: usize,
    pub lights: usize,
    pub pending_events: usize,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scene: state={} round={} kills={} entities={} targets={} enemies={} lights={} pending_events={}",
            self.state,
            self.round,
            self.kills,
            self.entity_count,
            self.targets,
            self.enemies,
            self.lights,
            self.pending_events
        )
    }
}

#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub guid: Guid,
    pub name: String,
    pub parent: Option<String>,
    pub children: usize,
    pub components: Vec<ComponentKind>,
    pub world_position: Vec3,
    pub pending: bool,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.world_position;
        write!(
            f,
            "Entity [{}] {} pos=({:.2}, {:.2}, {:.2})",
            self.guid.short(),
            self.name,
            p.x,
            p.y,
            p.z
        )?;
        if let Some(parent) = &self.parent {
            write!(f, " parent={parent}")?;
        }
        if self.children > 0 {
            write!(f, " children={}", self.children)?;
        }
        if !self.components.is_empty() {
            let kinds: Vec<&str> = self.components.iter().map(|k| k.name()).collect();
            write!(f, " [{}]", kinds.join(", "))?;
        }
        if self.pending {
            f.write_str(" (pending destroy)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellops_common::Transform;
    use cellops_ecs::components::TargetBehaviour;
    use cellops_kernel::GameConfig;

    #[test]
    fn summary_of_new_scene() {
        let scene = Scene::new(GameConfig::default());
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.state, PlayState::Editing);
        assert_eq!(summary.entity_count, 1);
        assert_eq!(summary.round, 0);
        assert!(format!("{summary}").contains("state=editing"));
    }

    #[test]
    fn inspect_child_entity() {
        let mut scene = Scene::empty(GameConfig::default());
        let holder = scene.create_entity_with(
            "List Of Targets",
            Guid::new(),
            Transform::from_position(Vec3::new(0.0, 0.0, 5.0)),
        );
        let lung = scene.create_entity_with(
            "Lung",
            Guid::new(),
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
        );
        scene
            .entity_mut(lung)
            .unwrap()
            .add_component(TargetBehaviour::new(100.0))
            .unwrap();
        scene.add_child(holder, lung).unwrap();

        let info = SceneInspector::inspect_entity(&scene, lung).unwrap();
        assert_eq!(info.parent.as_deref(), Some("List Of Targets"));
        assert_eq!(info.components, vec![ComponentKind::TargetBehaviour]);
        assert!(info.world_position.abs_diff_eq(Vec3::new(1.0, 0.0, 5.0), 1e-5));
        let line = info.to_string();
        assert!(line.contains("parent=List Of Targets"));
        assert!(line.contains("[TargetBehaviour]"));

        assert_eq!(SceneInspector::list_entities(&scene).len(), 2);
    }

    #[test]
    fn inspect_stale_handle() {
        let mut scene = Scene::empty(GameConfig::default());
        let a = scene.create_entity("a");
        scene.request_destroy(a);
        assert!(SceneInspector::inspect_entity(&scene, a).unwrap().pending);
        scene.flush_deletions();
        assert!(SceneInspector::inspect_entity(&scene, a).is_none());
    }

    #[test]
    fn debug_panels_group_by_section() {
        let mut scene = Scene::empty(GameConfig::default());
        let lung = scene.create_entity("Lung");
        scene
            .entity_mut(lung)
            .unwrap()
            .add_component(TargetBehaviour::new(100.0))
            .unwrap();
        let text = SceneInspector::debug_panels(&mut scene);
        assert!(text.contains("[Lung]"));
        assert!(text.contains("Health: 100.00"));
    }
}
