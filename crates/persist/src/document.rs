//! Scene and entity documents.
//!
//! A scene document is plain JSON with the top-level keys `default_material`,
//! `ambient`, `skybox`, `objects`, `lights` and `main_camera`. Entities
//! reference their parent by guid, so loading runs in two passes: create
//! every entity, then link the hierarchy.

use std::collections::HashMap;

use cellops_common::{AssetId, Guid, Light, Transform};
use cellops_ecs::{ComponentDocument, ComponentError, Entity, EntityHandle, HierarchyError};
use cellops_kernel::{GameConfig, LightError, Scene, Skybox};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sections a scene document cannot load without.
const REQUIRED_SECTIONS: [&str; 2] = ["objects", "lights"];

/// Errors from turning a document back into a scene. A failed load never
/// touches an existing scene; the caller keeps whatever it had.
#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    #[error("scene document is missing the `{0}` section")]
    MissingSection(&'static str),
    #[error("malformed scene document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("entity `{name}`: {source}")]
    Component {
        name: String,
        #[source]
        source: ComponentError,
    },
    #[error("entity {0} appears more than once")]
    DuplicateGuid(Guid),
    #[error("entity {child} names unknown parent {parent}")]
    UnknownParent { child: Guid, parent: Guid },
    #[error("main camera {0} is not an entity in the document")]
    UnknownCamera(Guid),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Lights(#[from] LightError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub name: String,
    pub guid: Guid,
    pub transform: Transform,
    #[serde(default)]
    pub parent_guid: Option<Guid>,
    /// Position among the parent's children.
    #[serde(default)]
    pub sibling_index: usize,
    #[serde(default)]
    pub components: Vec<ComponentDocument>,
}

impl EntityDocument {
    pub fn capture(
        entity: &Entity,
        parent_guid: Option<Guid>,
        sibling_index: usize,
    ) -> Result<Self, ComponentError> {
        Ok(Self {
            name: entity.name().to_owned(),
            guid: entity.guid(),
            transform: *entity.transform(),
            parent_guid,
            sibling_index,
            components: entity.components().to_documents()?,
        })
    }
}

fn default_ambient() -> Vec3 {
    Vec3::splat(0.1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub default_material: Option<AssetId>,
    #[serde(default = "default_ambient")]
    pub ambient: Vec3,
    #[serde(default)]
    pub skybox: Skybox,
    pub objects: Vec<EntityDocument>,
    pub lights: Vec<Light>,
    #[serde(default)]
    pub main_camera: Option<Guid>,
}

impl SceneDocument {
    /// Capture every live entity, the lights and the scene settings.
    ///
    /// Entities already queued for deletion are left out, and the document
    /// describes the scene as it will be after the next flush: children of a
    /// pending parent are captured as roots.
    pub fn capture(scene: &Scene) -> Result<Self, ComponentError> {
        let kept = |h: EntityHandle| !scene.is_pending(h);
        let mut objects = Vec::with_capacity(scene.entity_count());
        for entity in scene.entities() {
            if !kept(entity.handle()) {
                continue;
            }
            let parent = entity
                .parent()
                .filter(|p| kept(*p))
                .and_then(|p| scene.entity(p));
            let (parent_guid, sibling_index) = match parent {
                Some(parent) => {
                    let index = parent
                        .children()
                        .iter()
                        .filter(|c| kept(**c))
                        .position(|c| *c == entity.handle())
                        .unwrap_or_default();
                    (Some(parent.guid()), index)
                }
                None => (None, 0),
            };
            objects.push(EntityDocument::capture(entity, parent_guid, sibling_index)?);
        }
        let main_camera = scene
            .main_camera()
            .filter(|h| kept(*h))
            .and_then(|h| scene.entity(h))
            .map(Entity::guid);
        Ok(Self {
            default_material: scene.default_material(),
            ambient: scene.lights().ambient(),
            skybox: *scene.skybox(),
            objects,
            lights: scene.lights().iter().copied().collect(),
            main_camera,
        })
    }

    /// Parse a document, reporting absent required sections by name rather
    /// than as a generic serde error.
    pub fn from_value(value: Value) -> Result<Self, SceneLoadError> {
        for section in REQUIRED_SECTIONS {
            if value.get(section).is_none() {
                return Err(SceneLoadError::MissingSection(section));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SceneLoadError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SceneLoadError> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build a fresh scene from this document.
    pub fn restore(&self, config: GameConfig) -> Result<Scene, SceneLoadError> {
        let mut scene = Scene::empty(config);
        let mut by_guid = HashMap::with_capacity(self.objects.len());

        // Pass 1: entities and components, no hierarchy.
        for object in &self.objects {
            if by_guid.contains_key(&object.guid) {
                return Err(SceneLoadError::DuplicateGuid(object.guid));
            }
            let component_error = |source| SceneLoadError::Component {
                name: object.name.clone(),
                source,
            };
            let components = object
                .components
                .iter()
                .map(ComponentDocument::instantiate)
                .collect::<Result<Vec<_>, _>>()
                .map_err(component_error)?;

            let handle = scene.create_entity_with(object.name.clone(), object.guid, object.transform);
            if let Some(entity) = scene.entity_mut(handle) {
                for component in components {
                    entity
                        .components_mut()
                        .insert_boxed(component)
                        .map_err(component_error)?;
                }
            }
            by_guid.insert(object.guid, handle);
        }

        // Pass 2: parent links, which may point forward in the list. Links
        // are made in sibling order so each parent gets its children back in
        // the order they were saved.
        let mut links: Vec<&EntityDocument> = self
            .objects
            .iter()
            .filter(|o| o.parent_guid.is_some())
            .collect();
        links.sort_by_key(|o| o.sibling_index);
        for object in links {
            let Some(parent_guid) = object.parent_guid else {
                continue;
            };
            let parent = by_guid
                .get(&parent_guid)
                .copied()
                .ok_or(SceneLoadError::UnknownParent {
                    child: object.guid,
                    parent: parent_guid,
                })?;
            if let Some(&child) = by_guid.get(&object.guid) {
                scene.add_child(parent, child)?;
            }
        }

        scene.lights_mut().set_ambient(self.ambient);
        for light in &self.lights {
            scene.lights_mut().add(*light)?;
        }
        scene.set_skybox(self.skybox);
        scene.set_default_material(self.default_material);

        if let Some(camera) = self.main_camera {
            let handle = by_guid
                .get(&camera)
                .copied()
                .ok_or(SceneLoadError::UnknownCamera(camera))?;
            scene.set_main_camera(Some(handle));
        }

        // Loading is not an authoring operation.
        scene.drain_events();
        tracing::info!(
            entities = self.objects.len(),
            lights = self.lights.len(),
            "scene restored from document"
        );
        Ok(scene)
    }
}
