use cellops_common::{Guid, Transform};
use glam::{Quat, Vec3};

use crate::component::{Component, ComponentError, ComponentKind, ComponentSet};

slotmap::new_key_type! {
    /// Process-local handle to an entity slot. Handles are generational: once
    /// the entity is removed, the handle resolves to nothing even if the slot
    /// is reused, so holding one is a weak reference.
    pub struct EntityHandle;
}

/// A game object: identity, local transform, hierarchy links and its
/// components. World transforms are derived by [`crate::EntityArena`].
#[derive(Debug)]
pub struct Entity {
    handle: EntityHandle,
    guid: Guid,
    name: String,
    transform: Transform,
    pub(crate) parent: Option<EntityHandle>,
    pub(crate) children: Vec<EntityHandle>,
    pub(crate) components: ComponentSet,
}

impl Entity {
    pub(crate) fn new(handle: EntityHandle, guid: Guid, name: String, transform: Transform) -> Self {
        Self {
            handle,
            guid,
            name,
            transform,
            parent: None,
            children: Vec::new(),
            components: ComponentSet::default(),
        }
    }

    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Local transform, relative to the parent (or the world for roots).
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    pub fn parent(&self) -> Option<EntityHandle> {
        self.parent
    }

    /// Children in the order they were attached.
    pub fn children(&self) -> &[EntityHandle] {
        &self.children
    }

    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentSet {
        &mut self.components
    }

    /// Attach a component. Fails if one of the same kind is already present,
    /// leaving the existing component untouched.
    pub fn add_component<C: Component>(&mut self, component: C) -> Result<&mut C, ComponentError> {
        self.components.add(component)
    }

    pub fn get_component<C: Component>(&self) -> Option<&C> {
        self.components.get::<C>()
    }

    pub fn get_component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.get_mut::<C>()
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains_kind(kind)
    }
}
