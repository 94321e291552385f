//! The live entity set.
//!
//! # Invariants
//! - Iteration follows insertion order.
//! - The parent/child graph is acyclic; `add_child` rejects cycles.
//! - A removed entity's handle never resolves again, even after slot reuse.

use cellops_common::{Guid, Transform};
use glam::{Mat4, Vec3};
use slotmap::SlotMap;

use crate::component::ComponentSet;
use crate::entity::{Entity, EntityHandle};

/// Errors from hierarchy edits.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("entity {0:?} is not live")]
    UnknownEntity(EntityHandle),
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    Cyclic {
        parent: EntityHandle,
        child: EntityHandle,
    },
    #[error("entity {child:?} is not a child of {parent:?}")]
    NotAChild {
        parent: EntityHandle,
        child: EntityHandle,
    },
}

#[derive(Debug, Default)]
pub struct EntityArena {
    slots: SlotMap<EntityHandle, Entity>,
    order: Vec<EntityHandle>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.slots.contains_key(handle)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.slots.get(handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.slots.get_mut(handle)
    }

    /// Register a new entity and return its handle.
    pub fn insert(&mut self, name: impl Into<String>, guid: Guid, transform: Transform) -> EntityHandle {
        let name = name.into();
        let handle = self
            .slots
            .insert_with_key(|handle| Entity::new(handle, guid, name, transform));
        self.order.push(handle);
        handle
    }

    /// Remove an entity from the live set. Its children become roots and keep
    /// their local transforms.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<Entity> {
        let entity = self.slots.remove(handle)?;
        self.order.retain(|h| *h != handle);
        if let Some(parent) = entity.parent.and_then(|p| self.slots.get_mut(p)) {
            parent.children.retain(|c| *c != handle);
        }
        for child in &entity.children {
            if let Some(child) = self.slots.get_mut(*child) {
                child.parent = None;
            }
        }
        Some(entity)
    }

    /// Live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|h| self.slots.get(*h))
    }

    /// A copy of the current handle order, for passes that mutate entities
    /// while walking the set.
    pub fn handles(&self) -> Vec<EntityHandle> {
        self.order.clone()
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityHandle> {
        self.iter().find(|e| e.name() == name).map(Entity::handle)
    }

    pub fn find_by_guid(&self, guid: Guid) -> Option<EntityHandle> {
        self.iter().find(|e| e.guid() == guid).map(Entity::handle)
    }

    /// True when `ancestor` appears on the parent chain of `of`.
    pub fn is_ancestor(&self, ancestor: EntityHandle, of: EntityHandle) -> bool {
        let mut current = self.slots.get(of).and_then(|e| e.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.slots.get(handle).and_then(|e| e.parent);
        }
        false
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: EntityHandle, child: EntityHandle) -> Result<(), HierarchyError> {
        if !self.contains(parent) {
            return Err(HierarchyError::UnknownEntity(parent));
        }
        if !self.contains(child) {
            return Err(HierarchyError::UnknownEntity(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(HierarchyError::Cyclic { parent, child });
        }

        let previous = self.slots.get(child).and_then(|e| e.parent);
        if previous == Some(parent) {
            return Ok(());
        }
        if let Some(old) = previous.and_then(|p| self.slots.get_mut(p)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(entity) = self.slots.get_mut(child) {
            entity.parent = Some(parent);
        }
        if let Some(entity) = self.slots.get_mut(parent) {
            entity.children.push(child);
        }
        Ok(())
    }

    pub fn remove_child(&mut self, parent: EntityHandle, child: EntityHandle) -> Result<(), HierarchyError> {
        let is_child = self
            .slots
            .get(child)
            .ok_or(HierarchyError::UnknownEntity(child))?
            .parent
            == Some(parent);
        if !is_child {
            return Err(HierarchyError::NotAChild { parent, child });
        }
        if let Some(entity) = self.slots.get_mut(child) {
            entity.parent = None;
        }
        if let Some(entity) = self.slots.get_mut(parent) {
            entity.children.retain(|c| *c != child);
        }
        Ok(())
    }

    /// World matrix of the parent, identity for roots.
    pub fn parent_world_matrix(&self, handle: EntityHandle) -> Mat4 {
        self.slots
            .get(handle)
            .and_then(|e| e.parent)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Local transform composed with every ancestor's.
    pub fn world_matrix(&self, handle: EntityHandle) -> Option<Mat4> {
        let entity = self.slots.get(handle)?;
        let mut matrix = entity.transform().to_matrix();
        let mut current = entity.parent;
        while let Some(parent) = current.and_then(|p| self.slots.get(p)) {
            matrix = parent.transform().to_matrix() * matrix;
            current = parent.parent;
        }
        Some(matrix)
    }

    pub fn world_transform(&self, handle: EntityHandle) -> Option<Transform> {
        self.world_matrix(handle).map(|m| Transform::from_matrix(&m))
    }

    pub fn world_position(&self, handle: EntityHandle) -> Option<Vec3> {
        self.world_matrix(handle).map(|m| m.w_axis.truncate())
    }

    /// Set the local transform so that the entity ends up at `world`.
    pub fn set_world_matrix(&mut self, handle: EntityHandle, world: &Mat4) -> bool {
        let parent = self.parent_world_matrix(handle);
        match self.slots.get_mut(handle) {
            Some(entity) => {
                entity.set_transform(Transform::from_matrix(&(parent.inverse() * *world)));
                true
            }
            None => false,
        }
    }

    /// Move an entity's components out so they can run against a context
    /// that borrows the rest of the arena.
    pub fn take_components(&mut self, handle: EntityHandle) -> Option<ComponentSet> {
        self.slots
            .get_mut(handle)
            .map(|e| std::mem::take(&mut e.components))
    }

    /// Put components taken with [`Self::take_components`] back. Anything
    /// attached to the entity in the meantime is kept after them.
    pub fn restore_components(&mut self, handle: EntityHandle, mut components: ComponentSet) {
        if let Some(entity) = self.slots.get_mut(handle) {
            let added = std::mem::take(&mut entity.components);
            for component in added.into_boxed() {
                if let Err(e) = components.insert_boxed(component) {
                    tracing::warn!(entity = %entity.name(), "dropping component attached mid-pass: {e}");
                }
            }
            entity.components = components;
        }
    }
}
