//! Entities, the generational live set, and the component capability
//! contract.
//!
//! Entities live in an [`EntityArena`] and are addressed by [`EntityHandle`].
//! Handles are weak: once an entity is removed, its handle resolves to
//! nothing. Components are trait objects over a closed [`ComponentKind`] set;
//! the kind tag drives serialization dispatch.

pub mod arena;
pub mod component;
pub mod components;
pub mod context;
pub mod debug_ui;
pub mod entity;
pub mod rng;

pub use arena::{EntityArena, HierarchyError};
pub use component::{Component, ComponentDocument, ComponentError, ComponentKind, ComponentSet};
pub use context::{Command, ComponentContext, EntityBlueprint};
pub use debug_ui::{DebugField, DebugUi, DebugValue};
pub use entity::{Entity, EntityHandle};
pub use rng::SceneRng;

pub fn crate_info() -> &'static str {
    "cellops-ecs v0.1.0"
}
