//! The component capability contract and the closed registry of component
//! kinds used for serialization dispatch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;

use crate::components::{
    AbilityBehaviour, Camera, EnemyBehaviour, EnemySpawnerBehaviour, RenderComponent, RigidBody,
    TargetBehaviour, TargetController, TriggerVolume,
};
use crate::context::ComponentContext;
use crate::debug_ui::DebugUi;
use crate::entity::EntityHandle;

/// Stable tag for every component type the runtime knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Camera,
    Render,
    RigidBody,
    TriggerVolume,
    TargetBehaviour,
    EnemyBehaviour,
    AbilityBehaviour,
    EnemySpawnerBehaviour,
    TargetController,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        Self::Camera,
        Self::Render,
        Self::RigidBody,
        Self::TriggerVolume,
        Self::TargetBehaviour,
        Self::EnemyBehaviour,
        Self::AbilityBehaviour,
        Self::EnemySpawnerBehaviour,
        Self::TargetController,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Render => "Render",
            Self::RigidBody => "RigidBody",
            Self::TriggerVolume => "TriggerVolume",
            Self::TargetBehaviour => "TargetBehaviour",
            Self::EnemyBehaviour => "EnemyBehaviour",
            Self::AbilityBehaviour => "AbilityBehaviour",
            Self::EnemySpawnerBehaviour => "EnemySpawnerBehaviour",
            Self::TargetController => "TargetController",
        }
    }

    /// Build a component of this kind from its document.
    pub fn decode(self, data: Value) -> Result<Box<dyn Component>, ComponentError> {
        match self {
            Self::Camera => decode::<Camera>(self, data),
            Self::Render => decode::<RenderComponent>(self, data),
            Self::RigidBody => decode::<RigidBody>(self, data),
            Self::TriggerVolume => decode::<TriggerVolume>(self, data),
            Self::TargetBehaviour => decode::<TargetBehaviour>(self, data),
            Self::EnemyBehaviour => decode::<EnemyBehaviour>(self, data),
            Self::AbilityBehaviour => decode::<AbilityBehaviour>(self, data),
            Self::EnemySpawnerBehaviour => decode::<EnemySpawnerBehaviour>(self, data),
            Self::TargetController => decode::<TargetController>(self, data),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from attaching, encoding or decoding components.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("entity already has a {kind} component")]
    Duplicate { kind: ComponentKind },
    #[error("malformed {kind} component data: {source}")]
    Malformed {
        kind: ComponentKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {kind} component data: {reason}")]
    Invalid { kind: ComponentKind, reason: String },
    #[error("failed to encode {kind} component: {source}")]
    Encode {
        kind: ComponentKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} tag does not match the component's concrete type")]
    TypeMismatch { kind: ComponentKind },
}

/// Capability set shared by every component. Only `kind`, the `Any`
/// accessors and `to_document` are mandatory; the rest default to no-ops.
///
/// Callbacks receive a [`ComponentContext`] instead of a scene reference.
/// Structural changes (spawning, destroying) go through the context's command
/// queue and take effect at the scene's next flush point.
pub trait Component: fmt::Debug + 'static {
    fn kind(&self) -> ComponentKind;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn awake(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _dt: f32) {}

    fn render_debug_ui(&mut self, _ui: &mut DebugUi) {}

    /// A trigger volume on the owning entity began overlapping `other`.
    fn on_trigger_entered(&mut self, _ctx: &mut ComponentContext<'_>, _other: EntityHandle) {}

    fn to_document(&self) -> Result<Value, ComponentError>;

    /// Reject decoded data that is well-formed but not a valid game state.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Implements the tag and `Any` accessors of [`Component`].
#[macro_export]
macro_rules! component_kind {
    ($kind:ident) => {
        fn kind(&self) -> $crate::ComponentKind {
            $crate::ComponentKind::$kind
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

/// Serialize a component's persistent fields.
pub fn encode<C: Component + Serialize>(component: &C) -> Result<Value, ComponentError> {
    serde_json::to_value(component).map_err(|source| ComponentError::Encode {
        kind: component.kind(),
        source,
    })
}

fn decode<C: Component + DeserializeOwned>(
    kind: ComponentKind,
    data: Value,
) -> Result<Box<dyn Component>, ComponentError> {
    let component: C =
        serde_json::from_value(data).map_err(|source| ComponentError::Malformed { kind, source })?;
    component
        .validate()
        .map_err(|reason| ComponentError::Invalid { kind, reason })?;
    Ok(Box::new(component))
}

/// A component as stored in a document: kind tag plus its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDocument {
    pub kind: ComponentKind,
    pub data: Value,
}

impl ComponentDocument {
    pub fn capture(component: &dyn Component) -> Result<Self, ComponentError> {
        Ok(Self {
            kind: component.kind(),
            data: component.to_document()?,
        })
    }

    pub fn instantiate(&self) -> Result<Box<dyn Component>, ComponentError> {
        self.kind.decode(self.data.clone())
    }
}

/// The components owned by one entity, at most one per kind, kept in
/// attachment order.
#[derive(Debug, Default)]
pub struct ComponentSet {
    entries: Vec<Box<dyn Component>>,
}

impl ComponentSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_kind(&self, kind: ComponentKind) -> bool {
        self.entries.iter().any(|c| c.kind() == kind)
    }

    pub fn add<C: Component>(&mut self, component: C) -> Result<&mut C, ComponentError> {
        let kind = component.kind();
        self.insert_boxed(Box::new(component))?;
        self.entries
            .last_mut()
            .and_then(|c| c.as_any_mut().downcast_mut::<C>())
            .ok_or(ComponentError::TypeMismatch { kind })
    }

    pub fn insert_boxed(&mut self, component: Box<dyn Component>) -> Result<(), ComponentError> {
        let kind = component.kind();
        if self.contains_kind(kind) {
            return Err(ComponentError::Duplicate { kind });
        }
        self.entries.push(component);
        Ok(())
    }

    pub fn get<C: Component>(&self) -> Option<&C> {
        self.entries
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<C>())
    }

    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.entries
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<C>())
    }

    pub fn get_kind(&self, kind: ComponentKind) -> Option<&dyn Component> {
        self.entries
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| &**c)
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.entries.iter().map(|c| c.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Component> {
        self.entries.iter().map(|c| &**c)
    }

    pub fn into_boxed(self) -> Vec<Box<dyn Component>> {
        self.entries
    }

    pub fn awake(&mut self, ctx: &mut ComponentContext<'_>) {
        for component in &mut self.entries {
            component.awake(ctx);
        }
    }

    pub fn update(&mut self, ctx: &mut ComponentContext<'_>, dt: f32) {
        for component in &mut self.entries {
            component.update(ctx, dt);
        }
    }

    pub fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        for component in &mut self.entries {
            ui.section(component.kind().name());
            component.render_debug_ui(ui);
        }
    }

    pub fn on_trigger_entered(&mut self, ctx: &mut ComponentContext<'_>, other: EntityHandle) {
        for component in &mut self.entries {
            component.on_trigger_entered(ctx, other);
        }
    }

    pub fn to_documents(&self) -> Result<Vec<ComponentDocument>, ComponentError> {
        self.entries
            .iter()
            .map(|c| ComponentDocument::capture(&**c))
            .collect()
    }
}
