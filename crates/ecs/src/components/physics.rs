use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{encode, Component, ComponentError};
use crate::debug_ui::DebugUi;

/// Collision shape, positioned relative to the owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Collider {
    Sphere {
        radius: f32,
        #[serde(default)]
        offset: Vec3,
    },
    Box {
        half_extents: Vec3,
        #[serde(default)]
        offset: Vec3,
    },
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere {
            radius,
            offset: Vec3::ZERO,
        }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box {
            half_extents,
            offset: Vec3::ZERO,
        }
    }

    pub fn offset(&self) -> Vec3 {
        match *self {
            Self::Sphere { offset, .. } | Self::Box { offset, .. } => offset,
        }
    }

    /// Radius of a sphere around `offset` that encloses the shape.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Sphere { radius, .. } => radius,
            Self::Box { half_extents, .. } => half_extents.length(),
        }
    }

    fn check(&self) -> Result<(), String> {
        match *self {
            Self::Sphere { radius, .. } if radius <= 0.0 => {
                Err(format!("sphere radius must be positive, got {radius}"))
            }
            Self::Box { half_extents, .. } if half_extents.min_element() <= 0.0 => {
                Err(format!("box half extents must be positive, got {half_extents}"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Static,
    /// Moved by gameplay code; the physics step does not integrate it.
    Kinematic,
    #[default]
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub mass: f32,
    pub colliders: Vec<Collider>,
}

impl RigidBody {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            mass: 1.0,
            colliders: Vec::new(),
        }
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }
}

impl Component for RigidBody {
    crate::component_kind!(RigidBody);

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.text("Type", format!("{:?}", self.body_type));
        ui.drag_float("Mass", &mut self.mass);
        ui.int("Colliders", self.colliders.len() as i64);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.body_type == BodyType::Dynamic && self.mass <= 0.0 {
            return Err(format!("dynamic body needs positive mass, got {}", self.mass));
        }
        self.colliders.iter().try_for_each(Collider::check)
    }
}

/// Non-solid region that reports bodies entering it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerVolume {
    pub colliders: Vec<Collider>,
}

impl TriggerVolume {
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }
}

impl Component for TriggerVolume {
    crate::component_kind!(TriggerVolume);

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.int("Colliders", self.colliders.len() as i64);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        self.colliders.iter().try_for_each(Collider::check)
    }
}
