use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EnemyBehaviour;
use crate::component::{encode, Component, ComponentError};
use crate::context::ComponentContext;
use crate::debug_ui::DebugUi;
use crate::entity::EntityHandle;

/// Something the enemies go after. Loses health when an enemy body enters
/// its trigger volume and is destroyed once health drops below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBehaviour {
    pub max_health: f32,
    pub health: f32,
    /// Name of the UI element showing this target's health bar.
    #[serde(default)]
    pub health_ui_name: String,
    #[serde(skip)]
    health_percent: f32,
}

impl TargetBehaviour {
    pub fn new(max_health: f32) -> Self {
        Self {
            max_health,
            health: max_health,
            health_ui_name: String::new(),
            health_percent: 100.0,
        }
    }

    pub fn health_percent(&self) -> f32 {
        self.health_percent
    }

    pub fn heal(&mut self) {
        self.health = self.max_health;
        self.refresh_percent();
    }

    /// Subtract `amount`; returns true once the target is destroyed.
    pub fn damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.refresh_percent();
        self.is_destroyed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.health < 0.0
    }

    fn refresh_percent(&mut self) {
        self.health_percent = self.health * 100.0 / self.max_health;
    }
}

impl Component for TargetBehaviour {
    crate::component_kind!(TargetBehaviour);

    fn awake(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.health = self.health.min(self.max_health);
        self.refresh_percent();
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _dt: f32) {
        self.refresh_percent();
    }

    fn on_trigger_entered(&mut self, ctx: &mut ComponentContext<'_>, other: EntityHandle) {
        if self.is_destroyed() {
            return;
        }
        let Some(enemy) = ctx.component::<EnemyBehaviour>(other) else {
            return;
        };
        let amount = enemy.kind.contact_damage();
        tracing::debug!(target_name = %ctx.name(), enemy = %enemy.kind, amount, "target hit");
        if self.damage(amount) {
            ctx.destroy_target();
        }
    }

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.drag_float("Health", &mut self.health);
        ui.drag_float("MaxHealth", &mut self.max_health);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_health <= 0.0 {
            return Err(format!("max_health must be positive, got {}", self.max_health));
        }
        Ok(())
    }
}
