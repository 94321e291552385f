use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::component::{encode, Component, ComponentError};
use crate::context::ComponentContext;
use crate::debug_ui::DebugUi;
use crate::entity::EntityHandle;

/// Seconds-times-speed for one approach from the respawn point to the target.
pub const LERP_TIMER_MAX: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    #[serde(rename = "Fast Enemy")]
    Fast,
    #[serde(rename = "Normal Enemy")]
    Normal,
    #[serde(rename = "Large Enemy")]
    Large,
}

impl EnemyKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast Enemy",
            Self::Normal => "Normal Enemy",
            Self::Large => "Large Enemy",
        }
    }

    /// Health a target loses when this kind reaches it.
    pub fn contact_damage(self) -> f32 {
        match self {
            Self::Fast => 1.0,
            Self::Normal => 2.0,
            Self::Large => 4.0,
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Moves from where it spawned toward a target, restarting the approach
/// every [`LERP_TIMER_MAX`] units of scaled time.
///
/// The respawn point and approach progress are saved with the enemy, so a
/// reloaded enemy resumes the same path. Only the target is re-picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyBehaviour {
    pub kind: EnemyKind,
    pub health: f32,
    pub speed: f32,
    #[serde(skip)]
    target: Option<EntityHandle>,
    #[serde(default)]
    respawn_position: Option<Vec3>,
    #[serde(default)]
    lerp_timer: f32,
}

impl EnemyBehaviour {
    pub fn new(kind: EnemyKind, health: f32, speed: f32) -> Self {
        Self {
            kind,
            health,
            speed,
            target: None,
            respawn_position: None,
            lerp_timer: 0.0,
        }
    }

    pub fn target(&self) -> Option<EntityHandle> {
        self.target
    }

    /// Where the approach restarts from; set on the first awake.
    pub fn respawn_position(&self) -> Option<Vec3> {
        self.respawn_position
    }

    pub fn lerp_timer(&self) -> f32 {
        self.lerp_timer
    }

    /// Subtract `amount`; returns true when this hit kills the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.health <= 0.0 {
            return false;
        }
        self.health -= amount;
        tracing::debug!(kind = %self.kind, health = self.health, "enemy took damage");
        self.health <= 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    fn retarget(&mut self, ctx: &mut ComponentContext<'_>) {
        self.target = ctx.find_random_target();
    }
}

impl Component for EnemyBehaviour {
    crate::component_kind!(EnemyBehaviour);

    fn awake(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.respawn_position.is_none() {
            self.respawn_position = Some(ctx.position());
        }
        self.retarget(ctx);
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, dt: f32) {
        // Health edited to zero outside of a hit; the scene counts the kill
        // when it applies the command.
        if self.is_dead() {
            ctx.report_enemy_killed();
            return;
        }
        if !self.target.is_some_and(|t| ctx.is_alive(t)) {
            self.retarget(ctx);
        }
        let Some(goal) = self.target.and_then(|t| ctx.entity_world_position(t)) else {
            return;
        };

        self.lerp_timer += dt * self.speed;
        if self.lerp_timer >= LERP_TIMER_MAX {
            self.lerp_timer = 0.0;
        }
        let t = self.lerp_timer / LERP_TIMER_MAX;
        let start = *self.respawn_position.get_or_insert(ctx.position());
        ctx.set_position(start.lerp(goal, t));
        ctx.transform_mut().look_at(goal, Vec3::Z);
    }

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.drag_float("Speed", &mut self.speed);
        ui.drag_float("Health", &mut self.health);
        ui.text("Enemy Type", self.kind.label());
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.speed < 0.0 {
            return Err(format!("speed must not be negative, got {}", self.speed));
        }
        Ok(())
    }
}
