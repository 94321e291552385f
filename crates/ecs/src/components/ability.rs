use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{encode, Component, ComponentError};
use crate::context::ComponentContext;
use crate::debug_ui::DebugUi;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    #[default]
    #[serde(rename = "Johnson & Johnson")]
    JohnsonAndJohnson,
    Moderna,
    #[serde(rename = "Pfizer-BioNTech")]
    PfizerBioNTech,
}

/// The player's chosen ability and its cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityBehaviour {
    pub ability: Ability,
    /// Seconds between activations.
    pub cooldown: f32,
    /// Seconds until the next activation is allowed.
    pub cooldown_remaining: f32,
}

impl AbilityBehaviour {
    pub fn new(ability: Ability, cooldown: f32) -> Self {
        Self {
            ability,
            cooldown,
            cooldown_remaining: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining <= 0.0
    }

    /// Fire the ability if it is off cooldown.
    pub fn try_activate(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.cooldown_remaining = self.cooldown;
        true
    }
}

impl Component for AbilityBehaviour {
    crate::component_kind!(AbilityBehaviour);

    fn update(&mut self, _ctx: &mut ComponentContext<'_>, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.drag_float("Cool down on Ability", &mut self.cooldown_remaining);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.cooldown < 0.0 || self.cooldown_remaining < 0.0 {
            return Err("cooldowns must not be negative".to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::EntityArena;
    use crate::rng::SceneRng;
    use cellops_common::{Guid, Transform};

    #[test]
    fn cooldown_blocks_until_elapsed() {
        let mut arena = EntityArena::new();
        let me = arena.insert("Player", Guid::new(), Transform::default());
        let mut ability = AbilityBehaviour::new(Ability::Moderna, 2.0);
        let mut transform = Transform::default();
        let mut rng = SceneRng::with_seed(0);
        let mut commands = Vec::new();
        let mut ctx = ComponentContext::new(me, &mut transform, &arena, &[], &mut rng, &mut commands);

        assert!(ability.try_activate());
        assert!(!ability.try_activate());
        ability.update(&mut ctx, 1.5);
        assert!(!ability.is_ready());
        ability.update(&mut ctx, 1.0);
        assert_eq!(ability.cooldown_remaining, 0.0);
        assert!(ability.try_activate());
    }

    #[test]
    fn ability_names_match_saved_documents() {
        let ability = AbilityBehaviour::new(Ability::PfizerBioNTech, 1.0);
        assert_eq!(ability.to_document().unwrap()["ability"], "Pfizer-BioNTech");
    }
}
