//! Scene kernel: entity ownership, deferred deletion, lighting, play state
//! and round progression.
//!
//! # Invariants
//! - All structural changes made during a component pass are deferred to
//!   the scene's flush points.
//! - The lighting mirror always matches the light list after a mutation.
//! - Round progression is table-driven; see [`RoundTable`].

pub mod config;
pub mod event;
pub mod lighting;
pub mod scene;
pub mod state;

pub use config::{
    ConfigError, GameConfig, LightingSettings, PhysicsSettings, RoundMatch, RoundTable,
    RoundThreshold, WaveRule,
};
pub use event::SceneEvent;
pub use lighting::{GpuLight, LightError, LightList, LightingBuffer, MAX_LIGHTS};
pub use scene::{RenderItem, Scene, Skybox};
pub use state::{Outcome, PlayState};

pub fn crate_info() -> &'static str {
    "cellops-kernel v0.1.0"
}
