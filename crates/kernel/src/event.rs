use cellops_common::Guid;
use cellops_ecs::components::WaveComposition;
use serde::{Deserialize, Serialize};

use crate::state::PlayState;

/// Append-only record of what the scene did, for tooling and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    EntityCreated { guid: Guid, name: String },
    EntityDestroyed { guid: Guid, name: String },
    PlayStateChanged { from: PlayState, to: PlayState },
    GameStarted { targets: usize },
    RoundAdvanced { round: u32 },
    TargetsHealed { count: usize },
    WaveRequested { round: u32, wave: WaveComposition },
    EnemyKilled { guid: Guid, kills: u32 },
    TargetDestroyed { guid: Guid },
    CheatActivated { kills: u32 },
    LightsRebuilt { count: usize },
}
