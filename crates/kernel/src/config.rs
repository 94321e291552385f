//! Gameplay balancing data, loaded from YAML.
//!
//! Every field defaults to the shipped game's values, so a config file only
//! needs the keys it changes.

use cellops_ecs::components::WaveComposition;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which rounds a wave rule applies to. Rounds are checked after the round
/// counter has been incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "round", rename_all = "snake_case")]
pub enum RoundMatch {
    Any,
    Exactly(u32),
    AtLeast(u32),
}

impl RoundMatch {
    pub fn matches(self, round: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(n) => round == n,
            Self::AtLeast(n) => round >= n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRule {
    pub when: RoundMatch,
    pub wave: WaveComposition,
}

/// Reached when the wave is cleared with exactly `kills` kills. The first
/// matching rule picks the next wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundThreshold {
    pub kills: u32,
    pub rules: Vec<WaveRule>,
}

impl RoundThreshold {
    pub fn wave_for(&self, round: u32) -> Option<WaveComposition> {
        self.rules
            .iter()
            .find(|r| r.when.matches(round))
            .map(|r| r.wave)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTable {
    pub initial_wave: WaveComposition,
    pub thresholds: Vec<RoundThreshold>,
}

impl RoundTable {
    pub fn threshold(&self, kills: u32) -> Option<&RoundThreshold> {
        self.thresholds.iter().find(|t| t.kills == kills)
    }
}

impl Default for RoundTable {
    fn default() -> Self {
        let rule = |when, slow, normal, fast| WaveRule {
            when,
            wave: WaveComposition::new(slow, normal, fast),
        };
        Self {
            initial_wave: WaveComposition::new(0, 0, 8),
            thresholds: vec![
                RoundThreshold {
                    kills: 8,
                    rules: vec![
                        rule(RoundMatch::Exactly(5), 0, 6, 6),
                        rule(RoundMatch::AtLeast(3), 0, 4, 4),
                        rule(RoundMatch::Any, 0, 0, 8),
                    ],
                },
                RoundThreshold {
                    kills: 12,
                    rules: vec![
                        rule(RoundMatch::AtLeast(7), 0, 8, 8),
                        rule(RoundMatch::Any, 0, 6, 6),
                    ],
                },
                RoundThreshold {
                    kills: 16,
                    rules: vec![rule(RoundMatch::Any, 4, 6, 10)],
                },
                RoundThreshold {
                    kills: 20,
                    rules: vec![
                        rule(RoundMatch::Exactly(10), 6, 8, 12),
                        rule(RoundMatch::Any, 6, 4, 10),
                    ],
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    pub max_sub_steps: u32,
    pub fixed_time_step: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            max_sub_steps: 15,
            fixed_time_step: 1.0 / 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub ambient: Vec3,
    pub target_light_color: Vec3,
    pub target_light_range: f32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.1),
            target_light_color: Vec3::ONE,
            target_light_range: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rounds: RoundTable,
    /// Clearing a wave at exactly this many kills wins; exceeding it at any
    /// time wins.
    pub win_kills: u32,
    /// Kill count the debug cheat jumps to.
    pub cheat_kills: u32,
    /// Entity removed when the game is lost.
    pub player_name: String,
    pub physics: PhysicsSettings,
    pub lighting: LightingSettings,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds: RoundTable::default(),
            win_kills: 26,
            cheat_kills: 100,
            player_name: "Player".to_owned(),
            physics: PhysicsSettings::default(),
            lighting: LightingSettings::default(),
            seed: 0x5eed,
        }
    }
}

impl GameConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded game config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.physics.max_sub_steps == 0 {
            return Err(ConfigError::Invalid("max_sub_steps must be at least 1".into()));
        }
        if self.physics.fixed_time_step <= 0.0 {
            return Err(ConfigError::Invalid("fixed_time_step must be positive".into()));
        }
        let mut seen = Vec::new();
        for t in &self.rounds.thresholds {
            if t.kills == 0 {
                return Err(ConfigError::Invalid("round threshold of 0 kills".into()));
            }
            if seen.contains(&t.kills) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate round threshold at {} kills",
                    t.kills
                )));
            }
            if t.kills == self.win_kills {
                return Err(ConfigError::Invalid(format!(
                    "round threshold {} collides with win_kills",
                    t.kills
                )));
            }
            seen.push(t.kills);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rounds_reproduce_shipped_waves() {
        let table = RoundTable::default();
        let eight = table.threshold(8).unwrap();
        assert_eq!(eight.wave_for(2), Some(WaveComposition::new(0, 0, 8)));
        assert_eq!(eight.wave_for(3), Some(WaveComposition::new(0, 4, 4)));
        assert_eq!(eight.wave_for(5), Some(WaveComposition::new(0, 6, 6)));

        let twelve = table.threshold(12).unwrap();
        assert_eq!(twelve.wave_for(6), Some(WaveComposition::new(0, 6, 6)));
        assert_eq!(twelve.wave_for(7), Some(WaveComposition::new(0, 8, 8)));

        assert_eq!(
            table.threshold(16).unwrap().wave_for(8),
            Some(WaveComposition::new(4, 6, 10))
        );
        let twenty = table.threshold(20).unwrap();
        assert_eq!(twenty.wave_for(9), Some(WaveComposition::new(6, 4, 10)));
        assert_eq!(twenty.wave_for(10), Some(WaveComposition::new(6, 8, 12)));

        assert!(table.threshold(26).is_none());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = GameConfig::from_yaml_str("win_kills: 40\nseed: 7\n").unwrap();
        assert_eq!(config.win_kills, 40);
        assert_eq!(config.seed, 7);
        assert_eq!(config.cheat_kills, 100);
        assert_eq!(config.physics.max_sub_steps, 15);
        assert_eq!(config.rounds, RoundTable::default());
    }

    #[test]
    fn yaml_roundtrip() {
        let config = GameConfig::default();
        let text = config.to_yaml().unwrap();
        assert_eq!(GameConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn custom_round_table_from_yaml() {
        let text = r#"
rounds:
  initial_wave: { slow: 1, normal: 0, fast: 0 }
  thresholds:
    - kills: 1
      rules:
        - when: { match: at_least, round: 3 }
          wave: { slow: 0, normal: 2, fast: 0 }
        - when: { match: any }
          wave: { slow: 0, normal: 1, fast: 0 }
"#;
        let config = GameConfig::from_yaml_str(text).unwrap();
        let t = config.rounds.threshold(1).unwrap();
        assert_eq!(t.wave_for(2), Some(WaveComposition::new(0, 1, 0)));
        assert_eq!(t.wave_for(3), Some(WaveComposition::new(0, 2, 0)));
    }

    #[test]
    fn zero_sub_steps_rejected() {
        let err = GameConfig::from_yaml_str("physics:\n  max_sub_steps: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.yaml");
        std::fs::write(&path, "cheat_kills: 50\n").unwrap();
        assert_eq!(GameConfig::load(&path).unwrap().cheat_kills, 50);
        assert!(matches!(
            GameConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
