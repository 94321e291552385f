use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Play-state machine:
/// `Editing -> Playing <-> Paused`, and any state `-> Ended`, which is
/// terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    #[default]
    Editing,
    Playing,
    Paused,
    Ended(Outcome),
}

impl PlayState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    pub fn is_ended(self) -> bool {
        matches!(self, Self::Ended(_))
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editing => f.write_str("editing"),
            Self::Playing => f.write_str("playing"),
            Self::Paused => f.write_str("paused"),
            Self::Ended(Outcome::Won) => f.write_str("won"),
            Self::Ended(Outcome::Lost) => f.write_str("lost"),
        }
    }
}
