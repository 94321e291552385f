use serde::{Deserialize, Serialize};

/// An edge-triggered request from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Leave the title screen and start the game.
    Start,
    /// Toggle between playing and paused.
    TogglePause,
    /// Debug cheat: only honored while paused.
    Cheat,
}

/// Keys the desktop layer binds to signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    F2,
}

impl Signal {
    /// Default desktop binding.
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::Enter => Self::Start,
            Key::Escape => Self::TogglePause,
            Key::F2 => Self::Cheat,
        }
    }
}

/// Everything the scene reads from input for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub delta_time: f32,
    signals: Vec<Signal>,
}

impl FrameInput {
    pub fn new(delta_time: f32) -> Self {
        Self {
            delta_time,
            signals: Vec::new(),
        }
    }

    /// Add a signal. Repeats within one frame collapse into one edge.
    pub fn with(mut self, signal: Signal) -> Self {
        self.push(signal);
        self
    }

    pub fn push(&mut self, signal: Signal) {
        if self.signals.contains(&signal) {
            tracing::trace!(?signal, "duplicate signal in frame ignored");
            return;
        }
        self.signals.push(signal);
    }

    /// Record key presses through the default binding.
    pub fn press(&mut self, key: Key) {
        self.push(Signal::from_key(key));
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn has(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_bindings() {
        assert_eq!(Signal::from_key(Key::Enter), Signal::Start);
        assert_eq!(Signal::from_key(Key::Escape), Signal::TogglePause);
        assert_eq!(Signal::from_key(Key::F2), Signal::Cheat);
    }

    #[test]
    fn signals_are_edges_not_counts() {
        let input = FrameInput::new(0.016)
            .with(Signal::TogglePause)
            .with(Signal::TogglePause);
        assert_eq!(input.signals(), &[Signal::TogglePause]);
    }

    #[test]
    fn press_maps_through_binding() {
        let mut input = FrameInput::new(0.0);
        input.press(Key::F2);
        assert!(input.has(Signal::Cheat));
        assert!(!input.has(Signal::Start));
    }
}
