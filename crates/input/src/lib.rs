//! Discrete gameplay signals and the per-frame input bundle.
//!
//! # Invariants
//! - The scene consumes signals, never raw device state.
//! - Signals are edge-triggered: each appears at most once per frame.

pub mod signal;

pub use signal::{FrameInput, Key, Signal};

pub fn crate_info() -> &'static str {
    "cellops-input v0.1.0"
}
