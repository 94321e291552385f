//! Developer tooling: scene inspector and debug-panel dumps.
//!
//! # Invariants
//! - Inspection never mutates scene state, except drawing debug panels,
//!   which applies no edits unless some were queued.

mod inspector;

pub use inspector::{EntityInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "cellops-tools v0.1.0"
}
