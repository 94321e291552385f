//! Persistence: scene documents, play-mode snapshots, file-backed scene
//! store.
//!
//! # Invariants
//! - A failed load never yields a partially built scene.
//! - Stored scenes are verified by schema version and SHA-256 before use.
//! - Leaving play mode restores exactly what was captured on entry.

pub mod document;
pub mod snapshot;
pub mod store;

pub use document::{EntityDocument, SceneDocument, SceneLoadError};
pub use snapshot::{PlaySession, PlaySnapshot, SnapshotError};
pub use store::{SceneMeta, SceneStore, StoreError};

pub fn crate_info() -> &'static str {
    "cellops-persist v0.1.0"
}
