//! Shared value types: identifiers, transforms, lights.

pub mod types;

pub use types::{AssetId, Guid, Light, Transform};

pub fn crate_info() -> &'static str {
    "cellops-common v0.1.0"
}
