//! Rendering adapter: a renderer-agnostic view of one scene frame.
//!
//! # Invariants
//! - Renderers cannot mutate the scene.
//! - A frame is derived from the scene's renderables, lighting mirror and
//!   main camera.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderFrame, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "cellops-render v0.1.0"
}
