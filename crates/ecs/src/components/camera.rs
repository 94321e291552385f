use cellops_common::Transform;
use glam::Mat4;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{encode, Component, ComponentError};
use crate::debug_ui::DebugUi;

fn default_ortho_scale() -> f32 {
    10.0
}

fn default_aspect() -> f32 {
    16.0 / 9.0
}

/// Projection parameters. The view comes from the owning entity's world
/// transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    #[serde(default)]
    pub orthographic: bool,
    #[serde(default = "default_ortho_scale")]
    pub ortho_scale: f32,
    #[serde(skip, default = "default_aspect")]
    aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            orthographic: false,
            ortho_scale: default_ortho_scale(),
            aspect: default_aspect(),
        }
    }
}

impl Camera {
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Track the window size. Zero-height windows (minimized) are ignored.
    pub fn resize_window(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn projection(&self) -> Mat4 {
        if self.orthographic {
            let half_h = self.ortho_scale * 0.5;
            let half_w = half_h * self.aspect;
            Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
        } else {
            Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
        }
    }

    pub fn view(world: &Transform) -> Mat4 {
        world.to_matrix().inverse()
    }
}

impl Component for Camera {
    crate::component_kind!(Camera);

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        ui.drag_float("FOV", &mut self.fov_degrees);
        ui.drag_float("Near", &mut self.near);
        ui.drag_float("Far", &mut self.far);
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        if self.near <= 0.0 || self.far <= self.near {
            return Err(format!(
                "clip planes must satisfy 0 < near < far (near {}, far {})",
                self.near, self.far
            ));
        }
        if !self.orthographic && !(0.0..180.0).contains(&self.fov_degrees) {
            return Err(format!("fov {} out of range", self.fov_degrees));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;

    #[test]
    fn resize_updates_aspect_and_ignores_zero_height() {
        let mut camera = Camera::default();
        camera.resize_window(800, 400);
        assert_eq!(camera.aspect(), 2.0);
        camera.resize_window(800, 0);
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn inverted_clip_planes_are_invalid() {
        let data = serde_json::json!({ "fov_degrees": 60.0, "near": 10.0, "far": 1.0 });
        assert!(matches!(
            ComponentKind::Camera.decode(data),
            Err(ComponentError::Invalid { .. })
        ));
    }

    #[test]
    fn aspect_is_not_persisted() {
        let mut camera = Camera::default();
        camera.resize_window(100, 100);
        let doc = camera.to_document().unwrap();
        assert!(doc.get("aspect").is_none());
    }
}
