use cellops_ecs::components::Camera;
use cellops_kernel::{LightingBuffer, RenderItem, Scene, Skybox};
use glam::{Mat4, Vec3};
use std::fmt::Write as _;

/// Camera matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub eye: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for RenderView {
    fn default() -> Self {
        let eye = Vec3::new(0.0, -10.0, 10.0);
        Self {
            eye,
            view: Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Z),
            projection: Camera::default().projection(),
        }
    }
}

impl RenderView {
    /// View of the scene's main camera, or the default view without one.
    pub fn from_scene(scene: &Scene) -> Self {
        let Some(camera) = scene.main_camera() else {
            return Self::default();
        };
        let lens = scene
            .entity(camera)
            .and_then(|e| e.get_component::<Camera>());
        match (lens, scene.arena().world_transform(camera)) {
            (Some(lens), Some(world)) => Self {
                eye: world.position,
                view: Camera::view(&world),
                projection: lens.projection(),
            },
            _ => {
                tracing::debug!("main camera has no lens; using the default view");
                Self::default()
            }
        }
    }
}

/// Everything a renderer needs for one frame, copied out of the scene.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub view: RenderView,
    pub items: Vec<RenderItem>,
    pub lighting: LightingBuffer,
    pub skybox: Skybox,
}

impl RenderFrame {
    pub fn capture(scene: &Scene) -> Self {
        Self {
            view: RenderView::from_scene(scene),
            items: scene.renderables(),
            lighting: *scene.lighting_buffer(),
            skybox: *scene.skybox(),
        }
    }
}

/// Renderer-agnostic interface.
///
/// A renderer only sees a [`RenderFrame`]; it never touches the scene.
pub trait Renderer {
    type Output;

    fn render(&self, frame: &RenderFrame) -> Self::Output;
}

/// Text renderer for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &RenderFrame) -> String {
        let mut out = String::new();
        let e = frame.view.eye;
        let _ = writeln!(out, "=== Frame: {} draws, {} lights ===", frame.items.len(), frame.lighting.num_lights);
        let _ = writeln!(out, "Camera: eye=({:.1}, {:.1}, {:.1})", e.x, e.y, e.z);
        let a = frame.lighting.ambient;
        let _ = writeln!(out, "Ambient: ({:.2}, {:.2}, {:.2})", a[0], a[1], a[2]);

        for light in frame.lighting.active() {
            let p = light.position;
            let _ = writeln!(
                out,
                "  light pos=({:.2}, {:.2}, {:.2}) atten={:.4}",
                p[0], p[1], p[2], light.attenuation
            );
        }
        for item in &frame.items {
            let p = item.world.w_axis;
            let _ = writeln!(
                out,
                "  draw mesh={} material={} pos=({:.2}, {:.2}, {:.2})",
                item.mesh, item.material, p.x, p.y, p.z
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellops_common::{AssetId, Guid, Light, Transform};
    use cellops_ecs::components::RenderComponent;
    use cellops_kernel::GameConfig;

    #[test]
    fn empty_scene_frame() {
        let scene = Scene::empty(GameConfig::default());
        let frame = RenderFrame::capture(&scene);
        assert_eq!(frame.view, RenderView::default());

        let output = DebugTextRenderer::new().render(&frame);
        assert!(output.contains("0 draws, 0 lights"));
    }

    #[test]
    fn frame_lists_draws_and_lights() {
        let mut scene = Scene::new(GameConfig::default());
        scene.set_default_material(Some(AssetId::new()));
        let cube = scene.create_entity_with(
            "Cube",
            Guid::new(),
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
        );
        scene
            .entity_mut(cube)
            .unwrap()
            .add_component(RenderComponent::new(AssetId::new(), None))
            .unwrap();
        scene
            .lights_mut()
            .add(Light {
                position: Vec3::ZERO,
                color: Vec3::ONE,
                range: 100.0,
            })
            .unwrap();

        let frame = RenderFrame::capture(&scene);
        assert_eq!(frame.items.len(), 1);
        assert_eq!(frame.lighting.num_lights, 1);

        let output = DebugTextRenderer::new().render(&frame);
        assert!(output.contains("1 draws, 1 lights"));
        assert!(output.contains("pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn light_count_past_capacity_is_clamped() {
        let scene = Scene::empty(GameConfig::default());
        let mut frame = RenderFrame::capture(&scene);
        frame.lighting.num_lights = 99;

        let output = DebugTextRenderer::new().render(&frame);
        assert_eq!(output.matches("  light pos=").count(), cellops_kernel::MAX_LIGHTS);
    }

    #[test]
    fn view_follows_main_camera() {
        let mut scene = Scene::new(GameConfig::default());
        let camera = scene.main_camera().unwrap();
        scene
            .entity_mut(camera)
            .unwrap()
            .set_position(Vec3::new(0.0, 0.0, 20.0));

        let view = RenderView::from_scene(&scene);
        assert_eq!(view.eye, Vec3::new(0.0, 0.0, 20.0));
        let origin_in_view = view.view.transform_point3(Vec3::ZERO);
        assert!(origin_in_view.abs_diff_eq(Vec3::new(0.0, 0.0, -20.0), 1e-4));
    }
}
