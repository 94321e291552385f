use cellops_common::AssetId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{encode, Component, ComponentError};
use crate::debug_ui::DebugUi;

/// Mesh and material references for the rendering collaborator. Either may
/// be absent; the scene falls back to its default material when drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderComponent {
    pub mesh: Option<AssetId>,
    pub material: Option<AssetId>,
}

impl RenderComponent {
    pub fn new(mesh: AssetId, material: Option<AssetId>) -> Self {
        Self {
            mesh: Some(mesh),
            material,
        }
    }
}

impl Component for RenderComponent {
    crate::component_kind!(Render);

    fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        let show = |id: Option<AssetId>| id.map_or_else(|| "none".to_owned(), |id| id.0.to_string());
        ui.text("Mesh", show(self.mesh));
        ui.text("Material", show(self.material));
    }

    fn to_document(&self) -> Result<Value, ComponentError> {
        encode(self)
    }

    fn validate(&self) -> Result<(), String> {
        for (field, id) in [("mesh", self.mesh), ("material", self.material)] {
            if id.is_some_and(|id| id.is_nil()) {
                return Err(format!("{field} is the nil asset id"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDocument, ComponentKind};
    use serde_json::json;

    #[test]
    fn document_roundtrip() {
        let render = RenderComponent::new(AssetId::new(), Some(AssetId::new()));
        let doc = ComponentDocument::capture(&render).unwrap();
        assert_eq!(doc.kind, ComponentKind::Render);

        let restored = doc.instantiate().unwrap();
        let restored = restored.as_any().downcast_ref::<RenderComponent>().unwrap();
        assert_eq!(*restored, render);
    }

    #[test]
    fn absent_fields_are_none() {
        let restored = ComponentKind::Render.decode(json!({})).unwrap();
        let restored = restored.as_any().downcast_ref::<RenderComponent>().unwrap();
        assert_eq!(*restored, RenderComponent::default());
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = ComponentKind::Render.decode(json!({ "mesh": 42 })).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Malformed {
                kind: ComponentKind::Render,
                ..
            }
        ));
    }

    #[test]
    fn nil_asset_is_invalid() {
        let nil = "00000000-0000-0000-0000-000000000000";
        let err = ComponentKind::Render
            .decode(json!({ "mesh": AssetId::new(), "material": nil }))
            .unwrap_err();
        match err {
            ComponentError::Invalid { kind, reason } => {
                assert_eq!(kind, ComponentKind::Render);
                assert!(reason.contains("material"));
            }
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn debug_ui_shows_missing_assets() {
        let mesh = AssetId::new();
        let mut render = RenderComponent::new(mesh, None);
        let mut ui = DebugUi::new();
        render.render_debug_ui(&mut ui);
        let values: Vec<String> = ui.fields().iter().map(|f| f.value.to_string()).collect();
        assert_eq!(values, [mesh.to_string(), "none".to_owned()]);
    }
}
