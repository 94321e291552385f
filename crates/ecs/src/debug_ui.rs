use glam::Vec3;
use std::collections::HashMap;
use std::fmt;

/// A value shown in a debug panel.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugValue {
    Float(f32),
    Int(i64),
    Text(String),
    Vec3(Vec3),
}

impl fmt::Display for DebugValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.2}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Vec3(v) => write!(f, "({:.2}, {:.2}, {:.2})", v.x, v.y, v.z),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugField {
    pub section: Option<String>,
    pub label: String,
    pub value: DebugValue,
}

/// Headless immediate-mode debug UI.
///
/// Components describe their editable state by calling widget functions.
/// Each call records a field; edits queued with [`DebugUi::with_edit`] are
/// applied to the matching float widget on the next draw.
#[derive(Debug, Default)]
pub struct DebugUi {
    section: Option<String>,
    fields: Vec<DebugField>,
    edits: HashMap<String, f32>,
}

impl DebugUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an edit for the float widget labelled `label`.
    pub fn with_edit(mut self, label: impl Into<String>, value: f32) -> Self {
        self.edits.insert(label.into(), value);
        self
    }

    pub fn section(&mut self, name: &str) {
        self.section = Some(name.to_owned());
    }

    /// Editable float. Returns true when a queued edit was applied.
    pub fn drag_float(&mut self, label: &str, value: &mut f32) -> bool {
        let edited = match self.edits.remove(label) {
            Some(new) => {
                *value = new;
                true
            }
            None => false,
        };
        self.push(label, DebugValue::Float(*value));
        edited
    }

    pub fn int(&mut self, label: &str, value: i64) {
        self.push(label, DebugValue::Int(value));
    }

    pub fn text(&mut self, label: &str, value: impl Into<String>) {
        self.push(label, DebugValue::Text(value.into()));
    }

    pub fn vec3(&mut self, label: &str, value: Vec3) {
        self.push(label, DebugValue::Vec3(value));
    }

    pub fn fields(&self) -> &[DebugField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, label: &str) -> Option<&DebugValue> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| &f.value)
    }

    fn push(&mut self, label: &str, value: DebugValue) {
        self.fields.push(DebugField {
            section: self.section.clone(),
            label: label.to_owned(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_fields_under_current_section() {
        let mut ui = DebugUi::new();
        ui.section("Target");
        let mut health = 10.0;
        assert!(!ui.drag_float("Health", &mut health));
        ui.text("Kind", "Fast Enemy");

        assert_eq!(ui.fields().len(), 2);
        assert_eq!(ui.fields()[0].section.as_deref(), Some("Target"));
        assert_eq!(ui.field("Health"), Some(&DebugValue::Float(10.0)));
    }

    #[test]
    fn queued_edit_is_applied_once() {
        let mut ui = DebugUi::new().with_edit("Speed", 3.0);
        let mut speed = 1.0;
        assert!(ui.drag_float("Speed", &mut speed));
        assert_eq!(speed, 3.0);
        assert!(!ui.drag_float("Speed", &mut speed));
    }

    #[test]
    fn display_formats_values() {
        assert_eq!(DebugValue::Float(1.234).to_string(), "1.23");
        assert_eq!(
            DebugValue::Vec3(Vec3::new(1.0, 2.0, 3.0)).to_string(),
            "(1.00, 2.00, 3.00)"
        );
    }
}
