//! # Form Document
//!
//! The value being edited: a form with a title, an optional description and
//! an ordered list of elements.
//!
//! Documents have value semantics. Every edit produces a new `FormDocument`
//! rather than mutating the previous one, so older snapshots stay valid for
//! undo and for change detection while a save is in flight.
//!
//! ## Lifecycle
//!
//! ```text
//! Open → Edit → Edit → ... → Close
//!   ↓      ↓      ↓
//! snapshot snapshot snapshot   (each one handed to history + auto-save)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of a form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FormId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of an element within a form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of form field or static block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Text,
    Textarea,
    Email,
    Number,
    Select,
    Checkbox,
    Radio,
    Date,
    File,
    Heading,
    Paragraph,
    Divider,
}

impl ElementKind {
    /// Static blocks render content but collect no answer
    pub fn is_input(&self) -> bool {
        !matches!(
            self,
            ElementKind::Heading | ElementKind::Paragraph | ElementKind::Divider
        )
    }
}

/// Validation attached to an input element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    Required,
    MinLength { value: usize },
    MaxLength { value: usize },
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Min { value: f64 },
    Max { value: f64 },
    Email,
}

/// One element of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormElement {
    pub id: ElementId,

    pub kind: ElementKind,

    pub label: String,

    /// Kind-specific properties (placeholder, options, rows, ...)
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub validation: Vec<ValidationRule>,

    /// Style overrides keyed by property name
    #[serde(default)]
    pub styling: BTreeMap<String, String>,

    /// Position within the form
    #[serde(default)]
    pub order: u32,
}

impl FormElement {
    pub fn new(id: impl Into<ElementId>, kind: ElementKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            properties: BTreeMap::new(),
            validation: Vec::new(),
            styling: BTreeMap::new(),
            order: 0,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styling.insert(property.into(), value.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.validation
            .iter()
            .any(|rule| matches!(rule, ValidationRule::Required))
    }
}

/// Editor-only state that travels with the document but is never persisted
/// and never counts as a change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorUiState {
    pub selected_element: Option<ElementId>,
    pub zoom: Option<f32>,
    pub collapsed_panels: Vec<String>,
}

/// Editable form document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    pub id: FormId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Elements in display order
    #[serde(default)]
    pub elements: Vec<FormElement>,

    /// Last local modification time (volatile)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub ui: EditorUiState,
}

impl FormDocument {
    /// Create an empty form
    pub fn new(id: impl Into<FormId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            elements: Vec::new(),
            updated_at: None,
            ui: EditorUiState::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append an element, assigning it the next order slot
    pub fn with_element(mut self, mut element: FormElement) -> Self {
        element.order = self.elements.len() as u32;
        self.elements.push(element);
        self
    }

    pub fn element(&self, id: &ElementId) -> Option<&FormElement> {
        self.elements.iter().find(|element| &element.id == id)
    }

    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut FormElement> {
        self.elements.iter_mut().find(|element| &element.id == id)
    }

    pub fn position_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|element| &element.id == id)
    }

    /// Rewrite `order` so it matches each element's position
    pub fn renumber(&mut self) {
        for (index, element) in self.elements.iter_mut().enumerate() {
            element.order = index as u32;
        }
    }

    /// Stamp the modification time
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact_form() -> FormDocument {
        FormDocument::new("contact", "Contact us")
            .with_element(
                FormElement::new("name", ElementKind::Text, "Name").with_rule(ValidationRule::Required),
            )
            .with_element(FormElement::new("email", ElementKind::Email, "Email"))
            .with_element(FormElement::new("intro", ElementKind::Paragraph, "Say hello"))
    }

    #[test]
    fn test_with_element_assigns_order() {
        let doc = contact_form();
        let orders: Vec<u32> = doc.elements.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_element_lookup() {
        let doc = contact_form();
        assert_eq!(doc.position_of(&ElementId::from("email")), Some(1));
        assert!(doc.element(&ElementId::from("name")).unwrap().is_required());
        assert!(doc.element(&ElementId::from("missing")).is_none());
        assert!(!doc.element(&ElementId::from("intro")).unwrap().kind.is_input());
    }

    #[test]
    fn test_ui_state_not_serialized() {
        let mut doc = contact_form();
        doc.ui.selected_element = Some(ElementId::from("name"));
        doc.ui.zoom = Some(1.5);

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("ui").is_none());

        let restored: FormDocument = serde_json::from_value(json).unwrap();
        assert_eq!(restored.ui, EditorUiState::default());
        assert_eq!(restored.elements, doc.elements);
    }

    #[test]
    fn test_validation_rule_wire_format() {
        let element = FormElement::new("age", ElementKind::Number, "Age")
            .with_rule(ValidationRule::Min { value: 18.0 })
            .with_property("step", json!(1));

        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["kind"], "number");
        assert_eq!(json["validation"][0]["rule"], "min");
        assert_eq!(json["validation"][0]["value"], 18.0);
        assert_eq!(json["properties"]["step"], 1);
    }
}
