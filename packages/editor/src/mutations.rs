//! # Form Mutations
//!
//! High-level semantic edits on form documents, emitted by the canvas and
//! property panels.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: Each mutation represents one editor action
//! 2. **Validated**: A mutation that does not fit the document is rejected
//!    before anything changes
//! 3. **Value semantics**: `apply` returns a new document and leaves the
//!    input untouched, so the previous snapshot stays usable for undo
//!
//! ## Ordering
//!
//! Structural edits (add, remove, move) renumber every element's `order`
//! slot to match its position.

use crate::document::{ElementId, FormDocument, FormElement, ValidationRule};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Rename the form
    SetTitle { title: String },

    /// Replace or clear the form description
    SetDescription { description: Option<String> },

    /// Insert a new element at index
    AddElement { element: FormElement, index: usize },

    /// Remove an element
    RemoveElement { element_id: ElementId },

    /// Move an element to a new index
    MoveElement { element_id: ElementId, index: usize },

    /// Change an element's label
    SetLabel { element_id: ElementId, label: String },

    /// Set a kind-specific property
    SetProperty {
        element_id: ElementId,
        key: String,
        value: serde_json::Value,
    },

    /// Remove a kind-specific property
    RemoveProperty { element_id: ElementId, key: String },

    /// Set a style override
    SetStyle {
        element_id: ElementId,
        property: String,
        value: String,
    },

    /// Replace an element's validation rules
    SetValidation {
        element_id: ElementId,
        rules: Vec<ValidationRule>,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Element already exists: {0}")]
    DuplicateElement(ElementId),

    #[error("Index {index} out of bounds for {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl Mutation {
    /// Apply the mutation to a copy of the document
    pub fn apply(&self, doc: &FormDocument) -> Result<FormDocument, MutationError> {
        self.validate(doc)?;

        let mut next = doc.clone();
        match self {
            Mutation::SetTitle { title } => {
                next.title = title.clone();
            }

            Mutation::SetDescription { description } => {
                next.description = description.clone();
            }

            Mutation::AddElement { element, index } => {
                next.elements.insert(*index, element.clone());
                next.renumber();
            }

            Mutation::RemoveElement { element_id } => {
                next.elements.retain(|element| &element.id != element_id);
                next.renumber();
                if next.ui.selected_element.as_ref() == Some(element_id) {
                    next.ui.selected_element = None;
                }
            }

            Mutation::MoveElement { element_id, index } => {
                let from = Self::position(&next, element_id)?;
                let element = next.elements.remove(from);
                next.elements.insert(*index, element);
                next.renumber();
            }

            Mutation::SetLabel { element_id, label } => {
                Self::element_mut(&mut next, element_id)?.label = label.clone();
            }

            Mutation::SetProperty { element_id, key, value } => {
                Self::element_mut(&mut next, element_id)?
                    .properties
                    .insert(key.clone(), value.clone());
            }

            Mutation::RemoveProperty { element_id, key } => {
                Self::element_mut(&mut next, element_id)?.properties.remove(key);
            }

            Mutation::SetStyle { element_id, property, value } => {
                Self::element_mut(&mut next, element_id)?
                    .styling
                    .insert(property.clone(), value.clone());
            }

            Mutation::SetValidation { element_id, rules } => {
                Self::element_mut(&mut next, element_id)?.validation = rules.clone();
            }
        }

        next.touch();
        Ok(next)
    }

    /// Check that the mutation fits the document without applying it
    pub fn validate(&self, doc: &FormDocument) -> Result<(), MutationError> {
        let len = doc.elements.len();
        match self {
            Mutation::SetTitle { .. } | Mutation::SetDescription { .. } => Ok(()),

            Mutation::AddElement { element, index } => {
                if doc.element(&element.id).is_some() {
                    return Err(MutationError::DuplicateElement(element.id.clone()));
                }
                if *index > len {
                    return Err(MutationError::IndexOutOfBounds { index: *index, len });
                }
                Ok(())
            }

            Mutation::MoveElement { element_id, index } => {
                Self::position(doc, element_id)?;
                // Index is interpreted after removal, so the last valid slot is len - 1
                if *index >= len {
                    return Err(MutationError::IndexOutOfBounds { index: *index, len });
                }
                Ok(())
            }

            Mutation::RemoveElement { element_id }
            | Mutation::SetLabel { element_id, .. }
            | Mutation::SetProperty { element_id, .. }
            | Mutation::RemoveProperty { element_id, .. }
            | Mutation::SetStyle { element_id, .. }
            | Mutation::SetValidation { element_id, .. } => {
                Self::position(doc, element_id).map(|_| ())
            }
        }
    }

    /// Short human-readable summary, used as the default history label
    pub fn describe(&self) -> String {
        match self {
            Mutation::SetTitle { .. } => "Rename form".to_string(),
            Mutation::SetDescription { .. } => "Edit description".to_string(),
            Mutation::AddElement { element, .. } => format!("Add {}", element.label),
            Mutation::RemoveElement { element_id } => format!("Remove {}", element_id),
            Mutation::MoveElement { element_id, .. } => format!("Move {}", element_id),
            Mutation::SetLabel { element_id, .. } => format!("Relabel {}", element_id),
            Mutation::SetProperty { element_id, key, .. }
            | Mutation::RemoveProperty { element_id, key } => {
                format!("Change {} of {}", key, element_id)
            }
            Mutation::SetStyle { element_id, property, .. } => {
                format!("Style {} of {}", property, element_id)
            }
            Mutation::SetValidation { element_id, .. } => {
                format!("Edit validation of {}", element_id)
            }
        }
    }

    fn position(doc: &FormDocument, element_id: &ElementId) -> Result<usize, MutationError> {
        doc.position_of(element_id)
            .ok_or_else(|| MutationError::ElementNotFound(element_id.clone()))
    }

    fn element_mut<'a>(
        doc: &'a mut FormDocument,
        element_id: &ElementId,
    ) -> Result<&'a mut FormElement, MutationError> {
        doc.element_mut(element_id)
            .ok_or_else(|| MutationError::ElementNotFound(element_id.clone()))
    }
}
