//! # Change Fingerprints
//!
//! A fingerprint is a blake3 digest over the canonical form of the parts of
//! a document that matter for persistence: title, description and the
//! ordered element list with properties, validation and styling.
//!
//! Canonicalization:
//! - editor UI state and `updated_at` are excluded
//! - elements are ordered by their `order` slot (ties keep list position)
//! - property and style maps are `BTreeMap`s, and nested JSON objects use
//!   serde_json's sorted map, so key order never changes the digest
//!
//! Two different documents with the same digest are treated as equal. With a
//! 256-bit digest that is an accepted approximation.

use crate::document::{FormDocument, FormElement};
use serde_json::{json, Value};
use std::fmt;

/// Digest of the semantically relevant content of a document
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeFingerprint(blake3::Hash);

impl ChangeFingerprint {
    /// Fingerprint a document
    pub fn of(document: &FormDocument) -> Self {
        let canonical = canonical_form(document).to_string();
        Self(blake3::hash(canonical.as_bytes()))
    }

    /// Hex form, for logs and event payloads
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Debug for ChangeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeFingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChangeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Build the canonical JSON view that gets hashed
pub fn canonical_form(document: &FormDocument) -> Value {
    let mut ordered: Vec<(usize, &FormElement)> = document.elements.iter().enumerate().collect();
    ordered.sort_by_key(|(position, element)| (element.order, *position));

    let elements: Vec<Value> = ordered
        .into_iter()
        .map(|(_, element)| {
            json!({
                "id": element.id,
                "kind": element.kind,
                "label": element.label,
                "properties": element.properties,
                "validation": element.validation,
                "styling": element.styling,
            })
        })
        .collect();

    json!({
        "title": document.title,
        "description": document.description,
        "elements": elements,
    })
}
