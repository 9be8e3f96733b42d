//! # Conflicts
//!
//! A conflict means the remote copy diverged from what this session last
//! saved. The engine only detects and surfaces it; deciding what to keep is
//! delegated to a [`ConflictResolver`], so merge, overwrite and prompt
//! policies can all be plugged in.

use chrono::{DateTime, Utc};
use formsync_editor::{FormDocument, FormId};
use serde_json::Value;

/// A detected divergence between local and remote copies
#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub form_id: FormId,

    /// The document this session tried to save
    pub local: FormDocument,

    /// Competing payload reported by the persistence layer
    pub remote: Option<Value>,

    pub detected_at: DateTime<Utc>,
}

impl ConflictRecord {
    /// The remote payload decoded as a form, when it is one
    pub fn remote_document(&self) -> Option<FormDocument> {
        let remote = self.remote.clone()?;
        serde_json::from_value(remote).ok()
    }
}

/// Outcome of a conflict resolution policy
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Overwrite the remote copy with the local document
    KeepLocal,

    /// Discard local changes in favour of the remote document
    AcceptRemote(FormDocument),

    /// Save a merged document over the remote copy
    Merged(FormDocument),

    /// Leave the conflict in place for now
    Defer,
}

/// Pluggable conflict policy
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, conflict: &ConflictRecord) -> Resolution;
}

/// Always keeps the local document
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepLocal;

impl ConflictResolver for KeepLocal {
    fn resolve(&self, _conflict: &ConflictRecord) -> Resolution {
        Resolution::KeepLocal
    }
}

/// Takes the remote document when it decodes, otherwise defers
#[derive(Debug, Default, Clone, Copy)]
pub struct PreferRemote;

impl ConflictResolver for PreferRemote {
    fn resolve(&self, conflict: &ConflictRecord) -> Resolution {
        match conflict.remote_document() {
            Some(remote) => Resolution::AcceptRemote(remote),
            None => Resolution::Defer,
        }
    }
}

impl<F> ConflictResolver for F
where
    F: Fn(&ConflictRecord) -> Resolution + Send + Sync,
{
    fn resolve(&self, conflict: &ConflictRecord) -> Resolution {
        self(conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(remote: Option<Value>) -> ConflictRecord {
        ConflictRecord {
            form_id: FormId::from("f"),
            local: FormDocument::new("f", "Local"),
            remote,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn test_prefer_remote_decodes_document() {
        let remote = serde_json::to_value(FormDocument::new("f", "Remote")).unwrap();
        match PreferRemote.resolve(&record(Some(remote))) {
            Resolution::AcceptRemote(doc) => assert_eq!(doc.title, "Remote"),
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn test_prefer_remote_defers_on_garbage() {
        let remote = serde_json::json!({ "unexpected": true });
        assert!(matches!(
            PreferRemote.resolve(&record(Some(remote))),
            Resolution::Defer
        ));
        assert!(matches!(PreferRemote.resolve(&record(None)), Resolution::Defer));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |conflict: &ConflictRecord| Resolution::Merged(conflict.local.clone());
        assert!(matches!(resolver.resolve(&record(None)), Resolution::Merged(_)));
    }
}
