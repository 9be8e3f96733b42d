//! Reversible history entries.

use crate::document::FormDocument;
use crate::fingerprint::ChangeFingerprint;
use crate::mutations::Mutation;
use chrono::{DateTime, Utc};

/// One undoable edit: the document before and after, plus a label
///
/// Commands are immutable once built. Undo restores `before`, redo restores
/// `after`; the optional mutation records the semantic delta that produced
/// the change when the edit came through [`Mutation::apply`].
#[derive(Debug, Clone)]
pub struct Command {
    before: FormDocument,
    after: FormDocument,
    description: String,
    timestamp: DateTime<Utc>,
    mutation: Option<Mutation>,
}

impl Command {
    /// Snapshot-pair command
    pub fn new(before: FormDocument, after: FormDocument, description: impl Into<String>) -> Self {
        Self {
            before,
            after,
            description: description.into(),
            timestamp: Utc::now(),
            mutation: None,
        }
    }

    /// Command produced by a semantic mutation
    pub fn from_mutation(
        before: FormDocument,
        after: FormDocument,
        mutation: Mutation,
        description: impl Into<String>,
    ) -> Self {
        Self {
            mutation: Some(mutation),
            ..Self::new(before, after, description)
        }
    }

    pub fn before(&self) -> &FormDocument {
        &self.before
    }

    pub fn after(&self) -> &FormDocument {
        &self.after
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn mutation(&self) -> Option<&Mutation> {
        self.mutation.as_ref()
    }

    /// True when before and after are the same document
    pub fn is_noop(&self) -> bool {
        ChangeFingerprint::of(&self.before) == ChangeFingerprint::of(&self.after)
    }

    /// Fold a later command into this one, keeping this command's `before`
    /// and label and taking the later `after`
    pub(crate) fn merge(self, later: Command) -> Command {
        Command {
            before: self.before,
            after: later.after,
            description: self.description,
            timestamp: later.timestamp,
            mutation: None,
        }
    }
}
