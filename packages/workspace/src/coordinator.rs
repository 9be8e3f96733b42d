//! # Sync Coordinator
//!
//! Owns the live document for one editing session and keeps edit history and
//! auto-save in step:
//!
//! ```text
//! edit ─→ fingerprint check ─→ UndoRedoManager::record   (synchronous)
//!                          └─→ AutoSaveEngine::trigger_save (debounced)
//! ```
//!
//! History never waits on persistence. Undo and redo produce ordinary
//! snapshots that are saved like any other edit.

use formsync_autosave::{
    AutoSaveEngine, AutoSaveError, AutoSaveEvent, AutoSaveEventKind, AutoSaveState,
    AutoSaveStatus, ConflictResolver, FallbackEntry, ListenerId, SaveMetadata, SaveResult,
};
use formsync_editor::{
    ChangeFingerprint, Command, EditorError, FormDocument, FormId, HistoryOutcome, HistoryStats, Mutation,
    MutationError, UndoRedoManager,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    AutoSave(#[from] AutoSaveError),

    #[error("Invalid mutation: {0}")]
    Mutation(#[from] MutationError),

    #[error("Document belongs to form '{found}', session edits '{expected}'")]
    FormMismatch { expected: FormId, found: FormId },
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Why a snapshot was handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditSource {
    Edit,
    Undo,
    Redo,
    Resolution,
    Recovery,
}

impl EditSource {
    fn as_str(&self) -> &'static str {
        match self {
            EditSource::Edit => "edit",
            EditSource::Undo => "undo",
            EditSource::Redo => "redo",
            EditSource::Resolution => "conflict-resolution",
            EditSource::Recovery => "recovery",
        }
    }
}

/// Combined save and history state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub status: AutoSaveStatus,
    pub pending_changes: bool,
    pub is_online: bool,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub has_conflict: bool,
    pub history: HistoryStats,
    pub fingerprint: String,
}

impl SyncStatus {
    fn from_parts(save: AutoSaveState, history: HistoryStats, fingerprint: ChangeFingerprint) -> Self {
        Self {
            status: save.status,
            pending_changes: save.pending_changes,
            is_online: save.is_online,
            retry_count: save.retry_count,
            last_error: save.last_error,
            has_conflict: save.conflict.is_some(),
            history,
            fingerprint: fingerprint.to_hex(),
        }
    }
}

/// Single-form editing session wiring history to auto-save
pub struct SyncCoordinator {
    document: FormDocument,
    fingerprint: ChangeFingerprint,
    history: UndoRedoManager,
    engine: AutoSaveEngine,
}

impl SyncCoordinator {
    pub fn new(document: FormDocument, engine: AutoSaveEngine, history: UndoRedoManager) -> Self {
        let fingerprint = ChangeFingerprint::of(&document);
        Self {
            document,
            fingerprint,
            history,
            engine,
        }
    }

    pub fn document(&self) -> &FormDocument {
        &self.document
    }

    pub fn fingerprint(&self) -> ChangeFingerprint {
        self.fingerprint
    }

    pub fn engine(&self) -> &AutoSaveEngine {
        &self.engine
    }

    pub fn history(&self) -> &UndoRedoManager {
        &self.history
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Adopt a new snapshot from the editor
    ///
    /// Returns false when the snapshot matches the current content, in which
    /// case nothing is recorded or saved. Snapshots of another form are
    /// rejected.
    pub fn apply_edit(
        &mut self,
        document: FormDocument,
        description: impl Into<String>,
    ) -> SyncResult<bool> {
        let description = description.into();
        self.commit(document, EditSource::Edit, |before, after| {
            Command::new(before, after, description)
        })
    }

    /// Apply a semantic mutation to the current document
    pub fn apply_mutation(&mut self, mutation: Mutation) -> SyncResult<bool> {
        let next = mutation.apply(&self.document)?;
        let description = mutation.describe();
        self.commit(next, EditSource::Edit, |before, after| {
            Command::from_mutation(before, after, mutation, description)
        })
    }

    /// Group the following edits into one history entry
    pub fn begin_gesture(&mut self, description: impl Into<String>) {
        self.history.begin_batch(description);
    }

    /// Close the innermost gesture; true if a history entry was recorded
    pub fn end_gesture(&mut self) -> bool {
        self.history.end_batch()
    }

    fn commit(
        &mut self,
        mut document: FormDocument,
        source: EditSource,
        command: impl FnOnce(FormDocument, FormDocument) -> Command,
    ) -> SyncResult<bool> {
        if document.id != self.document.id {
            return Err(SyncError::FormMismatch {
                expected: self.document.id.clone(),
                found: document.id,
            });
        }

        let fingerprint = ChangeFingerprint::of(&document);
        if fingerprint == self.fingerprint {
            debug!(form_id = %self.document.id, "Ignoring edit without content change");
            return Ok(false);
        }

        document.touch();
        self.engine
            .trigger_save(document.clone(), self.metadata(source), false)?;

        let before = std::mem::replace(&mut self.document, document);
        self.history.record(command(before, self.document.clone()));
        self.fingerprint = fingerprint;
        Ok(true)
    }

    /// Replace the document with a history or resolution result without
    /// recording a new command
    fn adopt(&mut self, document: FormDocument, source: EditSource) -> SyncResult<()> {
        let fingerprint = ChangeFingerprint::of(&document);
        self.engine
            .trigger_save(document.clone(), self.metadata(source), false)?;
        self.document = document;
        self.fingerprint = fingerprint;
        Ok(())
    }

    /// History must not move if the result cannot be saved
    fn ensure_active(&self) -> SyncResult<()> {
        if self.engine.is_disposed() {
            return Err(AutoSaveError::Disposed.into());
        }
        Ok(())
    }

    fn metadata(&self, source: EditSource) -> SaveMetadata {
        let mut metadata = SaveMetadata::new();
        metadata.insert("source".to_string(), Value::from(source.as_str()));
        metadata
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> SyncResult<HistoryOutcome> {
        self.ensure_active()?;
        let outcome = self.history.undo()?;
        info!(form_id = %self.document.id, description = %outcome.description, "Undo");
        self.adopt(outcome.document.clone(), EditSource::Undo)?;
        Ok(outcome)
    }

    pub fn redo(&mut self) -> SyncResult<HistoryOutcome> {
        self.ensure_active()?;
        let outcome = self.history.redo()?;
        info!(form_id = %self.document.id, description = %outcome.description, "Redo");
        self.adopt(outcome.document.clone(), EditSource::Redo)?;
        Ok(outcome)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear_history();
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.history.history_stats()
    }

    // ─── Saving ──────────────────────────────────────────────────────────

    /// Save the current document immediately
    pub async fn force_save(&self) -> SyncResult<SaveResult> {
        let metadata = self.metadata(EditSource::Edit);
        Ok(self.engine.force_save(self.document.clone(), metadata).await?)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus::from_parts(self.engine.state(), self.history_stats(), self.fingerprint)
    }

    pub fn save_status(&self) -> AutoSaveStatus {
        self.engine.status()
    }

    pub fn set_online(&self, online: bool) {
        self.engine.set_online(online);
    }

    /// Settle a save conflict; the adopted document becomes an undoable edit
    ///
    /// Returns true if the document changed.
    pub fn resolve_conflict(&mut self, resolver: &dyn ConflictResolver) -> SyncResult<bool> {
        match self.engine.resolve_conflict(resolver)? {
            Some(resolved) => self.commit(resolved, EditSource::Resolution, |before, after| {
                Command::new(before, after, "Resolve conflict")
            }),
            None => Ok(false),
        }
    }

    // ─── Recovery ────────────────────────────────────────────────────────

    /// Local copy that differs from what is open, if any
    pub fn recovery_candidate(&self) -> Option<FallbackEntry> {
        let entry = self.engine.fallback()?.load(&self.document.id)?;
        (ChangeFingerprint::of(&entry.document) != self.fingerprint).then_some(entry)
    }

    /// Restore the local copy as an undoable edit
    ///
    /// Returns true if a copy was adopted.
    pub fn recover(&mut self) -> SyncResult<bool> {
        let Some(entry) = self.recovery_candidate() else {
            return Ok(false);
        };

        info!(
            form_id = %self.document.id,
            saved_at = %entry.timestamp,
            "Recovering local copy"
        );
        let recovered = self.commit(entry.document, EditSource::Recovery, |before, after| {
            Command::new(before, after, "Recover unsaved changes")
        })?;

        if let Some(store) = self.engine.fallback() {
            store.remove(&self.document.id);
        }
        Ok(recovered)
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn add_event_listener<F>(&self, kind: AutoSaveEventKind, listener: F) -> ListenerId
    where
        F: Fn(&AutoSaveEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.engine.add_event_listener(kind, listener)
    }

    pub fn remove_event_listener(&self, kind: AutoSaveEventKind, id: ListenerId) -> bool {
        self.engine.remove_event_listener(kind, id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutoSaveEvent> {
        self.engine.subscribe()
    }

    /// Stop background saving for this session
    pub fn dispose(&self) {
        self.engine.dispose();
    }
}
