//! # FormSync Editor
//!
//! Document model and edit history for the form builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ canvas / property panels                    │
//! │  - emit Mutations or whole new documents    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: FormDocument values + history       │
//! │  - Apply mutations with validation          │
//! │  - Fingerprint documents for change checks  │
//! │  - Record reversible Commands               │
//! │  - Undo/redo over a bounded stack           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ autosave: background persistence            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Documents are values**: every edit yields a new snapshot
//! 2. **Fingerprints decide change**: volatile UI state never counts
//! 3. **History ignores persistence**: one Command per visible edit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formsync_editor::{FormDocument, Mutation, UndoRedoManager};
//!
//! let doc = FormDocument::new("feedback", "Feedback");
//! let mut history = UndoRedoManager::new();
//!
//! let doc = history.apply(&Mutation::SetTitle { title: "Your feedback".into() }, &doc)?;
//! let doc = history.undo()?.document;
//! ```

pub mod command;
pub mod document;
pub mod errors;
pub mod fingerprint;
pub mod mutations;
pub mod undo_stack;

pub use command::Command;
pub use document::{
    EditorUiState, ElementId, ElementKind, FormDocument, FormElement, FormId, ValidationRule,
};
pub use errors::{EditorError, HistoryDirection};
pub use fingerprint::ChangeFingerprint;
pub use mutations::{Mutation, MutationError};
pub use undo_stack::{
    HistoryConfig, HistoryOutcome, HistoryStats, UndoRedoManager, DEFAULT_HISTORY_CAPACITY,
};
