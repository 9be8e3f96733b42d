//! # Undo/Redo History
//!
//! Bounded, linear history of [`Command`]s.
//!
//! ## Design
//!
//! - Each command holds the document before and after one user-visible edit
//! - Undo hands back `before` and moves the command to the redo stack
//! - Redo hands back `after` and moves it back
//! - Recording a new command clears the redo stack
//! - Past capacity, the oldest undo entry is evicted; redo is never pruned
//! - Batches group a run of commands (a drag gesture) into one entry
//!
//! History is independent of persistence: whether or how often an edit gets
//! saved has no effect on what is recorded here.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = UndoRedoManager::new();
//!
//! let next = history.apply(&Mutation::SetTitle { title: "Survey".into() }, &doc)?;
//!
//! let previous = history.undo()?.document;
//! let again = history.redo()?.document;
//! ```

use crate::command::Command;
use crate::document::FormDocument;
use crate::errors::{EditorError, HistoryDirection};
use crate::mutations::Mutation;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Default maximum number of undo levels
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// History settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Counts reported by [`UndoRedoManager::history_stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub undo_available: usize,
    pub redo_available: usize,
    pub total: usize,
}

/// Result of a successful undo or redo
#[derive(Debug, Clone)]
pub struct HistoryOutcome {
    /// Document state to show after the step
    pub document: FormDocument,

    /// Label of the command that was stepped over
    pub description: String,
}

/// Commands collected while a batch is open
#[derive(Debug)]
struct OpenBatch {
    description: String,
    depth: usize,
    command: Option<Command>,
}

/// Undo/redo manager for form editing
#[derive(Debug)]
pub struct UndoRedoManager {
    /// Applied commands (oldest at the front)
    undo_stack: VecDeque<Command>,

    /// Undone commands (most recent last)
    redo_stack: Vec<Command>,

    /// Maximum number of undo levels (0 = unlimited)
    capacity: usize,

    /// Currently building a batch
    batch: Option<OpenBatch>,
}

impl UndoRedoManager {
    /// Create a manager with the default capacity (100)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a manager with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity,
            batch: None,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    /// Record a command for undo
    ///
    /// Inside a batch the command is folded into the batch entry instead.
    pub fn record(&mut self, command: Command) {
        if let Some(batch) = &mut self.batch {
            batch.command = Some(match batch.command.take() {
                Some(open) => open.merge(command),
                None => command,
            });
            return;
        }

        self.push_command(command);
    }

    /// Apply a mutation to `doc`, record it, and return the new document
    pub fn apply(&mut self, mutation: &Mutation, doc: &FormDocument) -> Result<FormDocument, EditorError> {
        let next = mutation.apply(doc)?;
        let command = Command::from_mutation(doc.clone(), next.clone(), mutation.clone(), mutation.describe());
        self.record(command);
        Ok(next)
    }

    /// Start a batch; everything recorded until the matching `end_batch`
    /// becomes one history entry
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        match &mut self.batch {
            Some(batch) => batch.depth += 1,
            None => {
                self.batch = Some(OpenBatch {
                    description: description.into(),
                    depth: 1,
                    command: None,
                });
            }
        }
    }

    /// Close the current batch level; the outermost close pushes the entry
    ///
    /// Returns true if an entry was recorded.
    pub fn end_batch(&mut self) -> bool {
        let Some(batch) = &mut self.batch else {
            return false;
        };

        batch.depth -= 1;
        if batch.depth > 0 {
            return false;
        }

        self.flush_batch()
    }

    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    /// Push an open batch regardless of nesting
    fn flush_batch(&mut self) -> bool {
        let Some(batch) = self.batch.take() else {
            return false;
        };

        match batch.command {
            Some(command) if !command.is_noop() => {
                let command = Command::new(
                    command.before().clone(),
                    command.after().clone(),
                    batch.description,
                );
                self.push_command(command);
                true
            }
            _ => {
                debug!(description = %batch.description, "Dropping empty batch");
                false
            }
        }
    }

    fn push_command(&mut self, command: Command) {
        debug!(description = command.description(), "Recording command");
        self.undo_stack.push_back(command);

        // Trim if exceeded capacity
        if self.capacity > 0 {
            while self.undo_stack.len() > self.capacity {
                self.undo_stack.pop_front();
            }
        }

        // New action invalidates future
        self.redo_stack.clear();
    }

    /// Step back one command
    pub fn undo(&mut self) -> Result<HistoryOutcome, EditorError> {
        self.flush_batch();

        let command = self
            .undo_stack
            .pop_back()
            .ok_or(EditorError::EmptyHistory(HistoryDirection::Undo))?;

        let outcome = HistoryOutcome {
            document: command.before().clone(),
            description: command.description().to_string(),
        };
        self.redo_stack.push(command);

        Ok(outcome)
    }

    /// Step forward one previously undone command
    pub fn redo(&mut self) -> Result<HistoryOutcome, EditorError> {
        self.flush_batch();

        let command = self
            .redo_stack
            .pop()
            .ok_or(EditorError::EmptyHistory(HistoryDirection::Redo))?;

        let outcome = HistoryOutcome {
            document: command.after().clone(),
            description: command.description().to_string(),
        };
        self.undo_stack.push_back(command);

        Ok(outcome)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all undo/redo history
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
    }

    pub fn history_stats(&self) -> HistoryStats {
        HistoryStats {
            undo_available: self.undo_stack.len(),
            redo_available: self.redo_stack.len(),
            total: self.undo_stack.len() + self.redo_stack.len(),
        }
    }

    /// Label of the next undo step
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(Command::description)
    }

    /// Label of the next redo step
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(Command::description)
    }
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new()
    }
}
