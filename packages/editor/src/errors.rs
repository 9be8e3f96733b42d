//! Error types for the editor

use std::fmt;
use thiserror::Error;

/// Which way through history an operation tried to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryDirection::Undo => f.write_str("undo"),
            HistoryDirection::Redo => f.write_str("redo"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Nothing to {0}")]
    EmptyHistory(HistoryDirection),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),
}
