//! Error types for auto-save

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutoSaveError {
    #[error("Auto-save engine has been disposed")]
    Disposed,

    #[error("Cannot save while offline")]
    Offline,

    #[error("Unresolved conflict must be resolved before saving")]
    ConflictUnresolved,

    #[error("Invalid auto-save config: {0}")]
    InvalidConfig(String),
}
