//! # FormSync Workspace
//!
//! Session-level glue: a [`SyncCoordinator`] holds the open document and
//! routes every edit, undo and redo through both the history stack and the
//! auto-save engine.

pub mod coordinator;

pub use coordinator::{SyncCoordinator, SyncError, SyncResult, SyncStatus};
