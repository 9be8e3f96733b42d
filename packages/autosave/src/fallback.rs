//! # Offline Fallback Store
//!
//! Best-effort local copy of the latest document per form, so work survives
//! a crash or a long outage. One entry per form; each write replaces the
//! previous one.
//!
//! The store is a safety net, not the system of record: write and read
//! failures are logged and swallowed, never surfaced to the editor.
//!
//! ## Layout
//!
//! ```text
//! <dir>/<form id>.json   { "document": {...}, "timestamp": "...", "isFailover": true }
//! ```
//!
//! File names percent-encode every byte of the form id except ASCII
//! alphanumerics, `-` and `_`, so distinct ids never share a file.

use chrono::{DateTime, Utc};
use formsync_editor::{FormDocument, FormId};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FallbackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// `<form id>.json` with the id encoded so it maps to exactly one file
/// inside the directory
pub fn file_name_for(form_id: &FormId) -> String {
    format!("{}.json", utf8_percent_encode(form_id.as_str(), FILE_NAME))
}

/// Stored record for one form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEntry {
    pub document: FormDocument,
    pub timestamp: DateTime<Utc>,

    /// True when written because remote persistence was unavailable
    pub is_failover: bool,
}

/// Storage backend for fallback entries
pub trait FallbackBackend: Send + Sync {
    fn write(&self, form_id: &FormId, entry: &FallbackEntry) -> Result<(), FallbackError>;

    fn read(&self, form_id: &FormId) -> Result<Option<FallbackEntry>, FallbackError>;

    fn remove(&self, form_id: &FormId) -> Result<(), FallbackError>;
}

/// Entries kept in process memory
#[derive(Debug, Default)]
pub struct MemoryFallbackBackend {
    entries: Mutex<HashMap<FormId, FallbackEntry>>,
}

impl MemoryFallbackBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FallbackBackend for MemoryFallbackBackend {
    fn write(&self, form_id: &FormId, entry: &FallbackEntry) -> Result<(), FallbackError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(form_id.clone(), entry.clone());
        Ok(())
    }

    fn read(&self, form_id: &FormId) -> Result<Option<FallbackEntry>, FallbackError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(form_id)
            .cloned())
    }

    fn remove(&self, form_id: &FormId) -> Result<(), FallbackError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(form_id);
        Ok(())
    }
}

/// One JSON file per form in a directory
#[derive(Debug, Clone)]
pub struct FileFallbackBackend {
    dir: PathBuf,
}

impl FileFallbackBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a form; see [`file_name_for`]
    pub fn path_for(&self, form_id: &FormId) -> PathBuf {
        self.dir.join(file_name_for(form_id))
    }
}

impl FallbackBackend for FileFallbackBackend {
    fn write(&self, form_id: &FormId, entry: &FallbackEntry) -> Result<(), FallbackError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(form_id);
        let tmp = path.with_extension("json.tmp");

        std::fs::write(&tmp, serde_json::to_vec_pretty(entry)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read(&self, form_id: &FormId) -> Result<Option<FallbackEntry>, FallbackError> {
        let path = self.path_for(form_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    fn remove(&self, form_id: &FormId) -> Result<(), FallbackError> {
        let path = self.path_for(form_id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Best-effort local persistence for the latest document of each form
#[derive(Clone)]
pub struct OfflineFallbackStore {
    backend: Arc<dyn FallbackBackend>,
}

impl OfflineFallbackStore {
    pub fn new(backend: Arc<dyn FallbackBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryFallbackBackend::new()))
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileFallbackBackend::new(dir)))
    }

    /// Record the document, replacing any earlier entry for its form
    pub fn save(&self, document: &FormDocument, is_failover: bool) {
        let entry = FallbackEntry {
            document: document.clone(),
            timestamp: Utc::now(),
            is_failover,
        };

        match self.backend.write(&document.id, &entry) {
            Ok(()) => debug!(form_id = %document.id, is_failover, "Wrote fallback copy"),
            Err(e) => warn!(form_id = %document.id, error = %e, "Failed to write fallback copy"),
        }
    }

    /// Latest entry for a form, if one is readable
    ///
    /// Entries holding another form's document are ignored.
    pub fn load(&self, form_id: &FormId) -> Option<FallbackEntry> {
        match self.backend.read(form_id) {
            Ok(Some(entry)) if entry.document.id != *form_id => {
                warn!(
                    form_id = %form_id,
                    found = %entry.document.id,
                    "Fallback copy belongs to another form, ignoring"
                );
                None
            }
            Ok(entry) => entry,
            Err(e) => {
                warn!(form_id = %form_id, error = %e, "Failed to read fallback copy");
                None
            }
        }
    }

    pub fn remove(&self, form_id: &FormId) {
        if let Err(e) = self.backend.remove(form_id) {
            warn!(form_id = %form_id, error = %e, "Failed to remove fallback copy");
        }
    }
}
