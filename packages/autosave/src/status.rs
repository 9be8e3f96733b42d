use crate::conflict::ConflictRecord;
use chrono::{DateTime, Utc};
use formsync_editor::ChangeFingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the save lifecycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
    Offline,
    Conflict,
}

impl fmt::Display for AutoSaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AutoSaveStatus::Idle => "idle",
            AutoSaveStatus::Saving => "saving",
            AutoSaveStatus::Saved => "saved",
            AutoSaveStatus::Error => "error",
            AutoSaveStatus::Offline => "offline",
            AutoSaveStatus::Conflict => "conflict",
        };
        f.write_str(label)
    }
}

/// Read-only view of the engine state
#[derive(Debug, Clone)]
pub struct AutoSaveState {
    pub status: AutoSaveStatus,
    pub pending_changes: bool,
    pub retry_count: u32,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_saved_fingerprint: Option<ChangeFingerprint>,
    pub last_error: Option<String>,
    pub conflict: Option<ConflictRecord>,
    pub is_online: bool,
}
