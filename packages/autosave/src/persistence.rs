//! # Persistence Contract
//!
//! The engine never talks to a network or a disk itself. It calls a
//! [`Persistence`] implementation supplied by the host application.
//!
//! Implementations must:
//! - be safe to retry with the same document
//! - report conflicts through `conflict`, distinct from generic failures
//! - fail rather than hang (the engine imposes no timeout)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formsync_editor::FormDocument;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;

/// Arbitrary key/value metadata passed along with each save
pub type SaveMetadata = Map<String, Value>;

/// What a persistence call reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub conflict: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_data: Option<Value>,

    pub timestamp: DateTime<Utc>,
}

impl SaveResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            conflict: false,
            conflict_data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn ok_with(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::ok()
        }
    }

    pub fn conflicted(remote: Option<Value>) -> Self {
        Self {
            success: false,
            error: Some("remote copy has diverged".to_string()),
            conflict: true,
            conflict_data: remote,
            ..Self::ok()
        }
    }

    /// Conflict wins over a contradictory success flag
    pub fn is_conflict(&self) -> bool {
        self.conflict
    }

    pub fn is_success(&self) -> bool {
        self.success && !self.conflict
    }
}

/// Host-supplied save function
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn save(&self, document: &FormDocument, metadata: &SaveMetadata) -> SaveResult;
}

/// Adapter turning an async closure into a [`Persistence`]
pub struct FnPersistence<F> {
    save: F,
}

/// Build a [`Persistence`] from a closure returning a future
///
/// The closure receives owned copies so the returned future can be `'static`.
pub fn persistence_fn<F, Fut>(save: F) -> FnPersistence<F>
where
    F: Fn(FormDocument, SaveMetadata) -> Fut + Send + Sync,
    Fut: Future<Output = SaveResult> + Send + 'static,
{
    FnPersistence { save }
}

#[async_trait]
impl<F, Fut> Persistence for FnPersistence<F>
where
    F: Fn(FormDocument, SaveMetadata) -> Fut + Send + Sync,
    Fut: Future<Output = SaveResult> + Send + 'static,
{
    async fn save(&self, document: &FormDocument, metadata: &SaveMetadata) -> SaveResult {
        (self.save)(document.clone(), metadata.clone()).await
    }
}
