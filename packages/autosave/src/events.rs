//! # Auto-save Events
//!
//! Typed publish/subscribe for save lifecycle changes.
//!
//! Each event kind has its own ordered listener list. Delivery is
//! synchronous, in registration order, on the task that caused the
//! transition. A listener that returns an error or panics is logged and
//! skipped; the remaining listeners still run and the engine's transition
//! is never affected.

use chrono::{DateTime, Utc};
use formsync_editor::FormId;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::error;

/// Capacity of the broadcast channel behind [`EventBus::subscribe`]
const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoSaveEventKind {
    SaveStarted,
    SaveCompleted,
    SaveFailed,
    ConflictDetected,
    OfflineDetected,
    OnlineRestored,
}

impl AutoSaveEventKind {
    pub const ALL: [AutoSaveEventKind; 6] = [
        AutoSaveEventKind::SaveStarted,
        AutoSaveEventKind::SaveCompleted,
        AutoSaveEventKind::SaveFailed,
        AutoSaveEventKind::ConflictDetected,
        AutoSaveEventKind::OfflineDetected,
        AutoSaveEventKind::OnlineRestored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AutoSaveEventKind::SaveStarted => "save-started",
            AutoSaveEventKind::SaveCompleted => "save-completed",
            AutoSaveEventKind::SaveFailed => "save-failed",
            AutoSaveEventKind::ConflictDetected => "conflict-detected",
            AutoSaveEventKind::OfflineDetected => "offline-detected",
            AutoSaveEventKind::OnlineRestored => "online-restored",
        }
    }
}

impl fmt::Display for AutoSaveEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle notification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveEvent {
    #[serde(rename = "type")]
    pub kind: AutoSaveEventKind,
    pub timestamp: DateTime<Utc>,
    pub form_id: FormId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AutoSaveEvent {
    pub fn new(kind: AutoSaveEventKind, form_id: FormId) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            form_id,
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Event handler
pub type Listener = Arc<dyn Fn(&AutoSaveEvent) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned on registration, used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Per-kind listener registry
pub struct EventBus {
    listeners: Mutex<HashMap<AutoSaveEventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
    broadcast: broadcast::Sender<AutoSaveEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            broadcast,
        }
    }

    pub fn add_listener<F>(&self, kind: AutoSaveEventKind, listener: F) -> ListenerId
    where
        F: Fn(&AutoSaveEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the listener was not registered for `kind`
    pub fn remove_listener(&self, kind: AutoSaveEventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(registered) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|(existing, _)| *existing != id);
        before != registered.len()
    }

    pub fn listener_count(&self, kind: AutoSaveEventKind) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Receive every event on a channel
    pub fn subscribe(&self) -> broadcast::Receiver<AutoSaveEvent> {
        self.broadcast.subscribe()
    }

    /// Deliver an event to every listener for its kind
    pub fn emit(&self, event: &AutoSaveEvent) {
        // Snapshot so listeners can (un)register without deadlocking
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind)
            .map(|registered| registered.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(event = %event.kind, form_id = %event.form_id, error = %e, "Event listener failed");
                }
                Err(_) => {
                    error!(event = %event.kind, form_id = %event.form_id, "Event listener panicked");
                }
            }
        }

        // No receivers is fine
        let _ = self.broadcast.send(event.clone());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
