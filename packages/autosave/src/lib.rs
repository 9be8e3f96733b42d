//! # FormSync Auto-save
//!
//! Background persistence for form documents.
//!
//! ## Flow
//!
//! ```text
//! edit ─→ trigger_save ─→ debounce ─→ Persistence::save
//!                                        │
//!                 ┌──────────────────────┼───────────────────────┐
//!                 ↓                      ↓                       ↓
//!               saved            error → retry (backoff)      conflict
//!                                        │                  (held until
//!                          exhausted / offline               resolved)
//!                                        ↓
//!                              OfflineFallbackStore
//! ```
//!
//! The host supplies a [`Persistence`] implementation; the engine decides
//! when to call it and reports progress through [`AutoSaveEvent`]s.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formsync_autosave::{persistence_fn, AutoSaveConfig, AutoSaveEngine, SaveResult};
//! use std::sync::Arc;
//!
//! let engine = AutoSaveEngine::builder("feedback")
//!     .config(AutoSaveConfig::default().with_debounce_ms(500))
//!     .build(Arc::new(persistence_fn(|doc, _meta| async move {
//!         upload(doc).await;
//!         SaveResult::ok()
//!     })));
//!
//! engine.trigger_save(doc, Default::default(), false)?;
//! ```

pub mod config;
pub mod conflict;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fallback;
pub mod persistence;
pub mod retry;
pub mod status;
mod timer;

pub use config::AutoSaveConfig;
pub use conflict::{ConflictRecord, ConflictResolver, KeepLocal, PreferRemote, Resolution};
pub use engine::{AutoSaveEngine, AutoSaveEngineBuilder};
pub use errors::AutoSaveError;
pub use events::{AutoSaveEvent, AutoSaveEventKind, EventBus, Listener, ListenerId};
pub use fallback::{
    file_name_for, FallbackBackend, FallbackEntry, FallbackError, FileFallbackBackend, MemoryFallbackBackend,
    OfflineFallbackStore,
};
pub use persistence::{persistence_fn, FnPersistence, Persistence, SaveMetadata, SaveResult};
pub use retry::RetryScheduler;
pub use status::{AutoSaveState, AutoSaveStatus};
