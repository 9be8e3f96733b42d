//! # Auto-save Engine
//!
//! Persists one form in the background and keeps a single authoritative
//! status for it.
//!
//! ## State machine
//!
//! ```text
//!            trigger / debounce
//!   idle ─────────────────────────→ saving ──→ saved
//!     ↑                               │  └───→ error ──(retry)──→ saving
//!     │ online                        └──────→ conflict (held until resolved)
//!   offline ←── idle / saving / saved / error
//! ```
//!
//! ## Ordering
//!
//! - Only the latest queued snapshot is ever saved; repeated triggers inside
//!   the debounce window collapse into one persistence call
//! - At most one background save is in flight. Edits arriving meanwhile are
//!   queued and saved after it resolves
//! - A forced save may overlap a background one. Every dispatch carries a
//!   sequence number and a result is ignored once a later dispatch has
//!   succeeded, so `last_saved_snapshot` never moves backwards. A failed
//!   save is dropped, not retried, when a later dispatch already exists
//! - The fingerprint recorded on success is the one computed at dispatch
//!   time, not whatever the editor holds when the call returns
//!
//! ## Runtime
//!
//! Timers are Tokio tasks owned by the engine instance. Operations that may
//! schedule work must run inside a Tokio runtime. Engine state sits behind a
//! mutex that is never held across an `.await`, and listeners are called
//! after it is released.

use crate::config::AutoSaveConfig;
use crate::conflict::{ConflictRecord, ConflictResolver, Resolution};
use crate::errors::AutoSaveError;
use crate::events::{AutoSaveEvent, AutoSaveEventKind, EventBus, ListenerId};
use crate::fallback::OfflineFallbackStore;
use crate::persistence::{Persistence, SaveMetadata, SaveResult};
use crate::retry::RetryScheduler;
use crate::status::{AutoSaveState, AutoSaveStatus};
use crate::timer::{IntervalTimer, Timer};
use chrono::{DateTime, Utc};
use formsync_editor::{ChangeFingerprint, FormDocument, FormId};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A snapshot waiting to be saved, or being saved
#[derive(Debug, Clone)]
struct Queued {
    document: FormDocument,
    metadata: SaveMetadata,
    fingerprint: ChangeFingerprint,
}

impl Queued {
    fn new(document: FormDocument, metadata: SaveMetadata) -> Self {
        let fingerprint = ChangeFingerprint::of(&document);
        Self {
            document,
            metadata,
            fingerprint,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    seq: u64,
    fingerprint: ChangeFingerprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Background,
    Forced,
}

struct EngineState {
    status: AutoSaveStatus,
    pending_changes: bool,

    /// Latest snapshot not yet handed to persistence
    queued: Option<Queued>,

    /// Background save currently awaiting persistence
    in_flight: Option<InFlight>,
    forced_in_flight: usize,

    next_seq: u64,
    last_saved_seq: u64,
    last_saved_fingerprint: Option<ChangeFingerprint>,
    last_saved_snapshot: Option<FormDocument>,
    last_saved_at: Option<DateTime<Utc>>,

    last_error: Option<String>,
    conflict: Option<ConflictRecord>,
    online: bool,
    disposed: bool,

    debounce: Timer,
    retry: RetryScheduler,
    interval: IntervalTimer,
}

impl EngineState {
    fn dispatch(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn busy(&self) -> bool {
        self.in_flight.is_some() || self.forced_in_flight > 0
    }

    /// Fingerprint the engine is converging to
    fn target_fingerprint(&self) -> Option<ChangeFingerprint> {
        self.queued
            .as_ref()
            .map(|q| q.fingerprint)
            .or(self.in_flight.map(|f| f.fingerprint))
            .or(self.last_saved_fingerprint)
    }

    fn can_dispatch(&self) -> bool {
        !self.disposed && self.online && self.status != AutoSaveStatus::Conflict
    }
}

struct Inner {
    form_id: FormId,
    config: AutoSaveConfig,
    persistence: Arc<dyn Persistence>,
    fallback: Option<OfflineFallbackStore>,
    events: EventBus,
    state: Mutex<EngineState>,
}

/// Builder for [`AutoSaveEngine`]
pub struct AutoSaveEngineBuilder {
    form_id: FormId,
    config: AutoSaveConfig,
    fallback: Option<OfflineFallbackStore>,
    online: bool,
}

impl AutoSaveEngineBuilder {
    pub fn config(mut self, config: AutoSaveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fallback(mut self, store: OfflineFallbackStore) -> Self {
        self.fallback = Some(store);
        self
    }

    /// Initial connectivity (defaults to online)
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Build the engine; starts the periodic flush when an interval is set,
    /// which requires a Tokio runtime
    pub fn build(self, persistence: Arc<dyn Persistence>) -> AutoSaveEngine {
        let retry = RetryScheduler::new(
            self.config.debounce(),
            self.config.retry_multiplier,
            self.config.max_retries,
        );
        let fallback = if self.config.enable_fallback {
            self.fallback
        } else {
            None
        };
        let status = if self.online {
            AutoSaveStatus::Idle
        } else {
            AutoSaveStatus::Offline
        };

        let engine = AutoSaveEngine {
            inner: Arc::new(Inner {
                form_id: self.form_id,
                config: self.config,
                persistence,
                fallback,
                events: EventBus::new(),
                state: Mutex::new(EngineState {
                    status,
                    pending_changes: false,
                    queued: None,
                    in_flight: None,
                    forced_in_flight: 0,
                    next_seq: 0,
                    last_saved_seq: 0,
                    last_saved_fingerprint: None,
                    last_saved_snapshot: None,
                    last_saved_at: None,
                    last_error: None,
                    conflict: None,
                    online: self.online,
                    disposed: false,
                    debounce: Timer::new(),
                    retry,
                    interval: IntervalTimer::default(),
                }),
            }),
        };

        if let Some(period) = engine.inner.config.interval() {
            engine.start_interval(period);
        }
        engine
    }
}

/// Background persistence for one form
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct AutoSaveEngine {
    inner: Arc<Inner>,
}

impl AutoSaveEngine {
    pub fn builder(form_id: impl Into<FormId>) -> AutoSaveEngineBuilder {
        AutoSaveEngineBuilder {
            form_id: form_id.into(),
            config: AutoSaveConfig::default(),
            fallback: None,
            online: true,
        }
    }

    /// Engine with default settings and no fallback store
    pub fn new(form_id: impl Into<FormId>, persistence: Arc<dyn Persistence>) -> Self {
        Self::builder(form_id).build(persistence)
    }

    pub fn form_id(&self) -> &FormId {
        &self.inner.form_id
    }

    pub fn config(&self) -> &AutoSaveConfig {
        &self.inner.config
    }

    pub fn fallback(&self) -> Option<&OfflineFallbackStore> {
        self.inner.fallback.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    fn event(&self, kind: AutoSaveEventKind) -> AutoSaveEvent {
        AutoSaveEvent::new(kind, self.inner.form_id.clone())
    }

    fn emit_all(&self, events: Vec<AutoSaveEvent>) {
        for event in &events {
            self.inner.events.emit(event);
        }
    }

    fn write_fallback(&self, document: &FormDocument, is_failover: bool) {
        if let Some(store) = &self.inner.fallback {
            store.save(document, is_failover);
        }
    }

    // ─── Saving ──────────────────────────────────────────────────────────

    /// Queue a document for saving
    ///
    /// Unchanged documents are ignored. Otherwise the document replaces any
    /// queued one and is saved after the debounce window, or right away when
    /// `immediate` is set.
    pub fn trigger_save(
        &self,
        document: FormDocument,
        metadata: SaveMetadata,
        immediate: bool,
    ) -> Result<(), AutoSaveError> {
        let queued = Queued::new(document, metadata);
        let mut state = self.lock();
        if state.disposed {
            return Err(AutoSaveError::Disposed);
        }

        if state.target_fingerprint() == Some(queued.fingerprint) {
            debug!(form_id = %self.inner.form_id, "Document unchanged, skipping save");
            if immediate && state.queued.is_some() && state.can_dispatch() {
                state.debounce.cancel();
                drop(state);
                self.spawn_save();
            }
            return Ok(());
        }

        if !state.busy() && state.last_saved_fingerprint == Some(queued.fingerprint) {
            debug!(form_id = %self.inner.form_id, "Document reverted to saved state");
            state.queued = None;
            state.pending_changes = false;
            state.debounce.cancel();
            state.retry.reset();
            return Ok(());
        }

        // A fresh edit gets a fresh retry budget
        state.retry.reset();
        state.pending_changes = true;

        if !state.online {
            let document = queued.document.clone();
            state.queued = Some(queued);
            drop(state);
            debug!(form_id = %self.inner.form_id, "Offline, keeping edit locally");
            self.write_fallback(&document, true);
            return Ok(());
        }

        state.queued = Some(queued);

        if state.status == AutoSaveStatus::Conflict {
            debug!(form_id = %self.inner.form_id, "Holding edit until conflict is resolved");
            return Ok(());
        }

        if immediate {
            state.debounce.cancel();
            drop(state);
            self.spawn_save();
        } else {
            self.schedule_debounce(&mut state);
        }
        Ok(())
    }

    /// Save `document` now, bypassing debounce and change detection
    pub async fn force_save(
        &self,
        document: FormDocument,
        metadata: SaveMetadata,
    ) -> Result<SaveResult, AutoSaveError> {
        let saving = Queued::new(document, metadata);
        let seq = {
            let mut state = self.lock();
            if state.disposed {
                return Err(AutoSaveError::Disposed);
            }
            if state.status == AutoSaveStatus::Conflict {
                return Err(AutoSaveError::ConflictUnresolved);
            }

            state.debounce.cancel();
            state.retry.reset();
            state.pending_changes = true;

            if !state.online {
                let document = saving.document.clone();
                state.queued = Some(saving);
                drop(state);
                self.write_fallback(&document, true);
                return Err(AutoSaveError::Offline);
            }

            // The forced snapshot supersedes anything queued
            state.queued = None;
            state.forced_in_flight += 1;
            state.status = AutoSaveStatus::Saving;
            state.dispatch()
        };

        self.inner.events.emit(&self.event(AutoSaveEventKind::SaveStarted).with_data(json!({
            "fingerprint": saving.fingerprint.to_hex(),
            "forced": true,
        })));
        info!(form_id = %self.inner.form_id, "Forced save");

        let result = self
            .inner
            .persistence
            .save(&saving.document, &saving.metadata)
            .await;
        self.complete(saving, seq, Dispatch::Forced, &result);
        Ok(result)
    }

    fn spawn_save(&self) {
        let weak = self.downgrade();
        tokio::spawn(async move {
            if let Some(inner) = weak.upgrade() {
                AutoSaveEngine { inner }.perform_save().await;
            }
        });
    }

    fn schedule_debounce(&self, state: &mut EngineState) {
        let weak = self.downgrade();
        let delay = self.inner.config.debounce();
        debug!(form_id = %self.inner.form_id, delay_ms = delay.as_millis() as u64, "Debouncing save");
        state.debounce.schedule(delay, async move {
            if let Some(inner) = weak.upgrade() {
                AutoSaveEngine { inner }.perform_save().await;
            }
        });
    }

    fn schedule_retry(&self, state: &mut EngineState) -> bool {
        let weak = self.downgrade();
        let scheduled = state.retry.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                AutoSaveEngine { inner }.perform_save().await;
            }
        });

        match scheduled {
            Some((attempt, delay)) => {
                debug!(
                    form_id = %self.inner.form_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduled save retry"
                );
                true
            }
            None => false,
        }
    }

    /// Save the queued snapshot, if any
    async fn perform_save(&self) {
        let (saving, seq) = {
            let mut state = self.lock();
            if !state.can_dispatch() {
                return;
            }
            if state.busy() {
                debug!(form_id = %self.inner.form_id, "Save in flight, queued snapshot will follow");
                return;
            }
            let Some(saving) = state.queued.take() else {
                return;
            };

            let seq = state.dispatch();
            state.in_flight = Some(InFlight {
                seq,
                fingerprint: saving.fingerprint,
            });
            state.status = AutoSaveStatus::Saving;
            (saving, seq)
        };

        self.inner.events.emit(&self.event(AutoSaveEventKind::SaveStarted).with_data(json!({
            "fingerprint": saving.fingerprint.to_hex(),
            "forced": false,
        })));

        let result = self
            .inner
            .persistence
            .save(&saving.document, &saving.metadata)
            .await;
        self.complete(saving, seq, Dispatch::Background, &result);
    }

    /// Fold a persistence result back into the engine state
    fn complete(&self, saved: Queued, seq: u64, dispatch: Dispatch, result: &SaveResult) {
        let mut events = Vec::new();
        let mut fallback_write = None;

        {
            let mut state = self.lock();
            match dispatch {
                Dispatch::Forced => state.forced_in_flight = state.forced_in_flight.saturating_sub(1),
                Dispatch::Background => {
                    if state.in_flight.is_some_and(|f| f.seq == seq) {
                        state.in_flight = None;
                    }
                }
            }

            if state.disposed {
                return;
            }

            if seq < state.last_saved_seq {
                debug!(form_id = %self.inner.form_id, seq, "Ignoring result of superseded save");
                return;
            }

            if result.is_conflict() {
                warn!(form_id = %self.inner.form_id, "Save conflict detected");
                state.status = AutoSaveStatus::Conflict;
                state.last_error = result.error.clone();
                state.debounce.cancel();
                state.retry.cancel();
                state.conflict = Some(ConflictRecord {
                    form_id: self.inner.form_id.clone(),
                    local: saved.document.clone(),
                    remote: result.conflict_data.clone(),
                    detected_at: Utc::now(),
                });
                if state.queued.is_none() {
                    state.queued = Some(saved);
                }
                state.pending_changes = true;

                let mut event = self.event(AutoSaveEventKind::ConflictDetected);
                if let Some(remote) = &result.conflict_data {
                    event = event.with_data(remote.clone());
                }
                if let Some(error) = &result.error {
                    event = event.with_error(error.clone());
                }
                events.push(event);
            } else if result.is_success() {
                state.last_saved_seq = seq;
                state.last_saved_fingerprint = Some(saved.fingerprint);
                state.last_saved_snapshot = Some(saved.document.clone());
                state.last_saved_at = Some(result.timestamp);
                state.last_error = None;
                state.retry.reset();

                if state
                    .queued
                    .as_ref()
                    .is_some_and(|q| q.fingerprint == saved.fingerprint)
                {
                    state.queued = None;
                }
                state.pending_changes = state.queued.is_some();
                if state.online {
                    state.status = AutoSaveStatus::Saved;
                }

                info!(
                    form_id = %self.inner.form_id,
                    fingerprint = %saved.fingerprint,
                    "Save completed"
                );
                events.push(self.event(AutoSaveEventKind::SaveCompleted).with_data(json!({
                    "fingerprint": saved.fingerprint.to_hex(),
                    "data": result.data.clone().unwrap_or(Value::Null),
                })));
                fallback_write = Some((saved.document, false));

                if state.pending_changes && state.can_dispatch() && !state.busy() {
                    self.schedule_debounce(&mut state);
                }
            } else {
                let error = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "save failed".to_string());
                warn!(form_id = %self.inner.form_id, error = %error, "Save failed");

                state.last_error = Some(error.clone());
                state.pending_changes = true;

                // A later dispatch carries newer content and owns the outcome
                let overtaken = seq < state.next_seq;
                let superseded = state
                    .queued
                    .as_ref()
                    .is_some_and(|q| q.fingerprint != saved.fingerprint);
                if state.queued.is_none() && !overtaken {
                    state.queued = Some(saved.clone());
                }
                if state.online && !overtaken {
                    state.status = AutoSaveStatus::Error;
                }

                let will_retry = if overtaken {
                    debug!(form_id = %self.inner.form_id, seq, "Dropping failed save overtaken by a later one");
                    false
                } else if !state.can_dispatch() {
                    false
                } else if superseded {
                    // A newer edit arrived meanwhile; save that instead
                    if !state.busy() && !state.debounce.is_scheduled() {
                        self.schedule_debounce(&mut state);
                    }
                    true
                } else {
                    self.schedule_retry(&mut state)
                };

                if !will_retry && !overtaken {
                    warn!(
                        form_id = %self.inner.form_id,
                        attempts = state.retry.attempt() + 1,
                        "Giving up on remote save, keeping local copy"
                    );
                    fallback_write = Some((saved.document, true));
                }

                events.push(
                    self.event(AutoSaveEventKind::SaveFailed)
                        .with_error(error)
                        .with_data(json!({
                            "attempt": state.retry.attempt(),
                            "willRetry": will_retry,
                        })),
                );
            }
        }

        self.emit_all(events);
        if let Some((document, is_failover)) = fallback_write {
            self.write_fallback(&document, is_failover);
        }
    }

    /// Flush pending changes if nothing else is about to
    async fn flush_pending(&self) {
        let ready = {
            let state = self.lock();
            // Exhausted saves wait for the next edit or a forced save
            let gave_up = state.status == AutoSaveStatus::Error && state.retry.is_exhausted();
            state.pending_changes
                && state.queued.is_some()
                && state.can_dispatch()
                && !gave_up
                && !state.busy()
                && !state.debounce.is_scheduled()
                && !state.retry.is_scheduled()
        };
        if ready {
            debug!(form_id = %self.inner.form_id, "Interval flush");
            self.perform_save().await;
        }
    }

    fn start_interval(&self, period: std::time::Duration) {
        let weak = self.downgrade();
        let mut state = self.lock();
        state.interval.start(period, move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => {
                        AutoSaveEngine { inner }.flush_pending().await;
                        true
                    }
                    None => false,
                }
            }
        });
    }

    // ─── Connectivity ────────────────────────────────────────────────────

    /// Report a connectivity change
    pub fn set_online(&self, online: bool) {
        let mut events = Vec::new();
        let mut fallback_doc = None;

        {
            let mut state = self.lock();
            if state.disposed || state.online == online {
                return;
            }
            state.online = online;

            if online {
                info!(form_id = %self.inner.form_id, "Connectivity restored");
                state.retry.reset();
                if state.status == AutoSaveStatus::Offline {
                    state.status = AutoSaveStatus::Idle;
                }
                events.push(self.event(AutoSaveEventKind::OnlineRestored));

                if state.queued.is_some() && state.can_dispatch() && !state.busy() {
                    self.schedule_debounce(&mut state);
                }
            } else {
                info!(form_id = %self.inner.form_id, "Connectivity lost");
                state.debounce.cancel();
                state.retry.cancel();
                if state.status != AutoSaveStatus::Conflict {
                    state.status = AutoSaveStatus::Offline;
                }
                fallback_doc = state.queued.as_ref().map(|q| q.document.clone());
                events.push(self.event(AutoSaveEventKind::OfflineDetected));
            }
        }

        self.emit_all(events);
        if let Some(document) = fallback_doc {
            self.write_fallback(&document, true);
        }
    }

    pub fn is_online(&self) -> bool {
        self.lock().online
    }

    /// Follow a connectivity signal until the sender or the engine goes away
    pub fn watch_connectivity(&self, mut signal: watch::Receiver<bool>) -> JoinHandle<()> {
        let weak = self.downgrade();
        let initial = *signal.borrow_and_update();
        self.set_online(initial);

        tokio::spawn(async move {
            while signal.changed().await.is_ok() {
                let online = *signal.borrow_and_update();
                match weak.upgrade() {
                    Some(inner) => AutoSaveEngine { inner }.set_online(online),
                    None => break,
                }
            }
        })
    }

    // ─── Conflicts ───────────────────────────────────────────────────────

    /// Settle the current conflict with a resolution policy
    ///
    /// Returns the document the editor should show afterwards, or `None` if
    /// there was no conflict or the policy deferred.
    pub fn resolve_conflict(
        &self,
        resolver: &dyn ConflictResolver,
    ) -> Result<Option<FormDocument>, AutoSaveError> {
        let record = {
            let state = self.lock();
            if state.disposed {
                return Err(AutoSaveError::Disposed);
            }
            match &state.conflict {
                Some(record) => record.clone(),
                None => return Ok(None),
            }
        };

        // Resolver runs unlocked; it may prompt or inspect the engine
        let resolution = resolver.resolve(&record);

        let mut state = self.lock();
        if state.conflict.is_none() {
            return Ok(None);
        }

        let merged = match resolution {
            Resolution::Defer => return Ok(None),
            Resolution::KeepLocal => None,
            Resolution::Merged(merged) => Some(merged),
            Resolution::AcceptRemote(remote) => {
                info!(form_id = %self.inner.form_id, "Conflict resolved, accepting remote copy");
                let seq = state.dispatch();
                state.conflict = None;
                state.last_error = None;
                state.queued = None;
                state.pending_changes = false;
                state.last_saved_seq = seq;
                state.last_saved_fingerprint = Some(ChangeFingerprint::of(&remote));
                state.last_saved_snapshot = Some(remote.clone());
                state.last_saved_at = Some(Utc::now());
                state.retry.reset();
                state.status = if state.online {
                    AutoSaveStatus::Saved
                } else {
                    AutoSaveStatus::Offline
                };
                drop(state);

                self.inner.events.emit(
                    &self
                        .event(AutoSaveEventKind::SaveCompleted)
                        .with_data(json!({ "resolution": "accept-remote" })),
                );
                self.write_fallback(&remote, false);
                return Ok(Some(remote));
            }
        };

        let mut queued = match merged {
            Some(merged) => Queued::new(merged, SaveMetadata::new()),
            None => state
                .queued
                .take()
                .unwrap_or_else(|| Queued::new(record.local.clone(), SaveMetadata::new())),
        };
        queued.metadata.insert("overwrite".to_string(), Value::Bool(true));
        let document = queued.document.clone();

        info!(form_id = %self.inner.form_id, "Conflict resolved, overwriting remote copy");
        state.conflict = None;
        state.last_error = None;
        state.status = if state.online {
            AutoSaveStatus::Idle
        } else {
            AutoSaveStatus::Offline
        };
        state.pending_changes = true;
        state.queued = Some(queued);
        state.retry.reset();
        let dispatch = state.can_dispatch();
        drop(state);

        if dispatch {
            self.spawn_save();
        }
        Ok(Some(document))
    }

    pub fn conflict(&self) -> Option<ConflictRecord> {
        self.lock().conflict.clone()
    }

    // ─── Observation ─────────────────────────────────────────────────────

    pub fn state(&self) -> AutoSaveState {
        let state = self.lock();
        AutoSaveState {
            status: state.status,
            pending_changes: state.pending_changes,
            retry_count: state.retry.attempt(),
            last_saved_at: state.last_saved_at,
            last_saved_fingerprint: state.last_saved_fingerprint,
            last_error: state.last_error.clone(),
            conflict: state.conflict.clone(),
            is_online: state.online,
        }
    }

    pub fn status(&self) -> AutoSaveStatus {
        self.lock().status
    }

    pub fn has_pending_changes(&self) -> bool {
        self.lock().pending_changes
    }

    /// Last document the persistence layer accepted
    pub fn last_saved_snapshot(&self) -> Option<FormDocument> {
        self.lock().last_saved_snapshot.clone()
    }

    /// Treat `document` as already persisted (e.g. freshly loaded)
    pub fn mark_saved(&self, document: &FormDocument) {
        let mut state = self.lock();
        let seq = state.dispatch();
        state.last_saved_seq = seq;
        state.last_saved_fingerprint = Some(ChangeFingerprint::of(document));
        state.last_saved_snapshot = Some(document.clone());
    }

    pub fn add_event_listener<F>(&self, kind: AutoSaveEventKind, listener: F) -> ListenerId
    where
        F: Fn(&AutoSaveEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.events.add_listener(kind, listener)
    }

    pub fn remove_event_listener(&self, kind: AutoSaveEventKind, id: ListenerId) -> bool {
        self.inner.events.remove_listener(kind, id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutoSaveEvent> {
        self.inner.events.subscribe()
    }

    // ─── Teardown ────────────────────────────────────────────────────────

    /// Cancel every timer; later operations fail with `Disposed`
    ///
    /// A persistence call already in flight is left to finish, but its result
    /// is discarded.
    pub fn dispose(&self) {
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.debounce.cancel();
        state.retry.cancel();
        state.interval.cancel();
        debug!(form_id = %self.inner.form_id, "Auto-save disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }
}
