/// Integration tests for edit → history → auto-save wiring
use async_trait::async_trait;
use formsync_autosave::{
    AutoSaveConfig, AutoSaveEngine, AutoSaveError, AutoSaveStatus, OfflineFallbackStore,
    Persistence, PreferRemote, SaveMetadata, SaveResult,
};
use formsync_editor::{
    EditorError, ElementKind, FormDocument, FormElement, HistoryDirection, Mutation, UndoRedoManager,
};
use formsync_workspace::{SyncCoordinator, SyncError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
struct RecordingPersistence {
    saved: Mutex<Vec<(FormDocument, SaveMetadata)>>,
    script: Mutex<VecDeque<SaveResult>>,
}

impl RecordingPersistence {
    fn with_script(results: Vec<SaveResult>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(results.into()),
            ..Self::default()
        })
    }

    fn titles(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(doc, _)| doc.title.clone())
            .collect()
    }

    fn sources(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(_, meta)| meta["source"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl Persistence for RecordingPersistence {
    async fn save(&self, document: &FormDocument, metadata: &SaveMetadata) -> SaveResult {
        self.saved
            .lock()
            .unwrap()
            .push((document.clone(), metadata.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(SaveResult::ok)
    }
}

fn registration_form(title: &str) -> FormDocument {
    FormDocument::new("registration", title)
        .with_element(FormElement::new("name", ElementKind::Text, "Full name"))
        .with_element(FormElement::new("email", ElementKind::Email, "Email"))
        .with_element(FormElement::new("notes", ElementKind::Textarea, "Notes"))
}

fn setup(persistence: Arc<RecordingPersistence>) -> SyncCoordinator {
    let engine = AutoSaveEngine::builder("registration")
        .config(AutoSaveConfig::default().with_debounce_ms(100))
        .fallback(OfflineFallbackStore::in_memory())
        .build(persistence);
    SyncCoordinator::new(registration_form("Registration"), engine, UndoRedoManager::new())
}

fn retitled(coordinator: &SyncCoordinator, title: &str) -> FormDocument {
    let mut doc = coordinator.document().clone();
    doc.title = title.to_string();
    doc
}

#[tokio::test(start_paused = true)]
async fn test_noop_edit_records_and_saves_nothing() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());

    let mut same = coordinator.document().clone();
    same.ui.selected_element = Some("email".into());
    assert!(!coordinator.apply_edit(same, "Select email").unwrap());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(coordinator.history_stats().total, 0);
    assert!(persistence.titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_edit_records_one_command_and_one_save() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());

    let edited = retitled(&coordinator, "Event registration");
    assert!(coordinator.apply_edit(edited, "Rename form").unwrap());
    assert_eq!(coordinator.history_stats().undo_available, 1);
    assert_eq!(
        coordinator.history().undo_description(),
        Some("Rename form")
    );

    sleep(Duration::from_millis(200)).await;
    assert_eq!(persistence.titles(), vec!["Event registration"]);
    assert_eq!(coordinator.save_status(), AutoSaveStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn test_undo_and_redo_are_saved_like_edits() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());

    let edited = retitled(&coordinator, "Renamed");
    coordinator.apply_edit(edited, "Rename form").unwrap();
    sleep(Duration::from_millis(200)).await;

    let outcome = coordinator.undo().unwrap();
    assert_eq!(outcome.description, "Rename form");
    assert_eq!(coordinator.document().title, "Registration");
    sleep(Duration::from_millis(200)).await;

    coordinator.redo().unwrap();
    assert_eq!(coordinator.document().title, "Renamed");
    sleep(Duration::from_millis(200)).await;

    assert_eq!(persistence.titles(), vec!["Renamed", "Registration", "Renamed"]);
    assert_eq!(persistence.sources(), vec!["edit", "undo", "redo"]);
    // Undo/redo never add history entries
    assert_eq!(coordinator.history_stats().total, 1);
}

#[tokio::test(start_paused = true)]
async fn test_drag_gesture_is_one_command() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());
    let original = coordinator.document().clone();

    coordinator.begin_gesture("Drag notes to top");
    for index in (0..2).rev() {
        coordinator
            .apply_mutation(Mutation::MoveElement {
                element_id: "notes".into(),
                index,
            })
            .unwrap();
    }
    assert!(coordinator.end_gesture());

    assert_eq!(coordinator.document().elements[0].id.as_str(), "notes");
    assert_eq!(coordinator.history_stats().undo_available, 1);

    sleep(Duration::from_millis(200)).await;
    // Intermediate positions collapse into a single save
    assert_eq!(persistence.titles().len(), 1);

    coordinator.undo().unwrap();
    assert_eq!(coordinator.document().elements, original.elements);
}

#[tokio::test(start_paused = true)]
async fn test_edit_of_another_form_is_rejected() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());
    let before = coordinator.fingerprint();

    let foreign = FormDocument::new("payroll", "Payroll");
    let result = coordinator.apply_edit(foreign, "Paste form");
    assert!(matches!(result, Err(SyncError::FormMismatch { .. })));
    assert_eq!(coordinator.document().id.as_str(), "registration");
    assert_eq!(coordinator.fingerprint(), before);
    assert_eq!(coordinator.history_stats().total, 0);

    sleep(Duration::from_secs(1)).await;
    assert!(persistence.titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_mutation_changes_nothing() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());
    let before = coordinator.fingerprint();

    let result = coordinator.apply_mutation(Mutation::RemoveElement {
        element_id: "missing".into(),
    });
    assert!(matches!(result, Err(SyncError::Mutation(_))));
    assert_eq!(coordinator.fingerprint(), before);
    assert_eq!(coordinator.history_stats().total, 0);

    sleep(Duration::from_secs(1)).await;
    assert!(persistence.titles().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_undo_on_fresh_session_fails_cleanly() {
    let mut coordinator = setup(Arc::new(RecordingPersistence::default()));
    let before = coordinator.document().clone();

    match coordinator.undo() {
        Err(SyncError::Editor(EditorError::EmptyHistory(HistoryDirection::Undo))) => {}
        other => panic!("unexpected result: {:?}", other.map(|o| o.description)),
    }
    assert_eq!(coordinator.document(), &before);
}

#[tokio::test(start_paused = true)]
async fn test_recover_adopts_local_copy_as_undoable_edit() {
    let persistence = Arc::new(RecordingPersistence::default());
    let coordinator = setup(persistence.clone());
    let store = coordinator.engine().fallback().unwrap().clone();

    // Left behind by a previous session
    store.save(&retitled(&coordinator, "Unsaved work"), true);

    let mut coordinator = coordinator;
    let candidate = coordinator.recovery_candidate().unwrap();
    assert!(candidate.is_failover);

    assert!(coordinator.recover().unwrap());
    assert_eq!(coordinator.document().title, "Unsaved work");
    assert!(coordinator.recovery_candidate().is_none());
    assert!(coordinator.can_undo());

    sleep(Duration::from_millis(200)).await;
    assert_eq!(persistence.sources(), vec!["recovery"]);
}

#[tokio::test(start_paused = true)]
async fn test_matching_local_copy_is_not_a_candidate() {
    let coordinator = setup(Arc::new(RecordingPersistence::default()));
    let store = coordinator.engine().fallback().unwrap().clone();
    store.save(coordinator.document(), false);

    assert!(coordinator.recovery_candidate().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_accepting_remote_is_undoable() {
    let remote = serde_json::to_value(registration_form("Edited by a teammate")).unwrap();
    let persistence = RecordingPersistence::with_script(vec![SaveResult::conflicted(Some(remote))]);
    let mut coordinator = setup(persistence.clone());

    let edited = retitled(&coordinator, "Mine");
    coordinator.apply_edit(edited, "Rename form").unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(coordinator.status().status, AutoSaveStatus::Conflict);
    assert!(coordinator.status().has_conflict);

    assert!(coordinator.resolve_conflict(&PreferRemote).unwrap());
    assert_eq!(coordinator.document().title, "Edited by a teammate");
    assert_eq!(coordinator.save_status(), AutoSaveStatus::Saved);

    coordinator.undo().unwrap();
    assert_eq!(coordinator.document().title, "Mine");
}

#[tokio::test(start_paused = true)]
async fn test_status_combines_save_and_history() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence);

    coordinator
        .apply_mutation(Mutation::SetTitle {
            title: "Sign-up".into(),
        })
        .unwrap();
    let status = coordinator.status();
    assert!(status.pending_changes);
    assert_eq!(status.history.undo_available, 1);
    assert_eq!(status.fingerprint, coordinator.fingerprint().to_hex());

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["status"], "idle");
    assert_eq!(json["history"]["undoAvailable"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_save_skips_debounce() {
    let persistence = Arc::new(RecordingPersistence::default());
    let mut coordinator = setup(persistence.clone());

    coordinator
        .apply_edit(retitled(&coordinator, "Now"), "Rename form")
        .unwrap();
    let result = coordinator.force_save().await.unwrap();
    assert!(result.success);
    assert_eq!(persistence.titles(), vec!["Now"]);
}

#[tokio::test(start_paused = true)]
async fn test_disposed_session_keeps_history_intact() {
    let mut coordinator = setup(Arc::new(RecordingPersistence::default()));
    coordinator
        .apply_edit(retitled(&coordinator, "Renamed"), "Rename form")
        .unwrap();
    coordinator.dispose();

    assert!(matches!(
        coordinator.undo(),
        Err(SyncError::AutoSave(AutoSaveError::Disposed))
    ));
    assert_eq!(coordinator.document().title, "Renamed");
    assert!(coordinator.can_undo());
}
