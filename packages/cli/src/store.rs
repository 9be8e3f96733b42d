//! Directory-backed persistence
//!
//! Each form lives in `<dir>/<form id>.json` as `{ "revision": n, "document": {...} }`.
//! The store remembers the last revision this process read or wrote per form;
//! a save made against an older revision is reported as a conflict carrying
//! the stored document, unless the save metadata asks to overwrite.

use async_trait::async_trait;
use formsync_autosave::{file_name_for, Persistence, SaveMetadata, SaveResult};
use formsync_editor::{FormDocument, FormId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredForm {
    pub revision: u64,
    pub document: FormDocument,
}

pub struct DirectoryStore {
    dir: PathBuf,
    known: Mutex<HashMap<FormId, u64>>,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            known: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, form_id: &FormId) -> PathBuf {
        self.dir.join(file_name_for(form_id))
    }

    /// Read a form and remember its revision as seen
    pub async fn load(&self, form_id: &FormId) -> anyhow::Result<Option<StoredForm>> {
        let Some(stored) = self.read(form_id).await? else {
            return Ok(None);
        };
        self.remember(form_id, stored.revision);
        Ok(Some(stored))
    }

    async fn read(&self, form_id: &FormId) -> anyhow::Result<Option<StoredForm>> {
        let path = self.path_for(form_id);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    async fn write(&self, stored: &StoredForm) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&stored.document.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(stored)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn known_revision(&self, form_id: &FormId) -> u64 {
        self.known
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(form_id)
            .copied()
            .unwrap_or(0)
    }

    fn remember(&self, form_id: &FormId, revision: u64) {
        self.known
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(form_id.clone(), revision);
    }

    async fn try_save(&self, document: &FormDocument, metadata: &SaveMetadata) -> anyhow::Result<SaveResult> {
        let stored = self.read(&document.id).await?;
        let current = stored.as_ref().map_or(0, |s| s.revision);
        let known = self.known_revision(&document.id);
        let overwrite = metadata.get("overwrite").and_then(Value::as_bool).unwrap_or(false);

        if current != known && !overwrite {
            debug!(form_id = %document.id, current, known, "Stale revision");
            // The remote copy has now been seen; a deliberate retry may overwrite it
            self.remember(&document.id, current);
            let remote = stored.map(|s| serde_json::to_value(s.document)).transpose()?;
            return Ok(SaveResult::conflicted(remote));
        }

        let revision = current + 1;
        self.write(&StoredForm {
            revision,
            document: document.clone(),
        })
        .await?;
        self.remember(&document.id, revision);
        Ok(SaveResult::ok_with(json!({ "revision": revision })))
    }
}

#[async_trait]
impl Persistence for DirectoryStore {
    async fn save(&self, document: &FormDocument, metadata: &SaveMetadata) -> SaveResult {
        match self.try_save(document, metadata).await {
            Ok(result) => result,
            Err(e) => {
                warn!(form_id = %document.id, error = %e, "Directory store write failed");
                SaveResult::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str) -> FormDocument {
        FormDocument::new("signup", title)
    }

    #[tokio::test]
    async fn test_revisions_increase() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        let first = store.save(&form("One"), &SaveMetadata::new()).await;
        assert!(first.is_success());
        assert_eq!(first.data.unwrap()["revision"], 1);

        let second = store.save(&form("Two"), &SaveMetadata::new()).await;
        assert_eq!(second.data.unwrap()["revision"], 2);

        let stored = store.load(&FormId::from("signup")).await.unwrap().unwrap();
        assert_eq!(stored.revision, 2);
        assert_eq!(stored.document.title, "Two");
    }

    #[tokio::test]
    async fn test_concurrent_writer_causes_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let ours = DirectoryStore::new(dir.path());
        let theirs = DirectoryStore::new(dir.path());

        assert!(ours.save(&form("Base"), &SaveMetadata::new()).await.is_success());
        theirs.load(&FormId::from("signup")).await.unwrap();
        assert!(theirs.save(&form("Theirs"), &SaveMetadata::new()).await.is_success());

        let result = ours.save(&form("Ours"), &SaveMetadata::new()).await;
        assert!(result.is_conflict());
        let remote: FormDocument = serde_json::from_value(result.conflict_data.unwrap()).unwrap();
        assert_eq!(remote.title, "Theirs");

        // Conflicting copy is now known, so the next save goes through
        assert!(ours.save(&form("Ours"), &SaveMetadata::new()).await.is_success());
    }

    #[tokio::test]
    async fn test_overwrite_skips_revision_check() {
        let dir = tempfile::tempdir().unwrap();
        let first = DirectoryStore::new(dir.path());
        assert!(first.save(&form("Existing"), &SaveMetadata::new()).await.is_success());

        let fresh = DirectoryStore::new(dir.path());
        let mut metadata = SaveMetadata::new();
        metadata.insert("overwrite".to_string(), Value::Bool(true));
        let result = fresh.save(&form("Forced"), &metadata).await;

        assert!(result.is_success());
        assert_eq!(result.data.unwrap()["revision"], 2);
    }

    #[tokio::test]
    async fn test_similar_ids_use_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());

        let dotted = FormDocument::new("a.b", "Dotted");
        let underscored = FormDocument::new("a_b", "Underscored");
        assert!(store.save(&dotted, &SaveMetadata::new()).await.is_success());
        assert!(store.save(&underscored, &SaveMetadata::new()).await.is_success());

        let stored = store.load(&FormId::from("a.b")).await.unwrap().unwrap();
        assert_eq!(stored.document.title, "Dotted");
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path());
        std::fs::write(store.path_for(&FormId::from("signup")), b"garbage").unwrap();

        let result = store.save(&form("Any"), &SaveMetadata::new()).await;
        assert!(!result.is_success());
        assert!(!result.is_conflict());
        assert!(result.error.is_some());
    }
}
