//! File-backed storage
//!
//! Documents live inside each project's working copy under
//! `src/<project>.Configuration/public/`, one pretty-printed JSON file per
//! document, so the version-control collaborator can track every change.
//! Users live under a flat users directory, one JSON file per principal id.

use super::{DocumentStore, UserRecord, UserStore};
use async_trait::async_trait;
use std::path::PathBuf;
use strata_core::{already_exists_error, not_found_error, storage_error};
use strata_core::{ConfigDocument, StrataResult};
use tracing::debug;

const COMPONENT: &str = "file_store";

/// Document store over the on-disk project layout.
pub struct FileDocumentStore {
    projects_dir: PathBuf,
}

impl FileDocumentStore {
    pub fn new<P: Into<PathBuf>>(projects_dir: P) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    fn ensure_json_extension(name: &str) -> String {
        if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{}.json", name)
        }
    }

    fn public_dir(&self, project: &str) -> PathBuf {
        self.projects_dir
            .join(project)
            .join("src")
            .join(format!("{}.Configuration", project))
            .join("public")
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, project: &str, name: &str) -> StrataResult<ConfigDocument> {
        let path = self.document_path(project, name);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(not_found_error!(name, COMPONENT));
            }
            Err(e) => return Err(e.into()),
        };

        let doc = serde_json::from_str(&raw)?;
        Ok(doc)
    }

    async fn save(
        &self,
        project: &str,
        name: &str,
        doc: &ConfigDocument,
    ) -> StrataResult<PathBuf> {
        let path = self.document_path(project, name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let raw = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&path, raw).await?;
        debug!(project, name, "Saved configuration document");
        Ok(path)
    }

    async fn create(
        &self,
        project: &str,
        name: &str,
        doc: &ConfigDocument,
    ) -> StrataResult<PathBuf> {
        if self.exists(project, name).await {
            return Err(already_exists_error!(name, COMPONENT));
        }
        self.save(project, name, doc).await
    }

    async fn delete(&self, project: &str, name: &str) -> StrataResult<PathBuf> {
        let path = self.document_path(project, name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(not_found_error!(name, COMPONENT))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, project: &str, name: &str) -> bool {
        tokio::fs::try_exists(self.document_path(project, name))
            .await
            .unwrap_or(false)
    }

    async fn list_documents(&self, project: &str) -> StrataResult<Vec<String>> {
        let dir = self.public_dir(project);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn list_projects(&self) -> StrataResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.projects_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name != ".git" {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn create_project(&self, project: &str) -> StrataResult<PathBuf> {
        let dir = self.project_dir(project);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    async fn delete_project(&self, project: &str) -> StrataResult<()> {
        let dir = self.project_dir(project);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.projects_dir.join(project)
    }

    fn document_path(&self, project: &str, name: &str) -> PathBuf {
        self.public_dir(project)
            .join(Self::ensure_json_extension(name))
    }
}

/// User store over a flat directory: `<users_dir>/<id>/<id>.json`.
pub struct FileUserStore {
    users_dir: PathBuf,
}

impl FileUserStore {
    pub fn new<P: Into<PathBuf>>(users_dir: P) -> Self {
        Self {
            users_dir: users_dir.into(),
        }
    }

    fn user_path(&self, id: &str) -> PathBuf {
        self.users_dir.join(id).join(format!("{}.json", id))
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn load(&self, id: &str) -> StrataResult<Option<UserRecord>> {
        let path = self.user_path(id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_str(&raw)?;
        Ok(Some(record))
    }

    async fn save(&self, record: &UserRecord) -> StrataResult<()> {
        if record.id.is_empty() {
            return Err(storage_error!("Cannot persist a user without an id", COMPONENT));
        }
        let path = self.user_path(&record.id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let raw = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, raw).await?;
        debug!(user = %record.id, "Saved user record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{AccessLevel, AccessRule, ClusterConfig, StrataError};

    fn sample_document() -> ConfigDocument {
        let mut doc = ConfigDocument::new("billing");
        doc.defaults.insert("timeout".to_string(), "30".to_string());
        doc.add_cluster(ClusterConfig::new("prod", Default::default()));
        doc
    }

    #[tokio::test]
    async fn document_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::new(root.path());

        let doc = sample_document();
        store.create("acme", "billing", &doc).await.unwrap();

        let loaded = store.load("acme", "billing").await.unwrap();
        assert_eq!(doc, loaded);
        assert_eq!(
            store.list_documents("acme").await.unwrap(),
            vec!["billing".to_string()]
        );
    }

    #[tokio::test]
    async fn layout_matches_the_project_convention() {
        let root = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::new(root.path());

        let path = store.document_path("acme", "billing");
        let expected = root
            .path()
            .join("acme/src/acme.Configuration/public/billing.json");
        assert_eq!(path, expected);

        // Names that already carry the extension are not doubled up.
        assert_eq!(store.document_path("acme", "billing.json"), expected);
    }

    #[tokio::test]
    async fn load_of_missing_document_names_the_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::new(root.path());

        let err = store.load("acme", "billing").await.unwrap_err();
        assert!(matches!(err, StrataError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "There is no configuration file: billing"
        );
    }

    #[tokio::test]
    async fn create_refuses_collisions() {
        let root = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::new(root.path());

        let doc = sample_document();
        store.create("acme", "billing", &doc).await.unwrap();
        let err = store.create("acme", "billing", &doc).await.unwrap_err();
        assert!(matches!(err, StrataError::AlreadyExists { .. }));
        assert_eq!(
            err.to_string(),
            "There is already a configuration file: billing"
        );
    }

    #[tokio::test]
    async fn project_listing_skips_git_internals() {
        let root = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::new(root.path());

        store.create_project("acme").await.unwrap();
        tokio::fs::create_dir_all(root.path().join(".git"))
            .await
            .unwrap();

        assert_eq!(
            store.list_projects().await.unwrap(),
            vec!["acme".to_string()]
        );
    }

    #[tokio::test]
    async fn user_records_round_trip_with_access_tree() {
        let root = tempfile::tempdir().unwrap();
        let store = FileUserStore::new(root.path());

        let mut record = UserRecord::new("google-oauth2|1234");
        record.email = Some("dev@example.com".to_string());
        record.access.add_rule(&AccessRule {
            project: "acme".to_string(),
            application: "billing".to_string(),
            cluster: "prod".to_string(),
            access: AccessLevel::WRITE,
        });
        store.save(&record).await.unwrap();

        let loaded = store.load("google-oauth2|1234").await.unwrap().unwrap();
        assert_eq!(loaded.email, record.email);
        assert_eq!(loaded.access, record.access);
    }

    #[tokio::test]
    async fn load_or_create_persists_a_fresh_record() {
        let root = tempfile::tempdir().unwrap();
        let store = FileUserStore::new(root.path());

        assert!(store.load("new-user").await.unwrap().is_none());
        let record = store.load_or_create("new-user").await.unwrap();
        assert_eq!(record.id, "new-user");
        assert!(store.load("new-user").await.unwrap().is_some());
    }
}
