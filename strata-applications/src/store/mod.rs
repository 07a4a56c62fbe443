//! Storage backends
//!
//! Document and user persistence behind async traits so the service can run
//! against the file layout in production and an in-memory map in tests.

pub mod file;
pub mod memory;

pub use file::{FileDocumentStore, FileUserStore};
pub use memory::{MemoryDocumentStore, MemoryUserStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strata_core::{ConfigDocument, SecurityAccess, StrataResult};

/// Document storage collaborator.
///
/// Mutating methods return the path of the affected file so callers can hand
/// it to the version-control collaborator for staging. Load/save is whole
/// document read-modify-write; two concurrent writers to the same document
/// race and the last write wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document. Fails with a not-found error when the document does
    /// not exist.
    async fn load(&self, project: &str, name: &str) -> StrataResult<ConfigDocument>;

    /// Write a document, creating parent directories as needed.
    async fn save(&self, project: &str, name: &str, doc: &ConfigDocument)
        -> StrataResult<PathBuf>;

    /// Write a new document. Fails with an already-exists error when a
    /// document with that name is present.
    async fn create(
        &self,
        project: &str,
        name: &str,
        doc: &ConfigDocument,
    ) -> StrataResult<PathBuf>;

    /// Delete a document. Fails with a not-found error when absent.
    async fn delete(&self, project: &str, name: &str) -> StrataResult<PathBuf>;

    async fn exists(&self, project: &str, name: &str) -> bool;

    /// Names of all documents in a project, without the `.json` extension.
    /// A missing project yields an empty list.
    async fn list_documents(&self, project: &str) -> StrataResult<Vec<String>>;

    /// Names of all projects, skipping version-control internals.
    async fn list_projects(&self) -> StrataResult<Vec<String>>;

    /// Create the project directory. Returns its path; an existing project
    /// is left untouched.
    async fn create_project(&self, project: &str) -> StrataResult<PathBuf>;

    async fn delete_project(&self, project: &str) -> StrataResult<()>;

    /// Root directory of a project's working copy.
    fn project_dir(&self, project: &str) -> PathBuf;

    /// Path of a document inside the project layout:
    /// `<project>/src/<project>.Configuration/public/<name>.json`.
    fn document_path(&self, project: &str, name: &str) -> PathBuf;
}

/// Persisted per-user record: identity attributes plus the permission tree
/// that is serialized into the `SecurityAccess` claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub access: SecurityAccess,
}

impl UserRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }
}

/// User storage collaborator: one JSON document per user, keyed by principal
/// id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load(&self, id: &str) -> StrataResult<Option<UserRecord>>;

    async fn save(&self, record: &UserRecord) -> StrataResult<()>;

    /// Load a user, creating and persisting an empty record on first sight.
    async fn load_or_create(&self, id: &str) -> StrataResult<UserRecord> {
        if let Some(record) = self.load(id).await? {
            return Ok(record);
        }
        let record = UserRecord::new(id);
        self.save(&record).await?;
        Ok(record)
    }
}
