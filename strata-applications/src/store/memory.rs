//! In-memory storage backends for tests and embedded use.

use super::{DocumentStore, UserRecord, UserStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use strata_core::{already_exists_error, not_found_error};
use strata_core::{ConfigDocument, StrataResult};
use tokio::sync::RwLock;

const COMPONENT: &str = "memory_store";

/// Document store over a nested map, project -> document name -> document.
///
/// Paths returned by the mutating methods are synthetic; pair this store
/// with [`crate::vcs::NoopVersionControl`].
#[derive(Default)]
pub struct MemoryDocumentStore {
    projects: Arc<RwLock<HashMap<String, HashMap<String, ConfigDocument>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project with documents, creating it if needed.
    pub async fn seed(&self, project: &str, docs: Vec<ConfigDocument>) {
        let mut projects = self.projects.write().await;
        let entry = projects.entry(project.to_string()).or_default();
        for doc in docs {
            entry.insert(doc.name.clone(), doc);
        }
    }

    fn strip_extension(name: &str) -> &str {
        name.strip_suffix(".json").unwrap_or(name)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, project: &str, name: &str) -> StrataResult<ConfigDocument> {
        let name = Self::strip_extension(name);
        let projects = self.projects.read().await;
        projects
            .get(project)
            .and_then(|docs| docs.get(name))
            .cloned()
            .ok_or_else(|| not_found_error!(name, COMPONENT))
    }

    async fn save(
        &self,
        project: &str,
        name: &str,
        doc: &ConfigDocument,
    ) -> StrataResult<PathBuf> {
        let name = Self::strip_extension(name);
        let mut projects = self.projects.write().await;
        projects
            .entry(project.to_string())
            .or_default()
            .insert(name.to_string(), doc.clone());
        Ok(self.document_path(project, name))
    }

    async fn create(
        &self,
        project: &str,
        name: &str,
        doc: &ConfigDocument,
    ) -> StrataResult<PathBuf> {
        if self.exists(project, name).await {
            return Err(already_exists_error!(Self::strip_extension(name), COMPONENT));
        }
        self.save(project, name, doc).await
    }

    async fn delete(&self, project: &str, name: &str) -> StrataResult<PathBuf> {
        let name = Self::strip_extension(name);
        let mut projects = self.projects.write().await;
        let removed = projects
            .get_mut(project)
            .and_then(|docs| docs.remove(name));
        match removed {
            Some(_) => Ok(self.document_path(project, name)),
            None => Err(not_found_error!(name, COMPONENT)),
        }
    }

    async fn exists(&self, project: &str, name: &str) -> bool {
        let name = Self::strip_extension(name);
        let projects = self.projects.read().await;
        projects
            .get(project)
            .map(|docs| docs.contains_key(name))
            .unwrap_or(false)
    }

    async fn list_documents(&self, project: &str) -> StrataResult<Vec<String>> {
        let projects = self.projects.read().await;
        let mut names: Vec<String> = projects
            .get(project)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    async fn list_projects(&self) -> StrataResult<Vec<String>> {
        let projects = self.projects.read().await;
        let mut names: Vec<String> = projects.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_project(&self, project: &str) -> StrataResult<PathBuf> {
        let mut projects = self.projects.write().await;
        projects.entry(project.to_string()).or_default();
        Ok(self.project_dir(project))
    }

    async fn delete_project(&self, project: &str) -> StrataResult<()> {
        let mut projects = self.projects.write().await;
        projects.remove(project);
        Ok(())
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        PathBuf::from(project)
    }

    fn document_path(&self, project: &str, name: &str) -> PathBuf {
        PathBuf::from(project).join(format!("{}.json", Self::strip_extension(name)))
    }
}

/// User store over a plain map.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn load(&self, id: &str) -> StrataResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn save(&self, record: &UserRecord) -> StrataResult<()> {
        let mut users = self.users.write().await;
        users.insert(record.id.clone(), record.clone());
        Ok(())
    }
}
