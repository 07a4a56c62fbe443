//! Strata Applications - Authorization-aware configuration management
//!
//! This crate provides the application layer on top of the core domain
//! model. It composes four collaborators into one service:
//!
//! - the authorization gate from `strata-core`, consulted before every read
//!   and write
//! - document and user storage backends
//! - the settings resolver producing effective configuration views
//! - the version-control collaborator that publishes every mutation
//!
//! ## Architecture
//!
//! The layering is strict: **core** (pure domain) -> **applications** (this
//! crate) -> **presentation** (strata-web). Handlers never touch storage or
//! the permission tree directly; they hand a [`Principal`] to
//! [`StrataApplication`] and render what comes back.
//!
//! Authorization failures on data paths are silent by design: reads yield
//! empty collections or `None`, writes report that nothing changed. At the
//! API boundary a denied caller cannot distinguish denial from absence.

pub mod auth;
pub mod store;
pub mod vcs;

pub use auth::Principal;
pub use store::{
    DocumentStore, FileDocumentStore, FileUserStore, MemoryDocumentStore, MemoryUserStore,
    UserRecord, UserStore,
};
pub use vcs::{
    GitVersionControl, GitWorkspace, NoopVersionControl, NoopVersionControlProvider,
    VersionControl, VersionControlProvider,
};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use strata_core::not_found_error;
use strata_core::{
    authorize, resolve, resolve_cluster, AccessLevel, ClusterConfig, ConfigDocument,
    MachineConfig, ResourceRequest, StrataError,
};
use tracing::{debug, error, info};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Core error: {0}")]
    Core(#[from] StrataError),

    #[error("Permission error: {message}")]
    Permission { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create a permission error
    pub fn permission<S: Into<String>>(message: S) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the underlying cause is a missing document
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplicationError::Core(e) if e.is_not_found())
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one working copy per project
    pub projects_dir: PathBuf,
    /// Directory holding one record per user
    pub users_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata");
        Self::rooted(base_dir)
    }
}

impl StorageConfig {
    /// Derive the projects and users directories from one base directory.
    pub fn rooted<P: Into<PathBuf>>(base_dir: P) -> Self {
        let base_dir = base_dir.into();
        Self {
            projects_dir: base_dir.join("projects"),
            users_dir: base_dir.join("users"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct ApplicationConfig {
    /// Storage layout
    pub storage: StorageConfig,
    /// Emails granted the super-admin role
    pub super_admins: Vec<String>,
}

impl ApplicationConfig {
    pub fn rooted<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            storage: StorageConfig::rooted(base_dir),
            super_admins: Vec::new(),
        }
    }

    pub fn with_super_admins(mut self, emails: Vec<String>) -> Self {
        self.super_admins = emails;
        self
    }
}

/// Main Strata application service
pub struct StrataApplication {
    documents: Arc<dyn DocumentStore>,
    users: Arc<dyn UserStore>,
    vcs: Arc<dyn VersionControlProvider>,
    config: ApplicationConfig,
}

/// Builder for [`StrataApplication`] to simplify initialization
pub struct StrataApplicationBuilder {
    config: ApplicationConfig,
    documents: Option<Arc<dyn DocumentStore>>,
    users: Option<Arc<dyn UserStore>>,
    vcs: Option<Arc<dyn VersionControlProvider>>,
}

impl StrataApplicationBuilder {
    pub fn new(config: ApplicationConfig) -> Self {
        Self {
            config,
            documents: None,
            users: None,
            vcs: None,
        }
    }

    /// Override the document storage backend
    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(store);
        self
    }

    /// Override the user storage backend
    pub fn with_user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.users = Some(store);
        self
    }

    /// Override the version-control collaborator
    pub fn with_version_control(mut self, vcs: Arc<dyn VersionControlProvider>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    /// Build the application, defaulting to file storage and git publishing
    pub fn build(self) -> StrataApplication {
        let documents = self.documents.unwrap_or_else(|| {
            Arc::new(FileDocumentStore::new(
                self.config.storage.projects_dir.clone(),
            ))
        });
        let users = self
            .users
            .unwrap_or_else(|| Arc::new(FileUserStore::new(self.config.storage.users_dir.clone())));
        let vcs = self.vcs.unwrap_or_else(|| Arc::new(GitVersionControl));

        StrataApplication {
            documents,
            users,
            vcs,
            config: self.config,
        }
    }
}

impl StrataApplication {
    /// Create an application with the default file-backed collaborators
    pub fn new(config: ApplicationConfig) -> Self {
        StrataApplicationBuilder::new(config).build()
    }

    /// Create a builder for more advanced configuration
    pub fn builder(config: ApplicationConfig) -> StrataApplicationBuilder {
        StrataApplicationBuilder::new(config)
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    // ========================================
    // Principal resolution
    // ========================================

    /// Load (or create on first sight) the stored record for a principal id.
    pub async fn load_user(&self, id: &str) -> ApplicationResult<UserRecord> {
        Ok(self.users.load_or_create(id).await?)
    }

    /// Whether an email is in the configured super-admin set.
    pub fn is_super_admin(&self, email: Option<&str>) -> bool {
        match email {
            Some(email) => self.config.super_admins.iter().any(|a| a == email),
            None => false,
        }
    }

    // ========================================
    // Projects
    // ========================================

    /// Names of all projects.
    pub async fn list_projects(&self) -> ApplicationResult<Vec<String>> {
        Ok(self.documents.list_projects().await?)
    }

    /// Create a project by cloning its configuration repository.
    ///
    /// An existing project directory is left untouched.
    pub async fn create_project(
        &self,
        principal: &Principal,
        project: &str,
        git_url: &str,
    ) -> ApplicationResult<bool> {
        self.require_super_admin(principal)?;

        if self.documents.list_projects().await?.iter().any(|p| p == project) {
            return Ok(false);
        }

        let dir = self.documents.create_project(project).await?;
        VersionControlProvider::clone_into(&*self.vcs, git_url, &dir).await?;
        info!(project, "Created project");
        Ok(true)
    }

    /// Delete a project's working copy.
    pub async fn delete_project(
        &self,
        principal: &Principal,
        project: &str,
    ) -> ApplicationResult<()> {
        self.require_super_admin(principal)?;
        self.documents.delete_project(project).await?;
        info!(project, "Deleted project");
        Ok(())
    }

    /// Pull the latest configuration for a project from its origin.
    pub async fn update_project(
        &self,
        principal: &Principal,
        project: &str,
    ) -> ApplicationResult<()> {
        self.require_super_admin(principal)?;
        let dir = self.documents.project_dir(project);
        self.vcs.open(&dir)?.pull().await?;
        Ok(())
    }

    // ========================================
    // Configuration documents
    // ========================================

    /// Names of the documents in a project the principal may read.
    pub async fn list_document_names(
        &self,
        principal: &Principal,
        project: &str,
    ) -> ApplicationResult<Vec<String>> {
        let mut names = Vec::new();
        for name in self.documents.list_documents(project).await? {
            let request = ResourceRequest::configuration(project, &name, AccessLevel::READ);
            if authorize(&principal.access, &request) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// All documents in a project. Files that fail to parse are skipped with
    /// a logged error.
    pub async fn list_documents(
        &self,
        principal: &Principal,
        project: &str,
    ) -> ApplicationResult<Vec<ConfigDocument>> {
        self.require_super_admin(principal)?;

        let mut documents = Vec::new();
        for name in self.documents.list_documents(project).await? {
            match self.documents.load(project, &name).await {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    error!(project, name, error = %e, "Skipping unreadable document");
                    continue;
                }
            }
        }
        Ok(documents)
    }

    pub async fn get_document(
        &self,
        principal: &Principal,
        project: &str,
        name: &str,
    ) -> ApplicationResult<ConfigDocument> {
        self.require_super_admin(principal)?;
        Ok(self.documents.load(project, name).await?)
    }

    /// Create a new document. Colliding with an existing name is a hard
    /// failure.
    pub async fn create_document(
        &self,
        principal: &Principal,
        project: &str,
        name: &str,
        doc: ConfigDocument,
    ) -> ApplicationResult<()> {
        self.require_super_admin(principal)?;

        let path = self.documents.create(project, name, &doc).await?;
        let message = format!("Added new configuration: {} in {}", doc.name, project);
        self.publish(project, vec![path], message, principal, false)
            .await
    }

    /// Replace an existing document wholesale. A missing document is a hard
    /// failure.
    pub async fn update_document(
        &self,
        principal: &Principal,
        project: &str,
        name: &str,
        doc: ConfigDocument,
    ) -> ApplicationResult<()> {
        self.require_super_admin(principal)?;

        if !self.documents.exists(project, name).await {
            return Err(not_found_error!(name, "application").into());
        }

        let path = self.documents.save(project, name, &doc).await?;
        let message = format!("Updated configuration: {} in {}", doc.name, project);
        self.publish(project, vec![path], message, principal, false)
            .await
    }

    pub async fn delete_document(
        &self,
        principal: &Principal,
        project: &str,
        name: &str,
    ) -> ApplicationResult<()> {
        self.require_super_admin(principal)?;

        let path = self.documents.delete(project, name).await?;
        let message = format!("Deleted configuration {} from {}", name, project);
        self.publish(project, vec![path], message, principal, true)
            .await
    }

    // ========================================
    // Clusters
    // ========================================

    /// Cluster entries the principal may read. Denied clusters are simply
    /// absent from the result.
    pub async fn list_clusters(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
    ) -> ApplicationResult<Vec<ClusterConfig>> {
        let doc = self.documents.load(project, config).await?;
        let clusters = doc
            .clusters
            .iter()
            .filter(|cluster| {
                let request =
                    ResourceRequest::cluster(project, config, &cluster.name, AccessLevel::READ);
                authorize(&principal.access, &request)
            })
            .cloned()
            .collect();
        Ok(clusters)
    }

    /// Readable cluster names only.
    pub async fn list_cluster_names(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
    ) -> ApplicationResult<Vec<String>> {
        let clusters = self.list_clusters(principal, project, config).await?;
        Ok(clusters.into_iter().map(|c| c.name).collect())
    }

    /// Effective settings for a cluster: defaults overlaid with the cluster's
    /// own values. A denied or unknown cluster yields an empty map.
    pub async fn get_cluster(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        cluster: &str,
    ) -> ApplicationResult<HashMap<String, String>> {
        let request = ResourceRequest::cluster(project, config, cluster, AccessLevel::READ);
        if !authorize(&principal.access, &request) {
            debug!(project, config, cluster, "Cluster read denied");
            return Ok(HashMap::new());
        }

        let doc = self.documents.load(project, config).await?;
        Ok(resolve_cluster(&doc, cluster))
    }

    /// Add a cluster entry. Requires write access on the document; an
    /// existing entry with the same name is left untouched.
    pub async fn create_cluster(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        cluster: ClusterConfig,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, "Cluster create denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        let name = cluster.name.clone();
        if !doc.add_cluster(cluster) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!("Added cluster {} in {} in project {}", name, config, project);
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    /// Replace a cluster entry wholesale (full settings map, no patch).
    /// Requires write access on the cluster itself.
    pub async fn replace_cluster(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        cluster: ClusterConfig,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::cluster(project, config, &cluster.name, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, cluster = %cluster.name, "Cluster update denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        let name = cluster.name.clone();
        if !doc.replace_cluster(cluster) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!(
            "Updated cluster {} in {} in project {}",
            name, config, project
        );
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    pub async fn delete_cluster(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        cluster: &str,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::cluster(project, config, cluster, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, cluster, "Cluster delete denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        if !doc.remove_cluster(cluster) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!(
            "Removed cluster {} from {} in {}",
            cluster, config, project
        );
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    // ========================================
    // Machines
    // ========================================

    /// Machine names visible through the given cluster's read grant.
    pub async fn list_machine_names(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        cluster: &str,
    ) -> ApplicationResult<Vec<String>> {
        let doc = self.documents.load(project, config).await?;
        let names = doc
            .machines
            .iter()
            .filter(|machine| {
                let request = ResourceRequest::machine(
                    project,
                    config,
                    cluster,
                    &machine.name,
                    AccessLevel::READ,
                );
                authorize(&principal.access, &request)
            })
            .map(|machine| machine.name.clone())
            .collect();
        Ok(names)
    }

    /// Fully resolved settings for a machine: defaults, then the cluster,
    /// then the machine's own overrides. `None` when denied.
    pub async fn get_machine(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        cluster: &str,
        machine: &str,
    ) -> ApplicationResult<Option<HashMap<String, String>>> {
        let request = ResourceRequest::machine(project, config, cluster, machine, AccessLevel::READ);
        if !authorize(&principal.access, &request) {
            debug!(project, config, cluster, machine, "Machine read denied");
            return Ok(None);
        }

        let doc = self.documents.load(project, config).await?;
        Ok(Some(resolve(&doc, cluster, Some(machine))))
    }

    /// Add a machine entry. Machine writes authorize at the document level;
    /// machine entries are not tied to a cluster in storage.
    pub async fn create_machine(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        machine: MachineConfig,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, "Machine create denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        let name = machine.name.clone();
        if !doc.add_machine(machine) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!("Added new machine {} in {} in {}", name, config, project);
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    /// Replace a machine entry wholesale.
    pub async fn replace_machine(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        machine: MachineConfig,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, machine = %machine.name, "Machine update denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        let name = machine.name.clone();
        if !doc.replace_machine(machine) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!("Updated machine {} in {} in {}", name, config, project);
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    pub async fn delete_machine(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        machine: &str,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, machine, "Machine delete denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        if !doc.remove_machine(machine) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!("Removed machine {} from {} in {}", machine, config, project);
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    // ========================================
    // References
    // ========================================

    /// Names of the documents referenced by a configuration. Empty when the
    /// principal may not read the document.
    pub async fn list_references(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
    ) -> ApplicationResult<Vec<String>> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::READ);
        if !authorize(&principal.access, &request) {
            return Ok(Vec::new());
        }

        let doc = self.documents.load(project, config).await?;
        Ok(doc.references.iter().map(|r| r.jar.clone()).collect())
    }

    /// Reference another document from this configuration.
    ///
    /// The referenced document must exist and be readable by the principal;
    /// a dangling reference is a hard failure.
    pub async fn add_reference(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        reference: &str,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, reference, "Reference create denied");
            return Ok(false);
        }

        if !self.documents.exists(project, reference).await {
            return Err(not_found_error!(reference, "application").into());
        }

        let read_request = ResourceRequest::configuration(project, reference, AccessLevel::READ);
        if !authorize(&principal.access, &read_request) {
            debug!(project, config, reference, "Referenced document not readable");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        if !doc.add_reference(reference) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!(
            "Added new reference {} to configuration: {} in {}",
            reference, config, project
        );
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    pub async fn remove_reference(
        &self,
        principal: &Principal,
        project: &str,
        config: &str,
        reference: &str,
    ) -> ApplicationResult<bool> {
        let request = ResourceRequest::configuration(project, config, AccessLevel::WRITE);
        if !authorize(&principal.access, &request) {
            debug!(project, config, reference, "Reference delete denied");
            return Ok(false);
        }

        let mut doc = self.documents.load(project, config).await?;
        if !doc.remove_reference(reference) {
            return Ok(false);
        }

        let path = self.documents.save(project, config, &doc).await?;
        let message = format!(
            "Removed reference {} from configuration: {} in {}",
            reference, config, project
        );
        self.publish(project, vec![path], message, principal, false)
            .await?;
        Ok(true)
    }

    // ========================================
    // Internals
    // ========================================

    fn require_super_admin(&self, principal: &Principal) -> ApplicationResult<()> {
        if principal.super_admin {
            Ok(())
        } else {
            Err(ApplicationError::permission(format!(
                "Principal {} does not hold the superAdmin role",
                principal.id
            )))
        }
    }

    /// Publish a mutation: stage (or record removal of) the touched paths,
    /// commit with the principal as author, push. Failures propagate; the
    /// already-written file stays on disk.
    async fn publish(
        &self,
        project: &str,
        paths: Vec<PathBuf>,
        message: String,
        principal: &Principal,
        removed: bool,
    ) -> ApplicationResult<()> {
        let dir = self.documents.project_dir(project);
        let vcs = self.vcs.open(&dir)?;

        if removed {
            vcs.remove(&paths).await?;
        } else {
            vcs.stage(&paths).await?;
        }
        vcs.commit(&message, principal.author_name(), principal.author_email())
            .await?;
        vcs.push().await?;

        info!(project, %message, "Published configuration change");
        Ok(())
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        ApplicationConfig, ApplicationError, ApplicationResult, Principal, StorageConfig,
        StrataApplication,
    };
}
