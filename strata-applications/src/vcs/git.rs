//! git2-backed version control
//!
//! Each call opens the repository fresh inside a blocking task; nothing
//! git-related is held across await points.

use super::{VersionControl, VersionControlProvider};
use async_trait::async_trait;
use git2::Repository;
use std::path::{Path, PathBuf};
use strata_core::git_error;
use strata_core::{ErrorContext, StrataError, StrataResult};
use tracing::{debug, info};

const COMPONENT: &str = "git";

/// Run a blocking git2 closure on the blocking pool and translate errors.
async fn run_git<F, T>(task: F) -> StrataResult<T>
where
    F: FnOnce() -> Result<T, git2::Error> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StrataError::Internal {
            message: format!("git task failed to complete: {}", e),
            source: None,
            context: ErrorContext::new(COMPONENT),
        })?;

    joined.map_err(|e| {
        let message = e.message().to_string();
        git_error!(message, COMPONENT, e)
    })
}

/// Working copy of one project.
pub struct GitWorkspace {
    dir: PathBuf,
}

impl GitWorkspace {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn relative<'a>(dir: &Path, path: &'a Path) -> &'a Path {
        path.strip_prefix(dir).unwrap_or(path)
    }
}

#[async_trait]
impl VersionControl for GitWorkspace {
    async fn stage(&self, paths: &[PathBuf]) -> StrataResult<()> {
        let dir = self.dir.clone();
        let paths = paths.to_vec();
        run_git(move || {
            let repo = Repository::open(&dir)?;
            let mut index = repo.index()?;
            for path in &paths {
                index.add_path(Self::relative(&dir, path))?;
            }
            index.write()
        })
        .await
    }

    async fn remove(&self, paths: &[PathBuf]) -> StrataResult<()> {
        let dir = self.dir.clone();
        let paths = paths.to_vec();
        run_git(move || {
            let repo = Repository::open(&dir)?;
            let mut index = repo.index()?;
            for path in &paths {
                index.remove_path(Self::relative(&dir, path))?;
            }
            index.write()
        })
        .await
    }

    async fn commit(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
    ) -> StrataResult<()> {
        let dir = self.dir.clone();
        let message = message.to_string();
        let author_name = author_name.to_string();
        let author_email = author_email.to_string();
        run_git(move || {
            let repo = Repository::open(&dir)?;
            let mut index = repo.index()?;
            let tree_id = index.write_tree()?;
            let tree = repo.find_tree(tree_id)?;
            let signature = git2::Signature::now(&author_name, &author_email)?;

            // An unborn branch has no parent commit.
            let parent = repo
                .head()
                .ok()
                .and_then(|head| head.target())
                .and_then(|oid| repo.find_commit(oid).ok());
            let parents: Vec<&git2::Commit> = parent.iter().collect();

            let oid = repo.commit(
                Some("HEAD"),
                &signature,
                &signature,
                &message,
                &tree,
                &parents,
            )?;
            debug!(commit = %oid, "Created commit");
            Ok(())
        })
        .await
    }

    async fn push(&self) -> StrataResult<()> {
        let dir = self.dir.clone();
        run_git(move || {
            let repo = Repository::open(&dir)?;
            let branch = repo
                .head()?
                .shorthand()
                .unwrap_or("master")
                .to_string();
            let mut remote = repo.find_remote("origin")?;
            let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
            remote.push(&[refspec.as_str()], None)?;
            info!(branch, "Pushed to origin");
            Ok(())
        })
        .await
    }

    async fn pull(&self) -> StrataResult<()> {
        let dir = self.dir.clone();
        run_git(move || {
            let repo = Repository::open(&dir)?;
            let mut remote = repo.find_remote("origin")?;
            remote.fetch(&[] as &[&str], None, None)?;

            let fetch_head = repo.find_reference("FETCH_HEAD")?;
            let fetched = repo.reference_to_annotated_commit(&fetch_head)?;
            let (analysis, _) = repo.merge_analysis(&[&fetched])?;

            if analysis.is_up_to_date() {
                return Ok(());
            }
            if !analysis.is_fast_forward() {
                return Err(git2::Error::from_str(
                    "refusing to pull: local history has diverged from origin",
                ));
            }

            let head_name = repo
                .head()?
                .name()
                .map(str::to_string)
                .ok_or_else(|| git2::Error::from_str("HEAD reference is not valid utf-8"))?;
            let mut reference = repo.find_reference(&head_name)?;
            reference.set_target(fetched.id(), "fast-forward")?;
            repo.set_head(&head_name)?;
            repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
            info!("Fast-forwarded to origin");
            Ok(())
        })
        .await
    }
}

/// Provider handing out [`GitWorkspace`] instances.
pub struct GitVersionControl;

#[async_trait]
impl VersionControlProvider for GitVersionControl {
    fn open(&self, dir: &Path) -> StrataResult<Box<dyn VersionControl>> {
        Ok(Box::new(GitWorkspace::new(dir)))
    }

    async fn clone_into(&self, url: &str, dir: &Path) -> StrataResult<()> {
        let url = url.to_string();
        let dir = dir.to_path_buf();
        run_git(move || {
            Repository::clone(&url, &dir)?;
            info!(%url, "Cloned project repository");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stage_commit_cycle_in_a_fresh_repository() {
        let root = tempfile::tempdir().unwrap();
        Repository::init(root.path()).unwrap();

        let file = root.path().join("settings.json");
        tokio::fs::write(&file, "{}").await.unwrap();

        let workspace = GitWorkspace::new(root.path());
        workspace.stage(&[file.clone()]).await.unwrap();
        workspace
            .commit("Added settings", "Dev Eloper", "dev@example.com")
            .await
            .unwrap();

        let repo = Repository::open(root.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Added settings"));
        assert_eq!(head.author().name(), Some("Dev Eloper"));
    }

    #[tokio::test]
    async fn remove_drops_the_path_from_the_index() {
        let root = tempfile::tempdir().unwrap();
        Repository::init(root.path()).unwrap();

        let file = root.path().join("settings.json");
        tokio::fs::write(&file, "{}").await.unwrap();

        let workspace = GitWorkspace::new(root.path());
        workspace.stage(&[file.clone()]).await.unwrap();
        workspace
            .commit("Added settings", "Dev", "dev@example.com")
            .await
            .unwrap();

        tokio::fs::remove_file(&file).await.unwrap();
        workspace.remove(&[file.clone()]).await.unwrap();
        workspace
            .commit("Removed settings", "Dev", "dev@example.com")
            .await
            .unwrap();

        let repo = Repository::open(root.path()).unwrap();
        let tree = repo.head().unwrap().peel_to_tree().unwrap();
        assert!(tree.get_name("settings.json").is_none());
    }

    #[tokio::test]
    async fn push_without_remote_surfaces_a_git_error() {
        let root = tempfile::tempdir().unwrap();
        Repository::init(root.path()).unwrap();

        let file = root.path().join("settings.json");
        tokio::fs::write(&file, "{}").await.unwrap();
        let workspace = GitWorkspace::new(root.path());
        workspace.stage(&[file]).await.unwrap();
        workspace
            .commit("Added settings", "Dev", "dev@example.com")
            .await
            .unwrap();

        let err = workspace.push().await.unwrap_err();
        assert!(matches!(err, StrataError::Git { .. }));
    }
}
