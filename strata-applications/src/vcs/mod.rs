//! Version-control collaborator
//!
//! Every successful mutating operation is published to the project's
//! repository: stage the touched files, commit with the caller as author,
//! push. A publish failure aborts the operation without rolling back the
//! already-written file; that inconsistency window is an accepted limitation
//! of the whole-file storage model.

pub mod git;

pub use git::{GitVersionControl, GitWorkspace};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use strata_core::StrataResult;

/// Operations against one project's working copy.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Stage the given paths for the next commit.
    async fn stage(&self, paths: &[PathBuf]) -> StrataResult<()>;

    /// Record deleted paths in the index.
    async fn remove(&self, paths: &[PathBuf]) -> StrataResult<()>;

    async fn commit(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
    ) -> StrataResult<()>;

    async fn push(&self) -> StrataResult<()>;

    async fn pull(&self) -> StrataResult<()>;
}

/// Opens working copies and clones new ones. The service holds one provider
/// and opens a [`VersionControl`] per project as needed.
#[async_trait]
pub trait VersionControlProvider: Send + Sync {
    fn open(&self, dir: &Path) -> StrataResult<Box<dyn VersionControl>>;

    async fn clone_into(&self, url: &str, dir: &Path) -> StrataResult<()>;
}

/// No-op implementation for tests and for deployments that do not publish.
pub struct NoopVersionControl;

#[async_trait]
impl VersionControl for NoopVersionControl {
    async fn stage(&self, _paths: &[PathBuf]) -> StrataResult<()> {
        Ok(())
    }

    async fn remove(&self, _paths: &[PathBuf]) -> StrataResult<()> {
        Ok(())
    }

    async fn commit(
        &self,
        _message: &str,
        _author_name: &str,
        _author_email: &str,
    ) -> StrataResult<()> {
        Ok(())
    }

    async fn push(&self) -> StrataResult<()> {
        Ok(())
    }

    async fn pull(&self) -> StrataResult<()> {
        Ok(())
    }
}

/// Provider handing out [`NoopVersionControl`] instances.
pub struct NoopVersionControlProvider;

#[async_trait]
impl VersionControlProvider for NoopVersionControlProvider {
    fn open(&self, _dir: &Path) -> StrataResult<Box<dyn VersionControl>> {
        Ok(Box::new(NoopVersionControl))
    }

    async fn clone_into(&self, _url: &str, _dir: &Path) -> StrataResult<()> {
        Ok(())
    }
}
