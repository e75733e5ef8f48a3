use async_trait::async_trait;

use crate::config::RepoSlug;
use crate::domain::branch::BranchName;
use crate::domain::pull_request::PullRequestSpec;
use crate::error::AppResult;

/// Remote repository operations on the source host.
///
/// Creating a branch or pull request that already exists fails with
/// [`AppError::Conflict`](crate::error::AppError::Conflict).
#[async_trait]
pub trait SourceHostService: Send + Sync {
    async fn default_branch(&self, repo: &RepoSlug) -> AppResult<String>;
    async fn branch_head(&self, repo: &RepoSlug, branch: &str) -> AppResult<String>;
    async fn create_branch(&self, repo: &RepoSlug, branch: &BranchName, sha: &str)
    -> AppResult<()>;
    /// Returns the pull request's web URL.
    async fn create_pull_request(&self, repo: &RepoSlug, spec: &PullRequestSpec)
    -> AppResult<String>;
    async fn find_open_pull_request(
        &self,
        repo: &RepoSlug,
        head: &BranchName,
        base: &str,
    ) -> AppResult<Option<String>>;
}
