use async_trait::async_trait;

use crate::domain::issue::Issue;
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Returns `None` when the tracker has no issue with this identifier.
    async fn fetch_issue(&self, issue_id: &str) -> AppResult<Option<Issue>>;
}
