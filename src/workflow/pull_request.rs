use tracing::{info, warn};

use crate::config::ExistingPolicy;
use crate::context::AppContext;
use crate::domain::branch::BranchName;
use crate::domain::issue::Issue;
use crate::domain::plan::Plan;
use crate::domain::pull_request::{PullRequestSpec, render_body, render_title};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct PullRequestOutcome {
    pub pull_request_url: String,
    pub branch: BranchName,
}

#[derive(Debug, Clone)]
pub struct PullRequestPreview {
    pub title: String,
    pub body: String,
    pub head: BranchName,
    pub plan: Plan,
}

/// Fetch the issue, plan it, branch from the default branch and open the pull request.
///
/// The plan is obtained before any source-host call, so a planning failure
/// never leaves a branch behind. A branch created before a failed pull
/// request is not rolled back.
pub async fn open_pull_request_for_issue(ctx: &AppContext) -> AppResult<PullRequestOutcome> {
    let repo = ctx.config.repository()?;
    let issue = fetch_issue(ctx).await?;

    let plan = ctx.planner.produce_plan(&issue).await?;
    if plan.is_example() {
        return Err(AppError::AssistantUnavailable(
            "the example plan is reserved for dry runs".to_string(),
        ));
    }
    info!(source = %plan.source, "implementation plan ready");

    let default_branch = ctx.source_host.default_branch(repo).await?;
    info!(branch = %default_branch, "default branch resolved");

    let sha = ctx.source_host.branch_head(repo, &default_branch).await?;
    let branch = BranchName::for_issue(&issue.id);

    info!(branch = %branch, sha = %sha, "creating branch");
    match ctx.source_host.create_branch(repo, &branch, &sha).await {
        Ok(()) => {}
        Err(AppError::Conflict(message)) if ctx.config.on_existing == ExistingPolicy::Reuse => {
            warn!(branch = %branch, %message, "branch already exists, reusing it");
        }
        Err(err) => return Err(err),
    }

    let spec = PullRequestSpec::compose(
        &issue,
        &plan,
        branch.clone(),
        default_branch,
        &ctx.config.issue_url_base,
    );

    info!(head = %spec.head, base = %spec.base, "opening pull request");
    let pull_request_url = match ctx.source_host.create_pull_request(repo, &spec).await {
        Ok(url) => url,
        Err(AppError::Conflict(message)) if ctx.config.on_existing == ExistingPolicy::Reuse => {
            let existing = ctx
                .source_host
                .find_open_pull_request(repo, &spec.head, &spec.base)
                .await?;
            match existing {
                Some(url) => {
                    warn!(%url, "pull request already open, reusing it");
                    url
                }
                None => return Err(AppError::Conflict(message)),
            }
        }
        Err(err) => return Err(err),
    };
    info!(url = %pull_request_url, "pull request created");

    Ok(PullRequestOutcome {
        pull_request_url,
        branch,
    })
}

/// Everything up to the first source-host call, rendered for inspection.
pub async fn preview_pull_request_for_issue(ctx: &AppContext) -> AppResult<PullRequestPreview> {
    let issue = fetch_issue(ctx).await?;
    let plan = ctx.planner.produce_plan(&issue).await?;
    info!(source = %plan.source, "implementation plan ready");

    Ok(PullRequestPreview {
        title: render_title(&issue),
        body: render_body(&issue, &plan, &ctx.config.issue_url_base),
        head: BranchName::for_issue(&issue.id),
        plan,
    })
}

async fn fetch_issue(ctx: &AppContext) -> AppResult<Issue> {
    let issue_id = &ctx.config.issue_id;
    info!(issue = %issue_id, "fetching Linear issue");

    let issue = ctx
        .tracker
        .fetch_issue(issue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Linear issue {issue_id}")))?;
    info!(title = %issue.title, "found issue");
    Ok(issue)
}
