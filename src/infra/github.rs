use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::{Deserialize, Serialize};

use crate::config::RepoSlug;
use crate::domain::branch::BranchName;
use crate::domain::pull_request::PullRequestSpec;
use crate::error::{AppError, AppResult};
use crate::services::SourceHostService;

const API_VERSION: &str = "2022-11-28";
const CLIENT_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    http: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_base: String, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_base,
            token,
        }
    }

    fn token(&self) -> AppResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("github_token is required".to_string()))
    }

    fn repo_url(&self, repo: &RepoSlug, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{path}",
            self.api_base.trim_end_matches('/'),
            repo.owner,
            repo.name
        )
    }

    fn authorized(&self, request: RequestBuilder) -> AppResult<RequestBuilder> {
        Ok(request
            .header(AUTHORIZATION, format!("Bearer {}", self.token()?))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, CLIENT_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> AppResult<Response> {
        let response = self
            .authorized(request)?
            .send()
            .await
            .map_err(|err| AppError::VersionControl(format!("{action}: {err}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        if status == StatusCode::UNPROCESSABLE_ENTITY
            && body.to_lowercase().contains("already exists")
        {
            return Err(AppError::Conflict(format!("{action}: {body}")));
        }
        Err(AppError::VersionControl(format!(
            "{action}: GitHub responded with {status}: {body}"
        )))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response, action: &str) -> AppResult<T> {
        response.json().await.map_err(|err| {
            AppError::VersionControl(format!("{action}: failed to parse GitHub response: {err}"))
        })
    }
}

#[async_trait]
impl SourceHostService for GitHubClient {
    async fn default_branch(&self, repo: &RepoSlug) -> AppResult<String> {
        let action = format!("failed to read repository {repo}");
        let response = self
            .send(self.http.get(self.repo_url(repo, "")), &action)
            .await?;
        let payload: RepositoryResponse = Self::parse(response, &action).await?;
        Ok(payload.default_branch)
    }

    async fn branch_head(&self, repo: &RepoSlug, branch: &str) -> AppResult<String> {
        let action = format!("failed to resolve heads/{branch}");
        let url = self.repo_url(repo, &format!("/git/ref/heads/{branch}"));
        let response = self.send(self.http.get(url), &action).await?;
        let payload: RefResponse = Self::parse(response, &action).await?;
        Ok(payload.object.sha)
    }

    async fn create_branch(
        &self,
        repo: &RepoSlug,
        branch: &BranchName,
        sha: &str,
    ) -> AppResult<()> {
        let action = format!("failed to create branch {branch}");
        let body = CreateRefRequest {
            git_ref: format!("refs/heads/{branch}"),
            sha,
        };
        let request = self.http.post(self.repo_url(repo, "/git/refs")).json(&body);
        self.send(request, &action).await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoSlug,
        spec: &PullRequestSpec,
    ) -> AppResult<String> {
        let action = format!("failed to open pull request from {}", spec.head);
        let body = CreatePullRequest {
            title: &spec.title,
            body: &spec.body,
            head: spec.head.as_str(),
            base: &spec.base,
        };
        let request = self.http.post(self.repo_url(repo, "/pulls")).json(&body);
        let response = self.send(request, &action).await?;
        let payload: PullRequestResponse = Self::parse(response, &action).await?;
        Ok(payload.html_url)
    }

    async fn find_open_pull_request(
        &self,
        repo: &RepoSlug,
        head: &BranchName,
        base: &str,
    ) -> AppResult<Option<String>> {
        let action = format!("failed to list pull requests for {head}");
        let qualified_head = format!("{}:{head}", repo.owner);
        let request = self.http.get(self.repo_url(repo, "/pulls")).query(&[
            ("state", "open"),
            ("head", qualified_head.as_str()),
            ("base", base),
            ("per_page", "1"),
        ]);
        let response = self.send(request, &action).await?;
        let payload: Vec<PullRequestResponse> = Self::parse(response, &action).await?;
        Ok(payload.into_iter().next().map(|pr| pr.html_url))
    }
}

#[derive(Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Deserialize)]
struct PullRequestResponse {
    html_url: String,
}
