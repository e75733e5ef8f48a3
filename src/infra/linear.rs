use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::issue::Issue;
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

const ISSUE_QUERY: &str = "query Issue($id: String!) { issue(id: $id) { identifier title description } }";

pub struct LinearClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl LinearClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl IssueTrackerService for LinearClient {
    async fn fetch_issue(&self, issue_id: &str) -> AppResult<Option<Issue>> {
        let issue_id = issue_id.trim();
        if issue_id.is_empty() {
            return Err(AppError::IssueTracker(
                "issue identifier must not be empty".to_string(),
            ));
        }

        let request_body = GraphQlRequest {
            query: ISSUE_QUERY,
            variables: IssueVariables { id: issue_id },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Linear: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| {
                AppError::IssueTracker(format!("failed to read Linear response: {err}"))
            })?;

        let payload = match serde_json::from_str::<GraphQlResponse>(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(AppError::IssueTracker(format!(
                    "Linear responded with {status}: {body}"
                )));
            }
            Err(err) => {
                return Err(AppError::IssueTracker(format!(
                    "failed to parse Linear response: {err}"
                )));
            }
        };

        if let Some(node) = payload.data.and_then(|data| data.issue) {
            debug!(identifier = ?node.identifier, "Linear issue resolved");
            return Ok(Some(Issue::new(issue_id, node.title, node.description)));
        }

        let errors = payload.errors.unwrap_or_default();
        if errors.iter().any(GraphQlError::is_not_found) {
            return Ok(None);
        }
        if errors.is_empty() {
            if status.is_success() {
                return Ok(None);
            }
            return Err(AppError::IssueTracker(format!(
                "Linear responded with {status}: {body}"
            )));
        }

        let messages = errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::IssueTracker(format!(
            "Linear responded with {status}: {messages}"
        )))
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: IssueVariables<'a>,
}

#[derive(Serialize)]
struct IssueVariables<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<IssueData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct IssueData {
    issue: Option<IssueNode>,
}

#[derive(Deserialize)]
struct IssueNode {
    identifier: Option<String>,
    title: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

impl GraphQlError {
    fn is_not_found(&self) -> bool {
        self.message.to_lowercase().contains("not found")
    }
}
