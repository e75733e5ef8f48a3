use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::issue::Issue;
use crate::domain::plan::{Plan, PlanSource};
use crate::error::{AppError, AppResult};
use crate::prompt::PromptStyle;
use crate::services::PlannerService;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Plans through one call to the Anthropic Messages API. No retries.
pub struct AnthropicClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    style: PromptStyle,
}

impl AnthropicClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        style: PromptStyle,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key,
            model,
            max_tokens,
            style,
        }
    }

    fn messages_endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PlannerService for AnthropicClient {
    async fn produce_plan(&self, issue: &Issue) -> AppResult<Plan> {
        let prompt = self.style.render(issue);
        let request_body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: &prompt,
            }],
        };

        info!(model = %self.model, "requesting implementation plan");
        let response = self
            .http
            .post(self.messages_endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::LanguageModel(format!("failed to call Anthropic: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::LanguageModel(format!(
                "Anthropic responded with {status}: {body}"
            )));
        }

        let payload: MessagesResponse = response.json().await.map_err(|err| {
            AppError::LanguageModel(format!("failed to parse Anthropic response: {err}"))
        })?;

        match payload.content.into_iter().next() {
            Some(ContentBlock::Text { text }) => Ok(Plan::new(
                text,
                PlanSource::HostedModel {
                    model: self.model.clone(),
                },
            )),
            Some(ContentBlock::Other) => Err(AppError::LanguageModel(
                "first content block is not text".to_string(),
            )),
            None => Err(AppError::LanguageModel(
                "Anthropic returned no content".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn issue() -> Issue {
        Issue::new(
            "ABC-123",
            "Add user authentication feature",
            Some("OAuth2 with Google and GitHub.".to_string()),
        )
    }

    fn client(url: String) -> AnthropicClient {
        AnthropicClient::new(
            url,
            "sk-ant".to_string(),
            "claude-3-opus-20240229".to_string(),
            2000,
            PromptStyle::Concise,
        )
    }

    #[tokio::test]
    async fn sends_single_request_and_returns_first_text_block() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "model": "claude-3-opus-20240229",
                    "max_tokens": 2000
                })),
                Matcher::Regex("OAuth2 with Google and GitHub".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "msg_1",
                    "type": "message",
                    "role": "assistant",
                    "content": [
                        { "type": "text", "text": "1. Add OAuth routes" },
                        { "type": "text", "text": "ignored" }
                    ],
                    "stop_reason": "end_turn"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let plan = client(server.url()).produce_plan(&issue()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(plan.text, "1. Add OAuth routes");
        assert_eq!(
            plan.source,
            PlanSource::HostedModel {
                model: "claude-3-opus-20240229".to_string()
            }
        );
    }

    #[tokio::test]
    async fn api_failure_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client(server.url()).produce_plan(&issue()).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, AppError::LanguageModel(message) if message.contains("529")));
    }

    #[tokio::test]
    async fn non_text_first_block_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                json!({ "content": [{ "type": "tool_use", "id": "t", "name": "x", "input": {} }] })
                    .to_string(),
            )
            .create_async()
            .await;

        let err = client(server.url()).produce_plan(&issue()).await.unwrap_err();
        assert!(matches!(err, AppError::LanguageModel(_)));
    }
}
