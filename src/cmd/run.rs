use std::sync::Arc;

use tracing::info;

use crate::actions::ActionsReporter;
use crate::config::{AppConfig, AssistantConfig, RunArgs, Settings};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::claude_cli::ClaudeCliPlanner;
use crate::infra::github::GitHubClient;
use crate::infra::linear::LinearClient;
use crate::infra::llm::AnthropicClient;
use crate::services::PlannerService;
use crate::workflow::pull_request::{open_pull_request_for_issue, preview_pull_request_for_issue};

pub async fn run(args: RunArgs, reporter: &ActionsReporter) -> AppResult<()> {
    let config = Settings::from_process_env(args)?.validate()?;
    let context = build_context(config);

    if context.config.dry_run {
        let preview = preview_pull_request_for_issue(&context).await?;
        info!(source = %preview.plan.source, "dry run, GitHub left untouched");
        println!("Title: {}", preview.title);
        println!("Head: {}", preview.head);
        println!();
        println!("{}", preview.body);
        return Ok(());
    }

    let outcome = open_pull_request_for_issue(&context).await?;
    reporter.set_output("pull_request_url", &outcome.pull_request_url)?;
    reporter.set_output("branch_name", outcome.branch.as_str())?;
    Ok(())
}

fn build_context(config: AppConfig) -> AppContext {
    let tracker = Arc::new(LinearClient::new(
        config.linear_api_url.clone(),
        config.linear_api_key.clone(),
    ));
    let source_host = Arc::new(GitHubClient::new(
        config.github_api_url.clone(),
        config.github_token.clone(),
    ));

    let planner: Arc<dyn PlannerService> = match &config.assistant {
        AssistantConfig::HostedApi {
            api_key,
            model,
            max_tokens,
            base_url,
            style,
        } => Arc::new(AnthropicClient::new(
            base_url.clone(),
            api_key.clone(),
            model.clone(),
            *max_tokens,
            *style,
        )),
        AssistantConfig::LocalTool(tool) => {
            let planner = ClaudeCliPlanner::new(tool.clone());
            if config.dry_run {
                Arc::new(planner.with_example_fallback())
            } else {
                Arc::new(planner)
            }
        }
    };

    AppContext::new(config, tracker, source_host, planner)
}
